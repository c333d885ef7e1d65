//! Module: store::memory
//! Responsibility: in-process sorted store with server-side stage execution.
//! Does not own: query planning or range encoding.
//! Boundary: reference backend for tests and embedded use.

use crate::{
    key::KeyRange,
    model::Element,
    stage::{ScanRow, StageDescriptor, StagePipeline},
    store::{
        CborElementCodec, ElementCodec, RawEntry, ScanHandle, Store, StoreCapabilities,
        StoreError, StoreKey, codec::encode_value,
    },
};
use parking_lot::{Mutex, RwLock};
use std::{
    collections::{BTreeMap, VecDeque},
    ops::Bound,
    sync::{
        Arc,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
};
use tracing::{debug, trace};

///
/// MemoryStore
///
/// Rows live in one ordered map keyed by `StoreKey`. Each scan snapshots
/// its range, runs the installed stages, and serves the survivors.
///

#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RwLock<BTreeMap<StoreKey, Vec<u8>>>,
    capabilities: StoreCapabilities,
    sequence: AtomicU64,
    open_scans: Arc<AtomicUsize>,
    scans_opened: AtomicUsize,
    read_budget: Arc<Mutex<Option<usize>>>,
    installed: Mutex<Vec<Vec<StageDescriptor>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capabilities(mut self, capabilities: StoreCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Store every element; later inserts get higher sequence qualifiers.
    pub fn insert<I>(&self, elements: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = Element>,
    {
        let codec = CborElementCodec;
        let mut entries = Vec::new();
        for element in elements {
            let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
            entries.extend(codec.encode(&element, sequence)?);
        }

        let mut rows = self.rows.write();
        for entry in entries {
            rows.insert(entry.key, entry.value);
        }

        Ok(())
    }

    /// Number of physical entries held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    /// Scan handles currently open.
    #[must_use]
    pub fn open_scans(&self) -> usize {
        self.open_scans.load(Ordering::SeqCst)
    }

    /// Scan handles opened over this store's lifetime.
    #[must_use]
    pub fn scans_opened(&self) -> usize {
        self.scans_opened.load(Ordering::SeqCst)
    }

    /// Stage stacks installed by each opened scan, in open order.
    #[must_use]
    pub fn installed_stacks(&self) -> Vec<Vec<StageDescriptor>> {
        self.installed.lock().clone()
    }

    /// Fail every read after `entries` more entries have been served.
    pub fn fail_reads_after(&self, entries: usize) {
        *self.read_budget.lock() = Some(entries);
    }

    fn snapshot(&self, range: &KeyRange) -> Vec<RawEntry> {
        if range.start >= range.end {
            return Vec::new();
        }

        let lower = StoreKey::row_floor(range.start.clone());
        let upper = StoreKey::row_floor(range.end.clone());
        self.rows
            .read()
            .range((Bound::Included(lower), Bound::Excluded(upper)))
            .filter(|(key, _)| range.contains(&key.row))
            .map(|(key, value)| RawEntry {
                key: key.clone(),
                value: value.clone(),
            })
            .collect()
    }
}

impl Store for MemoryStore {
    type Scan = MemoryScan;

    fn validate_stages(&self, stages: &[StageDescriptor]) -> Result<(), StoreError> {
        self.capabilities.check(stages)?;
        StagePipeline::install(stages).map(|_| ())
    }

    fn open_scan(
        &self,
        range: &KeyRange,
        stages: &[StageDescriptor],
    ) -> Result<Self::Scan, StoreError> {
        self.capabilities.check(stages)?;
        let pipeline = StagePipeline::install(stages)?;

        let codec = CborElementCodec;
        let raw = self.snapshot(range);
        let scanned = raw.len();
        let rows = raw.into_iter().map(|entry| {
            codec
                .decode(&entry)
                .map(|element| ScanRow {
                    key: entry.key,
                    element,
                })
                .map_err(StoreError::from)
        });

        let pending: VecDeque<_> = pipeline
            .apply(rows)
            .map(|row| -> Result<RawEntry, StoreError> {
                let row = row?;
                Ok(RawEntry {
                    value: encode_value(&row.element)?,
                    key: row.key,
                })
            })
            .collect();

        debug!(
            range = %range,
            family = pipeline.family(),
            scanned,
            survivors = pending.len(),
            "memory scan opened"
        );

        self.installed.lock().push(stages.to_vec());
        self.scans_opened.fetch_add(1, Ordering::SeqCst);
        self.open_scans.fetch_add(1, Ordering::SeqCst);

        Ok(MemoryScan {
            pending,
            read_budget: Arc::clone(&self.read_budget),
            open_scans: Arc::clone(&self.open_scans),
            closed: false,
        })
    }
}

///
/// MemoryScan
///

#[derive(Debug)]
pub struct MemoryScan {
    pending: VecDeque<Result<RawEntry, StoreError>>,
    read_budget: Arc<Mutex<Option<usize>>>,
    open_scans: Arc<AtomicUsize>,
    closed: bool,
}

impl MemoryScan {
    fn take_read(&self) -> Result<(), StoreError> {
        let mut budget = self.read_budget.lock();
        match budget.as_mut() {
            Some(0) => Err(StoreError::Unavailable("injected read failure".to_string())),
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl ScanHandle for MemoryScan {
    fn next_entry(&mut self) -> Result<Option<RawEntry>, StoreError> {
        if self.closed {
            return Err(StoreError::Closed);
        }
        if self.pending.is_empty() {
            return Ok(None);
        }

        self.take_read()?;
        self.pending.pop_front().transpose()
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.pending.clear();
            self.open_scans.fetch_sub(1, Ordering::SeqCst);
            trace!("memory scan closed");
        }
    }
}

impl Drop for MemoryScan {
    fn drop(&mut self) {
        self.close();
    }
}
