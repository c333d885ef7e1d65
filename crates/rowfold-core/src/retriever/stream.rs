use crate::{
    error::QueryError,
    key::KeyRange,
    model::Element,
    obs::{MetricsEvent, sink},
    stage::StageStack,
    store::{ElementCodec, ScanHandle, Store, StoreError},
};
use std::{collections::VecDeque, fmt};
use tracing::{debug, warn};

///
/// ActiveScan
///

struct ActiveScan<H> {
    range: KeyRange,
    handle: H,
}

///
/// ElementStream
///
/// Lazy, single-pass sequence of summarised elements.
///
/// Scans open one range at a time, in seed order; the previous handle is
/// closed before the next opens. The stream fuses after the first error and
/// closes on exhaustion, on `close`, and on drop.
///

pub struct ElementStream<'s, S: Store, C> {
    store: &'s S,
    codec: C,
    stages: StageStack,
    group: String,
    pending: VecDeque<KeyRange>,
    active: Option<ActiveScan<S::Scan>>,
    yielded: u64,
    finished: bool,
}

impl<'s, S, C> ElementStream<'s, S, C>
where
    S: Store,
    C: ElementCodec,
{
    pub(crate) fn new(
        store: &'s S,
        codec: C,
        stages: StageStack,
        group: String,
        ranges: Vec<KeyRange>,
    ) -> Self {
        Self {
            store,
            codec,
            stages,
            group,
            pending: ranges.into(),
            active: None,
            yielded: 0,
            finished: false,
        }
    }

    /// Group every yielded element belongs to.
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Elements yielded so far.
    #[must_use]
    pub const fn yielded(&self) -> u64 {
        self.yielded
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Release every open handle and discard unread ranges. Idempotent.
    pub fn close(&mut self) {
        if self.is_finished() {
            return;
        }

        self.close_active();
        self.pending.clear();
        self.finished = true;

        sink::record(MetricsEvent::ElementsYielded {
            group: &self.group,
            elements: self.yielded,
        });
        debug!(group = %self.group, yielded = self.yielded, "range stream closed");
    }

    fn close_active(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.handle.close();
            sink::record(MetricsEvent::ScanClosed { group: &self.group });
            debug!(group = %self.group, range = %active.range, "scan closed");
        }
    }

    fn fail(&mut self, err: QueryError) -> Option<Result<Element, QueryError>> {
        warn!(group = %self.group, error = %err, "range stream failed");
        sink::record(MetricsEvent::QueryRejected { class: err.class() });
        self.close();

        Some(Err(err))
    }

    fn open_next(&mut self) -> Result<bool, QueryError> {
        let Some(range) = self.pending.pop_front() else {
            return Ok(false);
        };

        match self.store.open_scan(&range, self.stages.as_slice()) {
            Ok(handle) => {
                sink::record(MetricsEvent::ScanOpened { group: &self.group });
                debug!(group = %self.group, range = %range, "scan opened");
                self.active = Some(ActiveScan { range, handle });
                Ok(true)
            }
            Err(source) => Err(QueryError::ScanSetup {
                range: Some(range),
                source,
            }),
        }
    }
}

impl<S, C> Iterator for ElementStream<'_, S, C>
where
    S: Store,
    C: ElementCodec,
{
    type Item = Result<Element, QueryError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.is_finished() {
                return None;
            }

            let Some(active) = self.active.as_mut() else {
                match self.open_next() {
                    Ok(true) => continue,
                    Ok(false) => {
                        self.close();
                        return None;
                    }
                    Err(err) => return self.fail(err),
                }
            };

            let read = active
                .handle
                .next_entry()
                .and_then(|entry| match entry {
                    Some(entry) => self.codec.decode(&entry).map(Some).map_err(StoreError::from),
                    None => Ok(None),
                });

            match read {
                Ok(Some(element)) => {
                    self.yielded = self.yielded.saturating_add(1);
                    return Some(Ok(element));
                }
                Ok(None) => self.close_active(),
                Err(source) => {
                    let range = active.range.clone();
                    return self.fail(QueryError::ScanRead { range, source });
                }
            }
        }
    }
}

impl<S: Store, C> Drop for ElementStream<'_, S, C> {
    fn drop(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.handle.close();
            sink::record(MetricsEvent::ScanClosed { group: &self.group });
        }
        if !self.finished {
            self.finished = true;
            sink::record(MetricsEvent::ElementsYielded {
                group: &self.group,
                elements: self.yielded,
            });
        }
    }
}

impl<S: Store, C> fmt::Debug for ElementStream<'_, S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementStream")
            .field("group", &self.group)
            .field("pending", &self.pending.len())
            .field("active", &self.active.as_ref().map(|a| &a.range))
            .field("yielded", &self.yielded)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}
