//! Metrics sink boundary.
//!
//! Query logic MUST NOT depend on obs::metrics directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.
//!
//! This module is the only allowed bridge between execution logic
//! and the thread-local metrics state.
use crate::{error::ErrorClass, obs::metrics};
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = RefCell::new(None);
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent<'a> {
    QueryStart { group: &'a str, ranges: u64 },
    StagesBuilt { group: &'a str, stages: u64 },
    QueryRejected { class: ErrorClass },
    ScanOpened { group: &'a str },
    ScanClosed { group: &'a str },
    ElementsYielded { group: &'a str, elements: u64 },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent<'_>);
}

/// GlobalMetricsSink
/// Default sink that writes into the thread-local event state.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent<'_>) {
        match event {
            MetricsEvent::QueryStart { group, .. } => {
                metrics::with_state_mut(|m| {
                    m.ops.queries = m.ops.queries.saturating_add(1);
                    let entry = metrics::group_entry(m, group);
                    entry.queries = entry.queries.saturating_add(1);
                });
            }

            MetricsEvent::StagesBuilt { stages, .. } => {
                metrics::with_state_mut(|m| {
                    m.ops.stages_built = m.ops.stages_built.saturating_add(stages);
                });
            }

            MetricsEvent::QueryRejected { class } => {
                metrics::with_state_mut(|m| {
                    let counter = metrics::rejection_counter(&mut m.ops, class);
                    *counter = counter.saturating_add(1);
                });
            }

            MetricsEvent::ScanOpened { group } => {
                metrics::with_state_mut(|m| {
                    m.ops.scans_opened = m.ops.scans_opened.saturating_add(1);
                    let entry = metrics::group_entry(m, group);
                    entry.scans_opened = entry.scans_opened.saturating_add(1);
                });
            }

            MetricsEvent::ScanClosed { .. } => {
                metrics::with_state_mut(|m| {
                    m.ops.scans_closed = m.ops.scans_closed.saturating_add(1);
                });
            }

            MetricsEvent::ElementsYielded { group, elements } => {
                metrics::with_state_mut(|m| {
                    m.ops.elements_yielded = m.ops.elements_yielded.saturating_add(elements);
                    let entry = metrics::group_entry(m, group);
                    entry.elements_yielded = entry.elements_yielded.saturating_add(elements);
                });
            }
        }
    }
}

pub(crate) fn record(event: MetricsEvent<'_>) {
    // Clone out of the slot so a sink may itself record without re-borrowing.
    let override_sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    match override_sink {
        Some(sink) => sink.record(event),
        None => GlobalMetricsSink.record(event),
    }
}

/// Snapshot the current metrics state for test and endpoint plumbing.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset all metrics state.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let prev = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = prev;
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}
