use crate::error::ErrorClass;
use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// EventState
/// Ephemeral, in-memory counters for range-summarisation queries.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub groups: BTreeMap<String, GroupCounters>,
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventOps {
    // Query entrypoints
    pub queries: u64,
    pub stages_built: u64,

    // Rejections by class
    pub rejected_invalid_request: u64,
    pub rejected_stage_construction: u64,
    pub rejected_scan_setup: u64,
    pub scan_read_failures: u64,

    // Scan lifecycle
    pub scans_opened: u64,
    pub scans_closed: u64,
    pub elements_yielded: u64,
}

///
/// GroupCounters
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct GroupCounters {
    pub queries: u64,
    pub scans_opened: u64,
    pub elements_yielded: u64,
}

///
/// EventReport
/// Point-in-time copy of the event state.
///

pub type EventReport = EventState;

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

pub(crate) fn report() -> EventReport {
    with_state(Clone::clone)
}

pub(crate) fn group_entry<'a>(state: &'a mut EventState, group: &str) -> &'a mut GroupCounters {
    state.groups.entry(group.to_string()).or_default()
}

pub(crate) const fn rejection_counter(ops: &mut EventOps, class: ErrorClass) -> &mut u64 {
    match class {
        ErrorClass::InvalidRequest => &mut ops.rejected_invalid_request,
        ErrorClass::StageConstruction => &mut ops.rejected_stage_construction,
        ErrorClass::ScanSetup => &mut ops.rejected_scan_setup,
        ErrorClass::ScanRead => &mut ops.scan_read_failures,
    }
}
