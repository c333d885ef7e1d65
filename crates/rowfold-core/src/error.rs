use crate::{key::KeyRange, stage::StageError, store::StoreError};
use std::fmt;
use thiserror::Error as ThisError;

///
/// QueryError
///
/// Caller-facing failure taxonomy of the range-summarisation query path.
/// Every variant carries the stage or range needed to re-diagnose it.
///

#[derive(Debug, ThisError)]
pub enum QueryError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("failed to construct stage '{stage}': {source}")]
    StageConstruction {
        stage: &'static str,
        #[source]
        source: StageError,
    },

    #[error("store rejected stage stack{}: {source}", display_range(.range.as_ref()))]
    ScanSetup {
        range: Option<KeyRange>,
        #[source]
        source: StoreError,
    },

    #[error("scan failed over {range}: {source}")]
    ScanRead {
        range: KeyRange,
        #[source]
        source: StoreError,
    },
}

impl QueryError {
    pub(crate) fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub(crate) const fn stage_construction(stage: &'static str, source: StageError) -> Self {
        Self::StageConstruction { stage, source }
    }

    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidRequest(_) => ErrorClass::InvalidRequest,
            Self::StageConstruction { .. } => ErrorClass::StageConstruction,
            Self::ScanSetup { .. } => ErrorClass::ScanSetup,
            Self::ScanRead { .. } => ErrorClass::ScanRead,
        }
    }

    /// Failing stage name, when the error is stage-scoped.
    #[must_use]
    pub const fn stage(&self) -> Option<&'static str> {
        match self {
            Self::StageConstruction { stage, .. }
            | Self::ScanSetup {
                source: StoreError::StageRejected { stage, .. },
                ..
            } => Some(*stage),
            _ => None,
        }
    }

    /// Offending key range, when the error is range-scoped.
    #[must_use]
    pub const fn range(&self) -> Option<&KeyRange> {
        match self {
            Self::ScanSetup { range, .. } => range.as_ref(),
            Self::ScanRead { range, .. } => Some(range),
            _ => None,
        }
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}: {self}", self.class())
    }
}

fn display_range(range: Option<&KeyRange>) -> String {
    range.map_or_else(String::new, |range| format!(" over {range}"))
}

///
/// ErrorClass
/// Coarse classification used by callers deciding whether to retry.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    InvalidRequest,
    StageConstruction,
    ScanSetup,
    ScanRead,
}

impl ErrorClass {
    /// Whether re-issuing the same query may succeed.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::ScanRead)
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::InvalidRequest => "invalid_request",
            Self::StageConstruction => "stage_construction",
            Self::ScanSetup => "scan_setup",
            Self::ScanRead => "scan_read",
        };
        write!(f, "{label}")
    }
}
