//! The module contains the errors the flow can throw.
//!
//! - [`IntentError`] local precondition failures, raised before any network call.
//! - [`FlowError`] the typed outcome of a failed flow operation.
//!
//! Backend failures are described by [`BackendError`] and converted into
//! [`FlowError`] at the flow boundary.
//!
//!  [`BackendError`]: crate::BackendError
use thiserror::Error;

use crate::{CodeRejectionReason, TransitionError};

/// An intent that must not leave the client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntentError {
    #[error("amount must be greater than zero")]
    NonPositiveAmount,
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("unsupported currency: {0}")]
    UnsupportedCurrency(String),
    #[error("missing {0}")]
    MissingField(&'static str),
    #[error("Invalid destination: {0}")]
    InvalidDestination(String),
    #[error("memo is too long ({len} characters, max {max})")]
    MemoTooLong { len: usize, max: usize },
    #[error("scheduled date {0} is in the past")]
    ScheduledInPast(chrono::NaiveDate),
}

/// Flow custom errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error(transparent)]
    InvalidIntent(#[from] IntentError),
    #[error("validation request failed: {message}")]
    ValidationRequestFailed { message: String },
    #[error("code rejected: {message}")]
    InvalidOrExpiredCode {
        reason: CodeRejectionReason,
        message: String,
    },
    #[error("the code must not be empty")]
    EmptyCode,
    #[error(transparent)]
    InvalidState(#[from] TransitionError),
}

impl FlowError {
    /// Returns `true` if the same ticket can be used for another attempt.
    #[must_use]
    pub fn allows_code_retry(&self) -> bool {
        match self {
            Self::InvalidOrExpiredCode { reason, .. } => *reason != CodeRejectionReason::Expired,
            Self::EmptyCode => true,
            _ => false,
        }
    }
}
