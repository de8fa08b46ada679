//! The transaction backend capability.
//!
//! The flow only knows this trait. Exactly one implementation is chosen when
//! the host starts (the REST client in production, scripted fakes in tests).

use std::{fmt, future::Future, sync::Arc};

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Intent, Money, Session};

/// Opaque handle binding a one-time code challenge to one intent.
///
/// Kept in the form the backend issued it (number or text) so it is echoed
/// back unchanged on confirmation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValidationId {
    Number(u64),
    Text(String),
}

impl ValidationId {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Number(_) => false,
            Self::Text(text) => text.trim().is_empty(),
        }
    }
}

impl fmt::Display for ValidationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<String> for ValidationId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for ValidationId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<u64> for ValidationId {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationTicket {
    pub id: ValidationId,
    /// Human-readable message from the backend (e.g. "code sent to +39...").
    pub message: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    Completed,
    Pending,
    Scheduled,
}

/// Reference to a transaction the backend has committed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommittedTransaction {
    pub id: String,
    pub amount: Money,
    pub date: DateTime<FixedOffset>,
    pub status: TransactionStatus,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub id: String,
    pub name: String,
    pub balance: Money,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodeRejectionReason {
    /// The code does not match: the same ticket may be used again.
    WrongCode,
    /// The ticket lapsed: a new validation is needed.
    Expired,
    /// Transport failure or a reason the backend did not classify.
    Unspecified,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeRejection {
    pub reason: CodeRejectionReason,
    /// Backend message, passed through verbatim.
    pub message: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("not authenticated")]
    Unauthorized,
    #[error("operation not allowed")]
    Forbidden,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("{}", .0.message)]
    CodeRejected(CodeRejection),
}

impl BackendError {
    /// Message to show the user; backend text is kept as is.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            Self::CodeRejected(rejection) => rejection.message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<BackendError> for CodeRejection {
    fn from(value: BackendError) -> Self {
        match value {
            BackendError::CodeRejected(rejection) => rejection,
            other => CodeRejection {
                reason: CodeRejectionReason::Unspecified,
                message: other.user_message(),
            },
        }
    }
}

pub trait TransactionBackend: Send + Sync {
    /// Submit the intent and ask for a one-time code to be sent to the
    /// session's contact channel. No money moves.
    fn request_validation(
        &self,
        session: &Session,
        intent: &Intent,
    ) -> impl Future<Output = Result<ValidationTicket, BackendError>> + Send;

    /// Submit the code for `validation_id`, re-sending the intent. The backend
    /// commits the transaction only if the code verifies.
    fn confirm(
        &self,
        session: &Session,
        validation_id: &ValidationId,
        code: &str,
        intent: &Intent,
    ) -> impl Future<Output = Result<CommittedTransaction, BackendError>> + Send;

    fn account(
        &self,
        session: &Session,
        account_id: &str,
    ) -> impl Future<Output = Result<AccountSummary, BackendError>> + Send;
}

impl<T: TransactionBackend> TransactionBackend for Arc<T> {
    fn request_validation(
        &self,
        session: &Session,
        intent: &Intent,
    ) -> impl Future<Output = Result<ValidationTicket, BackendError>> + Send {
        (**self).request_validation(session, intent)
    }

    fn confirm(
        &self,
        session: &Session,
        validation_id: &ValidationId,
        code: &str,
        intent: &Intent,
    ) -> impl Future<Output = Result<CommittedTransaction, BackendError>> + Send {
        (**self).confirm(session, validation_id, code, intent)
    }

    fn account(
        &self,
        session: &Session,
        account_id: &str,
    ) -> impl Future<Output = Result<AccountSummary, BackendError>> + Send {
        (**self).account(session, account_id)
    }
}
