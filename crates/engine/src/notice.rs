//! User-visible notices for flow outcomes.
//!
//! Every flow error ends up as a [`Notice`]: hosts show it and carry on.

use crate::{
    CodeRejectionReason, CommittedTransaction, FlowError, TransactionStatus, ValidationTicket,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn ticket_issued(ticket: &ValidationTicket) -> Self {
        if ticket.message.trim().is_empty() {
            Self::info("A confirmation code has been sent.")
        } else {
            Self::info(ticket.message.clone())
        }
    }

    pub fn committed(tx: &CommittedTransaction) -> Self {
        let what = match tx.status {
            TransactionStatus::Completed => "completed",
            TransactionStatus::Pending => "accepted, pending execution",
            TransactionStatus::Scheduled => "scheduled",
        };
        Self::success(format!("Transaction {} {what}: {}", tx.id, tx.amount))
    }
}

impl From<&FlowError> for Notice {
    fn from(err: &FlowError) -> Self {
        match err {
            FlowError::InvalidIntent(err) => Notice::error(format!("Check the form: {err}.")),
            FlowError::ValidationRequestFailed { message } => {
                Notice::error(format!("The operation was refused: {message}"))
            }
            FlowError::InvalidOrExpiredCode { reason, message } => match reason {
                CodeRejectionReason::WrongCode => {
                    Notice::error(format!("{message} Check the code and try again."))
                }
                CodeRejectionReason::Expired => {
                    Notice::error(format!("{message} Request a new code to continue."))
                }
                CodeRejectionReason::Unspecified => {
                    Notice::error(format!("The code could not be verified: {message}"))
                }
            },
            FlowError::EmptyCode => Notice::error("Enter the code you received."),
            FlowError::InvalidState(err) => Notice::error(format!("Not possible right now: {err}.")),
        }
    }
}
