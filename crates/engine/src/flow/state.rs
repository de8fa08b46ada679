//! The validation flow as a pure state machine.
//!
//! ```text
//! Idle ──begin──▶ AwaitingValidation ──ticket_issued──▶ AwaitingCode ──start_commit──▶ Committing ──committed──▶ Completed
//!                        │                                   ▲                              │
//!                        └─validation_failed─▶ Failed(Request)  └───────code_rejected────────┤
//!                                                                                           └─expired─▶ Failed(TicketExpired)
//! ```
//!
//! Every transition either succeeds or leaves the state untouched and returns
//! a [`TransitionError`].

use thiserror::Error;

use crate::{
    CodeRejection, CodeRejectionReason, CommittedTransaction, Intent, ValidationId,
    ValidationTicket,
};

/// An intent bound to its outstanding ticket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pending {
    intent: Intent,
    ticket: ValidationTicket,
    attempts: u32,
}

impl Pending {
    pub fn intent(&self) -> &Intent {
        &self.intent
    }

    pub fn ticket(&self) -> &ValidationTicket {
        &self.ticket
    }

    /// Codes submitted against this ticket so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Failure {
    /// The backend refused the intent; it has been discarded.
    Request { message: String },
    /// The ticket lapsed; the intent is kept for a new validation.
    TicketExpired { intent: Intent, message: String },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FlowState {
    #[default]
    Idle,
    AwaitingValidation {
        intent: Intent,
    },
    AwaitingCode(Pending),
    Committing(Pending),
    Completed(CommittedTransaction),
    Failed(Failure),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("a validation request is already in flight")]
    ValidationInFlight,
    #[error("validation {0} is still awaiting a code")]
    TicketOutstanding(ValidationId),
    #[error("a code for validation {0} is already being checked")]
    CommitInFlight(ValidationId),
    #[error("no validation is awaiting a code")]
    NoTicket,
    #[error("validation {given} does not match the pending validation {expected}")]
    TicketMismatch {
        expected: ValidationId,
        given: ValidationId,
    },
    #[error("nothing to revalidate")]
    NothingToRevalidate,
    #[error("unexpected {event} while {state}")]
    Unexpected {
        event: &'static str,
        state: &'static str,
    },
}

impl FlowState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingValidation { .. } => "awaiting validation",
            Self::AwaitingCode(_) => "awaiting code",
            Self::Committing(_) => "committing",
            Self::Completed(_) => "completed",
            Self::Failed(_) => "failed",
        }
    }

    /// The intent held by the flow, if any.
    pub fn intent(&self) -> Option<&Intent> {
        match self {
            Self::AwaitingValidation { intent }
            | Self::Failed(Failure::TicketExpired { intent, .. }) => Some(intent),
            Self::AwaitingCode(pending) | Self::Committing(pending) => Some(&pending.intent),
            Self::Idle | Self::Completed(_) | Self::Failed(Failure::Request { .. }) => None,
        }
    }

    pub fn pending(&self) -> Option<&Pending> {
        match self {
            Self::AwaitingCode(pending) | Self::Committing(pending) => Some(pending),
            _ => None,
        }
    }

    pub fn ticket(&self) -> Option<&ValidationTicket> {
        self.pending().map(Pending::ticket)
    }

    /// `true` while a backend call is outstanding.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::AwaitingValidation { .. } | Self::Committing(_))
    }

    /// Start a new validation for `intent`.
    pub fn begin(&mut self, intent: Intent) -> Result<(), TransitionError> {
        match self {
            Self::AwaitingValidation { .. } => Err(TransitionError::ValidationInFlight),
            Self::AwaitingCode(pending) => {
                Err(TransitionError::TicketOutstanding(pending.ticket.id.clone()))
            }
            Self::Committing(pending) => {
                Err(TransitionError::CommitInFlight(pending.ticket.id.clone()))
            }
            Self::Idle | Self::Completed(_) | Self::Failed(_) => {
                *self = Self::AwaitingValidation { intent };
                Ok(())
            }
        }
    }

    /// Request a fresh ticket for an intent whose ticket expired.
    pub fn revalidate(&mut self) -> Result<(), TransitionError> {
        match std::mem::take(self) {
            Self::Failed(Failure::TicketExpired { intent, .. }) => {
                *self = Self::AwaitingValidation { intent };
                Ok(())
            }
            other => {
                *self = other;
                Err(TransitionError::NothingToRevalidate)
            }
        }
    }

    pub fn ticket_issued(&mut self, ticket: ValidationTicket) -> Result<(), TransitionError> {
        match std::mem::take(self) {
            Self::AwaitingValidation { intent } => {
                *self = Self::AwaitingCode(Pending {
                    intent,
                    ticket,
                    attempts: 0,
                });
                Ok(())
            }
            other => Err(self.restore(other, "validation ticket")),
        }
    }

    pub fn validation_failed(&mut self, message: String) -> Result<(), TransitionError> {
        match std::mem::take(self) {
            Self::AwaitingValidation { .. } => {
                *self = Self::Failed(Failure::Request { message });
                Ok(())
            }
            other => Err(self.restore(other, "validation failure")),
        }
    }

    /// Check that a code for `validation_id` may be submitted now.
    pub fn expect_code_for(&self, validation_id: &ValidationId) -> Result<&Pending, TransitionError> {
        match self {
            Self::AwaitingCode(pending) if pending.ticket.id == *validation_id => Ok(pending),
            Self::AwaitingCode(pending) => Err(TransitionError::TicketMismatch {
                expected: pending.ticket.id.clone(),
                given: validation_id.clone(),
            }),
            Self::Committing(pending) => {
                Err(TransitionError::CommitInFlight(pending.ticket.id.clone()))
            }
            _ => Err(TransitionError::NoTicket),
        }
    }

    pub fn start_commit(&mut self, validation_id: &ValidationId) -> Result<(), TransitionError> {
        self.expect_code_for(validation_id)?;
        match std::mem::take(self) {
            Self::AwaitingCode(mut pending) => {
                pending.attempts += 1;
                *self = Self::Committing(pending);
                Ok(())
            }
            other => Err(self.restore(other, "code submission")),
        }
    }

    /// The backend committed the transaction. Returns the discarded intent.
    pub fn committed(&mut self, transaction: CommittedTransaction) -> Result<Intent, TransitionError> {
        match std::mem::take(self) {
            Self::Committing(pending) => {
                *self = Self::Completed(transaction);
                Ok(pending.intent)
            }
            other => Err(self.restore(other, "commit")),
        }
    }

    /// The backend refused the code. The ticket stays usable unless it expired.
    pub fn code_rejected(&mut self, rejection: &CodeRejection) -> Result<(), TransitionError> {
        match std::mem::take(self) {
            Self::Committing(pending) => {
                *self = match rejection.reason {
                    CodeRejectionReason::Expired => Self::Failed(Failure::TicketExpired {
                        intent: pending.intent,
                        message: rejection.message.clone(),
                    }),
                    CodeRejectionReason::WrongCode | CodeRejectionReason::Unspecified => {
                        Self::AwaitingCode(pending)
                    }
                };
                Ok(())
            }
            other => Err(self.restore(other, "code rejection")),
        }
    }

    /// Drop whatever is pending and go back to `Idle`.
    pub fn cancel(&mut self) -> Option<Intent> {
        match std::mem::take(self) {
            Self::AwaitingValidation { intent }
            | Self::Failed(Failure::TicketExpired { intent, .. }) => Some(intent),
            Self::AwaitingCode(pending) | Self::Committing(pending) => Some(pending.intent),
            Self::Idle | Self::Completed(_) | Self::Failed(Failure::Request { .. }) => None,
        }
    }

    fn restore(&mut self, previous: FlowState, event: &'static str) -> TransitionError {
        let err = TransitionError::Unexpected {
            event,
            state: previous.name(),
        };
        *self = previous;
        err
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};

    use super::*;
    use crate::{Currency, Money, TransactionStatus};

    fn intent() -> Intent {
        Intent::builder()
            .source_account("acct-1")
            .beneficiary("beneficiary-7")
            .amount(Money::new(500, Currency::Eur))
            .build()
            .unwrap()
    }

    fn ticket(id: u64) -> ValidationTicket {
        ValidationTicket {
            id: ValidationId::from(id),
            message: "code sent".to_string(),
        }
    }

    fn receipt() -> CommittedTransaction {
        CommittedTransaction {
            id: "TX-9".to_string(),
            amount: Money::new(500, Currency::Eur),
            date: FixedOffset::east_opt(3600)
                .unwrap()
                .with_ymd_and_hms(2026, 1, 2, 10, 0, 0)
                .unwrap(),
            status: TransactionStatus::Completed,
        }
    }

    fn awaiting_code() -> FlowState {
        let mut state = FlowState::default();
        state.begin(intent()).unwrap();
        state.ticket_issued(ticket(42)).unwrap();
        state
    }

    #[test]
    fn happy_path_reaches_completed() {
        let mut state = awaiting_code();
        state.start_commit(&ValidationId::from(42u64)).unwrap();
        assert!(state.is_busy());

        let discarded = state.committed(receipt()).unwrap();
        assert_eq!(discarded.source_account, "acct-1");
        assert!(matches!(state, FlowState::Completed(ref tx) if tx.id == "TX-9"));
        assert!(state.intent().is_none());
    }

    #[test]
    fn code_cannot_be_submitted_without_ticket() {
        let mut state = FlowState::default();
        assert_eq!(
            state.start_commit(&ValidationId::from(42u64)),
            Err(TransitionError::NoTicket)
        );

        state.begin(intent()).unwrap();
        assert_eq!(
            state.start_commit(&ValidationId::from(42u64)),
            Err(TransitionError::NoTicket)
        );
        assert_eq!(state.name(), "awaiting validation");
    }

    #[test]
    fn mismatched_ticket_is_refused_and_state_kept() {
        let mut state = awaiting_code();
        let before = state.clone();
        assert_eq!(
            state.start_commit(&ValidationId::from(7u64)),
            Err(TransitionError::TicketMismatch {
                expected: ValidationId::from(42u64),
                given: ValidationId::from(7u64),
            })
        );
        assert_eq!(state, before);
    }

    #[test]
    fn second_validation_is_refused_while_outstanding() {
        let mut state = FlowState::default();
        state.begin(intent()).unwrap();
        assert_eq!(state.begin(intent()), Err(TransitionError::ValidationInFlight));

        let mut state = awaiting_code();
        assert_eq!(
            state.begin(intent()),
            Err(TransitionError::TicketOutstanding(ValidationId::from(42u64)))
        );
    }

    #[test]
    fn wrong_code_returns_to_awaiting_code_with_same_ticket() {
        let mut state = awaiting_code();
        let original = state.intent().cloned();
        state.start_commit(&ValidationId::from(42u64)).unwrap();
        state
            .code_rejected(&CodeRejection {
                reason: CodeRejectionReason::WrongCode,
                message: "wrong code".to_string(),
            })
            .unwrap();

        let pending = state.pending().unwrap();
        assert_eq!(state.name(), "awaiting code");
        assert_eq!(pending.ticket().id, ValidationId::from(42u64));
        assert_eq!(pending.attempts(), 1);
        assert_eq!(state.intent().cloned(), original);

        state.start_commit(&ValidationId::from(42u64)).unwrap();
        assert_eq!(state.pending().unwrap().attempts(), 2);
    }

    #[test]
    fn expired_ticket_keeps_intent_for_revalidation() {
        let mut state = awaiting_code();
        state.start_commit(&ValidationId::from(42u64)).unwrap();
        state
            .code_rejected(&CodeRejection {
                reason: CodeRejectionReason::Expired,
                message: "expired".to_string(),
            })
            .unwrap();

        assert!(state.ticket().is_none());
        assert!(state.intent().is_some());
        assert!(matches!(state, FlowState::Failed(Failure::TicketExpired { .. })));

        state.revalidate().unwrap();
        assert_eq!(state.name(), "awaiting validation");
    }

    #[test]
    fn revalidate_needs_an_expired_ticket() {
        let mut state = awaiting_code();
        assert_eq!(state.revalidate(), Err(TransitionError::NothingToRevalidate));
        assert_eq!(state.name(), "awaiting code");
    }

    #[test]
    fn validation_failure_discards_intent() {
        let mut state = FlowState::default();
        state.begin(intent()).unwrap();
        state.validation_failed("insufficient funds".to_string()).unwrap();
        assert!(state.intent().is_none());
        assert!(matches!(
            state,
            FlowState::Failed(Failure::Request { ref message }) if message == "insufficient funds"
        ));

        // A fresh intent may start from a failure.
        state.begin(intent()).unwrap();
    }

    #[test]
    fn late_events_do_not_change_state() {
        let mut state = FlowState::default();
        assert!(matches!(
            state.ticket_issued(ticket(1)),
            Err(TransitionError::Unexpected { state: "idle", .. })
        ));
        assert_eq!(state, FlowState::Idle);

        let mut state = awaiting_code();
        assert!(state.committed(receipt()).is_err());
        assert_eq!(state.name(), "awaiting code");
    }

    #[test]
    fn cancel_always_returns_to_idle() {
        let mut state = FlowState::default();
        state.begin(intent()).unwrap();
        assert!(state.cancel().is_some());
        assert_eq!(state, FlowState::Idle);

        let mut state = awaiting_code();
        assert!(state.cancel().is_some());
        assert_eq!(state, FlowState::Idle);
        assert!(state.ticket().is_none());

        let mut state = FlowState::default();
        assert!(state.cancel().is_none());
        assert_eq!(state, FlowState::Idle);
    }
}
