//! The OTP-gated transaction flow.
//!
//! A [`TransactionFlow`] drives [`FlowState`] with the two backend round-trips:
//! it asks for a validation ticket, then submits the user's code against it.
//! The backend is the only authority on whether money moved; the flow only
//! reflects its answers.

use chrono::Local;

pub use state::{Failure, FlowState, Pending, TransitionError};

use crate::{
    CacheInvalidator, CodeRejection, CommittedTransaction, FlowError, Intent, Session,
    TransactionBackend, ValidationId, ValidationTicket,
};

mod state;

type ResultFlow<T> = Result<T, FlowError>;

pub struct TransactionFlow<B, C> {
    backend: B,
    cache: C,
    session: Session,
    state: FlowState,
}

impl<B, C> TransactionFlow<B, C>
where
    B: TransactionBackend,
    C: CacheInvalidator,
{
    pub fn new(backend: B, cache: C, session: Session) -> Self {
        Self {
            backend,
            cache,
            session,
            state: FlowState::Idle,
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The ticket a code may be submitted against, if any.
    pub fn pending_ticket(&self) -> Option<&ValidationTicket> {
        match &self.state {
            FlowState::AwaitingCode(pending) => Some(pending.ticket()),
            _ => None,
        }
    }

    /// The committed transaction, once the flow completed.
    pub fn receipt(&self) -> Option<&CommittedTransaction> {
        match &self.state {
            FlowState::Completed(tx) => Some(tx),
            _ => None,
        }
    }

    /// Check `intent` locally, then ask the backend for a validation ticket.
    ///
    /// Local precondition failures return [`FlowError::InvalidIntent`] before
    /// any network call and leave the state unchanged.
    pub async fn request_validation(&mut self, intent: Intent) -> ResultFlow<ValidationTicket> {
        intent.validate(Local::now().date_naive())?;
        self.state.begin(intent)?;
        self.send_validation().await
    }

    /// Ask for a fresh ticket for the intent whose ticket expired.
    pub async fn revalidate(&mut self) -> ResultFlow<ValidationTicket> {
        self.state.revalidate()?;
        self.send_validation().await
    }

    async fn send_validation(&mut self) -> ResultFlow<ValidationTicket> {
        let FlowState::AwaitingValidation { intent } = &self.state else {
            return Err(TransitionError::Unexpected {
                event: "validation request",
                state: self.state.name(),
            }
            .into());
        };
        tracing::info!(
            "requesting validation for {} from {} (key {})",
            intent.amount,
            intent.source_account,
            intent.idempotency_key
        );

        let result = self.backend.request_validation(&self.session, intent).await;
        match result {
            Ok(ticket) if ticket.id.is_empty() => {
                let message = "backend returned an empty validation id".to_string();
                tracing::warn!("{message}");
                self.state.validation_failed(message.clone())?;
                Err(FlowError::ValidationRequestFailed { message })
            }
            Ok(ticket) => {
                tracing::info!("validation {} issued, awaiting code", ticket.id);
                self.state.ticket_issued(ticket.clone())?;
                Ok(ticket)
            }
            Err(err) => {
                let message = err.user_message();
                tracing::warn!("validation request failed: {err}");
                self.state.validation_failed(message.clone())?;
                Err(FlowError::ValidationRequestFailed { message })
            }
        }
    }

    /// Submit `code` for the pending ticket `validation_id`.
    ///
    /// On success the flow is `Completed` and cached reads touched by the
    /// intent are invalidated. On failure the intent and ticket are kept,
    /// unless the backend reports the ticket as expired.
    pub async fn submit_code(
        &mut self,
        validation_id: &ValidationId,
        code: &str,
    ) -> ResultFlow<CommittedTransaction> {
        self.state.expect_code_for(validation_id)?;
        let code = code.trim();
        if code.is_empty() {
            return Err(FlowError::EmptyCode);
        }
        self.state.start_commit(validation_id)?;

        let FlowState::Committing(pending) = &self.state else {
            return Err(TransitionError::Unexpected {
                event: "code submission",
                state: self.state.name(),
            }
            .into());
        };
        tracing::info!(
            "submitting code for validation {} (attempt {})",
            validation_id,
            pending.attempts()
        );

        let result = self
            .backend
            .confirm(&self.session, validation_id, code, pending.intent())
            .await;
        match result {
            Ok(transaction) => {
                let intent = self.state.committed(transaction.clone())?;
                tracing::info!(
                    "transaction {} committed ({:?})",
                    transaction.id,
                    transaction.status
                );
                self.cache.invalidate(&intent.affected_keys()).await;
                Ok(transaction)
            }
            Err(err) => {
                let rejection = CodeRejection::from(err);
                tracing::warn!(
                    "code for validation {} rejected ({:?}): {}",
                    validation_id,
                    rejection.reason,
                    rejection.message
                );
                self.state.code_rejected(&rejection)?;
                Err(FlowError::InvalidOrExpiredCode {
                    reason: rejection.reason,
                    message: rejection.message,
                })
            }
        }
    }

    /// Abandon the pending intent, if any, and return to `Idle`.
    ///
    /// A response still in flight for an abandoned call is never observed.
    pub fn cancel(&mut self) -> Option<Intent> {
        let previous = self.state.name();
        let discarded = self.state.cancel();
        if discarded.is_some() {
            tracing::info!("flow cancelled while {previous}");
        }
        discarded
    }
}
