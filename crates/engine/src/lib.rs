//! Money movement gated by a one-time code.
//!
//! A transfer or bill payment is described by an [`Intent`], checked locally,
//! then validated and committed by a [`TransactionBackend`] in two steps driven
//! by [`TransactionFlow`]:
//!
//! 1. [`TransactionFlow::request_validation`] returns a [`ValidationTicket`];
//! 2. [`TransactionFlow::submit_code`] sends the code the user received and,
//!    once the backend accepts it, returns the [`CommittedTransaction`].
//!
//! The crate holds no transport: the REST implementation of the backend lives
//! in the `client` crate.

pub use backend::{
    AccountSummary, BackendError, CodeRejection, CodeRejectionReason, CommittedTransaction,
    TransactionBackend, TransactionStatus, ValidationId, ValidationTicket,
};
pub use cache::{CacheInvalidator, CacheKey, QueryCache};
pub use currency::Currency;
pub use error::{FlowError, IntentError};
pub use flow::{Failure, FlowState, Pending, TransactionFlow, TransitionError};
pub use intent::{Destination, Intent, IntentBuilder, MEMO_MAX_CHARS, MovementKind};
pub use money::Money;
pub use notice::{Notice, NoticeLevel};
pub use session::{Contact, Session};

mod backend;
mod cache;
mod currency;
mod error;
mod flow;
mod intent;
mod money;
mod notice;
mod session;
mod util;
