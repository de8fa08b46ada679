//! Intents: the user's not-yet-committed description of a money movement.
//!
//! An intent lives only in memory. It is built once the form is complete,
//! checked locally with [`Intent::validate`] and then handed to the flow.

use std::collections::HashSet;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    CacheKey, IntentError, Money,
    util::{normalize_id, normalize_optional_text},
};

/// Max memo length, in characters, after normalization.
pub const MEMO_MAX_CHARS: usize = 140;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MovementKind {
    #[default]
    Standard,
    Instant,
    /// Same amount to several beneficiaries in one commit.
    Mass,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Destination {
    Beneficiary(String),
    Beneficiaries(Vec<String>),
    Bill(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Intent {
    /// Sent with both the validation and the confirmation of this intent, so
    /// the backend can recognise duplicates.
    pub idempotency_key: Uuid,
    pub source_account: String,
    pub destination: Destination,
    /// Amount paid to each recipient.
    pub amount: Money,
    pub memo: Option<String>,
    pub scheduled_for: Option<NaiveDate>,
    pub kind: MovementKind,
}

impl Intent {
    /// Return a builder for `Intent`.
    pub fn builder() -> IntentBuilder {
        IntentBuilder::default()
    }

    /// `true` for bill payments, `false` for transfers.
    pub fn is_payment(&self) -> bool {
        matches!(self.destination, Destination::Bill(_))
    }

    pub fn recipients(&self) -> usize {
        match &self.destination {
            Destination::Beneficiaries(ids) => ids.len(),
            Destination::Beneficiary(_) | Destination::Bill(_) => 1,
        }
    }

    /// Total leaving the source account, `None` on overflow.
    pub fn total(&self) -> Option<Money> {
        let recipients = i64::try_from(self.recipients()).ok()?;
        self.amount.checked_mul(recipients)
    }

    /// Cached reads made stale by committing this intent.
    pub fn affected_keys(&self) -> Vec<CacheKey> {
        let mut keys = vec![
            CacheKey::Account(self.source_account.clone()),
            CacheKey::Transactions(self.source_account.clone()),
        ];
        if let Destination::Bill(bill_id) = &self.destination {
            keys.push(CacheKey::Bills);
            keys.push(CacheKey::Bill(bill_id.clone()));
        }
        keys
    }

    /// Check the preconditions an intent must meet before it is sent.
    ///
    /// `today` is the user's current date, used to reject schedules in the past.
    pub fn validate(&self, today: NaiveDate) -> Result<(), IntentError> {
        if !self.amount.is_positive() {
            return Err(IntentError::NonPositiveAmount);
        }
        if self.total().is_none() {
            return Err(IntentError::InvalidAmount("amount too large".to_string()));
        }
        if self.source_account.trim().is_empty() {
            return Err(IntentError::MissingField("source account"));
        }
        self.validate_destination()?;

        if let Some(memo) = &self.memo {
            let len = memo.chars().count();
            if len > MEMO_MAX_CHARS {
                return Err(IntentError::MemoTooLong {
                    len,
                    max: MEMO_MAX_CHARS,
                });
            }
        }
        if let Some(date) = self.scheduled_for
            && date < today
        {
            return Err(IntentError::ScheduledInPast(date));
        }
        Ok(())
    }

    fn validate_destination(&self) -> Result<(), IntentError> {
        let invalid = |msg: &str| Err(IntentError::InvalidDestination(msg.to_string()));
        match (&self.destination, self.kind) {
            (Destination::Beneficiaries(_), MovementKind::Standard | MovementKind::Instant) => {
                invalid("several beneficiaries require a mass transfer")
            }
            (Destination::Beneficiary(_) | Destination::Bill(_), MovementKind::Mass) => {
                invalid("a mass transfer requires a list of beneficiaries")
            }
            (Destination::Beneficiaries(ids), MovementKind::Mass) => {
                if ids.is_empty() {
                    return invalid("no beneficiaries");
                }
                let mut seen = HashSet::new();
                for id in ids {
                    if id.trim().is_empty() {
                        return invalid("empty beneficiary id");
                    }
                    if !seen.insert(id.as_str()) {
                        return Err(IntentError::InvalidDestination(format!(
                            "duplicate beneficiary {id}"
                        )));
                    }
                    if *id == self.source_account {
                        return invalid("beneficiary is the source account");
                    }
                }
                Ok(())
            }
            (Destination::Beneficiary(id), _) => {
                if id.trim().is_empty() {
                    return invalid("empty beneficiary id");
                }
                if *id == self.source_account {
                    return invalid("beneficiary is the source account");
                }
                Ok(())
            }
            (Destination::Bill(id), _) => {
                if id.trim().is_empty() {
                    return invalid("empty bill id");
                }
                Ok(())
            }
        }
    }
}

/// The builder for `Intent`.
///
/// `build` only checks that the required parts are present and normalizes
/// text; amount and shape rules are checked by [`Intent::validate`].
#[derive(Debug, Default)]
pub struct IntentBuilder {
    source_account: Option<String>,
    destination: Option<Destination>,
    amount: Option<Money>,
    memo: Option<String>,
    scheduled_for: Option<NaiveDate>,
    instant: bool,
}

impl IntentBuilder {
    pub fn source_account(mut self, account_id: &str) -> IntentBuilder {
        self.source_account = normalize_id(account_id);
        self
    }

    /// Transfer to a single beneficiary.
    pub fn beneficiary(mut self, beneficiary_id: &str) -> IntentBuilder {
        self.destination = normalize_id(beneficiary_id).map(Destination::Beneficiary);
        self
    }

    /// Mass transfer: the same amount to each beneficiary.
    pub fn beneficiaries<I, S>(mut self, ids: I) -> IntentBuilder
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids = ids
            .into_iter()
            .filter_map(|id| normalize_id(id.as_ref()))
            .collect();
        self.destination = Some(Destination::Beneficiaries(ids));
        self
    }

    /// Bill payment.
    pub fn bill(mut self, bill_id: &str) -> IntentBuilder {
        self.destination = normalize_id(bill_id).map(Destination::Bill);
        self
    }

    pub fn amount(mut self, amount: Money) -> IntentBuilder {
        self.amount = Some(amount);
        self
    }

    pub fn memo(mut self, memo: Option<&str>) -> IntentBuilder {
        self.memo = normalize_optional_text(memo);
        self
    }

    pub fn scheduled_for(mut self, date: Option<NaiveDate>) -> IntentBuilder {
        self.scheduled_for = date;
        self
    }

    /// Ask for instant execution (ignored for mass transfers).
    pub fn instant(mut self, instant: bool) -> IntentBuilder {
        self.instant = instant;
        self
    }

    pub fn build(self) -> Result<Intent, IntentError> {
        let source_account = self
            .source_account
            .ok_or(IntentError::MissingField("source account"))?;
        let destination = self
            .destination
            .ok_or(IntentError::MissingField("destination"))?;
        let amount = self.amount.ok_or(IntentError::MissingField("amount"))?;

        let kind = match (&destination, self.instant) {
            (Destination::Beneficiaries(_), _) => MovementKind::Mass,
            (_, true) => MovementKind::Instant,
            (_, false) => MovementKind::Standard,
        };

        Ok(Intent {
            idempotency_key: Uuid::new_v4(),
            source_account,
            destination,
            amount,
            memo: self.memo,
            scheduled_for: self.scheduled_for,
            kind,
        })
    }
}
