use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Eur,
    Usd,
    Gbp,
}

pub mod error {
    use super::*;

    /// Error body returned by the backend on any non-2xx response.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ErrorBody {
        pub error: String,
        /// Optional machine-readable reason (e.g. `otp_expired`).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub code: Option<String>,
    }
}

pub mod account {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AccountView {
        pub id: String,
        pub name: String,
        pub balance_minor: i64,
        pub currency: Currency,
    }
}

pub mod validation {
    use super::*;

    /// Identifier issued by the backend.
    ///
    /// Some backends send numbers, others strings: both are accepted and the
    /// client keeps the textual form.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum WireId {
        Number(u64),
        Text(String),
    }

    impl std::fmt::Display for WireId {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Self::Number(n) => write!(f, "{n}"),
                Self::Text(s) => f.write_str(s),
            }
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum MovementKind {
        Standard,
        Instant,
        Mass,
    }

    /// Out-of-band channel the one-time code is delivered to.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(tag = "channel", content = "value", rename_all = "snake_case")]
    pub enum Contact {
        Phone(String),
        Email(String),
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransferDraft {
        pub source_account_id: String,
        /// One id for standard/instant transfers, one or more for mass transfers.
        pub beneficiary_ids: Vec<String>,
        /// Amount paid to each beneficiary. Always > 0.
        pub amount_minor: i64,
        pub currency: Currency,
        pub memo: Option<String>,
        pub scheduled_for: Option<NaiveDate>,
        pub kind: MovementKind,
        /// Same key for the validation and the confirmation of one intent.
        pub idempotency_key: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PaymentDraft {
        pub source_account_id: String,
        pub bill_id: String,
        pub amount_minor: i64,
        pub currency: Currency,
        pub memo: Option<String>,
        pub scheduled_for: Option<NaiveDate>,
        pub kind: MovementKind,
        pub idempotency_key: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ValidationRequest<T> {
        #[serde(flatten)]
        pub draft: T,
        pub contact: Contact,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ValidationResponse {
        pub validation_id: WireId,
        pub message: String,
    }

    /// Confirmation body: the code plus the original draft, re-sent for the
    /// final commit.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ConfirmRequest<T> {
        pub validation_id: WireId,
        pub code: String,
        #[serde(flatten)]
        pub draft: T,
    }
}

pub mod transaction {
    use super::*;
    use super::validation::WireId;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionStatus {
        Completed,
        Pending,
        Scheduled,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionCommitted {
        pub id: WireId,
        pub amount_minor: i64,
        pub currency: Currency,
        /// RFC3339 timestamp, including timezone offset.
        pub date: DateTime<FixedOffset>,
        pub status: TransactionStatus,
    }
}
