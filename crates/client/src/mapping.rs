//! Conversions between engine types and wire types.

use api_types::{
    account::AccountView,
    transaction::{TransactionCommitted, TransactionStatus as ApiStatus},
    validation::{Contact as ApiContact, MovementKind as ApiKind, PaymentDraft, TransferDraft, ValidationResponse, WireId},
};
use engine::{
    AccountSummary, CommittedTransaction, Contact, Currency, Destination, Intent, Money,
    MovementKind, TransactionStatus, ValidationId, ValidationTicket,
};

pub(crate) fn map_currency(currency: Currency) -> api_types::Currency {
    match currency {
        Currency::Eur => api_types::Currency::Eur,
        Currency::Usd => api_types::Currency::Usd,
        Currency::Gbp => api_types::Currency::Gbp,
    }
}

fn currency_from_api(currency: api_types::Currency) -> Currency {
    match currency {
        api_types::Currency::Eur => Currency::Eur,
        api_types::Currency::Usd => Currency::Usd,
        api_types::Currency::Gbp => Currency::Gbp,
    }
}

fn map_kind(kind: MovementKind) -> ApiKind {
    match kind {
        MovementKind::Standard => ApiKind::Standard,
        MovementKind::Instant => ApiKind::Instant,
        MovementKind::Mass => ApiKind::Mass,
    }
}

fn status_from_api(status: ApiStatus) -> TransactionStatus {
    match status {
        ApiStatus::Completed => TransactionStatus::Completed,
        ApiStatus::Pending => TransactionStatus::Pending,
        ApiStatus::Scheduled => TransactionStatus::Scheduled,
    }
}

pub(crate) fn map_contact(contact: &Contact) -> ApiContact {
    match contact {
        Contact::Phone(phone) => ApiContact::Phone(phone.clone()),
        Contact::Email(email) => ApiContact::Email(email.clone()),
    }
}

/// Draft of a transfer intent. `None` for bill payments.
pub(crate) fn transfer_draft(intent: &Intent) -> Option<TransferDraft> {
    let beneficiary_ids = match &intent.destination {
        Destination::Beneficiary(id) => vec![id.clone()],
        Destination::Beneficiaries(ids) => ids.clone(),
        Destination::Bill(_) => return None,
    };
    Some(TransferDraft {
        source_account_id: intent.source_account.clone(),
        beneficiary_ids,
        amount_minor: intent.amount.minor(),
        currency: map_currency(intent.amount.currency()),
        memo: intent.memo.clone(),
        scheduled_for: intent.scheduled_for,
        kind: map_kind(intent.kind),
        idempotency_key: intent.idempotency_key,
    })
}

/// Draft of a bill payment intent. `None` for transfers.
pub(crate) fn payment_draft(intent: &Intent) -> Option<PaymentDraft> {
    let Destination::Bill(bill_id) = &intent.destination else {
        return None;
    };
    Some(PaymentDraft {
        source_account_id: intent.source_account.clone(),
        bill_id: bill_id.clone(),
        amount_minor: intent.amount.minor(),
        currency: map_currency(intent.amount.currency()),
        memo: intent.memo.clone(),
        scheduled_for: intent.scheduled_for,
        kind: map_kind(intent.kind),
        idempotency_key: intent.idempotency_key,
    })
}

pub(crate) fn wire_id(id: &ValidationId) -> WireId {
    match id {
        ValidationId::Number(n) => WireId::Number(*n),
        ValidationId::Text(text) => WireId::Text(text.clone()),
    }
}

fn validation_id(id: WireId) -> ValidationId {
    match id {
        WireId::Number(n) => ValidationId::Number(n),
        WireId::Text(text) => ValidationId::Text(text),
    }
}

pub(crate) fn ticket_from_api(response: ValidationResponse) -> ValidationTicket {
    ValidationTicket {
        id: validation_id(response.validation_id),
        message: response.message,
    }
}

pub(crate) fn committed_from_api(tx: TransactionCommitted) -> CommittedTransaction {
    CommittedTransaction {
        id: tx.id.to_string(),
        amount: Money::new(tx.amount_minor, currency_from_api(tx.currency)),
        date: tx.date,
        status: status_from_api(tx.status),
    }
}

pub(crate) fn account_from_api(account: AccountView) -> AccountSummary {
    AccountSummary {
        id: account.id,
        name: account.name,
        balance: Money::new(account.balance_minor, currency_from_api(account.currency)),
    }
}
