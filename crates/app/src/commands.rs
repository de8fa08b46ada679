use engine::{
    AccountSummary, BackendError, CacheKey, CodeRejectionReason, Currency, Destination, FlowError,
    Intent, Money, Notice, QueryCache, TransactionBackend, TransactionFlow,
};

use crate::{
    error::Result,
    prompt::Console,
    settings::{MassArgs, MovementArgs, PayArgs, TransferArgs},
};

/// How an interactive command ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Cancelled,
    Failed,
}

pub fn transfer_intent(args: &TransferArgs) -> Result<Intent> {
    let (amount, movement) = movement(&args.movement)?;
    Ok(movement
        .beneficiary(&args.to)
        .amount(amount)
        .instant(args.instant)
        .build()?)
}

pub fn mass_intent(args: &MassArgs) -> Result<Intent> {
    let (amount, movement) = movement(&args.movement)?;
    Ok(movement.beneficiaries(&args.to).amount(amount).build()?)
}

pub fn payment_intent(args: &PayArgs) -> Result<Intent> {
    let (amount, movement) = movement(&args.movement)?;
    Ok(movement.bill(&args.bill).amount(amount).build()?)
}

fn movement(args: &MovementArgs) -> Result<(Money, engine::IntentBuilder)> {
    let currency = Currency::try_from(args.currency.as_str())?;
    let amount = Money::parse(&args.amount, currency)?;
    let builder = Intent::builder()
        .source_account(&args.source)
        .memo(args.memo.as_deref())
        .scheduled_for(args.date);
    Ok((amount, builder))
}

pub fn describe(intent: &Intent) -> String {
    let target = match &intent.destination {
        Destination::Beneficiary(id) => format!("beneficiary {id}"),
        Destination::Beneficiaries(ids) => {
            format!("{} beneficiaries ({} each)", ids.len(), intent.amount)
        }
        Destination::Bill(id) => format!("bill {id}"),
    };
    let total = intent
        .total()
        .map_or_else(|| "an amount too large".to_string(), |total| total.to_string());
    let mut text = format!("Sending {total} from {} to {target}", intent.source_account);
    if let Some(date) = intent.scheduled_for {
        text.push_str(&format!(" on {date}"));
    }
    if let Some(memo) = &intent.memo {
        text.push_str(&format!(" \"{memo}\""));
    }
    text
}

fn describe_account(account: &AccountSummary) -> String {
    format!("{} ({}): {}", account.name, account.id, account.balance)
}

async fn read_account<B: TransactionBackend>(
    flow: &TransactionFlow<B, QueryCache>,
    cache: &QueryCache,
    account_id: &str,
) -> std::result::Result<AccountSummary, BackendError> {
    cache
        .get_or_fetch(CacheKey::Account(account_id.to_string()), || {
            flow.backend().account(flow.session(), account_id)
        })
        .await
}

/// Prints an account, reading through the cache.
pub async fn balance<B: TransactionBackend>(
    flow: &TransactionFlow<B, QueryCache>,
    cache: &QueryCache,
    console: &mut Console,
    account_id: &str,
) -> Result<Outcome> {
    match read_account(flow, cache, account_id).await {
        Ok(account) => {
            console.line(&describe_account(&account))?;
            Ok(Outcome::Done)
        }
        Err(err) => {
            console.notice(&Notice::error(err.user_message()))?;
            Ok(Outcome::Failed)
        }
    }
}

/// Runs one movement end to end: validation, code entry, commit.
///
/// A wrong code is asked again on the same ticket; an expired one is replaced
/// only if the user agrees. An empty code cancels.
pub async fn run_movement<B: TransactionBackend>(
    flow: &mut TransactionFlow<B, QueryCache>,
    cache: &QueryCache,
    console: &mut Console,
    intent: Intent,
) -> Result<Outcome> {
    let source = intent.source_account.clone();
    console.line(&describe(&intent))?;
    if let Ok(account) = read_account(flow, cache, &source).await {
        console.notice(&Notice::info(format!("Available: {}", account.balance)))?;
    }

    let mut ticket = match flow.request_validation(intent).await {
        Ok(ticket) => ticket,
        Err(err) => {
            console.notice(&Notice::from(&err))?;
            return Ok(Outcome::Failed);
        }
    };

    loop {
        console.notice(&Notice::ticket_issued(&ticket))?;
        loop {
            let code = console.read_code("Code (empty to cancel): ")?;
            if code.is_empty() {
                flow.cancel();
                console.notice(&Notice::info("Operation cancelled."))?;
                return Ok(Outcome::Cancelled);
            }

            match flow.submit_code(&ticket.id, &code).await {
                Ok(tx) => {
                    console.notice(&Notice::committed(&tx))?;
                    // The commit invalidated the cached account, so this refetches.
                    if let Ok(account) = read_account(flow, cache, &source).await {
                        console.line(&describe_account(&account))?;
                    }
                    return Ok(Outcome::Done);
                }
                Err(err) => {
                    console.notice(&Notice::from(&err))?;
                    if is_expired(&err) {
                        break;
                    }
                    if !err.allows_code_retry() {
                        return Ok(Outcome::Failed);
                    }
                }
            }
        }

        if !console.confirm("Request a new code?", true)? {
            flow.cancel();
            console.notice(&Notice::info("Operation cancelled."))?;
            return Ok(Outcome::Cancelled);
        }
        ticket = match flow.revalidate().await {
            Ok(ticket) => ticket,
            Err(err) => {
                console.notice(&Notice::from(&err))?;
                return Ok(Outcome::Failed);
            }
        };
    }
}

/// Whether a failed submission left an intent that can be revalidated.
fn is_expired(err: &FlowError) -> bool {
    matches!(
        err,
        FlowError::InvalidOrExpiredCode {
            reason: CodeRejectionReason::Expired,
            ..
        }
    )
}
