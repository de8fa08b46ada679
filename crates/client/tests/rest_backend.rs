use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, Uri, header},
    routing::{get, post},
};
use client::RestBackend;
use engine::{
    BackendError, CacheKey, CodeRejectionReason, Contact, Currency, FlowError, FlowState, Intent,
    Money, QueryCache, Session, TransactionBackend, TransactionFlow, TransactionStatus,
    ValidationId,
};
use serde_json::{Value, json};

const TOKEN: &str = "test-token";

#[derive(Clone, Default)]
struct Recorded {
    bodies: Arc<Mutex<Vec<(String, Value)>>>,
}

impl Recorded {
    fn push(&self, path: &str, body: &Value) {
        self.bodies
            .lock()
            .unwrap()
            .push((path.to_string(), body.clone()));
    }

    fn bodies(&self) -> Vec<(String, Value)> {
        self.bodies.lock().unwrap().clone()
    }
}

type Reply = (StatusCode, Json<Value>);

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        == Some(format!("Bearer {TOKEN}").as_str())
}

fn error(status: StatusCode, message: &str, code: Option<&str>) -> Reply {
    let mut body = json!({ "error": message });
    if let Some(code) = code {
        body["code"] = json!(code);
    }
    (status, Json(body))
}

async fn validate(
    path: &'static str,
    State(recorded): State<Recorded>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    recorded.push(path, &body);
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "missing token", None);
    }
    if body["amountMinor"].as_i64().unwrap_or(0) > 100_000 {
        return error(StatusCode::UNPROCESSABLE_ENTITY, "Insufficient funds", None);
    }
    (
        StatusCode::OK,
        Json(json!({ "validationId": 42, "message": "Code sent to +39 *** 000" })),
    )
}

async fn confirm(
    path: &'static str,
    State(recorded): State<Recorded>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    recorded.push(path, &body);
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "missing token", None);
    }
    if body["validationId"] != json!(42) {
        return error(StatusCode::NOT_FOUND, "Unknown validation", None);
    }
    let status = if body["scheduledFor"].is_null() {
        "completed"
    } else {
        "scheduled"
    };
    match body["code"].as_str() {
        Some("123456") => (
            StatusCode::OK,
            Json(json!({
                "id": "TX-9",
                "amountMinor": body["amountMinor"],
                "currency": body["currency"],
                "date": "2026-01-02T10:00:00+01:00",
                "status": status,
            })),
        ),
        Some("999999") => error(StatusCode::GONE, "The code has expired.", None),
        Some("888888") => error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "The code has expired.",
            Some("otp_expired"),
        ),
        _ => error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "The code is not valid.",
            Some("otp_invalid"),
        ),
    }
}

async fn account(
    State(recorded): State<Recorded>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    recorded.push("accounts", &json!(id));
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "missing token", None);
    }
    if id != "acct-1" {
        return error(StatusCode::NOT_FOUND, "No such account", None);
    }
    (
        StatusCode::OK,
        Json(json!({ "id": "acct-1", "name": "Checking", "balanceMinor": 120050, "currency": "EUR" })),
    )
}

fn router(recorded: Recorded) -> Router {
    Router::new()
        .route(
            "/api/transfers/validation",
            post(|state: State<Recorded>, headers: HeaderMap, body: Json<Value>| validate("transfers/validation", state, headers, body)),
        )
        .route(
            "/api/transfers/confirm",
            post(|state: State<Recorded>, headers: HeaderMap, body: Json<Value>| confirm("transfers/confirm", state, headers, body)),
        )
        .route(
            "/api/payments/validation",
            post(|state: State<Recorded>, headers: HeaderMap, body: Json<Value>| validate("payments/validation", state, headers, body)),
        )
        .route(
            "/api/payments/confirm",
            post(|state: State<Recorded>, headers: HeaderMap, body: Json<Value>| confirm("payments/confirm", state, headers, body)),
        )
        .route("/api/accounts/{id}", get(account))
        .fallback(|uri: Uri| async move {
            error(StatusCode::IM_A_TEAPOT, &format!("outside the api: {uri}"), None)
        })
        .with_state(recorded)
}

async fn spawn_server() -> (String, Recorded) {
    let recorded = Recorded::default();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(recorded.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/api"), recorded)
}

fn backend(base_url: &str) -> RestBackend {
    RestBackend::builder().base_url(base_url).build().unwrap()
}

fn session(token: &str) -> Session {
    Session::new("alice", token, Contact::Phone("+390000000".to_string()))
}

fn transfer(minor: i64) -> Intent {
    Intent::builder()
        .source_account("acct-1")
        .beneficiary("beneficiary-7")
        .amount(Money::new(minor, Currency::Eur))
        .memo(Some("rent"))
        .build()
        .unwrap()
}

#[tokio::test]
async fn transfer_round_trip_over_http() {
    let (base_url, recorded) = spawn_server().await;
    let cache = QueryCache::default();
    cache
        .insert(CacheKey::Account("acct-1".into()), &0)
        .await
        .unwrap();
    let mut flow = TransactionFlow::new(backend(&base_url), cache.clone(), session(TOKEN));

    let intent = transfer(500);
    let key = intent.idempotency_key;
    let ticket = flow.request_validation(intent).await.unwrap();
    assert_eq!(ticket.id, ValidationId::from(42u64));
    assert_eq!(ticket.message, "Code sent to +39 *** 000");

    let tx = flow.submit_code(&ticket.id, "123456").await.unwrap();
    assert_eq!(tx.id, "TX-9");
    assert_eq!(tx.amount, Money::new(500, Currency::Eur));
    assert_eq!(tx.status, TransactionStatus::Completed);
    assert!(matches!(flow.state(), FlowState::Completed(_)));
    assert!(!cache.contains(&CacheKey::Account("acct-1".into())).await);

    let bodies = recorded.bodies();
    assert_eq!(bodies.len(), 2);
    let (path, validation) = &bodies[0];
    assert_eq!(path, "transfers/validation");
    assert_eq!(validation["sourceAccountId"], "acct-1");
    assert_eq!(validation["beneficiaryIds"], json!(["beneficiary-7"]));
    assert_eq!(validation["kind"], "standard");
    assert_eq!(validation["memo"], "rent");
    assert_eq!(validation["contact"], json!({ "channel": "phone", "value": "+390000000" }));
    assert_eq!(validation["idempotencyKey"], key.to_string());

    let (path, confirmation) = &bodies[1];
    assert_eq!(path, "transfers/confirm");
    assert_eq!(confirmation["validationId"], json!(42));
    assert_eq!(confirmation["code"], "123456");
    assert_eq!(confirmation["idempotencyKey"], key.to_string());
    assert_eq!(confirmation["amountMinor"], 500);
}

#[tokio::test]
async fn wrong_code_over_http_keeps_ticket() {
    let (base_url, _recorded) = spawn_server().await;
    let mut flow = TransactionFlow::new(backend(&base_url), QueryCache::default(), session(TOKEN));

    let ticket = flow.request_validation(transfer(500)).await.unwrap();
    let err = flow.submit_code(&ticket.id, "000000").await.unwrap_err();
    assert_eq!(
        err,
        FlowError::InvalidOrExpiredCode {
            reason: CodeRejectionReason::WrongCode,
            message: "The code is not valid.".to_string(),
        }
    );
    assert!(matches!(flow.state(), FlowState::AwaitingCode(_)));
    assert_eq!(flow.pending_ticket().map(|t| t.id.clone()), Some(ticket.id));
}

#[tokio::test]
async fn expired_code_is_reported_by_status_or_code() {
    let (base_url, _recorded) = spawn_server().await;
    let backend = backend(&base_url);
    let session = session(TOKEN);
    let intent = transfer(500);
    let id = ValidationId::from(42u64);

    for code in ["999999", "888888"] {
        let err = backend.confirm(&session, &id, code, &intent).await.unwrap_err();
        assert!(
            matches!(
                err,
                BackendError::CodeRejected(ref rejection)
                    if rejection.reason == CodeRejectionReason::Expired
                        && rejection.message == "The code has expired."
            ),
            "unexpected error for {code}: {err:?}"
        );
    }
}

#[tokio::test]
async fn refused_intent_surfaces_server_message() {
    let (base_url, _recorded) = spawn_server().await;
    let mut flow = TransactionFlow::new(backend(&base_url), QueryCache::default(), session(TOKEN));

    let err = flow.request_validation(transfer(500_000)).await.unwrap_err();
    assert_eq!(
        err,
        FlowError::ValidationRequestFailed {
            message: "Insufficient funds".to_string()
        }
    );
}

#[tokio::test]
async fn bill_payment_uses_payment_endpoints() {
    let (base_url, recorded) = spawn_server().await;
    let mut flow = TransactionFlow::new(backend(&base_url), QueryCache::default(), session(TOKEN));

    let tomorrow = chrono::Local::now().date_naive().succ_opt().unwrap();
    let intent = Intent::builder()
        .source_account("acct-1")
        .bill("bill-3")
        .amount(Money::new(1250, Currency::Eur))
        .scheduled_for(Some(tomorrow))
        .build()
        .unwrap();
    let ticket = flow.request_validation(intent).await.unwrap();
    let tx = flow.submit_code(&ticket.id, "123456").await.unwrap();
    assert_eq!(tx.status, TransactionStatus::Scheduled);

    let paths: Vec<String> = recorded.bodies().into_iter().map(|(path, _)| path).collect();
    assert_eq!(paths, vec!["payments/validation", "payments/confirm"]);
    assert_eq!(recorded.bodies()[0].1["billId"], "bill-3");
    assert_eq!(
        recorded.bodies()[0].1["scheduledFor"],
        tomorrow.format("%Y-%m-%d").to_string()
    );
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let (base_url, _recorded) = spawn_server().await;
    let backend = backend(&base_url);

    let err = backend
        .request_validation(&session("wrong"), &transfer(500))
        .await
        .unwrap_err();
    assert_eq!(err, BackendError::Unauthorized);
}

#[tokio::test]
async fn account_reads_through_query_cache() {
    let (base_url, _recorded) = spawn_server().await;
    let backend = backend(&base_url);
    let session = session(TOKEN);
    let cache = QueryCache::default();

    let key = CacheKey::Account("acct-1".to_string());
    let account = cache
        .get_or_fetch(key.clone(), || backend.account(&session, "acct-1"))
        .await
        .unwrap();
    assert_eq!(account.name, "Checking");
    assert_eq!(account.balance, Money::new(120050, Currency::Eur));
    assert!(cache.contains(&key).await);

    let err = backend.account(&session, "acct-404").await.unwrap_err();
    assert_eq!(err, BackendError::NotFound("No such account".to_string()));
}

#[tokio::test]
async fn account_ids_cannot_leave_the_accounts_path() {
    let (base_url, recorded) = spawn_server().await;
    let backend = backend(&base_url);
    let session = session(TOKEN);

    let ids = ["../../admin/users?x=1#frag", "acct 1/../2"];
    for id in ids {
        let err = backend.account(&session, id).await.unwrap_err();
        assert_eq!(err, BackendError::NotFound("No such account".to_string()));
    }

    let seen: Vec<Value> = recorded.bodies().into_iter().map(|(_, id)| id).collect();
    assert_eq!(seen, vec![json!(ids[0]), json!(ids[1])]);
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = backend(&format!("http://{addr}/api"));
    let err = backend
        .request_validation(&session(TOKEN), &transfer(500))
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Transport(_)));
}
