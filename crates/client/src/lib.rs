//! REST transport for the transaction backend.
//!
//! [`RestBackend`] is the implementation of [`TransactionBackend`] used in
//! production: JSON over HTTP, bearer token taken from the flow's session.

use std::time::Duration;

use api_types::{
    account::AccountView,
    error::ErrorBody,
    transaction::TransactionCommitted,
    validation::{ConfirmRequest, ValidationRequest, ValidationResponse},
};
use engine::{
    AccountSummary, BackendError, CodeRejection, CodeRejectionReason, CommittedTransaction, Intent,
    Session, TransactionBackend, ValidationId, ValidationTicket,
};
use reqwest::{Method, StatusCode, Url};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

mod mapping;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid base_url: {0}")]
    InvalidBaseUrl(String),
    #[error("failed to build http client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Which call a response belongs to; only confirmations carry code rejections.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Call {
    Validation,
    Confirmation,
    Read,
}

#[derive(Debug, Clone)]
pub struct RestBackend {
    base_url: Url,
    http: reqwest::Client,
}

impl RestBackend {
    pub fn builder() -> RestBackendBuilder {
        RestBackendBuilder::default()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| BackendError::Transport(format!("invalid endpoint {path}: {err}")))
    }

    /// `collection/id`, with `id` percent-encoded as a single path segment.
    fn resource(&self, collection: &str, id: &str) -> Result<Url, BackendError> {
        if matches!(id.trim(), "" | "." | "..") {
            return Err(BackendError::NotFound(format!("invalid id {id:?}")));
        }
        let mut url = self.endpoint(collection)?;
        url.path_segments_mut()
            .map_err(|()| BackendError::Transport(format!("{collection} cannot have path segments")))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    async fn send<TReq, TResp>(
        &self,
        session: &Session,
        method: Method,
        endpoint: Url,
        body: Option<&TReq>,
        call: Call,
    ) -> Result<TResp, BackendError>
    where
        TReq: Serialize + ?Sized,
        TResp: DeserializeOwned,
    {
        let path = endpoint.path().to_string();
        tracing::debug!("{method} {endpoint}");

        let mut req = self
            .http
            .request(method, endpoint)
            .bearer_auth(session.access_token());
        if let Some(body) = body {
            req = req.json(body);
        }

        let res = req.send().await.map_err(transport)?;
        let status = res.status();
        tracing::debug!("{path} answered {status}");
        if status.is_success() {
            return res.json::<TResp>().await.map_err(transport);
        }

        let body = res.json::<ErrorBody>().await.unwrap_or_else(|_| ErrorBody {
            error: "unknown error".to_string(),
            code: None,
        });
        Err(classify(status, body, call))
    }
}

fn transport(err: reqwest::Error) -> BackendError {
    BackendError::Transport(err.to_string())
}

fn classify(status: StatusCode, body: ErrorBody, call: Call) -> BackendError {
    let ErrorBody { error, code } = body;
    match status.as_u16() {
        401 => return BackendError::Unauthorized,
        403 => return BackendError::Forbidden,
        404 => return BackendError::NotFound(error),
        _ => {}
    }

    if call == Call::Confirmation {
        let reason = match (status.as_u16(), code.as_deref()) {
            (_, Some("ticket_expired" | "otp_expired")) | (410, _) => {
                Some(CodeRejectionReason::Expired)
            }
            (_, Some("invalid_code" | "otp_invalid")) | (400 | 422, _) => {
                Some(CodeRejectionReason::WrongCode)
            }
            _ => None,
        };
        if let Some(reason) = reason {
            return BackendError::CodeRejected(CodeRejection {
                reason,
                message: error,
            });
        }
    }

    BackendError::Rejected {
        status: status.as_u16(),
        message: error,
    }
}

impl TransactionBackend for RestBackend {
    async fn request_validation(
        &self,
        session: &Session,
        intent: &Intent,
    ) -> Result<ValidationTicket, BackendError> {
        let contact = mapping::map_contact(session.contact());
        let response: ValidationResponse = if let Some(draft) = mapping::payment_draft(intent) {
            let body = ValidationRequest { draft, contact };
            self.send(session, Method::POST, self.endpoint("payments/validation")?, Some(&body), Call::Validation)
                .await?
        } else if let Some(draft) = mapping::transfer_draft(intent) {
            let body = ValidationRequest { draft, contact };
            self.send(session, Method::POST, self.endpoint("transfers/validation")?, Some(&body), Call::Validation)
                .await?
        } else {
            return Err(BackendError::Transport("unsupported destination".to_string()));
        };
        Ok(mapping::ticket_from_api(response))
    }

    async fn confirm(
        &self,
        session: &Session,
        validation_id: &ValidationId,
        code: &str,
        intent: &Intent,
    ) -> Result<CommittedTransaction, BackendError> {
        let validation_id = mapping::wire_id(validation_id);
        let code = code.to_string();
        let response: TransactionCommitted = if let Some(draft) = mapping::payment_draft(intent) {
            let body = ConfirmRequest {
                validation_id,
                code,
                draft,
            };
            self.send(session, Method::POST, self.endpoint("payments/confirm")?, Some(&body), Call::Confirmation)
                .await?
        } else if let Some(draft) = mapping::transfer_draft(intent) {
            let body = ConfirmRequest {
                validation_id,
                code,
                draft,
            };
            self.send(session, Method::POST, self.endpoint("transfers/confirm")?, Some(&body), Call::Confirmation)
                .await?
        } else {
            return Err(BackendError::Transport("unsupported destination".to_string()));
        };
        Ok(mapping::committed_from_api(response))
    }

    async fn account(
        &self,
        session: &Session,
        account_id: &str,
    ) -> Result<AccountSummary, BackendError> {
        let endpoint = self.resource("accounts", account_id)?;
        let view: AccountView = self
            .send::<(), _>(session, Method::GET, endpoint, None, Call::Read)
            .await?;
        Ok(mapping::account_from_api(view))
    }
}

/// The builder for `RestBackend`.
#[derive(Default)]
pub struct RestBackendBuilder {
    base_url: String,
    timeout: Option<Duration>,
}

impl RestBackendBuilder {
    /// Backend root, e.g. `https://bank.example/api/`.
    pub fn base_url(mut self, base_url: &str) -> RestBackendBuilder {
        self.base_url = base_url.to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> RestBackendBuilder {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<RestBackend, ClientError> {
        // `Url::join` drops the last path segment unless the base ends with '/'.
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base_url = Url::parse(&raw).map_err(|err| ClientError::InvalidBaseUrl(err.to_string()))?;

        let http = reqwest::Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()?;

        tracing::info!("Using REST backend at {base_url}");
        Ok(RestBackend { base_url, http })
    }
}
