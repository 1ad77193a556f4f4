//! reqwest transport for the identity API with consistent timeouts and error
//! handling. Bodies of failed responses are sanitized before they are surfaced;
//! session tokens are never logged.

use super::{
    signing, types::QrCodeRequestBody, types::QrCodeResponse,
    types::SessionExchangeRequestBody, types::VerificationRequestBody, ClientError, Credentials,
    IdentityService, QrCode, SessionExchangeRequest, SessionIdentity, Verification,
    VerificationRequest,
};
use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info_span, Instrument};
use url::Url;

pub const QR_CODE_PATH: &str = "/v1/auth/qr";
pub const VERIFICATION_PATH: &str = "/v1/auth/verification";
pub const SESSION_PATH: &str = "/v1/auth/session";

/// Default request timeout applied when the call carries none of its own.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Maximum number of error body characters surfaced to the UI.
const MAX_ERROR_CHARS: usize = 200;

/// Identity API client over HTTP.
#[derive(Debug, Clone)]
pub struct HttpIdentityClient {
    client: Client,
    base_url: Url,
}

impl HttpIdentityClient {
    /// Build a client for the API at `base_url`.
    ///
    /// # Errors
    /// Returns `ClientError::Config` if the URL is invalid or not http(s), or the
    /// underlying HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| ClientError::Config(format!("invalid API URL: {e}")))?;

        match base_url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(ClientError::Config(format!(
                    "unsupported API URL scheme: {scheme}"
                )))
            }
        }

        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        let url = build_url_with_base(self.base_url.as_str(), path);
        debug!("endpoint URL: {}", url);
        Url::parse(&url).map_err(|e| ClientError::Config(format!("invalid endpoint URL: {e}")))
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        timeout: Option<Duration>,
    ) -> Result<T, ClientError> {
        let url = self.endpoint(path)?;

        let span = info_span!("identity.request", http.method = "POST", url = %url);

        let mut request = self.client.post(url).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .instrument(span)
            .await
            .map_err(|e| ClientError::from_request(&e))?;

        handle_json_response(response).await
    }
}

#[async_trait]
impl IdentityService for HttpIdentityClient {
    async fn issue_qr_code(&self, credentials: &Credentials) -> Result<QrCode, ClientError> {
        let timestamp = unix_timestamp()?;
        let signature = signing::sign_issuance(credentials, timestamp)?;

        let body = QrCodeRequestBody {
            app_id: credentials.application_id(),
            hub_id: credentials.hub_id(),
            timestamp,
            signature,
        };

        let response: QrCodeResponse = self.post_json(QR_CODE_PATH, &body, None).await?;

        if response.transaction_id.trim().is_empty() {
            return Err(ClientError::Decode(
                "QR response is missing the transaction id".to_string(),
            ));
        }

        let qr = QrCode::new(response.qr_code_base64, response.transaction_id);
        qr.png_bytes()?;

        Ok(qr)
    }

    async fn check_verification(
        &self,
        request: &VerificationRequest,
    ) -> Result<Verification, ClientError> {
        let body = VerificationRequestBody::from(request);
        self.post_json(VERIFICATION_PATH, &body, Some(request.timeout))
            .await
    }

    async fn exchange_session(
        &self,
        request: &SessionExchangeRequest,
    ) -> Result<SessionIdentity, ClientError> {
        let body = SessionExchangeRequestBody::from(request);
        let identity: SessionIdentity = self.post_json(SESSION_PATH, &body, None).await?;

        if !valid_email(&identity.email) {
            return Err(ClientError::Decode(
                "session response carries an invalid email".to_string(),
            ));
        }

        Ok(identity)
    }
}

fn unix_timestamp() -> Result<u64, ClientError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| ClientError::Signing(format!("system clock is before the unix epoch: {e}")))
}

#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").map_or(false, |re| re.is_match(email))
}

/// Builds a URL from an explicit base URL and the provided path.
fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

/// Parses JSON responses and surfaces HTTP errors with sanitized bodies.
async fn handle_json_response<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        response
            .json::<T>()
            .await
            .map_err(|err| ClientError::Decode(format!("Failed to decode response: {err}")))
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::Http {
            status: status.as_u16(),
            message: sanitize_body(&body),
        })
    }
}

/// Sanitizes HTTP error bodies for user-facing messages by trimming and truncating.
fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}
