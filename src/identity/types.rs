//! Request and response types for the identity API. These payloads carry the
//! encrypted session token and its IV, so their `Debug` output is redacted and
//! they must never be logged verbatim.

use super::ClientError;
use base64ct::{Base64, Encoding};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Issued QR code together with the transaction it encodes.
///
/// Image and transaction id are produced by the same issuance call and always
/// travel together.
#[derive(Clone, PartialEq, Eq)]
pub struct QrCode {
    image_base64: String,
    transaction_id: String,
}

impl QrCode {
    #[must_use]
    pub fn new(image_base64: impl Into<String>, transaction_id: impl Into<String>) -> Self {
        Self {
            image_base64: image_base64.into(),
            transaction_id: transaction_id.into(),
        }
    }

    /// Base64 encoded PNG as returned by the API.
    #[must_use]
    pub fn image_base64(&self) -> &str {
        &self.image_base64
    }

    #[must_use]
    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    /// Decoded PNG bytes.
    ///
    /// # Errors
    /// Returns `ClientError::Decode` if the image is not valid base64.
    pub fn png_bytes(&self) -> Result<Vec<u8>, ClientError> {
        Base64::decode_vec(self.image_base64.trim())
            .map_err(|_| ClientError::Decode("QR image is not valid base64".to_string()))
    }

    /// `data:` URI suitable for an `<img>` tag.
    #[must_use]
    pub fn data_uri(&self) -> String {
        format!("data:image/png;base64,{}", self.image_base64)
    }
}

impl std::fmt::Debug for QrCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QrCode")
            .field("image_len", &self.image_base64.len())
            .field("transaction_id", &self.transaction_id)
            .finish()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QrCodeRequestBody<'a> {
    pub app_id: &'a str,
    pub hub_id: &'a str,
    pub timestamp: u64,
    pub signature: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QrCodeResponse {
    pub qr_code_base64: String,
    pub transaction_id: String,
}

/// A single bounded verification check for one transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationRequest {
    pub application_id: String,
    pub transaction_id: String,
    pub timeout: Duration,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VerificationRequestBody<'a> {
    pub application_id: &'a str,
    pub transaction_id: &'a str,
    pub timeout_in_ms: u64,
}

impl<'a> From<&'a VerificationRequest> for VerificationRequestBody<'a> {
    fn from(request: &'a VerificationRequest) -> Self {
        Self {
            application_id: &request.application_id,
            transaction_id: &request.transaction_id,
            timeout_in_ms: u64::try_from(request.timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Outcome of a verification check.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub encrypted_session_token: Option<String>,
    #[serde(default)]
    pub encryption_iv: Option<String>,
}

impl Verification {
    /// Transaction not yet approved.
    #[must_use]
    pub fn pending() -> Self {
        Self::default()
    }

    /// Transaction approved, carrying the encrypted session token.
    #[must_use]
    pub fn approved(token: impl Into<String>, iv: impl Into<String>) -> Self {
        Self {
            verified: true,
            encrypted_session_token: Some(token.into()),
            encryption_iv: Some(iv.into()),
        }
    }

    /// Session token, only when verified and both token and IV are present.
    #[must_use]
    pub fn into_session_token(self) -> Option<SessionToken> {
        if !self.verified {
            return None;
        }
        match (self.encrypted_session_token, self.encryption_iv) {
            (Some(token), Some(iv)) if !token.is_empty() && !iv.is_empty() => Some(SessionToken {
                encrypted_session_token: token,
                encryption_iv: iv,
            }),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Verification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Verification")
            .field("verified", &self.verified)
            .field(
                "encrypted_session_token",
                &self.encrypted_session_token.as_ref().map(|_| "***"),
            )
            .field("encryption_iv", &self.encryption_iv.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Encrypted session token released by a verified transaction.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken {
    pub encrypted_session_token: String,
    pub encryption_iv: String,
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionExchangeRequest {
    pub token: SessionToken,
    pub application_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SessionExchangeRequestBody<'a> {
    pub encrypted_session_token: &'a str,
    pub encryption_iv: &'a str,
    pub application_id: &'a str,
}

impl<'a> From<&'a SessionExchangeRequest> for SessionExchangeRequestBody<'a> {
    fn from(request: &'a SessionExchangeRequest) -> Self {
        Self {
            encrypted_session_token: &request.token.encrypted_session_token,
            encryption_iv: &request.token.encryption_iv,
            application_id: &request.application_id,
        }
    }
}

/// Identity established by a successful session exchange.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SessionIdentity {
    pub email: String,
}
