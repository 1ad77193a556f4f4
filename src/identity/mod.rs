//! Client for the I-AM identity API: QR issuance, verification checks and
//! session exchange. The session coordinator only talks to the
//! [`IdentityService`] trait; [`HttpIdentityClient`] is the production
//! implementation and tests substitute in-memory doubles.

mod credentials;
mod error;
pub mod http;
pub mod signing;
mod types;

pub use self::credentials::Credentials;
pub use self::error::ClientError;
pub use self::http::HttpIdentityClient;
pub use self::types::{
    QrCode, SessionExchangeRequest, SessionIdentity, SessionToken, Verification,
    VerificationRequest,
};

use async_trait::async_trait;

/// The three remote operations a login attempt depends on.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Issue a QR code for a new authentication transaction.
    ///
    /// # Errors
    /// Returns an error if the request cannot be signed, the API is unreachable,
    /// or it rejects the request.
    async fn issue_qr_code(&self, credentials: &Credentials) -> Result<QrCode, ClientError>;

    /// Check once whether a transaction has been approved. Not a long-poll; the
    /// caller re-invokes it on its own schedule.
    ///
    /// # Errors
    /// Returns an error on transport failure, timeout, or a non-success response.
    async fn check_verification(
        &self,
        request: &VerificationRequest,
    ) -> Result<Verification, ClientError>;

    /// Exchange a verified transaction's encrypted token for the user identity.
    ///
    /// # Errors
    /// Returns an error if the token/IV pair is invalid or expired.
    async fn exchange_session(
        &self,
        request: &SessionExchangeRequest,
    ) -> Result<SessionIdentity, ClientError>;
}
