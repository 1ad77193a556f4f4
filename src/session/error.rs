use crate::identity::ClientError;
use thiserror::Error;

/// Why a login attempt ended without a session.
///
/// `Display` is the message shown to the user; the underlying client error is
/// kept as the source for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("{0}")]
    Issuance(#[source] ClientError),
    #[error("Verification failed")]
    Verification(#[source] ClientError),
    #[error("Verification failed")]
    Exchange(#[source] ClientError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthErrorKind {
    Issuance,
    Verification,
    Exchange,
}

impl AuthError {
    #[must_use]
    pub const fn kind(&self) -> AuthErrorKind {
        match self {
            Self::Issuance(_) => AuthErrorKind::Issuance,
            Self::Verification(_) => AuthErrorKind::Verification,
            Self::Exchange(_) => AuthErrorKind::Exchange,
        }
    }

    #[must_use]
    pub const fn cause(&self) -> &ClientError {
        match self {
            Self::Issuance(err) | Self::Verification(err) | Self::Exchange(err) => err,
        }
    }
}
