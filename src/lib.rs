//! # I-AM Auth (Passwordless QR Login)
//!
//! `iam-auth` drives the passwordless login flow against the I-AM identity API.
//! A login attempt issues a QR code, waits for the user to approve it with the
//! mobile app, and trades the resulting encrypted session token for the user's
//! identity.
//!
//! ## Flow
//!
//! 1. **Issuance:** the client signs `<appId>.<hubId>.<timestamp>` with the
//!    deployment's Ed25519 key and receives a QR image plus a transaction id.
//! 2. **Polling:** every poll interval the transaction is checked with a bounded
//!    per-request timeout. A failed check ends the attempt; there is no retry.
//! 3. **Exchange:** once verified, the encrypted session token and IV are
//!    exchanged for the user's email and the session is authenticated.
//!
//! ## Ownership
//!
//! The [`session::Coordinator`] is the only writer of the session state. Readers
//! observe immutable [`session::AuthSnapshot`]s through a watch channel. At most
//! one poll task exists per coordinator; starting a new attempt, signing out, or
//! dropping the coordinator cancels it before anything else happens.

pub mod cli;
pub mod identity;
pub mod session;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
