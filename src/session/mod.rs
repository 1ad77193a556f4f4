//! Authentication session coordinator: the passwordless login state machine.
//!
//! ```text
//! Idle --start--> IssuingQr --issued--> Polling --verified--> Exchanging --ok--> Authenticated
//!                     |                    |                       |
//!                     +--------------------+-----------------------+--err--> Failed
//! ```
//!
//! `sign_out` returns to `Idle` from anywhere; `start_authentication` begins a
//! fresh attempt from anywhere, cancelling the previous one first.

mod coordinator;
mod error;
mod gate;
mod state;

pub use self::coordinator::{
    Coordinator, PollSettings, DEFAULT_CHECK_TIMEOUT, DEFAULT_POLL_INTERVAL,
};
pub use self::error::{AuthError, AuthErrorKind};
pub use self::gate::Access;
pub use self::state::{AttemptId, AuthSnapshot, Phase};
