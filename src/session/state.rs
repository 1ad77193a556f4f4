use super::AuthError;
use crate::identity::QrCode;
use tokio::task::{AbortHandle, JoinHandle};
use ulid::Ulid;

/// Where a login attempt currently stands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    IssuingQr,
    Polling,
    Exchanging,
    Authenticated,
    Failed,
}

/// Correlation id of one login attempt, used in logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AttemptId(Ulid);

impl AttemptId {
    pub(crate) fn new() -> Self {
        Self(Ulid::new())
    }
}

impl std::fmt::Display for AttemptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// Read-only view of the session published to the presentation layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub phase: Phase,
    pub attempt: Option<AttemptId>,
    pub is_authenticated: bool,
    pub user_email: Option<String>,
    pub qr_code: Option<QrCode>,
    pub loading: bool,
    pub error: Option<AuthError>,
    pub poll_active: bool,
}

impl AuthSnapshot {
    #[must_use]
    pub fn transaction_id(&self) -> Option<&str> {
        self.qr_code.as_ref().map(QrCode::transaction_id)
    }

    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    /// No request of the current attempt is outstanding.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        !self.loading
    }
}

/// The single outstanding poll task of an attempt.
#[derive(Debug)]
pub(crate) struct PollHandle {
    generation: u64,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub(crate) const fn new(generation: u64, task: JoinHandle<()>) -> Self {
        Self { generation, task }
    }
}

/// Mutable session state, owned by the coordinator.
///
/// `generation` increases on every new attempt, sign-out and teardown; work
/// started under an older generation must not write here.
#[derive(Debug, Default)]
pub(crate) struct AuthSession {
    generation: u64,
    attempt: Option<AttemptId>,
    phase: Phase,
    user_email: Option<String>,
    qr_code: Option<QrCode>,
    loading: bool,
    error: Option<AuthError>,
    // QR request of the current attempt, detached from the caller's future
    issuance: Option<AbortHandle>,
    poll: Option<PollHandle>,
    // exchange running on the former poll task after verification
    exchange: Option<AbortHandle>,
}

impl AuthSession {
    pub(crate) const fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    pub(crate) const fn phase(&self) -> Phase {
        self.phase
    }

    /// Abort any issuance, poll or exchange task. Idempotent.
    fn cancel_tasks(&mut self) {
        if let Some(issuance) = self.issuance.take() {
            issuance.abort();
        }
        if let Some(poll) = self.poll.take() {
            poll.task.abort();
        }
        if let Some(exchange) = self.exchange.take() {
            exchange.abort();
        }
    }

    /// Cancel the previous attempt and enter `IssuingQr` for a fresh one.
    pub(crate) fn begin_attempt(&mut self) -> (u64, AttemptId) {
        self.cancel_tasks();
        self.generation += 1;

        let attempt = AttemptId::new();
        self.attempt = Some(attempt);
        self.phase = Phase::IssuingQr;
        self.user_email = None;
        self.qr_code = None;
        self.loading = true;
        self.error = None;

        (self.generation, attempt)
    }

    pub(crate) fn begin_issuance(&mut self, issuance: AbortHandle) {
        self.issuance = Some(issuance);
    }

    pub(crate) fn start_polling(&mut self, qr_code: QrCode, poll: PollHandle) {
        debug_assert_eq!(poll.generation, self.generation);
        self.issuance = None;
        self.qr_code = Some(qr_code);
        self.phase = Phase::Polling;
        self.poll = Some(poll);
    }

    /// Stop ticking before the exchange; the task itself carries on with it.
    pub(crate) fn begin_exchange(&mut self) {
        if let Some(poll) = self.poll.take() {
            self.exchange = Some(poll.task.abort_handle());
        }
        self.phase = Phase::Exchanging;
    }

    pub(crate) fn authenticate(&mut self, email: String) {
        self.release_tasks();
        self.phase = Phase::Authenticated;
        self.user_email = Some(email);
        self.loading = false;
        self.error = None;
    }

    pub(crate) fn fail(&mut self, error: AuthError) {
        self.release_tasks();
        self.phase = Phase::Failed;
        self.loading = false;
        self.error = Some(error);
    }

    /// Back to `Idle` with every field cleared. Idempotent apart from the
    /// generation bump, which only invalidates in-flight work.
    pub(crate) fn reset(&mut self) {
        self.cancel_tasks();
        self.generation += 1;
        self.attempt = None;
        self.phase = Phase::Idle;
        self.user_email = None;
        self.qr_code = None;
        self.loading = false;
        self.error = None;
    }

    // Called from the task being released, so the handles are dropped rather
    // than aborted.
    fn release_tasks(&mut self) {
        self.issuance = None;
        self.poll = None;
        self.exchange = None;
    }

    pub(crate) fn snapshot(&self) -> AuthSnapshot {
        AuthSnapshot {
            phase: self.phase,
            attempt: self.attempt,
            is_authenticated: self.phase == Phase::Authenticated,
            user_email: self.user_email.clone(),
            qr_code: self.qr_code.clone(),
            loading: self.loading,
            error: self.error.clone(),
            poll_active: self.poll.is_some(),
        }
    }
}
