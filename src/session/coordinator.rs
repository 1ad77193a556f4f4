use super::{
    state::{AuthSession, PollHandle},
    AttemptId, AuthError, AuthSnapshot,
};
use crate::identity::{
    ClientError, Credentials, IdentityService, QrCode, SessionExchangeRequest, SessionToken,
    VerificationRequest,
};
use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};
use tokio::{
    sync::watch,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, error, info, info_span, Instrument, Span};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_millis(5000);

/// Timing of the verification poll.
///
/// `interval` is the spacing between checks; `check_timeout` bounds each
/// individual check request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub check_timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            check_timeout: DEFAULT_CHECK_TIMEOUT,
        }
    }
}

/// Owner of the passwordless login lifecycle.
///
/// Dropping the coordinator cancels any outstanding issuance or poll and
/// resets the session.
pub struct Coordinator {
    shared: Arc<Shared>,
}

struct Shared {
    client: Arc<dyn IdentityService>,
    credentials: Credentials,
    settings: PollSettings,
    session: Mutex<AuthSession>,
    snapshots: watch::Sender<AuthSnapshot>,
}

impl Coordinator {
    #[must_use]
    pub fn new(
        client: Arc<dyn IdentityService>,
        credentials: Credentials,
        settings: PollSettings,
    ) -> Self {
        let session = AuthSession::default();
        let (snapshots, _) = watch::channel(session.snapshot());

        Self {
            shared: Arc::new(Shared {
                client,
                credentials,
                settings,
                session: Mutex::new(session),
                snapshots,
            }),
        }
    }

    /// Current state of the session.
    #[must_use]
    pub fn snapshot(&self) -> AuthSnapshot {
        self.shared.snapshots.borrow().clone()
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.shared.snapshots.subscribe()
    }

    /// Start a new login attempt, replacing whatever attempt came before.
    ///
    /// The previous poll is cancelled before the QR request goes out. Returns
    /// once issuance has completed; polling continues in the background. The
    /// outcome is reported through the session state, never as an error here.
    ///
    /// The request runs on its own task, so dropping this future does not
    /// abandon the attempt: issuance still completes and settles the session.
    pub async fn start_authentication(&self) {
        let issuance = {
            let mut session = self.shared.lock();
            let (generation, attempt) = session.begin_attempt();

            let span = info_span!("auth.attempt", attempt = %attempt);
            let task = tokio::spawn(
                issue(Arc::clone(&self.shared), generation, attempt).instrument(span),
            );
            session.begin_issuance(task.abort_handle());
            self.shared.publish(&session);
            task
        };

        // Aborted by a newer attempt, sign-out or teardown
        if let Err(err) = issuance.await {
            debug!("issuance task ended early: {err}");
        }
    }

    /// Clear the session and cancel any outstanding poll. Idempotent.
    pub fn sign_out(&self) {
        self.shared.update(AuthSession::reset);
        info!("signed out");
    }

    /// Tear down: cancel outstanding work so nothing touches the session again.
    pub fn shutdown(&self) {
        self.shared.update(AuthSession::reset);
        debug!("coordinator shut down");
    }

    /// Wait until the current attempt is over: authenticated, failed or
    /// signed out. Resolves immediately when nothing is in flight.
    pub async fn wait_until_settled(&self) -> AuthSnapshot {
        let mut receiver = self.subscribe();
        let settled = receiver
            .wait_for(AuthSnapshot::is_settled)
            .await
            .map(|snapshot| snapshot.clone());
        settled.unwrap_or_else(|_| self.snapshot())
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("credentials", &self.shared.credentials)
            .field("settings", &self.shared.settings)
            .field("phase", &self.shared.lock().phase())
            .finish_non_exhaustive()
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, AuthSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, session: &AuthSession) {
        self.snapshots.send_replace(session.snapshot());
    }

    fn update<R>(&self, f: impl FnOnce(&mut AuthSession) -> R) -> R {
        let mut session = self.lock();
        let result = f(&mut session);
        self.publish(&session);
        result
    }

    /// Apply `f` only if `generation` is still the live attempt.
    fn update_current<R>(
        &self,
        generation: u64,
        f: impl FnOnce(&mut AuthSession) -> R,
    ) -> Option<R> {
        let mut session = self.lock();
        if !session.is_current(generation) {
            debug!("discarding result of a superseded attempt");
            return None;
        }
        let result = f(&mut session);
        self.publish(&session);
        Some(result)
    }
}

async fn issue(shared: Arc<Shared>, generation: u64, attempt: AttemptId) {
    info!("requesting QR code");
    let result = shared.client.issue_qr_code(&shared.credentials).await;
    finish_issuance(&shared, generation, attempt, result);
}

fn finish_issuance(
    shared: &Arc<Shared>,
    generation: u64,
    attempt: AttemptId,
    result: Result<QrCode, ClientError>,
) {
    shared.update_current(generation, |session| match result {
        Ok(qr_code) => {
            info!(
                transaction_id = %qr_code.transaction_id(),
                "QR code issued, polling for verification"
            );
            let task = tokio::spawn(
                poll(
                    Arc::downgrade(shared),
                    generation,
                    qr_code.transaction_id().to_string(),
                )
                .instrument(Span::current()),
            );
            session.start_polling(qr_code, PollHandle::new(generation, task));
        }
        Err(err) => {
            error!(%attempt, "QR issuance failed: {err}");
            session.fail(AuthError::Issuance(err));
        }
    });
}

/// Periodic verification check for one transaction. Ends on verification, on
/// the first failed check, or when its attempt is no longer current.
async fn poll(shared: Weak<Shared>, generation: u64, transaction_id: String) {
    let Some(settings) = shared.upgrade().map(|shared| shared.settings) else {
        return;
    };

    let mut ticker = interval_at(Instant::now() + settings.interval, settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let Some(shared) = shared.upgrade() else {
            return;
        };
        if !shared.lock().is_current(generation) {
            return;
        }

        let request = VerificationRequest {
            application_id: shared.credentials.application_id().to_string(),
            transaction_id: transaction_id.clone(),
            timeout: settings.check_timeout,
        };

        match shared.client.check_verification(&request).await {
            Ok(verification) => {
                let Some(token) = verification.into_session_token() else {
                    debug!(%transaction_id, "transaction not verified yet");
                    continue;
                };
                exchange(&shared, generation, token).await;
                return;
            }
            Err(err) => {
                error!(%transaction_id, "Verification check failed: {err}");
                shared.update_current(generation, |session| {
                    session.fail(AuthError::Verification(err));
                });
                return;
            }
        }
    }
}

async fn exchange(shared: &Shared, generation: u64, token: SessionToken) {
    if shared
        .update_current(generation, AuthSession::begin_exchange)
        .is_none()
    {
        return;
    }
    info!("transaction verified, exchanging session token");

    let request = SessionExchangeRequest {
        token,
        application_id: shared.credentials.application_id().to_string(),
    };
    let result = shared.client.exchange_session(&request).await;

    shared.update_current(generation, |session| match result {
        Ok(identity) => {
            info!(email = %identity.email, "authenticated");
            session.authenticate(identity.email);
        }
        Err(err) => {
            error!("Session exchange failed: {err}");
            session.fail(AuthError::Exchange(err));
        }
    });
}
