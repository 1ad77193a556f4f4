use crate::{
    identity::{Credentials, HttpIdentityClient, QrCode},
    session::{Access, AuthSnapshot, Coordinator, Phase, PollSettings},
};
use anyhow::{anyhow, bail, Context, Result};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct Args {
    pub api_url: String,
    pub credentials: Credentials,
    pub settings: PollSettings,
    pub max_wait: Duration,
    pub qr_output: Option<PathBuf>,
}

/// Run one passwordless login from the terminal.
///
/// Shows the QR code, reports progress until the user approves it, and prints
/// the authenticated email.
/// # Errors
/// Returns an error if the attempt fails, is cancelled, or is not approved within `max_wait`.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let client = HttpIdentityClient::new(&args.api_url).context("invalid identity API URL")?;
    debug!(base_url = %client.base_url(), "identity client ready");

    let coordinator = Coordinator::new(Arc::new(client), args.credentials, args.settings);
    let mut receiver = coordinator.subscribe();

    let deadline = tokio::time::sleep(args.max_wait);
    tokio::pin!(deadline);

    let issuance = coordinator.start_authentication();
    tokio::pin!(issuance);
    let mut issued = false;

    let mut shown_transaction: Option<String> = None;
    let mut last_status: Option<&'static str> = None;

    loop {
        let snapshot = receiver.borrow_and_update().clone();

        if let Some(qr) = &snapshot.qr_code {
            if shown_transaction.as_deref() != Some(qr.transaction_id()) {
                present_qr(qr, args.qr_output.as_ref())?;
                shown_transaction = Some(qr.transaction_id().to_string());
            }
        }

        let status = status_line(&snapshot);
        if last_status != Some(status) && !status.is_empty() {
            println!("{status}");
            last_status = Some(status);
        }

        // Nothing to judge until the attempt has begun
        if issued || snapshot.attempt.is_some() {
            match outcome(&snapshot) {
                Outcome::Continue => {}
                Outcome::SignedIn(email) => {
                    println!("Signed in as {email}");
                    return Ok(());
                }
                Outcome::Failed(message) => bail!("login failed: {message}"),
            }
        }

        tokio::select! {
            () = &mut issuance, if !issued => {
                issued = true;
            }
            changed = receiver.changed() => {
                changed.map_err(|_| anyhow!("session closed unexpectedly"))?;
            }
            _ = tokio::signal::ctrl_c() => {
                coordinator.sign_out();
                bail!("login cancelled");
            }
            () = &mut deadline => {
                coordinator.sign_out();
                warn!("no approval after {}s", args.max_wait.as_secs());
                bail!("timed out waiting for the QR code to be approved");
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Continue,
    SignedIn(String),
    Failed(String),
}

fn outcome(snapshot: &AuthSnapshot) -> Outcome {
    match Access::from(snapshot) {
        Access::Pending => Outcome::Continue,
        Access::Granted { email } => Outcome::SignedIn(email),
        Access::LoginRequired { error: Some(message) } => Outcome::Failed(message),
        // Settled without error or identity: the session was reset under us
        Access::LoginRequired { error: None } => Outcome::Failed("session reset".to_string()),
    }
}

/// One-line progress message for the current phase.
fn status_line(snapshot: &AuthSnapshot) -> &'static str {
    match snapshot.phase {
        Phase::Idle | Phase::Authenticated | Phase::Failed => "",
        Phase::IssuingQr => "Requesting QR code...",
        Phase::Polling => "Waiting for the QR code to be scanned and approved...",
        Phase::Exchanging => "Approved, completing sign in...",
    }
}

fn present_qr(qr: &QrCode, output: Option<&PathBuf>) -> Result<()> {
    debug!(transaction_id = qr.transaction_id(), "QR code issued");
    match output {
        Some(path) => {
            let png = qr.png_bytes()?;
            std::fs::write(path, png)
                .with_context(|| format!("could not write QR code to {}", path.display()))?;
            println!("QR code written to {}", path.display());
        }
        None => {
            println!("Scan this QR code with the I-AM app:");
            println!("{}", qr.data_uri());
        }
    }
    Ok(())
}

fn log_startup_args(args: &Args) {
    let entries = [
        ("api_url", args.api_url.clone()),
        ("app_id", args.credentials.application_id().to_string()),
        ("hub_id", args.credentials.hub_id().to_string()),
        ("signing_key", "REDACTED".to_string()),
        (
            "poll_interval",
            format!("{}ms", args.settings.interval.as_millis()),
        ),
        (
            "check_timeout",
            format!("{}ms", args.settings.check_timeout.as_millis()),
        ),
        ("max_wait", format!("{}s", args.max_wait.as_secs())),
        (
            "qr_output",
            args.qr_output
                .as_ref()
                .map_or_else(|| "stdout".to_string(), |p| p.display().to_string()),
        ),
    ];

    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "iam-auth {} - {}\n\nStartup configuration:",
        env!("CARGO_PKG_VERSION"),
        short_commit(crate::GIT_COMMIT_HASH)
    );
    for (key, value) in entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn short_commit(hash: &str) -> String {
    let trimmed = hash.trim();
    trimmed.chars().take(7).collect()
}
