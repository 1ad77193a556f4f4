use crate::{
    cli::{
        actions::{login::Args, Action},
        commands::{identity, poll},
    },
    identity::{signing::decode_signing_key, Credentials},
    session::PollSettings,
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::{path::PathBuf, time::Duration};

/// # Errors
/// Returns an error if required arguments are missing or the credentials are invalid.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let api_url = matches
        .get_one::<String>(identity::ARG_API_URL)
        .cloned()
        .unwrap_or_else(|| identity::DEFAULT_API_URL.to_string());

    let app_id = matches
        .get_one::<String>(identity::ARG_APP_ID)
        .cloned()
        .context("missing required argument: --app-id")?;
    let hub_id = matches
        .get_one::<String>(identity::ARG_HUB_ID)
        .cloned()
        .context("missing required argument: --hub-id")?;
    let signing_key = matches
        .get_one::<String>(identity::ARG_SIGNING_KEY)
        .cloned()
        .map(SecretString::from)
        .context("missing required argument: --signing-key")?;

    // Fail before any request goes out
    decode_signing_key(&signing_key).context("invalid IAM_AUTH_SIGNING_KEY")?;

    let credentials =
        Credentials::new(app_id, hub_id, signing_key).context("invalid deployment credentials")?;

    let settings = PollSettings {
        interval: millis(matches, poll::ARG_POLL_INTERVAL, 2000),
        check_timeout: millis(matches, poll::ARG_CHECK_TIMEOUT, 5000),
    };

    let max_wait = Duration::from_secs(
        matches
            .get_one::<u64>(poll::ARG_MAX_WAIT)
            .copied()
            .unwrap_or(120),
    );

    let qr_output = matches.get_one::<String>(poll::ARG_QR_OUTPUT).map(PathBuf::from);

    Ok(Action::Login(Args {
        api_url,
        credentials,
        settings,
        max_wait,
        qr_output,
    }))
}

fn millis(matches: &clap::ArgMatches, id: &str, default: u64) -> Duration {
    Duration::from_millis(matches.get_one::<u64>(id).copied().unwrap_or(default))
}
