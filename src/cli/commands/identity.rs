use clap::{Arg, Command};

pub const ARG_API_URL: &str = "api-url";
pub const ARG_APP_ID: &str = "app-id";
pub const ARG_HUB_ID: &str = "hub-id";
pub const ARG_SIGNING_KEY: &str = "signing-key";

pub const DEFAULT_API_URL: &str = "https://api.i-am.tech";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_URL)
                .long("api-url")
                .help("Identity API base URL")
                .default_value(DEFAULT_API_URL)
                .env("IAM_AUTH_API_URL"),
        )
        .arg(
            Arg::new(ARG_APP_ID)
                .long("app-id")
                .help("Application id issued for this deployment (UUID)")
                .env("IAM_AUTH_APP_ID")
                .required(true),
        )
        .arg(
            Arg::new(ARG_HUB_ID)
                .long("hub-id")
                .help("Hub id issued for this deployment (UUID)")
                .env("IAM_AUTH_HUB_ID")
                .required(true),
        )
        .arg(
            Arg::new(ARG_SIGNING_KEY)
                .long("signing-key")
                .help("Ed25519 signing key, base64 PKCS#8 DER")
                .env("IAM_AUTH_SIGNING_KEY")
                .hide_env_values(true)
                .required(true),
        )
}
