use clap::{Arg, Command};

pub const ARG_POLL_INTERVAL: &str = "poll-interval-ms";
pub const ARG_CHECK_TIMEOUT: &str = "check-timeout-ms";
pub const ARG_MAX_WAIT: &str = "max-wait";
pub const ARG_QR_OUTPUT: &str = "qr-output";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_POLL_INTERVAL)
                .long("poll-interval-ms")
                .help("Milliseconds between verification checks")
                .default_value("2000")
                .env("IAM_AUTH_POLL_INTERVAL_MS")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_CHECK_TIMEOUT)
                .long("check-timeout-ms")
                .help("Timeout of a single verification check in milliseconds")
                .default_value("5000")
                .env("IAM_AUTH_CHECK_TIMEOUT_MS")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_MAX_WAIT)
                .long("max-wait")
                .help("Seconds to wait for the QR code to be scanned before giving up")
                .default_value("120")
                .env("IAM_AUTH_MAX_WAIT")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_QR_OUTPUT)
                .short('o')
                .long("qr-output")
                .help("Write the QR code PNG to this path instead of printing a data URI")
                .env("IAM_AUTH_QR_OUTPUT"),
        )
}
