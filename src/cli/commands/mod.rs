pub mod identity;
pub mod logging;
pub mod poll;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    ColorChoice, Command,
};

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("iam-auth")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles);

    let command = identity::with_args(command);
    let command = poll::with_args(command);
    logging::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    const APP_ID: &str = "0f6a3c1e-7d2b-4a58-9c41-2e8b5d7f9a10";
    const HUB_ID: &str = "5b1d9e47-3c6a-4f20-8e15-a7c2d4b6e893";

    fn clear_env<F: FnOnce()>(f: F) {
        temp_env::with_vars(
            [
                ("IAM_AUTH_API_URL", None::<&str>),
                ("IAM_AUTH_APP_ID", None),
                ("IAM_AUTH_HUB_ID", None),
                ("IAM_AUTH_SIGNING_KEY", None),
                ("IAM_AUTH_POLL_INTERVAL_MS", None),
                ("IAM_AUTH_CHECK_TIMEOUT_MS", None),
                ("IAM_AUTH_MAX_WAIT", None),
                ("IAM_AUTH_QR_OUTPUT", None),
                ("IAM_AUTH_LOG_LEVEL", None),
                ("IAM_AUTH_LOG_JSON", None),
            ],
            f,
        );
    }

    fn required_args() -> Vec<String> {
        vec![
            "iam-auth".to_string(),
            "--app-id".to_string(),
            APP_ID.to_string(),
            "--hub-id".to_string(),
            HUB_ID.to_string(),
            "--signing-key".to_string(),
            "a2V5".to_string(),
        ]
    }

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "iam-auth");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some(env!("CARGO_PKG_DESCRIPTION").to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_defaults() {
        clear_env(|| {
            let matches = new().get_matches_from(required_args());
            assert_eq!(
                matches.get_one::<String>(identity::ARG_API_URL).cloned(),
                Some(identity::DEFAULT_API_URL.to_string())
            );
            assert_eq!(
                matches.get_one::<u64>(poll::ARG_POLL_INTERVAL).copied(),
                Some(2000)
            );
            assert_eq!(
                matches.get_one::<u64>(poll::ARG_CHECK_TIMEOUT).copied(),
                Some(5000)
            );
            assert_eq!(matches.get_one::<u64>(poll::ARG_MAX_WAIT).copied(), Some(120));
            assert_eq!(matches.get_one::<String>(poll::ARG_QR_OUTPUT), None);
            assert!(!matches.get_flag(logging::ARG_LOG_JSON));
        });
    }

    #[test]
    fn test_missing_credentials_is_an_error() {
        clear_env(|| {
            let result = new().try_get_matches_from(vec!["iam-auth", "--app-id", APP_ID]);
            assert!(result.is_err());
        });
    }

    #[test]
    fn test_zero_poll_interval_is_rejected() {
        clear_env(|| {
            let mut args = required_args();
            args.extend(["--poll-interval-ms".to_string(), "0".to_string()]);
            assert!(new().try_get_matches_from(args).is_err());
        });
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("IAM_AUTH_API_URL", Some("https://api.example.test")),
                ("IAM_AUTH_APP_ID", Some(APP_ID)),
                ("IAM_AUTH_HUB_ID", Some(HUB_ID)),
                ("IAM_AUTH_SIGNING_KEY", Some("a2V5")),
                ("IAM_AUTH_POLL_INTERVAL_MS", Some("500")),
                ("IAM_AUTH_CHECK_TIMEOUT_MS", Some("1500")),
                ("IAM_AUTH_MAX_WAIT", Some("30")),
                ("IAM_AUTH_QR_OUTPUT", Some("/tmp/qr.png")),
                ("IAM_AUTH_LOG_LEVEL", Some("info")),
                ("IAM_AUTH_LOG_JSON", Some("true")),
            ],
            || {
                let matches = new().get_matches_from(vec!["iam-auth"]);
                assert_eq!(
                    matches.get_one::<String>(identity::ARG_API_URL).cloned(),
                    Some("https://api.example.test".to_string())
                );
                assert_eq!(
                    matches.get_one::<String>(identity::ARG_APP_ID).cloned(),
                    Some(APP_ID.to_string())
                );
                assert_eq!(
                    matches.get_one::<String>(identity::ARG_SIGNING_KEY).cloned(),
                    Some("a2V5".to_string())
                );
                assert_eq!(
                    matches.get_one::<u64>(poll::ARG_POLL_INTERVAL).copied(),
                    Some(500)
                );
                assert_eq!(
                    matches.get_one::<u64>(poll::ARG_CHECK_TIMEOUT).copied(),
                    Some(1500)
                );
                assert_eq!(matches.get_one::<u64>(poll::ARG_MAX_WAIT).copied(), Some(30));
                assert_eq!(
                    matches.get_one::<String>(poll::ARG_QR_OUTPUT).cloned(),
                    Some("/tmp/qr.png".to_string())
                );
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    Some(2)
                );
                assert!(matches.get_flag(logging::ARG_LOG_JSON));
            },
        );
    }

    #[test]
    fn test_check_log_level_env() {
        // loop cover all possible value_parse
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars(
                [
                    ("IAM_AUTH_LOG_LEVEL", Some(level)),
                    ("IAM_AUTH_APP_ID", Some(APP_ID)),
                    ("IAM_AUTH_HUB_ID", Some(HUB_ID)),
                    ("IAM_AUTH_SIGNING_KEY", Some("a2V5")),
                ],
                || {
                    let matches = new().get_matches_from(vec!["iam-auth"]);
                    assert_eq!(
                        matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                        u8::try_from(index).ok()
                    );
                },
            );
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, _) in levels.iter().enumerate() {
            clear_env(|| {
                let mut args = required_args();

                // Add the appropriate number of "-v" flags based on the index
                if index > 0 {
                    args.push(format!("-{}", "v".repeat(index)));
                }

                let matches = new().get_matches_from(args);

                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }
}
