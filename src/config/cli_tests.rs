//! Tests for CLI argument parsing.

use std::path::PathBuf;

use super::cli::{Cli, Command};

mod parsing {
    use super::*;

    #[test]
    fn parse_request_command() {
        let cli = Cli::parse_from_iter([
            "stripe-core",
            "request",
            "POST",
            "/v1/customers",
            "-d",
            "email=jenny@example.com",
            "-d",
            "metadata[tier]=gold",
        ]);

        let Command::Request {
            method, path, data, ..
        } = cli.command
        else {
            panic!("expected request command");
        };
        assert_eq!(method, "POST");
        assert_eq!(path, "/v1/customers");
        assert_eq!(data, ["email=jenny@example.com", "metadata[tier]=gold"]);
    }

    #[test]
    fn parse_request_options() {
        let cli = Cli::parse_from_iter([
            "stripe-core",
            "request",
            "POST",
            "/v2/core/events",
            "--idempotency-key",
            "order-7",
            "-H",
            "X-Trace: abc",
            "--preview",
        ]);

        let Command::Request {
            idempotency_key,
            headers,
            preview,
            ..
        } = cli.command
        else {
            panic!("expected request command");
        };
        assert_eq!(idempotency_key.as_deref(), Some("order-7"));
        assert_eq!(headers, ["X-Trace: abc"]);
        assert!(preview);
    }

    #[test]
    fn parse_global_options_after_subcommand() {
        let cli = Cli::parse_from_iter([
            "stripe-core",
            "request",
            "GET",
            "/v1/balance",
            "--api-key",
            "sk_test_1",
            "--max-retries",
            "5",
            "--call-timeout",
            "20",
            "--no-telemetry",
            "-v",
        ]);

        assert_eq!(cli.api_key.as_deref(), Some("sk_test_1"));
        assert_eq!(cli.max_retries, Some(5));
        assert_eq!(cli.call_timeout, Some(20));
        assert!(cli.no_telemetry);
        assert!(cli.verbose);
    }

    #[test]
    fn parse_network_options() {
        let cli = Cli::parse_from_iter([
            "stripe-core",
            "--open-timeout",
            "5",
            "--read-timeout",
            "10",
            "--proxy",
            "http://proxy.local:3128",
            "--ca-bundle",
            "/etc/ssl/extra.pem",
            "init",
        ]);

        assert_eq!(cli.open_timeout, Some(5));
        assert_eq!(cli.read_timeout, Some(10));
        assert_eq!(cli.proxy.as_deref(), Some("http://proxy.local:3128"));
        assert_eq!(cli.ca_bundle, Some(PathBuf::from("/etc/ssl/extra.pem")));
    }

    #[test]
    fn parse_verify_webhook_with_several_secrets() {
        let cli = Cli::parse_from_iter([
            "stripe-core",
            "verify-webhook",
            "--signature",
            "t=1,v1=abc",
            "--secret",
            "whsec_old",
            "--secret",
            "whsec_new",
            "--payload",
            "event.json",
            "--tolerance",
            "0",
        ]);

        let Command::VerifyWebhook {
            signature,
            secrets,
            payload,
            tolerance,
        } = cli.command
        else {
            panic!("expected verify-webhook command");
        };
        assert_eq!(signature, "t=1,v1=abc");
        assert_eq!(secrets, ["whsec_old", "whsec_new"]);
        assert_eq!(payload, Some(PathBuf::from("event.json")));
        assert_eq!(tolerance, Some(0));
    }

    #[test]
    fn comma_separated_secrets_are_split() {
        let cli = Cli::parse_from_iter([
            "stripe-core",
            "verify-webhook",
            "--signature",
            "t=1,v1=abc",
            "--secret",
            "whsec_a,whsec_b",
        ]);

        let Command::VerifyWebhook { secrets, .. } = cli.command else {
            panic!("expected verify-webhook command");
        };
        assert_eq!(secrets, ["whsec_a", "whsec_b"]);
    }
}

mod init_command {
    use super::*;

    #[test]
    fn init_uses_default_output() {
        let cli = Cli::parse_from_iter(["stripe-core", "init"]);

        assert!(cli.is_init());
        let Command::Init { output } = cli.command else {
            panic!("expected init command");
        };
        assert_eq!(output, PathBuf::from("stripe-core.toml"));
    }

    #[test]
    fn init_accepts_custom_output() {
        let cli = Cli::parse_from_iter(["stripe-core", "init", "-o", "custom.toml"]);

        let Command::Init { output } = cli.command else {
            panic!("expected init command");
        };
        assert_eq!(output, PathBuf::from("custom.toml"));
    }

    #[test]
    fn request_is_not_init() {
        let cli = Cli::parse_from_iter(["stripe-core", "request", "GET", "/v1/balance"]);

        assert!(!cli.is_init());
    }
}

mod errors {
    use super::*;

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from_iter(["stripe-core"]).is_err());
    }

    #[test]
    fn request_requires_method_and_path() {
        assert!(Cli::try_parse_from_iter(["stripe-core", "request", "GET"]).is_err());
    }

    #[test]
    fn verify_webhook_requires_signature() {
        assert!(
            Cli::try_parse_from_iter(["stripe-core", "verify-webhook", "--secret", "whsec_x"])
                .is_err()
        );
    }

    #[test]
    fn non_numeric_retries_are_rejected() {
        assert!(
            Cli::try_parse_from_iter(["stripe-core", "--max-retries", "many", "init"]).is_err()
        );
    }
}
