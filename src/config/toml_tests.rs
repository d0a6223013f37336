//! Tests for TOML configuration parsing.

use std::path::PathBuf;

use super::toml::{TomlConfig, default_config_template};

mod parsing {
    use super::*;

    #[test]
    fn parse_empty_config() {
        let config = TomlConfig::parse("").unwrap();

        assert!(config.api.api_key.is_none());
        assert!(config.app_info.is_none());
        assert!(config.webhook.secrets.is_empty());
    }

    #[test]
    fn parse_api_section() {
        let toml = r#"
            [api]
            api_key = "sk_test_123"
            stripe_account = "acct_1"
            api_version = "2023-10-16"
            api_base = "http://localhost:12111"
        "#;

        let config = TomlConfig::parse(toml).unwrap();
        let api = &config.api;

        assert_eq!(api.api_key.as_deref(), Some("sk_test_123"));
        assert_eq!(api.stripe_account.as_deref(), Some("acct_1"));
        assert_eq!(api.api_version.as_deref(), Some("2023-10-16"));
        assert_eq!(api.api_base.as_deref(), Some("http://localhost:12111"));
    }

    #[test]
    fn parse_network_section() {
        let toml = r#"
            [network]
            open_timeout = 5
            read_timeout = 20
            write_timeout = 7
            call_timeout = 60
            proxy = "http://proxy:3128"
            verify_ssl_certs = false
            ca_bundle_path = "~/certs/extra.pem"
            enable_telemetry = false
        "#;

        let config = TomlConfig::parse(toml).unwrap();
        let network = &config.network;

        assert_eq!(network.open_timeout, Some(5));
        assert_eq!(network.read_timeout, Some(20));
        assert_eq!(network.write_timeout, Some(7));
        assert_eq!(network.call_timeout, Some(60));
        assert_eq!(network.proxy.as_deref(), Some("http://proxy:3128"));
        assert_eq!(network.verify_ssl_certs, Some(false));
        assert_eq!(
            network.ca_bundle_path,
            Some(PathBuf::from("~/certs/extra.pem"))
        );
        assert_eq!(network.enable_telemetry, Some(false));
    }

    #[test]
    fn parse_retry_and_pool_sections() {
        let toml = r"
            [retry]
            max_network_retries = 4
            initial_delay_ms = 250
            max_delay_ms = 4000

            [pool]
            max_connections_per_host = 2
            max_connections = 8
            idle_ttl = 30
        ";

        let config = TomlConfig::parse(toml).unwrap();

        assert_eq!(config.retry.max_network_retries, Some(4));
        assert_eq!(config.retry.initial_delay_ms, Some(250));
        assert_eq!(config.retry.max_delay_ms, Some(4000));
        assert_eq!(config.pool.max_connections_per_host, Some(2));
        assert_eq!(config.pool.max_connections, Some(8));
        assert_eq!(config.pool.idle_ttl, Some(30));
    }

    #[test]
    fn parse_app_info_logging_and_webhook() {
        let toml = r#"
            [app_info]
            name = "MyPlugin"
            version = "1.2.3"

            [logging]
            level = "warn"

            [webhook]
            secrets = ["whsec_a", "whsec_b"]
            tolerance = 600
        "#;

        let config = TomlConfig::parse(toml).unwrap();
        let app = config.app_info.unwrap();

        assert_eq!(app.name, "MyPlugin");
        assert_eq!(app.version.as_deref(), Some("1.2.3"));
        assert!(app.url.is_none());
        assert_eq!(config.logging.level.as_deref(), Some("warn"));
        assert_eq!(config.webhook.secrets, ["whsec_a", "whsec_b"]);
        assert_eq!(config.webhook.tolerance, Some(600));
    }
}

mod errors {
    use super::*;

    #[test]
    fn unknown_section_is_rejected() {
        assert!(TomlConfig::parse("[monitor]\npoll_interval = 5").is_err());
    }

    #[test]
    fn unknown_field_is_rejected() {
        assert!(TomlConfig::parse("[api]\nsecret = \"x\"").is_err());
    }

    #[test]
    fn app_info_requires_name() {
        assert!(TomlConfig::parse("[app_info]\nversion = \"1\"").is_err());
    }

    #[test]
    fn wrong_type_is_rejected() {
        assert!(TomlConfig::parse("[retry]\nmax_network_retries = \"two\"").is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let error = TomlConfig::load(&path).unwrap_err();

        assert!(error.to_string().contains("absent.toml"));
    }
}

mod template {
    use super::*;

    #[test]
    fn default_template_parses() {
        let config = TomlConfig::parse(&default_config_template()).unwrap();

        assert_eq!(config.network.open_timeout, Some(30));
        assert_eq!(config.network.read_timeout, Some(80));
        assert_eq!(config.retry.max_network_retries, Some(2));
        assert!(config.api.api_key.is_none());
    }

    #[test]
    fn template_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stripe-core.toml");
        std::fs::write(&path, default_config_template()).unwrap();

        assert!(TomlConfig::load(&path).is_ok());
    }
}
