//! Property-based tests for rust-common crate.

use proptest::prelude::*;
use rust_common::{build_http_client, HttpConfig, PlatformError};
use std::time::Duration;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Server errors and throttling are retryable, every other status is not.
    #[test]
    fn prop_status_retryability(status in 100u16..600) {
        let err = PlatformError::Status { status, url: "http://keys/jwks".to_string() };
        prop_assert_eq!(err.is_retryable(), status >= 500 || status == 429);
    }

    #[test]
    fn prop_retryable_errors_are_consistent(msg in "[a-zA-Z0-9 ]{1,50}") {
        prop_assert!(PlatformError::unavailable(msg.clone()).is_retryable());
        prop_assert!(PlatformError::Timeout(msg.clone()).is_retryable());
        prop_assert!(!PlatformError::invalid_input(msg).is_retryable());
    }

    #[test]
    fn prop_invalid_json_is_not_retryable(s in "[a-z]{1,20}") {
        let parsed: Result<serde_json::Value, _> = serde_json::from_str(&format!("{{{s}"));
        let err = PlatformError::from(parsed.unwrap_err());
        prop_assert!(!err.is_retryable());
    }

    /// Any timeout and agent combination yields a working client.
    #[test]
    fn prop_clients_build(
        millis in 1u64..120_000,
        agent in "[a-z][a-z0-9-]{0,15}/[0-9]\\.[0-9]",
        insecure in any::<bool>(),
    ) {
        let config = HttpConfig::default()
            .with_timeout(Duration::from_millis(millis))
            .with_user_agent(agent.clone())
            .with_insecure_tls(insecure);
        prop_assert_eq!(config.timeout, Duration::from_millis(millis));
        prop_assert_eq!(&config.user_agent, &agent);
        prop_assert!(build_http_client(&config).is_ok());
    }
}
