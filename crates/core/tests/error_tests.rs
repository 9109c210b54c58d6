// ═══════════════════════════════════════════════════════════════════
// Error Tests — Display formatting, classification, From impls
// ═══════════════════════════════════════════════════════════════════

use std::time::Duration;

use kite_dashboard_core::errors::{
    CoreError, FetchError, TradeError, TradeErrorKind, TransportError, TRADE_FALLBACK_MESSAGE,
};

// ── Display formatting ──────────────────────────────────────────────

mod display {
    use super::*;

    #[test]
    fn network() {
        let err = TransportError::Network("connection refused".into());
        assert_eq!(err.to_string(), "Network error: connection refused");
    }

    #[test]
    fn timeout() {
        let err = TransportError::Timeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "Request timed out after 30s");
    }

    #[test]
    fn fetch_transport_is_transparent() {
        let err = FetchError::from(TransportError::Network("reset".into()));
        assert_eq!(err.to_string(), "Network error: reset");
    }

    #[test]
    fn status_with_detail() {
        let err = FetchError::Status {
            operation: "list instruments".into(),
            status: 500,
            detail: Some("Error fetching stocks: boom".into()),
        };
        assert_eq!(
            err.to_string(),
            "list instruments failed with status 500: Error fetching stocks: boom"
        );
    }

    #[test]
    fn status_without_detail() {
        let err = FetchError::Status {
            operation: "get portfolio".into(),
            status: 502,
            detail: None,
        };
        assert_eq!(err.to_string(), "get portfolio failed with status 502");
    }

    #[test]
    fn deserialization() {
        let err = FetchError::Deserialization {
            operation: "get chart series".into(),
            message: "missing field `data`".into(),
        };
        assert_eq!(
            err.to_string(),
            "Could not decode get chart series response: missing field `data`"
        );
    }

    #[test]
    fn trade_error_displays_bare_message() {
        let err = TradeError::rejected(Some("Insufficient funds".into()));
        assert_eq!(err.to_string(), "Insufficient funds");
    }

    #[test]
    fn core_wraps_trade() {
        let err = CoreError::from(TradeError::rejected(None));
        assert_eq!(err.to_string(), format!("Trade failed: {TRADE_FALLBACK_MESSAGE}"));
    }

    #[test]
    fn core_validation() {
        let err = CoreError::ValidationError("Unknown instrument: XYZ".into());
        assert_eq!(err.to_string(), "Validation failed: Unknown instrument: XYZ");
    }
}

// ── Classification ──────────────────────────────────────────────────

mod classification {
    use super::*;

    #[test]
    fn transport_failures_are_transport() {
        assert!(FetchError::from(TransportError::Timeout(Duration::from_secs(5))).is_transport());
        assert!(FetchError::from(TransportError::Network("x".into())).is_transport());
    }

    #[test]
    fn application_failures_are_not_transport() {
        let status = FetchError::Status {
            operation: "list instruments".into(),
            status: 404,
            detail: None,
        };
        let decode = FetchError::Deserialization {
            operation: "list instruments".into(),
            message: "eof".into(),
        };
        assert!(!status.is_transport());
        assert!(!decode.is_transport());
    }

    #[test]
    fn rejected_without_detail_uses_fallback() {
        let err = TradeError::rejected(None);
        assert_eq!(err.kind, TradeErrorKind::Rejected);
        assert_eq!(err.message, "Failed to execute trade");
    }

    #[test]
    fn transport_failure_on_trade_uses_fallback() {
        let err = TradeError::from(TransportError::Network("dns".into()));
        assert_eq!(err.kind, TradeErrorKind::Transport);
        assert_eq!(err.message, TRADE_FALLBACK_MESSAGE);
    }
}

// ── From impls ──────────────────────────────────────────────────────

mod conversions {
    use super::*;

    #[test]
    fn url_parse_error_is_config() {
        let err: CoreError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn json_error_is_config() {
        let err: CoreError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn fetch_error_into_core() {
        let err: CoreError = FetchError::from(TransportError::Network("x".into())).into();
        assert!(matches!(err, CoreError::Fetch(_)));
    }
}
