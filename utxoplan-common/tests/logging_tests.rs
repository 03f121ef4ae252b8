use serde_json::json;
use std::sync::Once;
use utxoplan_common::logging::{self, LogConfig, LogContext, LogLevel};

static INIT_LOGGER: Once = Once::new();

fn setup() {
    INIT_LOGGER.call_once(|| {
        let config = LogConfig {
            level: LogLevel::Error,
            log_file: None,
            include_timestamps: false,
            include_source_location: false,
            json_format: false,
        };
        let _ = logging::init(&config);
    });
}

#[test]
fn init_is_idempotent() {
    setup();
    assert!(logging::init(&LogConfig::default()).is_ok());
    assert!(utxoplan_common::init().is_ok());
}

#[test]
fn long_identifiers_are_shortened() {
    let txid = "7967a5185e907a25225574544c31f7b059c1a191d65b53dcc1554d339c4f9efc";
    assert_eq!(logging::sanitize_for_logging(txid), "7967a5...4f9efc");
    assert_eq!(logging::sanitize_for_logging("short"), "short");
    assert_eq!(logging::sanitize_for_logging(""), "");
}

#[test]
fn structured_events_do_not_panic() {
    setup();
    logging::set_log_level(LogLevel::Trace);
    logging::log_planner(
        LogLevel::Debug,
        LogContext::Search,
        "search finished",
        Some(json!({
            "txid": "7967a5185e907a25225574544c31f7b059c1a191d65b53dcc1554d339c4f9efc",
            "work": 12,
        })),
    );
    logging::log_planner(LogLevel::Info, LogContext::Assembly, "no params", None);
    logging::set_log_level(LogLevel::Error);
}

#[test]
fn config_deserializes_with_defaults() {
    let config: LogConfig = serde_json::from_str(r#"{ "level": "Warn" }"#).unwrap();
    assert_eq!(config.level, LogLevel::Warn);
    assert!(config.include_timestamps);
    assert!(!config.json_format);
    assert!(config.log_file.is_none());
}
