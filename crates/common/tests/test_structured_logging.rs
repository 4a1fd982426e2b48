use common::{init_structured_logging, LoggingConfig, OperationTimer, StructuredLogEntry};
use serde_json::Value;
use std::collections::HashMap;

#[test]
fn test_global_subscriber_installs_once() {
    let config = LoggingConfig {
        level: "debug".to_string(),
        json_output: true,
        ..LoggingConfig::default()
    };

    assert!(init_structured_logging(&config).is_ok());
    // повторная установка глобального subscriber'а - ошибка, не паника
    assert!(init_structured_logging(&config).is_err());

    tracing::info!(section_id = "popular", claimed = 4u64, "section ready");
    OperationTimer::start("fetch_recommendations")
        .with_field("endpoint", "recommended")
        .finish(&Ok::<_, String>(()));
}

#[test]
fn test_log_entry_roundtrips_extra_fields() {
    let raw = r#"{
        "timestamp": "2024-01-01T00:00:00Z",
        "level": "WARN",
        "target": "recommend::section",
        "message": "recommendations unavailable",
        "section_id": "related",
        "error_code": "TIMEOUT"
    }"#;

    let entry: StructuredLogEntry = serde_json::from_str(raw).unwrap();
    assert_eq!(entry.level, "WARN");
    assert_eq!(entry.fields.get("error_code"), Some(&Value::String("TIMEOUT".into())));

    let mut expected = HashMap::new();
    expected.insert("section_id".to_string(), Value::String("related".into()));
    expected.insert("error_code".to_string(), Value::String("TIMEOUT".into()));
    assert_eq!(entry.fields, expected);
}

#[test]
fn test_default_logging_config_is_quiet() {
    let config = LoggingConfig::default();
    assert_eq!(config.level, "warn");
    assert!(!config.json_output);
}
