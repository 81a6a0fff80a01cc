//! Integration tests for logging system

use bridge_traits::time::LogLevel;
use core_runtime::logging::{
    init_logging, redact_if_sensitive, strip_path, LogFormat, LoggingConfig,
};
use core_runtime::Error;

#[test]
fn test_logging_config_defaults() {
    let config = LoggingConfig::default();

    assert_eq!(config.level, LogLevel::Info);
    assert!(config.redact_pii);
    assert!(config.enable_spans);
    assert!(config.filter.is_none());
    assert!(config.logger_sink.is_none());
}

#[test]
fn test_redaction_of_store_credentials() {
    assert_eq!(
        redact_if_sensitive("sas_token", "sv=2022-11-02&ss=b&sig=abc%3D"),
        "[REDACTED]"
    );
    assert_eq!(
        redact_if_sensitive("account_key", "base64key=="),
        "[REDACTED]"
    );
    assert_eq!(
        redact_if_sensitive("AZURE_STORAGE_CONNECTION_STRING", "AccountName=x"),
        "[REDACTED]"
    );
}

#[test]
fn test_redaction_of_signed_urls() {
    let signed = "https://acct.blob.core.windows.net/media?restype=container&sig=xyz";
    let redacted = redact_if_sensitive("container_url", signed);

    assert!(redacted.starts_with("https://acct.blob.core.windows.net/media"));
    assert!(!redacted.contains("xyz"));
}

#[test]
fn test_redaction_keeps_object_keys() {
    assert_eq!(
        redact_if_sensitive("key", "trips/1716800000000-beach.jpg"),
        "trips/1716800000000-beach.jpg"
    );
    assert_eq!(redact_if_sensitive("size_bytes", "2048"), "2048");
}

#[test]
fn test_path_stripping() {
    assert_eq!(strip_path("/home/user/Videos/clip.webm"), "clip.webm");
    assert_eq!(strip_path("D:\\uploads\\report.pdf"), "report.pdf");
    assert_eq!(strip_path("report.pdf"), "report.pdf");
    assert_eq!(strip_path(""), "");
}

#[test]
fn test_invalid_filter_is_config_error() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_filter("core_sync=loudest");

    let result = init_logging(config);
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_config_chaining() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn)
        .with_pii_redaction(false)
        .with_spans(false)
        .with_target(false)
        .with_thread_info(true);

    assert_eq!(config.format, LogFormat::Compact);
    assert_eq!(config.level, LogLevel::Warn);
    assert!(!config.redact_pii);
    assert!(!config.enable_spans);
    assert!(!config.display_target);
    assert!(config.display_thread_info);
}
