//! Integration tests for logging system

use bridge_traits::LogLevel;
use core_runtime::logging::{init_logging, strip_path, LogFormat, LoggingConfig};

#[test]
fn test_init_logging_only_once() {
    // A process gets exactly one global subscriber, so both calls live here.
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug);

    assert!(init_logging(config.clone()).is_ok());
    tracing::info!(target: "core_upload", "logging initialised");
    assert!(init_logging(config).is_err());
}

#[test]
fn test_invalid_filter_is_reported() {
    let config = LoggingConfig::default().with_filter("core_upload=notalevel");
    // Fails while building the filter, before touching the global subscriber.
    assert!(init_logging(config).is_err());
}

#[test]
fn test_format_selection() {
    #[cfg(debug_assertions)]
    assert_eq!(LoggingConfig::default().format, LogFormat::Pretty);

    #[cfg(not(debug_assertions))]
    assert_eq!(LoggingConfig::default().format, LogFormat::Json);
}

#[test]
fn test_path_stripping() {
    assert_eq!(strip_path("/Users/ana/Desktop/trip/cover.jpg"), "cover.jpg");
    assert_eq!(strip_path("D:\\photos\\beach.png"), "beach.png");
    assert_eq!(strip_path("/tmp/"), "");
    assert_eq!(strip_path(""), "");
}
