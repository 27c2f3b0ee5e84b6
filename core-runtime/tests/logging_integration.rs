use core_runtime::logging::{
    init_logging, redact_if_sensitive, strip_path, LogFormat, LogLevel, LoggingConfig,
};
use core_runtime::Error;

#[test]
fn second_subscriber_install_fails() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug);

    init_logging(config.clone()).unwrap();
    tracing::debug!(target: "provider_msgraph", attempt = 1, "subscriber installed");

    let second = init_logging(config);
    assert!(matches!(second, Err(Error::Config(msg)) if msg.contains("initialize")));
}

#[test]
fn credential_fields_are_masked() {
    for field in ["access_token", "Authorization", "client_secret", "upload_url"] {
        assert_eq!(redact_if_sensitive(field, "anything"), "[REDACTED]", "{field}");
    }
}

#[test]
fn recipient_addresses_are_masked() {
    let masked = redact_if_sensitive("to", "megan@contoso.onmicrosoft.com");

    assert_eq!(masked, "m***@[REDACTED]");
}

#[test]
fn graph_identifiers_are_logged_verbatim() {
    assert_eq!(redact_if_sensitive("drive_id", "b!xyz"), "b!xyz");
    assert_eq!(redact_if_sensitive("item_id", "01ABCDEF"), "01ABCDEF");
    assert_eq!(redact_if_sensitive("message_id", "AAMkAD="), "AAMkAD=");
}

#[test]
fn attachment_paths_reduce_to_file_name() {
    assert_eq!(strip_path("/srv/outbox/invoice.pdf"), "invoice.pdf");
    assert_eq!(strip_path("D:\\data\\file.txt"), "file.txt");
    assert_eq!(strip_path(""), "");
}

#[test]
fn builder_overrides_every_default() {
    let defaults = LoggingConfig::default();
    let config = defaults
        .clone()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Warn)
        .with_spans(!defaults.enable_spans)
        .with_target(!defaults.display_target)
        .with_thread_info(!defaults.display_thread_info);

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, LogLevel::Warn);
    assert!(!config.enable_spans);
    assert!(!config.display_target);
    assert!(config.display_thread_info);
}
