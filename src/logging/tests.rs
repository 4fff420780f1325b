//! Tests for the logging system

use super::*;
use tempfile::TempDir;

#[test]
fn test_level_names_match_env_filter_syntax() {
    for level in [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
    ] {
        let parsed: tracing::Level = level.as_str().parse().unwrap();
        assert_eq!(parsed, tracing::Level::from(level));
    }
}

#[test]
fn test_defaults() {
    let config = LoggingConfig::default();
    assert_eq!(config.level, LogLevel::Info);
    assert_eq!(config.output, LogOutput::Console);
    assert_eq!(config.file_name, DEFAULT_FILE_NAME);
    assert!(config.dispatch_records);
    assert!(config.targets.is_empty());
}

#[test]
fn test_output_destinations() {
    assert!(LogOutput::Console.writes_console());
    assert!(!LogOutput::Console.writes_file());
    assert!(LogOutput::File.writes_file());
    assert!(!LogOutput::File.writes_console());
    assert!(LogOutput::Both.writes_file() && LogOutput::Both.writes_console());
}

#[test]
fn test_directives_list_global_level_first() {
    let config = LoggingConfig::default()
        .with_level(LogLevel::Warn)
        .with_target("thumbsmith::walker", LogLevel::Debug)
        .with_target("dispatch", LogLevel::Error);

    assert_eq!(
        config.directives(),
        "warn,dispatch=error,thumbsmith::walker=debug"
    );

    let rendered = LoggingSystem::config_filter(&config).to_string();
    assert!(rendered.contains("thumbsmith::walker=debug"));
}

#[test]
fn test_partial_section_keeps_defaults() {
    let config: LoggingConfig = serde_json::from_str(
        r#"{"level":"debug","format":"json","targets":{"tower_http":"warn"}}"#,
    )
    .unwrap();
    assert_eq!(config.level, LogLevel::Debug);
    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.targets.get("tower_http"), Some(&LogLevel::Warn));
    assert_eq!(config.rotation, RotationStrategy::Daily);
}

#[test]
fn test_explicit_directory_wins() {
    let dir = PathBuf::from("/var/log/thumbsmith");
    let config = LoggingConfig::default().with_directory(dir.clone());
    assert_eq!(config.resolved_directory(), dir);
}

#[test]
fn test_init_creates_log_directory() {
    let temp_dir = TempDir::new().unwrap();
    let log_dir = temp_dir.path().join("nested").join("logs");

    let config = LoggingConfig::default()
        .with_output(LogOutput::File)
        .with_directory(log_dir.clone());

    // Another test may already own the global subscriber; the directory is
    // created before installation either way.
    let result = LoggingSystem::init(config);
    assert!(log_dir.is_dir());

    if let Ok(system) = result {
        assert_eq!(system.log_directory(), Some(log_dir));
    }
}
