//! tailwatch.toml 통합 설정 테스트
//!
//! - tailwatch.toml.example 파싱 테스트
//! - 부분 설정 (일부 필드만) 로딩 테스트
//! - 환경변수 우선순위 테스트
//! - 빈 파일 / 잘못된 형식 에러 테스트

use tailwatch_core::config::TailwatchConfig;
use tailwatch_core::error::{ConfigError, TailwatchError};

const EXAMPLE: &str = include_str!("../../../tailwatch.toml.example");

// =============================================================================
// tailwatch.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let config = TailwatchConfig::parse(EXAMPLE).expect("example config should parse");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "json");
    assert_eq!(
        config.watch.file_regex_pattern.as_deref(),
        Some("/var/log/app/gc-[0-9]+\\.log")
    );
    assert_eq!(
        config.watch.file_glob_pattern.as_deref(),
        Some("/var/log/jvm/**/gc*.log")
    );
}

#[test]
fn example_config_passes_validation() {
    let config = TailwatchConfig::parse(EXAMPLE).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn example_config_matches_defaults() {
    let config = TailwatchConfig::parse(EXAMPLE).expect("should parse");
    let defaults = TailwatchConfig::default();

    assert_eq!(config.watch.idle_timeout_ms, defaults.watch.idle_timeout_ms);
    assert_eq!(config.watch.batch_size, defaults.watch.batch_size);
    assert_eq!(config.watch.buffer_size, defaults.watch.buffer_size);
    assert_eq!(config.watch.lines_per_second, defaults.watch.lines_per_second);
    assert_eq!(config.watch.handle_mode, defaults.watch.handle_mode);
}

// =============================================================================
// 부분 설정 테스트
// =============================================================================

#[test]
fn partial_watch_section_merges_with_defaults() {
    let toml = r#"
[watch]
file_glob_pattern = "/srv/*.log"
batch_size = 8
"#;
    let config = TailwatchConfig::parse(toml).expect("should parse");

    assert_eq!(config.watch.batch_size, 8);
    assert_eq!(config.watch.buffer_size, 8192);
    assert_eq!(config.watch.watch_interval_ms, 5000);
    assert_eq!(config.general.log_level, "info");
    config.validate().expect("partial config should validate");
}

#[test]
fn general_only_config_fails_validation() {
    let toml = r#"
[general]
log_level = "debug"
"#;
    let config = TailwatchConfig::parse(toml).expect("should parse");
    assert!(matches!(
        config.validate().unwrap_err(),
        TailwatchError::Config(ConfigError::InvalidValue { .. })
    ));
}

#[test]
fn malformed_toml_returns_parse_error() {
    let result = TailwatchConfig::parse("[watch\nbatch_size = 1");
    assert!(matches!(
        result.unwrap_err(),
        TailwatchError::Config(ConfigError::ParseFailed { .. })
    ));
}

#[test]
fn negative_number_is_rejected() {
    let toml = r#"
[watch]
batch_size = -1
"#;
    assert!(TailwatchConfig::parse(toml).is_err());
}

// =============================================================================
// 환경변수 우선순위 테스트
// =============================================================================

fn with_env<T>(key: &str, value: &str, f: impl FnOnce() -> T) -> T {
    let original = std::env::var(key).ok();
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var(key, value);
    }

    let result = f();

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var(key, val),
            None => std::env::remove_var(key),
        }
    }
    result
}

#[test]
#[serial_test::serial]
fn env_override_takes_precedence_over_toml() {
    let result = with_env("TAILWATCH_WATCH_BATCH_SIZE", "32", || {
        let mut config = TailwatchConfig::parse(EXAMPLE).expect("should parse");
        config.apply_env_overrides();
        config.watch.batch_size
    });
    assert_eq!(result, 32);
}

#[test]
#[serial_test::serial]
fn env_override_takes_precedence_over_defaults() {
    let result = with_env("TAILWATCH_WATCH_HANDLE_MODE", "reopen", || {
        let mut config = TailwatchConfig::parse("").expect("should parse");
        config.apply_env_overrides();
        config.watch.handle_mode
    });
    assert_eq!(result, "reopen");
}

#[test]
#[serial_test::serial]
fn env_override_supplies_missing_pattern() {
    let config = with_env("TAILWATCH_WATCH_FILE_REGEX_PATTERN", "/tmp/gc.*", || {
        let mut config = TailwatchConfig::parse("").expect("should parse");
        config.apply_env_overrides();
        config
    });
    config
        .validate()
        .expect("env-supplied pattern should validate");
}

// =============================================================================
// 파일 로딩 테스트
// =============================================================================

#[tokio::test]
async fn from_file_nonexistent_returns_file_not_found() {
    let result = TailwatchConfig::from_file("/tmp/tailwatch_test_nonexistent_12345.toml").await;
    assert!(matches!(
        result.unwrap_err(),
        TailwatchError::Config(ConfigError::FileNotFound { .. })
    ));
}

#[tokio::test]
#[serial_test::serial]
async fn load_example_config_from_disk() {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let example_path = format!("{}/../../tailwatch.toml.example", manifest_dir);

    let config = TailwatchConfig::load(&example_path)
        .await
        .expect("example should load and validate");
    assert_eq!(config.general.log_level, "info");
}

// =============================================================================
// 직렬화 라운드트립 테스트
// =============================================================================

#[test]
fn example_config_serialize_roundtrip() {
    let config = TailwatchConfig::parse(EXAMPLE).expect("should parse");
    let serialized = toml::to_string_pretty(&config).expect("should serialize");
    let reparsed = TailwatchConfig::parse(&serialized).expect("should reparse");
    reparsed.validate().expect("should validate");

    assert_eq!(config.watch.file_glob_pattern, reparsed.watch.file_glob_pattern);
    assert_eq!(config.watch.idle_timeout_ms, reparsed.watch.idle_timeout_ms);
}
