//! 설정 관리: tailwatch.toml 파싱 및 런타임 설정
//!
//! [`TailwatchConfig`]는 데몬과 엔진의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`TAILWATCH_WATCH_BATCH_SIZE=512` 형식)
//! 3. 설정 파일 (`tailwatch.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), tailwatch_core::error::TailwatchError> {
//! use tailwatch_core::config::TailwatchConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = TailwatchConfig::load("tailwatch.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = TailwatchConfig::parse("[watch]\nfile_glob_pattern = \"/var/log/app/*.log\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, TailwatchError};

/// 허용되는 파일 핸들 모드 문자열
pub const HANDLE_MODES: [&str; 3] = ["auto", "hold_open", "reopen"];

/// tailwatch 통합 설정
///
/// `tailwatch.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TailwatchConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 파일 감시/테일링 설정
    #[serde(default)]
    pub watch: WatchSection,
}

impl TailwatchConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    /// 3. 유효성 검증
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, TailwatchError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드, 검증 없음).
    ///
    /// 패턴은 환경변수로만 주어질 수도 있으므로 검증은 [`load`](Self::load)에서 수행합니다.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, TailwatchError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TailwatchError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                TailwatchError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, TailwatchError> {
        toml::from_str(toml_str).map_err(|e| {
            TailwatchError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `TAILWATCH_{SECTION}_{FIELD}`
    /// 예: `TAILWATCH_WATCH_FILE_GLOB_PATTERN=/var/log/app/*.log`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "TAILWATCH_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "TAILWATCH_GENERAL_LOG_FORMAT");

        // Watch
        override_opt_string(
            &mut self.watch.file_regex_pattern,
            "TAILWATCH_WATCH_FILE_REGEX_PATTERN",
        );
        override_opt_string(
            &mut self.watch.file_glob_pattern,
            "TAILWATCH_WATCH_FILE_GLOB_PATTERN",
        );
        override_u64(
            &mut self.watch.idle_timeout_ms,
            "TAILWATCH_WATCH_IDLE_TIMEOUT_MS",
        );
        override_usize(&mut self.watch.batch_size, "TAILWATCH_WATCH_BATCH_SIZE");
        override_usize(&mut self.watch.buffer_size, "TAILWATCH_WATCH_BUFFER_SIZE");
        override_u32(
            &mut self.watch.lines_per_second,
            "TAILWATCH_WATCH_LINES_PER_SECOND",
        );
        override_u64(
            &mut self.watch.watch_interval_ms,
            "TAILWATCH_WATCH_WATCH_INTERVAL_MS",
        );
        override_u64(
            &mut self.watch.read_interval_ms,
            "TAILWATCH_WATCH_READ_INTERVAL_MS",
        );
        override_u64(
            &mut self.watch.invalid_file_ttl_secs,
            "TAILWATCH_WATCH_INVALID_FILE_TTL_SECS",
        );
        override_usize(
            &mut self.watch.invalid_file_capacity,
            "TAILWATCH_WATCH_INVALID_FILE_CAPACITY",
        );
        override_string(&mut self.watch.handle_mode, "TAILWATCH_WATCH_HANDLE_MODE");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), TailwatchError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        // 패턴은 둘 중 하나 이상 필요
        if !self.watch.has_pattern() {
            return Err(ConfigError::InvalidValue {
                field: "watch.file_regex_pattern".to_owned(),
                reason: "at least one of file_regex_pattern or file_glob_pattern must be set"
                    .to_owned(),
            }
            .into());
        }

        let positive_fields: [(&str, u64); 8] = [
            ("watch.idle_timeout_ms", self.watch.idle_timeout_ms),
            ("watch.batch_size", self.watch.batch_size as u64),
            ("watch.buffer_size", self.watch.buffer_size as u64),
            ("watch.lines_per_second", u64::from(self.watch.lines_per_second)),
            ("watch.watch_interval_ms", self.watch.watch_interval_ms),
            ("watch.read_interval_ms", self.watch.read_interval_ms),
            ("watch.invalid_file_ttl_secs", self.watch.invalid_file_ttl_secs),
            (
                "watch.invalid_file_capacity",
                self.watch.invalid_file_capacity as u64,
            ),
        ];
        for (field, value) in positive_fields {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_owned(),
                    reason: "must be greater than 0".to_owned(),
                }
                .into());
            }
        }

        if !HANDLE_MODES.contains(&self.watch.handle_mode.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "watch.handle_mode".to_owned(),
                reason: format!("must be one of: {}", HANDLE_MODES.join(", ")),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 파일 감시/테일링 설정 (`[watch]` 섹션)
///
/// 두 패턴 필드는 쉼표로 구분된 여러 패턴을 받을 수 있습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchSection {
    /// 파일명 정규식 패턴 (예: `/var/log/app/gc.*\.log`)
    pub file_regex_pattern: Option<String>,
    /// glob 패턴 (예: `/var/log/*/gc*.log`)
    pub file_glob_pattern: Option<String>,
    /// 유휴 판정 시간 (밀리초)
    pub idle_timeout_ms: u64,
    /// 파일당 한 번에 읽을 최대 라인 수
    pub batch_size: usize,
    /// 원시 읽기 버퍼 크기 (바이트)
    pub buffer_size: usize,
    /// 파일당 초당 최대 라인 수
    pub lines_per_second: u32,
    /// 파일 탐색 주기 (밀리초)
    pub watch_interval_ms: u64,
    /// 읽을 라인이 없을 때 읽기 루프 대기 시간 (밀리초)
    pub read_interval_ms: u64,
    /// 열기 실패 파일 캐시 유지 시간 (초)
    pub invalid_file_ttl_secs: u64,
    /// 열기 실패 파일 캐시 최대 엔트리 수
    pub invalid_file_capacity: usize,
    /// 파일 핸들 모드 (auto, hold_open, reopen)
    pub handle_mode: String,
}

impl WatchSection {
    /// 비어있지 않은 패턴이 하나 이상 설정되어 있는지 확인합니다.
    pub fn has_pattern(&self) -> bool {
        let set = |p: &Option<String>| p.as_deref().is_some_and(|s| !s.trim().is_empty());
        set(&self.file_regex_pattern) || set(&self.file_glob_pattern)
    }
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            file_regex_pattern: None,
            file_glob_pattern: None,
            idle_timeout_ms: 3_600_000, // 1시간
            batch_size: 1024,
            buffer_size: 8192,
            lines_per_second: 1000,
            watch_interval_ms: 5000,
            read_interval_ms: 1000,
            invalid_file_ttl_secs: 3600,
            invalid_file_capacity: 1024,
            handle_mode: "auto".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_opt_string(target: &mut Option<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = if val.trim().is_empty() { None } else { Some(val) };
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u32 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn with_glob() -> TailwatchConfig {
        let mut config = TailwatchConfig::default();
        config.watch.file_glob_pattern = Some("/var/log/app/*.log".to_owned());
        config
    }

    #[test]
    fn default_config_has_sane_values() {
        let config = TailwatchConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.watch.batch_size, 1024);
        assert_eq!(config.watch.buffer_size, 8192);
        assert_eq!(config.watch.idle_timeout_ms, 3_600_000);
        assert_eq!(config.watch.handle_mode, "auto");
    }

    #[test]
    fn default_config_requires_a_pattern() {
        let err = TailwatchConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("file_regex_pattern"));
    }

    #[test]
    fn config_with_glob_passes_validation() {
        with_glob().validate().unwrap();
    }

    #[test]
    fn blank_pattern_does_not_count() {
        let mut config = TailwatchConfig::default();
        config.watch.file_regex_pattern = Some("   ".to_owned());
        assert!(config.validate().is_err());
    }

    #[test]
    fn from_str_partial_toml_merges_with_defaults() {
        let toml = r#"
[general]
log_format = "pretty"

[watch]
file_regex_pattern = "/var/log/app/gc.*\\.log"
batch_size = 64
"#;
        let config = TailwatchConfig::parse(toml).unwrap();
        assert_eq!(config.general.log_format, "pretty");
        assert_eq!(config.general.log_level, "info");
        assert_eq!(
            config.watch.file_regex_pattern.as_deref(),
            Some("/var/log/app/gc.*\\.log")
        );
        assert_eq!(config.watch.batch_size, 64);
        assert_eq!(config.watch.buffer_size, 8192);
        config.validate().unwrap();
    }

    #[test]
    fn from_str_invalid_toml_returns_error() {
        let result = TailwatchConfig::parse("invalid = [[[toml");
        assert!(matches!(
            result,
            Err(TailwatchError::Config(ConfigError::ParseFailed { .. }))
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = with_glob();
        config.general.log_level = "verbose".to_owned();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_invalid_log_format() {
        let mut config = with_glob();
        config.general.log_format = "xml".to_owned();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_numeric_fields() {
        let mut config = with_glob();
        config.watch.lines_per_second = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("watch.lines_per_second"));

        let mut config = with_glob();
        config.watch.read_interval_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("watch.read_interval_ms"));
    }

    #[test]
    fn validate_rejects_unknown_handle_mode() {
        let mut config = with_glob();
        config.watch.handle_mode = "sometimes".to_owned();
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn env_override_string() {
        let mut val = "original".to_owned();
        // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_TAILWATCH_STR", "overridden") };
        override_string(&mut val, "TEST_TAILWATCH_STR");
        assert_eq!(val, "overridden");
        unsafe { std::env::remove_var("TEST_TAILWATCH_STR") };
    }

    #[test]
    #[serial]
    fn env_override_blank_optional_clears_pattern() {
        let mut val = Some("/var/log/*.log".to_owned());
        // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_TAILWATCH_OPT", "") };
        override_opt_string(&mut val, "TEST_TAILWATCH_OPT");
        assert!(val.is_none());
        unsafe { std::env::remove_var("TEST_TAILWATCH_OPT") };
    }

    #[test]
    #[serial]
    fn env_override_invalid_number_keeps_original() {
        let mut val = 1024usize;
        // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_TAILWATCH_USIZE_BAD", "lots") };
        override_usize(&mut val, "TEST_TAILWATCH_USIZE_BAD");
        assert_eq!(val, 1024); // 원래 값 유지
        unsafe { std::env::remove_var("TEST_TAILWATCH_USIZE_BAD") };
    }

    #[test]
    #[serial]
    fn env_overrides_apply_to_watch_section() {
        let mut config = TailwatchConfig::default();
        // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 안전합니다.
        unsafe {
            std::env::set_var("TAILWATCH_WATCH_FILE_GLOB_PATTERN", "/tmp/gc/*.log");
            std::env::set_var("TAILWATCH_WATCH_LINES_PER_SECOND", "50");
        }
        config.apply_env_overrides();
        unsafe {
            std::env::remove_var("TAILWATCH_WATCH_FILE_GLOB_PATTERN");
            std::env::remove_var("TAILWATCH_WATCH_LINES_PER_SECOND");
        }
        assert_eq!(config.watch.file_glob_pattern.as_deref(), Some("/tmp/gc/*.log"));
        assert_eq!(config.watch.lines_per_second, 50);
        config.validate().unwrap();
    }

    #[test]
    fn env_override_missing_var_keeps_original() {
        let mut val = "original".to_owned();
        override_string(&mut val, "TEST_TAILWATCH_NONEXISTENT_12345");
        assert_eq!(val, "original");
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = with_glob();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = TailwatchConfig::parse(&toml_str).unwrap();
        assert_eq!(config.watch.file_glob_pattern, parsed.watch.file_glob_pattern);
        assert_eq!(config.watch.idle_timeout_ms, parsed.watch.idle_timeout_ms);
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let result = TailwatchConfig::from_file("/nonexistent/path/tailwatch.toml").await;
        assert!(matches!(
            result,
            Err(TailwatchError::Config(ConfigError::FileNotFound { .. }))
        ));
    }

    #[tokio::test]
    #[serial]
    async fn load_reads_file_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tailwatch.toml");
        std::fs::write(&path, "[watch]\nfile_glob_pattern = \"/tmp/*.log\"\n").unwrap();

        let config = TailwatchConfig::load(&path).await.unwrap();
        assert_eq!(config.watch.file_glob_pattern.as_deref(), Some("/tmp/*.log"));
    }
}
