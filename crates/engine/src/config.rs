//! 엔진 설정
//!
//! [`WatchConfig`]는 core의 [`WatchSection`](tailwatch_core::config::WatchSection)을
//! 기반으로 시간 필드를 `Duration`으로 변환한 엔진 전용 설정입니다.
//!
//! # 사용 예시
//! ```ignore
//! use tailwatch_core::config::TailwatchConfig;
//! use tailwatch_engine::config::WatchConfig;
//!
//! let core_config = TailwatchConfig::load("tailwatch.toml").await?;
//! let config = WatchConfig::from_core(&core_config.watch)?;
//! ```

use std::time::Duration;

use tailwatch_core::config::WatchSection;

use crate::error::TailError;
use crate::tailer::HandleMode;

/// 감시 엔진 설정
///
/// 생성 이후 변경되지 않습니다. [`WatchManager`](crate::WatchManager) 시작 시
/// [`validate`](Self::validate)로 다시 검증됩니다.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// 쉼표로 구분된 파일명 정규식 패턴
    pub regex_pattern: Option<String>,
    /// 쉼표로 구분된 glob 패턴
    pub glob_pattern: Option<String>,
    /// 이 시간 동안 수정이 없으면 유휴 파일로 판정
    pub idle_timeout: Duration,
    /// 파일당 한 번의 읽기 호출에서 반환할 최대 라인 수
    pub batch_size: usize,
    /// 원시 읽기 버퍼 크기 (바이트)
    pub buffer_size: usize,
    /// 파일당 초당 최대 라인 수
    pub lines_per_second: u32,
    /// 파일 탐색 주기
    pub watch_interval: Duration,
    /// 읽은 라인이 없을 때 읽기 루프 대기 시간
    pub read_interval: Duration,
    /// 열기 실패 파일 캐시 유지 시간
    pub invalid_file_ttl: Duration,
    /// 열기 실패 파일 캐시 최대 엔트리 수
    pub invalid_file_capacity: usize,
    /// 파일 핸들 유지 방식
    pub handle_mode: HandleMode,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            regex_pattern: None,
            glob_pattern: None,
            idle_timeout: Duration::from_secs(3600),
            batch_size: 1024,
            buffer_size: 8192,
            lines_per_second: 1000,
            watch_interval: Duration::from_secs(5),
            read_interval: Duration::from_secs(1),
            invalid_file_ttl: Duration::from_secs(3600),
            invalid_file_capacity: 1024,
            handle_mode: HandleMode::platform_default(),
        }
    }
}

impl WatchConfig {
    /// core의 `WatchSection`에서 엔진 설정을 생성합니다.
    pub fn from_core(core: &WatchSection) -> Result<Self, TailError> {
        let non_blank = |p: &Option<String>| p.clone().filter(|s| !s.trim().is_empty());

        Ok(Self {
            regex_pattern: non_blank(&core.file_regex_pattern),
            glob_pattern: non_blank(&core.file_glob_pattern),
            idle_timeout: Duration::from_millis(core.idle_timeout_ms),
            batch_size: core.batch_size,
            buffer_size: core.buffer_size,
            lines_per_second: core.lines_per_second,
            watch_interval: Duration::from_millis(core.watch_interval_ms),
            read_interval: Duration::from_millis(core.read_interval_ms),
            invalid_file_ttl: Duration::from_secs(core.invalid_file_ttl_secs),
            invalid_file_capacity: core.invalid_file_capacity,
            handle_mode: HandleMode::parse(&core.handle_mode)?,
        })
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), TailError> {
        const MAX_BATCH_SIZE: usize = 100_000;
        const MAX_BUFFER_SIZE: usize = 16 * 1024 * 1024; // 16MB
        const MAX_LINES_PER_SECOND: u32 = 1_000_000;

        let has_regex = self
            .regex_pattern
            .as_deref()
            .is_some_and(|p| !p.trim().is_empty());
        let has_glob = self
            .glob_pattern
            .as_deref()
            .is_some_and(|p| !p.trim().is_empty());
        if !has_regex && !has_glob {
            return Err(config_error(
                "patterns",
                "at least one regex or glob pattern must be configured",
            ));
        }

        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(config_error(
                "batch_size",
                format!("must be 1-{}", MAX_BATCH_SIZE),
            ));
        }

        if self.buffer_size == 0 || self.buffer_size > MAX_BUFFER_SIZE {
            return Err(config_error(
                "buffer_size",
                format!("must be 1-{}", MAX_BUFFER_SIZE),
            ));
        }

        if self.lines_per_second == 0 || self.lines_per_second > MAX_LINES_PER_SECOND {
            return Err(config_error(
                "lines_per_second",
                format!("must be 1-{}", MAX_LINES_PER_SECOND),
            ));
        }

        let durations = [
            ("idle_timeout", self.idle_timeout),
            ("watch_interval", self.watch_interval),
            ("read_interval", self.read_interval),
            ("invalid_file_ttl", self.invalid_file_ttl),
        ];
        for (field, value) in durations {
            if value.is_zero() {
                return Err(config_error(field, "must be greater than 0"));
            }
        }

        if self.invalid_file_capacity == 0 {
            return Err(config_error("invalid_file_capacity", "must be greater than 0"));
        }

        Ok(())
    }
}

fn config_error(field: &str, reason: impl Into<String>) -> TailError {
    TailError::Config {
        field: field.to_owned(),
        reason: reason.into(),
    }
}

/// 감시 엔진 설정 빌더
///
/// 3개 이상의 설정 필드가 있으므로 빌더 패턴을 사용합니다.
#[derive(Default)]
pub struct WatchConfigBuilder {
    config: WatchConfig,
}

impl WatchConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 정규식 패턴(쉼표 구분)을 설정합니다.
    pub fn regex_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.regex_pattern = Some(pattern.into());
        self
    }

    /// glob 패턴(쉼표 구분)을 설정합니다.
    pub fn glob_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.glob_pattern = Some(pattern.into());
        self
    }

    /// 유휴 판정 시간을 설정합니다.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// 배치 크기를 설정합니다.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    /// 원시 읽기 버퍼 크기를 설정합니다.
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.config.buffer_size = size;
        self
    }

    /// 파일당 초당 최대 라인 수를 설정합니다.
    pub fn lines_per_second(mut self, limit: u32) -> Self {
        self.config.lines_per_second = limit;
        self
    }

    /// 파일 탐색 주기를 설정합니다.
    pub fn watch_interval(mut self, interval: Duration) -> Self {
        self.config.watch_interval = interval;
        self
    }

    /// 읽기 루프 대기 시간을 설정합니다.
    pub fn read_interval(mut self, interval: Duration) -> Self {
        self.config.read_interval = interval;
        self
    }

    /// 열기 실패 캐시 유지 시간을 설정합니다.
    pub fn invalid_file_ttl(mut self, ttl: Duration) -> Self {
        self.config.invalid_file_ttl = ttl;
        self
    }

    /// 열기 실패 캐시의 최대 항목 수를 설정합니다.
    pub fn invalid_file_capacity(mut self, capacity: usize) -> Self {
        self.config.invalid_file_capacity = capacity;
        self
    }

    /// 파일 핸들 유지 방식을 설정합니다.
    pub fn handle_mode(mut self, mode: HandleMode) -> Self {
        self.config.handle_mode = mode;
        self
    }

    /// 설정을 검증하고 `WatchConfig`를 생성합니다.
    pub fn build(self) -> Result<WatchConfig, TailError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
