//! 에러 타입: 도메인별 에러 정의

/// tailwatch 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum TailwatchError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 테일링 엔진 에러
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 테일링 엔진 에러
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// 엔진 초기화 실패 (패턴 컴파일, 설정 검증 등)
    #[error("engine init failed: {0}")]
    InitFailed(String),
}
