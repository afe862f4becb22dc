//! 테일링 엔진 에러 타입
//!
//! [`TailError`]는 엔진 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<TailError> for TailwatchError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use std::path::PathBuf;

use tailwatch_core::error::{EngineError, TailwatchError};

/// 테일링 엔진 도메인 에러
///
/// 설정 검증, 패턴 컴파일, 파일 열기/읽기 등 엔진 내부의
/// 모든 에러 상황을 포괄합니다.
#[derive(Debug, thiserror::Error)]
pub enum TailError {
    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 파일 패턴 에러 (정규식/glob 컴파일 실패 등)
    #[error("invalid pattern '{pattern}': {reason}")]
    Pattern {
        /// 문제가 된 패턴
        pattern: String,
        /// 실패 사유
        reason: String,
    },

    /// 파일 열기 실패
    #[error("failed to open {}: {source}", path.display())]
    Open {
        /// 파일 경로
        path: PathBuf,
        /// 원인 I/O 에러
        #[source]
        source: std::io::Error,
    },

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// 정규식 컴파일 에러
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),

    /// glob 컴파일 에러
    #[error("glob error: {0}")]
    Glob(#[from] globset::Error),
}

impl From<TailError> for TailwatchError {
    fn from(err: TailError) -> Self {
        TailwatchError::Engine(EngineError::InitFailed(err.to_string()))
    }
}
