//! 파일 핸들 유지 방식
//!
//! - [`HandleMode::HoldOpen`]: 테일링 기간 내내 핸들을 유지합니다 (POSIX 기본값).
//!   unlink된 파일도 핸들이 열려 있는 한 끝까지 읽을 수 있습니다.
//! - [`HandleMode::ReopenPerCall`]: 읽기 호출마다 열고 저장된 오프셋으로 이동한 뒤
//!   호출이 끝나면 닫습니다 (Windows 기본값). 열린 핸들이 로그 작성기의
//!   rename/delete를 막는 플랫폼용입니다.

use std::fmt;

use crate::error::TailError;

/// 파일 핸들 유지 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleMode {
    /// 핸들을 계속 유지
    HoldOpen,
    /// 호출마다 다시 열고 호출 후 닫음
    ReopenPerCall,
}

impl HandleMode {
    /// 현재 플랫폼의 기본 모드를 반환합니다.
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            Self::ReopenPerCall
        } else {
            Self::HoldOpen
        }
    }

    /// 설정 문자열을 해석합니다 (`auto`, `hold_open`, `reopen`).
    pub fn parse(value: &str) -> Result<Self, TailError> {
        match value {
            "auto" => Ok(Self::platform_default()),
            "hold_open" => Ok(Self::HoldOpen),
            "reopen" => Ok(Self::ReopenPerCall),
            other => Err(TailError::Config {
                field: "handle_mode".to_owned(),
                reason: format!("unknown handle mode '{other}', expected auto, hold_open or reopen"),
            }),
        }
    }

    /// 호출 사이에 핸들을 유지하는지 여부
    pub fn holds_handle(self) -> bool {
        matches!(self, Self::HoldOpen)
    }
}

impl fmt::Display for HandleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HoldOpen => write!(f, "hold_open"),
            Self::ReopenPerCall => write!(f, "reopen"),
        }
    }
}
