//! tailwatch 공통 크레이트
//!
//! 엔진과 데몬이 공유하는 에러 타입, TOML 설정, 메트릭 이름을 제공합니다.
//!
//! # 모듈 구성
//!
//! - [`config`]: `tailwatch.toml` 파싱, 환경변수 오버라이드, 검증
//! - [`error`]: 최상위 에러 타입
//! - [`metrics`]: 메트릭 이름 상수와 설명 등록

pub mod config;
pub mod error;
pub mod metrics;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, EngineError, TailwatchError};

// 설정
pub use config::{GeneralConfig, TailwatchConfig, WatchSection};
