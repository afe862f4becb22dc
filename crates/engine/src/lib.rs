//! tailwatch 엔진: 로그 파일 탐색과 테일링
//!
//! 정규식/glob 패턴으로 로그 파일을 주기적으로 찾아 끝에서부터 새 라인을 읽고,
//! 파일 수명주기(열기, 유휴 닫기, 로테이션)와 읽은 라인을 [`Listener`]에 전달합니다.
//!
//! # 모듈 구성
//!
//! - [`source`]: 정규식/glob 파일 탐색 소스
//! - [`tailer`]: 단일 파일 테일러 (라인 분리, 속도 제한, 로테이션 감지)
//! - [`manager`]: 워치/읽기 루프를 실행하는 감시 매니저
//! - [`listener`]: 이벤트 리스너 trait
//! - [`invalid`]: 열기 실패 파일 TTL 캐시
//! - [`config`]: 엔진 설정 (core 설정 변환)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! SourceSet -> WatchManager -> Tailer* -> Listener
//!     |             |             |
//! Regex/Glob   watch + read   LineReader + RateLimiter
//! ```

pub mod config;
pub mod error;
pub mod invalid;
pub mod listener;
pub mod manager;
pub mod source;
pub mod tailer;

// --- 주요 타입 re-export ---

// 매니저
pub use manager::WatchManager;

// 설정
pub use config::{WatchConfig, WatchConfigBuilder};

// 에러
pub use error::TailError;

// 리스너
pub use listener::{Listener, ListenerError};

// 소스
pub use source::{GlobSource, RegexSource, SourceSet, TailSource};

// 테일러
pub use tailer::{FileId, HandleMode, Tailer, TailerOptions, TailerState};

// 실패 캐시
pub use invalid::InvalidFileCache;
