//! 테일링 이벤트 리스너
//!
//! [`WatchManager`](crate::WatchManager)는 파일 수명주기와 읽은 라인을
//! [`Listener`]에 전달합니다. 한 경로에 대한 이벤트 순서는 다음과 같습니다:
//!
//! ```text
//! on_open → on_read* → (on_close | on_rotate)
//! ```
//!
//! 워치 루프와 읽기 루프가 같은 잠금 아래에서 콜백을 호출하므로
//! 콜백은 동시에 실행되지 않습니다. 콜백이 오래 걸리면 모든 파일의 처리가 지연됩니다.

use std::path::Path;

/// 리스너 콜백 에러
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// 이 파일을 처리할 수 없음. 테일링하지 않되 실패 캐시에도 넣지 않음
    #[error("unsupported file: {0}")]
    Unsupported(String),

    /// 콜백 처리 실패
    #[error("listener failed: {0}")]
    Failed(String),
}

/// 테일링 이벤트 리스너
///
/// 데몬, 테스트 등 엔진 사용자가 구현합니다.
pub trait Listener: Send + Sync + 'static {
    /// 새 파일 테일링을 시작했습니다.
    ///
    /// [`ListenerError::Unsupported`]를 반환하면 파일을 건너뛰고 다음 주기에 다시
    /// 시도합니다. 그 외 에러는 파일을 실패 캐시에 등록합니다.
    fn on_open(&self, path: &Path) -> Result<(), ListenerError>;

    /// 유휴 상태가 되었거나 매니저가 종료되어 테일링을 끝냈습니다.
    fn on_close(&self, path: &Path) -> Result<(), ListenerError>;

    /// 경로의 파일이 교체되어 테일링을 끝냈습니다.
    fn on_rotate(&self, path: &Path) -> Result<(), ListenerError>;

    /// 완성된 라인 하나를 읽었습니다 (종결자 제외).
    fn on_read(&self, path: &Path, line: &str) -> Result<(), ListenerError>;
}
