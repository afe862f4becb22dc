//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 엔진은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`
//! 매크로를 호출합니다. 레코더(익스포터) 설치는 이 크레이트의 범위가 아닙니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `tailwatch_`
//! - 접미어: `_total` (counter), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(tailwatch_core::metrics::LINES_READ_TOTAL).increment(1);
//! ```

// ─── 파일 생명주기 메트릭 ───────────────────────────────────────────

/// 테일링을 시작한 파일 수 (counter)
pub const FILES_OPENED_TOTAL: &str = "tailwatch_files_opened_total";

/// 유휴 상태 또는 종료로 닫힌 파일 수 (counter)
pub const FILES_CLOSED_TOTAL: &str = "tailwatch_files_closed_total";

/// 로테이션/트렁케이션으로 해제된 파일 수 (counter)
pub const FILES_ROTATED_TOTAL: &str = "tailwatch_files_rotated_total";

/// 열기에 실패하여 무효 캐시에 기록된 파일 수 (counter)
pub const OPEN_FAILURES_TOTAL: &str = "tailwatch_open_failures_total";

/// 현재 테일링 중인 파일 수 (gauge)
pub const TAILED_FILES: &str = "tailwatch_tailed_files";

// ─── 읽기 메트릭 ────────────────────────────────────────────────────

/// 리스너에 전달된 라인 수 (counter)
pub const LINES_READ_TOTAL: &str = "tailwatch_lines_read_total";

/// 파일별 읽기 실패 수 (counter)
pub const READ_ERRORS_TOTAL: &str = "tailwatch_read_errors_total";

/// 속도 제한으로 연기된 읽기 수 (counter)
pub const RATE_LIMITED_TOTAL: &str = "tailwatch_rate_limited_total";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    describe_counter!(FILES_OPENED_TOTAL, "Total number of files opened for tailing");
    describe_counter!(
        FILES_CLOSED_TOTAL,
        "Total number of tailed files closed after going idle or on shutdown"
    );
    describe_counter!(
        FILES_ROTATED_TOTAL,
        "Total number of tailed files released after rotation or truncation"
    );
    describe_counter!(
        OPEN_FAILURES_TOTAL,
        "Total number of files that failed to open and were cached as invalid"
    );
    describe_gauge!(TAILED_FILES, "Number of files currently being tailed");
    describe_counter!(LINES_READ_TOTAL, "Total number of lines delivered to the listener");
    describe_counter!(READ_ERRORS_TOTAL, "Total number of per-file read failures");
    describe_counter!(
        RATE_LIMITED_TOTAL,
        "Total number of reads deferred by the per-file line rate limiter"
    );
}
