//! 단일 파일 테일러
//!
//! [`Tailer`]는 파일 하나에 대한 읽기 상태를 유지합니다:
//! 파일 식별자, 읽은 위치(오프셋), 부분 라인 버퍼, 속도 제한기, 마지막 수정 시각.
//!
//! # 상태 전이
//!
//! ```text
//! Opening --read_lines()--> Reading <--> IdleWait
//!                              |            |
//!                              +--close()---+--> (Closed)
//!                              +--rotated()-+--> (RotatedClosed)
//! ```
//!
//! 종료 상태는 테일러를 소비하는 [`close`](Tailer::close)로 표현되므로
//! [`TailerState`]에는 살아 있는 상태만 있습니다.
//!
//! 열기 시점에는 파일 끝으로 이동할 수 있으며(기존 내용 건너뜀), 이후
//! [`read_lines`](Tailer::read_lines)는 새로 추가된 완성 라인만 반환합니다.
//! 핸들 유지 방식은 [`HandleMode`]로 결정됩니다.

mod file_id;
mod handle;
mod limiter;
mod line_reader;

pub use file_id::FileId;
pub use handle::HandleMode;
pub use limiter::RateLimiter;
pub use line_reader::LineReader;

use std::fs::{self, File};
use std::io::{self, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use metrics::counter;
use tracing::{debug, info, warn};

use tailwatch_core::metrics as m;

use crate::config::WatchConfig;
use crate::error::TailError;

/// 테일러 생성 옵션
#[derive(Debug, Clone)]
pub struct TailerOptions {
    /// 열 때 파일 끝으로 이동할지 여부
    pub seek_to_end: bool,
    /// 한 번의 `read_lines` 호출에서 반환할 최대 라인 수
    pub batch_size: usize,
    /// 원시 읽기 버퍼 크기
    pub buffer_size: usize,
    /// 초당 최대 라인 수
    pub lines_per_second: u32,
    /// 핸들 유지 방식
    pub handle_mode: HandleMode,
}

impl Default for TailerOptions {
    fn default() -> Self {
        Self {
            seek_to_end: true,
            batch_size: 1024,
            buffer_size: 8192,
            lines_per_second: 1000,
            handle_mode: HandleMode::platform_default(),
        }
    }
}

impl TailerOptions {
    /// 감시 설정에서 테일러 옵션을 만듭니다. 새로 발견된 파일은 항상 끝에서 시작합니다.
    pub fn from_config(config: &WatchConfig) -> Self {
        Self {
            seek_to_end: true,
            batch_size: config.batch_size,
            buffer_size: config.buffer_size,
            lines_per_second: config.lines_per_second,
            handle_mode: config.handle_mode,
        }
    }

    fn validate(&self) -> Result<(), TailError> {
        let checks = [
            ("batch_size", self.batch_size == 0),
            ("buffer_size", self.buffer_size == 0),
            ("lines_per_second", self.lines_per_second == 0),
        ];
        for (field, invalid) in checks {
            if invalid {
                return Err(TailError::Config {
                    field: field.to_owned(),
                    reason: "must be greater than 0".to_owned(),
                });
            }
        }
        Ok(())
    }
}

/// 테일러 읽기 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailerState {
    /// 열었지만 아직 읽지 않음
    Opening,
    /// 마지막 호출에서 라인을 반환함
    Reading,
    /// 파일 끝에 도달했거나 속도 제한에 걸려 다음 호출을 기다림
    IdleWait,
}

impl std::fmt::Display for TailerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Opening => write!(f, "opening"),
            Self::Reading => write!(f, "reading"),
            Self::IdleWait => write!(f, "idle_wait"),
        }
    }
}

enum NextLine {
    Line(String),
    Eof,
    Throttled,
}

/// 단일 파일 테일러
#[derive(Debug)]
pub struct Tailer {
    path: PathBuf,
    file: Option<File>,
    mode: HandleMode,
    id: FileId,
    /// 파일에서 읽어 들인 바이트 위치
    offset: u64,
    last_modified: SystemTime,
    reader: LineReader,
    /// 속도 제한으로 보류된 완성 라인
    pending: Option<String>,
    limiter: RateLimiter,
    batch_size: usize,
    state: TailerState,
}

impl Tailer {
    /// 파일을 열고 테일러를 생성합니다.
    ///
    /// # Errors
    ///
    /// 옵션 값이 0이면 `TailError::Config`, 파일을 열 수 없으면 `TailError::Open`을 반환합니다.
    pub fn open(path: impl AsRef<Path>, options: &TailerOptions) -> Result<Self, TailError> {
        options.validate()?;
        let path = path.as_ref().to_path_buf();
        let open_error = |source: io::Error| TailError::Open {
            path: path.clone(),
            source,
        };

        let mut file = File::open(&path).map_err(open_error)?;
        let metadata = file.metadata().map_err(open_error)?;
        if metadata.is_dir() {
            return Err(open_error(io::Error::other("path is a directory")));
        }
        let id = FileId::from_file(&file).map_err(open_error)?;
        let offset = if options.seek_to_end {
            file.seek(SeekFrom::End(0)).map_err(open_error)?
        } else {
            0
        };

        debug!(
            path = %path.display(),
            file_id = %id,
            offset,
            mode = %options.handle_mode,
            "tailer opened"
        );

        Ok(Self {
            file: options.handle_mode.holds_handle().then_some(file),
            mode: options.handle_mode,
            id,
            offset,
            last_modified: metadata.modified().unwrap_or(UNIX_EPOCH),
            reader: LineReader::new(options.buffer_size),
            pending: None,
            limiter: RateLimiter::new(options.lines_per_second),
            batch_size: options.batch_size,
            state: TailerState::Opening,
            path,
        })
    }

    /// 새로 추가된 완성 라인을 최대 `batch_size`개 반환합니다.
    ///
    /// 종결자가 없는 마지막 부분 라인은 반환하지 않고 다음 호출을 위해 보존합니다.
    /// 속도 한도를 넘는 라인은 버리지 않고 이후 호출로 미룹니다.
    pub fn read_lines(&mut self) -> io::Result<Vec<String>> {
        self.acquire()?;
        let mut lines = Vec::new();
        let result = self.fill_batch(&mut lines);
        self.release();

        match result {
            Ok(()) => Ok(lines),
            Err(e) if !lines.is_empty() => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    delivered = lines.len(),
                    "read interrupted, returning partial batch"
                );
                Ok(lines)
            }
            Err(e) => Err(e),
        }
    }

    fn fill_batch(&mut self, lines: &mut Vec<String>) -> io::Result<()> {
        while lines.len() < self.batch_size {
            let next = self.next_line();
            self.state = match (&next, lines.is_empty()) {
                (Ok(NextLine::Line(_)), _) | (_, false) => TailerState::Reading,
                _ => TailerState::IdleWait,
            };
            match next? {
                NextLine::Line(line) => lines.push(line),
                NextLine::Eof => break,
                NextLine::Throttled => {
                    warn!(
                        path = %self.path.display(),
                        limit = self.limiter.limit(),
                        "read frequency limit reached"
                    );
                    counter!(m::RATE_LIMITED_TOTAL).increment(1);
                    break;
                }
            }
        }
        Ok(())
    }

    fn next_line(&mut self) -> io::Result<NextLine> {
        if self.pending.is_none() {
            let Some(file) = self.file.as_mut() else {
                return Err(io::Error::other("file handle not acquired"));
            };
            self.pending = self.reader.next_line(file, &mut self.offset)?;
        }
        if self.pending.is_none() {
            return Ok(NextLine::Eof);
        }
        if !self.limiter.try_acquire() {
            return Ok(NextLine::Throttled);
        }
        Ok(self.pending.take().map_or(NextLine::Eof, NextLine::Line))
    }

    /// 읽기에 필요한 핸들을 확보합니다. 재열기 모드에서는 저장된 오프셋으로 이동합니다.
    fn acquire(&mut self) -> io::Result<()> {
        if self.file.is_none() {
            let mut file = File::open(&self.path)?;
            file.seek(SeekFrom::Start(self.offset))?;
            self.file = Some(file);
        }
        Ok(())
    }

    fn release(&mut self) {
        if !self.mode.holds_handle() {
            self.file = None;
        }
    }

    /// 경로의 파일이 교체되었는지 확인합니다.
    ///
    /// 다음 중 하나면 `true`입니다:
    /// - 경로의 파일이 삭제됨. 핸들을 유지하는 모드에서는 열린 핸들로
    ///   남은 라인을 모두 읽은 뒤에만 해당
    /// - 경로의 파일 식별자가 열 때와 다름
    /// - 읽은 위치가 현재 파일 길이보다 큼 (truncate)
    ///
    /// 그 외 I/O 에러는 로그로 남기고 `false`를 반환합니다.
    pub fn rotated(&self) -> bool {
        match self.check_rotated() {
            Ok(Some(reason)) => {
                info!(path = %self.path.display(), reason, "file rotated");
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "rotation check failed");
                false
            }
        }
    }

    fn check_rotated(&self) -> io::Result<Option<&'static str>> {
        let current = match FileId::from_path(&self.path) {
            Ok(id) => id,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if self.file.is_some() && !self.is_drained() {
                    debug!(path = %self.path.display(), "file removed, draining open handle");
                    return Ok(None);
                }
                return Ok(Some("removed"));
            }
            Err(e) => return Err(e),
        };
        if current != self.id {
            return Ok(Some("file identity changed"));
        }
        if self.offset > self.current_len()? {
            return Ok(Some("truncated"));
        }
        Ok(None)
    }

    fn current_len(&self) -> io::Result<u64> {
        match &self.file {
            Some(file) => Ok(file.metadata()?.len()),
            None => Ok(fs::metadata(&self.path)?.len()),
        }
    }

    /// 기록된 수정 시각과 디스크의 수정 시각 중 늦은 값을 반환합니다.
    ///
    /// 파일이 사라졌으면 마지막으로 기록된 값을 유지합니다.
    pub fn last_modified(&mut self) -> SystemTime {
        if let Ok(modified) = fs::metadata(&self.path).and_then(|m| m.modified()) {
            self.last_modified = self.last_modified.max(modified);
        }
        self.last_modified
    }

    /// 버퍼와 보류 라인이 비어 있고 파일 끝까지 읽었는지 여부
    ///
    /// 파일 길이를 확인할 수 없으면 더 읽을 것이 없는 것으로 봅니다.
    pub fn is_drained(&self) -> bool {
        if self.pending.is_some() || self.reader.has_buffered() {
            return false;
        }
        !matches!(self.current_len(), Ok(len) if self.offset < len)
    }

    /// 핸들을 닫고 테일러를 종료합니다.
    pub fn close(self) {
        debug!(
            path = %self.path.display(),
            offset = self.offset,
            "tailer closed"
        );
    }

    /// 현재 읽기 상태
    pub fn state(&self) -> TailerState {
        self.state
    }

    /// 테일링 중인 파일 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 열 때 기록한 파일 식별자
    pub fn file_id(&self) -> FileId {
        self.id
    }

    /// 파일에서 읽어 들인 바이트 위치
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// 핸들 유지 방식
    pub fn handle_mode(&self) -> HandleMode {
        self.mode
    }

    /// 현재 파일 핸들을 보유 중인지 여부
    pub fn holds_handle(&self) -> bool {
        self.file.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    fn options(mode: HandleMode) -> TailerOptions {
        TailerOptions {
            seek_to_end: true,
            batch_size: 1024,
            buffer_size: 8192,
            lines_per_second: 100_000,
            handle_mode: mode,
        }
    }

    fn append(path: &Path, content: &str) {
        let mut file = fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    fn numbered(count: usize) -> String {
        (0..count).map(|i| format!("line-{i}\n")).collect()
    }

    #[test]
    fn seek_to_end_skips_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gc.log");
        append(&path, "old-1\nold-2\n");

        let mut tailer = Tailer::open(&path, &options(HandleMode::HoldOpen)).unwrap();
        assert!(tailer.read_lines().unwrap().is_empty());

        append(&path, "new\n");
        assert_eq!(tailer.read_lines().unwrap(), ["new"]);
    }

    #[test]
    fn reads_from_start_when_not_seeking() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gc.log");
        append(&path, &numbered(3));

        let opts = TailerOptions {
            seek_to_end: false,
            ..options(HandleMode::HoldOpen)
        };
        let mut tailer = Tailer::open(&path, &opts).unwrap();
        assert_eq!(tailer.read_lines().unwrap(), ["line-0", "line-1", "line-2"]);
    }

    #[test]
    fn appended_lines_arrive_in_batches() {
        for mode in [HandleMode::HoldOpen, HandleMode::ReopenPerCall] {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("gc.log");
            append(&path, "");

            let opts = TailerOptions {
                batch_size: 16,
                ..options(mode)
            };
            let mut tailer = Tailer::open(&path, &opts).unwrap();
            append(&path, &numbered(100));

            let mut lines = Vec::new();
            loop {
                let batch = tailer.read_lines().unwrap();
                assert!(batch.len() <= 16);
                if batch.is_empty() {
                    break;
                }
                lines.extend(batch);
            }

            let expected: Vec<String> = (0..100).map(|i| format!("line-{i}")).collect();
            assert_eq!(lines, expected, "mode {mode}");
            assert!(tailer.read_lines().unwrap().is_empty());
        }
    }

    #[test]
    fn partial_line_waits_for_terminator() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gc.log");
        append(&path, "");
        let mut tailer = Tailer::open(&path, &options(HandleMode::ReopenPerCall)).unwrap();

        append(&path, "abc");
        assert!(tailer.read_lines().unwrap().is_empty());
        append(&path, "def\r\n");
        assert_eq!(tailer.read_lines().unwrap(), ["abcdef"]);
    }

    #[test]
    fn state_follows_reads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gc.log");
        append(&path, "");

        let mut tailer = Tailer::open(&path, &options(HandleMode::HoldOpen)).unwrap();
        assert_eq!(tailer.state(), TailerState::Opening);

        append(&path, "one\ntwo\n");
        assert_eq!(tailer.read_lines().unwrap().len(), 2);
        assert_eq!(tailer.state(), TailerState::Reading);

        assert!(tailer.read_lines().unwrap().is_empty());
        assert_eq!(tailer.state(), TailerState::IdleWait);
        assert_eq!(tailer.state().to_string(), "idle_wait");
    }

    #[test]
    fn reopen_mode_releases_handle_between_calls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gc.log");
        append(&path, "");

        let mut tailer = Tailer::open(&path, &options(HandleMode::ReopenPerCall)).unwrap();
        assert!(!tailer.holds_handle());
        append(&path, "one\n");
        assert_eq!(tailer.read_lines().unwrap(), ["one"]);
        assert!(!tailer.holds_handle());

        let mut held = Tailer::open(&path, &options(HandleMode::HoldOpen)).unwrap();
        held.read_lines().unwrap();
        assert!(held.holds_handle());
    }

    #[test]
    fn rate_limit_defers_lines_without_loss() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gc.log");
        append(&path, "");

        let opts = TailerOptions {
            lines_per_second: 1,
            ..options(HandleMode::HoldOpen)
        };
        let mut tailer = Tailer::open(&path, &opts).unwrap();
        append(&path, "first\nsecond\n");

        assert_eq!(tailer.read_lines().unwrap(), ["first"]);
        assert!(tailer.read_lines().unwrap().is_empty());
        assert!(!tailer.is_drained());

        std::thread::sleep(Duration::from_millis(1150));
        assert_eq!(tailer.read_lines().unwrap(), ["second"]);
        assert!(tailer.is_drained());
    }

    #[test]
    fn not_rotated_while_appending() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gc.log");
        append(&path, "");
        let mut tailer = Tailer::open(&path, &options(HandleMode::HoldOpen)).unwrap();

        append(&path, &numbered(10));
        tailer.read_lines().unwrap();
        assert!(!tailer.rotated());
    }

    #[test]
    fn rotation_by_delete_and_recreate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gc.log");
        append(&path, "");
        // 핸들을 유지해 삭제된 inode가 재사용되지 않도록 합니다.
        let tailer = Tailer::open(&path, &options(HandleMode::HoldOpen)).unwrap();

        fs::remove_file(&path).unwrap();
        assert!(tailer.rotated());

        append(&path, "fresh\n");
        assert!(tailer.rotated());
    }

    #[cfg(unix)]
    #[test]
    fn removed_file_drains_through_held_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gc.log");
        append(&path, "");
        let opts = TailerOptions {
            batch_size: 1,
            ..options(HandleMode::HoldOpen)
        };
        let mut tailer = Tailer::open(&path, &opts).unwrap();
        append(&path, "a\nb\nc\n");
        fs::remove_file(&path).unwrap();

        let mut lines = Vec::new();
        while !tailer.rotated() {
            let batch = tailer.read_lines().unwrap();
            assert!(!batch.is_empty(), "backlog must be readable before rotation");
            lines.extend(batch);
        }
        assert_eq!(lines, ["a", "b", "c"]);
    }

    #[test]
    fn removed_file_rotates_immediately_in_reopen_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gc.log");
        append(&path, "");
        let tailer = Tailer::open(&path, &options(HandleMode::ReopenPerCall)).unwrap();
        append(&path, "unread\n");

        fs::remove_file(&path).unwrap();
        assert!(tailer.rotated());
    }

    #[test]
    fn rotation_by_rename() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gc.log");
        append(&path, "");
        let tailer = Tailer::open(&path, &options(HandleMode::ReopenPerCall)).unwrap();

        fs::rename(&path, dir.path().join("gc.log.1")).unwrap();
        append(&path, "fresh\n");
        assert!(tailer.rotated());
    }

    #[test]
    fn rotation_by_truncation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gc.log");
        append(&path, "");
        let mut tailer = Tailer::open(&path, &options(HandleMode::HoldOpen)).unwrap();

        append(&path, &numbered(10));
        assert_eq!(tailer.read_lines().unwrap().len(), 10);

        fs::write(&path, "x\n").unwrap();
        assert!(tailer.rotated());
    }

    #[test]
    fn drained_only_after_reading_everything() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gc.log");
        append(&path, "");
        let mut tailer = Tailer::open(&path, &options(HandleMode::HoldOpen)).unwrap();
        assert!(tailer.is_drained());

        append(&path, "a\n");
        assert!(!tailer.is_drained());
        tailer.read_lines().unwrap();
        assert!(tailer.is_drained());
    }

    #[test]
    fn last_modified_is_monotonic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gc.log");
        append(&path, "");
        let mut tailer = Tailer::open(&path, &options(HandleMode::HoldOpen)).unwrap();

        let first = tailer.last_modified();
        std::thread::sleep(Duration::from_millis(20));
        append(&path, "a\n");
        let second = tailer.last_modified();
        assert!(second >= first);

        fs::remove_file(&path).unwrap();
        assert_eq!(tailer.last_modified(), second);
    }

    #[test]
    fn open_missing_file_fails() {
        let err = Tailer::open("/nonexistent/tailwatch/gc.log", &TailerOptions::default())
            .unwrap_err();
        assert!(matches!(err, TailError::Open { .. }));
    }

    #[test]
    fn open_rejects_zero_options() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let opts = TailerOptions {
            batch_size: 0,
            ..TailerOptions::default()
        };
        assert!(matches!(
            Tailer::open(file.path(), &opts).unwrap_err(),
            TailError::Config { .. }
        ));
    }

    #[test]
    fn open_rejects_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Tailer::open(dir.path(), &TailerOptions::default()).is_err());
    }
}
