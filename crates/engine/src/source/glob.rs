//! Glob 파일 소스
//!
//! 패턴의 디렉토리 부분에서 첫 와일드카드 세그먼트(`*`, `?`, `[`, `{` 포함) 직전까지를
//! 기준 디렉토리로 삼고, 그 아래를 재귀 탐색하며 전체 경로가 glob과 일치하는
//! 일반 파일을 수집합니다.
//!
//! - `*`, `?`, `[...]`는 경로 구분자를 넘지 않습니다. `**`는 여러 디렉토리와 일치합니다.
//! - 심볼릭 링크를 따라가며 최대 깊이는 [`MAX_WALK_DEPTH`]입니다.
//! - 상대 패턴은 현재 작업 디렉토리 기준 절대 경로로 변환합니다.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::TailSource;
use crate::error::TailError;

/// 재귀 탐색 최대 깊이
pub const MAX_WALK_DEPTH: usize = 100;

const WILDCARD_CHARS: [char; 4] = ['*', '?', '[', '{'];

/// Glob 기반 파일 소스
#[derive(Debug)]
pub struct GlobSource {
    pattern: String,
    base: PathBuf,
    matcher: GlobMatcher,
}

impl GlobSource {
    /// 패턴을 컴파일하고 기준 디렉토리를 계산합니다.
    pub fn new(pattern: &str) -> Result<Self, TailError> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(TailError::Pattern {
                pattern: pattern.to_owned(),
                reason: "empty glob pattern".to_owned(),
            });
        }

        let absolute = std::path::absolute(Path::new(pattern))?;
        let glob_text = absolute.to_str().ok_or_else(|| TailError::Pattern {
            pattern: pattern.to_owned(),
            reason: "pattern is not valid UTF-8 after resolving".to_owned(),
        })?;

        let matcher = GlobBuilder::new(glob_text)
            .literal_separator(true)
            .build()?
            .compile_matcher();

        Ok(Self {
            pattern: pattern.to_owned(),
            base: glob_base(&absolute),
            matcher,
        })
    }

    /// 재귀 탐색 기준 디렉토리
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// 경로가 glob과 일치하는지 검사합니다.
    pub fn matches(&self, path: &Path) -> bool {
        self.matcher.is_match(path)
    }
}

impl TailSource for GlobSource {
    fn kind(&self) -> &str {
        "glob"
    }

    fn pattern(&self) -> &str {
        &self.pattern
    }

    fn find_matching_files(&self) -> Vec<PathBuf> {
        let walker = WalkDir::new(&self.base)
            .follow_links(true)
            .max_depth(MAX_WALK_DEPTH);

        let mut files = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && self.matches(entry.path()) {
                        files.push(entry.into_path());
                    }
                }
                Err(e) if e.depth() == 0 => {
                    // 기준 디렉토리 자체를 읽을 수 없으면 이번 주기는 빈 결과
                    warn!(base = %self.base.display(), error = %e, "glob base walk failed");
                    return Vec::new();
                }
                Err(e) => {
                    debug!(base = %self.base.display(), error = %e, "skipping unreadable path");
                }
            }
        }
        files
    }
}

/// 패턴의 부모 경로에서 와일드카드 세그먼트 직전까지의 접두 경로를 계산합니다.
///
/// - `/a/b/*/c.log` → `/a/b`
/// - `/a/*.log` → `/a`
/// - `/a/b/c.log` → `/a/b`
pub fn glob_base(pattern: &Path) -> PathBuf {
    let mut base = PathBuf::new();
    let Some(parent) = pattern.parent() else {
        return base;
    };
    for component in parent.components() {
        if let Component::Normal(segment) = component
            && has_wildcard(segment)
        {
            break;
        }
        base.push(component);
    }
    base
}

fn has_wildcard(segment: &OsStr) -> bool {
    segment.to_string_lossy().contains(WILDCARD_CHARS)
}
