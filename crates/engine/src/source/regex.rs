//! 정규식 파일 소스
//!
//! 패턴의 마지막 경로 세그먼트를 파일명 정규식으로, 나머지를 부모 디렉토리로
//! 해석합니다. 부모 디렉토리의 직계 항목만 검사하며 재귀하지 않습니다.
//!
//! 예: `/var/log/app/gc-[0-9]+\.log` → `/var/log/app`에서 `gc-[0-9]+\.log`와
//! 전체 일치하는 파일

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ::regex::Regex;
use tracing::{debug, warn};

use super::TailSource;
use crate::error::TailError;

/// 정규식 기반 파일 소스
#[derive(Debug)]
pub struct RegexSource {
    pattern: String,
    parent: PathBuf,
    file_regex: Regex,
}

impl RegexSource {
    /// 패턴을 파싱하고 파일명 정규식을 컴파일합니다.
    ///
    /// 부모 경로가 없으면 현재 작업 디렉토리를 사용합니다.
    /// 파일명 정규식은 전체 일치(`^...$`)로 컴파일됩니다.
    pub fn new(pattern: &str) -> Result<Self, TailError> {
        let pattern = pattern.trim();
        let pattern_error = |reason: &str| TailError::Pattern {
            pattern: pattern.to_owned(),
            reason: reason.to_owned(),
        };

        let path = Path::new(pattern);
        let file_name = path
            .file_name()
            .and_then(OsStr::to_str)
            .ok_or_else(|| pattern_error("pattern has no file name segment"))?;

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => std::path::absolute(parent)?,
            _ => std::env::current_dir()?,
        };

        let file_regex = Regex::new(&format!("^(?:{file_name})$"))?;

        Ok(Self {
            pattern: pattern.to_owned(),
            parent,
            file_regex,
        })
    }

    /// 탐색 대상 부모 디렉토리
    pub fn parent(&self) -> &Path {
        &self.parent
    }

    /// 파일명이 정규식과 전체 일치하는지 검사합니다.
    pub fn matches_name(&self, name: &str) -> bool {
        self.file_regex.is_match(name)
    }
}

impl TailSource for RegexSource {
    fn kind(&self) -> &str {
        "regex"
    }

    fn pattern(&self) -> &str {
        &self.pattern
    }

    fn find_matching_files(&self) -> Vec<PathBuf> {
        let entries = match fs::read_dir(&self.parent) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(parent = %self.parent.display(), "regex source directory does not exist");
                return Vec::new();
            }
            Err(e) => {
                warn!(
                    parent = %self.parent.display(),
                    error = %e,
                    "failed to list regex source directory"
                );
                return Vec::new();
            }
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(parent = %self.parent.display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            let path = entry.path();
            if path.is_dir() {
                continue;
            }
            let name = entry.file_name();
            if name.to_str().is_some_and(|n| self.matches_name(n)) {
                files.push(path);
            }
        }
        files
    }
}
