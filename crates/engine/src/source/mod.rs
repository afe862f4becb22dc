//! 테일링 대상 파일 탐색
//!
//! [`TailSource`] trait으로 탐색 전략을 추상화합니다.
//! [`SourceSet`]은 설정된 모든 소스를 순서대로 조회하고 결과를 합칩니다.
//!
//! # 지원 소스
//! - [`RegexSource`]: 부모 디렉토리의 파일명을 정규식으로 매칭 (비재귀)
//! - [`GlobSource`]: glob 기준 디렉토리부터 재귀 탐색

pub mod glob;
pub mod regex;

pub use self::glob::GlobSource;
pub use self::regex::RegexSource;

use std::path::PathBuf;

use crate::config::WatchConfig;
use crate::error::TailError;

/// 파일 탐색 소스 trait
///
/// 워치 루프가 매 주기마다 호출합니다. 탐색 중 발생하는 I/O 에러는 로그로
/// 남기고 빈 결과(또는 부분 결과)를 반환해야 하며, 호출자에게 전파하지 않습니다.
pub trait TailSource: Send + Sync + std::fmt::Debug {
    /// 소스 종류 이름 (`"regex"`, `"glob"`)
    fn kind(&self) -> &str;

    /// 설정된 원본 패턴
    fn pattern(&self) -> &str;

    /// 현재 패턴과 일치하는 파일 경로 목록
    fn find_matching_files(&self) -> Vec<PathBuf>;
}

/// 설정된 탐색 소스 집합
#[derive(Debug, Default)]
pub struct SourceSet {
    sources: Vec<Box<dyn TailSource>>,
}

impl SourceSet {
    /// 빈 소스 집합을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 쉼표로 구분된 정규식/glob 패턴 문자열에서 소스 집합을 생성합니다.
    ///
    /// 공백만 있는 항목은 무시합니다. 하나라도 컴파일에 실패하면 에러를 반환합니다.
    pub fn from_patterns(regex: Option<&str>, glob: Option<&str>) -> Result<Self, TailError> {
        let mut set = Self::new();
        for pattern in split_patterns(regex) {
            set.register(Box::new(RegexSource::new(pattern)?));
        }
        for pattern in split_patterns(glob) {
            set.register(Box::new(GlobSource::new(pattern)?));
        }
        Ok(set)
    }

    /// 감시 설정의 패턴으로 소스 집합을 생성합니다.
    pub fn from_config(config: &WatchConfig) -> Result<Self, TailError> {
        Self::from_patterns(config.regex_pattern.as_deref(), config.glob_pattern.as_deref())
    }

    /// 소스를 추가합니다.
    pub fn register(&mut self, source: Box<dyn TailSource>) {
        self.sources.push(source);
    }

    /// 모든 소스의 탐색 결과를 소스 순서대로 이어 붙여 반환합니다.
    ///
    /// 중복 제거는 하지 않습니다. 레지스트리가 경로 키로 중복을 흡수합니다.
    pub fn find_matching_files(&self) -> Vec<PathBuf> {
        self.sources
            .iter()
            .flat_map(|source| source.find_matching_files())
            .collect()
    }

    /// 등록된 소스 수
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// 등록된 소스가 없는지 여부
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// 등록된 소스 패턴 목록 (`kind:pattern`)
    pub fn describe(&self) -> Vec<String> {
        self.sources
            .iter()
            .map(|s| format!("{}:{}", s.kind(), s.pattern()))
            .collect()
    }
}

fn split_patterns(patterns: Option<&str>) -> impl Iterator<Item = &str> {
    patterns
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
}
