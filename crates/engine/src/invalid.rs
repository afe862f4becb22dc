//! 열기 실패 파일 캐시
//!
//! 열기에 실패했거나 리스너가 거부한 경로를 TTL 동안 기억해 매 탐색 주기마다
//! 같은 파일을 다시 시도하지 않도록 합니다. 용량을 넘으면 가장 오래된 항목부터 제거합니다.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// TTL 기반 열기 실패 경로 캐시
#[derive(Debug)]
pub struct InvalidFileCache {
    ttl: Duration,
    capacity: usize,
    /// 경로 → 등록 시각
    entries: HashMap<PathBuf, Instant>,
}

impl InvalidFileCache {
    /// 새 캐시를 생성합니다. `capacity`가 0이면 1로 취급합니다.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            entries: HashMap::new(),
        }
    }

    /// 경로를 현재 시각으로 등록합니다.
    pub fn insert(&mut self, path: impl Into<PathBuf>) {
        self.insert_at(path, Instant::now());
    }

    /// 경로를 주어진 시각으로 등록합니다.
    pub fn insert_at(&mut self, path: impl Into<PathBuf>, now: Instant) {
        let path = path.into();
        self.purge_expired(now);

        if !self.entries.contains_key(&path) && self.entries.len() >= self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, inserted)| **inserted)
                .map(|(p, _)| p.clone());
            if let Some(oldest) = oldest {
                self.entries.remove(&oldest);
            }
        }
        self.entries.insert(path, now);
    }

    /// 경로가 유효한 항목으로 등록되어 있는지 확인합니다.
    pub fn contains(&self, path: &Path) -> bool {
        self.contains_at(path, Instant::now())
    }

    /// 주어진 시각 기준으로 경로가 유효한 항목인지 확인합니다.
    pub fn contains_at(&self, path: &Path, now: Instant) -> bool {
        self.entries
            .get(path)
            .is_some_and(|inserted| now.saturating_duration_since(*inserted) < self.ttl)
    }

    /// 만료된 항목을 제거하고 제거된 수를 반환합니다.
    pub fn purge_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries
            .retain(|_, inserted| now.saturating_duration_since(*inserted) < ttl);
        before - self.entries.len()
    }

    /// 저장된 항목 수 (만료 여부 무관)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 비어 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
