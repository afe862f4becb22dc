//! 감시 매니저: 파일 탐색과 읽기의 전체 흐름을 관리합니다.
//!
//! # 내부 아키텍처
//! ```text
//!             +-- watch task (watch_interval) --+
//! SourceSet --+  discover -> open / retire       +--> Registry (Mutex)
//!             +-- read task (read_interval) ----+      |
//!                  read_lines -> on_read               +--> Listener
//! ```
//!
//! 두 태스크는 같은 잠금 아래에서 레지스트리를 다루므로 한 테일러에 대한
//! 읽기와 닫기가 동시에 일어나지 않고, 리스너 콜백도 직렬화됩니다.
//! 파일 I/O는 `spawn_blocking`에서 수행합니다.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};

use metrics::{counter, gauge};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use tailwatch_core::metrics as m;

use crate::config::WatchConfig;
use crate::error::TailError;
use crate::invalid::InvalidFileCache;
use crate::listener::{Listener, ListenerError};
use crate::source::SourceSet;
use crate::tailer::{Tailer, TailerOptions};

/// 추적 중인 테일러와 열기 실패 캐시
struct Registry {
    tailers: HashMap<PathBuf, Tailer>,
    invalid: InvalidFileCache,
    /// 종료 드레인 완료 여부. 이후 워치 주기는 아무것도 열지 않습니다.
    drained: bool,
}

/// 테일러 퇴역 사유
#[derive(Debug, Clone, Copy)]
enum Retire {
    Idle,
    Rotated,
}

struct Shared {
    config: WatchConfig,
    tailer_options: TailerOptions,
    sources: SourceSet,
    listener: Arc<dyn Listener>,
    registry: Mutex<Registry>,
    shutdown: CancellationToken,
}

/// 파일 감시 매니저
///
/// [`start`](Self::start)로 워치 태스크와 읽기 태스크를 시작하고,
/// [`close`](Self::close)로 두 태스크를 멈춘 뒤 남은 테일러를 모두 닫습니다.
///
/// # 사용 예시
/// ```ignore
/// use std::sync::Arc;
/// use tailwatch_engine::{WatchConfigBuilder, WatchManager};
///
/// let config = WatchConfigBuilder::new()
///     .glob_pattern("/var/log/app/**/gc*.log")
///     .build()?;
/// let manager = WatchManager::start(config, Arc::new(MyListener))?;
/// // ...
/// manager.close().await;
/// ```
pub struct WatchManager {
    shared: Arc<Shared>,
    closed: AtomicBool,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl WatchManager {
    /// 설정을 검증하고 워치/읽기 태스크를 시작합니다.
    ///
    /// 첫 탐색은 즉시 실행됩니다. tokio 런타임 안에서 호출해야 합니다.
    ///
    /// # Errors
    ///
    /// 설정이 유효하지 않거나 패턴 컴파일에 실패하면 에러를 반환합니다.
    pub fn start(config: WatchConfig, listener: Arc<dyn Listener>) -> Result<Self, TailError> {
        config.validate()?;
        let sources = SourceSet::from_config(&config)?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| TailError::Config {
            field: "runtime".to_owned(),
            reason: e.to_string(),
        })?;

        info!(
            sources = ?sources.describe(),
            watch_interval_ms = config.watch_interval.as_millis() as u64,
            read_interval_ms = config.read_interval.as_millis() as u64,
            idle_timeout_ms = config.idle_timeout.as_millis() as u64,
            handle_mode = %config.handle_mode,
            "starting watch manager"
        );

        let shared = Arc::new(Shared {
            tailer_options: TailerOptions::from_config(&config),
            registry: Mutex::new(Registry {
                tailers: HashMap::new(),
                invalid: InvalidFileCache::new(
                    config.invalid_file_ttl,
                    config.invalid_file_capacity,
                ),
                drained: false,
            }),
            config,
            sources,
            listener,
            shutdown: CancellationToken::new(),
        });

        let tasks = vec![
            runtime.spawn(watch_loop(Arc::clone(&shared))),
            runtime.spawn(read_loop(Arc::clone(&shared))),
        ];

        Ok(Self {
            shared,
            closed: AtomicBool::new(false),
            tasks: Mutex::new(tasks),
        })
    }

    /// 두 태스크를 멈추고 남은 테일러를 모두 닫습니다 (각각 `on_close` 호출).
    ///
    /// 두 번째 호출부터는 아무것도 하지 않습니다.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            info!("watch manager already closed");
            return;
        }

        info!("closing watch manager");
        self.shared.shutdown.cancel();

        let tasks = std::mem::take(&mut *lock(&self.tasks));
        for task in tasks {
            if let Err(e) = task.await {
                error!(error = %e, "watch manager task failed");
            }
        }
        info!("watch manager closed");
    }

    /// 현재 테일링 중인 파일 경로 목록
    pub fn tailed_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = lock(&self.shared.registry)
            .tailers
            .keys()
            .cloned()
            .collect();
        files.sort();
        files
    }

    /// `close`가 호출되었는지 여부
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// 현재 상태 이름
    pub fn state_name(&self) -> &str {
        if self.is_closed() { "closed" } else { "running" }
    }
}

impl Drop for WatchManager {
    fn drop(&mut self) {
        // close 없이 버려져도 태스크는 멈추고 드레인됩니다.
        self.shared.shutdown.cancel();
    }
}

impl std::fmt::Debug for WatchManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchManager")
            .field("sources", &self.shared.sources)
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn watch_loop(shared: Arc<Shared>) {
    let mut ticker = tokio::time::interval(shared.config.watch_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shared.shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let cycle = Arc::clone(&shared);
        if let Err(e) = tokio::task::spawn_blocking(move || cycle.watch_cycle()).await {
            error!(error = %e, "watch cycle panicked");
        }
    }
    debug!("watch loop stopped");
}

async fn read_loop(shared: Arc<Shared>) {
    let read_interval = shared.config.read_interval;

    while !shared.shutdown.is_cancelled() {
        let pass = Arc::clone(&shared);
        let produced = match tokio::task::spawn_blocking(move || pass.read_pass()).await {
            Ok(produced) => produced,
            Err(e) => {
                error!(error = %e, "read pass panicked");
                0
            }
        };

        if produced == 0 {
            tokio::select! {
                _ = shared.shutdown.cancelled() => break,
                _ = tokio::time::sleep(read_interval) => {}
            }
        }
    }

    let drain = Arc::clone(&shared);
    if let Err(e) = tokio::task::spawn_blocking(move || drain.drain()).await {
        error!(error = %e, "drain panicked");
    }
    debug!("read loop stopped");
}

impl Shared {
    /// 한 번의 탐색 주기: 새 파일 열기, 유휴/교체된 파일 퇴역
    fn watch_cycle(&self) {
        let candidates = self.sources.find_matching_files();
        let now = SystemTime::now();

        let mut registry = lock(&self.registry);
        if registry.drained || self.shutdown.is_cancelled() {
            return;
        }

        for path in candidates {
            if registry.tailers.contains_key(&path) || registry.invalid.contains(&path) {
                continue;
            }
            if self.path_is_idle(&path, now) {
                trace!(path = %path.display(), "skipping idle file");
                continue;
            }
            self.open_tailer(&mut registry, path);
        }

        self.retire_tailers(&mut registry, now);
        gauge!(m::TAILED_FILES).set(registry.tailers.len() as f64);
    }

    fn path_is_idle(&self, path: &Path, now: SystemTime) -> bool {
        match std::fs::metadata(path).and_then(|meta| meta.modified()) {
            Ok(modified) => is_idle(modified, now, self.config.idle_timeout),
            Err(_) => false,
        }
    }

    fn open_tailer(&self, registry: &mut Registry, path: PathBuf) {
        let tailer = match Tailer::open(&path, &self.tailer_options) {
            Ok(tailer) => tailer,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to open file, caching as invalid");
                counter!(m::OPEN_FAILURES_TOTAL).increment(1);
                registry.invalid.insert(path);
                return;
            }
        };

        match self.listener.on_open(&path) {
            Ok(()) => {
                info!(path = %path.display(), file_id = %tailer.file_id(), "tailing file");
                counter!(m::FILES_OPENED_TOTAL).increment(1);
                registry.tailers.insert(path, tailer);
            }
            Err(ListenerError::Unsupported(reason)) => {
                warn!(path = %path.display(), reason, "listener does not support file, skipping");
                tailer.close();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "listener rejected file, caching as invalid");
                counter!(m::OPEN_FAILURES_TOTAL).increment(1);
                tailer.close();
                registry.invalid.insert(path);
            }
        }
    }

    fn retire_tailers(&self, registry: &mut Registry, now: SystemTime) {
        let idle_timeout = self.config.idle_timeout;
        let mut retired = Vec::new();

        for (path, tailer) in registry.tailers.iter_mut() {
            let idle = is_idle(tailer.last_modified(), now, idle_timeout);
            if idle && tailer.is_drained() {
                retired.push((path.clone(), Retire::Idle));
            } else if tailer.rotated() {
                retired.push((path.clone(), Retire::Rotated));
            }
        }

        for (path, reason) in retired {
            let Some(tailer) = registry.tailers.remove(&path) else {
                continue;
            };
            tailer.close();
            match reason {
                Retire::Idle => {
                    info!(path = %path.display(), "closing idle file");
                    counter!(m::FILES_CLOSED_TOTAL).increment(1);
                    self.notify(&path, "on_close", |l, p| l.on_close(p));
                }
                Retire::Rotated => {
                    counter!(m::FILES_ROTATED_TOTAL).increment(1);
                    self.notify(&path, "on_rotate", |l, p| l.on_rotate(p));
                }
            }
        }
    }

    /// 모든 테일러에서 한 배치씩 읽어 리스너에 전달하고 읽은 라인 수를 반환합니다.
    fn read_pass(&self) -> usize {
        let mut registry = lock(&self.registry);
        if registry.drained {
            return 0;
        }

        let mut produced = 0;
        for (path, tailer) in registry.tailers.iter_mut() {
            let lines = match tailer.read_lines() {
                Ok(lines) => lines,
                Err(e) => {
                    error!(path = %path.display(), error = %e, "failed to read file");
                    counter!(m::READ_ERRORS_TOTAL).increment(1);
                    continue;
                }
            };
            if lines.is_empty() {
                continue;
            }

            for line in &lines {
                if let Err(e) = self.listener.on_read(path, line) {
                    warn!(path = %path.display(), error = %e, "listener failed to handle line");
                }
            }
            counter!(m::LINES_READ_TOTAL).increment(lines.len() as u64);
            produced += lines.len();
        }

        if produced > 0 {
            trace!(lines = produced, "read pass");
        }
        produced
    }

    /// 남은 테일러를 모두 닫고 `on_close`를 호출합니다.
    fn drain(&self) {
        let mut registry = lock(&self.registry);
        registry.drained = true;

        let count = registry.tailers.len();
        for (path, tailer) in registry.tailers.drain() {
            tailer.close();
            counter!(m::FILES_CLOSED_TOTAL).increment(1);
            self.notify(&path, "on_close", |l, p| l.on_close(p));
        }
        gauge!(m::TAILED_FILES).set(0.0);
        info!(closed = count, "closed all tailed files");
    }

    fn notify(
        &self,
        path: &Path,
        event: &str,
        callback: impl FnOnce(&dyn Listener, &Path) -> Result<(), ListenerError>,
    ) {
        if let Err(e) = callback(self.listener.as_ref(), path) {
            warn!(path = %path.display(), event, error = %e, "listener callback failed");
        }
    }
}

/// 수정 시각 이후 `idle_timeout`보다 오래 지났는지 여부
fn is_idle(modified: SystemTime, now: SystemTime, idle_timeout: Duration) -> bool {
    now.duration_since(modified)
        .is_ok_and(|elapsed| elapsed > idle_timeout)
}
