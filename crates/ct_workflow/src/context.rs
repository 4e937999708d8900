// crates/ct_workflow/src/context.rs

//! 运行上下文
//!
//! 取消是协作式的：监督循环每个轮询周期调用一次 [`RunContext::check_terminated`]，
//! 它先看取消令牌，再询问状态探针（通常是运行记录中的状态字段）。
//! 探针报告终止后令牌随之置位，之后不再询问探针。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ct_foundation::error::CtResult;
use tracing::warn;

use crate::events::{EventDispatcher, RunEvent};
use crate::run::{RunId, RunStatus};
use crate::storage::Storage;

/// 取消令牌
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// 创建未取消的令牌
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求取消
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// 是否已取消
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// 外部终止请求的探针
pub trait StatusProbe: Send + Sync {
    /// 外部是否请求终止
    fn is_terminated(&self) -> CtResult<bool>;
}

/// 读取存储中运行状态的探针
pub struct StorageStatusProbe {
    storage: Arc<dyn Storage>,
    run_id: RunId,
}

impl StorageStatusProbe {
    /// 创建探针
    pub fn new(storage: Arc<dyn Storage>, run_id: RunId) -> Self {
        Self { storage, run_id }
    }
}

impl StatusProbe for StorageStatusProbe {
    fn is_terminated(&self) -> CtResult<bool> {
        Ok(self.storage.status(self.run_id)? == RunStatus::Terminated)
    }
}

/// 运行上下文
pub struct RunContext {
    run_id: RunId,
    token: CancellationToken,
    probe: Option<Arc<dyn StatusProbe>>,
    events: Arc<EventDispatcher>,
    poll_interval: Duration,
}

impl RunContext {
    /// 默认轮询间隔
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

    /// 创建运行上下文
    pub fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            token: CancellationToken::new(),
            probe: None,
            events: Arc::new(EventDispatcher::new()),
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
        }
    }

    /// 设置状态探针
    #[must_use]
    pub fn with_probe(mut self, probe: Arc<dyn StatusProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// 设置取消令牌
    #[must_use]
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// 设置事件分发器
    #[must_use]
    pub fn with_events(mut self, events: Arc<EventDispatcher>) -> Self {
        self.events = events;
        self
    }

    /// 设置轮询间隔
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// 运行ID
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// 取消令牌
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// 轮询间隔
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// 分发事件
    pub fn emit(&self, event: RunEvent) {
        self.events.emit(event);
    }

    /// 是否已请求终止
    ///
    /// 探针出错只记录警告，不视为终止。
    pub fn check_terminated(&self) -> bool {
        if self.token.is_cancelled() {
            return true;
        }
        let Some(probe) = &self.probe else {
            return false;
        };
        match probe.is_terminated() {
            Ok(true) => {
                self.token.cancel();
                true
            }
            Ok(false) => false,
            Err(e) => {
                warn!("运行 {} 状态查询失败: {}", self.run_id, e);
                false
            }
        }
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("run_id", &self.run_id)
            .field("cancelled", &self.token.is_cancelled())
            .field("has_probe", &self.probe.is_some())
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::ScenarioRun;
    use crate::storage::MemoryStorage;
    use ct_config::{ModelVariant, Pollutant, RunParameters};
    use ct_geo::GeoBounds;
    use std::sync::atomic::AtomicUsize;

    struct CountingProbe {
        calls: AtomicUsize,
        terminate_after: usize,
    }

    impl StatusProbe for CountingProbe {
        fn is_terminated(&self) -> CtResult<bool> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(n >= self.terminate_after)
        }
    }

    #[test]
    fn test_token_shared_between_clones() {
        let token = CancellationToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn test_probe_sets_token_once() {
        let probe = Arc::new(CountingProbe {
            calls: AtomicUsize::new(0),
            terminate_after: 2,
        });
        let ctx = RunContext::new(RunId::new()).with_probe(probe.clone());

        assert!(!ctx.check_terminated());
        assert!(ctx.check_terminated());
        assert!(ctx.token().is_cancelled());
        assert!(ctx.check_terminated());
        assert_eq!(probe.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_storage_probe() {
        let storage = Arc::new(MemoryStorage::new());
        let run = ScenarioRun::single(
            "s",
            "s",
            RunParameters::new(Pollutant::Nox, ModelVariant::Hourly),
            GeoBounds::new(-84.5, 33.7, -84.3, 33.8),
            "out".into(),
        );
        storage.save_run(&run).unwrap();

        let ctx = RunContext::new(run.id)
            .with_probe(Arc::new(StorageStatusProbe::new(storage.clone(), run.id)));
        assert!(!ctx.check_terminated());

        storage.set_status(run.id, RunStatus::Terminated).unwrap();
        assert!(ctx.check_terminated());
    }

    #[test]
    fn test_probe_error_is_not_termination() {
        let storage = Arc::new(MemoryStorage::new());
        let ctx = RunContext::new(RunId::new())
            .with_probe(Arc::new(StorageStatusProbe::new(storage, RunId::new())));
        assert!(!ctx.check_terminated());
    }
}
