// crates/ct_workflow/src/events.rs

//! 事件系统模块
//!
//! 运行过程中的里程碑事件及其分发。

use std::path::PathBuf;
use std::sync::Arc;

use ct_sources::SourceCategory;
use parking_lot::RwLock;

use crate::run::RunId;

/// 运行事件
#[derive(Debug, Clone)]
pub enum RunEvent {
    /// 运行开始
    Started {
        /// 运行ID
        run_id: RunId,
        /// 运行名称
        name: String,
    },
    /// 全部输入表已写出
    InputsWritten {
        /// 运行ID
        run_id: RunId,
        /// 输出目录
        directory: PathBuf,
        /// 接收点数
        receptors: usize,
        /// 包含的类别
        categories: Vec<SourceCategory>,
    },
    /// 求解器进程已启动
    SolverLaunched {
        /// 运行ID
        run_id: RunId,
        /// 类别
        category: SourceCategory,
    },
    /// 求解器进程已退出
    SolverExited {
        /// 运行ID
        run_id: RunId,
        /// 类别
        category: SourceCategory,
        /// 退出码（被信号终止时为空）
        exit_code: Option<i32>,
    },
    /// 各类别输出已合并
    Merged {
        /// 运行ID
        run_id: RunId,
        /// 合并后的接收点数
        entries: usize,
    },
    /// 图像已生成
    Rendered {
        /// 运行ID
        run_id: RunId,
        /// 图像路径
        image: PathBuf,
    },
    /// 运行完成
    Completed {
        /// 运行ID
        run_id: RunId,
        /// 归档路径
        archive: PathBuf,
        /// 运行时长 (秒)
        duration_secs: f64,
    },
    /// 运行失败
    Failed {
        /// 运行ID
        run_id: RunId,
        /// 错误信息
        error: String,
    },
    /// 运行被终止
    Terminated {
        /// 运行ID
        run_id: RunId,
    },
}

impl RunEvent {
    /// 事件对应的运行ID
    pub fn run_id(&self) -> RunId {
        match self {
            Self::Started { run_id, .. }
            | Self::InputsWritten { run_id, .. }
            | Self::SolverLaunched { run_id, .. }
            | Self::SolverExited { run_id, .. }
            | Self::Merged { run_id, .. }
            | Self::Rendered { run_id, .. }
            | Self::Completed { run_id, .. }
            | Self::Failed { run_id, .. }
            | Self::Terminated { run_id } => *run_id,
        }
    }

    /// 事件名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::Started { .. } => "Started",
            Self::InputsWritten { .. } => "InputsWritten",
            Self::SolverLaunched { .. } => "SolverLaunched",
            Self::SolverExited { .. } => "SolverExited",
            Self::Merged { .. } => "Merged",
            Self::Rendered { .. } => "Rendered",
            Self::Completed { .. } => "Completed",
            Self::Failed { .. } => "Failed",
            Self::Terminated { .. } => "Terminated",
        }
    }
}

/// 事件监听器trait
pub trait EventListener: Send + Sync {
    /// 处理事件
    fn on_event(&self, event: &RunEvent);

    /// 监听器名称
    fn name(&self) -> &str {
        "anonymous"
    }
}

/// 函数式事件监听器
pub struct FnListener<F>
where
    F: Fn(&RunEvent) + Send + Sync,
{
    name: String,
    handler: F,
}

impl<F> FnListener<F>
where
    F: Fn(&RunEvent) + Send + Sync,
{
    /// 创建函数式监听器
    pub fn new(name: impl Into<String>, handler: F) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }
}

impl<F> EventListener for FnListener<F>
where
    F: Fn(&RunEvent) + Send + Sync,
{
    fn on_event(&self, event: &RunEvent) {
        (self.handler)(event);
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// 日志事件监听器
pub struct LoggingListener {
    prefix: String,
    verbose: bool,
}

impl LoggingListener {
    /// 创建日志监听器
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            verbose: false,
        }
    }

    /// 同时输出进程级事件
    #[must_use]
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }
}

impl EventListener for LoggingListener {
    fn on_event(&self, event: &RunEvent) {
        let msg = match event {
            RunEvent::Started { run_id, name } => format!("运行 '{name}' ({run_id}) 开始"),
            RunEvent::Completed {
                run_id,
                archive,
                duration_secs,
            } => format!(
                "运行 {run_id} 完成，用时 {duration_secs:.1}s，归档 {}",
                archive.display()
            ),
            RunEvent::Failed { run_id, error } => format!("运行 {run_id} 失败: {error}"),
            RunEvent::Terminated { run_id } => format!("运行 {run_id} 已终止"),
            RunEvent::SolverExited {
                run_id,
                category,
                exit_code,
            } if self.verbose => format!("运行 {run_id}: {category} 求解器退出 ({exit_code:?})"),
            _ if self.verbose => format!("{event:?}"),
            _ => return,
        };

        tracing::info!("{}: {}", self.prefix, msg);
    }

    fn name(&self) -> &str {
        "LoggingListener"
    }
}

/// 事件分发器
#[derive(Default)]
pub struct EventDispatcher {
    listeners: RwLock<Vec<Arc<dyn EventListener>>>,
}

impl EventDispatcher {
    /// 创建新的事件分发器
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加监听器
    pub fn add_listener(&self, listener: Arc<dyn EventListener>) {
        let name = listener.name().to_string();
        self.listeners.write().push(listener);
        tracing::debug!("添加事件监听器: {}", name);
    }

    /// 添加函数式监听器
    pub fn add_fn_listener<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(&RunEvent) + Send + Sync + 'static,
    {
        self.add_listener(Arc::new(FnListener::new(name, handler)));
    }

    /// 清除所有监听器
    pub fn clear(&self) {
        self.listeners.write().clear();
    }

    /// 分发事件
    pub fn emit(&self, event: RunEvent) {
        let listeners = self.listeners.read();
        tracing::trace!("分发事件: {}", event.name());
        for listener in listeners.iter() {
            listener.on_event(&event);
        }
    }

    /// 监听器数量
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_event_dispatcher() {
        let dispatcher = EventDispatcher::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        dispatcher.add_fn_listener("count", move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });
        dispatcher.add_listener(Arc::new(LoggingListener::new("test").verbose()));
        assert_eq!(dispatcher.listener_count(), 2);

        let run_id = RunId::new();
        dispatcher.emit(RunEvent::SolverLaunched {
            run_id,
            category: SourceCategory::Road,
        });
        dispatcher.emit(RunEvent::Terminated { run_id });
        assert_eq!(counter.load(Ordering::SeqCst), 2);

        dispatcher.clear();
        assert_eq!(dispatcher.listener_count(), 0);
    }

    #[test]
    fn test_event_run_id() {
        let run_id = RunId::new();
        let event = RunEvent::SolverExited {
            run_id,
            category: SourceCategory::Vessel,
            exit_code: Some(1),
        };
        assert_eq!(event.run_id(), run_id);
        assert_eq!(event.name(), "SolverExited");
    }
}
