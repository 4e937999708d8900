// crates/ct_workflow/src/lib.rs

//! CTools 运行工作流
//!
//! 驱动一次浓度计算的完整流程：写出输入表、启动并监督各类别求解器进程、
//! 合并输出、栅格合成与归档，同时维护运行记录与事件。
//!
//! # 模块结构
//!
//! - [`run`]: 运行记录与状态
//! - [`storage`]: 运行记录的持久化存储
//! - [`events`]: 运行事件与分发
//! - [`context`]: 取消令牌与运行上下文
//! - [`process`]: 求解器进程后端
//! - `fake`: 模拟求解器后端（`testing` 特性）
//! - [`field`]: 浓度场读取与合并
//! - [`inputs`]: 运行参数文件
//! - [`runner`]: 模型运行器
//! - [`archive`]: 结果归档
//! - [`pipeline`]: 单场景与比较运行
//!
//! # 示例
//!
//! ```
//! use ct_workflow::field::ConcentrationField;
//!
//! let a = ConcentrationField::from_pairs([(1, 1.0), (2, 2.0)]);
//! let b = ConcentrationField::from_pairs([(2, 3.0), (3, 4.0)]);
//! let merged = ConcentrationField::merge([a, b]);
//! assert_eq!(merged.get(1), Some(1.0));
//! assert_eq!(merged.get(2), Some(5.0));
//! assert_eq!(merged.get(3), Some(4.0));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod archive;
pub mod context;
pub mod events;
#[cfg(any(test, feature = "testing"))]
pub mod fake;
pub mod field;
pub mod inputs;
pub mod pipeline;
pub mod process;
pub mod run;
pub mod runner;
pub mod storage;

// 重导出核心类型
pub use archive::{archive_comparison, archive_directory, ArchiveWriter, ScenarioOutput};
pub use context::{CancellationToken, RunContext, StatusProbe, StorageStatusProbe};
pub use events::{EventDispatcher, EventListener, FnListener, LoggingListener, RunEvent};
pub use field::ConcentrationField;
pub use inputs::InputsFile;
pub use pipeline::{Pipeline, RunSummary};
pub use process::{LaunchSpec, OsProcessBackend, ProcessBackend, ProcessState};
#[cfg(any(test, feature = "testing"))]
pub use fake::FakeBackend;
pub use run::{RunId, RunKind, RunStatus, ScenarioRun};
pub use runner::{CategoryJob, ModelRunReport, ModelRunner, SolverOutcome};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};

/// 接收点表文件名
pub const RECEPTOR_FILE_NAME: &str = "receptors.csv";

/// 运行参数文件名
pub const INPUTS_FILE_NAME: &str = "CTOOLS_Inputs.txt";

/// 比较运行结果表文件名
pub const RESULTS_FILE_NAME: &str = "results.csv";

/// 预导入模块
pub mod prelude {
    pub use crate::context::{CancellationToken, RunContext};
    pub use crate::events::{EventDispatcher, EventListener, RunEvent};
    pub use crate::field::ConcentrationField;
    pub use crate::pipeline::{Pipeline, RunSummary};
    pub use crate::process::{OsProcessBackend, ProcessBackend, ProcessState};
    #[cfg(any(test, feature = "testing"))]
    pub use crate::fake::FakeBackend;
    pub use crate::run::{RunId, RunKind, RunStatus, ScenarioRun};
    pub use crate::runner::{ModelRunner, SolverOutcome};
    pub use crate::storage::{FileStorage, MemoryStorage, Storage};
}
