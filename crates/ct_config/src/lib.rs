// crates/ct_config/src/lib.rs

//! CTools Config Layer
//!
//! 配置层，提供运行配置、污染物定义、模型变体与浓度截断范围。
//!
//! # 模块概览
//!
//! - [`run_config`]: RunConfig 运行配置（JSON 加载与校验）
//! - [`pollutant`]: Pollutant 污染物及其单位
//! - [`model`]: ModelVariant / SolverMode / ComparisonMode 及图例标题
//! - [`bounds`]: ClampBounds 浓度截断范围
//! - [`error`]: 配置错误类型
//!
//! # 层级架构
//!
//! ```text
//! ct_workflow  ─> RunConfig, RunParameters
//! ct_raster    ─> ClampBounds, legend_title
//! ct_config    ─> 本层
//! ct_foundation
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bounds;
pub mod error;
pub mod model;
pub mod pollutant;
pub mod run_config;

// 重导出核心类型
pub use bounds::ClampBounds;
pub use error::ConfigError;
pub use model::{legend_title, ComparisonMode, ModelVariant, RunParameters, SolverMode};
pub use pollutant::{Pollutant, Units};
pub use run_config::RunConfig;
