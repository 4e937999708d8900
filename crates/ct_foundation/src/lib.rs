// crates/ct_foundation/src/lib.rs

//! CTools Foundation Layer
//!
//! 基础层，提供整个项目共享的错误类型与日志初始化。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型 `CtError` / `CtResult`
//! - [`logging`]: 基于 `tracing-subscriber` 的日志初始化
//!
//! # 示例
//!
//! ```
//! use ct_foundation::error::{CtError, CtResult};
//!
//! fn check_cells(n: usize) -> CtResult<usize> {
//!     ct_foundation::ensure!(n > 0, CtError::invalid_input("网格数必须为正"));
//!     Ok(n)
//! }
//!
//! assert!(check_cells(0).is_err());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod logging;

// 重导出常用类型
pub use error::{CtError, CtResult};
pub use logging::init_logging;

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::error::{CtError, CtResult};
    pub use crate::{ensure, require};
}
