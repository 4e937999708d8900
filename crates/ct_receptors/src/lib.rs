// crates/ct_receptors/src/lib.rs

//! CTools 接收点模块
//!
//! 生成求解器评估浓度的非均匀采样点集：
//!
//! - 覆盖场景边界框的均匀背景格网（单元中心）
//! - 沿每条道路直线段的五条平行采样线
//!
//! 所有接收点共享一个运行内单调递增的编号计数器。
//!
//! # 示例
//!
//! ```
//! use ct_geo::GeoBounds;
//! use ct_receptors::ReceptorGridBuilder;
//!
//! let bounds = GeoBounds::new(-84.5, 33.6, -84.2, 33.9);
//! let set = ReceptorGridBuilder::new().build(&bounds, &[]).unwrap();
//! assert_eq!(set.len(), 2500);
//! assert_eq!(set.receptors()[0].id, 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod receptor;

pub use builder::{road_sample_count, ReceptorGridBuilder};
pub use receptor::{IdCounter, Receptor, ReceptorSet};

/// 预导入模块
pub mod prelude {
    pub use crate::builder::{road_sample_count, ReceptorGridBuilder};
    pub use crate::receptor::{IdCounter, Receptor, ReceptorSet};
}
