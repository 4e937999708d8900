// crates/ct_geo/src/lib.rs
//! CTools 地理空间处理模块
//!
//! 提供求解器所需的平面坐标系（兰伯特等角圆锥投影）以及地理边界框。
//!
//! # 模块
//!
//! - `ellipsoid`: 参考椭球体 (GRS80, WGS84)
//! - `geometry`: 几何类型 (Point2D, GeoBounds)
//! - `projection`: 投影转换与 [`CoordinateProjector`]
//!
//! # 示例
//!
//! ```
//! use ct_geo::prelude::*;
//!
//! let projector = CoordinateProjector::new();
//! let (x, y) = projector.forward(-97.0, 40.0).unwrap();
//! assert!(x.abs() < 1e-6 && y.abs() < 1e-6);
//!
//! let (lon, lat) = projector.inverse(x, y).unwrap();
//! assert!((lon + 97.0).abs() < 1e-9 && (lat - 40.0).abs() < 1e-9);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod ellipsoid;
pub mod error;
pub mod geometry;
pub mod projection;

/// 预导入模块
pub mod prelude {
    pub use crate::ellipsoid::Ellipsoid;
    pub use crate::geometry::{GeoBounds, Point2D};
    pub use crate::projection::{
        CoordinateProjector, LambertConformalConic, LccParams, MapProjection,
    };
}

// 重导出常用类型
pub use ellipsoid::Ellipsoid;
pub use error::{GeoError, GeoResult};
pub use geometry::{GeoBounds, Point2D};
pub use projection::{CoordinateProjector, LambertConformalConic, LccParams, MapProjection};
