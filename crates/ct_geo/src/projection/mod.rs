//! 投影转换模块
//!
//! 求解器在平面等距坐标系中进行距离与几何计算。本模块提供：
//!
//! - [`MapProjection`]: 统一投影接口
//! - [`LambertConformalConic`]: 双标准纬线兰伯特等角圆锥投影
//! - [`CoordinateProjector`]: 流水线使用的固定坐标转换器
//!
//! # 示例
//!
//! ```
//! use ct_geo::projection::CoordinateProjector;
//!
//! let projector = CoordinateProjector::new();
//! let (x, y) = projector.forward(-84.39, 33.75).unwrap();
//! let (lon, lat) = projector.inverse(x, y).unwrap();
//! assert!((lon + 84.39).abs() < 1e-9);
//! assert!((lat - 33.75).abs() < 1e-9);
//! ```

pub mod lambert_conformal;
pub mod math_utils;
pub mod traits;

pub use lambert_conformal::{LambertConformalConic, LccParams};
pub use traits::MapProjection;

use crate::geometry::Point2D;
use ct_foundation::error::CtResult;

/// 坐标转换器
///
/// 地理坐标 (经度, 纬度) 与求解器平面坐标 (x, y) 之间的双向转换。
/// 投影参数是静态配置，不随调用变化。越界输入返回致命的投影错误。
#[derive(Debug, Clone)]
pub struct CoordinateProjector {
    projection: LambertConformalConic,
}

impl CoordinateProjector {
    /// 使用求解器平面坐标系创建
    #[must_use]
    pub fn new() -> Self {
        Self {
            projection: LambertConformalConic::ctools(),
        }
    }

    /// 使用自定义兰伯特参数创建
    pub fn with_params(params: LccParams) -> CtResult<Self> {
        Ok(Self {
            projection: LambertConformalConic::new(params)?,
        })
    }

    /// 底层投影
    #[must_use]
    pub fn projection(&self) -> &LambertConformalConic {
        &self.projection
    }

    /// 地理坐标 -> 平面坐标
    #[inline]
    pub fn forward(&self, lon: f64, lat: f64) -> CtResult<(f64, f64)> {
        Ok(self.projection.project(lon, lat)?)
    }

    /// 平面坐标 -> 地理坐标
    #[inline]
    pub fn inverse(&self, x: f64, y: f64) -> CtResult<(f64, f64)> {
        Ok(self.projection.unproject(x, y)?)
    }

    /// 点版本的正向投影
    pub fn forward_point(&self, geo: Point2D) -> CtResult<Point2D> {
        self.forward(geo.x, geo.y).map(Point2D::from)
    }

    /// 点版本的逆向投影
    pub fn inverse_point(&self, planar: Point2D) -> CtResult<Point2D> {
        self.inverse(planar.x, planar.y).map(Point2D::from)
    }
}

impl Default for CoordinateProjector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ct_foundation::CtError;

    #[test]
    fn test_projection_failure_is_fatal_projection_error() {
        let projector = CoordinateProjector::new();
        let err = projector.forward(-97.0, 91.0).unwrap_err();
        assert!(matches!(err, CtError::Projection(_)));
    }

    #[test]
    fn test_point_roundtrip() {
        let projector = CoordinateProjector::default();
        let geo = Point2D::new(-122.42, 37.77);
        let planar = projector.forward_point(geo).unwrap();
        let back = projector.inverse_point(planar).unwrap();
        assert!(geo.distance_to(&back) < 1e-9);
    }

    #[test]
    fn test_trait_object_dispatch() {
        let projector = CoordinateProjector::new();
        let proj: &dyn MapProjection = projector.projection();
        assert_eq!(proj.central_meridian(), Some(-97.0));
        let pts = proj.forward_batch(&[(-97.0, 40.0), (-90.0, 35.0)]).unwrap();
        assert_eq!(pts.len(), 2);
    }
}
