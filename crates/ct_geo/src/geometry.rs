// crates/ct_geo/src/geometry.rs
//! 几何类型定义
//!
//! - [`Point2D`]: 二维点，既用于 (经度, 纬度) 也用于平面 (x, y)
//! - [`GeoBounds`]: 经纬度边界框，由源几何并集得到，提供严格内部判定

use crate::error::{GeoError, GeoResult};
use serde::{Deserialize, Serialize};

// ============================================================================
// Point2D
// ============================================================================

/// 2D点
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    /// X坐标（或经度）
    pub x: f64,
    /// Y坐标（或纬度）
    pub y: f64,
}

impl Point2D {
    /// 创建新点
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// 欧几里得距离（适用于投影坐标）
    #[inline]
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// 是否为有限值
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<Point2D> for (f64, f64) {
    fn from(p: Point2D) -> Self {
        (p.x, p.y)
    }
}

// ============================================================================
// GeoBounds
// ============================================================================

/// 经纬度边界框
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    /// 最小经度
    pub min_lon: f64,
    /// 最小纬度
    pub min_lat: f64,
    /// 最大经度
    pub max_lon: f64,
    /// 最大纬度
    pub max_lat: f64,
}

impl GeoBounds {
    /// 创建新的边界框（自动规整最小/最大值）
    #[must_use]
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon: min_lon.min(max_lon),
            min_lat: min_lat.min(max_lat),
            max_lon: min_lon.max(max_lon),
            max_lat: min_lat.max(max_lat),
        }
    }

    /// 由单个点创建零面积边界框
    #[must_use]
    pub fn from_point(lon: f64, lat: f64) -> Self {
        Self {
            min_lon: lon,
            min_lat: lat,
            max_lon: lon,
            max_lat: lat,
        }
    }

    /// 由点集计算包围盒，点集为空时返回 `None`
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point2D>,
    {
        points.into_iter().fold(None, |acc, p| {
            Some(match acc {
                None => Self::from_point(p.x, p.y),
                Some(b) => b.expand(p.x, p.y),
            })
        })
    }

    /// 扩展以包含一个点
    #[must_use]
    pub fn expand(&self, lon: f64, lat: f64) -> Self {
        Self {
            min_lon: self.min_lon.min(lon),
            min_lat: self.min_lat.min(lat),
            max_lon: self.max_lon.max(lon),
            max_lat: self.max_lat.max(lat),
        }
    }

    /// 合并两个边界框
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min_lon: self.min_lon.min(other.min_lon),
            min_lat: self.min_lat.min(other.min_lat),
            max_lon: self.max_lon.max(other.max_lon),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }

    /// 经度跨度
    #[must_use]
    pub fn lon_span(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// 纬度跨度
    #[must_use]
    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// 严格内部判定：`min < value < max`，边界上的点视为外部
    #[must_use]
    pub fn contains_strict(&self, lon: f64, lat: f64) -> bool {
        self.min_lon < lon && lon < self.max_lon && self.min_lat < lat && lat < self.max_lat
    }

    /// 校验边界框可用于构建接收点网格
    ///
    /// 任一轴跨度为零或出现非有限值都视为退化。
    pub fn validate(&self) -> GeoResult<()> {
        let values = [self.min_lon, self.min_lat, self.max_lon, self.max_lat];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(GeoError::degenerate_bounds(format!(
                "边界框包含非有限值: {self:?}"
            )));
        }
        if self.lon_span() <= 0.0 || self.lat_span() <= 0.0 {
            return Err(GeoError::degenerate_bounds(format!(
                "边界框面积为零: 经度跨度={}, 纬度跨度={}",
                self.lon_span(),
                self.lat_span()
            )));
        }
        Ok(())
    }
}

// ============================================================================
// 测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points_union() {
        let b = GeoBounds::from_points(vec![
            Point2D::new(-84.4, 33.7),
            Point2D::new(-84.2, 33.9),
            Point2D::new(-84.3, 33.6),
        ])
        .unwrap();
        assert_eq!(b.min_lon, -84.4);
        assert_eq!(b.max_lon, -84.2);
        assert_eq!(b.min_lat, 33.6);
        assert_eq!(b.max_lat, 33.9);
    }

    #[test]
    fn test_from_points_empty() {
        assert!(GeoBounds::from_points(Vec::new()).is_none());
    }

    #[test]
    fn test_contains_strict_excludes_edges() {
        let b = GeoBounds::new(-1.0, -1.0, 1.0, 1.0);
        assert!(b.contains_strict(0.0, 0.0));
        assert!(!b.contains_strict(1.0, 0.0));
        assert!(!b.contains_strict(0.0, -1.0));
        assert!(!b.contains_strict(2.0, 0.0));
    }

    #[test]
    fn test_validate_degenerate() {
        assert!(GeoBounds::from_point(1.0, 2.0).validate().is_err());
        assert!(GeoBounds::new(0.0, 0.0, 1.0, f64::NAN).validate().is_err());
        assert!(GeoBounds::new(0.0, 0.0, 1.0, 1.0).validate().is_ok());
    }

    #[test]
    fn test_merge() {
        let a = GeoBounds::new(0.0, 0.0, 1.0, 1.0);
        let b = GeoBounds::new(0.5, -1.0, 2.0, 0.5);
        let m = a.merge(&b);
        assert_eq!(m, GeoBounds::new(0.0, -1.0, 2.0, 1.0));
    }
}
