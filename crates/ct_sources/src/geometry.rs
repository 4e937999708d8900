// crates/ct_sources/src/geometry.rs

//! 排放源几何
//!
//! 几何在反序列化时即完成校验：线至少两个有限顶点，面源边界为闭合环。
//! 坐标均为 (经度, 纬度)。

use serde::{Deserialize, Serialize};
use thiserror::Error;

use ct_foundation::error::CtError;
use ct_geo::GeoBounds;

/// 几何校验错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// 折线顶点不足
    #[error("折线至少需要 2 个顶点，实际 {0}")]
    TooFewLineVertices(usize),

    /// 闭合环顶点不足
    #[error("闭合环至少需要 4 个顶点，实际 {0}")]
    TooFewRingVertices(usize),

    /// 环首尾不同
    #[error("环未闭合")]
    RingNotClosed,

    /// 顶点坐标不是有限值
    #[error("第 {0} 个顶点不是有限值")]
    NonFiniteVertex(usize),
}

impl From<GeometryError> for CtError {
    fn from(err: GeometryError) -> Self {
        CtError::invalid_input(format!("无效几何: {err}"))
    }
}

fn check_finite(points: &[(f64, f64)]) -> Result<(), GeometryError> {
    match points
        .iter()
        .position(|(lon, lat)| !(lon.is_finite() && lat.is_finite()))
    {
        Some(i) => Err(GeometryError::NonFiniteVertex(i)),
        None => Ok(()),
    }
}

// ============================================================
// LineString
// ============================================================

/// 折线（道路、铁路、航线）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<(f64, f64)>", into = "Vec<(f64, f64)>")]
pub struct LineString {
    points: Vec<(f64, f64)>,
}

impl LineString {
    /// 创建折线，至少两个顶点
    pub fn new(points: Vec<(f64, f64)>) -> Result<Self, GeometryError> {
        if points.len() < 2 {
            return Err(GeometryError::TooFewLineVertices(points.len()));
        }
        check_finite(&points)?;
        Ok(Self { points })
    }

    /// 顶点
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// 首顶点
    pub fn start(&self) -> (f64, f64) {
        self.points[0]
    }

    /// 末顶点
    pub fn end(&self) -> (f64, f64) {
        self.points[self.points.len() - 1]
    }

    /// 相邻顶点对
    pub fn segments(&self) -> impl Iterator<Item = ((f64, f64), (f64, f64))> + '_ {
        self.points.windows(2).map(|w| (w[0], w[1]))
    }

    /// 地理边界
    pub fn bounds(&self) -> GeoBounds {
        bounds_of(&self.points)
    }
}

impl TryFrom<Vec<(f64, f64)>> for LineString {
    type Error = GeometryError;

    fn try_from(points: Vec<(f64, f64)>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<LineString> for Vec<(f64, f64)> {
    fn from(line: LineString) -> Self {
        line.points
    }
}

// ============================================================
// Ring
// ============================================================

/// 闭合环（面源边界），首尾顶点相同
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<(f64, f64)>", into = "Vec<(f64, f64)>")]
pub struct Ring {
    points: Vec<(f64, f64)>,
}

impl Ring {
    /// 创建闭合环
    ///
    /// 至少 4 个顶点（三角形加闭合点），且首尾相同。
    pub fn new(points: Vec<(f64, f64)>) -> Result<Self, GeometryError> {
        if points.len() < 4 {
            return Err(GeometryError::TooFewRingVertices(points.len()));
        }
        check_finite(&points)?;
        if points.first() != points.last() {
            return Err(GeometryError::RingNotClosed);
        }
        Ok(Self { points })
    }

    /// 全部顶点（含闭合点）
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// 地理边界
    pub fn bounds(&self) -> GeoBounds {
        bounds_of(&self.points)
    }
}

impl TryFrom<Vec<(f64, f64)>> for Ring {
    type Error = GeometryError;

    fn try_from(points: Vec<(f64, f64)>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<Ring> for Vec<(f64, f64)> {
    fn from(ring: Ring) -> Self {
        ring.points
    }
}

fn bounds_of(points: &[(f64, f64)]) -> GeoBounds {
    let (lon, lat) = points[0];
    points[1..]
        .iter()
        .fold(GeoBounds::from_point(lon, lat), |b, &(lon, lat)| b.expand(lon, lat))
}
