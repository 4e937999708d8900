// crates/ct_geo/src/ellipsoid.rs
//! 椭球体定义
//!
//! 提供地球椭球体参数。求解器平面坐标系基于 GRS80 (NAD83)。
//!
//! # 示例
//!
//! ```
//! use ct_geo::ellipsoid::Ellipsoid;
//!
//! let grs80 = Ellipsoid::GRS80;
//! assert!((grs80.a - 6_378_137.0).abs() < 1e-9);
//! assert!(grs80.e2() > 0.0066 && grs80.e2() < 0.0067);
//! ```

use serde::{Deserialize, Serialize};

/// 地球椭球体
///
/// 定义椭球体的几何参数，并提供派生参数的计算方法。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipsoid {
    /// 长半轴 (m)
    pub a: f64,
    /// 扁率 (flattening)
    pub f: f64,
}

impl Ellipsoid {
    // ========================================================================
    // 预定义椭球体
    // ========================================================================

    /// WGS84 椭球体 (GPS 标准)
    ///
    /// - EPSG: 7030
    /// - 长半轴: 6378137.0 m
    /// - 扁率: 1/298.257223563
    pub const WGS84: Self = Self {
        a: 6_378_137.0,
        f: 1.0 / 298.257_223_563,
    };

    /// GRS80 椭球体 (NAD83 基准)
    ///
    /// - EPSG: 7019
    /// - 长半轴: 6378137.0 m
    /// - 扁率: 1/298.257222101
    pub const GRS80: Self = Self {
        a: 6_378_137.0,
        f: 1.0 / 298.257_222_101,
    };

    /// 从长半轴和扁率创建椭球体
    #[must_use]
    pub const fn new(a: f64, f: f64) -> Self {
        Self { a, f }
    }

    /// 从 EPSG 椭球体代码获取
    #[must_use]
    pub fn from_epsg(code: u32) -> Option<Self> {
        match code {
            7030 => Some(Self::WGS84),
            7019 => Some(Self::GRS80),
            _ => None,
        }
    }

    // ========================================================================
    // 派生参数
    // ========================================================================

    /// 短半轴 b = a(1-f)
    #[inline]
    #[must_use]
    pub fn b(&self) -> f64 {
        self.a * (1.0 - self.f)
    }

    /// 第一偏心率的平方 e² = 2f - f²
    #[inline]
    #[must_use]
    pub fn e2(&self) -> f64 {
        self.f * (2.0 - self.f)
    }

    /// 第一偏心率 e = √e²
    #[inline]
    #[must_use]
    pub fn e(&self) -> f64 {
        self.e2().sqrt()
    }
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::GRS80
    }
}
