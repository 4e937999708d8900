//! 兰伯特等角圆锥投影（双标准纬线, 椭球体）
//!
//! 按 Snyder (1987) 的公式实现，等量纬度通过 [`taupf`](super::math_utils::taupf) /
//! [`tauf`](super::math_utils::tauf) 计算，以获得与 PROJ `+proj=lcc` 一致的数值精度。
//!
//! # 公式
//!
//! - ψ(φ): 等量纬度, t = e^(-ψ)
//! - m(φ) = cos φ / √(1 - e² sin² φ)
//! - n = (ln m₁ - ln m₂) / (ψ₂ - ψ₁)
//! - F = m₁ e^(nψ₁) / n, ρ = aF e^(-nψ)
//! - x = ρ sin θ, y = ρ₀ - ρ cos θ, θ = n(λ - λ₀)

use super::math_utils::{ang_normalize, isometric_latitude, latitude_from_isometric};
use super::traits::MapProjection;
use crate::ellipsoid::Ellipsoid;
use crate::error::{GeoError, GeoResult};
use ct_foundation::error::CtResult;
use serde::{Deserialize, Serialize};

/// 极点判定容差 (度)
const POLE_EPS: f64 = 1e-10;

/// 兰伯特投影参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LccParams {
    /// 椭球体
    pub ellipsoid: Ellipsoid,
    /// 第一标准纬线 (度)
    pub lat_1: f64,
    /// 第二标准纬线 (度)
    pub lat_2: f64,
    /// 原点纬度 (度)
    pub lat_origin: f64,
    /// 中央子午线 (度)
    pub central_meridian: f64,
    /// 假东 (米)
    pub false_easting: f64,
    /// 假北 (米)
    pub false_northing: f64,
}

impl LccParams {
    /// 求解器平面坐标系
    ///
    /// `+proj=lcc +lat_1=33 +lat_2=45 +lat_0=40 +lon_0=-97 +x_0=0 +y_0=0 +ellps=GRS80 +units=m`
    pub const CTOOLS: Self = Self {
        ellipsoid: Ellipsoid::GRS80,
        lat_1: 33.0,
        lat_2: 45.0,
        lat_origin: 40.0,
        central_meridian: -97.0,
        false_easting: 0.0,
        false_northing: 0.0,
    };

    /// 校验参数
    pub fn validate(&self) -> GeoResult<()> {
        GeoError::check_coordinate("第一标准纬线", self.lat_1, -89.999, 89.999)?;
        GeoError::check_coordinate("第二标准纬线", self.lat_2, -89.999, 89.999)?;
        GeoError::check_coordinate("原点纬度", self.lat_origin, -89.999, 89.999)?;
        GeoError::check_coordinate("中央子午线", self.central_meridian, -180.0, 180.0)?;
        if (self.lat_1 + self.lat_2).abs() < POLE_EPS {
            return Err(GeoError::projection_failed(
                "参数校验",
                "标准纬线关于赤道对称，圆锥常数为零",
            ));
        }
        Ok(())
    }
}

impl Default for LccParams {
    fn default() -> Self {
        Self::CTOOLS
    }
}

/// 兰伯特等角圆锥投影
#[derive(Debug, Clone)]
pub struct LambertConformalConic {
    params: LccParams,
    /// 第一偏心率
    es: f64,
    /// 圆锥常数 n
    n: f64,
    /// a·F
    af: f64,
    /// 原点处的 ρ₀
    rho0: f64,
}

impl LambertConformalConic {
    /// 由参数创建投影（校验参数）
    pub fn new(params: LccParams) -> GeoResult<Self> {
        params.validate()?;
        Ok(Self::from_valid(params))
    }

    /// 求解器平面坐标系
    #[must_use]
    pub fn ctools() -> Self {
        Self::from_valid(LccParams::CTOOLS)
    }

    fn from_valid(params: LccParams) -> Self {
        let es = params.ellipsoid.e();
        let e2 = params.ellipsoid.e2();
        let m = |lat_rad: f64| lat_rad.cos() / (1.0 - e2 * lat_rad.sin().powi(2)).sqrt();

        let phi1 = params.lat_1.to_radians();
        let phi2 = params.lat_2.to_radians();
        let psi1 = isometric_latitude(phi1, es);
        let psi2 = isometric_latitude(phi2, es);

        let n = if (params.lat_1 - params.lat_2).abs() < POLE_EPS {
            phi1.sin()
        } else {
            (m(phi1).ln() - m(phi2).ln()) / (psi2 - psi1)
        };

        let af = params.ellipsoid.a * m(phi1) * (n * psi1).exp() / n;
        let psi0 = isometric_latitude(params.lat_origin.to_radians(), es);
        let rho0 = af * (-n * psi0).exp();

        Self {
            params,
            es,
            n,
            af,
            rho0,
        }
    }

    /// 投影参数
    #[must_use]
    pub fn params(&self) -> &LccParams {
        &self.params
    }

    /// 圆锥常数
    #[must_use]
    pub fn cone_constant(&self) -> f64 {
        self.n
    }

    /// 正向投影
    pub fn project(&self, lon: f64, lat: f64) -> GeoResult<(f64, f64)> {
        GeoError::check_coordinate("经度", lon, -180.0, 180.0)?;
        GeoError::check_coordinate("纬度", lat, -90.0, 90.0)?;

        let rho = if (lat.abs() - 90.0).abs() < POLE_EPS {
            if lat.signum() != self.n.signum() {
                return Err(GeoError::projection_failed(
                    "正向投影",
                    format!("纬度 {lat} 位于圆锥背向极点，无法投影"),
                ));
            }
            0.0
        } else {
            let psi = isometric_latitude(lat.to_radians(), self.es);
            self.af * (-self.n * psi).exp()
        };

        let theta = self.n * ang_normalize(lon - self.params.central_meridian).to_radians();
        let x = self.params.false_easting + rho * theta.sin();
        let y = self.params.false_northing + self.rho0 - rho * theta.cos();

        if !(x.is_finite() && y.is_finite()) {
            return Err(GeoError::projection_failed(
                "正向投影",
                format!("({lon}, {lat}) 产生非有限结果"),
            ));
        }
        Ok((x, y))
    }

    /// 逆向投影
    pub fn unproject(&self, x: f64, y: f64) -> GeoResult<(f64, f64)> {
        if !(x.is_finite() && y.is_finite()) {
            return Err(GeoError::projection_failed(
                "逆向投影",
                format!("平面坐标非有限: ({x}, {y})"),
            ));
        }

        let sign = self.n.signum();
        let dx = sign * (x - self.params.false_easting);
        let dy = sign * (self.rho0 - (y - self.params.false_northing));
        let rho = sign * dx.hypot(dy);

        if rho == 0.0 {
            return Ok((self.params.central_meridian, 90.0 * sign));
        }

        let theta = dx.atan2(dy);
        let psi = -(rho / self.af).ln() / self.n;
        let lat = latitude_from_isometric(psi, self.es).to_degrees();
        let lon = ang_normalize(self.params.central_meridian + (theta / self.n).to_degrees());

        if !(lon.is_finite() && lat.is_finite()) {
            return Err(GeoError::projection_failed(
                "逆向投影",
                format!("({x}, {y}) 产生非有限结果"),
            ));
        }
        Ok((lon, lat))
    }
}

impl MapProjection for LambertConformalConic {
    fn name(&self) -> &'static str {
        "Lambert Conformal Conic (2SP)"
    }

    fn ellipsoid(&self) -> &Ellipsoid {
        &self.params.ellipsoid
    }

    fn forward(&self, lon: f64, lat: f64) -> CtResult<(f64, f64)> {
        Ok(self.project(lon, lat)?)
    }

    fn inverse(&self, x: f64, y: f64) -> CtResult<(f64, f64)> {
        Ok(self.unproject(x, y)?)
    }

    fn central_meridian(&self) -> Option<f64> {
        Some(self.params.central_meridian)
    }
}

// ============================================================================
// 测试
// ============================================================================
