//! 投影 Trait 定义
//!
//! 定义统一的投影接口，运行期只使用一种固定投影，但接口保持可扩展。

use crate::ellipsoid::Ellipsoid;
use ct_foundation::error::CtResult;

/// 地图投影 Trait
///
/// 所有投影实现都必须实现此 trait
pub trait MapProjection: Send + Sync {
    /// 获取投影名称
    fn name(&self) -> &'static str;

    /// 获取使用的椭球体
    fn ellipsoid(&self) -> &Ellipsoid;

    /// 正向投影：地理坐标 -> 平面坐标
    ///
    /// # Arguments
    /// - `lon`: 经度 (度)
    /// - `lat`: 纬度 (度)
    ///
    /// # Returns
    /// (x, y) 平面坐标 (米)
    fn forward(&self, lon: f64, lat: f64) -> CtResult<(f64, f64)>;

    /// 逆向投影：平面坐标 -> 地理坐标
    ///
    /// # Returns
    /// (lon, lat) 经度和纬度 (度)
    fn inverse(&self, x: f64, y: f64) -> CtResult<(f64, f64)>;

    /// 获取中央子午线（如适用）
    fn central_meridian(&self) -> Option<f64> {
        None
    }

    /// 批量正向投影
    fn forward_batch(&self, points: &[(f64, f64)]) -> CtResult<Vec<(f64, f64)>> {
        points.iter().map(|&(lon, lat)| self.forward(lon, lat)).collect()
    }

    /// 批量逆向投影
    fn inverse_batch(&self, points: &[(f64, f64)]) -> CtResult<Vec<(f64, f64)>> {
        points.iter().map(|&(x, y)| self.inverse(x, y)).collect()
    }
}
