// crates/ct_raster/src/error.rs

//! 栅格错误类型

use ct_foundation::error::CtError;
use thiserror::Error;

/// 栅格合成错误
#[derive(Debug, Error)]
pub enum RasterError {
    /// 没有可插值的样本
    #[error("没有可插值的样本")]
    EmptySamples,

    /// 样本范围退化
    #[error("样本范围退化: 经度跨度 {lng_delta}, 纬度跨度 {lat_delta}")]
    DegenerateExtent {
        /// 经度跨度
        lng_delta: f64,
        /// 纬度跨度
        lat_delta: f64,
    },

    /// 栅格尺寸不匹配
    #[error("栅格尺寸不匹配: 期望 {expected}, 实际 {actual}")]
    SizeMismatch {
        /// 期望元素数
        expected: usize,
        /// 实际元素数
        actual: usize,
    },

    /// 三角化失败
    #[error("三角化失败: {0}")]
    Triangulation(String),

    /// 图例绘制失败
    #[error("图例错误: {0}")]
    Legend(String),

    /// 图像编码失败
    #[error("图像编码失败: {0}")]
    Encode(String),
}

/// 栅格结果
pub type RasterResult<T> = Result<T, RasterError>;

impl From<RasterError> for CtError {
    fn from(err: RasterError) -> Self {
        CtError::raster(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_ct_error() {
        let err: CtError = RasterError::EmptySamples.into();
        assert!(matches!(err, CtError::Raster(_)));
    }
}
