// crates/ct_geo/src/error.rs
//! 地理空间处理错误类型
//!
//! 包含投影转换与边界框计算相关的错误。
//! 所有错误可转换为 `ct_foundation::CtError` 向上传播，投影类错误对运行是致命的。
//!
//! # 错误分类
//!
//! - **验证错误**：坐标越界、非有限数值
//! - **计算错误**：投影转换失败
//! - **几何错误**：边界框为空或退化

use ct_foundation::CtError;
use thiserror::Error;

/// Geo 模块结果类型
pub type GeoResult<T> = Result<T, GeoError>;

/// 地理空间处理错误
#[derive(Error, Debug)]
pub enum GeoError {
    /// 坐标超出有效范围
    #[error("{coord_type} 超出范围: {value:.6} (允许范围: {min} 到 {max})")]
    CoordinateOutOfRange {
        /// 坐标类型（如"纬度"、"经度"）
        coord_type: &'static str,
        /// 实际值
        value: f64,
        /// 最小允许值
        min: f64,
        /// 最大允许值
        max: f64,
    },

    /// 投影转换失败
    #[error("投影转换失败: {operation}: {message}")]
    ProjectionFailed {
        /// 操作类型（如"正向投影"、"逆向投影"）
        operation: &'static str,
        /// 错误详情
        message: String,
    },

    /// 边界框为空或退化
    #[error("边界框无效: {message}")]
    DegenerateBounds {
        /// 失败原因
        message: String,
    },

    /// 基础层错误（向下聚合）
    #[error("基础层错误: {0}")]
    Foundation(#[from] CtError),
}

// ============================================================================
// 转换实现
// ============================================================================

impl From<GeoError> for CtError {
    fn from(err: GeoError) -> Self {
        match err {
            GeoError::CoordinateOutOfRange {
                coord_type,
                value,
                min,
                max,
            } => CtError::projection(format!(
                "{coord_type} 超出范围: {value:.6} (允许范围: {min} 到 {max})"
            )),
            GeoError::ProjectionFailed { operation, message } => {
                CtError::projection(format!("[{operation}] {message}"))
            }
            GeoError::DegenerateBounds { message } => CtError::config(message),
            GeoError::Foundation(err) => err,
        }
    }
}

// ============================================================================
// 便捷构造函数
// ============================================================================

impl GeoError {
    /// 创建坐标越界错误
    #[inline]
    pub fn coordinate_out_of_range(
        coord_type: &'static str,
        value: f64,
        min: f64,
        max: f64,
    ) -> Self {
        Self::CoordinateOutOfRange {
            coord_type,
            value,
            min,
            max,
        }
    }

    /// 创建投影转换失败错误
    #[inline]
    pub fn projection_failed(operation: &'static str, message: impl Into<String>) -> Self {
        Self::ProjectionFailed {
            operation,
            message: message.into(),
        }
    }

    /// 创建边界框退化错误
    #[inline]
    pub fn degenerate_bounds(message: impl Into<String>) -> Self {
        Self::DegenerateBounds {
            message: message.into(),
        }
    }

    /// 验证坐标范围（闭区间，拒绝 NaN / 无穷）
    #[inline]
    pub fn check_coordinate(
        coord_type: &'static str,
        value: f64,
        min: f64,
        max: f64,
    ) -> Result<(), Self> {
        if value.is_finite() && (min..=max).contains(&value) {
            Ok(())
        } else {
            Err(Self::coordinate_out_of_range(coord_type, value, min, max))
        }
    }
}
