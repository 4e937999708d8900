// crates/ct_config/src/bounds.rs

//! 浓度截断范围

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 可选的最小/最大浓度截断
///
/// 栅格插值前将样本值截断到该范围，图例也以其为显式边界。
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClampBounds {
    /// 下界
    #[serde(default)]
    pub min: Option<f64>,
    /// 上界
    #[serde(default)]
    pub max: Option<f64>,
}

impl ClampBounds {
    /// 创建截断范围
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    /// 是否未设置任何边界
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// 截断单个值
    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        let mut v = value;
        if let Some(min) = self.min {
            if v < min {
                v = min;
            }
        }
        if let Some(max) = self.max {
            if v > max {
                v = max;
            }
        }
        v
    }

    /// 校验边界
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, v) in [("clamp.min", self.min), ("clamp.max", self.max)] {
            if let Some(v) = v {
                if !v.is_finite() {
                    return Err(ConfigError::invalid_value(key, v, "必须为有限值"));
                }
            }
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min >= max {
                return Err(ConfigError::invalid_value(
                    "clamp",
                    format!("[{min}, {max}]"),
                    "下界必须小于上界",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp() {
        let b = ClampBounds::new(Some(-1.0), Some(2.0));
        assert_eq!(b.clamp(-5.0), -1.0);
        assert_eq!(b.clamp(0.5), 0.5);
        assert_eq!(b.clamp(9.0), 2.0);

        let open = ClampBounds::default();
        assert_eq!(open.clamp(1e9), 1e9);
    }

    #[test]
    fn test_validate() {
        assert!(ClampBounds::new(Some(1.0), Some(0.0)).validate().is_err());
        assert!(ClampBounds::new(Some(f64::NAN), None).validate().is_err());
        assert!(ClampBounds::new(None, Some(3.0)).validate().is_ok());
    }
}
