// crates/ct_config/src/model.rs

//! 模型变体与比较模式
//!
//! 模型变体同时决定求解器可执行文件（逐时 / 年均）与输出表中的浓度列号。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::bounds::ClampBounds;
use crate::error::ConfigError;
use crate::pollutant::Pollutant;

/// 模型变体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ModelVariant {
    /// 逐时浓度
    Hourly,
    /// 年均浓度
    Annual,
    /// 致癌风险
    CancerRisk,
    /// 非致癌风险
    NonCancerRisk,
}

impl ModelVariant {
    /// 整数代码 (1..=4)
    pub fn code(&self) -> u8 {
        match self {
            Self::Hourly => 1,
            Self::Annual => 2,
            Self::CancerRisk => 3,
            Self::NonCancerRisk => 4,
        }
    }

    /// 由代码构造
    pub fn from_code(code: u8) -> Result<Self, ConfigError> {
        match code {
            1 => Ok(Self::Hourly),
            2 => Ok(Self::Annual),
            3 => Ok(Self::CancerRisk),
            4 => Ok(Self::NonCancerRisk),
            _ => Err(ConfigError::invalid_value(
                "model_variant",
                code,
                "模型变体代码必须在 1..=4",
            )),
        }
    }

    /// 求解器模式
    pub fn solver_mode(&self) -> SolverMode {
        match self {
            Self::Hourly => SolverMode::Hourly,
            _ => SolverMode::Annual,
        }
    }

    /// 输出表中的浓度列号（从 0 开始）
    ///
    /// 逐时为 3，其余为 `code + 2`。
    pub fn value_column(&self) -> usize {
        match self {
            Self::Hourly => 3,
            other => usize::from(other.code()) + 2,
        }
    }

    /// 图例标题主体
    pub fn quantity(&self) -> &'static str {
        match self {
            Self::Hourly => "concentration",
            Self::Annual => "annual average",
            Self::CancerRisk => "cancer risk",
            Self::NonCancerRisk => "non-cancer risk",
        }
    }

    /// 是否为风险类变体
    pub fn is_risk(&self) -> bool {
        matches!(self, Self::CancerRisk | Self::NonCancerRisk)
    }
}

impl TryFrom<u8> for ModelVariant {
    type Error = ConfigError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

impl From<ModelVariant> for u8 {
    fn from(v: ModelVariant) -> Self {
        v.code()
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.quantity())
    }
}

/// 求解器模式，对应两个可执行文件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SolverMode {
    /// 逐时
    Hourly,
    /// 年均
    Annual,
}

impl SolverMode {
    /// 输出文件名中的模式标签
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Hourly => "HOURLY",
            Self::Annual => "ANNUAL",
        }
    }
}

/// 比较模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMode {
    /// 直接差值 `a - b`，线性色标
    Absolute,
    /// 带符号对数差值 `sign(d)·log10|d|`（|d| ≤ 1 记为 0）
    Relative,
    /// 百分比差值 `(a - b) / b · 100`
    RelativePercent,
}

impl ComparisonMode {
    /// 结果表中的列标题
    pub fn results_title(&self) -> &'static str {
        match self {
            Self::Absolute | Self::Relative => "concentration difference",
            Self::RelativePercent => "concentration difference (%)",
        }
    }

    /// 两个场景标量的合并
    pub fn combine(&self, a: f64, b: f64) -> f64 {
        match self {
            Self::Absolute => a - b,
            Self::Relative => {
                let d = a - b;
                if d.abs() <= 1.0 {
                    0.0
                } else {
                    d.signum() * d.abs().log10()
                }
            }
            Self::RelativePercent => (a - b) / b * 100.0,
        }
    }

    /// 是否使用关于 0 对称的色标
    pub fn is_symmetric(&self) -> bool {
        !matches!(self, Self::Absolute)
    }
}

impl FromStr for ComparisonMode {
    type Err = ConfigError;

    /// 接受 `"absolute"`、`"relative"` / `"1"`、`"relative_percent"` / `"Relative (%)"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "absolute" => Ok(Self::Absolute),
            "relative" | "1" => Ok(Self::Relative),
            "relative_percent" | "relative (%)" | "percent" => Ok(Self::RelativePercent),
            other => Err(ConfigError::invalid_value(
                "comparison_mode",
                other,
                "未知比较模式",
            )),
        }
    }
}

/// 图例标题
///
/// - 单场景: `"NOX concentration (ppb)"`
/// - 差值比较: `"NOX concentration difference (ppb)"`
/// - 百分比比较: `"NOX concentration difference (%)"`
///
/// 风险类变体的单位固定为 `(incidence per million)`。
pub fn legend_title(
    pollutant: Pollutant,
    variant: ModelVariant,
    comparison: Option<ComparisonMode>,
) -> String {
    let units = if variant.is_risk() {
        "(incidence per million)".to_string()
    } else {
        format!("({})", pollutant.units().label())
    };

    match comparison {
        None => format!("{} {} {}", pollutant.name(), variant.quantity(), units),
        Some(ComparisonMode::RelativePercent) => {
            format!("{} {} difference (%)", pollutant.name(), variant.quantity())
        }
        Some(_) => format!(
            "{} {} difference {}",
            pollutant.name(),
            variant.quantity(),
            units
        ),
    }
}

/// 一次运行的请求参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunParameters {
    /// 污染物
    pub pollutant: Pollutant,
    /// 模型变体
    pub model_variant: ModelVariant,
    /// 可选浓度截断范围
    #[serde(default)]
    pub clamp: ClampBounds,
}

impl RunParameters {
    /// 创建参数（无截断）
    pub fn new(pollutant: Pollutant, model_variant: ModelVariant) -> Self {
        Self {
            pollutant,
            model_variant,
            clamp: ClampBounds::default(),
        }
    }

    /// 设置截断范围
    #[must_use]
    pub fn with_clamp(mut self, clamp: ClampBounds) -> Self {
        self.clamp = clamp;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_column() {
        assert_eq!(ModelVariant::Hourly.value_column(), 3);
        assert_eq!(ModelVariant::Annual.value_column(), 4);
        assert_eq!(ModelVariant::CancerRisk.value_column(), 5);
        assert_eq!(ModelVariant::NonCancerRisk.value_column(), 6);
    }

    #[test]
    fn test_solver_mode() {
        assert_eq!(ModelVariant::Hourly.solver_mode(), SolverMode::Hourly);
        assert_eq!(ModelVariant::CancerRisk.solver_mode().tag(), "ANNUAL");
    }

    #[test]
    fn test_relative_combine() {
        let m = ComparisonMode::Relative;
        assert_eq!(m.combine(5.0, 4.5), 0.0);
        assert!((m.combine(110.0, 10.0) - 2.0).abs() < 1e-12);
        assert!((m.combine(10.0, 1010.0) + 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_percent_combine() {
        let m = ComparisonMode::RelativePercent;
        assert!((m.combine(3.0, 2.0) - 50.0).abs() < 1e-12);
        assert!((m.combine(1.0, 2.0) + 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_parse_comparison_mode() {
        assert_eq!("1".parse::<ComparisonMode>().unwrap(), ComparisonMode::Relative);
        assert_eq!(
            "Relative (%)".parse::<ComparisonMode>().unwrap(),
            ComparisonMode::RelativePercent
        );
        assert!("bogus".parse::<ComparisonMode>().is_err());
    }

    #[test]
    fn test_legend_titles() {
        assert_eq!(
            legend_title(Pollutant::Nox, ModelVariant::Hourly, None),
            "NOX concentration (ppb)"
        );
        assert_eq!(
            legend_title(Pollutant::Benzene, ModelVariant::CancerRisk, None),
            "Benz cancer risk (incidence per million)"
        );
        assert_eq!(
            legend_title(Pollutant::Pm25, ModelVariant::Annual, Some(ComparisonMode::Relative)),
            "PM2.5 annual average difference (ug/m3)"
        );
        assert_eq!(
            legend_title(
                Pollutant::Co,
                ModelVariant::Hourly,
                Some(ComparisonMode::RelativePercent)
            ),
            "CO concentration difference (%)"
        );
    }

    #[test]
    fn test_run_parameters_serde() {
        let json = r#"{"pollutant": 1, "model_variant": 2}"#;
        let p: RunParameters = serde_json::from_str(json).unwrap();
        assert_eq!(p.pollutant, Pollutant::Nox);
        assert_eq!(p.model_variant, ModelVariant::Annual);
        assert!(p.clamp.is_unbounded());
    }
}
