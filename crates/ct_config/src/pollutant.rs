// crates/ct_config/src/pollutant.rs

//! 污染物定义
//!
//! 求解器以 1..=11 的整数代码识别污染物。NOX 与 CO 以体积分数 (ppb) 表示，
//! 其余污染物以质量浓度表示。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// 污染物
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Pollutant {
    /// 氮氧化物
    Nox,
    /// 苯
    Benzene,
    /// 细颗粒物
    Pm25,
    /// 柴油细颗粒物
    DieselPm25,
    /// 元素碳
    Ec25,
    /// 有机碳
    Oc25,
    /// 一氧化碳
    Co,
    /// 甲醛
    Formaldehyde,
    /// 乙醛
    Acetaldehyde,
    /// 丙烯醛
    Acrolein,
    /// 1,3-丁二烯
    Butadiene,
}

/// 浓度单位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Units {
    /// 十亿分之一（体积）
    Ppb,
    /// 微克每立方米
    MicrogramsPerCubicMeter,
}

impl Units {
    /// 图例中使用的单位标签
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ppb => "ppb",
            Self::MicrogramsPerCubicMeter => "ug/m3",
        }
    }
}

impl Pollutant {
    /// 全部污染物，按代码排序
    pub const ALL: [Self; 11] = [
        Self::Nox,
        Self::Benzene,
        Self::Pm25,
        Self::DieselPm25,
        Self::Ec25,
        Self::Oc25,
        Self::Co,
        Self::Formaldehyde,
        Self::Acetaldehyde,
        Self::Acrolein,
        Self::Butadiene,
    ];

    /// 求解器使用的整数代码
    pub fn code(&self) -> u8 {
        match self {
            Self::Nox => 1,
            Self::Benzene => 2,
            Self::Pm25 => 3,
            Self::DieselPm25 => 4,
            Self::Ec25 => 5,
            Self::Oc25 => 6,
            Self::Co => 7,
            Self::Formaldehyde => 8,
            Self::Acetaldehyde => 9,
            Self::Acrolein => 10,
            Self::Butadiene => 11,
        }
    }

    /// 由代码构造
    pub fn from_code(code: u8) -> Result<Self, ConfigError> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.code() == code)
            .ok_or_else(|| ConfigError::invalid_value("pollutant", code, "污染物代码必须在 1..=11"))
    }

    /// 显示名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nox => "NOX",
            Self::Benzene => "Benz",
            Self::Pm25 => "PM2.5",
            Self::DieselPm25 => "D_PM2.5",
            Self::Ec25 => "EC_2.5",
            Self::Oc25 => "OC_2.5",
            Self::Co => "CO",
            Self::Formaldehyde => "FORM",
            Self::Acetaldehyde => "ALD2",
            Self::Acrolein => "ACRO",
            Self::Butadiene => "1,3-BUTA",
        }
    }

    /// 浓度单位
    pub fn units(&self) -> Units {
        match self {
            Self::Nox | Self::Co => Units::Ppb,
            _ => Units::MicrogramsPerCubicMeter,
        }
    }
}

impl TryFrom<u8> for Pollutant {
    type Error = ConfigError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

impl From<Pollutant> for u8 {
    fn from(p: Pollutant) -> Self {
        p.code()
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Pollutant {
    type Err = ConfigError;

    /// 接受整数代码或显示名称（不区分大小写）
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u8>() {
            return Self::from_code(code);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::invalid_value("pollutant", s, "未知污染物"))
    }
}
