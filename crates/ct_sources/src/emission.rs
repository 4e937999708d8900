// crates/ct_sources/src/emission.rs

//! 排放因子向量
//!
//! 13 种污染物的排放因子，缺失值写入求解器输入表时以 [`NO_DATA`] 表示。

use serde::{Deserialize, Serialize};

/// 求解器的缺测值约定
pub const NO_DATA: f64 = -999.0;

/// 逐污染物排放因子
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EmissionFactors {
    /// 氮氧化物
    #[serde(default)]
    pub nox: Option<f64>,
    /// 苯
    #[serde(default)]
    pub benz: Option<f64>,
    /// 细颗粒物
    #[serde(default, alias = "pm2_5")]
    pub pm25: Option<f64>,
    /// 柴油细颗粒物
    #[serde(default)]
    pub dies_pm25: Option<f64>,
    /// 元素碳
    #[serde(default)]
    pub ec: Option<f64>,
    /// 有机碳
    #[serde(default)]
    pub oc: Option<f64>,
    /// 一氧化碳
    #[serde(default)]
    pub co: Option<f64>,
    /// 甲醛
    #[serde(default)]
    pub form: Option<f64>,
    /// 乙醛
    #[serde(default)]
    pub ald2: Option<f64>,
    /// 丙烯醛
    #[serde(default)]
    pub acro: Option<f64>,
    /// 1,3-丁二烯
    #[serde(default)]
    pub butal_3: Option<f64>,
    /// 甲苯
    #[serde(default)]
    pub toluene: Option<f64>,
    /// 二氧化硫
    #[serde(default)]
    pub so2: Option<f64>,
}

impl EmissionFactors {
    /// 列名（点源、铁路使用 `pm25`）
    pub const COLUMNS: [&'static str; 13] = [
        "nox", "benz", "pm25", "dies_pm25", "ec", "oc", "co", "form", "ald2", "acro", "butal_3",
        "toluene", "so2",
    ];

    /// 列名（面源、船舶使用 `pm2_5`）
    pub const COLUMNS_PM2_5: [&'static str; 13] = [
        "nox", "benz", "pm2_5", "dies_pm25", "ec", "oc", "co", "form", "ald2", "acro", "butal_3",
        "toluene", "so2",
    ];

    /// 按列顺序输出，缺失值替换为 [`NO_DATA`]
    pub fn values(&self) -> [f64; 13] {
        [
            self.nox,
            self.benz,
            self.pm25,
            self.dies_pm25,
            self.ec,
            self.oc,
            self.co,
            self.form,
            self.ald2,
            self.acro,
            self.butal_3,
            self.toluene,
            self.so2,
        ]
        .map(|v| v.unwrap_or(NO_DATA))
    }
}

/// 可选数值转为输入表取值
#[inline]
pub fn or_no_data(value: Option<f64>) -> f64 {
    value.unwrap_or(NO_DATA)
}
