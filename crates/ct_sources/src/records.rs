// crates/ct_sources/src/records.rs

//! 强类型排放源记录
//!
//! 每类排放源一个记录类型，字段名即求解器输入表的列名。
//! 几何字段在反序列化时校验（见 [`crate::geometry`]）。

use serde::{Deserialize, Serialize};

use crate::emission::EmissionFactors;
use crate::geometry::{LineString, Ring};

fn default_multiplier() -> f64 {
    1.0
}

/// 道路
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Road {
    /// 主键
    #[serde(default)]
    pub gid: Option<i64>,
    /// 路段编号
    #[serde(default)]
    pub id: Option<f64>,
    /// 路牌
    #[serde(default)]
    pub sign1: Option<String>,
    /// 源设施编号
    #[serde(default)]
    pub sf_id: Option<f64>,
    /// 州 FIPS
    #[serde(default)]
    pub stfips: Option<f64>,
    /// 县 FIPS
    #[serde(default)]
    pub ctfips: Option<f64>,
    /// 道路功能等级
    #[serde(default)]
    pub fclass_rev: Option<f64>,
    /// 年平均日交通量
    #[serde(default)]
    pub aadt: Option<f64>,
    /// 车速 [mph]
    #[serde(default)]
    pub mph: Option<f64>,
    /// 汽油小车排放倍数
    #[serde(default = "default_multiplier")]
    pub gas_car_multiplier: f64,
    /// 汽油货车排放倍数
    #[serde(default = "default_multiplier")]
    pub gas_truck_multiplier: f64,
    /// 柴油小车排放倍数
    #[serde(default = "default_multiplier")]
    pub diesel_car_multiplier: f64,
    /// 柴油货车排放倍数
    #[serde(default = "default_multiplier")]
    pub diesel_truck_multiplier: f64,
    /// 中心线
    pub geometry: LineString,
}

/// 铁路
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Railway {
    /// 主键
    pub gid: i64,
    /// 产权方
    #[serde(default)]
    pub rrowner1: Option<String>,
    /// 源设施编号
    #[serde(default)]
    pub sf_id: Option<f64>,
    /// 排放因子
    #[serde(flatten)]
    pub emissions: EmissionFactors,
    /// 线路
    pub geometry: LineString,
}

/// 面源（港口、场站等）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaSource {
    /// 设施名称
    #[serde(default)]
    pub facility: String,
    /// 主键
    pub gid: i64,
    /// 源设施编号
    #[serde(default)]
    pub sf_id: Option<f64>,
    /// 排放因子
    #[serde(flatten)]
    pub emissions: EmissionFactors,
    /// 边界
    pub geometry: Ring,
}

/// 点源（烟囱）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSource {
    /// 工厂名称
    #[serde(default)]
    pub pltname: String,
    /// 主键
    pub gid: i64,
    /// 源设施编号
    #[serde(default)]
    pub sf_id: Option<f64>,
    /// 烟囱高度
    #[serde(default)]
    pub stkht: Option<f64>,
    /// 烟囱直径
    #[serde(default)]
    pub stkdm: Option<f64>,
    /// 烟气温度
    #[serde(default)]
    pub stktmp: Option<f64>,
    /// 烟气速度
    #[serde(default)]
    pub stkvel: Option<f64>,
    /// 排放因子
    #[serde(flatten)]
    pub emissions: EmissionFactors,
    /// 是否位于港区
    #[serde(default)]
    pub in_port: bool,
    /// 位置 (经度, 纬度)
    pub location: (f64, f64),
}

/// 航行船舶
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselTransit {
    /// 设施名称
    #[serde(default)]
    pub facility: String,
    /// 主键
    pub gid: i64,
    /// 源设施编号
    #[serde(default)]
    pub sf_id: Option<f64>,
    /// 排放因子
    #[serde(flatten)]
    pub emissions: EmissionFactors,
    /// 烟囱高度
    #[serde(default)]
    pub stack_height: Option<f64>,
    /// 烟囱直径
    #[serde(default)]
    pub stack_diameter: Option<f64>,
    /// 烟气速度
    #[serde(default)]
    pub stack_velocity: Option<f64>,
    /// 烟气温度
    #[serde(default)]
    pub stack_temperature: Option<f64>,
    /// 航线
    pub geometry: LineString,
}
