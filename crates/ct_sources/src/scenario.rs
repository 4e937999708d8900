// crates/ct_sources/src/scenario.rs

//! 场景
//!
//! 场景是一组排放源记录及其包含标志。加载后不可变；
//! 边界框由所有被包含类别的几何并集求得。

use serde::{Deserialize, Serialize};
use std::path::Path;

use ct_foundation::error::{CtError, CtResult};
use ct_foundation::require;
use ct_geo::GeoBounds;

use crate::category::SourceCategory;
use crate::records::{AreaSource, PointSource, Railway, Road, VesselTransit};

fn default_true() -> bool {
    true
}

/// 排放场景
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// 场景名称
    pub name: String,

    /// 小时 (逐时模式)
    #[serde(default)]
    pub hour: Option<u32>,
    /// 季节
    #[serde(default)]
    pub season: Option<u32>,
    /// 日类型
    #[serde(default)]
    pub day: Option<u32>,
    /// 气象条件
    #[serde(default)]
    pub met_conditions: Option<u32>,

    /// 面源
    #[serde(default)]
    pub area_sources: Vec<AreaSource>,
    /// 点源
    #[serde(default)]
    pub point_sources: Vec<PointSource>,
    /// 铁路
    #[serde(default)]
    pub railways: Vec<Railway>,
    /// 道路
    #[serde(default)]
    pub roads: Vec<Road>,
    /// 航行船舶
    #[serde(default)]
    pub ships_in_transit: Vec<VesselTransit>,

    /// 是否包含面源
    #[serde(default = "default_true")]
    pub include_area_sources: bool,
    /// 是否包含点源
    #[serde(default = "default_true")]
    pub include_point_sources: bool,
    /// 是否包含铁路
    #[serde(default = "default_true")]
    pub include_railways: bool,
    /// 是否包含道路
    #[serde(default = "default_true")]
    pub include_roads: bool,
    /// 是否包含航行船舶
    #[serde(default = "default_true")]
    pub include_ships_in_transit: bool,
}

impl Scenario {
    /// 创建空场景（所有类别均包含，但无记录）
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hour: None,
            season: None,
            day: None,
            met_conditions: None,
            area_sources: Vec::new(),
            point_sources: Vec::new(),
            railways: Vec::new(),
            roads: Vec::new(),
            ships_in_transit: Vec::new(),
            include_area_sources: true,
            include_point_sources: true,
            include_railways: true,
            include_roads: true,
            include_ships_in_transit: true,
        }
    }

    /// 从 JSON 字符串解析
    ///
    /// 语法错误为序列化错误；记录内容不合法（几何校验失败、字段类型不符）为无效输入。
    pub fn from_json_str(json: &str) -> CtResult<Self> {
        serde_json::from_str(json).map_err(|e| match e.classify() {
            serde_json::error::Category::Data => {
                CtError::invalid_input(format!("场景记录无效: {e}"))
            }
            _ => CtError::serialization(format!("场景解析失败: {e}")),
        })
    }

    /// 从 JSON 文件加载
    pub fn from_file<P: AsRef<Path>>(path: P) -> CtResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CtError::file_not_found(path));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| CtError::io_with_source(format!("无法读取场景文件 {}", path.display()), e))?;
        Self::from_json_str(&content)
    }

    /// 文件名安全的场景名：非字母数字字符替换为 `_`
    pub fn safe_name(&self) -> String {
        self.name
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect()
    }

    /// 类别是否参与计算
    ///
    /// 需同时满足包含标志为真且该类别有记录。
    pub fn includes(&self, category: SourceCategory) -> bool {
        match category {
            SourceCategory::Area => self.include_area_sources && !self.area_sources.is_empty(),
            SourceCategory::Point => self.include_point_sources && !self.point_sources.is_empty(),
            SourceCategory::Rail => self.include_railways && !self.railways.is_empty(),
            SourceCategory::Road => self.include_roads && !self.roads.is_empty(),
            SourceCategory::Vessel => {
                self.include_ships_in_transit && !self.ships_in_transit.is_empty()
            }
        }
    }

    /// 参与计算的类别（固定顺序）
    pub fn included_categories(&self) -> Vec<SourceCategory> {
        SourceCategory::ALL
            .into_iter()
            .filter(|c| self.includes(*c))
            .collect()
    }

    /// 被包含几何的并集边界（未校验）
    pub fn raw_bounds(&self) -> Option<GeoBounds> {
        let mut bounds: Option<GeoBounds> = None;
        let mut merge = |b: GeoBounds| {
            bounds = Some(match bounds {
                Some(acc) => acc.merge(&b),
                None => b,
            });
        };

        if self.includes(SourceCategory::Area) {
            self.area_sources.iter().for_each(|s| merge(s.geometry.bounds()));
        }
        if self.includes(SourceCategory::Point) {
            self.point_sources
                .iter()
                .for_each(|s| merge(GeoBounds::from_point(s.location.0, s.location.1)));
        }
        if self.includes(SourceCategory::Road) {
            self.roads.iter().for_each(|s| merge(s.geometry.bounds()));
        }
        if self.includes(SourceCategory::Rail) {
            self.railways.iter().for_each(|s| merge(s.geometry.bounds()));
        }
        if self.includes(SourceCategory::Vessel) {
            self.ships_in_transit
                .iter()
                .for_each(|s| merge(s.geometry.bounds()));
        }
        bounds
    }

    /// 场景边界框
    ///
    /// 没有任何被包含几何，或边界框退化（某轴跨度为 0）时返回配置错误。
    pub fn bounds(&self) -> CtResult<GeoBounds> {
        let bounds = require!(
            self.raw_bounds(),
            CtError::config(format!("场景 '{}' 没有任何被包含的排放源几何", self.name))
        );
        bounds.validate()?;
        Ok(bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn road_scenario() -> Scenario {
        Scenario::from_json_str(
            r#"{
                "name": "I-85, Atlanta",
                "roads": [
                    {"id": 1, "geometry": [[-84.40, 33.70], [-84.30, 33.80]]},
                    {"id": 2, "geometry": [[-84.50, 33.75], [-84.45, 33.76]]}
                ],
                "point_sources": [
                    {"gid": 9, "pltname": "Plant", "location": [-84.0, 34.0]}
                ],
                "include_point_sources": false
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_safe_name() {
        assert_eq!(road_scenario().safe_name(), "I_85__Atlanta");
    }

    #[test]
    fn test_bounds_union_of_included() {
        let b = road_scenario().bounds().unwrap();
        assert_eq!(b.min_lon, -84.50);
        assert_eq!(b.max_lon, -84.30);
        assert_eq!(b.min_lat, 33.70);
        // 点源未包含
        assert_eq!(b.max_lat, 33.80);
    }

    #[test]
    fn test_included_categories() {
        let s = road_scenario();
        assert_eq!(s.included_categories(), vec![SourceCategory::Road]);
    }

    #[test]
    fn test_empty_scenario_is_config_error() {
        let s = Scenario::new("empty");
        assert!(matches!(s.bounds(), Err(CtError::Config { .. })));
    }

    #[test]
    fn test_single_point_bounds_is_degenerate() {
        let mut s = Scenario::new("one stack");
        s.point_sources = road_scenario().point_sources;
        assert!(s.bounds().is_err());
    }

    #[test]
    fn test_invalid_geometry_is_invalid_input() {
        let unclosed = r#"{
            "name": "bad area",
            "area_sources": [
                {"gid": 1, "geometry": [[0, 0], [1, 0], [1, 1], [0, 1]]}
            ]
        }"#;
        let err = Scenario::from_json_str(unclosed).unwrap_err();
        assert!(matches!(err, CtError::InvalidInput { .. }), "{err:?}");
        assert!(err.to_string().contains("环未闭合"));

        let short_road = r#"{"name": "bad road", "roads": [{"id": 1, "geometry": [[-84.4, 33.7]]}]}"#;
        let err = Scenario::from_json_str(short_road).unwrap_err();
        assert!(matches!(err, CtError::InvalidInput { .. }), "{err:?}");
        assert!(err.to_string().contains("折线至少需要 2 个顶点"));
    }

    #[test]
    fn test_malformed_json_is_serialization_error() {
        let err = Scenario::from_json_str(r#"{"name": "x", "roads": ["#).unwrap_err();
        assert!(matches!(err, CtError::Serialization { .. }));
    }

    #[test]
    fn test_from_file_missing() {
        let err = Scenario::from_file("/nonexistent/scenario.json").unwrap_err();
        assert!(matches!(err, CtError::FileNotFound { .. }));
    }
}
