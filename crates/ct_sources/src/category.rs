// crates/ct_sources/src/category.rs

//! 排放源类别
//!
//! 每个类别对应一次独立的求解器调用：固定的命令行标签、输入表文件名与输出表文件名。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 排放源类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceCategory {
    /// 面源
    Area,
    /// 点源
    Point,
    /// 铁路
    Rail,
    /// 道路
    Road,
    /// 航行船舶
    Vessel,
}

impl SourceCategory {
    /// 全部类别（启动顺序）
    pub const ALL: [Self; 5] = [Self::Area, Self::Point, Self::Rail, Self::Road, Self::Vessel];

    /// 求解器命令行标签
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Area => "AREA",
            Self::Point => "POINT",
            Self::Rail => "RAIL",
            Self::Road => "ROAD",
            Self::Vessel => "SIT",
        }
    }

    /// 输入表文件名
    pub fn input_file_name(&self) -> &'static str {
        match self {
            Self::Area => "area.csv",
            Self::Point => "points.csv",
            Self::Rail => "railways.csv",
            Self::Road => "roads.csv",
            Self::Vessel => "sit.csv",
        }
    }

    /// 输出表文件名，`mode_tag` 为 `HOURLY` 或 `ANNUAL`
    pub fn output_file_name(&self, mode_tag: &str) -> String {
        format!("results_CTOOLS_{}_{}_Output.csv", mode_tag, self.tag())
    }
}

impl fmt::Display for SourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags() {
        let tags: Vec<_> = SourceCategory::ALL.iter().map(SourceCategory::tag).collect();
        assert_eq!(tags, vec!["AREA", "POINT", "RAIL", "ROAD", "SIT"]);
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(
            SourceCategory::Vessel.output_file_name("HOURLY"),
            "results_CTOOLS_HOURLY_SIT_Output.csv"
        );
        assert_eq!(
            SourceCategory::Road.output_file_name("ANNUAL"),
            "results_CTOOLS_ANNUAL_ROAD_Output.csv"
        );
    }
}
