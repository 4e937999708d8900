// crates/ct_sources/src/lib.rs

//! CTools 排放源模块
//!
//! 将异构的排放源记录整理为各类别的求解器输入表。
//!
//! # 模块
//!
//! - `category`: 五类排放源及其求解器标签
//! - `emission`: 逐污染物排放因子向量
//! - `geometry`: 构造即校验的线 / 环几何
//! - `records`: 每类排放源的强类型记录
//! - `scenario`: 场景（JSON 加载、包含标志、边界框）
//! - `prepare`: 道路分段、名称清洗、面源顶点展开
//! - `table`: 逗号分隔输入表
//!
//! # 示例
//!
//! ```
//! use ct_sources::prelude::*;
//!
//! let json = r#"{
//!     "name": "Main St",
//!     "roads": [{
//!         "gid": 1, "id": 10, "aadt": 20000, "mph": 45,
//!         "geometry": [[-84.40, 33.75], [-84.39, 33.75], [-84.38, 33.76]]
//!     }]
//! }"#;
//! let scenario = Scenario::from_json_str(json).unwrap();
//! let prepared = SourceDataPreparer::new().prepare(&scenario).unwrap();
//! assert_eq!(prepared.road_segments.len(), 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod category;
pub mod emission;
pub mod geometry;
pub mod prepare;
pub mod records;
pub mod scenario;
pub mod table;

/// 预导入模块
pub mod prelude {
    pub use crate::category::SourceCategory;
    pub use crate::emission::EmissionFactors;
    pub use crate::geometry::{LineString, Ring};
    pub use crate::prepare::{sanitize_name, AreaVertex, PreparedSources, RoadSegment, SourceDataPreparer};
    pub use crate::records::{AreaSource, PointSource, Railway, Road, VesselTransit};
    pub use crate::scenario::Scenario;
    pub use crate::table::InputTable;
}

pub use category::SourceCategory;
pub use emission::{EmissionFactors, NO_DATA};
pub use prepare::{PreparedSources, RoadSegment, SourceDataPreparer};
pub use scenario::Scenario;
pub use table::InputTable;
