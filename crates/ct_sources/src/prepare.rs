// crates/ct_sources/src/prepare.rs

//! 排放源预处理
//!
//! - 道路折线拆分为直线段，每段继承父道路的全部属性
//! - 线源端点与点源位置投影到求解器平面坐标
//! - 面源边界逐顶点展开为带完整排放因子的点记录
//! - 设施名称去除空格与逗号
//!
//! 预处理完成后，下游只使用平面坐标做距离与几何计算。

use ct_foundation::ensure;
use ct_foundation::error::{CtError, CtResult};
use ct_geo::{CoordinateProjector, Point2D};
use tracing::debug;

use crate::category::SourceCategory;
use crate::emission::{or_no_data, EmissionFactors};
use crate::records::{PointSource, Railway, Road, VesselTransit};
use crate::scenario::Scenario;
use crate::table::InputTable;

/// 清洗设施名称：空格替换为 `_`，逗号删除
pub fn sanitize_name(name: &str) -> String {
    name.replace(' ', "_").replace(',', "")
}

// ============================================================
// 预处理结果类型
// ============================================================

/// 已投影的直线源
///
/// 道路为拆分后的单段，铁路与航线取首末顶点。
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSource<T> {
    /// 源记录（继承全部非几何属性）
    pub record: T,
    /// 起点（平面坐标）
    pub from: Point2D,
    /// 终点（平面坐标）
    pub to: Point2D,
}

impl<T> LinearSource<T> {
    /// 平面 x 增量
    #[inline]
    pub fn dx(&self) -> f64 {
        self.to.x - self.from.x
    }

    /// 平面 y 增量
    #[inline]
    pub fn dy(&self) -> f64 {
        self.to.y - self.from.y
    }

    /// 平面长度
    pub fn length(&self) -> f64 {
        self.from.distance_to(&self.to)
    }
}

/// 道路直线段
pub type RoadSegment = LinearSource<Road>;

/// 已投影的点源
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedPoint {
    /// 源记录（名称已清洗）
    pub record: PointSource,
    /// 平面位置
    pub position: Point2D,
}

/// 面源顶点
#[derive(Debug, Clone, PartialEq)]
pub struct AreaVertex {
    /// 所属面源主键
    pub object_id: i64,
    /// 源设施编号
    pub sf_id: Option<f64>,
    /// 平面 x
    pub x: f64,
    /// 平面 y
    pub y: f64,
    /// 父面源的排放因子
    pub emissions: EmissionFactors,
}

/// 一个场景的预处理结果
#[derive(Debug, Clone, Default)]
pub struct PreparedSources {
    /// 参与计算的类别
    pub categories: Vec<SourceCategory>,
    /// 道路直线段
    pub road_segments: Vec<RoadSegment>,
    /// 铁路
    pub railways: Vec<LinearSource<Railway>>,
    /// 航行船舶
    pub vessels: Vec<LinearSource<VesselTransit>>,
    /// 点源
    pub points: Vec<PlacedPoint>,
    /// 面源顶点
    pub area_vertices: Vec<AreaVertex>,
    /// 面源设施名称（已清洗），按面源顺序
    pub area_facilities: Vec<String>,
}

impl PreparedSources {
    /// 类别是否参与计算
    pub fn includes(&self, category: SourceCategory) -> bool {
        self.categories.contains(&category)
    }

    /// 生成类别的求解器输入表
    pub fn table(&self, category: SourceCategory) -> CtResult<InputTable> {
        match category {
            SourceCategory::Road => self.road_table(),
            SourceCategory::Rail => self.rail_table(),
            SourceCategory::Area => self.area_table(),
            SourceCategory::Point => self.point_table(),
            SourceCategory::Vessel => self.vessel_table(),
        }
    }

    fn road_table(&self) -> CtResult<InputTable> {
        let mut table = InputTable::new([
            "id",
            "from_x",
            "from_y",
            "to_x",
            "to_y",
            "sf_id",
            "stfips",
            "ctfips",
            "fclass_rev",
            "aadt",
            "mph",
            "gas_car_multiplier",
            "gas_truck_multiplier",
            "diesel_car_multiplier",
            "diesel_truck_multiplier",
        ]);
        for seg in &self.road_segments {
            let r = &seg.record;
            table.push_numbers([
                or_no_data(r.id),
                seg.from.x,
                seg.from.y,
                seg.to.x,
                seg.to.y,
                or_no_data(r.sf_id),
                or_no_data(r.stfips),
                or_no_data(r.ctfips),
                or_no_data(r.fclass_rev),
                or_no_data(r.aadt),
                or_no_data(r.mph),
                r.gas_car_multiplier,
                r.gas_truck_multiplier,
                r.diesel_car_multiplier,
                r.diesel_truck_multiplier,
            ])?;
        }
        Ok(table)
    }

    fn rail_table(&self) -> CtResult<InputTable> {
        let header = ["gid", "fromx", "fromy", "tox", "toy", "sf_id"]
            .into_iter()
            .chain(EmissionFactors::COLUMNS);
        let mut table = InputTable::new(header);
        for rail in &self.railways {
            let r = &rail.record;
            let mut row = vec![
                r.gid as f64,
                rail.from.x,
                rail.from.y,
                rail.to.x,
                rail.to.y,
                or_no_data(r.sf_id),
            ];
            row.extend(r.emissions.values());
            table.push_numbers(row)?;
        }
        Ok(table)
    }

    fn area_table(&self) -> CtResult<InputTable> {
        let header = ["object_id", "sf_id", "x", "y"]
            .into_iter()
            .chain(EmissionFactors::COLUMNS_PM2_5);
        let mut table = InputTable::new(header);
        for v in &self.area_vertices {
            let mut row = vec![v.object_id as f64, or_no_data(v.sf_id), v.x, v.y];
            row.extend(v.emissions.values());
            table.push_numbers(row)?;
        }
        Ok(table)
    }

    fn point_table(&self) -> CtResult<InputTable> {
        let header = ["gid", "x", "y", "sf_id", "stkht", "stkdm", "stktmp", "stkvel"]
            .into_iter()
            .chain(EmissionFactors::COLUMNS)
            .chain(["in_port"]);
        let mut table = InputTable::new(header);
        for p in &self.points {
            let r = &p.record;
            let mut row = vec![
                r.gid as f64,
                p.position.x,
                p.position.y,
                or_no_data(r.sf_id),
                or_no_data(r.stkht),
                or_no_data(r.stkdm),
                or_no_data(r.stktmp),
                or_no_data(r.stkvel),
            ];
            row.extend(r.emissions.values());
            row.push(if r.in_port { 1.0 } else { 0.0 });
            table.push_numbers(row)?;
        }
        Ok(table)
    }

    fn vessel_table(&self) -> CtResult<InputTable> {
        let header = ["gid", "startx", "starty", "endx", "endy", "sf_id"]
            .into_iter()
            .chain(EmissionFactors::COLUMNS_PM2_5)
            .chain([
                "stack_height",
                "stack_diameter",
                "stack_velocity",
                "stack_temperature",
            ]);
        let mut table = InputTable::new(header);
        for vessel in &self.vessels {
            let r = &vessel.record;
            let mut row = vec![
                r.gid as f64,
                vessel.from.x,
                vessel.from.y,
                vessel.to.x,
                vessel.to.y,
                or_no_data(r.sf_id),
            ];
            row.extend(r.emissions.values());
            row.extend([
                or_no_data(r.stack_height),
                or_no_data(r.stack_diameter),
                or_no_data(r.stack_velocity),
                or_no_data(r.stack_temperature),
            ]);
            table.push_numbers(row)?;
        }
        Ok(table)
    }
}

// ============================================================
// SourceDataPreparer
// ============================================================

/// 排放源预处理器
#[derive(Debug, Clone, Default)]
pub struct SourceDataPreparer {
    projector: CoordinateProjector,
}

impl SourceDataPreparer {
    /// 使用默认投影创建
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用指定投影器创建
    pub fn with_projector(projector: CoordinateProjector) -> Self {
        Self { projector }
    }

    /// 投影器
    pub fn projector(&self) -> &CoordinateProjector {
        &self.projector
    }

    /// 预处理场景中所有被包含的类别
    pub fn prepare(&self, scenario: &Scenario) -> CtResult<PreparedSources> {
        let mut prepared = PreparedSources {
            categories: scenario.included_categories(),
            ..Default::default()
        };

        for category in prepared.categories.clone() {
            match category {
                SourceCategory::Road => {
                    prepared.road_segments = self.split_roads(&scenario.roads)?;
                }
                SourceCategory::Rail => {
                    prepared.railways = scenario
                        .railways
                        .iter()
                        .map(|r| {
                            self.linear(r.clone(), r.geometry.start(), r.geometry.end())
                        })
                        .collect::<CtResult<_>>()?;
                }
                SourceCategory::Vessel => {
                    prepared.vessels = scenario
                        .ships_in_transit
                        .iter()
                        .map(|v| {
                            let mut record = v.clone();
                            record.facility = sanitize_name(&record.facility);
                            self.linear(record, v.geometry.start(), v.geometry.end())
                        })
                        .collect::<CtResult<_>>()?;
                }
                SourceCategory::Point => {
                    prepared.points = scenario
                        .point_sources
                        .iter()
                        .map(|p| {
                            let mut record = p.clone();
                            record.pltname = sanitize_name(&record.pltname);
                            let (lon, lat) = p.location;
                            let position = self.projector.forward_point(Point2D::new(lon, lat))?;
                            Ok(PlacedPoint { record, position })
                        })
                        .collect::<CtResult<_>>()?;
                }
                SourceCategory::Area => {
                    for area in &scenario.area_sources {
                        prepared.area_facilities.push(sanitize_name(&area.facility));
                        for &(lon, lat) in area.geometry.points() {
                            let (x, y) = self.projector.forward(lon, lat)?;
                            prepared.area_vertices.push(AreaVertex {
                                object_id: area.gid,
                                sf_id: area.sf_id,
                                x,
                                y,
                                emissions: area.emissions,
                            });
                        }
                    }
                }
            }
        }

        debug!(
            scenario = %scenario.name,
            road_segments = prepared.road_segments.len(),
            area_vertices = prepared.area_vertices.len(),
            points = prepared.points.len(),
            railways = prepared.railways.len(),
            vessels = prepared.vessels.len(),
            "排放源预处理完成"
        );
        Ok(prepared)
    }

    /// 道路拆分
    ///
    /// 两个顶点的道路保持为一段；多于两个顶点时每对相邻顶点生成一段，
    /// 每段复制父道路的全部非几何属性。
    pub fn split_roads(&self, roads: &[Road]) -> CtResult<Vec<RoadSegment>> {
        let mut segments = Vec::with_capacity(roads.len());
        for road in roads {
            for (from, to) in road.geometry.segments() {
                segments.push(self.linear(road.clone(), from, to)?);
            }
        }
        Ok(segments)
    }

    fn linear<T>(&self, record: T, from: (f64, f64), to: (f64, f64)) -> CtResult<LinearSource<T>> {
        let from = self.projector.forward_point(from.into())?;
        let to = self.projector.forward_point(to.into())?;
        ensure!(
            from.is_finite() && to.is_finite(),
            CtError::projection("线源端点投影结果不是有限值")
        );
        Ok(LinearSource { record, from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn scenario() -> Scenario {
        Scenario::from_json_str(
            r#"{
                "name": "mixed",
                "roads": [
                    {"gid": 1, "id": 100, "sign1": "I-75", "aadt": 50000, "mph": 55,
                     "geometry": [[-84.40, 33.75], [-84.39, 33.75]]},
                    {"gid": 2, "id": 200, "aadt": 1000,
                     "geometry": [[-84.40, 33.70], [-84.39, 33.71], [-84.38, 33.71], [-84.37, 33.72]]}
                ],
                "area_sources": [
                    {"facility": "Rail Yard, North", "gid": 5, "sf_id": 7, "nox": 2.0,
                     "geometry": [[-84.5, 33.8], [-84.49, 33.8], [-84.49, 33.81], [-84.5, 33.8]]}
                ],
                "point_sources": [
                    {"pltname": "Power Plant, Unit 1", "gid": 3, "stkht": 60, "nox": 4.0,
                     "location": [-84.45, 33.77]}
                ],
                "railways": [
                    {"gid": 8, "rrowner1": "NS", "co": 0.5,
                     "geometry": [[-84.41, 33.74], [-84.40, 33.73], [-84.39, 33.72]]}
                ],
                "ships_in_transit": []
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Power Plant, Unit 1"), "Power_Plant_Unit_1");
        assert_eq!(sanitize_name("plain"), "plain");
    }

    #[test]
    fn test_road_splitting() {
        let prepared = SourceDataPreparer::new().prepare(&scenario()).unwrap();
        // 1 段 + 3 段
        assert_eq!(prepared.road_segments.len(), 4);
        let children: Vec<_> = prepared.road_segments[1..]
            .iter()
            .map(|s| s.record.id)
            .collect();
        assert_eq!(children, vec![Some(200.0); 3]);
        // 相邻段首尾相接
        assert_eq!(prepared.road_segments[1].to, prepared.road_segments[2].from);
    }

    #[test]
    fn test_segment_endpoints_are_planar() {
        let preparer = SourceDataPreparer::new();
        let prepared = preparer.prepare(&scenario()).unwrap();
        let seg = &prepared.road_segments[0];
        let (x, y) = preparer.projector().forward(-84.40, 33.75).unwrap();
        assert_relative_eq!(seg.from.x, x);
        assert_relative_eq!(seg.from.y, y);
        // 经度 0.01° 在 33.75°N 约 925 m
        assert!(seg.length() > 900.0 && seg.length() < 950.0);
    }

    #[test]
    fn test_area_vertex_expansion() {
        let prepared = SourceDataPreparer::new().prepare(&scenario()).unwrap();
        assert_eq!(prepared.area_vertices.len(), 4);
        assert!(prepared
            .area_vertices
            .iter()
            .all(|v| v.object_id == 5 && v.emissions.nox == Some(2.0)));
        assert_eq!(prepared.area_facilities, vec!["Rail_Yard_North".to_string()]);
    }

    #[test]
    fn test_point_name_sanitized() {
        let prepared = SourceDataPreparer::new().prepare(&scenario()).unwrap();
        assert_eq!(prepared.points[0].record.pltname, "Power_Plant_Unit_1");
    }

    #[test]
    fn test_empty_category_not_included() {
        let prepared = SourceDataPreparer::new().prepare(&scenario()).unwrap();
        assert!(!prepared.includes(SourceCategory::Vessel));
        assert_eq!(
            prepared.categories,
            vec![
                SourceCategory::Area,
                SourceCategory::Point,
                SourceCategory::Rail,
                SourceCategory::Road
            ]
        );
    }

    #[test]
    fn test_road_table_excludes_gid_sign_geometry() {
        let prepared = SourceDataPreparer::new().prepare(&scenario()).unwrap();
        let table = prepared.table(SourceCategory::Road).unwrap();
        assert_eq!(table.len(), 4);
        assert!(!table.header().iter().any(|h| h == "gid" || h == "sign1" || h == "geom"));
        let csv = table.to_csv_string().unwrap();
        let first_row = csv.lines().nth(1).unwrap();
        assert!(first_row.starts_with("100,"));
        // 缺失的 sf_id 写为 -999，倍数默认为 1
        assert!(first_row.contains(",-999,"));
        assert!(first_row.ends_with(",1,1,1,1"));
    }

    #[test]
    fn test_point_table_excludes_name() {
        let prepared = SourceDataPreparer::new().prepare(&scenario()).unwrap();
        let table = prepared.table(SourceCategory::Point).unwrap();
        assert_eq!(table.header()[0], "gid");
        assert_eq!(table.header().len(), 8 + 13 + 1);
        assert!(!table.to_csv_string().unwrap().contains("Power"));
    }

    #[test]
    fn test_area_table_columns() {
        let prepared = SourceDataPreparer::new().prepare(&scenario()).unwrap();
        let table = prepared.table(SourceCategory::Area).unwrap();
        assert_eq!(&table.header()[..5], &["object_id", "sf_id", "x", "y", "nox"]);
        assert_eq!(table.header()[6], "pm2_5");
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_rail_uses_first_and_last_vertex() {
        let preparer = SourceDataPreparer::new();
        let prepared = preparer.prepare(&scenario()).unwrap();
        let rail = &prepared.railways[0];
        let (x, _) = preparer.projector().forward(-84.39, 33.72).unwrap();
        assert_relative_eq!(rail.to.x, x);
    }
}
