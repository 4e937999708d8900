// crates/ct_sources/tests/scenario_tables.rs

//! 场景加载到输入表写出的集成测试

use ct_sources::prelude::*;
use ct_sources::NO_DATA;

const SCENARIO: &str = r#"{
    "name": "Port Expansion",
    "hour": 8,
    "season": 2,
    "roads": [
        {"gid": 11, "id": 1, "aadt": 30000, "mph": 45,
         "geometry": [[-81.10, 32.08], [-81.09, 32.08], [-81.08, 32.09]]}
    ],
    "ships_in_transit": [
        {"facility": "Harbor Lane, East", "gid": 4, "nox": 1.25, "stack_height": 30,
         "geometry": [[-81.05, 32.07], [-81.00, 32.05]]}
    ],
    "include_ships_in_transit": true,
    "include_point_sources": false
}"#;

#[test]
fn test_load_prepare_and_write_tables() {
    let dir = tempfile::tempdir().unwrap();
    let scenario_path = dir.path().join("scenario.json");
    std::fs::write(&scenario_path, SCENARIO).unwrap();

    let scenario = Scenario::from_file(&scenario_path).unwrap();
    assert_eq!(scenario.safe_name(), "Port_Expansion");
    assert_eq!(scenario.hour, Some(8));

    let prepared = SourceDataPreparer::new().prepare(&scenario).unwrap();
    assert_eq!(
        prepared.categories,
        vec![SourceCategory::Road, SourceCategory::Vessel]
    );
    assert_eq!(prepared.road_segments.len(), 2);
    assert_eq!(prepared.vessels[0].record.facility, "Harbor_Lane_East");

    for category in prepared.categories.clone() {
        let table = prepared.table(category).unwrap();
        table
            .write_csv(&dir.path().join(category.input_file_name()))
            .unwrap();
    }

    let sit = std::fs::read_to_string(dir.path().join("sit.csv")).unwrap();
    let mut lines = sit.lines();
    let header: Vec<_> = lines.next().unwrap().split(',').collect();
    assert_eq!(header[0], "gid");
    assert_eq!(header.last(), Some(&"stack_temperature"));
    let row: Vec<f64> = lines
        .next()
        .unwrap()
        .split(',')
        .map(|c| c.parse().unwrap())
        .collect();
    assert_eq!(row.len(), header.len());
    assert_eq!(row[0], 4.0);
    assert_eq!(row[6], 1.25);
    assert_eq!(row[7], NO_DATA);

    let roads = std::fs::read_to_string(dir.path().join("roads.csv")).unwrap();
    assert_eq!(roads.lines().count(), 3);
    assert!(!dir.path().join("points.csv").exists());
}

#[test]
fn test_bounds_cover_all_included_geometry() {
    let scenario = Scenario::from_json_str(SCENARIO).unwrap();
    let b = scenario.bounds().unwrap();
    assert_eq!(b.min_lon, -81.10);
    assert_eq!(b.max_lon, -81.00);
    assert_eq!(b.min_lat, 32.05);
    assert_eq!(b.max_lat, 32.09);
}

#[test]
fn test_invalid_geometry_rejected_at_load() {
    let json = r#"{"name": "bad", "roads": [{"id": 1, "geometry": [[-81.0, 32.0]]}]}"#;
    assert!(Scenario::from_json_str(json).is_err());
}
