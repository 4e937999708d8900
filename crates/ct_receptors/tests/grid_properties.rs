// crates/ct_receptors/tests/grid_properties.rs

//! 接收点网格的性质测试

use ct_geo::{CoordinateProjector, GeoBounds};
use ct_receptors::prelude::*;
use ct_sources::{Scenario, SourceDataPreparer};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn test_background_grid_for_random_boxes() {
    let mut rng = StdRng::seed_from_u64(7);
    let builder = ReceptorGridBuilder::new();

    for _ in 0..20 {
        let lon0 = rng.gen_range(-120.0..-75.0);
        let lat0 = rng.gen_range(28.0..46.0);
        let bounds = GeoBounds::new(
            lon0,
            lat0,
            lon0 + rng.gen_range(0.01..1.0),
            lat0 + rng.gen_range(0.01..1.0),
        );
        let set = builder.build(&bounds, &[]).unwrap();
        assert_eq!(set.len(), 2500);
        let ids: Vec<u64> = set.iter().map(|r| r.id).collect();
        assert!(ids.windows(2).all(|w| w[1] == w[0] + 1));
        assert_eq!(ids[0], 1);
        assert!(set.iter().all(|r| bounds.contains_strict(r.lon, r.lat)));
    }
}

#[test]
fn test_road_receptors_follow_background() {
    let projector = CoordinateProjector::new();
    let (x, y) = projector.forward(-84.40, 33.75).unwrap();
    let (lon1, lat1) = projector.inverse(x + 1000.0, y).unwrap();

    let json = format!(
        r#"{{"name": "one road", "roads": [{{"id": 1, "geometry": [[-84.40, 33.75], [{lon1}, {lat1}]]}}]}}"#
    );
    let scenario = Scenario::from_json_str(&json).unwrap();
    let prepared = SourceDataPreparer::new().prepare(&scenario).unwrap();
    assert_eq!(prepared.road_segments.len(), 1);
    assert!((prepared.road_segments[0].length() - 1000.0).abs() < 1e-6);

    let bounds = GeoBounds::new(-84.45, 33.70, -84.35, 33.80);
    let set = ReceptorGridBuilder::new()
        .build(&bounds, &prepared.road_segments)
        .unwrap();

    assert_eq!(set.background_count(), 2500);
    assert_eq!(set.road_count(), 25);
    assert_eq!(set.len(), 2525);
    let road_ids: Vec<u64> = set.receptors()[2500..].iter().map(|r| r.id).collect();
    assert_eq!(road_ids, (2501..=2525).collect::<Vec<_>>());
}
