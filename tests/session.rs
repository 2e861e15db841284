use std::io::Write;

use geojson::Feature;
use panomapper::catalog::{extract_tiles, parse_feature_collection};
use panomapper::config::Config;
use panomapper::detections::DetectionFilter;
use panomapper::tiles::{DuplicatePolicy, FieldSpan, NamingConvention};
use panomapper::{GeoPoint, Session};

fn square(name: &str, x: f64, y: f64) -> String {
    format!(
        r#"{{"type": "Feature", "properties": {{"name": "{name}"}},
            "geometry": {{"type": "Polygon", "coordinates": [[[{x}, {y}], [{x1}, {y}], [{x1}, {y1}], [{x}, {y1}], [{x}, {y}]]]}}}}"#,
        name = name,
        x = x,
        y = y,
        x1 = x + 5.0,
        y1 = y + 5.0,
    )
}

fn catalog() -> String {
    let tiles = [
        square("GRID_0010-0020", 10.0, 20.0),
        square("GRID_0015-0020", 15.0, 20.0),
        square("GRID_0005-0020", 5.0, 20.0),
        square("GRID_0010-0025", 10.0, 25.0),
        square("GRID_0010-0015", 10.0, 15.0),
    ];
    format!(
        r#"{{"type": "FeatureCollection", "features": [{}]}}"#,
        tiles.join(",")
    )
}

const DETECTIONS: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {"type": "Feature", "properties": {"tile": "GRID_0010-0020", "id": 1},
         "geometry": {"type": "Point", "coordinates": [12.0, 22.0]}},
        {"type": "Feature", "properties": {"tile": "GRID_9999-9999", "id": 2},
         "geometry": {"type": "Point", "coordinates": [0.0, 0.0]}},
        {"type": "Feature", "properties": {"tile": "GRID_0010-0020", "id": 3},
         "geometry": {"type": "Point", "coordinates": [13.0, 23.0]}},
        {"type": "Feature", "properties": {"tile": "GRID_0015-0020", "id": 4},
         "geometry": {"type": "Point", "coordinates": [16.0, 21.0]}}
    ]
}"#;

fn convention() -> NamingConvention {
    NamingConvention::new(FieldSpan::new(5, 4), FieldSpan::new(10, 4), 5).unwrap()
}

fn session() -> Session {
    let tiles = extract_tiles(parse_feature_collection(&catalog(), "tiles").unwrap(), "name").tiles;
    let detections = parse_feature_collection(DETECTIONS, "detections").unwrap();
    Session::new(
        tiles,
        detections,
        convention(),
        DuplicatePolicy::Warn,
        DetectionFilter::default(),
    )
    .unwrap()
}

fn ids(features: &[Feature]) -> Vec<u64> {
    features
        .iter()
        .filter_map(|f| f.properties.as_ref()?.get("id")?.as_u64())
        .collect()
}

#[test]
fn test_neighborhood_of_center_tile() {
    let session = session();
    let area = session.query(Some(GeoPoint::new(22.5, 12.5)));

    assert_eq!(area.center_tile.as_deref(), Some("GRID_0010-0020"));
    for name in [
        "GRID_0010-0020",
        "GRID_0015-0020",
        "GRID_0005-0020",
        "GRID_0010-0025",
        "GRID_0010-0015",
    ] {
        assert!(area.tiles.iter().any(|t| t == name), "missing {}", name);
    }
    assert_eq!(area.tiles.len(), 5);
    assert_eq!(ids(&area.detections.features), vec![1, 3, 4]);
}

#[test]
fn test_round_trip_over_catalog() {
    let session = session();
    let codec = session.resolver().convention();
    for name in session.resolver().index().names() {
        let (line, row) = codec.parse(name).unwrap();
        assert_eq!(codec.format(line, row, name).unwrap(), name);
    }
}

#[test]
fn test_edge_tile_has_fewer_neighbours() {
    let session = session();
    let area = session.query(Some(GeoPoint::new(21.0, 17.0)));

    assert_eq!(area.center_tile.as_deref(), Some("GRID_0015-0020"));
    // East column absent; the west column is reached diagonally
    assert_eq!(
        area.tiles,
        vec![
            "GRID_0010-0015",
            "GRID_0010-0020",
            "GRID_0010-0025",
            "GRID_0015-0020"
        ]
    );
}

#[test]
fn test_outside_coverage_is_empty() {
    let session = session();
    let area = session.query(Some(GeoPoint::new(-40.0, 120.0)));

    assert!(area.center_tile.is_none());
    assert!(area.tiles.is_empty());
    assert!(area.detections.features.is_empty());
}

#[test]
fn test_unresolved_address_is_empty() {
    // Geocoder found nothing: no point, not (0, 0)
    let session = session();
    let area = session.query(None);

    assert!(area.point.is_none());
    assert!(area.tiles.is_empty());
    assert!(area.detections.features.is_empty());
}

#[test]
fn test_query_leaves_dataset_untouched() {
    let session = session();
    session.query(Some(GeoPoint::new(22.5, 12.5)));
    session.query(Some(GeoPoint::new(-40.0, 120.0)));
    assert_eq!(session.detection_count(), 4);

    let again = session.query(Some(GeoPoint::new(22.5, 12.5)));
    assert_eq!(again.detections.features.len(), 3);
}

#[tokio::test]
async fn test_load_from_files() {
    let mut tiles = tempfile::NamedTempFile::new().unwrap();
    tiles.write_all(catalog().as_bytes()).unwrap();
    let mut detections = tempfile::NamedTempFile::new().unwrap();
    detections.write_all(DETECTIONS.as_bytes()).unwrap();

    let config = Config::from_toml(&format!(
        r#"
        [catalog]
        tiles = "{}"
        detections = "{}"
        name_property = "name"

        [naming]
        line_offset = 5
        row_offset = 10
        "#,
        tiles.path().display(),
        detections.path().display()
    ))
    .unwrap();

    let session = Session::load(&config).await.unwrap();
    assert_eq!(session.tile_count(), 5);
    assert_eq!(session.detection_count(), 4);
    assert!(session.tile("GRID_0010-0025").is_some());
}

#[tokio::test]
async fn test_load_missing_catalog_fails() {
    let config = Config::from_toml(
        r#"
        [catalog]
        tiles = "/nonexistent/tiles.geojson"
        detections = "/nonexistent/detections.geojson"
        "#,
    )
    .unwrap();

    assert!(Session::load(&config).await.is_err());
}

#[tokio::test]
async fn test_load_skips_unusable_tiles() {
    let catalog = catalog().replacen(
        r#""features": ["#,
        r#""features": [{"type": "Feature", "properties": {"name": "GRID_0020-0020"}, "geometry": null},"#,
        1,
    );
    let mut tiles = tempfile::NamedTempFile::new().unwrap();
    tiles.write_all(catalog.as_bytes()).unwrap();
    let mut detections = tempfile::NamedTempFile::new().unwrap();
    detections.write_all(DETECTIONS.as_bytes()).unwrap();

    let config = Config::from_toml(&format!(
        r#"
        [catalog]
        tiles = "{}"
        detections = "{}"
        name_property = "name"

        [naming]
        line_offset = 5
        row_offset = 10
        "#,
        tiles.path().display(),
        detections.path().display()
    ))
    .unwrap();

    let session = Session::load(&config).await.unwrap();
    assert_eq!(session.tile_count(), 5);
    assert!(session.tile("GRID_0020-0020").is_none());
}
