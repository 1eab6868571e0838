// tests/load_tests.rs

use std::fs;
use macroquad_gridmap::{MapData, MapError, Xy};

const ONE_LAYER: &str = r##"
{
    "Start": { "x": 1, "y": 1 },
    "MapDataSize": { "x": 3, "y": 3 },
    "Layers": [
        { "Tileset": "Sand-Md-Rough", "CanWalk": true, "Color": "#ffe08a", "Map": [1,1,1, 1,1,1, 1,1,1] }
    ]
}
"##;

#[test]
fn integration_load_from_file_and_str() {
    // Inline JSON
    let mut map = MapData::with_rng_seed(1);
    map.load_from_str(ONE_LAYER).expect("should parse inline JSON");
    assert_eq!(map.size(), Xy::new(3, 3));
    assert_eq!(map.start(), Xy::new(1, 1));

    // File-based
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test_map_integration.json");
    fs::write(&path, ONE_LAYER).unwrap();
    let mut map2 = MapData::with_rng_seed(1);
    map2.load_from_file(&path).unwrap();
    assert_eq!(map2.layer(0).unwrap().tileset, "Sand-Md-Rough");
}

#[test]
fn integration_unsupported_format() {
    let mut map = MapData::with_rng_seed(1);
    let err = map.load_from_file("foo.tmx").unwrap_err();
    match err {
        MapError::UnsupportedFormat(ext) => assert_eq!(ext, "foo.tmx"),
        other => panic!("expected UnsupportedFormat, got {:?}", other),
    }
}

#[test]
fn save_then_load_is_identical() {
    let mut map = MapData::with_rng_seed(1);
    map.load_from_str(ONE_LAYER).unwrap();
    map.set_map_data(0, 2, 0, 0);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("saved.json");
    map.save_to_file(&path).unwrap();

    let mut back = MapData::with_rng_seed(2);
    back.load_from_file(&path).unwrap();
    assert_eq!(back.data(), map.data());
    assert_eq!(back.get_map_data(0, 2, 0), 0);
}

#[test]
fn malformed_load_keeps_previous_map() {
    let mut map = MapData::with_rng_seed(1);
    map.load_from_str(ONE_LAYER).unwrap();
    let before = map.data().cloned();
    let events = map.subscribe();

    assert!(matches!(map.load_from_str("{ \"Layers\": 3 }"), Err(MapError::Parse(_))));
    assert_eq!(map.data().cloned(), before);
    // nothing was announced
    assert!(events.try_recv().is_err());
}

#[test]
fn save_without_map_is_an_error() {
    let map = MapData::with_rng_seed(1);
    assert!(matches!(map.save_to_string(), Err(MapError::InvalidMap(_))));
}
