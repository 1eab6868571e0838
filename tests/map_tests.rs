// tests/map_tests.rs

use macroquad_gridmap::{MapData, MapError, MapEvent, TileLayerSpec, Xy};

const BAD_LAYER_SIZE: &str = r#"
{
  "MapDataSize": { "x": 2, "y": 2 },
  "Layers": [
    { "Tileset": "ok", "Map": [1,1,1,1] },
    { "Tileset": "oops", "Map": [1,0,1] }
  ]
}
"#;

#[test]
fn error_on_layer_size_mismatch() {
    let mut map = MapData::with_rng_seed(1);
    let err = map.load_from_str(BAD_LAYER_SIZE).unwrap_err();
    assert!(matches!(
        err,
        MapError::InvalidLayerSize { layer: 1, expected: 4, found: 3 }
    ));
    assert!(map.data().is_none());
}

const JSON_WITH_EXTRA: &str = r#"
{
  "MapDataSize": { "x": 1, "y": 1 },
  "DummyField": "ignored",
  "Layers": [
    {
      "Tileset": "L",
      "Map": [1],
      "Opacity": 0.5,
      "Properties": []
    }
  ]
}
"#;

#[test]
fn load_ignores_extra_fields() {
    let mut map = MapData::with_rng_seed(1);
    map.load_from_str(JSON_WITH_EXTRA).expect("Should ignore unknown fields");
    let layer = map.layer(0).unwrap();
    assert_eq!(layer.tileset, "L");
    assert_eq!(layer.map.as_slice(), &[1]);
    // defaults for what the file leaves out
    assert_eq!(layer.color, "#ffffff");
    assert_eq!(map.start(), Xy::ZERO);
}

const EMPTY_NAME_JSON: &str = r#"
{
  "MapDataSize": { "x": 1, "y": 1 },
  "Layers": [ { "Tileset": "", "Map": [7] } ]
}
"#;

#[test]
fn load_allows_empty_tileset_name() {
    let mut map = MapData::with_rng_seed(1);
    map.load_from_str(EMPTY_NAME_JSON).unwrap();
    assert_eq!(map.layer(0).unwrap().tileset, "");
    // stored as occupied
    assert_eq!(map.get_map_data(0, 0, 0), 1);
}

#[test]
fn zero_layers_are_rejected() {
    let mut map = MapData::with_rng_seed(1);
    let err = map
        .load_from_str(r#"{"MapDataSize":{"x":1,"y":1},"Layers":[]}"#)
        .unwrap_err();
    assert!(matches!(err, MapError::LayerCount(0)));
}

#[test]
fn layer_edits_emit_in_order() {
    let mut map = MapData::with_rng_seed(1);
    map.load_from_str(
        r#"{"MapDataSize":{"x":2,"y":2},"Layers":[{"Tileset":"a","CanWalk":true,"Map":[1,1,1,1]}]}"#,
    )
    .unwrap();
    let events = map.subscribe();

    assert!(map.add_layer(1, &TileLayerSpec::default(), 0));
    assert!(map.set_layer_color(1, "#336699"));
    assert!(map.set_map_data(1, 1, 1, 1));
    assert!(!map.set_map_data(5, 5, 1, 1));
    assert!(map.remove_layer(0));

    let got: Vec<MapEvent> = events.try_iter().collect();
    assert_eq!(
        got,
        vec![
            MapEvent::LayerAdded(1),
            MapEvent::LayerUpdated(1),
            MapEvent::CellsUpdated { x: 1, y: 1, layer: 1 },
            MapEvent::LayerRemoved(0),
        ]
    );
    assert_eq!(map.layer_count(), 1);
}
