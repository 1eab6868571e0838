//! JSON map files.

use crate::error::MapError;
use crate::geom::Xy;
use crate::grid::Grid;
use crate::layer::TileLayer;
use crate::map::MapRenderData;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
struct JsonLayer {
    #[serde(default)]
    tileset: String,
    #[serde(default)]
    can_walk: bool,
    #[serde(default = "default_color")]
    color: String,
    #[serde(default)]
    map: Vec<u8>,
}

fn default_color() -> String {
    "#ffffff".to_string()
}

#[derive(Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
struct JsonMap {
    #[serde(default)]
    start: Xy,
    map_data_size: Xy,
    layers: Vec<JsonLayer>,
}

fn map_from_json(j: JsonMap) -> Result<MapRenderData, MapError> {
    let size = j.map_data_size;
    if size.x < 0 || size.y < 0 {
        return Err(MapError::InvalidMap(format!(
            "negative map size {}x{}",
            size.x, size.y
        )));
    }

    let mut layers = Vec::with_capacity(j.layers.len());
    for (i, l) in j.layers.into_iter().enumerate() {
        let found = l.map.len();
        // anything non-zero counts as occupied
        let cells = l.map.into_iter().map(|v| u8::from(v != 0)).collect();
        let map = Grid::from_vec(size, cells).ok_or(MapError::InvalidLayerSize {
            layer: i,
            expected: size.area(),
            found,
        })?;
        layers.push(TileLayer {
            tileset: l.tileset,
            can_walk: l.can_walk,
            color: l.color,
            map,
        });
    }

    let data = MapRenderData {
        start: j.start,
        map_data_size: size,
        layers,
    };
    data.validate()?;
    Ok(data)
}

fn map_to_json(data: &MapRenderData) -> JsonMap {
    JsonMap {
        start: data.start,
        map_data_size: data.map_data_size,
        layers: data
            .layers
            .iter()
            .map(|l| JsonLayer {
                tileset: l.tileset.clone(),
                can_walk: l.can_walk,
                color: l.color.clone(),
                map: l.map.as_slice().to_vec(),
            })
            .collect(),
    }
}

/// Parses a map from an in-memory JSON string
pub fn decode_map_str(txt: &str) -> Result<MapRenderData, MapError> {
    let j: JsonMap = serde_json::from_str(txt)?;
    map_from_json(j)
}

/// Reads and parses a `.json` map file
pub fn decode_map_file(path: impl AsRef<Path>) -> Result<MapRenderData, MapError> {
    let p = path.as_ref();
    if p.extension().and_then(|e| e.to_str()) != Some("json") {
        return Err(MapError::UnsupportedFormat(p.display().to_string()));
    }

    let txt = std::fs::read_to_string(p).map_err(|source| MapError::Io {
        path: p.to_path_buf(),
        source,
    })?;
    let j: JsonMap = serde_json::from_str(&txt).map_err(|source| MapError::Json {
        path: p.to_path_buf(),
        source,
    })?;

    map_from_json(j)
}

/// Serializes a map to its JSON file form
pub fn encode_map(data: &MapRenderData) -> Result<String, MapError> {
    Ok(serde_json::to_string(&map_to_json(data))?)
}

/// Writes a map to `path` as JSON
pub fn save_map_file(path: impl AsRef<Path>, data: &MapRenderData) -> Result<(), MapError> {
    let p = path.as_ref();
    let txt = encode_map(data)?;
    std::fs::write(p, txt).map_err(|source| MapError::Io {
        path: p.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const TWO_BY_TWO: &str = r##"{
      "Start": {"x": 1, "y": 0},
      "MapDataSize": {"x": 2, "y": 2},
      "Layers": [
        {"Tileset": "Grass-Md-Rough", "CanWalk": true, "Color": "#24a326", "Map": [1, 0, 1, 1]}
      ]
    }"##;

    #[test]
    fn decodes_layers_in_row_major_order() {
        let data = decode_map_str(TWO_BY_TWO).expect("decode");
        assert_eq!(data.start, Xy::new(1, 0));
        assert_eq!(data.layers.len(), 1);
        let layer = &data.layers[0];
        assert_eq!(layer.tileset, "Grass-Md-Rough");
        assert_eq!(layer.map.value(1, 0), 0);
        assert_eq!(layer.map.value(1, 1), 1);
    }

    #[test]
    fn file_round_trip_preserves_cells() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("map.json");
        let data = decode_map_str(TWO_BY_TWO).expect("decode");

        save_map_file(&path, &data).expect("save");
        let back = decode_map_file(&path).expect("reload");
        assert_eq!(back, data);
    }

    #[test]
    fn returns_typed_error_for_malformed_json() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("map.json");
        fs::write(&path, "{ not json").expect("failed to write map");

        let err = decode_map_file(&path).err().expect("expected decode error");
        assert!(matches!(err, MapError::Json { .. }));
    }

    #[test]
    fn returns_typed_error_for_missing_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = decode_map_file(dir.path().join("missing.json"))
            .err()
            .expect("expected decode error");
        assert!(matches!(err, MapError::Io { .. }));
    }

    #[test]
    fn rejects_too_many_layers() {
        let layer = r#"{"Tileset":"a","Map":[0]}"#;
        let layers = vec![layer; 9].join(",");
        let json = format!(r#"{{"MapDataSize":{{"x":1,"y":1}},"Layers":[{layers}]}}"#);
        let err = decode_map_str(&json).unwrap_err();
        assert!(matches!(err, MapError::LayerCount(9)));
    }

    #[test]
    fn rejects_negative_size() {
        let json = r#"{"MapDataSize":{"x":-1,"y":2},"Layers":[{"Map":[]}]}"#;
        assert!(matches!(
            decode_map_str(json).unwrap_err(),
            MapError::InvalidMap(_)
        ));
    }
}
