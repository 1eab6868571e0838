//! The map model: generation, queries, edits and persistence.

use crate::autotile::NeighborCode;
use crate::error::MapError;
use crate::events::{MapEvent, Subscribers};
use crate::geom::Xy;
use crate::layer::{NoiseLayer, TileData, TileLayer, TileLayerSpec, MAX_LAYERS, MIN_LAYERS};
use crate::loader::json_loader::{decode_map_file, decode_map_str, encode_map, save_map_file};
use crate::noise_gen::{random_seed, NoiseGenerator};
use rand::Rng;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::mpsc::Receiver;
use std::time::Instant;

const START_SEARCH_TRIES: usize = 300;

/// The map being edited: size, start location and tile layers
#[derive(Debug, Clone, PartialEq)]
pub struct MapRenderData {
    /// Where the camera starts
    pub start: Xy,
    /// Width and height in cells
    pub map_data_size: Xy,
    /// Tile layers, bottom to top
    pub layers: Vec<TileLayer>,
}

impl MapRenderData {
    /// Checks size, layer count and that every layer covers the whole map
    pub fn validate(&self) -> Result<(), MapError> {
        let size = self.map_data_size;
        if size.x < 0 || size.y < 0 {
            return Err(MapError::InvalidMap(format!(
                "negative map size {}x{}",
                size.x, size.y
            )));
        }
        if !(MIN_LAYERS..=MAX_LAYERS).contains(&self.layers.len()) {
            return Err(MapError::LayerCount(self.layers.len()));
        }
        for (i, layer) in self.layers.iter().enumerate() {
            if layer.map.size() != size {
                return Err(MapError::InvalidLayerSize {
                    layer: i,
                    expected: size.area(),
                    found: layer.map.len(),
                });
            }
        }
        Ok(())
    }
}

/// Input of [`MapData::generate_request`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GenerationRequest {
    /// Map size in cells
    pub size: Xy,
    /// Requested start location
    #[serde(default)]
    pub start: Xy,
    /// Noise fields, bottom to top
    #[serde(default)]
    pub noise_layers: Vec<NoiseLayer>,
}

impl Default for GenerationRequest {
    fn default() -> Self {
        crate::config::random_map_request()
    }
}

/// Tileset and neighbor code of one displayed tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridMapTileData<'a> {
    /// Tileset of the layer
    pub tileset: &'a str,
    /// Occupancy of the 2×2 block starting at the cell
    pub code: NeighborCode,
}

/// Owner of the live map. Every change is followed by a [`MapEvent`].
pub struct MapData {
    data: Option<MapRenderData>,
    noise: NoiseGenerator,
    rng: ChaCha8Rng,
    subscribers: Subscribers<MapEvent>,
}

impl Default for MapData {
    fn default() -> Self {
        MapData::new()
    }
}

impl MapData {
    /// Empty map data with an entropy-seeded RNG
    pub fn new() -> Self {
        MapData {
            data: None,
            noise: NoiseGenerator::default(),
            rng: ChaCha8Rng::from_entropy(),
            subscribers: Subscribers::default(),
        }
    }

    /// Empty map data whose random choices (seed 0 substitution, start
    /// search) are repeatable
    pub fn with_rng_seed(seed: u64) -> Self {
        MapData {
            rng: ChaCha8Rng::seed_from_u64(seed),
            ..MapData::new()
        }
    }

    /// Receiver for every event emitted from now on
    pub fn subscribe(&mut self) -> Receiver<MapEvent> {
        self.subscribers.subscribe()
    }

    /// Current map, if one has been generated or loaded
    pub fn data(&self) -> Option<&MapRenderData> {
        self.data.as_ref()
    }

    /// Map size, `(0, 0)` with no map
    pub fn size(&self) -> Xy {
        self.data.as_ref().map_or(Xy::ZERO, |d| d.map_data_size)
    }

    /// Start location, `(0, 0)` with no map
    pub fn start(&self) -> Xy {
        self.data.as_ref().map_or(Xy::ZERO, |d| d.start)
    }

    /// Number of tile layers
    pub fn layer_count(&self) -> usize {
        self.data.as_ref().map_or(0, |d| d.layers.len())
    }

    /// Layer at `idx`
    pub fn layer(&self, idx: usize) -> Option<&TileLayer> {
        self.data.as_ref().and_then(|d| d.layers.get(idx))
    }

    /// Runs [`MapData::generate`] with a request's fields
    pub fn generate_request(&mut self, request: &GenerationRequest) -> Vec<u32> {
        self.generate(request.size, request.start, &request.noise_layers)
    }

    /// Generates the default 512×512 terrain with a random seed
    pub fn generate_random(&mut self) -> Vec<u32> {
        self.generate_request(&crate::config::random_map_request())
    }

    /// Replaces the map with one generated from noise.
    ///
    /// Tile layers of all noise layers are stacked in order; each cell whose
    /// noise value lies in a layer's range is marked occupied in that layer.
    /// Returns the seed used for each noise layer.
    pub fn generate(&mut self, size: Xy, start: Xy, noise_layers: &[NoiseLayer]) -> Vec<u32> {
        let tile_layer_count: usize = noise_layers.iter().map(|n| n.tile_layers.len()).sum();
        if tile_layer_count == 0 {
            log::warn!("generate called without tile layers, keeping current map");
            return Vec::new();
        }
        if tile_layer_count > MAX_LAYERS {
            log::warn!(
                "{} tile layers requested, only the first {} are generated",
                tile_layer_count,
                MAX_LAYERS
            );
        }

        let started = Instant::now();
        self.subscribers.emit(MapEvent::Loading);

        let size = Xy::new(size.x.max(0), size.y.max(0));
        let mut layers: Vec<TileLayer> = Vec::with_capacity(tile_layer_count.min(MAX_LAYERS));
        let mut seeds = Vec::with_capacity(noise_layers.len());

        for noise_layer in noise_layers {
            let requested = match noise_layer.seed {
                0 => random_seed(&mut self.rng),
                s => s,
            };
            let seed = self.noise.seed(requested);
            seeds.push(seed);

            let take = noise_layer
                .tile_layers
                .len()
                .min(MAX_LAYERS - layers.len());
            let specs = &noise_layer.tile_layers[..take];
            let first = layers.len();
            layers.extend(specs.iter().map(|spec| TileLayer::from_spec(spec, size, 0)));
            self.classify(noise_layer, specs, &mut layers[first..], size);

            for (i, (spec, layer)) in specs.iter().zip(&mut layers[first..]).enumerate() {
                let modifier_seed = (u64::from(seed) << 8) | (first + i) as u64;
                spec.modifier_name
                    .apply(spec.modifier_rate, &mut layer.map, modifier_seed);
            }
            log::debug!(
                "noise layer seed {} classified into {} tile layers",
                seed,
                specs.len()
            );
        }

        self.data = Some(MapRenderData {
            start,
            map_data_size: size,
            layers,
        });
        self.set_walkable_start();

        log::info!(
            "generated {}x{} map, {} layers, start {:?} in {:.2?}",
            size.x,
            size.y,
            self.layer_count(),
            self.start(),
            started.elapsed()
        );
        self.subscribers.emit(MapEvent::Loaded);
        seeds
    }

    fn classify(
        &self,
        noise_layer: &NoiseLayer,
        specs: &[TileLayerSpec],
        layers: &mut [TileLayer],
        size: Xy,
    ) {
        if specs.is_empty() {
            return;
        }
        for y in 0..size.y {
            for x in 0..size.x {
                let value = self.noise.sample_2d_octaves(
                    f64::from(x) / f64::from(size.x) * noise_layer.zoom,
                    f64::from(y) / f64::from(size.y) * noise_layer.zoom,
                    noise_layer.octaves,
                    noise_layer.persistence,
                );
                for (spec, layer) in specs.iter().zip(layers.iter_mut()) {
                    if spec.contains(value) {
                        layer.map.set(x, y, 1);
                    }
                }
            }
        }
    }

    /// Moves the start onto a walkable cell when it is not already on one.
    ///
    /// Tries random cells in `[2, size-2]` and takes the first walkable one
    /// that is not fully enclosed. After the last try the start stays on the
    /// last candidate.
    pub fn set_walkable_start(&mut self) {
        let Some(data) = self.data.as_ref() else {
            return;
        };
        let (size, start) = (data.map_data_size, data.start);

        if !self.is_outside_of_map(start) && self.get_top_most_map_data(start).can_walk {
            return;
        }
        if size.x < 4 || size.y < 4 {
            log::debug!("map too small to search for a start location");
            return;
        }

        let mut candidate = start;
        let mut found = false;
        for _ in 0..START_SEARCH_TRIES {
            candidate = Xy::new(
                self.rng.gen_range(2..=size.x - 2),
                self.rng.gen_range(2..=size.y - 2),
            );
            let top = self.get_top_most_map_data(candidate);
            if top.can_walk
                && !self
                    .neighbor_code(candidate.x, candidate.y, top.layer as usize)
                    .is_solid()
            {
                found = true;
                break;
            }
        }
        if !found {
            log::warn!("no walkable start found, using {:?}", candidate);
        }
        if let Some(data) = self.data.as_mut() {
            data.start = candidate;
        }
    }

    /// True unless `c` is at least one cell away from every edge
    pub fn is_outside_of_map(&self, c: Xy) -> bool {
        let size = self.size();
        c.x < 1 || c.y < 1 || c.x >= size.x - 1 || c.y >= size.y - 1
    }

    /// Occupancy of a cell, 0 out of range
    pub fn get_map_data(&self, x: i32, y: i32, layer: usize) -> u8 {
        self.layer(layer).map_or(0, |l| l.map.value(x, y))
    }

    /// Highest occupied layer at `c`
    pub fn get_top_most_map_data(&self, c: Xy) -> TileData {
        let Some(data) = self.data.as_ref() else {
            return TileData::empty();
        };
        data.layers
            .iter()
            .enumerate()
            .rev()
            .find(|(_, l)| l.map.value(c.x, c.y) != 0)
            .map_or_else(TileData::empty, |(i, l)| TileData {
                layer: i as i32,
                tileset: Some(l.tileset.clone()),
                can_walk: l.can_walk,
            })
    }

    /// Highest occupied layer at the start location
    pub fn top_most_at_start(&self) -> TileData {
        self.get_top_most_map_data(self.start())
    }

    /// Occupancy of the 2×2 block whose top left is `(x, y)`
    pub fn neighbor_code(&self, x: i32, y: i32, layer: usize) -> NeighborCode {
        let occ = |dx: i32, dy: i32| {
            self.get_map_data(x.saturating_add(dx), y.saturating_add(dy), layer) != 0
        };
        NeighborCode::from_corners(occ(0, 0), occ(1, 0), occ(0, 1), occ(1, 1))
    }

    /// Tileset and neighbor code of the tile drawn at `(x, y)` on `layer`
    pub fn get_tile_data(&self, x: i32, y: i32, layer: usize) -> Option<GridMapTileData<'_>> {
        let l = self.layer(layer)?;
        Some(GridMapTileData {
            tileset: &l.tileset,
            code: self.neighbor_code(x, y, layer),
        })
    }

    fn layer_mut(&mut self, idx: usize) -> Option<&mut TileLayer> {
        self.data.as_mut().and_then(|d| d.layers.get_mut(idx))
    }

    /// Sets a layer's color
    pub fn set_layer_color(&mut self, idx: usize, color: &str) -> bool {
        let Some(layer) = self.layer_mut(idx) else {
            return false;
        };
        layer.color = color.to_string();
        self.subscribers.emit(MapEvent::LayerUpdated(idx));
        true
    }

    /// Sets whether a layer is walkable
    pub fn set_layer_can_walk(&mut self, idx: usize, can_walk: bool) -> bool {
        let Some(layer) = self.layer_mut(idx) else {
            return false;
        };
        layer.can_walk = can_walk;
        self.subscribers.emit(MapEvent::LayerUpdated(idx));
        true
    }

    /// Sets a layer's tileset
    pub fn set_layer_tileset(&mut self, idx: usize, tileset: &str) -> bool {
        let Some(layer) = self.layer_mut(idx) else {
            return false;
        };
        layer.tileset = tileset.to_string();
        self.subscribers.emit(MapEvent::LayerTilesetUpdated(idx));
        true
    }

    /// Inserts a layer filled with `fill`. `idx` past the end appends.
    /// Refused at [`MAX_LAYERS`].
    pub fn add_layer(&mut self, idx: usize, spec: &TileLayerSpec, fill: u8) -> bool {
        let Some(data) = self.data.as_mut() else {
            return false;
        };
        if data.layers.len() >= MAX_LAYERS {
            return false;
        }
        let idx = idx.min(data.layers.len());
        let layer = TileLayer::from_spec(spec, data.map_data_size, u8::from(fill != 0));
        data.layers.insert(idx, layer);
        self.subscribers.emit(MapEvent::LayerAdded(idx));
        true
    }

    /// Removes a layer. Refused for the last remaining one.
    pub fn remove_layer(&mut self, idx: usize) -> bool {
        let Some(data) = self.data.as_mut() else {
            return false;
        };
        if data.layers.len() <= MIN_LAYERS || idx >= data.layers.len() {
            return false;
        }
        data.layers.remove(idx);
        self.subscribers.emit(MapEvent::LayerRemoved(idx));
        true
    }

    /// Writes one cell. `layer == -1` writes the cell on every layer.
    pub fn set_map_data(&mut self, x: i32, y: i32, layer: i32, value: u8) -> bool {
        let Some(data) = self.data.as_mut() else {
            return false;
        };
        let value = u8::from(value != 0);
        let written = match layer {
            -1 => data
                .layers
                .iter_mut()
                .fold(false, |ok, l| l.map.set(x, y, value) || ok),
            l if l >= 0 => data
                .layers
                .get_mut(l as usize)
                .is_some_and(|l| l.map.set(x, y, value)),
            _ => false,
        };
        if written {
            self.subscribers
                .emit(MapEvent::CellsUpdated { x, y, layer });
        }
        written
    }

    /// Replaces the map. Invalid data is rejected and the current map kept.
    pub fn load_map_data(&mut self, data: MapRenderData) -> Result<(), MapError> {
        if let Err(e) = data.validate() {
            log::error!("map rejected: {e}");
            return Err(e);
        }
        self.subscribers.emit(MapEvent::Loading);
        self.data = Some(data);
        self.set_walkable_start();
        log::info!(
            "loaded {}x{} map with {} layers",
            self.size().x,
            self.size().y,
            self.layer_count()
        );
        self.subscribers.emit(MapEvent::Loaded);
        Ok(())
    }

    /// Parses and loads a JSON map
    pub fn load_from_str(&mut self, txt: &str) -> Result<(), MapError> {
        let data = decode_map_str(txt).inspect_err(|e| log::error!("map load failed: {e}"))?;
        self.load_map_data(data)
    }

    /// Reads and loads a `.json` map file
    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<(), MapError> {
        let data = decode_map_file(path).inspect_err(|e| log::error!("map load failed: {e}"))?;
        self.load_map_data(data)
    }

    /// Current map as JSON
    pub fn save_to_string(&self) -> Result<String, MapError> {
        let data = self.loaded()?;
        encode_map(data)
    }

    /// Writes the current map to `path`
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), MapError> {
        let data = self.loaded()?;
        save_map_file(path, data)
    }

    fn loaded(&self) -> Result<&MapRenderData, MapError> {
        self.data
            .as_ref()
            .ok_or_else(|| MapError::InvalidMap("no map loaded".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    fn layer(tileset: &str, can_walk: bool, size: Xy, cells: &[u8]) -> TileLayer {
        TileLayer {
            tileset: tileset.to_string(),
            can_walk,
            color: "#ffffff".to_string(),
            map: Grid::from_vec(size, cells.to_vec()).unwrap(),
        }
    }

    fn two_by_two() -> MapData {
        let size = Xy::new(2, 2);
        let mut map = MapData::with_rng_seed(1);
        map.load_map_data(MapRenderData {
            start: Xy::ZERO,
            map_data_size: size,
            layers: vec![
                layer("Sand", true, size, &[1, 1, 1, 1]),
                layer("Rock", false, size, &[1, 0, 1, 1]),
            ],
        })
        .unwrap();
        map
    }

    #[test]
    fn tile_data_reads_corners_in_order() {
        let map = two_by_two();
        let tile = map.get_tile_data(0, 0, 1).unwrap();
        assert_eq!(tile.tileset, "Rock");
        assert_eq!(tile.code.to_string(), "1011");
        assert!(map.get_tile_data(0, 0, 5).is_none());
    }

    #[test]
    fn far_coordinates_read_as_empty() {
        let map = two_by_two();
        assert!(map.neighbor_code(i32::MAX, i32::MAX, 0).is_empty());
        assert!(map.neighbor_code(i32::MIN, i32::MAX, 1).is_empty());
        let tile = map.get_tile_data(i32::MAX, 0, 0).unwrap();
        assert!(tile.code.is_empty());
    }

    #[test]
    fn topmost_wins_and_empty_is_minus_one() {
        let map = two_by_two();
        let top = map.get_top_most_map_data(Xy::new(0, 0));
        assert_eq!(top.layer, 1);
        assert!(!top.can_walk);
        assert_eq!(map.get_top_most_map_data(Xy::new(1, 0)).layer, 0);
        assert_eq!(map.get_top_most_map_data(Xy::new(9, 9)), TileData::empty());
    }

    #[test]
    fn mutations_check_bounds_and_notify() {
        let mut map = two_by_two();
        let rx = map.subscribe();
        assert!(!map.set_layer_color(7, "#000000"));
        assert!(map.set_layer_color(1, "#000000"));
        assert!(!map.set_map_data(5, 0, 0, 1));
        assert!(map.set_map_data(1, 0, -1, 0));
        assert_eq!(map.get_map_data(1, 0, 0), 0);
        let events: Vec<MapEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                MapEvent::LayerUpdated(1),
                MapEvent::CellsUpdated { x: 1, y: 0, layer: -1 }
            ]
        );
    }

    #[test]
    fn layer_count_stays_in_bounds() {
        let mut map = two_by_two();
        assert!(!map.remove_layer(2));
        assert!(map.remove_layer(1));
        assert!(!map.remove_layer(0));
        for _ in 0..10 {
            map.add_layer(99, &TileLayerSpec::default(), 1);
        }
        assert_eq!(map.layer_count(), MAX_LAYERS);
        assert_eq!(map.layer(MAX_LAYERS - 1).unwrap().map.len(), 4);
    }
}
