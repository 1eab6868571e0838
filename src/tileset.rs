//! Tileset registry and tile art store.
//!
//! Vector tilesets are drawn from [`crate::autotile::vector_shapes`] and need
//! no files. Raster tilesets are loaded from a sheet (`<dir>/<Name>.<Ext>`) or,
//! for one-tile-wide sets, from individual files (`<dir>/<Name>/<code>.<Ext>`).

use crate::autotile::{NeighborCode, TILE_INDEX};
use crate::color::{parse_hex, recolor_image};
use crate::error::MapError;
use crate::events::{Subscribers, TilesetEvent};
use anyhow::{anyhow, Context};
use macroquad::math::Rect;
use macroquad::texture::Image;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;

/// How tiles of a set are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileFormat {
    /// Drawn from vector shapes, colored by the layer style
    Svg,
    /// Raster images
    Img,
}

/// Autotile scheme of a set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutoTerrain {
    /// 16 tile dual-grid atlas in [`TILE_INDEX`] order
    #[serde(rename = "dualgrid")]
    DualGrid,
}

/// Pixels to skip around a sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Margin {
    /// Left
    pub left: u32,
    /// Right
    pub right: u32,
    /// Top
    pub top: u32,
    /// Bottom
    pub bottom: u32,
}

/// Where a set came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Credit {
    /// Author
    pub name: String,
    /// Link
    pub url: String,
}

/// Tileset descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tileset {
    /// Hyphenated name, also the file stem
    pub name: String,
    /// Vector or raster
    pub format: TileFormat,
    /// File extension
    #[serde(default)]
    pub ext: String,
    /// Rows in the sheet
    pub tiles_tall: u32,
    /// Columns in the sheet
    pub tiles_wide: u32,
    /// Whether tiles are recolored to the layer color
    #[serde(default)]
    pub apply_color: bool,
    /// Autotile scheme, none for plain sheets
    #[serde(default)]
    pub auto_terrain: Option<AutoTerrain>,
    /// Vector sets only: draw rims and shadows
    #[serde(default)]
    pub edged: bool,
    /// Sheet margins
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin: Option<Margin>,
    /// Attribution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit: Option<Credit>,
}

impl Tileset {
    /// Recolorable 4×4 dual-grid PNG sheet
    pub fn dualgrid_sheet(name: &str) -> Self {
        Tileset {
            name: name.to_string(),
            format: TileFormat::Img,
            ext: "png".to_string(),
            tiles_tall: 4,
            tiles_wide: 4,
            apply_color: true,
            auto_terrain: Some(AutoTerrain::DualGrid),
            edged: false,
            margin: None,
            credit: None,
        }
    }

    /// Procedural dual-grid set
    pub fn vector(name: &str, edged: bool) -> Self {
        Tileset {
            name: name.to_string(),
            format: TileFormat::Svg,
            ext: String::new(),
            tiles_tall: 4,
            tiles_wide: 4,
            apply_color: true,
            auto_terrain: Some(AutoTerrain::DualGrid),
            edged,
            margin: None,
            credit: None,
        }
    }

    /// True for procedural sets
    pub fn is_vector(&self) -> bool {
        self.format == TileFormat::Svg
    }

    /// `<dir>/<Name>.<Ext>`
    pub fn sheet_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.{}", self.name, self.ext))
    }

    /// `<dir>/<Name>/<code>.<Ext>`
    pub fn tile_path(&self, dir: &Path, code: NeighborCode) -> PathBuf {
        dir.join(&self.name).join(format!("{}.{}", code, self.ext))
    }
}

/// Built-in registry
pub fn default_tilesets() -> Vec<Tileset> {
    let mut sets: Vec<Tileset> = [
        "Smooth-Md-Edge",
        "Rough-Md-Edge",
        "Sand-Md-Rough",
        "Grass-Md-Rough",
        "Brick-Md-Smooth",
        "Brick-Wall-Md-Smooth",
        "Block-Wall-Md-Smooth",
        "Rock-Wall-Md-Rough",
        "Rock-Lg-Rough",
    ]
    .into_iter()
    .map(Tileset::dualgrid_sheet)
    .collect();

    sets.push(Tileset::vector("Flat", false));
    sets.push(Tileset::vector("Flat-Edged", true));

    sets.push(Tileset {
        tiles_tall: 16,
        tiles_wide: 11,
        apply_color: false,
        auto_terrain: None,
        credit: Some(Credit {
            name: "Kevins Moms House".to_string(),
            url: "https://kevins-moms-house.itch.io/".to_string(),
        }),
        ..Tileset::dualgrid_sheet("Four-Seasons")
    });
    sets.push(Tileset {
        tiles_tall: 15,
        tiles_wide: 13,
        apply_color: false,
        auto_terrain: None,
        margin: Some(Margin {
            left: 16,
            right: 16,
            top: 16,
            bottom: 32,
        }),
        credit: Some(Credit {
            name: "Incol Games".to_string(),
            url: "https://incolgames.itch.io/".to_string(),
        }),
        ..Tileset::dualgrid_sheet("Dungeon-Set")
    });
    sets
}

/// Source of drawable tiles, keyed by tileset, neighbor code and layer color
pub trait TileAssetProvider {
    /// Whatever the renderer keeps per rendered tile
    type Asset: Clone;

    /// Tile for `code`. Never fails: unknown sets give a placeholder.
    fn tile(&self, tileset: &str, code: NeighborCode, color: &str) -> Self::Asset;

    /// Hint that `(tileset, color)` will be asked for soon
    fn prepare_color(&mut self, _tileset: &str, _color: &str) {}
}

/// Identifies one loaded sheet: the plain sheet or a recolored copy
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SheetKey {
    /// Tileset name
    pub tileset: String,
    /// Layer color for recolored copies
    pub color: Option<String>,
}

/// What the renderer draws for one tile
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TileAsset {
    /// Procedural tile
    Vector {
        /// Shape selector
        code: NeighborCode,
        /// Rims and shadows
        edged: bool,
    },
    /// Image `index` of a sheet
    Raster {
        /// Sheet
        sheet: SheetKey,
        /// Position in the sheet
        index: usize,
    },
    /// Placeholder for art that failed to load
    Missing,
}

/// Loaded art of one tileset
pub enum TileArt {
    /// Procedural
    Vector {
        /// Rims and shadows
        edged: bool,
    },
    /// Sliced images
    Raster {
        /// Tiles in sheet order
        tiles: Vec<Image>,
        /// Whether recolored copies are made
        apply_color: bool,
        /// Recolored copies keyed by `#rrggbb`
        colorized: HashMap<String, Vec<Image>>,
    },
}

struct ColorizeJob {
    key: SheetKey,
    target: crate::color::Hsla,
    done: Vec<Image>,
}

/// Holds every loaded tileset and hands out [`TileAsset`]s
pub struct TilesetStore {
    tilesets: Vec<Tileset>,
    art: HashMap<String, TileArt>,
    jobs: VecDeque<ColorizeJob>,
    subscribers: Subscribers<TilesetEvent>,
}

impl Default for TilesetStore {
    fn default() -> Self {
        TilesetStore::new(Vec::new())
    }
}

impl TilesetStore {
    /// Store for `tilesets`; nothing is loaded yet
    pub fn new(tilesets: Vec<Tileset>) -> Self {
        TilesetStore {
            tilesets,
            art: HashMap::new(),
            jobs: VecDeque::new(),
            subscribers: Subscribers::default(),
        }
    }

    /// Receiver for every event emitted from now on
    pub fn subscribe(&mut self) -> Receiver<TilesetEvent> {
        self.subscribers.subscribe()
    }

    /// Registered sets, minus the ones that failed to load
    pub fn tilesets(&self) -> &[Tileset] {
        &self.tilesets
    }

    /// Descriptor by name
    pub fn get_tileset_by_name(&self, name: &str) -> Option<&Tileset> {
        self.tilesets.iter().find(|t| t.name == name)
    }

    /// True once art for `name` is in the store
    pub fn is_loaded(&self, name: &str) -> bool {
        self.art.contains_key(name)
    }

    fn register(&mut self, tileset: &Tileset) {
        if self.get_tileset_by_name(&tileset.name).is_none() {
            self.tilesets.push(tileset.clone());
        }
    }

    /// Adds a procedural set
    pub fn insert_vector(&mut self, tileset: &Tileset) {
        self.register(tileset);
        self.art.insert(
            tileset.name.clone(),
            TileArt::Vector {
                edged: tileset.edged,
            },
        );
    }

    /// Adds a raster set from already cut tiles
    pub fn insert_raster_tiles(&mut self, tileset: &Tileset, tiles: Vec<Image>) {
        self.register(tileset);
        self.art.insert(
            tileset.name.clone(),
            TileArt::Raster {
                tiles,
                apply_color: tileset.apply_color,
                colorized: HashMap::new(),
            },
        );
    }

    /// Cuts `sheet` into `tiles_wide × tiles_tall` tiles, skipping margins
    pub fn insert_raster_sheet(&mut self, tileset: &Tileset, sheet: &Image) -> Result<(), MapError> {
        let tiles = slice_sheet(tileset, sheet)?;
        self.insert_raster_tiles(tileset, tiles);
        Ok(())
    }

    /// Loads every registered set from `dir`. Returns how many loaded.
    pub async fn load_all(&mut self, dir: &Path) -> usize {
        let registry = self.tilesets.clone();
        let mut loaded = 0;
        for tileset in &registry {
            if self.load_tileset(tileset, dir).await {
                loaded += 1;
            }
        }
        log::info!("{loaded} of {} tilesets loaded", registry.len());
        self.subscribers.emit(TilesetEvent::Loaded(loaded));
        loaded
    }

    /// Loads one set. On failure the set is dropped and `LoadError` emitted.
    pub async fn load_tileset(&mut self, tileset: &Tileset, dir: &Path) -> bool {
        let result = if tileset.is_vector() {
            self.insert_vector(tileset);
            Ok(())
        } else if tileset.tiles_wide == 1 {
            self.load_individual_tiles(tileset, dir).await
        } else {
            self.load_sheet(tileset, dir).await
        };

        match result {
            Ok(()) => {
                log::debug!("tileset {} loaded", tileset.name);
                true
            }
            Err(e) => {
                self.fail(tileset, &e);
                false
            }
        }
    }

    async fn load_sheet(&mut self, tileset: &Tileset, dir: &Path) -> anyhow::Result<()> {
        let sheet = load_image(&tileset.sheet_path(dir)).await?;
        self.insert_raster_sheet(tileset, &sheet)
            .with_context(|| format!("Slicing tileset {}", tileset.name))?;
        Ok(())
    }

    async fn load_individual_tiles(&mut self, tileset: &Tileset, dir: &Path) -> anyhow::Result<()> {
        let mut tiles = Vec::with_capacity(TILE_INDEX.len());
        for code in TILE_INDEX {
            tiles.push(load_image(&tileset.tile_path(dir, code)).await?);
        }
        self.insert_raster_tiles(tileset, tiles);
        Ok(())
    }

    /// Drops a set that could not be loaded and reports it
    pub fn fail(&mut self, tileset: &Tileset, err: &anyhow::Error) {
        log::error!("tileset {} failed to load: {err:#}", tileset.name);
        self.art.remove(&tileset.name);
        self.tilesets.retain(|t| t.name != tileset.name);
        self.jobs.retain(|j| j.key.tileset != tileset.name);
        self.subscribers
            .emit(TilesetEvent::LoadError(tileset.clone()));
    }

    /// Queues a recolored copy of a raster set. False when the set does not
    /// recolor, the color is not `#rrggbb`, or the copy exists or is queued.
    pub fn request_colorized(&mut self, tileset: &str, color: &str) -> bool {
        let Some(TileArt::Raster {
            apply_color: true,
            colorized,
            ..
        }) = self.art.get(tileset)
        else {
            return false;
        };
        if colorized.contains_key(color) {
            return false;
        }
        let key = SheetKey {
            tileset: tileset.to_string(),
            color: Some(color.to_string()),
        };
        if self.jobs.iter().any(|j| j.key == key) {
            return false;
        }
        let Some(target) = parse_hex(color) else {
            log::warn!("not recoloring {tileset}: bad color {color:?}");
            return false;
        };
        log::debug!("queued recolor of {tileset} to {color}");
        self.jobs.push_back(ColorizeJob {
            key,
            target: target.to_hsla(),
            done: Vec::new(),
        });
        true
    }

    /// Recolor jobs still pending
    pub fn pending_jobs(&self) -> usize {
        self.jobs.len()
    }

    /// Drops every queued recolor job. Finished copies are kept.
    pub fn clear_jobs(&mut self) {
        if !self.jobs.is_empty() {
            log::debug!("dropping {} recolor jobs", self.jobs.len());
        }
        self.jobs.clear();
    }

    /// Recolors up to `max_tiles` tiles of queued jobs, oldest first.
    /// Each finished sheet emits `Colorized`. Returns tiles processed.
    pub fn pump_jobs(&mut self, max_tiles: usize) -> usize {
        let mut processed = 0;
        while processed < max_tiles {
            let Some(job) = self.jobs.front_mut() else {
                break;
            };
            let Some(TileArt::Raster {
                tiles, colorized, ..
            }) = self.art.get_mut(&job.key.tileset)
            else {
                self.jobs.pop_front();
                continue;
            };

            while processed < max_tiles && job.done.len() < tiles.len() {
                let mut tile = tiles[job.done.len()].clone();
                recolor_image(&mut tile, job.target);
                job.done.push(tile);
                processed += 1;
            }

            if job.done.len() == tiles.len() {
                if let Some(job) = self.jobs.pop_front() {
                    let color = job.key.color.clone().unwrap_or_default();
                    colorized.insert(color, job.done);
                    log::debug!("recolored {:?}", job.key);
                    self.subscribers.emit(TilesetEvent::Colorized(job.key));
                }
            }
        }
        processed
    }

    /// Images of a sheet
    pub fn sheet_images(&self, key: &SheetKey) -> Option<&[Image]> {
        match self.art.get(&key.tileset)? {
            TileArt::Raster {
                tiles, colorized, ..
            } => match &key.color {
                None => Some(tiles),
                Some(c) => colorized.get(c).map(Vec::as_slice),
            },
            TileArt::Vector { .. } => None,
        }
    }
}

impl TileAssetProvider for TilesetStore {
    type Asset = TileAsset;

    fn tile(&self, tileset: &str, code: NeighborCode, color: &str) -> TileAsset {
        match self.art.get(tileset) {
            None => TileAsset::Missing,
            Some(TileArt::Vector { edged }) => TileAsset::Vector {
                code,
                edged: *edged,
            },
            Some(TileArt::Raster {
                tiles,
                apply_color,
                colorized,
            }) => {
                let index = code.atlas_index();
                if index >= tiles.len() {
                    return TileAsset::Missing;
                }
                // uncolored until the recolored copy is ready
                let color = (*apply_color && colorized.contains_key(color)).then(|| color.to_string());
                TileAsset::Raster {
                    sheet: SheetKey {
                        tileset: tileset.to_string(),
                        color,
                    },
                    index,
                }
            }
        }
    }

    fn prepare_color(&mut self, tileset: &str, color: &str) {
        self.request_colorized(tileset, color);
    }
}

fn slice_sheet(tileset: &Tileset, sheet: &Image) -> Result<Vec<Image>, MapError> {
    let err = |reason: String| MapError::TilesetImage {
        tileset: tileset.name.clone(),
        reason,
    };
    if tileset.tiles_wide == 0 || tileset.tiles_tall == 0 {
        return Err(err("sheet has no rows or columns".to_string()));
    }

    let m = tileset.margin.unwrap_or_default();
    let width = u32::from(sheet.width);
    let height = u32::from(sheet.height);
    let tile_w = width.saturating_sub(m.left + m.right) / tileset.tiles_wide;
    let tile_h = height.saturating_sub(m.top + m.bottom) / tileset.tiles_tall;
    if tile_w == 0 || tile_h == 0 {
        return Err(err(format!(
            "{width}x{height} sheet is too small for {}x{} tiles",
            tileset.tiles_wide, tileset.tiles_tall
        )));
    }

    let mut tiles = Vec::with_capacity((tileset.tiles_wide * tileset.tiles_tall) as usize);
    for y in 0..tileset.tiles_tall {
        for x in 0..tileset.tiles_wide {
            tiles.push(sheet.sub_image(Rect::new(
                (m.left + x * tile_w) as f32,
                (m.top + y * tile_h) as f32,
                tile_w as f32,
                tile_h as f32,
            )));
        }
    }
    Ok(tiles)
}

async fn load_image(path: &Path) -> anyhow::Result<Image> {
    let path_str = path
        .to_str()
        .ok_or_else(|| anyhow!("non UTF-8 path {}", path.display()))?;
    let bytes = macroquad::file::load_file(path_str)
        .await
        .with_context(|| format!("Reading image {}", path.display()))?;
    let image = Image::from_file_with_format(&bytes, None)
        .with_context(|| format!("Decoding image {}", path.display()))?;
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use macroquad::color::Color;

    fn solid(w: u16, h: u16, rgba: [u8; 4]) -> Image {
        Image {
            bytes: rgba.repeat(w as usize * h as usize),
            width: w,
            height: h,
        }
    }

    #[test]
    fn sheet_slicing_honours_margins() {
        let mut sheet = solid(2 + 8 + 2, 1 + 4 + 3, [0, 0, 0, 255]);
        // mark the first pixel inside the margin
        sheet.set_pixel(2, 1, Color::from_rgba(255, 0, 0, 255));
        let tileset = Tileset {
            tiles_wide: 2,
            tiles_tall: 1,
            margin: Some(Margin {
                left: 2,
                right: 2,
                top: 1,
                bottom: 3,
            }),
            ..Tileset::dualgrid_sheet("Marked")
        };
        let tiles = slice_sheet(&tileset, &sheet).unwrap();
        assert_eq!(tiles.len(), 2);
        assert_eq!((tiles[0].width, tiles[0].height), (4, 4));
        assert_eq!(&tiles[0].bytes[0..4], &[255, 0, 0, 255]);
        assert_eq!(&tiles[1].bytes[0..4], &[0, 0, 0, 255]);
    }

    #[test]
    fn too_small_sheet_is_rejected() {
        let sheet = solid(3, 3, [0, 0, 0, 255]);
        let err = slice_sheet(&Tileset::dualgrid_sheet("Tiny"), &sheet).unwrap_err();
        assert!(matches!(err, MapError::TilesetImage { .. }));
    }

    #[test]
    fn unknown_tileset_gives_missing_asset() {
        let store = TilesetStore::default();
        assert_eq!(
            store.tile("Nope", NeighborCode::SOLID, "#ffffff"),
            TileAsset::Missing
        );
    }

    #[test]
    fn failure_removes_tileset_and_reports() {
        let tileset = Tileset::dualgrid_sheet("Broken");
        let mut store = TilesetStore::new(vec![tileset.clone()]);
        let rx = store.subscribe();
        store.insert_raster_tiles(&tileset, vec![solid(1, 1, [1, 2, 3, 255]); 16]);
        store.fail(&tileset, &anyhow!("decode error"));

        assert!(store.get_tileset_by_name("Broken").is_none());
        assert_eq!(store.tile("Broken", NeighborCode::SOLID, "#fff"), TileAsset::Missing);
        assert_eq!(rx.try_recv(), Ok(TilesetEvent::LoadError(tileset)));
    }

    #[test]
    fn recolor_runs_in_slices_and_switches_sheet() {
        let tileset = Tileset::dualgrid_sheet("Grey");
        let mut store = TilesetStore::default();
        let rx = store.subscribe();
        store.insert_raster_tiles(&tileset, vec![solid(2, 2, [128, 128, 128, 255]); 16]);

        let before = store.tile("Grey", NeighborCode::SOLID, "#24a326");
        assert!(matches!(&before, TileAsset::Raster { sheet, .. } if sheet.color.is_none()));

        assert!(store.request_colorized("Grey", "#24a326"));
        assert!(!store.request_colorized("Grey", "#24a326"));
        assert_eq!(store.pump_jobs(10), 10);
        assert!(rx.try_recv().is_err());
        assert_eq!(store.pump_jobs(10), 6);
        assert_eq!(store.pending_jobs(), 0);

        let key = SheetKey {
            tileset: "Grey".to_string(),
            color: Some("#24a326".to_string()),
        };
        assert_eq!(rx.try_recv(), Ok(TilesetEvent::Colorized(key.clone())));
        assert_eq!(store.sheet_images(&key).map(<[Image]>::len), Some(16));
        let after = store.tile("Grey", NeighborCode::SOLID, "#24a326");
        assert_eq!(
            after,
            TileAsset::Raster {
                sheet: key,
                index: NeighborCode::SOLID.atlas_index()
            }
        );
    }

    #[test]
    fn vector_sets_ignore_color() {
        let mut store = TilesetStore::default();
        store.insert_vector(&Tileset::vector("Flat-Edged", true));
        assert!(!store.request_colorized("Flat-Edged", "#ff0000"));
        assert_eq!(
            store.tile("Flat-Edged", NeighborCode::SOLID, "#ff0000"),
            TileAsset::Vector {
                code: NeighborCode::SOLID,
                edged: true
            }
        );
    }

    #[test]
    fn registry_parses_from_json() {
        let json = serde_json::to_string(&default_tilesets()).unwrap();
        let back: Vec<Tileset> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, default_tilesets());
        let dungeon = back.iter().find(|t| t.name == "Dungeon-Set").unwrap();
        assert_eq!(dungeon.margin.unwrap().bottom, 32);
        assert!(dungeon.auto_terrain.is_none());
    }
}
