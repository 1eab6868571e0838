#![warn(missing_docs)]

//! Procedural dual-grid tile maps for Macroquad.
//!
//! A map is a stack of boolean occupancy layers generated from Perlin noise.
//! Each rendered tile is picked from the four cells around a grid corner, so
//! terrain edges blend without per-tile authoring. The crate covers
//! generation, persistence, tileset loading and recoloring, an incremental
//! viewport renderer and the pointer rules of a small editor.

pub mod autotile;
pub mod color;
pub mod config;
pub mod editor;
mod error;
pub mod events;
pub mod geom;
pub mod grid;
pub mod layer;
pub mod loader {
    //! Map file formats.
    pub mod json_loader;
}
pub mod logging;
pub mod map;
pub mod noise_gen;
pub mod pointer;
pub mod preview;
pub mod render;
pub mod tileset;

pub use autotile::NeighborCode;
pub use config::{EditorConfig, ViewportConfig};
pub use editor::Editor;
pub use error::MapError;
pub use events::{MapEvent, ReactionQueue, Subscribers, TilesetEvent};
pub use geom::{Xy, XyMinMax};
pub use grid::Grid;
pub use layer::{NoiseLayer, TileData, TileLayer, TileLayerModifier, TileLayerSpec};
pub use map::{GenerationRequest, MapData, MapRenderData};
pub use noise_gen::NoiseGenerator;
pub use pointer::{EditState, PointerAction, PointerController, PointerType};
pub use preview::{scale_to_fit, ScaleToFit};
pub use render::viewport::ViewportRenderer;
pub use tileset::{TileAsset, TileAssetProvider, Tileset, TilesetStore};
