use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Error type for loading, saving and validating map data
#[derive(Debug, Error)]
pub enum MapError {
    /// File I/O error
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File that could not be read or written
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },
    /// JSON parse error in a file
    #[error("JSON parse error in {path}: {source}")]
    Json {
        /// File being parsed
        path: PathBuf,
        /// Underlying error
        source: serde_json::Error,
    },
    /// JSON parse error in an in-memory string
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// Unsupported file format (non-JSON)
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
    /// A layer's occupancy length does not match width * height
    #[error("Invalid layer size for layer {layer}: expected {expected} cells, found {found}")]
    InvalidLayerSize {
        /// Layer index
        layer: usize,
        /// `MapDataSize.x * MapDataSize.y`
        expected: usize,
        /// Length of the layer's `Map`
        found: usize,
    },
    /// Layer count outside of `[MIN_LAYERS, MAX_LAYERS]`
    #[error("Map must have between 1 and 8 layers, found {0}")]
    LayerCount(usize),
    /// Any other structural problem
    #[error("Invalid map: {0}")]
    InvalidMap(String),
    /// A raster tileset sheet could not be cut into tiles
    #[error("Tileset '{tileset}' image error: {reason}")]
    TilesetImage {
        /// Tileset name
        tileset: String,
        /// What went wrong
        reason: String,
    },
}
