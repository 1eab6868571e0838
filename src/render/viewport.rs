//! Incremental viewport renderer.
//!
//! Tracks which tiles are "mounted" per layer. Each pass adds tiles that came
//! into the window and drops the ones that left it, so a one-cell camera move
//! touches one row or column instead of the whole screen.

use super::cull::visible_window;
use super::style::LayerStyle;
use crate::config::ViewportConfig;
use crate::geom::{Xy, XyMinMax};
use crate::layer::TileData;
use crate::map::MapData;
use crate::tileset::TileAssetProvider;
use macroquad::math::{Rect, Vec2};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::time::{Duration, Instant};

/// Identity of a rendered tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileKey {
    /// Layer index
    pub layer: usize,
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.layer, self.x, self.y)
    }
}

/// A mounted tile
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedTile<A> {
    /// Identity
    pub id: TileKey,
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
    /// Art handed out by the provider
    pub asset: A,
    /// Neighbor code when mounted
    pub value: u8,
    /// Top left in container pixels
    pub pixel: Vec2,
}

/// Mounted tiles of one map layer
#[derive(Debug, Clone)]
pub struct DisplayLayer<A> {
    /// `layer-{index}`
    pub id: String,
    /// Draw order, `(index + 1) * 100`
    pub z_index: i32,
    /// Fills for vector tiles
    pub style: LayerStyle,
    /// Mounted tiles
    pub tiles: HashMap<TileKey, RenderedTile<A>>,
}

/// Camera state and mounted tiles for every layer
pub struct ViewportRenderer<A> {
    center_location: Xy,
    tile_pixel_size: Xy,
    max_render_area_size: Xy,
    map_size: Xy,
    display_scale: f32,
    viewport_size: Vec2,
    view_center: Vec2,
    grid_center_offset: Vec2,
    grid_pixel_size: Vec2,
    layers: Vec<DisplayLayer<A>>,
    selected: TileData,
    loaded: bool,
    update_time: Duration,
}

impl<A: Clone> ViewportRenderer<A> {
    /// Renderer with no map
    pub fn new(config: &ViewportConfig) -> Self {
        ViewportRenderer {
            center_location: Xy::ZERO,
            tile_pixel_size: config.tile_pixel_size,
            max_render_area_size: config.max_render_area_size,
            map_size: Xy::ZERO,
            display_scale: 1.0,
            viewport_size: Vec2::ZERO,
            view_center: Vec2::ZERO,
            grid_center_offset: Vec2::ZERO,
            grid_pixel_size: Vec2::ZERO,
            layers: Vec::new(),
            selected: TileData::empty(),
            loaded: false,
            update_time: Duration::ZERO,
        }
    }

    /// Adopts a freshly loaded map and centers on its start. Call
    /// [`ViewportRenderer::render`] afterwards.
    pub fn init(&mut self, map: &MapData) {
        self.map_size = map.size();
        self.rebuild_layers(map);
        self.center_location = map.start();
        self.selected = map.top_most_at_start();
        let t = self.tile_pixel_size.as_vec2();
        self.grid_pixel_size = self.map_size.as_vec2() * t - 2.0 * t;
        self.loaded = true;
        self.center_on_map_cursor();
    }

    /// Drops every layer and tile
    pub fn clear(&mut self) {
        self.layers.clear();
        self.map_size = Xy::ZERO;
        self.grid_pixel_size = Vec2::ZERO;
        self.selected = TileData::empty();
        self.loaded = false;
    }

    /// True between `init` and `clear`
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Recomputes scale and center for a new viewport size in screen pixels
    pub fn handle_resize(&mut self, viewport: Vec2) {
        self.viewport_size = viewport;
        self.set_display_scale();
        self.view_center = viewport / 2.0 / self.display_scale;
        self.center_on_map_cursor();
    }

    /// Zoom that fits the render area, snapped to an even tenth. A snapped
    /// value of zero keeps the previous scale.
    pub fn set_display_scale(&mut self) {
        let t = self.tile_pixel_size.as_vec2();
        let area = self.max_render_area_size.as_vec2() * 1.5;
        let scale = f32::max(
            self.viewport_size.y / (area.y * t.y),
            self.viewport_size.x / (area.x * t.x),
        );
        let snapped = Self::even_decimal(scale);
        if snapped > 0.0 && snapped.is_finite() {
            self.display_scale = snapped;
        }
    }

    /// Rounds to an even tenth: `10.03 -> 10.0`, `10.19999 -> 10.2`
    pub fn even_decimal(value: f32) -> f32 {
        ((value * 10.0).floor() / 2.0).round() * 2.0 / 10.0
    }

    /// Recomputes the container offset for the current center
    pub fn center_on_map_cursor(&mut self) {
        let t = self.tile_pixel_size.as_vec2();
        self.grid_center_offset = self.view_center - self.center_location.as_vec2() * t + t / 2.0;
    }

    /// Map cell under a screen pixel
    pub fn map_coord_from_pixel(&self, pixel: Vec2) -> Xy {
        let t = self.tile_pixel_size.as_vec2();
        let p = (pixel / self.display_scale - self.grid_center_offset) / t;
        Xy::new(p.x.ceil() as i32, p.y.ceil() as i32)
    }

    /// Screen position of a container pixel
    pub fn container_to_screen(&self, p: Vec2) -> Vec2 {
        (p + self.grid_center_offset) * self.display_scale
    }

    /// Top left of the tile at `(x, y)` in container pixels. Tiles sit half a
    /// cell up and left since each one straddles four cells.
    pub fn tile_pixel_position(&self, x: i32, y: i32) -> Vec2 {
        let t = self.tile_pixel_size.as_vec2();
        Xy::new(x, y).as_vec2() * t - t / 2.0
    }

    /// Screen rectangle of the pointer outline at `coord`
    pub fn cell_rect(&self, coord: Xy) -> Rect {
        let t = self.tile_pixel_size.as_vec2();
        let top_left = self.container_to_screen((coord.as_vec2() - Vec2::ONE) * t);
        let size = t * self.display_scale;
        Rect::new(top_left.x, top_left.y, size.x, size.y)
    }

    /// Screen rectangle of the reticle on the center cell
    pub fn reticle_rect(&self) -> Rect {
        self.cell_rect(self.center_location)
    }

    /// Cells currently in view
    pub fn render_area(&self) -> XyMinMax {
        visible_window(self.center_location, self.max_render_area_size, self.map_size)
    }

    /// Mounts tiles that came into view, then drops the ones that left
    pub fn render<P>(&mut self, map: &MapData, provider: &P)
    where
        P: TileAssetProvider<Asset = A>,
    {
        let started = Instant::now();
        let added = self.render_tiles_in_viewable_area(map, provider);
        let removed = self.remove_tiles_out_of_viewable_area(false);
        self.update_time = started.elapsed();
        log::trace!(
            "render pass +{added} -{removed} tiles in {:.3?}",
            self.update_time
        );
    }

    /// Mounts missing tiles in view, topmost layer first. Empty codes are
    /// skipped; a solid code hides the layers below it. Returns tiles added.
    pub fn render_tiles_in_viewable_area<P>(&mut self, map: &MapData, provider: &P) -> usize
    where
        P: TileAssetProvider<Asset = A>,
    {
        if !self.loaded || self.layers.is_empty() {
            return 0;
        }
        let layer_count = self.layers.len().min(map.layer_count());
        let mut added = 0;

        for c in self.render_area().cells() {
            for layer in (0..layer_count).rev() {
                let Some(tile) = map.get_tile_data(c.x, c.y, layer) else {
                    continue;
                };
                let key = TileKey {
                    layer,
                    x: c.x,
                    y: c.y,
                };
                if !tile.code.is_empty() && !self.layers[layer].tiles.contains_key(&key) {
                    let color = map.layer(layer).map_or("", |l| l.color.as_str());
                    let asset = provider.tile(tile.tileset, tile.code, color);
                    let pixel = self.tile_pixel_position(c.x, c.y);
                    self.layers[layer].tiles.insert(
                        key,
                        RenderedTile {
                            id: key,
                            x: c.x,
                            y: c.y,
                            asset,
                            value: tile.code.bits(),
                            pixel,
                        },
                    );
                    added += 1;
                }
                if tile.code.is_solid() {
                    break;
                }
            }
        }
        added
    }

    /// Unmounts tiles outside the view, or every tile with `all`.
    /// Returns tiles removed.
    pub fn remove_tiles_out_of_viewable_area(&mut self, all: bool) -> usize {
        let area = self.render_area();
        let mut removed = 0;
        for layer in &mut self.layers {
            let before = layer.tiles.len();
            layer
                .tiles
                .retain(|_, t| !all && area.contains(Xy::new(t.x, t.y)));
            removed += before - layer.tiles.len();
        }
        removed
    }

    /// Unmounts everything
    pub fn remove_all_tiles(&mut self) -> usize {
        self.remove_tiles_out_of_viewable_area(true)
    }

    /// Unmounts tiles whose neighbor code changed since they were mounted,
    /// and tiles now hidden under a solid tile of a higher layer.
    /// Returns tiles removed.
    pub fn remove_updated_tiles(&mut self, map: &MapData) -> usize {
        let count = map.layer_count();
        let mut removed = 0;
        for (idx, layer) in self.layers.iter_mut().enumerate() {
            let before = layer.tiles.len();
            layer.tiles.retain(|_, t| {
                map.neighbor_code(t.x, t.y, idx).bits() == t.value
                    && !(idx + 1..count).any(|above| map.neighbor_code(t.x, t.y, above).is_solid())
            });
            removed += before - layer.tiles.len();
        }
        removed
    }

    /// Unmounts every tile of one layer so it is rebuilt on the next pass
    pub fn reset_tiles(&mut self, layer: usize) {
        if let Some(l) = self.layers.get_mut(layer) {
            l.tiles.clear();
        }
    }

    /// Centers on `coord` and renders. Refused inside the one-cell border,
    /// and on cells that are not walkable unless `anywhere` is set.
    pub fn cursor_move<P>(&mut self, map: &MapData, provider: &P, coord: Xy, anywhere: bool) -> bool
    where
        P: TileAssetProvider<Asset = A>,
    {
        if !self.loaded || map.is_outside_of_map(coord) {
            return false;
        }
        let top = map.get_top_most_map_data(coord);
        if !anywhere && !top.can_walk {
            return false;
        }
        self.selected = top;
        self.center_location = coord;
        self.center_on_map_cursor();
        self.render(map, provider);
        true
    }

    /// [`ViewportRenderer::cursor_move`] relative to the current center
    pub fn cursor_move_by<P>(&mut self, map: &MapData, provider: &P, delta: Xy, anywhere: bool) -> bool
    where
        P: TileAssetProvider<Asset = A>,
    {
        let target = self.center_location + delta;
        self.cursor_move(map, provider, target, anywhere)
    }

    /// Restyles every layer from the map's layer colors
    pub fn set_layer_styles(&mut self, map: &MapData) {
        for (idx, layer) in self.layers.iter_mut().enumerate() {
            if let Some(l) = map.layer(idx) {
                layer.style = LayerStyle::from_hex(&l.color);
            }
        }
    }

    /// Restyles one layer
    pub fn set_layer_style(&mut self, idx: usize, hex: &str) {
        if let Some(layer) = self.layers.get_mut(idx) {
            layer.style = LayerStyle::from_hex(hex);
        }
    }

    /// One empty display layer per map layer, styled from its color
    pub fn rebuild_layers(&mut self, map: &MapData) {
        self.layers = (0..map.layer_count())
            .map(|i| DisplayLayer {
                id: format!("layer-{i}"),
                z_index: (i as i32 + 1) * 100,
                style: map
                    .layer(i)
                    .map(|l| LayerStyle::from_hex(&l.color))
                    .unwrap_or_default(),
                tiles: HashMap::new(),
            })
            .collect();
    }

    /// Every mounted tile, sorted
    pub fn rendered_tile_ids(&self) -> BTreeSet<TileKey> {
        self.layers
            .iter()
            .flat_map(|l| l.tiles.keys().copied())
            .collect()
    }

    /// Display layers, bottom to top
    pub fn layers(&self) -> &[DisplayLayer<A>] {
        &self.layers
    }

    /// Map cell at the center of the view
    pub fn center_location(&self) -> Xy {
        self.center_location
    }

    /// Topmost layer data at the center, as of the last move
    pub fn selected(&self) -> &TileData {
        &self.selected
    }

    /// Current zoom
    pub fn display_scale(&self) -> f32 {
        self.display_scale
    }

    /// Tile size in container pixels
    pub fn tile_pixel_size(&self) -> Xy {
        self.tile_pixel_size
    }

    /// Container offset that puts the center cell in the middle of the view
    pub fn grid_center_offset(&self) -> Vec2 {
        self.grid_center_offset
    }

    /// View center in container pixels
    pub fn view_center(&self) -> Vec2 {
        self.view_center
    }

    /// Rendered map size in container pixels, without the border ring
    pub fn grid_pixel_size(&self) -> Vec2 {
        self.grid_pixel_size
    }

    /// Duration of the last render pass
    pub fn update_time(&self) -> Duration {
        self.update_time
    }
}
