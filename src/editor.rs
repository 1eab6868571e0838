//! Wires the map, the tileset store and the viewport together.
//!
//! Producers only emit events. The [`Editor`] drains them once per frame in
//! arrival order and applies the matching reaction to the renderer.

use crate::config::EditorConfig;
use crate::error::MapError;
use crate::events::{MapEvent, ReactionQueue, TilesetEvent};
use crate::geom::Xy;
use crate::map::{GenerationRequest, MapData};
use crate::pointer::{PointerAction, PointerController};
use crate::render::draw::{draw_pointer, draw_reticle, draw_viewport, TextureCache};
use crate::render::viewport::ViewportRenderer;
use crate::tileset::{TileAsset, TileAssetProvider, TilesetStore};
use macroquad::color::Color;
use macroquad::math::Vec2;
use std::path::Path;
use std::sync::mpsc::Receiver;

/// Tiles recolored per [`Editor::pump`] by default
pub const DEFAULT_COLORIZE_BUDGET: usize = 64;

/// Owns every editor component and routes their events
pub struct Editor {
    map: MapData,
    tilesets: TilesetStore,
    renderer: ViewportRenderer<TileAsset>,
    pointer: PointerController,
    textures: TextureCache,
    map_events: Receiver<MapEvent>,
    tileset_events: Receiver<TilesetEvent>,
    map_queue: ReactionQueue<MapEvent>,
    tileset_queue: ReactionQueue<TilesetEvent>,
    colorize_budget: usize,
}

impl Editor {
    /// Editor with an empty map and nothing loaded
    pub fn new(config: &EditorConfig) -> Self {
        Self::with_map(config, MapData::new())
    }

    /// Editor around an existing map
    pub fn with_map(config: &EditorConfig, mut map: MapData) -> Self {
        let mut tilesets = TilesetStore::new(config.tilesets.clone());
        let map_events = map.subscribe();
        let tileset_events = tilesets.subscribe();
        Editor {
            map,
            tilesets,
            renderer: ViewportRenderer::new(&config.viewport),
            pointer: PointerController::new(),
            textures: TextureCache::new(),
            map_events,
            tileset_events,
            map_queue: ReactionQueue::default(),
            tileset_queue: ReactionQueue::default(),
            colorize_budget: DEFAULT_COLORIZE_BUDGET,
        }
    }

    /// Sets how many tiles are recolored per pump
    pub fn set_colorize_budget(&mut self, tiles: usize) {
        self.colorize_budget = tiles;
    }

    /// Map model
    pub fn map(&self) -> &MapData {
        &self.map
    }

    /// Map model, for edits. Call [`Editor::pump`] afterwards.
    pub fn map_mut(&mut self) -> &mut MapData {
        &mut self.map
    }

    /// Tileset store
    pub fn tilesets(&self) -> &TilesetStore {
        &self.tilesets
    }

    /// Tileset store, for inserts. Call [`Editor::pump`] afterwards.
    pub fn tilesets_mut(&mut self) -> &mut TilesetStore {
        &mut self.tilesets
    }

    /// Viewport
    pub fn renderer(&self) -> &ViewportRenderer<TileAsset> {
        &self.renderer
    }

    /// Pointer state
    pub fn pointer(&self) -> &PointerController {
        &self.pointer
    }

    /// Pointer state, for tool changes
    pub fn pointer_mut(&mut self) -> &mut PointerController {
        &mut self.pointer
    }

    /// Loads every registered tileset from `dir`
    pub async fn load_tilesets(&mut self, dir: &Path) -> usize {
        let loaded = self.tilesets.load_all(dir).await;
        self.pump();
        loaded
    }

    /// Drains pending events and applies their reactions in order, then
    /// advances recolor jobs. Returns reactions applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;

        while let Ok(event) = self.map_events.try_recv() {
            self.map_queue.push(event);
        }
        while let Some(event) = self.map_queue.pop() {
            self.apply_map_event(event);
            applied += 1;
        }

        if self.colorize_budget > 0 && self.tilesets.pending_jobs() > 0 {
            self.tilesets.pump_jobs(self.colorize_budget);
        }

        while let Ok(event) = self.tileset_events.try_recv() {
            self.tileset_queue.push(event);
        }
        while let Some(event) = self.tileset_queue.pop() {
            self.apply_tileset_event(event);
            applied += 1;
        }
        applied
    }

    fn render(&mut self) {
        self.renderer.render(&self.map, &self.tilesets);
    }

    fn prepare_colors(&mut self) {
        for idx in 0..self.map.layer_count() {
            if let Some(layer) = self.map.layer(idx) {
                let (tileset, color) = (layer.tileset.clone(), layer.color.clone());
                self.tilesets.prepare_color(&tileset, &color);
            }
        }
    }

    fn apply_map_event(&mut self, event: MapEvent) {
        log::trace!("map event {event:?}");
        match event {
            MapEvent::Loading => {
                // tileset reactions and recolor jobs belong to the old map
                while self.tileset_events.try_recv().is_ok() {}
                self.tileset_queue.clear();
                self.tilesets.clear_jobs();
                self.renderer.clear();
            }
            MapEvent::Loaded => {
                self.renderer.init(&self.map);
                self.prepare_colors();
                self.render();
            }
            MapEvent::LayerUpdated(idx) => {
                if let Some(layer) = self.map.layer(idx) {
                    let (tileset, color) = (layer.tileset.clone(), layer.color.clone());
                    self.renderer.set_layer_style(idx, &color);
                    self.tilesets.prepare_color(&tileset, &color);
                }
                self.renderer.reset_tiles(idx);
                self.render();
            }
            MapEvent::LayerTilesetUpdated(idx) => {
                self.prepare_colors();
                self.renderer.reset_tiles(idx);
                self.render();
            }
            MapEvent::LayerAdded(_) | MapEvent::LayerRemoved(_) => {
                self.renderer.rebuild_layers(&self.map);
                self.prepare_colors();
                self.render();
            }
            MapEvent::CellsUpdated { .. } => {
                self.renderer.remove_updated_tiles(&self.map);
                self.render();
            }
        }
    }

    fn apply_tileset_event(&mut self, event: TilesetEvent) {
        log::trace!("tileset event {event:?}");
        match event {
            TilesetEvent::Loaded(_) => {
                self.renderer.remove_all_tiles();
                self.prepare_colors();
                self.render();
            }
            TilesetEvent::LoadError(tileset) => {
                self.textures.invalidate(&tileset.name);
                self.reset_layers_where(|name, _| name == tileset.name);
                self.render();
            }
            TilesetEvent::Colorized(key) => {
                let Some(color) = key.color else {
                    return;
                };
                self.reset_layers_where(|name, c| name == key.tileset && c == color);
                self.render();
            }
        }
    }

    fn reset_layers_where(&mut self, matches: impl Fn(&str, &str) -> bool) {
        for idx in 0..self.map.layer_count() {
            let hit = self
                .map
                .layer(idx)
                .is_some_and(|l| matches(&l.tileset, &l.color));
            if hit {
                self.renderer.reset_tiles(idx);
            }
        }
    }

    /// Adopts a new screen size
    pub fn resize(&mut self, viewport: Vec2) {
        self.renderer.handle_resize(viewport);
        self.render();
    }

    /// Moves the view by `delta` cells. Walkability applies outside edit mode.
    pub fn move_by(&mut self, delta: Xy) -> bool {
        let anywhere = self.pointer.moves_anywhere();
        self.renderer
            .cursor_move_by(&self.map, &self.tilesets, delta, anywhere)
    }

    /// Centers the view on `coord`
    pub fn move_to(&mut self, coord: Xy) -> bool {
        let anywhere = self.pointer.moves_anywhere();
        self.renderer
            .cursor_move(&self.map, &self.tilesets, coord, anywhere)
    }

    /// Generates a new map and shows it. Returns the seeds used.
    pub fn generate(&mut self, request: &GenerationRequest) -> Vec<u32> {
        let seeds = self.map.generate_request(request);
        self.pump();
        seeds
    }

    /// Loads a map from JSON text. On error the current map stays.
    pub fn load_str(&mut self, txt: &str) -> Result<(), MapError> {
        self.map.load_from_str(txt)?;
        self.pump();
        Ok(())
    }

    /// Loads a map from a `.json` file. On error the current map stays.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), MapError> {
        self.map.load_from_file(path)?;
        self.pump();
        Ok(())
    }

    /// Current map as JSON
    pub fn save_string(&self) -> Result<String, MapError> {
        self.map.save_to_string()
    }

    /// Writes the current map to a `.json` file
    pub fn save_file(&self, path: impl AsRef<Path>) -> Result<(), MapError> {
        self.map.save_to_file(path)
    }

    /// Map cell under a screen pixel
    pub fn cell_at(&self, pixel: Vec2) -> Xy {
        self.renderer.map_coord_from_pixel(pixel)
    }

    /// Primary button pressed at a screen pixel
    pub fn mouse_down(&mut self, pixel: Vec2) -> Option<PointerAction> {
        let coord = self.cell_at(pixel);
        let action = self.pointer.mouse_down(&mut self.map, coord);
        self.apply_pointer_action(action)
    }

    /// Mouse moved to a screen pixel
    pub fn mouse_move(&mut self, pixel: Vec2, primary_down: bool) -> Option<PointerAction> {
        let coord = self.cell_at(pixel);
        let action = self.pointer.mouse_move(&mut self.map, coord, primary_down);
        self.apply_pointer_action(action)
    }

    /// Primary button released at a screen pixel
    pub fn mouse_up(&mut self, pixel: Vec2) {
        let coord = self.cell_at(pixel);
        self.pointer.mouse_up(&self.map, coord);
    }

    fn apply_pointer_action(&mut self, action: Option<PointerAction>) -> Option<PointerAction> {
        match &action {
            Some(PointerAction::MoveTo(coord)) => {
                self.move_to(*coord);
            }
            Some(PointerAction::Edited { .. }) => {
                self.pump();
            }
            Some(PointerAction::Selected(data)) => {
                log::info!(
                    "selected layer {} ({})",
                    data.layer,
                    data.tileset.as_deref().unwrap_or("-")
                );
            }
            None => {}
        }
        action
    }

    /// Draws the view, the reticle and, while editing, the pointer cell.
    /// Needs a GL context.
    pub fn draw(&mut self, pointer_color: Color) {
        draw_viewport(&self.renderer, &self.tilesets, &mut self.textures);
        draw_reticle(&self.renderer);
        if self.pointer.moves_anywhere() {
            draw_pointer(&self.renderer, self.pointer.location(), pointer_color);
        }
    }
}
