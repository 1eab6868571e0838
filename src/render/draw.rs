//! Macroquad drawing of a [`ViewportRenderer`].

use super::viewport::ViewportRenderer;
use crate::autotile::vector_shapes;
use crate::tileset::{SheetKey, TileAsset, TilesetStore};
use macroquad::prelude::*;
use std::collections::HashMap;

/// GPU copies of raster tiles, uploaded on first use
#[derive(Default)]
pub struct TextureCache {
    textures: HashMap<(SheetKey, usize), Texture2D>,
}

impl TextureCache {
    /// Empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Texture for tile `index` of `sheet`, uploading it if needed
    pub fn get(&mut self, store: &TilesetStore, sheet: &SheetKey, index: usize) -> Option<&Texture2D> {
        let key = (sheet.clone(), index);
        if !self.textures.contains_key(&key) {
            let image = store.sheet_images(sheet)?.get(index)?;
            let tex = Texture2D::from_image(image);
            tex.set_filter(FilterMode::Nearest);
            self.textures.insert(key.clone(), tex);
        }
        self.textures.get(&key)
    }

    /// Drops every texture of a tileset
    pub fn invalidate(&mut self, tileset: &str) {
        self.textures.retain(|(sheet, _), _| sheet.tileset != tileset);
    }

    /// Drops everything
    pub fn clear(&mut self) {
        self.textures.clear();
    }
}

/// Draws every mounted tile, bottom layer first
pub fn draw_viewport(renderer: &ViewportRenderer<TileAsset>, store: &TilesetStore, cache: &mut TextureCache) {
    let size = renderer.tile_pixel_size().as_vec2() * renderer.display_scale();

    let mut layers: Vec<_> = renderer.layers().iter().collect();
    layers.sort_by_key(|l| l.z_index);

    for layer in layers {
        for tile in layer.tiles.values() {
            let pos = renderer.container_to_screen(tile.pixel);
            match &tile.asset {
                TileAsset::Vector { code, edged } => {
                    for shape in vector_shapes(*code, *edged) {
                        draw_rectangle(
                            pos.x + shape.rect.x * size.x,
                            pos.y + shape.rect.y * size.y,
                            shape.rect.w * size.x,
                            shape.rect.h * size.y,
                            layer.style.fill(shape.fill),
                        );
                    }
                }
                TileAsset::Raster { sheet, index } => match cache.get(store, sheet, *index) {
                    Some(tex) => draw_texture_ex(
                        tex,
                        pos.x,
                        pos.y,
                        WHITE,
                        DrawTextureParams {
                            dest_size: Some(size),
                            ..Default::default()
                        },
                    ),
                    None => draw_missing(pos, size),
                },
                TileAsset::Missing => draw_missing(pos, size),
            }
        }
    }
}

/// Red crossed box where art is missing
pub fn draw_missing(pos: Vec2, size: Vec2) {
    draw_rectangle_lines(pos.x, pos.y, size.x, size.y, 2.0, RED);
    draw_line(pos.x, pos.y, pos.x + size.x, pos.y + size.y, 2.0, RED);
    draw_line(pos.x + size.x, pos.y, pos.x, pos.y + size.y, 2.0, RED);
}

/// Outline of the center cell
pub fn draw_reticle(renderer: &ViewportRenderer<TileAsset>) {
    let r = renderer.reticle_rect();
    draw_rectangle_lines(r.x, r.y, r.w, r.h, 3.0, WHITE);
}

/// Outline of the cell under the pointer
pub fn draw_pointer(renderer: &ViewportRenderer<TileAsset>, cell: crate::geom::Xy, color: Color) {
    let r = renderer.cell_rect(cell);
    draw_rectangle_lines(r.x, r.y, r.w, r.h, 2.0, color);
}
