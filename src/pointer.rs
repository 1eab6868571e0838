//! Mouse and keyboard editing rules for the map view.

use crate::geom::Xy;
use crate::layer::TileData;
use crate::map::MapData;
use macroquad::input::KeyCode;
use std::fmt;

/// Active edit tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerType {
    /// No tool
    #[default]
    None,
    /// Paint cells on
    Add,
    /// Paint cells off
    Remove,
    /// Pick a layer
    Select,
}

impl fmt::Display for PointerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PointerType::None => "None",
            PointerType::Add => "Add",
            PointerType::Remove => "Remove",
            PointerType::Select => "Select",
        };
        f.write_str(name)
    }
}

/// Whether clicks move the camera or edit cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditState {
    /// Clicks move the camera; walkability is enforced
    #[default]
    Normal,
    /// Clicks edit; the camera may go anywhere
    Edit,
}

/// What a pointer event asks the caller to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerAction {
    /// Center the view on a cell, walkable cells only
    MoveTo(Xy),
    /// A cell was written
    Edited {
        /// Cell
        coord: Xy,
        /// Layer written, -1 for all
        layer: i32,
    },
    /// The select tool picked this layer
    Selected(TileData),
}

/// Pointer state across mouse events
#[derive(Debug, Default)]
pub struct PointerController {
    state: EditState,
    pointer: PointerType,
    location: Xy,
    location_data: Option<TileData>,
    saved: Option<TileData>,
    selected_location: Xy,
    selected_data: Option<TileData>,
}

impl PointerController {
    /// Normal state, no tool
    pub fn new() -> Self {
        Self::default()
    }

    /// Switches state. Entering edit picks the select tool.
    pub fn set_state(&mut self, state: EditState) {
        self.state = state;
        self.saved = None;
        self.pointer = match state {
            EditState::Edit => PointerType::Select,
            EditState::Normal => PointerType::None,
        };
    }

    /// Current state
    pub fn state(&self) -> EditState {
        self.state
    }

    /// Picks a tool
    pub fn set_pointer(&mut self, pointer: PointerType) {
        self.pointer = pointer;
    }

    /// Current tool
    pub fn pointer(&self) -> PointerType {
        self.pointer
    }

    /// Cell under the mouse
    pub fn location(&self) -> Xy {
        self.location
    }

    /// Cell and data of the last mouse release
    pub fn selected(&self) -> (Xy, Option<&TileData>) {
        (self.selected_location, self.selected_data.as_ref())
    }

    /// Camera moves ignore walkability while editing
    pub fn moves_anywhere(&self) -> bool {
        self.state == EditState::Edit
    }

    /// Primary button pressed over `coord`
    pub fn mouse_down(&mut self, map: &mut MapData, coord: Xy) -> Option<PointerAction> {
        match self.state {
            EditState::Normal => Some(PointerAction::MoveTo(coord)),
            EditState::Edit => {
                self.location = coord;
                let top = map.get_top_most_map_data(coord);
                self.update_map_data_at_pointer(map, Some(top))
            }
        }
    }

    /// Mouse moved to `coord`. Dragging with the button held keeps painting
    /// on the layer picked at mouse down.
    pub fn mouse_move(&mut self, map: &mut MapData, coord: Xy, primary_down: bool) -> Option<PointerAction> {
        if coord == self.location {
            return None;
        }
        self.location = coord;
        self.location_data = Some(map.get_top_most_map_data(coord));

        if self.state != EditState::Edit {
            return None;
        }
        if primary_down {
            self.update_map_data_at_pointer(map, None)
        } else {
            self.saved = None;
            None
        }
    }

    /// Button released over `coord`
    pub fn mouse_up(&mut self, map: &MapData, coord: Xy) {
        self.selected_location = coord;
        self.selected_data = Some(map.get_top_most_map_data(coord));
    }

    /// Applies the current tool at the pointer. `tile_data`, when given,
    /// becomes the layer that later drags write to.
    pub fn update_map_data_at_pointer(
        &mut self,
        map: &mut MapData,
        tile_data: Option<TileData>,
    ) -> Option<PointerAction> {
        if let Some(t) = tile_data {
            self.saved = Some(t);
        }
        let saved = self.saved.as_ref()?;
        let coord = self.location;

        let (layer, value) = match self.pointer {
            PointerType::None => return None,
            PointerType::Select => return Some(PointerAction::Selected(saved.clone())),
            // nothing under the pointer: paint the bottom layer
            PointerType::Add => (saved.layer.max(0), 1),
            PointerType::Remove => (saved.layer, 0),
        };

        map.set_map_data(coord.x, coord.y, layer, value)
            .then_some(PointerAction::Edited { coord, layer })
    }

    /// Hover label in edit mode: tool, tileset and layer under the pointer
    pub fn label_text(&self) -> String {
        if self.state != EditState::Edit || self.saved.is_some() {
            return String::new();
        }
        match &self.location_data {
            Some(d) => format!(
                "{} {}\nLayer: {}",
                self.pointer,
                d.tileset.as_deref().unwrap_or("-"),
                d.layer
            ),
            None => String::new(),
        }
    }

    /// Camera step for a key: arrows and WASD move straight, QEZC diagonally
    pub fn key_delta(key: KeyCode) -> Option<Xy> {
        let d = match key {
            KeyCode::Up | KeyCode::W => Xy::new(0, -1),
            KeyCode::Down | KeyCode::S => Xy::new(0, 1),
            KeyCode::Left | KeyCode::A => Xy::new(-1, 0),
            KeyCode::Right | KeyCode::D => Xy::new(1, 0),
            KeyCode::Q => Xy::new(-1, -1),
            KeyCode::E => Xy::new(1, -1),
            KeyCode::Z => Xy::new(-1, 1),
            KeyCode::C => Xy::new(1, 1),
            _ => return None,
        };
        Some(d)
    }

    /// Camera step for a wheel movement; positive `delta_y` scrolls down
    pub fn wheel_delta(delta_y: f32) -> Option<Xy> {
        if delta_y == 0.0 {
            return None;
        }
        Some(Xy::new(0, if delta_y > 0.0 { 1 } else { -1 }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use crate::layer::TileLayer;
    use crate::map::MapRenderData;

    fn map() -> MapData {
        let size = Xy::new(4, 4);
        let layer = |name: &str, cells: Vec<u8>| TileLayer {
            tileset: name.to_string(),
            can_walk: true,
            color: "#ffffff".to_string(),
            map: Grid::from_vec(size, cells).unwrap(),
        };
        let mut map = MapData::with_rng_seed(3);
        map.load_map_data(MapRenderData {
            start: Xy::new(1, 1),
            map_data_size: size,
            layers: vec![
                layer("Sand", vec![1; 16]),
                layer("Rock", {
                    let mut v = vec![0; 16];
                    v[5] = 1;
                    v
                }),
            ],
        })
        .unwrap();
        map
    }

    #[test]
    fn normal_click_moves_camera() {
        let mut map = map();
        let mut p = PointerController::new();
        assert_eq!(
            p.mouse_down(&mut map, Xy::new(2, 2)),
            Some(PointerAction::MoveTo(Xy::new(2, 2)))
        );
    }

    #[test]
    fn drag_removes_on_the_layer_picked_at_mouse_down() {
        let mut map = map();
        let mut p = PointerController::new();
        p.set_state(EditState::Edit);
        p.set_pointer(PointerType::Remove);

        let action = p.mouse_down(&mut map, Xy::new(1, 1));
        assert_eq!(action, Some(PointerAction::Edited { coord: Xy::new(1, 1), layer: 1 }));
        assert_eq!(map.get_map_data(1, 1, 1), 0);

        p.mouse_move(&mut map, Xy::new(2, 1), true);
        // layer 0 untouched: the drag writes to layer 1 only
        assert_eq!(map.get_map_data(2, 1, 0), 1);
    }

    #[test]
    fn add_on_empty_cell_paints_bottom_layer() {
        let mut map = map();
        map.set_map_data(3, 3, -1, 0);
        let mut p = PointerController::new();
        p.set_state(EditState::Edit);
        p.set_pointer(PointerType::Add);
        let action = p.mouse_down(&mut map, Xy::new(3, 3));
        assert_eq!(action, Some(PointerAction::Edited { coord: Xy::new(3, 3), layer: 0 }));
        assert_eq!(map.get_map_data(3, 3, 0), 1);
        assert_eq!(map.get_map_data(3, 3, 1), 0);
    }

    #[test]
    fn select_reports_layer_without_editing() {
        let mut map = map();
        let mut p = PointerController::new();
        p.set_state(EditState::Edit);
        let action = p.mouse_down(&mut map, Xy::new(1, 1));
        assert!(matches!(action, Some(PointerAction::Selected(d)) if d.layer == 1));
        assert_eq!(map.get_map_data(1, 1, 1), 1);
    }

    #[test]
    fn hover_label_names_tool_and_layer() {
        let mut map = map();
        let mut p = PointerController::new();
        p.set_state(EditState::Edit);
        p.mouse_move(&mut map, Xy::new(1, 1), false);
        assert_eq!(p.label_text(), "Select Rock\nLayer: 1");
    }

    #[test]
    fn keys_and_wheel_map_to_steps() {
        assert_eq!(PointerController::key_delta(KeyCode::Q), Some(Xy::new(-1, -1)));
        assert_eq!(PointerController::key_delta(KeyCode::D), Some(Xy::new(1, 0)));
        assert_eq!(PointerController::key_delta(KeyCode::G), None);
        assert_eq!(PointerController::wheel_delta(3.0), Some(Xy::new(0, 1)));
        assert_eq!(PointerController::wheel_delta(0.0), None);
    }
}
