//! Viewport state, culling and Macroquad drawing.

pub mod cull;
pub mod draw;
pub mod style;
pub mod viewport;
