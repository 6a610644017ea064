//! Grid core: dense 2D sample grids and their resampling operators.
//!
//! # Invariants
//! - `grid.len() == width * height` at all times; dimensions are never negative.
//! - Resampling operators (`upsampled`, `downsampled`, `smooth_upsampled`,
//!   `shifted`, `transposed`, `sub_area`) are pure and return new grids.
//! - `add_tiled`, `add_shifted`, `insert` and the arithmetic operators mutate
//!   in place and only borrow their other operand.
//! - Wraparound via `coord & (dim - 1)` needs power-of-two dimensions. That
//!   precondition is debug-asserted, not checked in release builds.

mod error;
mod grid;
mod noise;
pub mod pipeline;
mod resample;

pub use error::GridError;
pub use grid::Grid;
pub use noise::NoiseRng;
pub use pipeline::{Pattern, PipelineConfig, SourceConfig, Step};

pub fn crate_info() -> &'static str {
    "seagrid-core v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec2;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("core"));
    }

    /// Downsampling an upsampled constant field returns the original field.
    #[test]
    fn constant_field_survives_round_trip() {
        let g = Grid::new(IVec2::new(4, 4), 0.5f32).unwrap();
        let down = g.downsampled(false);
        assert_eq!(down.size(), IVec2::new(2, 2));
        let up = down.upsampled(true).unwrap();
        assert_eq!(up, g);
    }
}
