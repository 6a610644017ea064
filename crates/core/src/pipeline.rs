//! Declarative resampling pipelines for `f32` height fields.
//!
//! A [`PipelineConfig`] names a generated source field and a list of steps.
//! It is plain serde data so it can live in a YAML or JSON file.

use glam::IVec2;
use seagrid_common::{is_power_of_two, is_power_of_two_size};
use serde::{Deserialize, Serialize};

use crate::error::GridError;
use crate::grid::Grid;
use crate::noise::NoiseRng;

/// How the source field is filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Pattern {
    /// Every cell holds `value`.
    Constant { value: f32 },
    /// Diagonal ramp from 0 at the origin to 1 at the far corner.
    Ramp,
    /// Alternating 0/1 squares of `cell` samples.
    Checker { cell: i32 },
    /// Bell-distributed noise in `[-scale, scale]`.
    Noise { seed: u64, scale: f32 },
}

/// Size and pattern of the generated source field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub width: i32,
    pub height: i32,
    pub pattern: Pattern,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            width: 64,
            height: 64,
            pattern: Pattern::Noise {
                seed: 42,
                scale: 1.0,
            },
        }
    }
}

impl SourceConfig {
    pub fn size(&self) -> IVec2 {
        IVec2::new(self.width, self.height)
    }

    /// Generate the source field.
    pub fn build(&self) -> Result<Grid<f32>, GridError> {
        let size = self.size();
        match self.pattern {
            Pattern::Constant { value } => Grid::new(size, value),
            Pattern::Ramp => {
                let span = (self.width + self.height - 2).max(1) as f32;
                Grid::from_fn(size, |p| (p.x + p.y) as f32 / span)
            }
            Pattern::Checker { cell } => {
                if cell <= 0 {
                    return Err(GridError::invalid(format!(
                        "checker cell size {cell} must be positive"
                    )));
                }
                Grid::from_fn(size, |p| ((p.x / cell + p.y / cell) & 1) as f32)
            }
            Pattern::Noise { seed, scale } => Grid::noise(size, scale, seed),
        }
    }
}

/// One resampling or arithmetic step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Upsample {
        #[serde(default)]
        wrap: bool,
    },
    SmoothUpsample {
        #[serde(default)]
        wrap: bool,
    },
    Downsample {
        #[serde(default)]
        force_even_size: bool,
    },
    /// Wrapping shift; the field must have power-of-two dimensions.
    Shift { x: i32, y: i32 },
    Transpose,
    Crop {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
    Scale { factor: f32 },
    Offset { value: f32 },
    AddNoise { seed: u64, scale: f32 },
    /// Tile the largest power-of-two block at the origin back over the
    /// field, weighted by `scale`.
    AddTiledSelf { scale: f32 },
}

/// Largest power of two `<= v`, for `v >= 1`.
fn floor_power_of_two(v: i32) -> i32 {
    debug_assert!(v >= 1);
    1 << (31 - v.leading_zeros())
}

impl Step {
    /// Apply this step, returning the new field.
    pub fn apply(&self, mut grid: Grid<f32>) -> Result<Grid<f32>, GridError> {
        match *self {
            Self::Upsample { wrap } => grid.upsampled(wrap),
            Self::SmoothUpsample { wrap } => grid.smooth_upsampled(wrap),
            Self::Downsample { force_even_size } => Ok(grid.downsampled(force_even_size)),
            Self::Shift { x, y } => {
                if !is_power_of_two_size(grid.size()) {
                    return Err(GridError::invalid(format!(
                        "shift needs power-of-two dimensions, field is {}",
                        grid.size()
                    )));
                }
                Ok(grid.shifted(IVec2::new(x, y)))
            }
            Self::Transpose => Ok(grid.transposed()),
            Self::Crop {
                x,
                y,
                width,
                height,
            } => grid.sub_area(IVec2::new(x, y), IVec2::new(width, height)),
            Self::Scale { factor } => {
                grid *= factor;
                Ok(grid)
            }
            Self::Offset { value } => {
                grid += value;
                Ok(grid)
            }
            Self::AddNoise { seed, scale } => {
                grid.add_gauss_noise(scale, &mut NoiseRng::new(seed));
                Ok(grid)
            }
            Self::AddTiledSelf { scale } => {
                if grid.is_empty() {
                    return Err(GridError::invalid("add_tiled_self on an empty field"));
                }
                let block = IVec2::new(
                    floor_power_of_two(grid.width()),
                    floor_power_of_two(grid.height()),
                );
                debug_assert!(is_power_of_two(block.x) && is_power_of_two(block.y));
                let tile = grid.sub_area(IVec2::ZERO, block)?;
                grid.add_tiled(&tile, scale);
                Ok(grid)
            }
        }
    }
}

/// A source field plus the steps applied to it, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub source: SourceConfig,
    pub steps: Vec<Step>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            steps: vec![Step::SmoothUpsample { wrap: true }],
        }
    }
}

impl PipelineConfig {
    /// Build the source and run every step, stopping at the first error.
    pub fn run(&self) -> Result<Grid<f32>, GridError> {
        let _span = tracing::info_span!("pipeline", steps = self.steps.len()).entered();
        let mut grid = self.source.build()?;
        tracing::debug!(size = %grid.size(), pattern = ?self.source.pattern, "source built");
        for (i, step) in self.steps.iter().enumerate() {
            let from = grid.size();
            grid = step.apply(grid).inspect_err(|e| {
                tracing::warn!(step = i, ?step, error = %e, "pipeline step failed");
            })?;
            tracing::debug!(step = i, ?step, %from, to = %grid.size(), "applied step");
        }
        Ok(grid)
    }

    /// Size of the field `run` would produce, without computing samples.
    pub fn output_size(&self) -> IVec2 {
        self.steps.iter().fold(self.source.size(), |size, step| match *step {
            Step::Upsample { wrap } | Step::SmoothUpsample { wrap } => {
                if wrap { size * 2 } else { size * 2 - IVec2::ONE }
            }
            Step::Downsample { force_even_size } => {
                let half = IVec2::new(size.x >> 1, size.y >> 1);
                if force_even_size {
                    half
                } else {
                    half + IVec2::new(size.x & 1, size.y & 1)
                }
            }
            Step::Transpose => IVec2::new(size.y, size.x),
            Step::Crop { width, height, .. } => IVec2::new(width, height),
            _ => size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(width: i32, height: i32, pattern: Pattern) -> SourceConfig {
        SourceConfig {
            width,
            height,
            pattern,
        }
    }

    #[test]
    fn default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.source.size(), IVec2::new(64, 64));
        assert_eq!(config.output_size(), IVec2::new(128, 128));
    }

    #[test]
    fn patterns_build() {
        let ramp = source(3, 3, Pattern::Ramp).build().unwrap();
        assert_eq!(ramp[IVec2::ZERO], 0.0);
        assert_eq!(ramp[IVec2::new(2, 2)], 1.0);

        let checker = source(4, 4, Pattern::Checker { cell: 2 }).build().unwrap();
        assert_eq!(checker[IVec2::new(1, 1)], 0.0);
        assert_eq!(checker[IVec2::new(2, 1)], 1.0);
        assert_eq!(checker[IVec2::new(3, 3)], 0.0);

        assert!(source(4, 4, Pattern::Checker { cell: 0 }).build().is_err());
        assert!(source(-1, 4, Pattern::Ramp).build().is_err());
    }

    #[test]
    fn run_chains_steps() {
        let config = PipelineConfig {
            source: source(5, 5, Pattern::Constant { value: 2.0 }),
            steps: vec![
                Step::Upsample { wrap: false },
                Step::Crop {
                    x: 1,
                    y: 1,
                    width: 8,
                    height: 4,
                },
                Step::Scale { factor: 0.5 },
                Step::Offset { value: 1.0 },
                Step::Transpose,
                Step::Downsample {
                    force_even_size: true,
                },
            ],
        };
        let grid = config.run().unwrap();
        assert_eq!(grid.size(), IVec2::new(2, 4));
        assert_eq!(grid.size(), config.output_size());
        assert!(grid.iter().all(|&v| v == 2.0));
    }

    #[test]
    fn shift_requires_power_of_two() {
        let step = Step::Shift { x: 1, y: 0 };
        let grid = Grid::new(IVec2::new(3, 4), 0.0).unwrap();
        assert!(matches!(step.apply(grid), Err(GridError::InvalidArgument(_))));

        let grid = Grid::from_fn(IVec2::new(4, 1), |p| p.x as f32).unwrap();
        let shifted = step.apply(grid).unwrap();
        assert_eq!(shifted.as_slice(), &[3.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn add_tiled_self_uses_power_of_two_block() {
        let grid = Grid::from_fn(IVec2::new(3, 1), |p| p.x as f32).unwrap();
        let out = Step::AddTiledSelf { scale: 1.0 }.apply(grid).unwrap();
        // block is 2x1: [0, 1] tiled as 0 1 0
        assert_eq!(out.as_slice(), &[0.0, 2.0, 2.0]);
    }

    #[test]
    fn failing_step_stops_pipeline() {
        let config = PipelineConfig {
            source: source(2, 2, Pattern::Ramp),
            steps: vec![Step::SmoothUpsample { wrap: false }],
        };
        assert!(config.run().is_err());
    }

    #[test]
    fn yaml_config_parses() {
        let yaml = r#"
source:
  width: 16
  height: 16
  pattern:
    kind: noise
    seed: 7
    scale: 0.25
steps:
  - op: smooth_upsample
    wrap: true
  - op: downsample
  - op: add_noise
    seed: 8
    scale: 0.1
  - op: shift
    x: 3
    y: -2
"#;
        let config: PipelineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.steps.len(), 4);
        assert_eq!(
            config.steps[1],
            Step::Downsample {
                force_even_size: false
            }
        );
        let grid = config.run().unwrap();
        assert_eq!(grid.size(), IVec2::new(16, 16));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: PipelineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn floor_power_of_two_values() {
        assert_eq!(floor_power_of_two(1), 1);
        assert_eq!(floor_power_of_two(3), 2);
        assert_eq!(floor_power_of_two(64), 64);
        assert_eq!(floor_power_of_two(100), 64);
    }
}
