use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use glam::IVec2;
use seagrid_common::is_power_of_two_size;
use seagrid_core::{Grid, PipelineConfig};
use seagrid_persist::{GridStore, load_grid, save_grid};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "seagrid-cli", about = "CLI tool for grid operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Build a grid from a pipeline config and write it to a grid file
    Generate {
        /// Pipeline config (.yaml, .yml or .json); built-in default when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output grid file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Apply one resampling operator to a grid file
    Resample {
        input: PathBuf,
        output: PathBuf,
        #[arg(long, value_enum)]
        op: ResampleOp,
        /// Wrap at the borders (upsampling)
        #[arg(long)]
        wrap: bool,
        /// Drop the odd trailing row and column (downsampling)
        #[arg(long)]
        force_even: bool,
    },
    /// Print size and value range of a grid file
    Stats {
        file: PathBuf,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Store a grid and its successive downsamplings in a grid store
    Pyramid {
        input: PathBuf,
        /// Grid store directory
        #[arg(short, long)]
        store: PathBuf,
        /// Maximum number of levels, including the input
        #[arg(short, long, default_value = "8")]
        levels: u32,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ResampleOp {
    Upsample,
    SmoothUpsample,
    Downsample,
    Transpose,
}

#[derive(Debug, Serialize)]
struct GridStats {
    width: i32,
    height: i32,
    power_of_two: bool,
    min: f32,
    max: f32,
    max_abs: f32,
}

impl GridStats {
    fn of(grid: &Grid<f32>) -> anyhow::Result<Self> {
        Ok(Self {
            width: grid.width(),
            height: grid.height(),
            power_of_two: is_power_of_two_size(grid.size()),
            min: grid.get_min()?,
            max: grid.get_max()?,
            max_abs: grid.get_max_abs()?,
        })
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&text)?,
        Some("yaml" | "yml") => serde_yaml::from_str(&text)?,
        other => anyhow::bail!("unsupported config extension: {other:?}"),
    };
    Ok(config)
}

fn resample(
    grid: &Grid<f32>,
    op: ResampleOp,
    wrap: bool,
    force_even: bool,
) -> anyhow::Result<Grid<f32>> {
    let out = match op {
        ResampleOp::Upsample => grid.upsampled(wrap)?,
        ResampleOp::SmoothUpsample => grid.smooth_upsampled(wrap)?,
        ResampleOp::Downsample => grid.downsampled(force_even),
        ResampleOp::Transpose => grid.transposed(),
    };
    Ok(out)
}

/// Store `grid` as `level0` and each further downsampling as `levelN`
/// until a side reaches 1 or `levels` is hit. Returns the number stored.
fn build_pyramid(store: &mut GridStore, grid: Grid<f32>, levels: u32) -> anyhow::Result<u32> {
    let mut current = grid;
    let mut stored = 0;
    while stored < levels {
        store.put(&format!("level{stored}"), &current)?;
        stored += 1;
        if current.width() <= 1 || current.height() <= 1 {
            break;
        }
        current = current.downsampled(false);
    }
    Ok(stored)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("seagrid-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", seagrid_common::crate_info());
            println!("core: {}", seagrid_core::crate_info());
            println!("persist: {}", seagrid_persist::crate_info());
            println!("grid file schema: v{}", seagrid_persist::GRID_SCHEMA_VERSION);
        }
        Commands::Generate { config, output } => {
            let config = load_config(config.as_deref())?;
            let grid = config.run()?;
            save_grid(&output, &grid)?;
            println!(
                "Generated {}x{} grid -> {}",
                grid.width(),
                grid.height(),
                output.display()
            );
        }
        Commands::Resample {
            input,
            output,
            op,
            wrap,
            force_even,
        } => {
            let grid: Grid<f32> = load_grid(&input)?;
            let out = resample(&grid, op, wrap, force_even)?;
            save_grid(&output, &out)?;
            println!(
                "{op:?}: {} -> {}",
                fmt_size(grid.size()),
                fmt_size(out.size())
            );
        }
        Commands::Stats { file, json } => {
            let grid: Grid<f32> = load_grid(&file)?;
            let stats = GridStats::of(&grid)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("size: {}x{}", stats.width, stats.height);
                println!("power of two: {}", stats.power_of_two);
                println!("min: {}", stats.min);
                println!("max: {}", stats.max);
                println!("max abs: {}", stats.max_abs);
            }
        }
        Commands::Pyramid {
            input,
            store,
            levels,
        } => {
            let grid: Grid<f32> = load_grid(&input)?;
            let mut store = GridStore::open(&store)?;
            let stored = build_pyramid(&mut store, grid, levels)?;
            store.verify_integrity()?;
            println!(
                "Stored {stored} levels in {} (integrity OK)",
                store.root().display()
            );
        }
    }

    Ok(())
}

fn fmt_size(size: IVec2) -> String {
    format!("{}x{}", size.x, size.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn ramp(side: i32) -> Grid<f32> {
        Grid::from_fn(IVec2::splat(side), |p| (p.x + p.y) as f32).unwrap()
    }

    #[test]
    fn default_config_without_path() {
        let config = load_config(None).unwrap();
        assert_eq!(config.output_size(), PipelineConfig::default().output_size());
    }

    #[test]
    fn config_extension_selects_format() {
        let tmp = tempfile::tempdir().unwrap();
        let yaml = tmp.path().join("p.yaml");
        std::fs::write(
            &yaml,
            "source:\n  width: 8\n  height: 4\n  pattern:\n    kind: ramp\nsteps:\n  - op: transpose\n",
        )
        .unwrap();
        assert_eq!(load_config(Some(&yaml)).unwrap().output_size(), IVec2::new(4, 8));

        let json = tmp.path().join("p.json");
        std::fs::write(&json, r#"{"source": {"width": 4, "height": 4}, "steps": []}"#).unwrap();
        assert_eq!(load_config(Some(&json)).unwrap().output_size(), IVec2::new(4, 4));

        let toml = tmp.path().join("p.toml");
        std::fs::write(&toml, "").unwrap();
        assert!(load_config(Some(&toml)).is_err());
    }

    #[test]
    fn resample_ops_change_size() {
        let g = ramp(4);
        let up = resample(&g, ResampleOp::SmoothUpsample, true, false).unwrap();
        assert_eq!(up.size(), IVec2::splat(8));
        let down = resample(&g, ResampleOp::Downsample, false, false).unwrap();
        assert_eq!(down.size(), IVec2::splat(2));
    }

    #[test]
    fn wrap_works_on_any_size() {
        let up = resample(&ramp(3), ResampleOp::SmoothUpsample, true, false).unwrap();
        assert_eq!(up.size(), IVec2::splat(6));

        let cmd = Cli::command();
        let wrap = cmd
            .find_subcommand("resample")
            .and_then(|c| c.get_arguments().find(|a| a.get_id() == "wrap"))
            .unwrap();
        let help = wrap.get_help().unwrap().to_string();
        assert!(!help.contains("power-of-two"), "{help}");
    }

    #[test]
    fn stats_of_ramp() {
        let stats = GridStats::of(&ramp(4)).unwrap();
        assert_eq!((stats.min, stats.max, stats.max_abs), (0.0, 6.0, 6.0));
        assert!(stats.power_of_two);
    }

    #[test]
    fn pyramid_stops_at_single_cell() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = GridStore::open(tmp.path()).unwrap();
        let stored = build_pyramid(&mut store, ramp(8), 10).unwrap();
        assert_eq!(stored, 4);
        assert_eq!(store.get::<f32>("level3").unwrap().size(), IVec2::ONE);
    }
}
