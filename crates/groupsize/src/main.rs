use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use color_eyre::eyre::{WrapErr, eyre};
use groupsize::io::{RunManifest, save_analysis, save_simulation_data};
use groupsize::{Preset, SweepFile, init_logging, run_sweep};
use groupsize_core::sweep::SweepProgress;

const PROGRESS_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Parser, Debug)]
#[command(name = "groupsize")]
#[command(about = "Simulate how group size shapes observed disparities between two groups")]
struct Args {
    /// Sweep definition file (YAML)
    #[arg(conflicts_with = "preset")]
    config: Option<PathBuf>,

    /// Built-in sweep (standard, normalized_indirect)
    #[arg(short, long)]
    preset: Option<Preset>,

    /// Directory for the CSV outputs and manifest
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Seed for stochastic models, overriding the sweep file
    #[arg(long)]
    seed: Option<u64>,

    /// Evaluate combinations on a single thread
    #[arg(long)]
    sequential: bool,

    /// Append deviation-from-average columns to the simulation CSV
    #[arg(long)]
    with_deviation: bool,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn load_sweep(args: &Args) -> color_eyre::Result<SweepFile> {
    match (&args.config, args.preset) {
        (Some(path), _) => SweepFile::load(path)
            .wrap_err_with(|| format!("Failed to load sweep file {}", path.display())),
        (None, Some(preset)) => Ok(preset.sweep_file()?),
        (None, None) => Err(eyre!("Provide a sweep file or --preset")),
    }
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_logging(&args.log_level)?;

    let sweep = load_sweep(&args)?;
    let grid = sweep.grid()?;
    let options = sweep.runner_options(args.seed, args.sequential);

    tracing::info!(
        name = %sweep.name,
        model = %sweep.model,
        points = grid.total_points(),
        seed = ?sweep.model.is_stochastic().then_some(options.seed),
        parallel = options.parallel,
        "Running sweep"
    );

    let started = Instant::now();
    let progress = SweepProgress::new(grid.total_points());
    let mut table = run_sweep(&sweep, &grid, options, &progress, PROGRESS_INTERVAL)
        .wrap_err_with(|| format!("Sweep '{}' failed", sweep.name))?;
    tracing::info!(
        rows = table.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Sweep complete"
    );

    table.round_parameter("z_position_gap", 1);

    let stem = sweep.file_stem();
    save_simulation_data(&args.output_dir, &stem, &table, args.with_deviation)?;
    save_analysis(&args.output_dir, &stem, &table)?;

    let manifest = RunManifest {
        name: sweep.name.clone(),
        model: sweep.model,
        seed: options.seed,
        parallel: options.parallel,
        total_points: grid.total_points(),
        columns: table.columns(args.with_deviation),
        created: jiff::Timestamp::now(),
    };
    let manifest_path = manifest.save(&args.output_dir, &stem)?;
    tracing::info!(path = %manifest_path.display(), "Manifest saved");

    Ok(())
}
