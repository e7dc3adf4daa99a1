use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use harpia::{MissionConfig, run_mission};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, Parser)]
#[command(
    name = "harpia",
    version,
    about = "Plan an elevation-aware drone route over survey features and a DSM"
)]
#[command(group(ArgGroup::new("input").required(true).args(["config", "features"])))]
#[command(group(
    ArgGroup::new("mission")
        .multiple(true)
        .conflicts_with("config")
        .args([
            "features", "dsm", "aoi", "aoi_index", "aoi_qualifier", "takeoff_coords",
            "takeoff_coords_projected", "output_path", "output_filename", "feature_buffer",
            "path_buffer", "time_limit",
        ])
))]
struct Args {
    /// YAML mission file. Mission flags are rejected alongside it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Point or polygon features (GeoPackage, Shapefile, ...)
    #[arg(short, long, requires = "dsm")]
    features: Option<PathBuf>,

    #[arg(long)]
    dsm: Option<PathBuf>,

    #[arg(long)]
    aoi: Option<PathBuf>,

    /// 1-based AOI polygon index
    #[arg(short = 'i', long)]
    aoi_index: Option<usize>,

    /// Suffix for output names when an AOI polygon is selected
    #[arg(short = 'q', long)]
    aoi_qualifier: Option<String>,

    /// (x, y) in the DSM CRS with --takeoff-coords-projected, otherwise (lat, lon)
    #[arg(short = 't', long, num_args = 2, value_names = ["X", "Y"], allow_negative_numbers = true)]
    takeoff_coords: Option<Vec<f64>>,

    #[arg(short = 'p', long)]
    takeoff_coords_projected: bool,

    #[arg(long)]
    output_path: Option<PathBuf>,

    #[arg(long)]
    output_filename: Option<String>,

    #[arg(long)]
    feature_buffer: Option<f64>,

    #[arg(long)]
    path_buffer: Option<f64>,

    /// Solver wall-clock budget in seconds
    #[arg(long)]
    time_limit: Option<u64>,

    #[arg(short, long)]
    debug: bool,
}

fn main() {
    let args = Args::parse();
    init_tracing(args.debug);

    if let Err(e) = logic(args) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(debug: bool) {
    let default = if debug { "harpia=debug" } else { "harpia=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(filter)
        .init();
}

fn logic(args: Args) -> Result<()> {
    let mission = mission_from_args(args)?;
    let paths = mission.output_paths()?;

    info!("Planning mission {} from {:?}", paths.name, mission.features_path);
    let records = run_mission(&mission, &paths)?;

    info!("Done: {} records in {:?}", records.len(), paths.csv);
    Ok(())
}

fn mission_from_args(args: Args) -> Result<MissionConfig> {
    if let Some(path) = &args.config {
        return MissionConfig::from_yaml_file(path)
            .with_context(|| format!("Loading mission config {path:?}"));
    }

    let (Some(features), Some(dsm)) = (args.features, args.dsm) else {
        anyhow::bail!("--features and --dsm are required without --config");
    };

    let mut mission = MissionConfig::new(features, dsm);
    mission.aoi_path = args.aoi;
    mission.aoi_index = args.aoi_index;
    mission.aoi_qualifier = args.aoi_qualifier;
    mission.takeoff_coords = args.takeoff_coords.and_then(|v| v.try_into().ok());
    mission.takeoff_coords_projected = args.takeoff_coords_projected;
    mission.output_folder = args.output_path;
    mission.output_filename = args.output_filename;

    if let Some(radius) = args.feature_buffer {
        mission.planner.feature_buffer = radius;
    }
    if let Some(radius) = args.path_buffer {
        mission.planner.path_buffer = radius;
    }
    if let Some(secs) = args.time_limit {
        mission.planner.solver_time_limit_secs = secs;
    }

    mission.validate()?;
    Ok(mission)
}
