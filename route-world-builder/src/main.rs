/// Route world builder command line entry point
use clap::Parser;
use route_world_builder::export::{ExportOptions, export_world, generate_programmatic_name};
use route_world_builder::gpx_track::read_gpx_file;
use route_world_builder::{GenerationConfig, WorldBuilder};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Build terrain, road and route assets from a GPX track.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Input GPX track
    input: PathBuf,

    /// Output directory (defaults to the input's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// JSON file with generation settings; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Detail level 1-5
    #[arg(long)]
    detail: Option<u8>,

    /// Terrain style, 0 = natural, 1 = dramatic
    #[arg(long)]
    style: Option<f64>,

    #[arg(long)]
    seed: Option<u32>,

    #[arg(long)]
    road_width: Option<f64>,

    #[arg(long)]
    road_embed: Option<f64>,

    #[arg(long)]
    road_thickness: Option<f64>,

    #[arg(long)]
    terrain_margin: Option<f64>,

    /// Moving-average window for the track, in points each side
    #[arg(long)]
    smoothing_window: Option<usize>,

    #[arg(long)]
    smoothing_iterations: Option<usize>,

    /// Ease terrain next to the road toward the road surface
    #[arg(long)]
    terrain_transition: bool,

    #[arg(long)]
    no_terrain: bool,

    #[arg(long)]
    no_road: bool,

    /// Write the DDS heightmap as R16F instead of R32F
    #[arg(long)]
    half_heightmap: bool,

    /// Hide progress bars
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn apply_overrides(&self, config: &mut GenerationConfig) {
        if let Some(v) = self.detail {
            config.detail = v;
        }
        if let Some(v) = self.style {
            config.style = v;
        }
        if let Some(v) = self.seed {
            config.seed = v;
        }
        if let Some(v) = self.road_width {
            config.road_width_m = v;
        }
        if let Some(v) = self.road_embed {
            config.road_embed_m = v;
        }
        if let Some(v) = self.road_thickness {
            config.road_thickness_m = v;
        }
        if let Some(v) = self.terrain_margin {
            config.terrain_margin_m = v;
        }
        if let Some(v) = self.smoothing_window {
            config.gpx_smoothing_window = v;
        }
        if let Some(v) = self.smoothing_iterations {
            config.gpx_smoothing_iterations = v;
        }
        if self.terrain_transition {
            config.transition.enabled = true;
        }
        if self.no_terrain {
            config.create_terrain = false;
        }
        if self.no_road {
            config.create_road_mesh = false;
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => GenerationConfig::from_json_file(path)?,
        None => GenerationConfig::default(),
    };
    args.apply_overrides(&mut config);

    let output_dir = args.output_dir.clone().unwrap_or_else(|| {
        args.input
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    });
    let stem = args
        .input
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    let name = generate_programmatic_name(&stem);

    info!("Reading {}", args.input.display());
    let track = read_gpx_file(&args.input)?;

    let builder = WorldBuilder::new(config)?.with_progress(!args.quiet);
    let effective = builder.config();
    info!(
        "Road {} m wide, {} m thick; terrain {}, road mesh {}",
        effective.road_width_m,
        effective.road_thickness_m,
        if effective.create_terrain { "on" } else { "off" },
        if effective.create_road_mesh { "on" } else { "off" }
    );
    let world = builder.build(&track)?;

    let options = ExportOptions {
        half_heightmap: args.half_heightmap,
    };
    export_world(&world, &output_dir, &name, options)?;

    info!("World build complete: {}", output_dir.display());
    Ok(())
}
