mod app;
mod config;

use app::App;
use clap::Parser;
use config::AppConfig;
use dla_field::{Field, FieldSnapshot, NeighborhoodType, RootAnchor};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dla-field")]
#[command(about = "Grow a Diffusion-Limited Aggregation field and save it as a snapshot")]
struct Args {
    /// Load settings from a JSON config file (flags below override it)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective config to this file and continue
    #[arg(long = "write-config")]
    write_config: Option<PathBuf>,

    /// Number of agents, root included
    #[arg(short = 'a', long)]
    agents: Option<usize>,

    /// Field width in cells
    #[arg(long)]
    width: Option<usize>,

    /// Field height in cells
    #[arg(long)]
    height: Option<usize>,

    /// RNG seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Neighborhood for walking and sticking (vonneumann, moore)
    #[arg(long)]
    neighborhood: Option<String>,

    /// Root anchor (center, bottom)
    #[arg(long)]
    anchor: Option<String>,

    /// Simulation speed (ticks per frame, 1-1000)
    #[arg(long)]
    speed: Option<usize>,

    /// Stop after this many ticks
    #[arg(long = "max-ticks")]
    max_ticks: Option<u64>,

    /// Snapshot file (defaults to the platform data directory)
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Rebuild the field from the snapshot instead of seeding a new one
    #[arg(long, default_value = "false")]
    restore: bool,

    /// Do not save the snapshot after the run
    #[arg(long = "no-save", default_value = "false")]
    no_save: bool,
}

fn parse_neighborhood(s: &str) -> NeighborhoodType {
    match s.to_lowercase().as_str() {
        "vonneumann" | "von-neumann" | "vn" | "4" => NeighborhoodType::VonNeumann,
        _ => NeighborhoodType::Moore,
    }
}

fn parse_anchor(s: &str) -> RootAnchor {
    match s.to_lowercase().as_str() {
        "bottom" | "bottom-center" | "floor" => RootAnchor::BottomCenter,
        _ => RootAnchor::Center,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut app_config = match &args.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::default(),
    };

    // Apply CLI overrides
    if let Some(agents) = args.agents {
        app_config.agent_count = agents;
    }
    if let Some(width) = args.width {
        app_config.width = width;
    }
    if let Some(height) = args.height {
        app_config.height = height;
    }
    if let Some(seed) = args.seed {
        app_config.field.seed = Some(seed);
    }
    if let Some(neighborhood) = &args.neighborhood {
        app_config.field.neighborhood = parse_neighborhood(neighborhood);
    }
    if let Some(anchor) = &args.anchor {
        app_config.field.root_anchor = parse_anchor(anchor);
    }
    if let Some(speed) = args.speed {
        app_config.steps_per_frame = speed.clamp(1, 1000);
    }
    if args.max_ticks.is_some() {
        app_config.max_ticks = args.max_ticks;
    }

    if let Some(path) = &args.write_config {
        app_config.save_to_file(path)?;
        info!(path = %path.display(), "config written");
    }

    let snapshot_path = args.snapshot.clone().or_else(config::default_snapshot_path);

    let field = if args.restore {
        let path = snapshot_path
            .as_deref()
            .ok_or("no snapshot path given and no data directory available")?;
        let snapshot = FieldSnapshot::load_from_file(path)?;
        info!(
            path = %path.display(),
            width = snapshot.width,
            height = snapshot.height,
            agents = snapshot.records.len(),
            tick = snapshot.tick,
            "restoring field"
        );
        snapshot.restore()?
    } else {
        Field::with_settings(
            app_config.agent_count,
            app_config.width,
            app_config.height,
            app_config.field.clone(),
        )?
    };
    info!(
        width = field.get_width(),
        height = field.get_height(),
        agents = field.get_num_agents(),
        seed = field.seed(),
        neighborhood = field.settings().neighborhood.short_name(),
        anchor = field.settings().root_anchor.name(),
        "field ready"
    );

    let mut app = App::new(field, app_config.steps_per_frame, app_config.max_ticks);
    let summary = app.run_to_completion();

    if summary.complete {
        info!(
            ticks = summary.ticks,
            stuck = summary.stuck,
            longest_chain = summary.tallest,
            "completed run"
        );
    } else {
        warn!(
            ticks = summary.ticks,
            stuck = summary.stuck,
            wandering = summary.wandering,
            longest_chain = summary.tallest,
            "stopped at tick limit"
        );
    }

    if !args.no_save {
        match snapshot_path {
            Some(path) => {
                FieldSnapshot::capture(&app.field).save_to_file(&path)?;
                info!(path = %path.display(), "snapshot saved");
            }
            None => warn!("no data directory available, snapshot not saved"),
        }
    }

    Ok(())
}
