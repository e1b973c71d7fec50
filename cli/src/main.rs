use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pokmap_core::database::Database;
use pokmap_core::file_utils::find_files_with_extension;
use pokmap_core::rendering::{image_to_png_bytes, layer_file_name};
use pokmap_core::spawns::load_spawns_csv;
use pokmap_core::style::{ColorMode, MarkerMode, Style};
use pokmap_core::{
    LayerOptions, MapRenderer, Palette, RendererConfig, SpawnLabel, SpawnOverlayOptions,
    color_from_value,
};
use rayon::prelude::*;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(
    name = "pokmap",
    version = "0.1.0",
    about = "Render EverQuest zone map overlays",
    long_about = None
)]
struct Cli {
    /// Path to renderer configuration (TOML)
    #[arg(long, global = true, env = "POKMAP_CONFIG")]
    config: Option<PathBuf>,

    /// Path to log file
    #[arg(long, global = true, default_value = "/tmp/pokmap.log")]
    log_file: PathBuf,

    /// Verbosity level (repeat for more verbose output)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a map file and print its points and segments as JSON
    Parse {
        #[arg(long)]
        file: PathBuf,
    },

    /// Print the bounds of a reference map as JSON
    Bounds {
        #[arg(long)]
        reference: PathBuf,
    },

    /// Render map files into transparent PNG layers
    Render {
        /// Reference map defining bounds and orientation
        #[arg(long)]
        reference: PathBuf,
        /// Map files to render (defaults to the reference)
        #[arg(long)]
        target: Vec<PathBuf>,
        /// Also render every .txt map file in this directory
        #[arg(long)]
        dir: Option<PathBuf>,
        #[arg(long, default_value_t = 1024)]
        width: u32,
        #[arg(long, default_value_t = 1024)]
        height: u32,
        /// Directory for the PNG layers
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        /// spawn | eq | generic
        #[arg(long, default_value = "eq")]
        style: Style,
        /// fixed | perPointRGB | z | value
        #[arg(long, default_value = "perPointRGB")]
        color_mode: ColorMode,
        /// circle | arrow | auto (default: from style)
        #[arg(long)]
        marker: Option<MarkerMode>,
        /// Write blank layers for files without lines or points
        #[arg(long, default_value_t = false)]
        include_empty: bool,
    },

    /// Render a spawn heatmap coloured by spawn chance
    Spawns {
        /// Reference map defining bounds and orientation
        #[arg(long)]
        reference: PathBuf,
        /// CSV with x,y,z,chance,npc_name,label columns
        #[arg(long, conflicts_with = "database")]
        csv: Option<PathBuf>,
        /// SQLite export of the EQEmu world database
        #[arg(long)]
        database: Option<PathBuf>,
        /// Zone short name, e.g. qeynos2
        #[arg(long)]
        zone: Option<String>,
        /// NPC name pattern (SQL LIKE)
        #[arg(long, conflicts_with = "npc_id")]
        npc: Option<String>,
        /// NPC type id; with --zone, only spawns in that zone are kept
        #[arg(long)]
        npc_id: Option<i64>,
        /// Spawn coordinates are already in map space
        #[arg(long, default_value_t = false)]
        map_coords: bool,
        /// index | npc | custom | none
        #[arg(long, default_value = "index")]
        labels: SpawnLabel,
        #[arg(long, default_value_t = 1024)]
        width: u32,
        #[arg(long, default_value_t = 1024)]
        height: u32,
        #[arg(long)]
        out: PathBuf,
    },

    /// Print the heatmap colour for a value
    Color {
        #[arg(long, allow_hyphen_values = true)]
        value: f64,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        vmin: f64,
        #[arg(long, default_value_t = 100.0, allow_hyphen_values = true)]
        vmax: f64,
        #[arg(long, default_value_t = 220)]
        alpha: i32,
        #[arg(long, default_value = "gyr")]
        palette: Palette,
    },
}

fn setup_logging(verbose: u8, log_file: &std::path::Path) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let filter_level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let filter = EnvFilter::from_default_env().add_directive(filter_level.into());

    let file_appender = tracing_appender::rolling::never(
        log_file.parent().unwrap_or(std::path::Path::new(".")),
        log_file.file_name().unwrap_or(std::ffi::OsStr::new("pokmap.log")),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::Layer::new().with_writer(std::io::stderr).with_ansi(true))
        .with(fmt::Layer::new().with_writer(non_blocking).with_ansi(false));

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(guard)
}

fn load_config(path: Option<&std::path::Path>) -> Result<RendererConfig> {
    match path {
        Some(path) => Ok(RendererConfig::from_file(path)?),
        None => Ok(RendererConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _guard = setup_logging(cli.verbose, &cli.log_file)?;

    info!("Starting pokmap CLI");

    let config = load_config(cli.config.as_deref())?;
    let renderer = MapRenderer::new(config);

    match cli.command {
        Commands::Parse { file } => {
            let parsed = renderer.parse_file(&file)?;
            info!(
                "Parsed {} points and {} segments from {:?}",
                parsed.points.len(),
                parsed.segments.len(),
                file
            );
            println!("{}", serde_json::to_string_pretty(&parsed)?);
        }
        Commands::Bounds { reference } => {
            let bounds = renderer.bounds(&reference)?;
            println!("{}", serde_json::to_string_pretty(&bounds)?);
        }
        Commands::Render {
            reference,
            mut target,
            dir,
            width,
            height,
            out_dir,
            style,
            color_mode,
            marker,
            include_empty,
        } => {
            if !reference.exists() {
                anyhow::bail!("Reference map not found: {:?}", reference);
            }
            if let Some(dir) = dir {
                let found = find_files_with_extension(&dir, "txt")?;
                info!("Found {} map files in {:?}", found.len(), dir);
                target.extend(found);
            }
            if target.is_empty() {
                target.push(reference.clone());
            }
            std::fs::create_dir_all(&out_dir)?;

            let mut options = LayerOptions::from_config(renderer.config());
            options.include_empty_layers = include_empty;
            options.points.style = style;
            options.points.color_mode = color_mode;
            options.points.marker_mode = marker;

            let layers = renderer.render_files_to_layers(&reference, &target, width, height, &options)?;
            info!("Rendered {} layers from {} files", layers.len(), target.len());

            let progress = ProgressBar::new(layers.len() as u64);
            progress.set_style(
                ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );

            let written: Vec<PathBuf> = layers
                .par_iter()
                .map(|(path, kind, img)| -> Result<PathBuf> {
                    let out = out_dir.join(layer_file_name(path, *kind));
                    std::fs::write(&out, image_to_png_bytes(img)?)?;
                    progress.inc(1);
                    Ok(out)
                })
                .collect::<Result<Vec<_>>>()?;
            progress.finish_and_clear();

            for path in &written {
                println!("{}", path.display());
            }
        }
        Commands::Spawns {
            reference,
            csv,
            database,
            zone,
            npc,
            npc_id,
            map_coords,
            labels,
            width,
            height,
            out,
        } => {
            let spawns = match (csv, database) {
                (Some(csv), _) => load_spawns_csv(&csv)?,
                (None, Some(db_path)) => {
                    let db = Database::new(&db_path)?;
                    match (npc_id, zone, npc) {
                        (Some(id), zone, _) => {
                            let mut spawns = db.spawns_for_npc_id(id)?;
                            if let Some(zone) = zone {
                                spawns.retain(|s| s.zone.as_deref() == Some(zone.as_str()));
                            }
                            spawns
                        }
                        (None, Some(zone), Some(npc)) => db.spawns_for_npc(&zone, &npc)?,
                        _ => anyhow::bail!("--database needs --npc-id, or both --zone and --npc"),
                    }
                }
                (None, None) => anyhow::bail!("Either --csv or --database is required"),
            };
            if spawns.is_empty() {
                tracing::warn!("No spawn records found, rendering an empty overlay");
            } else {
                info!("Rendering {} spawn points", spawns.len());
            }

            let options = SpawnOverlayOptions {
                coords_are_game: !map_coords,
                label_mode: labels,
                ..SpawnOverlayOptions::from_config(renderer.config())
            };
            let img = renderer.render_spawn_points_overlay(&reference, &spawns, width, height, &options)?;
            std::fs::write(&out, image_to_png_bytes(&img)?)?;
            info!("Wrote spawn overlay to {:?}", out);
        }
        Commands::Color { value, vmin, vmax, alpha, palette } => {
            let c = color_from_value(value, vmin, vmax, alpha, palette);
            println!("({}, {}, {}, {})", c.0, c.1, c.2, c.3);
        }
    }

    info!("pokmap CLI finished");
    Ok(())
}
