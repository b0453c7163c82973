//! FIP CLI: command-line interface for ROI management and offline reduction.
//!
//! Usage:
//!   fip rois init <PATH>        Write default ROI settings
//!   fip rois show <PATH>        Show resolved ROI settings
//!   fip camera <SERIAL>         Print a camera's acquisition plan
//!   fip reduce <FRAMES> [OPTS]  Compute region activity for a raw frame file

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use fip_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "fip",
    about = "Fiber photometry acquisition toolkit",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/fip/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage region-of-interest settings
    Rois {
        #[command(subcommand)]
        action: RoisAction,
    },

    /// Print the acquisition plan for a camera
    Camera {
        /// Camera serial number
        serial: String,

        /// Sensor gain
        #[arg(long, default_value = "0")]
        gain: f64,

        /// Readout window X offset (px)
        #[arg(long, default_value = "0")]
        offset_x: f64,

        /// Readout window Y offset (px)
        #[arg(long, default_value = "0")]
        offset_y: f64,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compute region activity for every frame in a raw frame file
    Reduce {
        /// Raw little-endian frames, concatenated
        frames: PathBuf,

        /// Output file (.csv for text, anything else for binary)
        #[arg(short, long)]
        output: PathBuf,

        /// Frame width (defaults to config)
        #[arg(long)]
        width: Option<usize>,

        /// Frame height (defaults to config)
        #[arg(long)]
        height: Option<usize>,

        /// Channels per pixel
        #[arg(long, default_value = "1")]
        channels: usize,

        /// Sample depth: u8|u16|i16|i32|f32|f64
        #[arg(long, default_value = "u16")]
        depth: String,

        /// Camera the frames came from: green|iso|red
        #[arg(long, default_value = "green")]
        camera: String,

        /// ROI settings file (defaults to config)
        #[arg(long)]
        rois: Option<PathBuf>,

        /// Reduction operation: sum|avg|min|max (defaults to config)
        #[arg(long)]
        operation: Option<String>,

        /// Flip frames before reduction: vertical|horizontal|both
        #[arg(long)]
        flip: Option<String>,

        /// Timestamp ticks between consecutive frames
        #[arg(long, default_value = "1")]
        frame_interval: i64,

        /// Also write buffered activity matrices as JSON lines
        #[arg(long)]
        matrices: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum RoisAction {
    /// Write default ROI settings to a file
    Init {
        /// Destination JSON file
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the settings that would be used, falling back to defaults
    Show {
        /// ROI settings file (defaults to config)
        path: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };

    // Initialize logging
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    fip_common::logging::init_logging(&logging)?;

    match cli.command {
        Commands::Rois { action } => match action {
            RoisAction::Init { path, force } => commands::rois::init(path, force),
            RoisAction::Show { path } => {
                commands::rois::show(path, config.acquisition.roi_defaults_path.clone())
            }
        },
        Commands::Camera {
            serial,
            gain,
            offset_x,
            offset_y,
            json,
        } => commands::camera::run(serial, gain, offset_x, offset_y, json),
        Commands::Reduce {
            frames,
            output,
            width,
            height,
            channels,
            depth,
            camera,
            rois,
            operation,
            flip,
            frame_interval,
            matrices,
        } => commands::reduce::run(
            &config,
            commands::reduce::ReduceArgs {
                frames,
                output,
                width,
                height,
                channels,
                depth,
                camera,
                rois,
                operation,
                flip,
                frame_interval,
                matrices,
            },
        ),
    }
}
