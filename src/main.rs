use landmark_cascade::{
    core::{anchors, topology::Topology},
    Config, FaceCascade, ModelFamily, ReplayEngine, TensorDump,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "landmark-cascade")]
#[command(about = "Decode face, iris and pose model outputs into frame geometry")]
struct Cli {
    /// Debug-level logging with file and line
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one cascade pass over recorded tensors and print the result as JSON
    Replay {
        /// Pipeline configuration (TOML); defaults are used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// JSON dump of per-stage tensors
        #[arg(short, long)]
        dump: PathBuf,
    },
    /// Print the detector anchor layout
    Anchors {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print a model family's skeleton edges as JSON
    Topology {
        #[arg(value_enum)]
        family: ModelFamily,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    match cli.command {
        Commands::Replay { config, dump } => {
            let config = load_config(config.as_deref())?;
            let dump = TensorDump::load_from_path(&dump)
                .with_context(|| format!("Failed to read tensor dump {}", dump.display()))?;

            let mut cascade = FaceCascade::new(config);
            let mut engine = ReplayEngine::new(dump);
            let frame = cascade.run(&mut engine)?;

            println!("{}", serde_json::to_string_pretty(frame)?);
        }
        Commands::Anchors { config } => {
            let config = load_config(config.as_deref())?;
            for res in &config.detector.resolutions {
                println!(
                    "{}x{} grid, {} per cell: {} anchors",
                    res.grid_size,
                    res.grid_size,
                    res.anchors_per_cell,
                    res.anchor_count()
                );
            }
            println!("Total: {}", anchors::anchor_count(&config.detector.resolutions));
        }
        Commands::Topology { family } => {
            let edges: Vec<(usize, usize)> = Topology::for_family(family).edges().collect();
            println!("{}", serde_json::to_string(&edges)?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Ok(Config::load_from_path(path)?),
        None => {
            tracing::debug!("No config given, using defaults");
            Ok(Config::default())
        }
    }
}

fn setup_logging(verbose: bool) {
    if verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    }
}
