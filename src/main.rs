use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use inkmatch::api::{self, SimulateRequest, TargetInput};
use inkmatch::{AppState, EngineConfig};

#[derive(Parser, Debug)]
#[command(name = "inkmatch")]
#[command(about = "Predict ink formulas for L*a*b* target colours")]
struct Args {
    /// Spot colour reference dataset (JSON)
    #[arg(long, env = "INKMATCH_PMS_DATA")]
    pms_data: PathBuf,

    /// Pigment concentration ladder dataset (JSON)
    #[arg(long, env = "INKMATCH_DC_DATA")]
    dc_data: PathBuf,

    /// Engine configuration (TOML); defaults apply when absent
    #[arg(long, env = "INKMATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Log search progress
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Predict a formula for a target colour
    Predict {
        #[arg(long, allow_hyphen_values = true)]
        l: f64,
        #[arg(long, allow_hyphen_values = true)]
        a: f64,
        #[arg(long, allow_hyphen_values = true)]
        b: f64,
    },
    /// Estimate the colour after a formula edit
    Simulate {
        /// JSON file with `current`, `new_formula` and `old_formula`
        request: PathBuf,
    },
    /// List spot colours whose code contains the query
    Spot {
        #[arg(default_value = "")]
        query: String,
    },
}

fn main() -> Result<()> {
    // Load env vars
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &args.config {
        Some(path) => EngineConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let state = AppState::load(&args.pms_data, &args.dc_data, config)?;

    let output = match args.command {
        Command::Predict { l, a, b } => {
            let target = TargetInput {
                l: Some(l),
                a: Some(a),
                b: Some(b),
            };
            serde_json::to_string_pretty(&api::predict_formula(&state, &target)?)?
        }
        Command::Simulate { request } => {
            let contents = fs::read_to_string(&request)
                .with_context(|| format!("reading {}", request.display()))?;
            let request: SimulateRequest = serde_json::from_str(&contents)?;
            serde_json::to_string_pretty(&api::simulate_edit(&state, &request)?)?
        }
        Command::Spot { query } => {
            serde_json::to_string_pretty(&api::search_spot_colours(&state, &query))?
        }
    };

    println!("{}", output);
    Ok(())
}
