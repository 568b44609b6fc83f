//! mapupload - Command-line interface for the map ingestion pipeline
//!
//! Each invocation handles one request: add a map from a URL, list an
//! installed map, or remove a map from the mapcycle.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mapupload_core::config::Config;
use mapupload_core::{classify, connector_for, Pipeline};
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

mod report;

/// mapupload - Install game maps and mirror them to fast-dl
#[derive(Parser)]
#[command(name = "mapupload")]
#[command(author, version, about = "Install game maps and mirror them to fast-dl", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true, env = "MAPUPLOAD_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download a map archive, install it, upload it to fast-dl and list it
    Add {
        /// URL of a zip, .bsp.bz2 or .bsp file
        url: String,
    },

    /// Upload an installed map to fast-dl and add it to the mapcycle
    AddManifest {
        /// Map name
        map: String,
    },

    /// Remove a map from the mapcycle
    RemoveManifest {
        /// Map name
        map: String,
    },

    /// Show how an archive would be handled
    Inspect {
        /// Archive file to inspect
        file: PathBuf,
    },

    /// Show or create the configuration
    Config {
        /// Show current configuration
        #[arg(long, conflicts_with_all = ["path", "init"])]
        show: bool,

        /// Show configuration file path
        #[arg(long, conflicts_with_all = ["show", "init"])]
        path: bool,

        /// Write a commented default configuration
        #[arg(long, conflicts_with_all = ["show", "path"])]
        init: bool,
    },
}

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("debug,hyper=info,hyper_util=info,reqwest=info")
    } else {
        EnvFilter::new("info,hyper=warn,hyper_util=warn,reqwest=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    match run() {
        Ok(code) => process::exit(code),
        Err(e) => {
            error!("Error: {:#}", e);

            let exit_code = map_error_to_exit_code(&e);
            process::exit(exit_code);
        }
    }
}

fn config_file(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => Ok(Config::config_path()?),
    }
}

fn load_config(explicit: Option<PathBuf>) -> Result<Config> {
    let path = config_file(explicit)?;
    debug!("Loading configuration from {}", path.display());
    Ok(Config::load(&path)?)
}

fn build_pipeline(config: Config) -> Result<Pipeline> {
    let connector = connector_for(&config.remote);
    let client = reqwest::Client::builder()
        .user_agent(concat!("mapupload/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    Ok(Pipeline::new(config, connector, client)?)
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}

fn run() -> Result<i32> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Add { url } => {
            let pipeline = build_pipeline(load_config(cli.config)?)?;
            info!("Adding map from {}", url);

            let response = runtime()?.block_on(pipeline.add_map(&url));
            let name = response
                .map_name
                .as_ref()
                .map(|n| n.to_string())
                .unwrap_or_default();

            report::print_outcome(
                cli.json,
                response.is_success(),
                &response.errors(),
                &response,
                &format!("Map {} was added.", name),
            )
        }

        Commands::AddManifest { map } => {
            let pipeline = build_pipeline(load_config(cli.config)?)?;
            info!("Adding installed map {} to the manifest", map);

            let response = runtime()?.block_on(pipeline.add_map_to_manifest(&map));

            report::print_outcome(
                cli.json,
                response.is_success(),
                &response.errors(),
                &response,
                &format!("Map {} was added to the manifest.", map),
            )
        }

        Commands::RemoveManifest { map } => {
            let pipeline = build_pipeline(load_config(cli.config)?)?;
            let removed = runtime()?.block_on(pipeline.remove_from_manifest(&map));
            let errors = if removed {
                Vec::new()
            } else {
                vec![format!("Map {} is not in the manifest.", map)]
            };

            report::print_outcome(
                cli.json,
                removed,
                &errors,
                &map,
                &format!("Map {} was removed from the manifest.", map),
            )
        }

        Commands::Inspect { file } => inspect(&file, cli.json),

        Commands::Config { show, path, init } => {
            let config_path = config_file(cli.config)?;

            if path {
                println!("{}", config_path.display());
            } else if init {
                if Config::init(&config_path)? {
                    println!("Wrote default configuration to {}", config_path.display());
                } else {
                    println!("{} already exists", config_path.display());
                }
            } else if show {
                let config = Config::load(&config_path)?;
                if cli.json {
                    let mut shown = config.clone();
                    shown.remote.password = "<redacted>".to_string();
                    println!("{}", serde_json::to_string_pretty(&shown)?);
                } else {
                    println!("{}", config.to_redacted_toml()?);
                }
            } else {
                eprintln!("Please specify --show, --path, or --init");
            }
            Ok(0)
        }
    }
}

fn inspect(file: &Path, json: bool) -> Result<i32> {
    let kind = classify(file).with_context(|| format!("Failed to read {}", file.display()))?;

    if json {
        let value = serde_json::json!({
            "file": file.display().to_string(),
            "kind": kind,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{}: {}", file.display(), kind.as_str());
    }

    Ok(0)
}

fn map_error_to_exit_code(err: &anyhow::Error) -> i32 {
    if let Some(core_err) = err.downcast_ref::<mapupload_core::Error>() {
        match core_err {
            mapupload_core::Error::Io(_) => 2,
            mapupload_core::Error::Config(_) => 3,
            _ => 1,
        }
    } else if err.chain().any(|cause| cause.is::<std::io::Error>()) {
        2
    } else {
        1
    }
}
