use anyhow::{Context as _, Result, bail};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tabsim::cache::{Cache as _, DiskCache};
use tabsim::config::{self, CacheKind, Settings};
use tabsim::context::ExecutionContext;
use tabsim::integrity::{Checksum, verify_file};
use tabsim::simulations::{Simulation as _, SimulationConfig, TableSimulation};

#[derive(Parser)]
#[command(
    name = "tabsim",
    version,
    about = "Turn tabular datasets into contextual-bandit simulations"
)]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a simulation from a JSON configuration and summarize it
    Run {
        /// Path to the simulation JSON
        #[arg(short, long)]
        config: PathBuf,

        /// Settings file to use instead of the default location
        #[arg(long, env = "TABSIM_SETTINGS")]
        settings: Option<PathBuf>,

        /// Skip checksum verification for this run
        #[arg(long)]
        no_verify: bool,
    },
    /// Check a local file against an expected checksum
    Verify {
        /// File to hash
        #[arg(short, long)]
        file: PathBuf,

        #[command(flatten)]
        expected: ExpectedChecksum,
    },
    /// Manage the on-disk download cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Show or initialize the settings file
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct ExpectedChecksum {
    /// Expected MD5 digest (hex)
    #[arg(long)]
    md5: Option<String>,

    /// Expected SHA-256 digest (hex)
    #[arg(long)]
    sha256: Option<String>,
}

impl ExpectedChecksum {
    fn to_checksum(&self) -> Result<Checksum> {
        let checksum = match (&self.md5, &self.sha256) {
            (Some(hex), _) => Checksum::md5(hex)?,
            (None, Some(hex)) => Checksum::sha256(hex)?,
            (None, None) => bail!("Pass --md5 or --sha256"),
        };
        Ok(checksum)
    }
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// Delete every cached download
    Clear,
    /// Print the cache directory
    Path,
}

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print the effective settings as JSON
    Show,
    /// Write the default settings file if none exists
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn run_command(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            config,
            settings,
            no_verify,
        } => handle_run(&config, settings.as_deref(), no_verify),
        Commands::Verify { file, expected } => handle_verify(&file, &expected),
        Commands::Cache { action } => handle_cache(&action),
        Commands::Settings { action } => handle_settings(&action),
    }
}

fn handle_run(config_path: &Path, settings_path: Option<&Path>, no_verify: bool) -> Result<()> {
    let mut settings = match settings_path {
        Some(path) => config::load_settings_from(path),
        None => config::load_settings(),
    };
    if no_verify {
        settings.verify_checksums = false;
    }

    let simulation_config = SimulationConfig::from_file(config_path)
        .with_context(|| format!("Invalid simulation config {}", config_path.display()))?;
    let ctx = ExecutionContext::from_settings(&settings);

    tracing::info!(config = %config_path.display(), "Building simulation");
    let simulation = simulation_config
        .build(&ctx)
        .context("Failed to build simulation")?;

    print_summary(&simulation);
    Ok(())
}

fn print_summary(simulation: &TableSimulation) {
    let interactions = simulation.interactions();
    let context_width = interactions
        .first()
        .and_then(|i| i.context())
        .map_or(0, Vec::len);

    println!("Interactions:  {}", interactions.len());
    println!("Actions:       {}", simulation.action_set().len());
    println!("Context width: {context_width}");
    if !simulation.feature_names().is_empty() {
        println!("Features:      {}", simulation.feature_names().join(", "));
    }
    if let Some(encoder) = simulation.label_encoder() {
        println!("Label encoder: {encoder}");
    }

    println!("Label distribution:");
    for (action, count) in simulation.label_counts() {
        let share = count as f64 / interactions.len().max(1) as f64 * 100.0;
        let label = action.to_string();
        println!("  {label:<24} {count:>8}  ({share:.1}%)");
    }
}

fn handle_verify(file: &Path, expected: &ExpectedChecksum) -> Result<()> {
    let checksum = expected.to_checksum()?;
    let result = verify_file(file, &checksum);
    println!("{}", result.format_cli());

    if !result.passed {
        bail!("Verification failed for {}", file.display());
    }
    Ok(())
}

fn handle_cache(action: &CacheAction) -> Result<()> {
    let settings = config::load_settings();
    let dir = settings.cache.resolved_dir();

    match action {
        CacheAction::Path => println!("{}", dir.display()),
        CacheAction::Clear => {
            if settings.cache.kind != CacheKind::Disk {
                tracing::warn!(
                    kind = ?settings.cache.kind,
                    "Cache kind is not disk; clearing the directory anyway"
                );
            }
            DiskCache::new(dir.clone()).clear()?;
            println!("Cleared {}", dir.display());
        }
    }
    Ok(())
}

fn handle_settings(action: &SettingsAction) -> Result<()> {
    match action {
        SettingsAction::Show => {
            let settings = config::load_settings();
            println!("# {}", config::settings_path().display());
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        SettingsAction::Init { force } => {
            let path = config::settings_path();
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            let path = config::save_settings(&Settings::default())?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}
