//! The command line interface for the program.
use crate::config::Configuration;
use crate::input::location::read_location_catalog;
use crate::location::{LocationCatalog, Scenario};
use crate::log;
use crate::output::metadata::write_metadata;
use crate::output::{create_output_directory, get_output_dir, write_projection};
use crate::projection::{Projection, run_projection};
use crate::settings::Settings;
use ::log::{info, warn};
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;

pub mod curve;
pub mod example;
pub mod settings;
use curve::CurveSubcommands;
use example::ExampleSubcommands;
use settings::SettingsSubcommands;

/// The command line interface for the program.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
    /// Flag to provide the CLI docs as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// Options for the run command
#[derive(Args, Default)]
pub struct RunOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run a projection.
    Run {
        /// Path to the folder containing projection.toml.
        config_dir: PathBuf,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Manage example configurations.
    Example {
        /// The available subcommands for managing example configurations.
        #[command(subcommand)]
        subcommand: ExampleSubcommands,
    },
    /// Validate a configuration.
    Validate {
        /// Path to the folder containing projection.toml.
        config_dir: PathBuf,
    },
    /// List the locations and groups which can be selected.
    Locations {
        /// Folder with extra locations.csv and groups.csv files to include.
        config_dir: Option<PathBuf>,
    },
    /// Edit the savings curves of a configuration.
    Curve {
        /// The available subcommands for editing curves.
        #[command(subcommand)]
        subcommand: CurveSubcommands,
    },
    /// Manage settings file.
    Settings {
        /// The available subcommands for managing the settings file.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run { config_dir, opts } => handle_run_command(&config_dir, &opts, None),
            Self::Example { subcommand } => subcommand.execute(),
            Self::Validate { config_dir } => handle_validate_command(&config_dir, None),
            Self::Locations { config_dir } => handle_locations_command(config_dir.as_deref()),
            Self::Curve { subcommand } => subcommand.execute(),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and run the requested command
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Invoked as: `$ housing_projection --markdown-help`
    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    let Some(command) = cli.command else {
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Load the program settings, unless they have been provided
fn load_settings(settings: Option<Settings>) -> Result<Settings> {
    match settings {
        Some(settings) => Ok(settings),
        None => Settings::load().context("Failed to load settings."),
    }
}

/// Initialise the program logger, unless this has already happened
fn init_logger(settings: &Settings, log_file_dir: Option<&Path>) -> Result<()> {
    if log::is_logger_initialised() {
        return Ok(());
    }

    log::init(Some(&settings.log_level), log_file_dir).context("Failed to initialise logging.")
}

/// Load the configuration and location catalog in `config_dir` and run a projection
fn load_and_project(config_dir: &Path) -> Result<(Configuration, Projection)> {
    let config = Configuration::from_path(config_dir)?;
    let catalog = read_location_catalog(config_dir)?;
    let projection = run_projection(&config, &catalog, &config.careers())?;

    Ok((config, projection))
}

/// Handle the `run` command.
///
/// The projection is run before the output folder is touched, so a configuration which fails to
/// load leaves any previous results in place.
pub fn handle_run_command(
    config_dir: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = load_settings(settings)?;

    // Get path to output folder
    let output_dir = match &opts.output_dir {
        Some(dir) => dir.clone(),
        None => get_output_dir(config_dir, &settings.results_dir)?,
    };

    let (config, projection) =
        load_and_project(config_dir).context("Failed to run projection.")?;

    let overwritten = create_output_directory(&output_dir, opts.overwrite || settings.overwrite)
        .with_context(|| {
            format!(
                "Failed to create output directory: {}",
                output_dir.display()
            )
        })?;

    init_logger(&settings, Some(&output_dir))?;
    if overwritten {
        warn!("Previous results in output folder were overwritten");
    }
    info!("Loaded configuration from {}", config_dir.display());
    info!("Output folder: {}", output_dir.display());

    write_projection(&output_dir, &projection)?;
    write_metadata(&output_dir, config_dir, &config)?;
    for line in projection.summary().to_string().lines() {
        info!("{line}");
    }
    info!("Projection complete!");

    Ok(())
}

/// Handle the `validate` command.
pub fn handle_validate_command(config_dir: &Path, settings: Option<Settings>) -> Result<()> {
    let settings = load_settings(settings)?;

    // No log files are written when validating
    init_logger(&settings, None)?;

    load_and_project(config_dir).context("Failed to validate configuration.")?;
    info!("Configuration validation successful!");

    Ok(())
}

/// Describe every location and group in the catalog, one per line
fn describe_catalog(catalog: &LocationCatalog) -> Vec<String> {
    let mut lines = Vec::new();
    for group in catalog.groups.values() {
        let members: Vec<_> = group.members.iter().map(|member| member.id.to_string()).collect();
        lines.push(format!("{} (group): {}", group.id, members.join(", ")));
    }

    for location in catalog.locations.values() {
        let inflation: Vec<_> = Scenario::iter()
            .map(|scenario| format!("{:.1}%", location.inflation(scenario).value() * 100.0))
            .collect();
        lines.push(format!(
            "{}: {}€/m², inflation {}",
            location.id,
            location.price_per_area,
            inflation.join("/")
        ));
    }

    lines
}

/// Handle the `locations` command.
fn handle_locations_command(config_dir: Option<&Path>) -> Result<()> {
    let catalog = match config_dir {
        Some(dir) => read_location_catalog(dir)?,
        None => LocationCatalog::builtin(),
    };

    for line in describe_catalog(&catalog) {
        println!("{line}");
    }

    Ok(())
}
