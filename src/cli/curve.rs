//! Code related to the CLI commands for editing the savings curves of a configuration
use super::{init_logger, load_settings};
use crate::config::{Configuration, CurveKind};
use crate::input::parse_number;
use crate::savings::SavingsPolicy;
use anyhow::Result;
use clap::{Subcommand, ValueEnum};
use log::info;
use std::path::{Path, PathBuf};

/// The curve to edit, as given on the command line
#[derive(Clone, Copy, ValueEnum)]
pub enum CurveArg {
    /// The savings rate curve (percent of salary)
    Savings,
    /// The monthly expense curve
    Expense,
}

impl From<CurveArg> for CurveKind {
    fn from(arg: CurveArg) -> Self {
        match arg {
            CurveArg::Savings => CurveKind::Savings,
            CurveArg::Expense => CurveKind::Expense,
        }
    }
}

/// Subcommands for editing curves
#[derive(Subcommand)]
pub enum CurveSubcommands {
    /// Set the value of a curve at a given year, carrying it forward to later nodes
    Set {
        /// Path to the folder containing projection.toml.
        config_dir: PathBuf,
        /// The curve to edit. The savings mode is switched to match if needed.
        curve: CurveArg,
        /// Year offset from the start of the projection
        #[arg(allow_negative_numbers = true)]
        year: i64,
        /// The new value (a comma may be used as the decimal separator)
        value: String,
    },
    /// Show the active savings curve and its value for every year
    Show {
        /// Path to the folder containing projection.toml.
        config_dir: PathBuf,
    },
}

impl CurveSubcommands {
    /// Execute the supplied curve subcommand
    pub fn execute(self) -> Result<()> {
        init_logger(&load_settings(None)?, None)?;

        match self {
            Self::Set {
                config_dir,
                curve,
                year,
                value,
            } => handle_curve_set_command(&config_dir, curve.into(), year, &value),
            Self::Show { config_dir } => handle_curve_show_command(&config_dir),
        }
    }
}

/// Handle the `curve set` command
fn handle_curve_set_command(
    config_dir: &Path,
    kind: CurveKind,
    year: i64,
    value: &str,
) -> Result<()> {
    let mut config = Configuration::from_path(config_dir)?;
    let value = config.set_curve_node(kind, year, parse_number(value))?;
    config.save(config_dir)?;
    info!("Set {kind} curve to {value} from year {year}");

    Ok(())
}

/// Describe the active savings curve: its nodes, then the value for each calendar year
fn describe_curve(config: &Configuration) -> Result<Vec<String>> {
    let horizon = config.horizon()?;
    let (kind, unit) = match config.savings {
        SavingsPolicy::Rate { .. } => (CurveKind::Savings, "%"),
        SavingsPolicy::Expense { .. } => (CurveKind::Expense, "€/month"),
    };

    let curve = config.savings.curve();
    let mut lines = vec![format!("Active curve: {kind}")];
    if curve.is_empty() {
        lines.push(format!(
            "No nodes set; using {}{unit} for every year",
            config.savings.fallback()
        ));
    } else {
        let nodes: Vec<_> = curve
            .nodes()
            .iter()
            .map(|node| format!("{}={}", node.year, node.value))
            .collect();
        lines.push(format!("Nodes: {}", nodes.join(", ")));
    }

    let values = curve.evaluate(horizon, config.savings.fallback());
    for (year, value) in (config.start_year..).zip(values) {
        lines.push(format!("{year}: {value}{unit}"));
    }

    Ok(lines)
}

/// Handle the `curve show` command
fn handle_curve_show_command(config_dir: &Path) -> Result<()> {
    let config = Configuration::from_path(config_dir)?;
    for line in describe_curve(&config)? {
        println!("{line}");
    }

    Ok(())
}
