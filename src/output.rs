//! The module responsible for writing output data to disk.
use crate::projection::Projection;
use anyhow::{Context, Result, ensure};
use itertools::Itertools;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub mod metadata;

/// The output file name for the projected series
const PROJECTION_FILE_NAME: &str = "projection.csv";

/// The output file name for close matches
const MATCHES_FILE_NAME: &str = "matches.csv";

/// The output file name for the summary
const SUMMARY_FILE_NAME: &str = "summary.toml";

/// Get the default output folder for the configuration in `config_dir`.
///
/// This is a folder inside `results_dir` with the same name as the configuration folder.
pub fn get_output_dir(config_dir: &Path, results_dir: &Path) -> Result<PathBuf> {
    // Canonicalise in case the user has specified "."
    let config_dir = config_dir
        .canonicalize()
        .context("Could not resolve path to configuration")?;

    let config_name = config_dir
        .file_name()
        .context("Configuration cannot be in root folder")?
        .to_str()
        .context("Invalid chars in configuration folder name")?;

    Ok(results_dir.join(config_name))
}

/// Create a new output folder.
///
/// If the folder already exists and is not empty, it is only replaced if `allow_overwrite` is
/// true.
///
/// # Returns
///
/// Whether an existing folder was overwritten
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let mut overwritten = false;
    if output_dir.is_dir() {
        if fs::read_dir(output_dir)?.next().is_none() {
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. \
            Please delete the folder or pass the --overwrite command-line option."
        );

        fs::remove_dir_all(output_dir)?;
        overwritten = true;
    }

    fs::create_dir_all(output_dir)?;

    Ok(overwritten)
}

/// A row of the matches CSV file
#[derive(Serialize, Debug, PartialEq)]
struct MatchesRow {
    year: i32,
    matches: String,
}

/// Write the projected series as a table with one row per year
fn write_series(file_path: &Path, projection: &Projection) -> Result<()> {
    let series = projection.series();
    let mut writer = csv::Writer::from_path(file_path)?;

    writer.write_record(
        std::iter::once("Year").chain(series.iter().map(|series| series.label.as_str())),
    )?;
    for (idx, year) in projection.calendar_years().into_iter().enumerate() {
        let row = std::iter::once(year.to_string())
            .chain(series.iter().map(|series| series.values[idx].to_string()));
        writer.write_record(row)?;
    }
    writer.flush()?;

    Ok(())
}

/// Write the close matches for each year, with names separated by semicolons
fn write_matches(file_path: &Path, projection: &Projection) -> Result<()> {
    let mut writer = csv::Writer::from_path(file_path)?;
    for (year, names) in projection
        .calendar_years()
        .into_iter()
        .zip(projection.matches())
    {
        writer.serialize(MatchesRow {
            year,
            matches: names.iter().join(";"),
        })?;
    }
    writer.flush()?;

    Ok(())
}

/// Write the results of a projection to `output_dir`
pub fn write_projection(output_dir: &Path, projection: &Projection) -> Result<()> {
    let file_path = output_dir.join(PROJECTION_FILE_NAME);
    write_series(&file_path, projection)
        .with_context(|| format!("Failed to write {}", file_path.display()))?;

    let file_path = output_dir.join(MATCHES_FILE_NAME);
    write_matches(&file_path, projection)
        .with_context(|| format!("Failed to write {}", file_path.display()))?;

    let file_path = output_dir.join(SUMMARY_FILE_NAME);
    fs::write(&file_path, toml::to_string(&projection.summary())?)
        .with_context(|| format!("Failed to write {}", file_path.display()))?;

    Ok(())
}
