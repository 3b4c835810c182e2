//! Code for writing metadata to file
use crate::config::Configuration;
use anyhow::{Context, Result};
use chrono::prelude::*;
use platform_info::{PlatformInfo, PlatformInfoAPI, UNameAPI};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// The output file name for metadata
const METADATA_FILE_NAME: &str = "metadata.toml";

/// Information about the program build via `built` crate
mod built_info {
    // The file has been placed there by the build script.
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

/// Get information about program version from git
fn get_git_hash() -> String {
    let Some(hash) = built_info::GIT_COMMIT_HASH_SHORT else {
        return "unknown".into();
    };

    if built_info::GIT_DIRTY == Some(true) {
        format!("{hash}-dirty")
    } else {
        hash.into()
    }
}

#[derive(Serialize)]
struct Metadata<'a> {
    run: RunMetadata<'a>,
    program: ProgramMetadata,
    platform: PlatformMetadata,
}

/// Information about the projection run
#[derive(Serialize)]
struct RunMetadata<'a> {
    /// Path to the configuration which was run
    config_path: &'a Path,
    /// The date and time at which the run started
    datetime: String,
    /// The selected locations and groups
    locations: &'a [String],
    /// The calendar years covered
    first_year: i32,
    last_year: i64,
}

/// Information about the program which produced the results
#[derive(Serialize)]
struct ProgramMetadata {
    name: &'static str,
    version: &'static str,
    target: &'static str,
    is_debug: bool,
    rustc_version: &'static str,
    build_time_utc: &'static str,
    git_commit_hash: String,
}

impl ProgramMetadata {
    fn new() -> Self {
        Self {
            name: built_info::PKG_NAME,
            version: built_info::PKG_VERSION,
            target: built_info::TARGET,
            is_debug: built_info::DEBUG,
            rustc_version: built_info::RUSTC_VERSION,
            build_time_utc: built_info::BUILT_TIME_UTC,
            git_commit_hash: get_git_hash(),
        }
    }
}

/// Information about the platform, taken from [`PlatformInfo`]
#[derive(Serialize)]
struct PlatformMetadata {
    sysname: String,
    release: String,
    machine: String,
    osname: String,
}

impl PlatformMetadata {
    fn new() -> Result<Self> {
        let info = PlatformInfo::new()
            .map_err(|err| anyhow::anyhow!("{err}"))
            .context("Unable to determine platform info")?;

        Ok(Self {
            sysname: info.sysname().to_string_lossy().into(),
            release: info.release().to_string_lossy().into(),
            machine: info.machine().to_string_lossy().into(),
            osname: info.osname().to_string_lossy().into(),
        })
    }
}

/// Write metadata about a projection run to `output_dir` in TOML format
pub fn write_metadata(output_dir: &Path, config_path: &Path, config: &Configuration) -> Result<()> {
    let metadata = Metadata {
        run: RunMetadata {
            config_path,
            datetime: Local::now().to_rfc2822(),
            locations: &config.locations,
            first_year: config.start_year,
            last_year: i64::from(config.start_year) + config.years,
        },
        program: ProgramMetadata::new(),
        platform: PlatformMetadata::new()?,
    };
    let file_path = output_dir.join(METADATA_FILE_NAME);
    fs::write(&file_path, toml::to_string(&metadata)?)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::configuration;
    use rstest::rstest;
    use tempfile::tempdir;

    #[rstest]
    fn test_write_metadata(configuration: Configuration) {
        let dir = tempdir().unwrap();
        write_metadata(dir.path(), Path::new("demo"), &configuration).unwrap();

        let contents = fs::read_to_string(dir.path().join(METADATA_FILE_NAME)).unwrap();
        let metadata: toml::Table = toml::from_str(&contents).unwrap();
        assert_eq!(
            metadata["program"]["name"].as_str(),
            Some("housing_projection")
        );
        assert_eq!(metadata["run"]["last_year"].as_integer(), Some(2030));
    }
}
