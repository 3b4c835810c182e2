//! The CLI commands for managing the program settings file
use crate::settings::{Settings, get_settings_file_path};
use anyhow::{Context, Result};
use clap::Subcommand;
use std::fs;
use std::path::Path;

/// Subcommands for settings
#[derive(Subcommand)]
pub enum SettingsSubcommands {
    /// Open the settings file in a text editor, creating it first if needed
    Edit,
    /// Print the path the settings file is read from
    Path,
    /// Print the settings currently in effect
    Show,
    /// Print a placeholder `settings.toml` with every setting commented out
    DumpDefault,
}

impl SettingsSubcommands {
    /// Execute the supplied settings subcommand
    pub fn execute(self) -> Result<()> {
        match self {
            Self::Edit => edit_settings_file(&get_settings_file_path()),
            Self::Path => {
                println!("{}", get_settings_file_path().display());
                Ok(())
            }
            Self::Show => {
                print!("{}", describe_settings()?);
                Ok(())
            }
            Self::DumpDefault => {
                print!("{}", Settings::default_file_contents()?);
                Ok(())
            }
        }
    }
}

/// Write the placeholder settings file to `file_path` unless a file is already there
fn create_settings_file_if_missing(file_path: &Path) -> Result<()> {
    if file_path.is_file() {
        return Ok(());
    }

    if let Some(dir_path) = file_path.parent() {
        fs::create_dir_all(dir_path)
            .with_context(|| format!("Failed to create directory: {}", dir_path.display()))?;
    }
    fs::write(file_path, Settings::default_file_contents()?)
        .with_context(|| format!("Failed to write {}", file_path.display()))?;

    Ok(())
}

/// Let the user edit the settings file at `file_path` in their text editor
fn edit_settings_file(file_path: &Path) -> Result<()> {
    create_settings_file_if_missing(file_path)?;

    println!("Opening settings file for editing: {}", file_path.display());
    edit::edit_file(file_path)
        .with_context(|| format!("Could not open {} in an editor", file_path.display()))?;

    Ok(())
}

/// The settings in effect, as TOML
fn describe_settings() -> Result<String> {
    let settings = Settings::load().context("Failed to load settings.")?;
    Ok(toml::to_string(&settings)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_settings_file_if_missing() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("housing_projection").join("settings.toml");
        create_settings_file_if_missing(&file_path).unwrap();
        assert_eq!(
            fs::read_to_string(&file_path).unwrap(),
            Settings::default_file_contents().unwrap()
        );

        // Existing files are left alone
        fs::write(&file_path, "log_level = \"warn\"").unwrap();
        create_settings_file_if_missing(&file_path).unwrap();
        assert_eq!(
            fs::read_to_string(&file_path).unwrap(),
            "log_level = \"warn\""
        );
    }
}
