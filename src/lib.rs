//! Projection of housing prices, savings and affordability.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod cli;
pub mod config;
pub mod curve;
pub mod finance;
pub mod id;
pub mod input;
pub mod location;
pub mod log;
pub mod output;
pub mod price;
pub mod projection;
pub mod salary;
pub mod savings;
pub mod settings;
pub mod units;

#[cfg(test)]
mod fixture;

/// Get the folder in which the program's settings are stored
pub fn get_housing_projection_config_dir() -> PathBuf {
    let mut dir = dirs::config_dir().unwrap_or_default();
    dir.push("housing_projection");
    dir
}
