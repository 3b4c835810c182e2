//! Common routines for handling input data.
use crate::id::{HasID, IDLike};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use itertools::Itertools;
use serde::de::{self, DeserializeOwned, Deserializer, Visitor};
use std::fmt;
use std::fs;
use std::path::Path;

pub mod location;

/// Read a series of type `T`s from a CSV file.
///
/// Will raise an error if the file is empty.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let vec = read_csv_internal(file_path)?;
    ensure!(
        !vec.is_empty(),
        "CSV file {} cannot be empty",
        file_path.display()
    );

    Ok(vec)
}

/// Read a series of type `T`s from a CSV file, returning an empty `Vec` if the file is missing.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv_optional<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    if !file_path.is_file() {
        return Ok(Vec::new());
    }

    read_csv_internal(file_path)
}

fn read_csv_internal<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let vec = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)
        .with_context(|| input_err_msg(file_path))?
        .into_deserialize()
        .process_results(|iter| iter.collect_vec())
        .with_context(|| input_err_msg(file_path))?;

    Ok(vec)
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Read a CSV file of items with IDs, checking that the IDs are unique.
///
/// Items are returned in the order in which they appear in the file.
pub fn read_csv_id_file<T, ID>(file_path: &Path) -> Result<IndexMap<ID, T>>
where
    T: HasID<ID> + DeserializeOwned,
    ID: IDLike,
{
    let mut map = IndexMap::new();
    for record in read_csv::<T>(file_path)? {
        let id = record.get_id().clone();
        let existing = map.insert(id.clone(), record).is_some();
        ensure!(!existing, "Duplicate ID found: {id}");
    }

    Ok(map)
}

/// Format an error message to include the file path. To be used with `anyhow::Context`.
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Convert a user-entered number to an `f64`.
///
/// A comma is accepted as the decimal separator (e.g. "3,5"). Text which cannot be parsed is
/// treated as zero.
pub fn parse_number(s: &str) -> f64 {
    s.trim()
        .replacen(',', ".", 1)
        .parse()
        .ok()
        .filter(|value: &f64| value.is_finite())
        .unwrap_or(0.0)
}

/// Deserialise a number which may have been given as a string.
///
/// Strings are converted with [`parse_number`], so invalid text gives zero rather than an error.
pub fn deserialise_lenient_number<'de, D, T>(deserialiser: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: From<f64>,
{
    struct LenientNumberVisitor;

    impl Visitor<'_> for LenientNumberVisitor {
        type Value = f64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a number or a string containing a number")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            Ok(parse_number(v))
        }
    }

    let value = deserialiser.deserialize_any(LenientNumberVisitor)?;
    Ok(T::from(value))
}

/// Deserialise a whole number which may have been given as a string.
///
/// Values are read as for [`deserialise_lenient_number`] and any fractional part is dropped, so
/// invalid text gives zero. Values which do not fit in `T` are an error.
pub fn deserialise_lenient_integer<'de, D, T>(deserialiser: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    let value: f64 = deserialise_lenient_number(deserialiser)?;
    let value = value.trunc() as i64;
    T::try_from(value).map_err(|_| de::Error::custom(format!("{value} is out of range")))
}

/// Read a percentage, checking that it is between 0 and 100
pub fn deserialise_percentage<'de, D>(deserialiser: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value: f64 = deserialise_lenient_number(deserialiser)?;
    if !(0.0..=100.0).contains(&value) {
        Err(serde::de::Error::custom("Value must be between 0 and 100"))?;
    }

    Ok(value)
}
