//! Common code for running regression tests against the bundled examples.
use float_cmp::approx_eq;
use housing_projection::cli::RunOpts;
use housing_projection::cli::example::handle_example_run_command;
use housing_projection::settings::Settings;
use itertools::{EitherOrBoth, Itertools};
use std::fs::read_dir;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const FLOAT_CMP_TOLERANCE: f64 = 1e-10;

/// Run an example and compare its CSV output with the files in `tests/data/<example_name>`
pub fn run_regression_test(example_name: &str) {
    unsafe { std::env::set_var("HOUSING_PROJECTION_LOG_LEVEL", "off") };

    let tempdir = tempdir().unwrap();
    let opts = RunOpts {
        output_dir: Some(tempdir.path().to_path_buf()),
        overwrite: false,
    };
    handle_example_run_command(example_name, &opts, Some(Settings::default())).unwrap();

    let expected_dir = PathBuf::from(format!("tests/data/{example_name}"));
    let file_names = get_csv_file_names(&expected_dir);
    assert_eq!(
        get_csv_file_names(tempdir.path()),
        file_names,
        "Output files differ from those in {}",
        expected_dir.display()
    );

    let errors = file_names
        .iter()
        .flat_map(|file_name| {
            compare_csv_files(
                &tempdir.path().join(file_name),
                &expected_dir.join(file_name),
            )
            .into_iter()
            .map(move |error| format!("{file_name}: {error}"))
        })
        .collect_vec();
    assert!(
        errors.is_empty(),
        "The following errors occurred:\n  * {}",
        errors.join("\n  * ")
    );
}

/// Compare two CSV files record by record, including the header
fn compare_csv_files(actual_path: &Path, expected_path: &Path) -> Vec<String> {
    let actual = read_records(actual_path);
    let expected = read_records(expected_path);

    actual
        .into_iter()
        .zip_longest(expected)
        .enumerate()
        .filter_map(|(num, pair)| match pair {
            EitherOrBoth::Both(actual, expected) => (!records_match(&actual, &expected))
                .then(|| format!("line {num}:\n    + {actual:?}\n    - {expected:?}")),
            EitherOrBoth::Left(actual) => Some(format!("line {num}: unexpected {actual:?}")),
            EitherOrBoth::Right(expected) => Some(format!("line {num}: missing {expected:?}")),
        })
        .collect()
}

/// Whether every field matches, comparing numbers with a tolerance
fn records_match(actual: &[String], expected: &[String]) -> bool {
    actual.len() == expected.len()
        && actual.iter().zip(expected).all(|(field1, field2)| {
            match (parse_finite(field1), parse_finite(field2)) {
                (Some(value1), Some(value2)) => {
                    approx_eq!(f64, value1, value2, epsilon = FLOAT_CMP_TOLERANCE)
                }
                _ => field1 == field2,
            }
        })
}

/// Parse a string into an `f64`, returning `None` if parsing fails or value is infinite/NaN
fn parse_finite(s: &str) -> Option<f64> {
    s.parse().ok().filter(|f: &f64| f.is_finite())
}

/// Read every record of a CSV file, with the header as the first record
fn read_records(path: &Path) -> Vec<Vec<String>> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .unwrap()
        .records()
        .map(|record| record.unwrap().iter().map(String::from).collect())
        .collect()
}

/// Get the sorted names of the CSV files in the given folder
fn get_csv_file_names(dir_path: &Path) -> Vec<String> {
    read_dir(dir_path)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|file_name| file_name.ends_with(".csv"))
        .sorted()
        .collect()
}
