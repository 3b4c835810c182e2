//! Code for reading extra locations and groups from CSV files.
use super::{input_err_msg, read_csv_id_file, read_csv_optional};
use crate::location::{GroupID, Location, LocationCatalog, LocationID};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::info;
use serde::Deserialize;
use std::path::Path;

const LOCATIONS_FILE_NAME: &str = "locations.csv";
const GROUPS_FILE_NAME: &str = "groups.csv";

/// A row of the groups CSV file
#[derive(PartialEq, Debug, Deserialize)]
struct GroupMemberRaw {
    group_id: GroupID,
    location_id: String,
}

/// Build the location catalog for the configuration in `config_dir`.
///
/// The built-in catalog is extended with the contents of `locations.csv` and `groups.csv`, if
/// these files are present.
///
/// # Arguments
///
/// * `config_dir` - Folder containing the projection configuration
///
/// # Returns
///
/// The combined [`LocationCatalog`] or an error.
pub fn read_location_catalog(config_dir: &Path) -> Result<LocationCatalog> {
    let mut catalog = LocationCatalog::builtin();

    let locations_path = config_dir.join(LOCATIONS_FILE_NAME);
    if locations_path.is_file() {
        let locations: IndexMap<LocationID, Location> = read_csv_id_file(&locations_path)?;
        info!(
            "Read {} extra locations from {}",
            locations.len(),
            locations_path.display()
        );
        catalog.extend_locations(locations.into_values());
    }

    let groups_path = config_dir.join(GROUPS_FILE_NAME);
    for (group_id, members) in read_group_members(&groups_path)? {
        catalog
            .add_group(group_id, members.as_slice())
            .with_context(|| input_err_msg(&groups_path))?;
    }

    Ok(catalog)
}

/// Read the (optional) groups file, collecting members for each group in order
fn read_group_members(file_path: &Path) -> Result<IndexMap<GroupID, Vec<String>>> {
    let mut groups: IndexMap<GroupID, Vec<String>> = IndexMap::new();
    for row in read_csv_optional::<GroupMemberRaw>(file_path)? {
        groups.entry(row.group_id).or_default().push(row.location_id);
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use crate::units::MoneyPerArea;
    use itertools::Itertools;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    /// Create an example locations file in dir_path
    fn create_locations_file(dir_path: &Path) {
        let file_path = dir_path.join(LOCATIONS_FILE_NAME);
        let mut file = File::create(file_path).unwrap();
        writeln!(
            file,
            "id,price_per_area,inflation_low,inflation_mid,inflation_high
Toledo,1900,0.02,0.04,0.06
Cuenca,1500,0.015,0.035,0.055
Segovia,9999,0.1,0.1,0.1"
        )
        .unwrap();
    }

    /// Create an example groups file in dir_path
    fn create_groups_file(dir_path: &Path, contents: &str) {
        let file_path = dir_path.join(GROUPS_FILE_NAME);
        let mut file = File::create(file_path).unwrap();
        writeln!(file, "group_id,location_id\n{contents}").unwrap();
    }

    #[test]
    fn test_read_location_catalog_no_files() {
        let dir = tempdir().unwrap();
        assert_eq!(
            read_location_catalog(dir.path()).unwrap(),
            LocationCatalog::builtin()
        );
    }

    #[test]
    fn test_read_location_catalog() {
        let dir = tempdir().unwrap();
        create_locations_file(dir.path());
        create_groups_file(dir.path(), "Castilla,Toledo\nCastilla,Cuenca\nCastilla,Segovia");

        let catalog = read_location_catalog(dir.path()).unwrap();
        assert_eq!(
            catalog.locations["Toledo"].price_per_area,
            MoneyPerArea(1900.0)
        );

        // Built-in definition is kept
        assert_eq!(
            catalog.locations["Segovia"].price_per_area,
            MoneyPerArea(2200.0)
        );

        let members = catalog.groups["Castilla"]
            .members
            .iter()
            .map(|member| member.id.to_string())
            .collect_vec();
        assert_eq!(members, ["Toledo", "Cuenca", "Segovia"]);
    }

    #[test]
    fn test_read_location_catalog_bad_group() {
        let dir = tempdir().unwrap();
        create_groups_file(dir.path(), "Castilla,Atlantis");
        assert_error!(
            read_location_catalog(dir.path()),
            format!(
                "Error reading {}",
                dir.path().join(GROUPS_FILE_NAME).display()
            )
        );
    }
}
