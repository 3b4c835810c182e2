//! Locations represent places where a property could be bought, each with its own base price and
//! inflation assumptions. Groups of locations are priced as the average of their members.
use crate::id::{IDCollection, define_id_getter, define_id_type};
use crate::units::{Dimensionless, MoneyPerArea};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use log::warn;
use serde::Deserialize;
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};
use std::borrow::Borrow;
use std::rc::Rc;
use strum::EnumIter;

define_id_type! {LocationID}
define_id_type! {GroupID}

/// A map of [`Location`]s, keyed by location ID
pub type LocationMap = IndexMap<LocationID, Rc<Location>>;

/// A map of [`LocationGroup`]s, keyed by group ID
pub type GroupMap = IndexMap<GroupID, LocationGroup>;

/// Which inflation assumption to use when projecting prices
#[derive(
    PartialEq,
    Eq,
    Debug,
    Clone,
    Copy,
    Default,
    EnumIter,
    SerializeLabeledStringEnum,
    DeserializeLabeledStringEnum,
)]
pub enum Scenario {
    /// Use the low inflation rate
    #[string = "optimistic"]
    Optimistic,
    /// Use the mid inflation rate
    #[default]
    #[string = "central"]
    Central,
    /// Use the high inflation rate
    #[string = "pessimistic"]
    Pessimistic,
}

/// A location with a base price and three inflation scenarios
#[derive(PartialEq, Debug, Deserialize)]
pub struct Location {
    /// The name of the location (e.g. "La Latina")
    pub id: LocationID,
    /// Current price per square metre
    pub price_per_area: MoneyPerArea,
    /// Yearly price inflation in the optimistic scenario
    pub inflation_low: Dimensionless,
    /// Yearly price inflation in the central scenario
    pub inflation_mid: Dimensionless,
    /// Yearly price inflation in the pessimistic scenario
    pub inflation_high: Dimensionless,
}
define_id_getter! {Location, LocationID}

impl Location {
    /// The base inflation rate for the given scenario
    pub fn inflation(&self, scenario: Scenario) -> Dimensionless {
        match scenario {
            Scenario::Optimistic => self.inflation_low,
            Scenario::Central => self.inflation_mid,
            Scenario::Pessimistic => self.inflation_high,
        }
    }
}

/// A named set of locations, priced as the mean of its members
#[derive(PartialEq, Debug)]
pub struct LocationGroup {
    /// The name of the group
    pub id: GroupID,
    /// The member locations, in order. Never empty.
    pub members: Vec<Rc<Location>>,
}

/// One entry of a resolved selection: either a single location or a group
#[derive(PartialEq, Debug, Clone)]
pub struct PriceSource {
    /// The name shown in output (location or group name)
    pub name: Rc<str>,
    /// The locations whose projected prices are averaged
    pub members: Vec<Rc<Location>>,
}

/// The built-in locations: name, price per m², low/mid/high inflation
const BUILTIN_LOCATIONS: [(&str, f64, f64, f64, f64); 19] = [
    ("La Latina", 5100.0, 0.03, 0.07, 0.12),
    ("Lavapiés", 4200.0, 0.03, 0.07, 0.12),
    ("Malasaña", 4800.0, 0.03, 0.07, 0.12),
    ("San Isidro", 3200.0, 0.025, 0.055, 0.09),
    ("Embajadores", 3500.0, 0.025, 0.055, 0.09),
    ("Barajas", 3700.0, 0.025, 0.055, 0.09),
    ("Segovia", 2200.0, 0.02, 0.045, 0.07),
    ("Guadalajara", 2100.0, 0.02, 0.045, 0.07),
    ("Becerril", 2600.0, 0.02, 0.04, 0.065),
    ("Navacerrada", 2500.0, 0.02, 0.04, 0.065),
    ("Costa Andaluza", 2400.0, 0.02, 0.045, 0.07),
    ("Lanzarote", 2300.0, 0.02, 0.045, 0.07),
    ("La Palma", 2000.0, 0.02, 0.045, 0.07),
    ("Tenerife", 2400.0, 0.02, 0.045, 0.07),
    ("Gran Canaria", 2300.0, 0.02, 0.045, 0.07),
    ("Centro Almería", 1800.0, 0.02, 0.045, 0.07),
    ("Retamar", 1900.0, 0.02, 0.045, 0.07),
    ("Aguadulce", 2000.0, 0.022, 0.05, 0.075),
    ("Roquetas de Mar", 1750.0, 0.018, 0.04, 0.065),
];

/// The built-in groups of locations
const BUILTIN_GROUPS: [(&str, &[&str]); 7] = [
    ("Centro", &["La Latina", "Lavapiés", "Malasaña"]),
    (
        "PeriferiaMunicipal",
        &["San Isidro", "Embajadores", "Barajas"],
    ),
    ("PeriferiaProvincial", &["Segovia", "Guadalajara"]),
    ("SierraMadrid", &["Becerril", "Navacerrada"]),
    ("CostaAndaluza", &["Costa Andaluza"]),
    (
        "Canarias",
        &["Lanzarote", "La Palma", "Tenerife", "Gran Canaria"],
    ),
    (
        "Almeria",
        &["Centro Almería", "Retamar", "Aguadulce", "Roquetas de Mar"],
    ),
];

/// All locations and groups which can be selected
#[derive(PartialEq, Debug, Default)]
pub struct LocationCatalog {
    /// Locations, keyed by name
    pub locations: LocationMap,
    /// Groups of locations, keyed by name
    pub groups: GroupMap,
}

impl LocationCatalog {
    /// Create a catalog containing the built-in locations and groups
    pub fn builtin() -> Self {
        let mut catalog = Self::default();
        catalog.extend_locations(BUILTIN_LOCATIONS.iter().map(
            |&(name, price, low, mid, high)| Location {
                id: name.into(),
                price_per_area: MoneyPerArea(price),
                inflation_low: Dimensionless(low),
                inflation_mid: Dimensionless(mid),
                inflation_high: Dimensionless(high),
            },
        ));

        for (name, members) in BUILTIN_GROUPS {
            catalog
                .add_group(name.into(), members)
                .expect("Built-in groups must reference built-in locations");
        }

        catalog
    }

    /// Add locations to the catalog.
    ///
    /// Entries whose name is already in the catalog (ignoring case) are ignored, so earlier
    /// definitions always win.
    pub fn extend_locations<I>(&mut self, locations: I)
    where
        I: IntoIterator<Item = Location>,
    {
        for location in locations {
            if let Some(existing) = self.locations.find_id(Borrow::<str>::borrow(&location.id)) {
                warn!(
                    "Location {} is already defined as {existing}; ignoring new definition",
                    location.id
                );
                continue;
            }

            self.locations.insert(location.id.clone(), location.into());
        }
    }

    /// Add a new group of locations to the catalog.
    ///
    /// Members are looked up by name (ignoring case). The group must have at least one member and
    /// its name must not already be in use.
    pub fn add_group<S: AsRef<str>>(&mut self, id: GroupID, member_names: &[S]) -> Result<()> {
        ensure!(!member_names.is_empty(), "Group {id} has no members");
        ensure!(
            !self.groups.contains_key(&id),
            "Group {id} is already defined"
        );

        let members = member_names
            .iter()
            .map(|name| {
                let location_id = self
                    .locations
                    .get_id_by_str(name.as_ref())
                    .with_context(|| format!("Invalid member for group {id}"))?;
                Ok(self.locations[&location_id].clone())
            })
            .collect::<Result<Vec<_>>>()?;

        self.groups
            .insert(id.clone(), LocationGroup { id, members });

        Ok(())
    }

    /// Turn the names selected by the user into the sources of prices to project.
    ///
    /// Names are matched against groups first, then against locations. When a group is selected,
    /// its members are not also projected individually. Groups come first in the output, followed
    /// by individual locations, each in the order selected.
    pub fn resolve_selection<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<PriceSource>> {
        ensure!(!names.is_empty(), "No locations selected");

        let mut groups = Vec::new();
        let mut locations = Vec::new();
        for name in names {
            let name = name.as_ref();
            if let Some(group_id) = self.groups.find_id(name) {
                if !groups.contains(&group_id) {
                    groups.push(group_id);
                }
            } else {
                let location_id = self
                    .locations
                    .get_id_by_str(name)
                    .with_context(|| format!("Invalid selection: {name}"))?;
                if !locations.contains(&location_id) {
                    locations.push(location_id);
                }
            }
        }

        // Drop locations which are already covered by a selected group
        locations.retain(|location_id| {
            !groups.iter().any(|group_id| {
                self.groups[group_id]
                    .members
                    .iter()
                    .any(|member| member.id == *location_id)
            })
        });

        let group_sources = groups.into_iter().map(|group_id| PriceSource {
            members: self.groups[&group_id].members.clone(),
            name: group_id.0,
        });
        let location_sources = locations.into_iter().map(|location_id| PriceSource {
            members: vec![self.locations[&location_id].clone()],
            name: location_id.0,
        });

        Ok(group_sources.chain(location_sources).collect())
    }
}
