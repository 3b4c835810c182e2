//! Projection of property prices.
use crate::location::{Location, Scenario};
use crate::units::{Area, Dimensionless, Money, MoneyPerArea};
use serde::{Deserialize, Serialize};
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};
use std::rc::Rc;

/// The number of rooms for which no price adjustment is made
const ROOMS_BASE: f64 = 3.0;

/// Relative price change for each room above (or below) [`ROOMS_BASE`]
const ROOM_FACTOR: f64 = 0.05;

/// The first year in which inflation starts to decay
const INFLATION_DECAY_START: u32 = 5;

/// How much the inflation rate falls for each year after decay starts
const INFLATION_DECAY_PER_YEAR: f64 = 0.005;

/// Price premiums for optional features
const GARDEN_FACTOR: f64 = 0.07;
const TERRACE_FACTOR: f64 = 0.05;
const PATIO_FACTOR: f64 = 0.03;
const BASEMENT_FACTOR: f64 = 0.04;

/// The kind of dwelling
#[derive(
    PartialEq,
    Eq,
    Debug,
    Clone,
    Copy,
    Default,
    SerializeLabeledStringEnum,
    DeserializeLabeledStringEnum,
)]
pub enum DwellingType {
    /// A flat
    #[default]
    #[string = "piso"]
    Piso,
    /// A detached house
    #[string = "chalet"]
    Chalet,
    /// A penthouse
    #[string = "atico"]
    Atico,
}

impl DwellingType {
    /// Price multiplier relative to a flat
    pub fn factor(self) -> Dimensionless {
        match self {
            Self::Piso => Dimensionless(1.0),
            Self::Chalet => Dimensionless(1.25),
            Self::Atico => Dimensionless(1.15),
        }
    }
}

/// Optional features of the property, each of which raises the price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Extras {
    /// Has a garden
    pub garden: bool,
    /// Has a terrace
    pub terrace: bool,
    /// Has a patio
    pub patio: bool,
    /// Has a basement
    pub basement: bool,
}

impl Extras {
    /// The combined multiplier of all enabled features
    pub fn factor(&self) -> Dimensionless {
        [
            (self.garden, GARDEN_FACTOR),
            (self.terrace, TERRACE_FACTOR),
            (self.patio, PATIO_FACTOR),
            (self.basement, BASEMENT_FACTOR),
        ]
        .into_iter()
        .filter(|(enabled, _)| *enabled)
        .fold(Dimensionless(1.0), |acc, (_, factor)| {
            acc * Dimensionless(1.0 + factor)
        })
    }
}

/// The property being priced
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Property {
    /// Floor area in square metres
    pub area: Area,
    /// Kind of dwelling
    pub dwelling_type: DwellingType,
    /// Number of rooms
    pub rooms: u32,
    /// Optional features
    pub extras: Extras,
}

impl Property {
    /// The combined price multiplier for this property's characteristics
    pub fn factor(&self) -> Dimensionless {
        let rooms = Dimensionless(1.0 + (f64::from(self.rooms) - ROOMS_BASE) * ROOM_FACTOR);
        self.dwelling_type.factor() * rooms * self.extras.factor()
    }
}

/// Assumptions used when projecting prices
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceAssumptions {
    /// Which of the location's inflation rates to use
    pub scenario: Scenario,
    /// The lowest yearly inflation rate reached as inflation decays
    pub inflation_floor: Dimensionless,
}

/// The inflation rate for the given year offset.
///
/// For the first five years this is `base`. It then falls linearly by half a percentage point a
/// year until it reaches `floor`.
pub fn inflation_for(year: u32, base: Dimensionless, floor: Dimensionless) -> Dimensionless {
    if year < INFLATION_DECAY_START {
        return base;
    }

    let decay = INFLATION_DECAY_PER_YEAR * f64::from(year - (INFLATION_DECAY_START - 1));
    (base - Dimensionless(decay)).max(floor)
}

/// The price per square metre in year 0, adjusted for the property's characteristics
pub fn base_unit_price(location: &Location, property: &Property) -> MoneyPerArea {
    location.price_per_area * property.factor()
}

/// Project the price of a property at a single location.
///
/// # Returns
///
/// A `Vec` of length `horizon + 1` with the total price for each year.
pub fn project_price(
    location: &Location,
    horizon: u32,
    property: &Property,
    assumptions: &PriceAssumptions,
) -> Vec<Money> {
    let base_inflation = location.inflation(assumptions.scenario);
    let mut unit_price = base_unit_price(location, property);
    let mut prices = Vec::with_capacity(horizon as usize + 1);
    prices.push(unit_price * property.area);
    for year in 1..=horizon {
        let inflation = inflation_for(year, base_inflation, assumptions.inflation_floor);
        unit_price = unit_price * (Dimensionless(1.0) + inflation);
        prices.push(unit_price * property.area);
    }

    prices
}

/// Project the mean price of a property across several locations.
///
/// Each location is projected independently and the results averaged year by year.
///
/// # Panics
///
/// Panics if `locations` is empty.
pub fn project_mean_price(
    locations: &[Rc<Location>],
    horizon: u32,
    property: &Property,
    assumptions: &PriceAssumptions,
) -> Vec<Money> {
    assert!(!locations.is_empty(), "Cannot average over no locations");

    let count = Dimensionless(locations.len() as f64);
    let projections: Vec<_> = locations
        .iter()
        .map(|location| project_price(location, horizon, property, assumptions))
        .collect();

    (0..=horizon as usize)
        .map(|year| projections.iter().map(|prices| prices[year]).sum::<Money>() / count)
        .collect()
}
