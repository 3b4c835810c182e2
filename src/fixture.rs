//! Fixtures for tests

use crate::config::Configuration;
use crate::location::{Location, LocationCatalog};
use crate::price::{DwellingType, Extras, Property};
use crate::units::{Area, Dimensionless, MoneyPerArea};
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

#[fixture]
pub fn location() -> Location {
    Location {
        id: "Testville".into(),
        price_per_area: MoneyPerArea(2000.0),
        inflation_low: Dimensionless(0.03),
        inflation_mid: Dimensionless(0.05),
        inflation_high: Dimensionless(0.08),
    }
}

#[fixture]
pub fn property() -> Property {
    Property {
        area: Area(70.0),
        dwelling_type: DwellingType::Piso,
        rooms: 3,
        extras: Extras::default(),
    }
}

#[fixture]
pub fn catalog(location: Location) -> LocationCatalog {
    let mut catalog = LocationCatalog::default();
    catalog.extend_locations([location]);
    catalog
}

#[fixture]
pub fn configuration() -> Configuration {
    toml::from_str("locations = [\"Testville\"]\nyears = 5\nstart_year = 2025").unwrap()
}
