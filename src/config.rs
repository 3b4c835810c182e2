//! Defines the `Configuration` struct, which represents the contents of `projection.toml`.
use crate::id::IDCollection;
use crate::input::{
    deserialise_lenient_integer, deserialise_lenient_number, deserialise_percentage,
    input_err_msg, read_toml,
};
use crate::location::Scenario;
use crate::price::{DwellingType, Extras, PriceAssumptions, Property};
use crate::projection::{PersonalMetric, PropertyMetric};
use crate::salary::{Career, CareerMap, CareerPath, SalaryInput, builtin_careers};
use crate::savings::SavingsPolicy;
use crate::units::{Area, Dimensionless, Money};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// The name of the configuration file in a projection folder
pub const CONFIG_FILE_NAME: &str = "projection.toml";

/// The longest horizon which can be projected
const MAX_HORIZON: i64 = 100;

/// The longest mortgage term in years
const MAX_MORTGAGE_YEARS: u32 = 100;

/// The latest calendar year a projection can start in
const MAX_START_YEAR: i32 = 9999;

macro_rules! define_unit_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            <$type>::new($value)
        }
    };
}

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

define_param_default!(default_years, i64, 10);
define_param_default!(default_start_year, i32, 2025);
define_unit_param_default!(default_area, Area, 70.0);
define_param_default!(default_rooms, u32, 3);
define_param_default!(default_return_rate_pct, f64, 2.0);
define_param_default!(default_inflation_floor_pct, f64, 2.0);
define_param_default!(default_down_payment_pct, f64, 20.0);
define_param_default!(default_mortgage_rate_pct, f64, 3.0);
define_param_default!(default_mortgage_years, u32, 30);
define_param_default!(default_career, String, "stay".into());
define_param_default!(
    default_salary,
    SalaryInput,
    SalaryInput::Net {
        monthly: Money(2000.0)
    }
);

/// A change of career in a given calendar year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerSwitch {
    /// The calendar year from which the new career applies
    #[serde(deserialize_with = "deserialise_lenient_integer")]
    pub year: i32,
    /// The name of the new career
    pub career: String,
}

/// Which of the savings policy's curves a node belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveKind {
    /// The savings rate curve (percent of salary)
    Savings,
    /// The monthly expense curve
    Expense,
}

impl fmt::Display for CurveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Savings => write!(f, "savings"),
            Self::Expense => write!(f, "expense"),
        }
    }
}

/// Represents the contents of the entire configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Names of the selected locations and groups
    pub locations: Vec<String>,
    /// Number of years to project after the start year
    #[serde(default = "default_years")]
    #[serde(deserialize_with = "deserialise_lenient_integer")]
    pub years: i64,
    /// The calendar year of year offset 0
    #[serde(default = "default_start_year")]
    #[serde(deserialize_with = "deserialise_lenient_integer")]
    pub start_year: i32,
    /// Floor area of the property in square metres
    #[serde(default = "default_area")]
    #[serde(deserialize_with = "deserialise_lenient_number")]
    pub area: Area,
    /// The kind of dwelling
    #[serde(default)]
    pub dwelling_type: DwellingType,
    /// Number of rooms
    #[serde(default = "default_rooms")]
    #[serde(deserialize_with = "deserialise_lenient_integer")]
    pub rooms: u32,
    /// Optional features of the property
    #[serde(default)]
    pub extras: Extras,
    /// Salary in year 0
    #[serde(default = "default_salary")]
    pub salary: SalaryInput,
    /// How much of the salary is saved
    #[serde(default)]
    pub savings: SavingsPolicy,
    /// Yearly return on savings in percent
    #[serde(default = "default_return_rate_pct")]
    #[serde(deserialize_with = "deserialise_percentage")]
    pub return_rate_pct: f64,
    /// The lowest yearly price inflation in percent
    #[serde(default = "default_inflation_floor_pct")]
    #[serde(deserialize_with = "deserialise_percentage")]
    pub inflation_floor_pct: f64,
    /// Down payment as a percentage of the price
    #[serde(default = "default_down_payment_pct")]
    #[serde(deserialize_with = "deserialise_percentage")]
    pub down_payment_pct: f64,
    /// Yearly mortgage interest rate in percent
    #[serde(default = "default_mortgage_rate_pct")]
    #[serde(deserialize_with = "deserialise_percentage")]
    pub mortgage_rate_pct: f64,
    /// Term of the mortgage in years
    #[serde(default = "default_mortgage_years")]
    #[serde(deserialize_with = "deserialise_lenient_integer")]
    pub mortgage_years: u32,
    /// Savings at the start of the projection
    #[serde(default)]
    #[serde(deserialize_with = "deserialise_lenient_number")]
    pub initial_savings: Money,
    /// Which inflation assumption to use
    #[serde(default)]
    pub scenario: Scenario,
    /// The property value to report
    #[serde(default)]
    pub property_metric: PropertyMetric,
    /// The personal value to report. Chosen to suit the property metric if not given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_metric: Option<PersonalMetric>,
    /// The name of the current career
    #[serde(default = "default_career")]
    pub career: String,
    /// An optional change of career
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub career_switch: Option<CareerSwitch>,
    /// Extra careers, which override built-in careers with the same name
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub careers: IndexMap<String, Career>,
}

/// Check that the `years` parameter is valid and convert it to a horizon
fn check_horizon(years: i64) -> Result<u32> {
    ensure!(years >= 0, "years cannot be negative (got {years})");
    ensure!(
        years <= MAX_HORIZON,
        "years cannot be greater than {MAX_HORIZON} (got {years})"
    );

    Ok(u32::try_from(years)?)
}

/// Check that the `start_year` parameter is valid
fn check_start_year(start_year: i32) -> Result<()> {
    ensure!(
        (0..=MAX_START_YEAR).contains(&start_year),
        "start_year must be between 0 and {MAX_START_YEAR} (got {start_year})"
    );

    Ok(())
}

/// Check that the `mortgage_years` parameter is valid
fn check_mortgage_years(mortgage_years: u32) -> Result<()> {
    ensure!(
        mortgage_years <= MAX_MORTGAGE_YEARS,
        "mortgage_years cannot be greater than {MAX_MORTGAGE_YEARS} (got {mortgage_years})"
    );

    Ok(())
}

/// Check that the `area` parameter is valid
fn check_area(area: Area) -> Result<()> {
    ensure!(
        area.is_finite() && area > Area(0.0),
        "area must be a finite number greater than zero"
    );

    Ok(())
}

/// Check that the salary input is valid
fn check_salary(salary: &SalaryInput) -> Result<()> {
    match *salary {
        SalaryInput::Net { monthly } => {
            ensure!(
                monthly.is_finite() && monthly >= Money(0.0),
                "Net salary must be a finite number which is not negative"
            );
        }
        SalaryInput::Gross {
            annual,
            pay_periods,
            withholding_pct,
        } => {
            ensure!(
                annual.is_finite() && annual >= Money(0.0),
                "Gross salary must be a finite number which is not negative"
            );
            ensure!(
                pay_periods.is_finite() && pay_periods >= 0.0,
                "pay_periods must be a finite number which is not negative"
            );
            ensure!(
                (0.0..=100.0).contains(&withholding_pct),
                "withholding_pct must be between 0 and 100"
            );
        }
    }

    Ok(())
}

/// Check that a career defined in the configuration is valid
fn check_career(name: &str, career: &Career) -> Result<()> {
    match career {
        Career::Growth(schedule) => {
            ensure!(
                schedule.0.iter().all(|rate| rate.value().is_finite()),
                "Growth rates for career {name} must be finite numbers"
            );
        }
        Career::LinearRaise(raise) => {
            ensure!(
                raise.interval_months > 0,
                "interval_months for career {name} must be greater than zero"
            );
            ensure!(
                raise.annual_raise.is_finite() && raise.annual_cap.is_finite(),
                "Raise and cap for career {name} must be finite numbers"
            );
        }
    }

    Ok(())
}

/// Check that no node of the savings curve lies beyond the horizon or outside the allowed values
fn check_savings_curve(savings: &SavingsPolicy, horizon: u32) -> Result<()> {
    if let Some(node) = savings.curve().nodes().last() {
        ensure!(
            node.year <= horizon,
            "Savings curve has a node at year {}, beyond the horizon of {horizon} years",
            node.year
        );
    }

    let range = savings.value_range();
    for node in savings.curve().nodes() {
        ensure!(
            range.contains(&node.value),
            "Savings curve value at year {} must be between {} and {} (got {})",
            node.year,
            range.start(),
            range.end(),
            node.value
        );
    }

    Ok(())
}

impl Configuration {
    /// Read a configuration file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `config_dir` - Folder containing the configuration file
    ///
    /// # Returns
    ///
    /// The file contents as a [`Configuration`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(config_dir: P) -> Result<Configuration> {
        let file_path = config_dir.as_ref().join(CONFIG_FILE_NAME);
        let config: Configuration = read_toml(&file_path)?;

        config
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(config)
    }

    /// Write the configuration to the configuration file in the specified directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let file_path = config_dir.as_ref().join(CONFIG_FILE_NAME);
        let contents = toml::to_string(self)?;
        fs::write(&file_path, contents)
            .with_context(|| format!("Could not write {}", file_path.display()))?;

        Ok(())
    }

    /// Validate parameters after reading in file
    pub fn validate(&self) -> Result<()> {
        // years
        let horizon = self.horizon()?;

        // start_year
        check_start_year(self.start_year)?;

        // area
        check_area(self.area)?;

        // salary
        check_salary(&self.salary)?;

        // savings
        check_savings_curve(&self.savings, horizon)?;

        // mortgage_years
        check_mortgage_years(self.mortgage_years)?;

        // initial_savings
        ensure!(
            self.initial_savings.is_finite(),
            "initial_savings must be a finite number"
        );

        // careers, career and career_switch
        for (name, career) in &self.careers {
            check_career(name, career)?;
        }
        self.career_path(&self.careers())?;

        Ok(())
    }

    /// The number of years to project after the start year
    pub fn horizon(&self) -> Result<u32> {
        check_horizon(self.years)
    }

    /// The property whose price is projected
    pub fn property(&self) -> Property {
        Property {
            area: self.area,
            dwelling_type: self.dwelling_type,
            rooms: self.rooms,
            extras: self.extras,
        }
    }

    /// The assumptions used for projecting prices
    pub fn price_assumptions(&self) -> PriceAssumptions {
        PriceAssumptions {
            scenario: self.scenario,
            inflation_floor: Dimensionless::from_percent(self.inflation_floor_pct),
        }
    }

    /// The personal metric to report.
    ///
    /// If none was given, savings are compared against price and down payment, and salary against
    /// mortgage payments.
    pub fn personal_metric(&self) -> PersonalMetric {
        self.personal_metric
            .unwrap_or(match self.property_metric {
                PropertyMetric::Price | PropertyMetric::Down => PersonalMetric::Savings,
                PropertyMetric::Mortgage => PersonalMetric::Salary,
            })
    }

    /// All available careers: the built-in ones plus those defined in the configuration
    pub fn careers(&self) -> CareerMap {
        let mut careers = builtin_careers();
        for (name, career) in &self.careers {
            careers.insert(name.as_str().into(), *career);
        }

        careers
    }

    /// Look up the careers to follow before and after any career switch
    pub fn career_path<'a>(&self, careers: &'a CareerMap) -> Result<CareerPath<'a>> {
        let lookup = |name: &str| -> Result<&'a Career> {
            let id = careers
                .get_id_by_str(name)
                .with_context(|| format!("Invalid career: {name}"))?;
            Ok(&careers[&id])
        };

        let before = lookup(&self.career)?;
        let (after, switch_offset) = match &self.career_switch {
            Some(switch) => (
                lookup(&switch.career)?,
                Some(i64::from(switch.year) - i64::from(self.start_year)),
            ),
            None => (before, None),
        };

        Ok(CareerPath {
            before,
            after,
            switch_offset,
        })
    }

    /// Set a node on one of the savings curves, as `curve set` does.
    ///
    /// If `kind` is not the active savings mode, the configuration is switched to that mode with a
    /// default curve. The curve is fitted to the horizon before the node is set, and a year beyond
    /// the horizon is moved to the horizon. Values outside the curve's range are clamped to it.
    ///
    /// # Returns
    ///
    /// The value which was set
    pub fn set_curve_node(&mut self, kind: CurveKind, year: i64, value: f64) -> Result<f64> {
        ensure!(year >= 0, "Curve year cannot be negative (got {year})");
        ensure!(value.is_finite(), "Curve value must be a finite number");
        let horizon = self.horizon()?;

        let active = match self.savings {
            SavingsPolicy::Rate { .. } => CurveKind::Savings,
            SavingsPolicy::Expense { .. } => CurveKind::Expense,
        };
        if active != kind {
            info!("Switching savings mode to {kind}");
            self.savings = match kind {
                CurveKind::Savings => SavingsPolicy::Rate {
                    curve: Default::default(),
                },
                CurveKind::Expense => SavingsPolicy::Expense {
                    curve: Default::default(),
                },
            };
        }

        let year = u32::try_from(year).unwrap_or(u32::MAX).min(horizon);
        let range = self.savings.value_range();
        let value = value.clamp(*range.start(), *range.end());
        self.savings.fit_to_horizon(horizon);
        self.savings.curve_mut().set_node(year, value);

        Ok(value)
    }
}
