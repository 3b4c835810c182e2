//! Combines projected prices, salary and savings into the reported series and summary.
use crate::config::Configuration;
use crate::finance::mortgage_payment;
use crate::location::LocationCatalog;
use crate::price::project_mean_price;
use crate::salary::{CareerMap, project_salary};
use crate::savings::project_savings;
use crate::units::{Dimensionless, Money};
use anyhow::Result;
use itertools::Itertools;
use log::{debug, info};
use serde::Serialize;
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};
use std::fmt;
use std::rc::Rc;

/// The largest relative gap between savings and down payment counted as a close match
const MATCH_TOLERANCE: f64 = 0.08;

/// The largest share of salary which should go on mortgage payments
const MAX_MORTGAGE_SHARE: f64 = 0.35;

/// The property value reported for each selected location or group
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
pub enum PropertyMetric {
    /// The full price
    #[string = "price"]
    Price,
    /// The down payment
    #[default]
    #[string = "down"]
    Down,
    /// The monthly mortgage payment on the rest of the price
    #[string = "mortgage"]
    Mortgage,
}

/// The personal value reported alongside the property values
#[derive(
    PartialEq, Eq, Debug, Clone, Copy, SerializeLabeledStringEnum, DeserializeLabeledStringEnum,
)]
pub enum PersonalMetric {
    /// Accumulated savings
    #[string = "savings"]
    Savings,
    /// Amount saved each month
    #[string = "monthly_savings"]
    MonthlySavings,
    /// Net monthly salary
    #[string = "salary"]
    Salary,
    /// Net monthly salary, plus the number of years of salary needed to buy
    #[string = "ratio"]
    Ratio,
}

/// A labelled series of values, one per year
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// The label used as a column header
    pub label: String,
    /// The values for each year
    pub values: Vec<f64>,
}

/// Round each value of a money series to the nearest whole unit
fn round_all(values: &[Money]) -> Vec<f64> {
    values.iter().map(|value| value.round().value()).collect()
}

/// Projected values for one selected location or group. Values are not rounded.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyProjection {
    /// The name of the location or group
    pub name: Rc<str>,
    /// Price for each year
    pub price: Vec<Money>,
    /// Down payment for each year
    pub down_payment: Vec<Money>,
    /// Monthly mortgage payment for each year
    pub mortgage_payment: Vec<Money>,
}

impl PropertyProjection {
    /// The values for the given metric
    pub fn metric(&self, metric: PropertyMetric) -> &[Money] {
        match metric {
            PropertyMetric::Price => &self.price,
            PropertyMetric::Down => &self.down_payment,
            PropertyMetric::Mortgage => &self.mortgage_payment,
        }
    }
}

/// The result of a projection
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    /// The calendar year of year offset 0
    pub start_year: i32,
    /// Down payment as a percentage of the price (used in labels)
    pub down_payment_pct: f64,
    /// The property value to report
    pub property_metric: PropertyMetric,
    /// The personal value to report
    pub personal_metric: PersonalMetric,
    /// Unrounded net monthly salary for each year
    pub salary: Vec<Money>,
    /// Savings balance at the end of each year (rounded)
    pub savings: Vec<Money>,
    /// Amount saved each month of each year (rounded)
    pub monthly_savings: Vec<Money>,
    /// Projected values for each selected location or group, groups first
    pub properties: Vec<PropertyProjection>,
}

/// The headline results of a projection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// The last calendar year of the projection
    pub final_year: i32,
    /// Number of years projected after the start year
    pub years: u32,
    /// The property value reported
    pub property_metric: PropertyMetric,
    /// The personal value reported
    pub personal_metric: PersonalMetric,
    /// Label of the first property series
    pub property_label: String,
    /// Final value of the first property series
    pub final_property_value: f64,
    /// Final value of the personal series
    pub final_personal_value: f64,
    /// Final net monthly salary (rounded)
    pub final_salary: f64,
    /// Down payment as a percentage of the price
    pub down_payment_pct: f64,
    /// Whether the first property is affordable at the end of the projection. There is no
    /// judgement when the property metric is the price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affordable: Option<bool>,
    /// The first calendar year in which savings cover the down payment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal_year: Option<i32>,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = match self.affordable {
            Some(true) => " (affordable)",
            Some(false) => " (not affordable)",
            None => "",
        };

        match self.property_metric {
            PropertyMetric::Down => {
                writeln!(
                    f,
                    "You need {}€ for the down payment ({}%).",
                    self.final_property_value, self.down_payment_pct
                )?;
                let personal = match self.personal_metric {
                    PersonalMetric::Savings => "Savings",
                    PersonalMetric::MonthlySavings => "Monthly savings",
                    PersonalMetric::Salary | PersonalMetric::Ratio => "Salary",
                };
                write!(
                    f,
                    "{personal} after {} years: {}€{verdict}",
                    self.years, self.final_personal_value
                )?;
                if let Some(year) = self.goal_year {
                    write!(f, "\nDown payment reached in {year}")?;
                }
                Ok(())
            }
            PropertyMetric::Mortgage => write!(
                f,
                "Estimated mortgage payment: {}€ / month.\nFinal salary: {}€ / month{verdict}",
                self.final_property_value, self.final_salary
            ),
            PropertyMetric::Price => write!(
                f,
                "Estimated price in {} years: {}€",
                self.years, self.final_property_value
            ),
        }
    }
}

impl Projection {
    /// Number of years projected after the start year
    pub fn horizon(&self) -> u32 {
        (self.salary.len() - 1) as u32
    }

    /// The calendar year of each year offset
    pub fn calendar_years(&self) -> Vec<i32> {
        (0..self.salary.len() as i32)
            .map(|offset| self.start_year + offset)
            .collect()
    }

    /// The net monthly salary for each year, rounded for reporting
    pub fn rounded_salary(&self) -> Vec<Money> {
        self.salary.iter().map(|salary| salary.round()).collect()
    }

    /// The label for a property series
    fn property_label(&self, name: &str, metric: PropertyMetric) -> String {
        match metric {
            PropertyMetric::Price => format!("{name} price €"),
            PropertyMetric::Down => format!("{name} down {}% €", self.down_payment_pct),
            PropertyMetric::Mortgage => format!("{name} mortgage €/mo"),
        }
    }

    /// One series of the chosen property metric for each selected location or group
    pub fn property_series(&self) -> Vec<Series> {
        self.properties
            .iter()
            .map(|property| Series {
                label: self.property_label(&property.name, self.property_metric),
                values: round_all(property.metric(self.property_metric)),
            })
            .collect()
    }

    /// The series for the chosen personal metric
    pub fn personal_series(&self) -> Series {
        match self.personal_metric {
            PersonalMetric::Savings => Series {
                label: "Savings €".into(),
                values: round_all(&self.savings),
            },
            PersonalMetric::MonthlySavings => Series {
                label: "Monthly savings €".into(),
                values: round_all(&self.monthly_savings),
            },
            PersonalMetric::Salary | PersonalMetric::Ratio => Series {
                label: "Net salary €/mo".into(),
                values: round_all(&self.salary),
            },
        }
    }

    /// The number of years of salary needed to buy the first selected property.
    ///
    /// Only produced for the ratio metric. A year with no salary gives an infinite ratio.
    pub fn ratio_series(&self) -> Option<Series> {
        if self.personal_metric != PersonalMetric::Ratio {
            return None;
        }

        let first = self.properties.first()?;
        let values = first
            .price
            .iter()
            .zip(self.rounded_salary())
            .map(|(price, salary)| {
                (price.round() / (salary * Dimensionless(12.0)))
                    .value()
                    .round()
            })
            .collect();

        Some(Series {
            label: format!(
                "{} / salary yrs",
                self.property_label(&first.name, PropertyMetric::Price)
            ),
            values,
        })
    }

    /// All reported series: the personal series, then the property series, then the ratio series
    pub fn series(&self) -> Vec<Series> {
        let mut series = vec![self.personal_series()];
        series.extend(self.property_series());
        series.extend(self.ratio_series());
        series
    }

    /// The first calendar year in which savings cover the first property's down payment.
    ///
    /// Only reported when the property metric is the down payment and the personal metric is
    /// savings.
    pub fn goal_year(&self) -> Option<i32> {
        if self.property_metric != PropertyMetric::Down
            || self.personal_metric != PersonalMetric::Savings
        {
            return None;
        }

        let first = self.properties.first()?;
        let offset = first
            .down_payment
            .iter()
            .zip(&self.savings)
            .position(|(down, savings)| *savings >= down.round())?;
        Some(self.start_year + offset as i32)
    }

    /// For each year, the names of the locations and groups whose down payment is within 8% of
    /// the savings
    pub fn matches(&self) -> Vec<Vec<Rc<str>>> {
        (0..self.savings.len())
            .map(|year| {
                self.properties
                    .iter()
                    .filter(|property| {
                        is_close_match(property.down_payment[year], self.savings[year])
                    })
                    .map(|property| property.name.clone())
                    .collect()
            })
            .collect()
    }

    /// The headline results
    pub fn summary(&self) -> Summary {
        let first = self.property_series().into_iter().next();
        let (property_label, final_property_value) = first
            .map(|series| (series.label, series.values.last().copied().unwrap_or(0.0)))
            .unwrap_or_default();
        let final_personal_value = self
            .personal_series()
            .values
            .last()
            .copied()
            .unwrap_or(0.0);
        let final_salary = self
            .salary
            .last()
            .map_or(0.0, |salary| salary.round().value());

        let affordable = match self.property_metric {
            PropertyMetric::Down => Some(final_personal_value >= final_property_value),
            PropertyMetric::Mortgage => {
                Some(MAX_MORTGAGE_SHARE * final_salary >= final_property_value)
            }
            PropertyMetric::Price => None,
        };

        Summary {
            final_year: self.start_year + self.horizon() as i32,
            years: self.horizon(),
            property_metric: self.property_metric,
            personal_metric: self.personal_metric,
            property_label,
            final_property_value,
            final_personal_value,
            final_salary,
            down_payment_pct: self.down_payment_pct,
            affordable,
            goal_year: self.goal_year(),
        }
    }
}

/// Whether savings are within [`MATCH_TOLERANCE`] of the down payment. A zero down payment never
/// matches.
fn is_close_match(down_payment: Money, savings: Money) -> bool {
    if down_payment == Money(0.0) {
        return false;
    }

    ((down_payment - savings) / down_payment).value().abs() <= MATCH_TOLERANCE
}

/// Run a projection for the given configuration.
///
/// The configuration should already have been validated. Nothing is cached between calls, so
/// identical inputs always give identical results.
///
/// # Arguments
///
/// * `config` - The projection configuration
/// * `catalog` - The locations and groups which can be selected
/// * `careers` - The careers which can be followed
pub fn run_projection(
    config: &Configuration,
    catalog: &LocationCatalog,
    careers: &CareerMap,
) -> Result<Projection> {
    let horizon = config.horizon()?;
    let sources = catalog.resolve_selection(&config.locations)?;
    let career = config.career_path(careers)?;
    info!(
        "Projecting {} over {horizon} years from {}",
        sources.iter().map(|source| &source.name).join(", "),
        config.start_year
    );

    // Personal finances
    let salary = project_salary(config.salary.net_monthly(), horizon, &career);
    let contributions = config.savings.contributions(horizon);
    let savings = project_savings(
        config.initial_savings,
        Dimensionless::from_percent(config.return_rate_pct),
        &salary,
        &contributions,
    );
    let monthly_savings = salary
        .iter()
        .enumerate()
        .map(|(year, salary)| {
            contributions
                .monthly_savings(year, salary.round())
                .round()
        })
        .collect();

    // Property prices
    let property = config.property();
    let assumptions = config.price_assumptions();
    let down_fraction = Dimensionless::from_percent(config.down_payment_pct);
    let loan_fraction = Dimensionless(1.0) - down_fraction;
    let mortgage_rate = Dimensionless::from_percent(config.mortgage_rate_pct);
    let properties = sources
        .into_iter()
        .map(|source| {
            debug!(
                "Projecting price for {} ({} locations)",
                source.name,
                source.members.len()
            );
            let price = project_mean_price(&source.members, horizon, &property, &assumptions);
            let down_payment = price.iter().map(|&price| price * down_fraction).collect();
            let mortgage_payment = price
                .iter()
                .map(|&price| {
                    mortgage_payment(price * loan_fraction, mortgage_rate, config.mortgage_years)
                })
                .collect();

            PropertyProjection {
                name: source.name,
                price,
                down_payment,
                mortgage_payment,
            }
        })
        .collect();

    Ok(Projection {
        start_year: config.start_year,
        down_payment_pct: config.down_payment_pct,
        property_metric: config.property_metric,
        personal_metric: config.personal_metric(),
        salary,
        savings,
        monthly_savings,
        properties,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, catalog, configuration};
    use crate::savings::SavingsPolicy;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn project(config: &Configuration, catalog: &LocationCatalog) -> Projection {
        run_projection(config, catalog, &config.careers()).unwrap()
    }

    #[rstest]
    fn test_run_projection_end_to_end(configuration: Configuration, catalog: LocationCatalog) {
        let projection = project(&configuration, &catalog);
        assert_eq!(projection.properties.len(), 1);
        assert_eq!(projection.salary.len(), 6);
        assert_eq!(projection.calendar_years(), [2025, 2026, 2027, 2028, 2029, 2030]);

        let property = &projection.properties[0];
        assert_approx_eq!(Money, property.price[0], Money(140_000.0));
        assert_approx_eq!(Money, property.down_payment[0], Money(28_000.0));
        assert_approx_eq!(
            Money,
            property.price[4],
            Money(140_000.0 * 1.05f64.powi(4)),
            epsilon = 1e-6
        );

        // Inflation starts to decay in year 5
        assert_approx_eq!(
            Money,
            property.price[5],
            property.price[4] * Dimensionless(1.045),
            epsilon = 1e-6
        );
    }

    #[rstest]
    fn test_run_projection_negative_horizon(
        mut configuration: Configuration,
        catalog: LocationCatalog,
    ) {
        configuration.years = -3;
        assert_error!(
            run_projection(&configuration, &catalog, &configuration.careers()),
            "years cannot be negative (got -3)"
        );
    }

    #[rstest]
    fn test_run_projection_empty_selection(
        mut configuration: Configuration,
        catalog: LocationCatalog,
    ) {
        configuration.locations.clear();
        assert_error!(
            run_projection(&configuration, &catalog, &configuration.careers()),
            "No locations selected"
        );
    }

    #[rstest]
    fn test_run_projection_horizon_zero(
        mut configuration: Configuration,
        catalog: LocationCatalog,
    ) {
        configuration.years = 0;
        let projection = project(&configuration, &catalog);
        assert_eq!(projection.salary.len(), 1);
        assert_eq!(projection.savings.len(), 1);
        assert_eq!(projection.properties[0].price.len(), 1);
    }

    #[rstest]
    fn test_run_projection_is_idempotent(
        configuration: Configuration,
        catalog: LocationCatalog,
    ) {
        let first = project(&configuration, &catalog);
        let second = project(&configuration, &catalog);
        assert_eq!(first, second);
        assert_eq!(first.goal_year(), second.goal_year());
    }

    #[rstest]
    #[case(PropertyMetric::Price, "Testville price €", 140_000.0)]
    #[case(PropertyMetric::Down, "Testville down 20% €", 28_000.0)]
    #[case(PropertyMetric::Mortgage, "Testville mortgage €/mo", 472.0)]
    fn test_property_series(
        mut configuration: Configuration,
        catalog: LocationCatalog,
        #[case] metric: PropertyMetric,
        #[case] label: &str,
        #[case] first_value: f64,
    ) {
        configuration.property_metric = metric;
        let series = project(&configuration, &catalog).property_series();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].label, label);
        assert_eq!(series[0].values[0], first_value);
    }

    #[rstest]
    #[case(PersonalMetric::Savings, "Savings €", 9600.0)]
    #[case(PersonalMetric::MonthlySavings, "Monthly savings €", 800.0)]
    #[case(PersonalMetric::Salary, "Net salary €/mo", 2000.0)]
    #[case(PersonalMetric::Ratio, "Net salary €/mo", 2000.0)]
    fn test_personal_series(
        mut configuration: Configuration,
        catalog: LocationCatalog,
        #[case] metric: PersonalMetric,
        #[case] label: &str,
        #[case] first_value: f64,
    ) {
        configuration.personal_metric = Some(metric);
        let series = project(&configuration, &catalog).personal_series();
        assert_eq!(series.label, label);
        assert_eq!(series.values[0], first_value);
    }

    #[rstest]
    fn test_series_order_with_ratio(mut configuration: Configuration, catalog: LocationCatalog) {
        configuration.personal_metric = Some(PersonalMetric::Ratio);
        let projection = project(&configuration, &catalog);
        let labels = projection
            .series()
            .into_iter()
            .map(|series| series.label)
            .collect_vec();
        assert_eq!(
            labels,
            [
                "Net salary €/mo",
                "Testville down 20% €",
                "Testville price € / salary yrs"
            ]
        );

        // 140000 / (2000 * 12) = 5.83
        let ratio = projection.ratio_series().unwrap();
        assert_eq!(ratio.values[0], 6.0);
    }

    #[rstest]
    fn test_ratio_series_only_for_ratio_metric(
        configuration: Configuration,
        catalog: LocationCatalog,
    ) {
        assert!(project(&configuration, &catalog).ratio_series().is_none());
    }

    #[rstest]
    fn test_monthly_savings_expense_mode(
        mut configuration: Configuration,
        catalog: LocationCatalog,
    ) {
        configuration.savings = SavingsPolicy::Expense {
            curve: Default::default(),
        };
        configuration.personal_metric = Some(PersonalMetric::MonthlySavings);
        let series = project(&configuration, &catalog).personal_series();
        assert_eq!(series.values[0], 1200.0);
    }

    #[rstest]
    fn test_goal_year(mut configuration: Configuration, catalog: LocationCatalog) {
        // Saving 9600 a year with no returns against a down payment of 28000 and up
        configuration.return_rate_pct = 0.0;
        configuration.years = 10;
        let projection = project(&configuration, &catalog);

        let down = round_all(&projection.properties[0].down_payment);
        let offset = projection
            .savings
            .iter()
            .zip(&down)
            .position(|(savings, down)| savings.value() >= *down)
            .unwrap();
        assert_eq!(projection.goal_year(), Some(2025 + offset as i32));

        // Never reached within a short horizon
        configuration.years = 1;
        assert_eq!(project(&configuration, &catalog).goal_year(), None);

        // Only reported for down payments against savings
        configuration.years = 10;
        configuration.personal_metric = Some(PersonalMetric::Salary);
        assert_eq!(project(&configuration, &catalog).goal_year(), None);
    }

    #[rstest]
    #[case(28_000.0, 28_000.0, true)]
    #[case(28_000.0, 25_760.0, true)] // exactly 8% short
    #[case(28_000.0, 30_240.0, true)] // exactly 8% over
    #[case(28_000.0, 25_000.0, false)]
    #[case(0.0, 0.0, false)] // zero down payment never matches
    fn test_is_close_match(#[case] down: f64, #[case] savings: f64, #[case] expected: bool) {
        assert_eq!(is_close_match(Money(down), Money(savings)), expected);
    }

    #[rstest]
    fn test_matches(mut configuration: Configuration, catalog: LocationCatalog) {
        configuration.initial_savings = Money(26_000.0);
        configuration.return_rate_pct = 0.0;
        configuration.salary = crate::salary::SalaryInput::Net {
            monthly: Money(0.0),
        };
        let projection = project(&configuration, &catalog);
        let matches = projection.matches();
        assert_eq!(matches.len(), 6);
        assert_eq!(matches[0], [Rc::<str>::from("Testville")]);
        assert!(matches[5].is_empty());
    }

    #[rstest]
    fn test_summary_down(mut configuration: Configuration, catalog: LocationCatalog) {
        configuration.return_rate_pct = 0.0;
        let summary = project(&configuration, &catalog).summary();
        assert_eq!(summary.final_year, 2030);
        assert_eq!(summary.property_label, "Testville down 20% €");
        assert_eq!(
            summary.affordable,
            Some(summary.final_personal_value >= summary.final_property_value)
        );
        assert!(summary.to_string().starts_with("You need "));
    }

    #[rstest]
    #[case(2000.0, true)]
    #[case(1000.0, false)]
    fn test_summary_mortgage(
        mut configuration: Configuration,
        catalog: LocationCatalog,
        #[case] monthly: f64,
        #[case] expected: bool,
    ) {
        configuration.years = 0;
        configuration.property_metric = PropertyMetric::Mortgage;
        configuration.salary = crate::salary::SalaryInput::Net {
            monthly: Money(monthly),
        };

        // Payment of 472 against 35% of the salary
        let summary = project(&configuration, &catalog).summary();
        assert_eq!(summary.final_property_value, 472.0);
        assert_eq!(summary.affordable, Some(expected));
    }

    #[rstest]
    fn test_summary_price(mut configuration: Configuration, catalog: LocationCatalog) {
        configuration.property_metric = PropertyMetric::Price;
        let summary = project(&configuration, &catalog).summary();
        assert_eq!(summary.affordable, None);
        assert_eq!(summary.goal_year, None);
    }
}
