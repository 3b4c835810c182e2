//! Salary growth along a career path.
use crate::id::define_id_type;
use crate::input::deserialise_lenient_number;
use crate::units::{Dimensionless, Money};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

define_id_type! {CareerID}

/// A map of careers, keyed by career ID
pub type CareerMap = IndexMap<CareerID, Career>;

/// The last year offset (exclusive) of each growth band but the final one
const GROWTH_BAND_ENDS: [u32; 2] = [5, 10];

/// Months in a year
const MONTHS_PER_YEAR: u32 = 12;

/// Staying in the same job: a raise of €2,000 a year every 18 months, up to €30,000 a year
const STAY: LinearRaise = LinearRaise {
    annual_raise: Money(2000.0),
    interval_months: 18,
    annual_cap: Money(30_000.0),
};

/// The built-in career changes and their yearly growth for years 0-4, 5-9 and 10 onwards
const BUILTIN_CAREERS: [(&str, [f64; 3]); 11] = [
    ("odoo", [0.1, 0.05, 0.03]),
    ("ai", [0.15, 0.08, 0.04]),
    ("ds", [0.12, 0.06, 0.04]),
    ("aieng", [0.13, 0.07, 0.05]),
    ("llm", [0.14, 0.08, 0.05]),
    ("quantum", [0.16, 0.09, 0.06]),
    ("bio", [0.11, 0.06, 0.04]),
    ("robotics", [0.12, 0.07, 0.05]),
    ("ethics", [0.08, 0.05, 0.03]),
    ("dataeng", [0.1, 0.06, 0.04]),
    ("finance", [0.13, 0.08, 0.05]),
];

/// Yearly salary growth rates for the bands [0, 5), [5, 10) and [10, ∞) years
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrowthSchedule(pub [Dimensionless; 3]);

impl GrowthSchedule {
    /// The growth rate applied at the end of year offset `year`
    pub fn rate_for(&self, year: u32) -> Dimensionless {
        let band = GROWTH_BAND_ENDS
            .iter()
            .position(|&end| year < end)
            .unwrap_or(GROWTH_BAND_ENDS.len());
        self.0[band]
    }
}

/// Fixed raises at regular intervals, until the salary reaches a cap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearRaise {
    /// The yearly salary added by each raise
    pub annual_raise: Money,
    /// Months between raises
    pub interval_months: u32,
    /// No raises take the yearly salary above this
    pub annual_cap: Money,
}

impl LinearRaise {
    /// The number of raises given by the end of year offset `year`
    fn raises_by(&self, year: u32) -> u32 {
        year.saturating_mul(MONTHS_PER_YEAR) / self.interval_months.max(1)
    }

    /// The monthly salary in year offset `year`, given the salary in the previous year.
    ///
    /// A salary already above the cap is kept as it is.
    pub fn next_salary(&self, salary: Money, year: u32) -> Money {
        let months = Dimensionless(f64::from(MONTHS_PER_YEAR));
        let cap = self.annual_cap / months;
        if salary >= cap {
            return salary;
        }

        let raises = self.raises_by(year) - self.raises_by(year.saturating_sub(1));
        let raised = salary + self.annual_raise / months * Dimensionless(f64::from(raises));
        if raised > cap { cap } else { raised }
    }
}

/// How a salary grows along a career.
///
/// In a configuration file, a growth schedule is written as a list of three rates and a linear
/// raise as a table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Career {
    /// Compound growth by year band
    Growth(GrowthSchedule),
    /// Fixed raises up to a cap
    LinearRaise(LinearRaise),
}

impl From<GrowthSchedule> for Career {
    fn from(schedule: GrowthSchedule) -> Self {
        Self::Growth(schedule)
    }
}

impl Career {
    /// The monthly salary in year offset `year`, given the salary in the previous year
    pub fn next_salary(&self, salary: Money, year: u32) -> Money {
        match self {
            Self::Growth(schedule) => {
                salary * (Dimensionless(1.0) + schedule.rate_for(year.saturating_sub(1)))
            }
            Self::LinearRaise(raise) => raise.next_salary(salary, year),
        }
    }
}

/// Get the built-in careers
pub fn builtin_careers() -> CareerMap {
    std::iter::once((CareerID::from("stay"), Career::LinearRaise(STAY)))
        .chain(BUILTIN_CAREERS.iter().map(|&(id, rates)| {
            (id.into(), GrowthSchedule(rates.map(Dimensionless)).into())
        }))
        .collect()
}

/// How the user has entered their salary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SalaryInput {
    /// Monthly salary after tax
    Net {
        /// Net monthly salary
        #[serde(deserialize_with = "deserialise_lenient_number")]
        monthly: Money,
    },
    /// Yearly salary before tax, paid in a number of instalments
    Gross {
        /// Gross annual salary
        #[serde(deserialize_with = "deserialise_lenient_number")]
        annual: Money,
        /// Number of payments per year (e.g. 12 or 14)
        #[serde(deserialize_with = "deserialise_lenient_number")]
        pay_periods: f64,
        /// Percentage of each payment withheld for income tax
        #[serde(deserialize_with = "deserialise_lenient_number")]
        withholding_pct: f64,
    },
}

impl SalaryInput {
    /// The net salary received each month.
    ///
    /// With zero pay periods there is no salary at all.
    pub fn net_monthly(&self) -> Money {
        match *self {
            Self::Net { monthly } => monthly,
            Self::Gross {
                annual,
                pay_periods,
                withholding_pct,
            } => {
                if pay_periods == 0.0 {
                    return Money(0.0);
                }

                annual / Dimensionless(pay_periods)
                    * (Dimensionless(1.0) - Dimensionless::from_percent(withholding_pct))
            }
        }
    }
}

/// Describes a career and an optional switch to a new career
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CareerPath<'a> {
    /// The career followed before the switch
    pub before: &'a Career,
    /// The career followed from the switch onwards
    pub after: &'a Career,
    /// Year offset at which the switch happens (`None` if it never does)
    pub switch_offset: Option<i64>,
}

impl CareerPath<'_> {
    /// The career which sets the salary change at the end of year offset `year`
    pub fn career_for(&self, year: u32) -> &Career {
        match self.switch_offset {
            Some(offset) if i64::from(year) >= offset => self.after,
            _ => self.before,
        }
    }
}

/// Project the net monthly salary for each year of the horizon.
///
/// Values are not rounded. Rounding is left to whatever displays the salary.
///
/// # Arguments
///
/// * `start_salary` - Net monthly salary in year 0
/// * `horizon` - Number of years to project
/// * `career` - The career path determining yearly growth
///
/// # Returns
///
/// A `Vec` of length `horizon + 1`.
pub fn project_salary(start_salary: Money, horizon: u32, career: &CareerPath) -> Vec<Money> {
    let mut salary = start_salary;
    let mut values = Vec::with_capacity(horizon as usize + 1);
    values.push(salary);
    for year in 1..=horizon {
        salary = career.career_for(year - 1).next_salary(salary, year);
        values.push(salary);
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn schedule(rates: [f64; 3]) -> GrowthSchedule {
        GrowthSchedule(rates.map(Dimensionless))
    }

    fn growth(rates: [f64; 3]) -> Career {
        schedule(rates).into()
    }

    #[rstest]
    #[case(0, 0.1)]
    #[case(4, 0.1)]
    #[case(5, 0.05)]
    #[case(9, 0.05)]
    #[case(10, 0.03)]
    #[case(40, 0.03)]
    fn test_growth_schedule_rate_for(#[case] year: u32, #[case] expected: f64) {
        assert_eq!(
            schedule([0.1, 0.05, 0.03]).rate_for(year),
            Dimensionless(expected)
        );
    }

    #[test]
    fn test_project_salary() {
        let growth = growth([0.1, 0.05, 0.03]);
        let career = CareerPath {
            before: &growth,
            after: &growth,
            switch_offset: None,
        };
        let salary = project_salary(Money(2000.0), 3, &career);
        assert_eq!(salary.len(), 4);
        assert_approx_eq!(Money, salary[0], Money(2000.0));
        assert_eq!(salary[1].round(), Money(2200.0));
        assert_approx_eq!(Money, salary[3], Money(2662.0), epsilon = 1e-9);
    }

    #[test]
    fn test_project_salary_bands() {
        let growth = growth([0.1, 0.0, 0.5]);
        let career = CareerPath {
            before: &growth,
            after: &growth,
            switch_offset: None,
        };
        let salary = project_salary(Money(1000.0), 11, &career);

        // Years 5-9 have no growth; growth between years 10 and 11 uses the last band
        assert_approx_eq!(Money, salary[10], salary[5]);
        assert_approx_eq!(Money, salary[11], salary[10] * Dimensionless(1.5));
    }

    #[test]
    fn test_project_salary_career_switch() {
        let before = growth([0.0, 0.0, 0.0]);
        let after = growth([0.5, 0.5, 0.5]);
        let career = CareerPath {
            before: &before,
            after: &after,
            switch_offset: Some(2),
        };
        let salary = project_salary(Money(100.0), 4, &career);
        assert_approx_eq!(Money, salary[1], Money(100.0));
        assert_approx_eq!(Money, salary[2], Money(100.0));
        assert_approx_eq!(Money, salary[3], Money(150.0));
        assert_approx_eq!(Money, salary[4], Money(225.0));
    }

    #[test]
    fn test_project_salary_switch_before_start() {
        let before = growth([0.0, 0.0, 0.0]);
        let after = growth([0.5, 0.5, 0.5]);
        let career = CareerPath {
            before: &before,
            after: &after,
            switch_offset: Some(-3),
        };
        let salary = project_salary(Money(100.0), 1, &career);
        assert_approx_eq!(Money, salary[1], Money(150.0));
    }

    #[test]
    fn test_project_salary_zero_horizon() {
        let growth = growth([0.1, 0.1, 0.1]);
        let career = CareerPath {
            before: &growth,
            after: &growth,
            switch_offset: None,
        };
        assert_eq!(
            project_salary(Money(1500.0), 0, &career),
            [Money(1500.0)]
        );
    }

    #[rstest]
    #[case(SalaryInput::Net { monthly: Money(1800.0) }, 1800.0)]
    #[case(
        SalaryInput::Gross { annual: Money(28000.0), pay_periods: 14.0, withholding_pct: 15.0 },
        1700.0
    )]
    #[case(
        SalaryInput::Gross { annual: Money(28000.0), pay_periods: 0.0, withholding_pct: 15.0 },
        0.0
    )]
    fn test_net_monthly(#[case] input: SalaryInput, #[case] expected: f64) {
        assert_approx_eq!(Money, input.net_monthly(), Money(expected));
    }

    #[test]
    fn test_salary_input_from_toml() {
        let input: SalaryInput =
            toml::from_str("mode = \"gross\"\nannual = \"28000\"\npay_periods = 14\nwithholding_pct = \"15,0\"")
                .unwrap();
        assert_eq!(
            input,
            SalaryInput::Gross {
                annual: Money(28000.0),
                pay_periods: 14.0,
                withholding_pct: 15.0
            }
        );
    }

    #[test]
    fn test_builtin_careers() {
        let careers = builtin_careers();
        assert_eq!(careers.len(), BUILTIN_CAREERS.len() + 1);
        assert_eq!(careers["odoo"], growth([0.1, 0.05, 0.03]));
        assert_eq!(careers["stay"], Career::LinearRaise(STAY));
    }

    #[test]
    fn test_project_salary_stay() {
        // A raise every 18 months: none in year 1, one in years 2 and 3, none in year 4
        let stay = Career::LinearRaise(STAY);
        let career = CareerPath {
            before: &stay,
            after: &stay,
            switch_offset: None,
        };
        let salary = project_salary(Money(25_000.0 / 12.0), 5, &career);
        for (actual, expected_annual) in
            salary
                .into_iter()
                .zip([25_000.0, 25_000.0, 27_000.0, 29_000.0, 29_000.0, 30_000.0])
        {
            assert_approx_eq!(Money, actual, Money(expected_annual / 12.0), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_linear_raise_above_cap() {
        assert_eq!(STAY.next_salary(Money(3000.0), 2), Money(3000.0));
    }

    #[test]
    fn test_project_salary_switch_from_stay() {
        let stay = Career::LinearRaise(STAY);
        let after = growth([0.5, 0.5, 0.5]);
        let career = CareerPath {
            before: &stay,
            after: &after,
            switch_offset: Some(2),
        };
        let salary = project_salary(Money(1200.0), 3, &career);
        assert_approx_eq!(Money, salary[1], Money(1200.0));
        assert_approx_eq!(Money, salary[2], Money(1200.0 + 2000.0 / 12.0));
        assert_approx_eq!(Money, salary[3], salary[2] * Dimensionless(1.5));
    }

    #[test]
    fn test_career_from_toml() {
        #[derive(Deserialize)]
        struct Careers {
            teaching: Career,
            civil_service: Career,
        }

        let careers: Careers = toml::from_str(
            "teaching = [0.03, 0.02, 0.015]\n\
            civil_service = { annual_raise = 1000, interval_months = 36, annual_cap = 40000 }",
        )
        .unwrap();
        assert_eq!(careers.teaching, growth([0.03, 0.02, 0.015]));
        assert_eq!(
            careers.civil_service,
            Career::LinearRaise(LinearRaise {
                annual_raise: Money(1000.0),
                interval_months: 36,
                annual_cap: Money(40_000.0),
            })
        );
    }
}
