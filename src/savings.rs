//! Accumulation of savings over the projection horizon.
use crate::curve::Curve;
use crate::units::{Dimensionless, Money};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// The savings rate (in percent) used when the rate curve has no nodes
pub const DEFAULT_SAVINGS_RATE_PCT: f64 = 40.0;

/// The monthly expense used when the expense curve has no nodes
pub const DEFAULT_MONTHLY_EXPENSE: f64 = 800.0;

/// The highest monthly expense an expense curve can hold
pub const MAX_MONTHLY_EXPENSE: f64 = 3000.0;

/// Months in a year
const MONTHS_PER_YEAR: f64 = 12.0;

/// How much of the salary is saved each year.
///
/// Either a share of the salary is saved (rate mode) or everything above a fixed monthly expense is
/// saved (expense mode). Exactly one is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SavingsPolicy {
    /// Save a percentage of the net salary, given by a curve of percentages
    Rate {
        /// Savings rate in percent for each year
        #[serde(default)]
        curve: Curve,
    },
    /// Save everything above a monthly expense, given by a curve of monthly amounts
    Expense {
        /// Monthly expense for each year
        #[serde(default)]
        curve: Curve,
    },
}

impl Default for SavingsPolicy {
    fn default() -> Self {
        Self::Rate {
            curve: Curve::default(),
        }
    }
}

impl SavingsPolicy {
    /// The curve for the active mode
    pub fn curve(&self) -> &Curve {
        match self {
            Self::Rate { curve } | Self::Expense { curve } => curve,
        }
    }

    /// Mutable access to the curve for the active mode
    pub fn curve_mut(&mut self) -> &mut Curve {
        match self {
            Self::Rate { curve } | Self::Expense { curve } => curve,
        }
    }

    /// The value used for years when the curve has no nodes
    pub fn fallback(&self) -> f64 {
        match self {
            Self::Rate { .. } => DEFAULT_SAVINGS_RATE_PCT,
            Self::Expense { .. } => DEFAULT_MONTHLY_EXPENSE,
        }
    }

    /// The values the active curve may take
    pub fn value_range(&self) -> RangeInclusive<f64> {
        match self {
            Self::Rate { .. } => 0.0..=100.0,
            Self::Expense { .. } => 0.0..=MAX_MONTHLY_EXPENSE,
        }
    }

    /// Make sure the active curve ends at `horizon`
    pub fn fit_to_horizon(&mut self, horizon: u32) {
        let fallback = self.fallback();
        self.curve_mut().fit_to_horizon(horizon, fallback);
    }

    /// Evaluate the active curve for every year of the horizon
    pub fn contributions(&self, horizon: u32) -> ContributionSeries {
        let values = self.curve().evaluate(horizon, self.fallback());
        match self {
            Self::Rate { .. } => ContributionSeries::Rates(
                values.into_iter().map(Dimensionless::from_percent).collect(),
            ),
            Self::Expense { .. } => {
                ContributionSeries::Expenses(values.into_iter().map(Money).collect())
            }
        }
    }
}

/// The evaluated savings policy, one value per year
#[derive(Debug, Clone, PartialEq)]
pub enum ContributionSeries {
    /// The share of the salary saved each year
    Rates(Vec<Dimensionless>),
    /// The monthly expense for each year
    Expenses(Vec<Money>),
}

impl ContributionSeries {
    /// The amount saved each month of year offset `year` given that year's net monthly salary.
    ///
    /// In expense mode this never goes below zero.
    pub fn monthly_savings(&self, year: usize, salary: Money) -> Money {
        match self {
            Self::Rates(rates) => salary * rates[year],
            Self::Expenses(expenses) => (salary - expenses[year]).max(Money(0.0)),
        }
    }

    /// The amount saved over the whole of year offset `year`
    pub fn yearly_savings(&self, year: usize, salary: Money) -> Money {
        self.monthly_savings(year, salary) * Dimensionless(MONTHS_PER_YEAR)
    }
}

/// Project the savings balance at the end of each year.
///
/// Every year, including year 0, the balance first earns a year of returns and then the year's
/// contribution is added. Returned balances are rounded, but the running balance is not.
///
/// # Arguments
///
/// * `initial` - The savings at the start of the projection
/// * `return_rate` - Yearly return on savings
/// * `salary` - Unrounded net monthly salary for each year
/// * `contributions` - The evaluated savings policy, with the same length as `salary`
pub fn project_savings(
    initial: Money,
    return_rate: Dimensionless,
    salary: &[Money],
    contributions: &ContributionSeries,
) -> Vec<Money> {
    let growth = Dimensionless(1.0) + return_rate;
    let mut stash = initial;
    salary
        .iter()
        .enumerate()
        .map(|(year, &salary)| {
            stash = stash * growth + contributions.yearly_savings(year, salary);
            stash.round()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::CurveNode;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[test]
    fn test_project_savings_rate_mode() {
        let contributions = ContributionSeries::Rates(vec![Dimensionless(0.5); 3]);
        let salary = [Money(1000.0); 3];
        let savings = project_savings(Money(1000.0), Dimensionless(0.1), &salary, &contributions);

        // Year 0 gets a year of growth before the first contribution
        assert_eq!(savings, [Money(7100.0), Money(13810.0), Money(21191.0)]);
    }

    #[test]
    fn test_project_savings_keeps_unrounded_stash() {
        let contributions = ContributionSeries::Rates(vec![Dimensionless(0.0); 2]);
        let salary = [Money(0.0); 2];
        let savings = project_savings(Money(1.4), Dimensionless(0.25), &salary, &contributions);

        // 1.75 rounds up, then 2.1875 rounds down
        assert_eq!(savings, [Money(2.0), Money(2.0)]);
    }

    #[test]
    fn test_project_savings_expense_mode_floored() {
        let contributions = ContributionSeries::Expenses(vec![Money(800.0), Money(1500.0)]);
        let salary = [Money(1000.0); 2];
        let savings = project_savings(Money(0.0), Dimensionless(0.0), &salary, &contributions);
        assert_eq!(savings, [Money(2400.0), Money(2400.0)]);
    }

    #[test]
    fn test_project_savings_negative_rate_not_floored() {
        let contributions = ContributionSeries::Rates(vec![Dimensionless(-0.1)]);
        let savings = project_savings(
            Money(5000.0),
            Dimensionless(0.0),
            &[Money(1000.0)],
            &contributions,
        );
        assert_eq!(savings, [Money(3800.0)]);
    }

    #[rstest]
    #[case(SavingsPolicy::Rate { curve: Curve::default() }, Money(800.0))]
    #[case(SavingsPolicy::Expense { curve: Curve::default() }, Money(1200.0))]
    fn test_default_curves(#[case] policy: SavingsPolicy, #[case] expected: Money) {
        let contributions = policy.contributions(3);
        for year in 0..=3 {
            assert_approx_eq!(
                Money,
                contributions.monthly_savings(year, Money(2000.0)),
                expected
            );
        }
    }

    #[test]
    fn test_contributions_interpolated() {
        let policy = SavingsPolicy::Rate {
            curve: vec![
                CurveNode {
                    year: 0,
                    value: 10.0,
                },
                CurveNode {
                    year: 4,
                    value: 30.0,
                },
            ]
            .into(),
        };
        let ContributionSeries::Rates(rates) = policy.contributions(4) else {
            panic!("Expected rates");
        };
        assert_approx_eq!(Dimensionless, rates[2], Dimensionless(0.2));
    }

    #[test]
    fn test_fit_to_horizon_uses_mode_default() {
        let mut policy = SavingsPolicy::Expense {
            curve: Curve::default(),
        };
        policy.fit_to_horizon(10);
        assert_eq!(policy.curve(), &Curve::flat(10, DEFAULT_MONTHLY_EXPENSE));
    }

    #[test]
    fn test_savings_policy_from_toml() {
        let policy: SavingsPolicy = toml::from_str(
            "mode = \"expense\"\ncurve = [{year = 0, value = 900}, {year = 5, value = \"1000\"}]",
        )
        .unwrap();
        assert_eq!(
            policy,
            SavingsPolicy::Expense {
                curve: Curve::from(vec![
                    CurveNode {
                        year: 0,
                        value: 900.0
                    },
                    CurveNode {
                        year: 5,
                        value: 1000.0
                    },
                ])
            }
        );

        let policy: SavingsPolicy = toml::from_str("mode = \"rate\"").unwrap();
        assert_eq!(policy, SavingsPolicy::default());
    }
}
