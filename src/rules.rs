//! Threshold-based targeting rules and their uplift over the baseline rate

use crate::data::{Attribute, DataError, Dataset};
use crate::segments::{education_segments, EducationLevel};
use crate::stats::{acceptance_rate, mean, quantile, uplift};
use tracing::debug;

/// Percentile cut-offs used by the rules
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleThresholds {
    pub high_income: f64,
    pub high_spending: f64,
    pub premium_income: f64,
    /// Lower than `high_spending` by default
    pub premium_spending: f64,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            high_income: 0.80,
            high_spending: 0.75,
            premium_income: 0.80,
            premium_spending: 0.70,
        }
    }
}

/// Predicate selecting the customers a rule targets
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    AtLeast { attribute: Attribute, threshold: f64 },
    Category { attribute: Attribute, code: i64 },
    All(Vec<Criterion>),
}

impl Criterion {
    /// Per-customer selection flags
    pub fn mask(&self, dataset: &Dataset) -> Result<Vec<bool>, DataError> {
        match self {
            Criterion::AtLeast {
                attribute,
                threshold,
            } => Ok(dataset
                .column(*attribute)?
                .iter()
                .map(|&v| v >= *threshold)
                .collect()),
            Criterion::Category { attribute, code } => Ok(dataset
                .column(*attribute)?
                .iter()
                .map(|&v| v as i64 == *code)
                .collect()),
            Criterion::All(parts) => {
                let mut mask = vec![true; dataset.len()];
                for part in parts {
                    for (selected, hit) in mask.iter_mut().zip(part.mask(dataset)?) {
                        *selected &= hit;
                    }
                }
                Ok(mask)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    HighIncome,
    BestEducation,
    HighSpending,
    Premium,
}

impl RuleKind {
    pub fn title(self) -> &'static str {
        match self {
            RuleKind::HighIncome => "HIGH-INCOME PRIORITY TARGETING",
            RuleKind::BestEducation => "EDUCATION LEVEL TARGETING",
            RuleKind::HighSpending => "CREDIT CARD USAGE INDICATOR",
            RuleKind::Premium => "PREMIUM CUSTOMER SEGMENT (HIGHEST VALUE)",
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            RuleKind::HighIncome => "Prioritize marketing and offer competitive rates",
            RuleKind::BestEducation => "Develop specialized products for professionals",
            RuleKind::HighSpending => "Cross-sell to high credit card users",
            RuleKind::Premium => "VIP treatment and premium products",
        }
    }
}

/// A targeting rule evaluated against the dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub kind: RuleKind,
    pub criterion: Criterion,
    /// Customers satisfying the criterion
    pub count: usize,
    /// `None` when no customer matches
    pub conversion_rate: Option<f64>,
    /// `None` when the conversion or baseline rate is zero or undefined
    pub uplift: Option<f64>,
}

impl Rule {
    pub fn evaluate(
        kind: RuleKind,
        criterion: Criterion,
        dataset: &Dataset,
        baseline: Option<f64>,
    ) -> Result<Self, DataError> {
        let mask = criterion.mask(dataset)?;
        let (count, conversion_rate) = acceptance_rate(dataset.target(), |row| mask[row]);

        debug!(?kind, count, ?conversion_rate, "Rule evaluated");

        Ok(Rule {
            kind,
            criterion,
            count,
            conversion_rate,
            uplift: uplift(conversion_rate, baseline),
        })
    }

    /// Human-readable targeting criteria
    pub fn target_criteria(&self) -> String {
        match (&self.kind, &self.criterion) {
            (RuleKind::HighIncome, Criterion::AtLeast { threshold, .. }) => {
                format!("Income >= ${:.0}K", threshold)
            }
            (RuleKind::HighSpending, Criterion::AtLeast { threshold, .. }) => {
                format!("Monthly CC spending >= ${:.2}K", threshold)
            }
            (_, Criterion::Category { code, .. }) => {
                format!("{} customers", EducationLevel(*code).label())
            }
            (RuleKind::Premium, _) => "High income + High CC spending".to_string(),
            (_, Criterion::AtLeast { attribute, threshold }) => {
                format!("{} >= {:.2}", attribute, threshold)
            }
            (_, Criterion::All(_)) => "Combined criteria".to_string(),
        }
    }
}

fn percentile_of(dataset: &Dataset, attribute: Attribute, q: f64) -> Result<f64, DataError> {
    quantile(dataset.column(attribute)?, q).ok_or(DataError::Empty)
}

/// Derive the four targeting rules in report order
pub fn generate_rules(dataset: &Dataset, thresholds: &RuleThresholds) -> Result<Vec<Rule>, DataError> {
    let baseline = mean(dataset.target());
    if baseline == Some(0.0) {
        debug!("Baseline acceptance rate is zero, uplift undefined for every rule");
    }

    let high_income = Criterion::AtLeast {
        attribute: Attribute::Income,
        threshold: percentile_of(dataset, Attribute::Income, thresholds.high_income)?,
    };

    // First level with the highest rate wins ties
    let mut best: Option<(EducationLevel, f64)> = None;
    for (level, segment) in education_segments(dataset)? {
        if let Some(rate) = segment.acceptance_rate {
            if best.map_or(true, |(_, best_rate)| rate > best_rate) {
                best = Some((level, rate));
            }
        }
    }
    let (best_level, _) = best.ok_or(DataError::Empty)?;
    let best_education = Criterion::Category {
        attribute: Attribute::Education,
        code: best_level.0,
    };

    let high_spending = Criterion::AtLeast {
        attribute: Attribute::CcAvg,
        threshold: percentile_of(dataset, Attribute::CcAvg, thresholds.high_spending)?,
    };

    let premium = Criterion::All(vec![
        Criterion::AtLeast {
            attribute: Attribute::Income,
            threshold: percentile_of(dataset, Attribute::Income, thresholds.premium_income)?,
        },
        Criterion::AtLeast {
            attribute: Attribute::CcAvg,
            threshold: percentile_of(dataset, Attribute::CcAvg, thresholds.premium_spending)?,
        },
    ]);

    [
        (RuleKind::HighIncome, high_income),
        (RuleKind::BestEducation, best_education),
        (RuleKind::HighSpending, high_spending),
        (RuleKind::Premium, premium),
    ]
    .into_iter()
    .map(|(kind, criterion)| Rule::evaluate(kind, criterion, dataset, baseline))
    .collect()
}
