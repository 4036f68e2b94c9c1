//! Ranking of customer attributes by their correlation with loan acceptance

use crate::data::{Attribute, Dataset};
use crate::stats::pearson;
use tracing::debug;

/// Absolute correlation of one attribute with the acceptance target
#[derive(Debug, Clone, PartialEq)]
pub struct FactorScore {
    pub attribute: Attribute,
    /// |Pearson r|, always within [0, 1]
    pub score: f64,
}

impl FactorScore {
    /// Short business reading of the factor
    pub fn impact(&self) -> &'static str {
        match self.attribute {
            Attribute::Income => "Higher income = higher acceptance",
            Attribute::CcAvg => "High spenders more likely to accept",
            Attribute::CdAccount => "CD holders show more interest",
            Attribute::Mortgage => "Existing borrowers more receptive",
            Attribute::Education => "Higher education = higher rates",
            _ => "Positive correlation with acceptance",
        }
    }
}

/// Score every attribute except the identifier against the target and sort
/// by descending score.
///
/// Attributes with an undefined correlation (constant columns) are left out.
/// Equal scores keep source column order.
pub fn rank_factors(dataset: &Dataset) -> Vec<FactorScore> {
    let target = dataset.target();

    let mut scores: Vec<FactorScore> = dataset
        .iter_columns()
        .filter(|(attribute, _)| *attribute != Attribute::Id)
        .filter_map(|(attribute, values)| match pearson(values, target) {
            Some(r) => Some(FactorScore {
                attribute,
                score: r.abs(),
            }),
            None => {
                debug!(%attribute, "Correlation undefined, excluded from ranking");
                None
            }
        })
        .collect();

    // sort_by is stable
    scores.sort_by(|a, b| b.score.total_cmp(&a.score));
    scores
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_dataset() -> Dataset {
        Dataset::from_columns(vec![
            (Attribute::Id, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
            (Attribute::Income, vec![30.0, 45.0, 60.0, 150.0, 170.0, 40.0]),
            (Attribute::Online, vec![1.0, 1.0, 1.0, 1.0, 1.0, 1.0]),
            (Attribute::CcAvg, vec![0.5, 1.0, 0.8, 4.0, 2.5, 1.5]),
            (Attribute::Education, vec![1.0, 2.0, 1.0, 3.0, 3.0, 2.0]),
            (Attribute::PersonalLoan, vec![0.0, 0.0, 0.0, 1.0, 1.0, 0.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_scores_bounded_and_sorted() {
        let ranking = rank_factors(&create_test_dataset());

        assert!(!ranking.is_empty());
        for factor in &ranking {
            assert!((0.0..=1.0).contains(&factor.score));
        }
        for pair in ranking.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_identifier_and_constant_columns_excluded() {
        let ranking = rank_factors(&create_test_dataset());
        let attributes: Vec<Attribute> = ranking.iter().map(|f| f.attribute).collect();

        assert!(!attributes.contains(&Attribute::Id));
        assert!(!attributes.contains(&Attribute::Online));
        assert!(!attributes.contains(&Attribute::PersonalLoan));
        assert_eq!(attributes.len(), 3);
    }

    #[test]
    fn test_ties_keep_column_order() {
        let dataset = Dataset::from_columns(vec![
            (Attribute::Mortgage, vec![0.0, 1.0, 0.0, 1.0]),
            (Attribute::Income, vec![10.0, 20.0, 30.0, 40.0]),
            (Attribute::CdAccount, vec![0.0, 1.0, 0.0, 1.0]),
            (Attribute::CcAvg, vec![1.0, 1.0, 2.0, 2.0]),
            (Attribute::Education, vec![1.0, 1.0, 1.0, 2.0]),
            (Attribute::PersonalLoan, vec![0.0, 1.0, 0.0, 1.0]),
        ])
        .unwrap();

        let ranking = rank_factors(&dataset);
        assert_eq!(ranking[0].attribute, Attribute::Mortgage);
        assert_eq!(ranking[1].attribute, Attribute::CdAccount);
        assert!((ranking[0].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_impact_descriptions() {
        let factor = FactorScore {
            attribute: Attribute::CdAccount,
            score: 0.3,
        };
        assert_eq!(factor.impact(), "CD holders show more interest");

        let factor = FactorScore {
            attribute: Attribute::Family,
            score: 0.1,
        };
        assert_eq!(factor.impact(), "Positive correlation with acceptance");
    }
}
