//! Segment-wise acceptance rates and risk classification

use std::collections::BTreeMap;
use std::fmt;

use crate::data::{Attribute, DataError, Dataset};
use crate::stats::{acceptance_rate, quantiles};

/// Acceptance rate below which a segment is high risk
pub const HIGH_RISK_BELOW: f64 = 0.05;
/// Acceptance rate below which a segment is medium risk
pub const MEDIUM_RISK_BELOW: f64 = 0.15;

pub const INCOME_LABELS: [&str; 4] = [
    "Low Income",
    "Medium-Low Income",
    "Medium-High Income",
    "High Income",
];

pub const SPENDING_LABELS: [&str; 4] = ["Low Spender", "Medium-Low", "Medium-High", "High Spender"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    /// Fixed threshold policy: < 5% high, < 15% medium, otherwise low
    pub fn from_rate(rate: f64) -> Self {
        if rate < HIGH_RISK_BELOW {
            RiskLevel::High
        } else if rate < MEDIUM_RISK_BELOW {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::High => "HIGH RISK",
            RiskLevel::Medium => "MEDIUM RISK",
            RiskLevel::Low => "LOW RISK",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Education ordinal as coded in the source data
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct EducationLevel(pub i64);

impl EducationLevel {
    pub fn label(self) -> String {
        match self.0 {
            1 => "Undergraduate".to_string(),
            2 => "Graduate".to_string(),
            3 => "Advanced/Professional".to_string(),
            other => format!("Level {}", other),
        }
    }
}

/// One bucket of customers with its observed acceptance
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub label: String,
    pub count: usize,
    /// `None` for an empty bucket
    pub acceptance_rate: Option<f64>,
}

impl Segment {
    pub fn risk_level(&self) -> Option<RiskLevel> {
        self.acceptance_rate.map(RiskLevel::from_rate)
    }
}

/// The three segmentations shown in the report
#[derive(Debug, Clone)]
pub struct SegmentReport {
    pub income: Vec<Segment>,
    pub education: Vec<(EducationLevel, Segment)>,
    pub spending: Vec<Segment>,
}

pub fn analyze_segments(dataset: &Dataset) -> Result<SegmentReport, DataError> {
    Ok(SegmentReport {
        income: quartile_segments(dataset, Attribute::Income, &INCOME_LABELS)?,
        education: education_segments(dataset)?,
        spending: quartile_segments(dataset, Attribute::CcAvg, &SPENDING_LABELS)?,
    })
}

/// Cut points at the 0th, 25th, 50th, 75th and 100th percentiles
pub fn quartile_edges(dataset: &Dataset, attribute: Attribute) -> Result<[f64; 5], DataError> {
    let values = dataset.column(attribute)?;
    let edges = quantiles(values, &[0.0, 0.25, 0.5, 0.75, 1.0]).ok_or(DataError::Empty)?;
    Ok([edges[0], edges[1], edges[2], edges[3], edges[4]])
}

/// Bucket index for a value: the first quartile whose upper edge covers it
fn quartile_index(value: f64, edges: &[f64; 5]) -> usize {
    edges[1..4].iter().position(|&edge| value <= edge).unwrap_or(3)
}

/// Split customers into four quantile buckets of `attribute`, labelled low to high.
///
/// Buckets are always four; when cut points coincide a bucket may be empty
/// and carries no rate.
pub fn quartile_segments(
    dataset: &Dataset,
    attribute: Attribute,
    labels: &[&str; 4],
) -> Result<Vec<Segment>, DataError> {
    let edges = quartile_edges(dataset, attribute)?;
    let buckets: Vec<usize> = dataset
        .column(attribute)?
        .iter()
        .map(|&v| quartile_index(v, &edges))
        .collect();

    let target = dataset.target();
    Ok(labels
        .iter()
        .enumerate()
        .map(|(bucket, label)| {
            let (count, rate) = acceptance_rate(target, |row| buckets[row] == bucket);
            Segment {
                label: label.to_string(),
                count,
                acceptance_rate: rate,
            }
        })
        .collect())
}

/// One segment per observed education level, in ascending level order
pub fn education_segments(dataset: &Dataset) -> Result<Vec<(EducationLevel, Segment)>, DataError> {
    let education = dataset.column(Attribute::Education)?;
    let target = dataset.target();

    // level -> (count, accepted)
    let mut groups: BTreeMap<i64, (usize, f64)> = BTreeMap::new();
    for (&level, &accepted) in education.iter().zip(target.iter()) {
        let entry = groups.entry(level as i64).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += accepted;
    }

    Ok(groups
        .into_iter()
        .map(|(level, (count, accepted))| {
            let level = EducationLevel(level);
            let segment = Segment {
                label: level.label(),
                count,
                acceptance_rate: Some(accepted / count as f64),
            };
            (level, segment)
        })
        .collect())
}
