//! Report assembly and plain-text rendering

use std::fmt;

use chrono::NaiveDate;

use crate::data::{Attribute, DataError, Dataset};
use crate::factors::{rank_factors, FactorScore};
use crate::rules::{generate_rules, Rule, RuleThresholds};
use crate::segments::{analyze_segments, Segment, SegmentReport};
use crate::stats::mean;

const BANNER_WIDTH: usize = 60;
const SECTION_WIDTH: usize = 50;
const RULE_WIDTH: usize = 40;

/// Dataset-wide figures printed at the top of the report
#[derive(Debug, Clone, PartialEq)]
pub struct Overview {
    pub total_customers: usize,
    /// Overall acceptance rate, the baseline for every uplift
    pub baseline_rate: Option<f64>,
    pub average_income: Option<f64>,
    pub average_cc_spending: Option<f64>,
}

/// Everything computed for one run
#[derive(Debug, Clone)]
pub struct Report {
    pub generated_on: NaiveDate,
    pub overview: Overview,
    /// Full ranking; only the first `top_factors` are printed
    pub factors: Vec<FactorScore>,
    pub top_factors: usize,
    pub segments: SegmentReport,
    pub rules: Vec<Rule>,
}

/// Run every analysis stage over the dataset.
///
/// The output depends only on the arguments; `generated_on` is the date
/// printed in the header.
pub fn build_report(
    dataset: &Dataset,
    thresholds: &RuleThresholds,
    top_factors: usize,
    generated_on: NaiveDate,
) -> Result<Report, DataError> {
    if dataset.is_empty() {
        return Err(DataError::Empty);
    }

    let overview = Overview {
        total_customers: dataset.len(),
        baseline_rate: mean(dataset.target()),
        average_income: mean(dataset.column(Attribute::Income)?),
        average_cc_spending: mean(dataset.column(Attribute::CcAvg)?),
    };

    Ok(Report {
        generated_on,
        overview,
        factors: rank_factors(dataset),
        top_factors,
        segments: analyze_segments(dataset)?,
        rules: generate_rules(dataset, thresholds)?,
    })
}

/// Rate as a percentage with one decimal, or `N/A`
pub fn format_rate(rate: Option<f64>) -> String {
    match rate {
        Some(rate) => format!("{:.1}%", rate * 100.0),
        None => "N/A".to_string(),
    }
}

pub fn format_uplift(uplift: Option<f64>) -> String {
    match uplift {
        Some(uplift) => format!("{:.1}x", uplift),
        None => "N/A".to_string(),
    }
}

/// Integer with comma thousands separators
pub fn format_count(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn format_money(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(value) => format!("${:.*}K", decimals, value),
        None => "N/A".to_string(),
    }
}

impl Report {
    fn write_header(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let banner = "=".repeat(BANNER_WIDTH);
        writeln!(f, "{}", banner)?;
        writeln!(f, "QUANTLAKE LENDING - LOAN RISK ANALYSIS REPORT")?;
        writeln!(f, "{}", banner)?;
        writeln!(
            f,
            "Dataset: Bank Personal Loan Data ({} customers)",
            format_count(self.overview.total_customers)
        )?;
        writeln!(f, "Analysis Date: {}", self.generated_on.format("%B %Y"))?;
        writeln!(f, "{}", banner)?;

        writeln!(f)?;
        writeln!(
            f,
            "OVERALL LOAN ACCEPTANCE RATE: {}",
            format_rate(self.overview.baseline_rate)
        )?;
        writeln!(
            f,
            "TOTAL CUSTOMERS ANALYZED: {}",
            format_count(self.overview.total_customers)
        )?;
        writeln!(
            f,
            "AVERAGE CUSTOMER INCOME: {}",
            format_money(self.overview.average_income, 0)
        )?;
        writeln!(
            f,
            "AVERAGE MONTHLY CC SPENDING: {}",
            format_money(self.overview.average_cc_spending, 2)
        )?;
        writeln!(f)?;
        writeln!(f, "{}", banner)
    }

    fn write_factors(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "1. TOP FACTORS AFFECTING LOAN ACCEPTANCE:")?;
        writeln!(f, "{}", "-".repeat(SECTION_WIDTH))?;
        writeln!(f, "{:<5} {:<20} {:<12} {}", "Rank", "Factor", "Correlation", "Impact")?;
        writeln!(f, "{}", "-".repeat(BANNER_WIDTH))?;

        for (i, factor) in self.factors.iter().take(self.top_factors).enumerate() {
            writeln!(
                f,
                "{:<5} {:<20} {:<12.3} {}",
                i + 1,
                factor.attribute.column_name(),
                factor.score,
                factor.impact()
            )?;
        }
        Ok(())
    }

    fn write_segment_table<'a>(
        f: &mut fmt::Formatter<'_>,
        title: &str,
        first_column: &str,
        segments: impl Iterator<Item = &'a Segment>,
    ) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "{}", title)?;
        writeln!(
            f,
            "{:<20} {:<15} {:<12} {}",
            first_column, "Acceptance Rate", "Risk Level", "Count"
        )?;
        writeln!(f, "{}", "-".repeat(BANNER_WIDTH))?;

        for segment in segments {
            let risk = segment
                .risk_level()
                .map_or("N/A", |level| level.label());
            writeln!(
                f,
                "{:<20} {:<15} {:<12} {}",
                segment.label,
                format_rate(segment.acceptance_rate),
                risk,
                format_count(segment.count)
            )?;
        }
        Ok(())
    }

    fn write_segments(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f)?;
        writeln!(f, "2. HIGH-RISK CUSTOMER SEGMENTS:")?;
        writeln!(f, "{}", "-".repeat(SECTION_WIDTH))?;

        Self::write_segment_table(
            f,
            "INCOME-BASED SEGMENTS:",
            "Segment",
            self.segments.income.iter(),
        )?;
        Self::write_segment_table(
            f,
            "EDUCATION-BASED SEGMENTS:",
            "Education Level",
            self.segments.education.iter().map(|(_, segment)| segment),
        )?;
        Self::write_segment_table(
            f,
            "CREDIT CARD SPENDING SEGMENTS:",
            "Spending Level",
            self.segments.spending.iter(),
        )
    }

    fn write_rules(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f)?;
        writeln!(f, "3. RISK RULES FOR QUANTLAKE LENDING:")?;
        writeln!(f, "{}", "-".repeat(SECTION_WIDTH))?;

        for (i, rule) in self.rules.iter().enumerate() {
            writeln!(f)?;
            writeln!(f, "RULE {} - {}", i + 1, rule.kind.title())?;
            writeln!(f, "{}", "-".repeat(RULE_WIDTH))?;
            writeln!(f, "Target Criteria: {}", rule.target_criteria())?;
            writeln!(f, "Expected Conversion: {}", format_rate(rule.conversion_rate))?;
            writeln!(
                f,
                "vs Overall Average: {}",
                format_rate(self.overview.baseline_rate)
            )?;
            writeln!(f, "Affected Customers: {}", format_count(rule.count))?;
            writeln!(f, "Uplift Factor: {}", format_uplift(rule.uplift))?;
            writeln!(f, "Recommendation: {}", rule.kind.recommendation())?;
        }
        Ok(())
    }

    fn write_recommendations(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const PLAN: [(&str, [&str; 4]); 3] = [
            (
                "IMMEDIATE ACTIONS (Next 30 Days):",
                [
                    "Segment customer database by income and spending",
                    "Create targeted campaigns for high-income customers",
                    "Implement fast-track for premium segment",
                    "Train sales team on risk indicators",
                ],
            ),
            (
                "MEDIUM-TERM STRATEGY (3-6 Months):",
                [
                    "Launch education-specific loan products",
                    "Develop credit card spending analysis tools",
                    "Create VIP customer experience",
                    "Partner with professional organizations",
                ],
            ),
            (
                "LONG-TERM GOALS (6-12 Months):",
                [
                    "Build predictive models using top factors",
                    "Automate customer segmentation",
                    "Establish premium loyalty programs",
                    "Expand products for high-value segments",
                ],
            ),
        ];

        writeln!(f)?;
        writeln!(f)?;
        writeln!(f, "4. IMPLEMENTATION RECOMMENDATIONS:")?;
        writeln!(f, "{}", "-".repeat(SECTION_WIDTH))?;

        for (heading, items) in PLAN {
            writeln!(f)?;
            writeln!(f, "{}", heading)?;
            for item in items {
                writeln!(f, "• {}", item)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "KEY SUCCESS METRICS:")?;
        writeln!(
            f,
            "• Current baseline acceptance rate: {}",
            format_rate(self.overview.baseline_rate)
        )?;
        writeln!(f, "• Target premium segment rate: 40%+ (4x improvement)")?;
        writeln!(f, "• Expected revenue uplift: 200-300% for targeted segments")?;
        writeln!(f, "• Risk reduction: Focus on segments with 15%+ acceptance")
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_header(f)?;
        self.write_factors(f)?;
        self.write_segments(f)?;
        self.write_rules(f)?;
        self.write_recommendations(f)?;

        let banner = "=".repeat(BANNER_WIDTH);
        writeln!(f)?;
        writeln!(f, "{}", banner)?;
        writeln!(f, "ANALYSIS COMPLETE - REPORT READY FOR QUANTLAKE LENDING")?;
        writeln!(f, "{}", banner)
    }
}
