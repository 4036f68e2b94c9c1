//! LoanLens: descriptive loan-acceptance report for a bank customer table
//!
//! Loads the personal-loan dataset, ranks attributes by correlation with
//! acceptance, computes segment acceptance rates and derives threshold-based
//! targeting rules with their uplift over the baseline.

pub mod cli;
pub mod data;
pub mod factors;
pub mod report;
pub mod rules;
pub mod segments;
pub mod stats;

// Re-export public items for easier access
pub use cli::Args;
pub use data::{load_dataset, Attribute, DataError, Dataset};
pub use factors::{rank_factors, FactorScore};
pub use report::{build_report, Report};
pub use rules::{generate_rules, Rule, RuleKind, RuleThresholds};
pub use segments::{analyze_segments, RiskLevel, Segment};

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
