//! Data loading and schema validation for the loan applicant table
//!
//! The primary source is a CSV file read with Polars. When it is absent the
//! loader falls back to the spreadsheet export of the same table.

use std::fmt;
use std::path::Path;

use anyhow::Context;
use calamine::{open_workbook_auto, Reader};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use polars::prelude::{DataFrame, DataType, LazyCsvReader, LazyFileListReader};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Columns of the bank personal-loan table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attribute {
    Id,
    Age,
    Experience,
    Income,
    ZipCode,
    Family,
    CcAvg,
    Education,
    Mortgage,
    PersonalLoan,
    SecuritiesAccount,
    CdAccount,
    Online,
    CreditCard,
}

/// Binary loan-acceptance target
pub const TARGET: Attribute = Attribute::PersonalLoan;

impl Attribute {
    pub const ALL: [Attribute; 14] = [
        Attribute::Id,
        Attribute::Age,
        Attribute::Experience,
        Attribute::Income,
        Attribute::ZipCode,
        Attribute::Family,
        Attribute::CcAvg,
        Attribute::Education,
        Attribute::Mortgage,
        Attribute::PersonalLoan,
        Attribute::SecuritiesAccount,
        Attribute::CdAccount,
        Attribute::Online,
        Attribute::CreditCard,
    ];

    /// Header name as it appears in the source file
    pub fn column_name(self) -> &'static str {
        match self {
            Attribute::Id => "ID",
            Attribute::Age => "Age",
            Attribute::Experience => "Experience",
            Attribute::Income => "Income",
            Attribute::ZipCode => "ZIP Code",
            Attribute::Family => "Family",
            Attribute::CcAvg => "CCAvg",
            Attribute::Education => "Education",
            Attribute::Mortgage => "Mortgage",
            Attribute::PersonalLoan => "Personal Loan",
            Attribute::SecuritiesAccount => "Securities Account",
            Attribute::CdAccount => "CD Account",
            Attribute::Online => "Online",
            Attribute::CreditCard => "CreditCard",
        }
    }

    pub fn from_column_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|a| a.column_name() == name)
    }

    /// Columns every downstream computation relies on
    pub fn is_required(self) -> bool {
        matches!(
            self,
            Attribute::Income | Attribute::CcAvg | Attribute::Education | Attribute::PersonalLoan
        )
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Missing required column: {0}")]
    MissingColumn(Attribute),

    #[error("Column {0} appears more than once")]
    DuplicateColumn(Attribute),

    #[error("Column {attribute} has {found} values, expected {expected}")]
    LengthMismatch {
        attribute: Attribute,
        expected: usize,
        found: usize,
    },

    #[error("Invalid value in column {attribute} at record {row}: {reason}")]
    InvalidValue {
        attribute: Attribute,
        row: usize,
        reason: String,
    },

    #[error("Dataset contains no customers")]
    Empty,

    #[error("No input available: {primary} not found and fallback {fallback} not found")]
    SourceUnavailable { primary: String, fallback: String },
}

/// Loaded customer table: one row per customer, read-only after construction
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Feature columns in source order (target excluded)
    attributes: Vec<Attribute>,
    /// Feature matrix (n_customers, attributes.len())
    features: Array2<f64>,
    /// Loan acceptance flag per customer
    target: Array1<f64>,
}

impl Dataset {
    /// Build a dataset from named columns, validating the schema
    pub fn from_columns(columns: Vec<(Attribute, Vec<f64>)>) -> Result<Self, DataError> {
        for attribute in Attribute::ALL.into_iter().filter(|a| a.is_required()) {
            if !columns.iter().any(|(a, _)| *a == attribute) {
                return Err(DataError::MissingColumn(attribute));
            }
        }

        let n_rows = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        if n_rows == 0 {
            return Err(DataError::Empty);
        }

        let mut attributes = Vec::with_capacity(columns.len());
        let mut target = None;
        let mut raw = Vec::new();

        for (attribute, values) in columns {
            if values.len() != n_rows {
                return Err(DataError::LengthMismatch {
                    attribute,
                    expected: n_rows,
                    found: values.len(),
                });
            }
            if attributes.contains(&attribute) || (attribute == TARGET && target.is_some()) {
                return Err(DataError::DuplicateColumn(attribute));
            }
            validate_column(attribute, &values)?;

            if attribute == TARGET {
                target = Some(Array1::from_vec(values));
            } else {
                attributes.push(attribute);
                raw.push(values);
            }
        }

        let target = target.ok_or(DataError::MissingColumn(TARGET))?;

        // Column-major input, row-major matrix
        let mut features = Array2::zeros((n_rows, attributes.len()));
        for (j, values) in raw.into_iter().enumerate() {
            features.column_mut(j).assign(&Array1::from_vec(values));
        }

        Ok(Dataset {
            attributes,
            features,
            target,
        })
    }

    /// Number of customers
    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    /// Feature attributes in source column order
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn target(&self) -> ArrayView1<'_, f64> {
        self.target.view()
    }

    /// Values of a single attribute, the target included
    pub fn column(&self, attribute: Attribute) -> Result<ArrayView1<'_, f64>, DataError> {
        if attribute == TARGET {
            return Ok(self.target.view());
        }
        self.attributes
            .iter()
            .position(|a| *a == attribute)
            .map(|j| self.features.column(j))
            .ok_or(DataError::MissingColumn(attribute))
    }

    /// Feature columns paired with their attribute, in source order
    pub fn iter_columns(&self) -> impl Iterator<Item = (Attribute, ArrayView1<'_, f64>)> {
        self.attributes
            .iter()
            .copied()
            .zip(self.features.axis_iter(Axis(1)))
    }
}

fn validate_column(attribute: Attribute, values: &[f64]) -> Result<(), DataError> {
    let invalid = |row: usize, reason: &str| DataError::InvalidValue {
        attribute,
        row,
        reason: reason.to_string(),
    };

    for (row, &value) in values.iter().enumerate() {
        if !value.is_finite() {
            return Err(invalid(row, "not a finite number"));
        }
        match attribute {
            Attribute::PersonalLoan if value != 0.0 && value != 1.0 => {
                return Err(invalid(row, "target must be 0 or 1"));
            }
            Attribute::Income | Attribute::CcAvg if value < 0.0 => {
                return Err(invalid(row, "must be non-negative"));
            }
            Attribute::Education if value.fract() != 0.0 => {
                return Err(invalid(row, "education level must be an integer"));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Load the dataset from the CSV at `primary`, falling back to the
/// spreadsheet at `fallback` when the CSV does not exist.
///
/// A primary file that exists but fails to parse is reported as-is; the
/// fallback only covers a missing file.
pub fn load_dataset(primary: &Path, fallback: &Path, sheet: &str) -> crate::Result<Dataset> {
    if primary.exists() {
        info!(path = %primary.display(), "Loading CSV dataset");
        return load_csv(primary).with_context(|| format!("Failed to load {}", primary.display()));
    }

    warn!(
        path = %primary.display(),
        fallback = %fallback.display(),
        "CSV dataset not found, trying spreadsheet fallback"
    );

    if fallback.exists() {
        return load_spreadsheet(fallback, sheet)
            .with_context(|| format!("Failed to load sheet '{}' of {}", sheet, fallback.display()));
    }

    Err(DataError::SourceUnavailable {
        primary: primary.display().to_string(),
        fallback: fallback.display().to_string(),
    }
    .into())
}

/// Load the dataset from a CSV file with a header row
pub fn load_csv(path: &Path) -> crate::Result<Dataset> {
    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        // Infer dtypes from every row, not just the head
        .with_infer_schema_length(None)
        .finish()?
        .collect()?;

    debug!(rows = df.height(), columns = df.width(), "CSV parsed");
    dataset_from_frame(&df)
}

/// Convert a Polars frame into a validated dataset
fn dataset_from_frame(df: &DataFrame) -> crate::Result<Dataset> {
    let mut columns = Vec::new();

    for name in df.get_column_names() {
        let Some(attribute) = Attribute::from_column_name(name) else {
            warn!(column = name, "Ignoring unrecognised column");
            continue;
        };

        // Non-numeric cells become nulls under a non-strict cast
        let series = df.column(name)?.cast(&DataType::Float64)?;
        let values = series
            .f64()?
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                value.ok_or_else(|| DataError::InvalidValue {
                    attribute,
                    row,
                    reason: "missing or non-numeric".to_string(),
                })
            })
            .collect::<Result<Vec<f64>, DataError>>()?;

        columns.push((attribute, values));
    }

    Ok(Dataset::from_columns(columns)?)
}

/// Load the dataset from a worksheet whose first row holds the headers
pub fn load_spreadsheet(path: &Path, sheet: &str) -> crate::Result<Dataset> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook.worksheet_range(sheet)?;
    let mut rows = range.rows();

    let header = rows.next().ok_or(DataError::Empty)?;
    let mut columns: Vec<(usize, Attribute, Vec<f64>)> = Vec::new();
    for (idx, cell) in header.iter().enumerate() {
        let name = cell.to_string();
        match Attribute::from_column_name(&name) {
            Some(attribute) => columns.push((idx, attribute, Vec::new())),
            None if name.trim().is_empty() => {}
            None => warn!(column = %name, "Ignoring unrecognised column"),
        }
    }

    let mut n_rows = 0;
    for cells in rows {
        if cells.iter().all(|c| matches!(c, calamine::Data::Empty)) {
            continue;
        }
        for (idx, attribute, values) in columns.iter_mut() {
            let value = cells
                .get(*idx)
                .and_then(cell_value)
                .ok_or_else(|| DataError::InvalidValue {
                    attribute: *attribute,
                    row: n_rows,
                    reason: "missing or non-numeric".to_string(),
                })?;
            values.push(value);
        }
        n_rows += 1;
    }

    debug!(rows = n_rows, sheet, "Worksheet parsed");

    let columns = columns
        .into_iter()
        .map(|(_, attribute, values)| (attribute, values))
        .collect();
    Ok(Dataset::from_columns(columns)?)
}

fn cell_value(cell: &calamine::Data) -> Option<f64> {
    match cell {
        calamine::Data::Float(v) => Some(*v),
        calamine::Data::Int(v) => Some(*v as f64),
        calamine::Data::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        calamine::Data::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "ID,Age,Income,CCAvg,Education,Mortgage,Personal Loan,CD Account").unwrap();
        writeln!(file, "1,25,49,1.6,1,0,0,0").unwrap();
        writeln!(file, "2,45,34,1.5,1,0,0,0").unwrap();
        writeln!(file, "3,39,180,2.7,2,155,1,1").unwrap();
        writeln!(file, "4,35,100,1.0,3,0,0,0").unwrap();
        file
    }

    fn minimal_columns() -> Vec<(Attribute, Vec<f64>)> {
        vec![
            (Attribute::Income, vec![40.0, 120.0]),
            (Attribute::CcAvg, vec![0.5, 3.0]),
            (Attribute::Education, vec![1.0, 3.0]),
            (Attribute::PersonalLoan, vec![0.0, 1.0]),
        ]
    }

    #[test]
    fn test_load_csv() {
        let file = create_test_csv();
        let dataset = load_csv(file.path()).unwrap();

        assert_eq!(dataset.len(), 4);
        assert_eq!(
            dataset.attributes(),
            &[
                Attribute::Id,
                Attribute::Age,
                Attribute::Income,
                Attribute::CcAvg,
                Attribute::Education,
                Attribute::Mortgage,
                Attribute::CdAccount,
            ]
        );
        assert_eq!(dataset.iter_columns().count(), 7);
        assert_eq!(dataset.target().to_vec(), vec![0.0, 0.0, 1.0, 0.0]);
        assert_eq!(
            dataset.column(Attribute::CcAvg).unwrap().to_vec(),
            vec![1.6, 1.5, 2.7, 1.0]
        );
    }

    #[test]
    fn test_unknown_columns_are_ignored() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Income,Branch,CCAvg,Education,Personal Loan").unwrap();
        writeln!(file, "50,north,1.0,1,0").unwrap();
        writeln!(file, "90,south,2.0,2,1").unwrap();

        let dataset = load_csv(file.path()).unwrap();
        assert_eq!(
            dataset.attributes(),
            &[Attribute::Income, Attribute::CcAvg, Attribute::Education]
        );
    }

    #[test]
    fn test_missing_required_column() {
        let mut columns = minimal_columns();
        columns.retain(|(a, _)| *a != Attribute::CcAvg);

        let err = Dataset::from_columns(columns).unwrap_err();
        assert!(matches!(err, DataError::MissingColumn(Attribute::CcAvg)));
    }

    #[test]
    fn test_non_binary_target_rejected() {
        let mut columns = minimal_columns();
        columns[3].1 = vec![0.0, 2.0];

        let err = Dataset::from_columns(columns).unwrap_err();
        assert!(matches!(
            err,
            DataError::InvalidValue {
                attribute: Attribute::PersonalLoan,
                row: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_negative_income_rejected() {
        let mut columns = minimal_columns();
        columns[0].1 = vec![-1.0, 120.0];
        assert!(Dataset::from_columns(columns).is_err());
    }

    #[test]
    fn test_length_mismatch_and_duplicates() {
        let mut columns = minimal_columns();
        columns.push((Attribute::Mortgage, vec![0.0]));
        assert!(matches!(
            Dataset::from_columns(columns).unwrap_err(),
            DataError::LengthMismatch { .. }
        ));

        let mut columns = minimal_columns();
        columns.push((Attribute::Income, vec![1.0, 2.0]));
        assert!(matches!(
            Dataset::from_columns(columns).unwrap_err(),
            DataError::DuplicateColumn(Attribute::Income)
        ));
    }

    #[test]
    fn test_empty_dataset_rejected() {
        let columns = minimal_columns()
            .into_iter()
            .map(|(a, _)| (a, Vec::new()))
            .collect();
        assert!(matches!(
            Dataset::from_columns(columns).unwrap_err(),
            DataError::Empty
        ));
    }

    #[test]
    fn test_non_numeric_cell_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Income,CCAvg,Education,Personal Loan").unwrap();
        writeln!(file, "50,1.0,1,0").unwrap();
        writeln!(file, "90,,2,1").unwrap();

        assert!(load_csv(file.path()).is_err());
    }

    #[test]
    fn test_fallback_when_both_sources_missing() {
        let dir = tempfile::tempdir().unwrap();
        let primary = dir.path().join("loan_data.csv");
        let fallback = dir.path().join("loans.xlsx");

        let err = load_dataset(&primary, &fallback, "Data").unwrap_err();
        let data_err = err.downcast_ref::<DataError>().unwrap();
        assert!(matches!(data_err, DataError::SourceUnavailable { .. }));
    }

    #[test]
    fn test_primary_preferred_over_fallback() {
        let file = create_test_csv();
        let missing = Path::new("/nonexistent/loans.xlsx");

        let dataset = load_dataset(file.path(), missing, "Data").unwrap();
        assert_eq!(dataset.len(), 4);
    }

    #[test]
    fn test_column_name_lookup() {
        assert_eq!(Attribute::from_column_name(" Personal Loan "), Some(TARGET));
        assert_eq!(Attribute::from_column_name("ZIP Code"), Some(Attribute::ZipCode));
        assert_eq!(Attribute::from_column_name("Branch"), None);
    }

    #[test]
    fn test_non_integer_education_rejected() {
        let mut columns = minimal_columns();
        columns[2].1 = vec![1.0, 1.5];

        let err = Dataset::from_columns(columns).unwrap_err();
        assert!(matches!(
            err,
            DataError::InvalidValue {
                attribute: Attribute::Education,
                row: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_decimal_after_integer_rows() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Income,CCAvg,Education,Personal Loan").unwrap();
        for i in 0..150 {
            writeln!(file, "{},{},1,{}", 40 + i, i % 4, i % 2).unwrap();
        }
        writeln!(file, "90,2.5,2,1").unwrap();

        let dataset = load_csv(file.path()).unwrap();
        let spending = dataset.column(Attribute::CcAvg).unwrap();
        assert_eq!(dataset.len(), 151);
        assert_eq!(spending[150], 2.5);
    }

    fn create_test_workbook(dir: &Path) -> std::path::PathBuf {
        use rust_xlsxwriter::Workbook;

        let path = dir.join("Bank_Personal_Loan_Modelling.xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Data").unwrap();

        let headers = ["ID", "Income", "Branch", "CCAvg", "Education", "Personal Loan"];
        for (col, header) in headers.iter().enumerate() {
            sheet.write_string(0, col as u16, *header).unwrap();
        }

        // Row 3 is left blank
        let rows: [(u32, f64, &str, f64, f64, f64); 3] = [
            (1, 49.0, "north", 1.6, 1.0, 0.0),
            (2, 180.0, "south", 2.7, 2.0, 1.0),
            (4, 100.0, "east", 1.0, 3.0, 0.0),
        ];
        for (i, (row, income, branch, cc_avg, education, loan)) in rows.into_iter().enumerate() {
            sheet.write_number(row, 0, (i + 1) as f64).unwrap();
            sheet.write_number(row, 1, income).unwrap();
            sheet.write_string(row, 2, branch).unwrap();
            if row == 2 {
                // Numeric text cell
                sheet.write_string(row, 3, "2.7").unwrap();
            } else {
                sheet.write_number(row, 3, cc_avg).unwrap();
            }
            sheet.write_number(row, 4, education).unwrap();
            sheet.write_number(row, 5, loan).unwrap();
        }

        workbook.save(&path).unwrap();
        path
    }

    #[test]
    fn test_spreadsheet_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let workbook = create_test_workbook(dir.path());
        let missing_csv = dir.path().join("loan_data.csv");

        let dataset = load_dataset(&missing_csv, &workbook, "Data").unwrap();

        assert_eq!(dataset.len(), 3);
        assert_eq!(
            dataset.attributes(),
            &[
                Attribute::Id,
                Attribute::Income,
                Attribute::CcAvg,
                Attribute::Education,
            ]
        );
        assert_eq!(dataset.target().to_vec(), vec![0.0, 1.0, 0.0]);
        assert_eq!(
            dataset.column(Attribute::CcAvg).unwrap().to_vec(),
            vec![1.6, 2.7, 1.0]
        );
        assert_eq!(
            dataset.column(Attribute::Income).unwrap().to_vec(),
            vec![49.0, 180.0, 100.0]
        );
    }

    #[test]
    fn test_spreadsheet_wrong_sheet_fails() {
        let dir = tempfile::tempdir().unwrap();
        let workbook = create_test_workbook(dir.path());
        let missing_csv = dir.path().join("loan_data.csv");

        let err = load_dataset(&missing_csv, &workbook, "Sheet9").unwrap_err();
        assert!(format!("{:#}", err).contains("Sheet9"));
    }

    #[test]
    fn test_cell_value_conversion() {
        assert_eq!(cell_value(&calamine::Data::Int(3)), Some(3.0));
        assert_eq!(cell_value(&calamine::Data::Float(1.5)), Some(1.5));
        assert_eq!(cell_value(&calamine::Data::Bool(true)), Some(1.0));
        assert_eq!(cell_value(&calamine::Data::String(" 2.25 ".to_string())), Some(2.25));
        assert_eq!(cell_value(&calamine::Data::String("n/a".to_string())), None);
        assert_eq!(cell_value(&calamine::Data::Empty), None);
    }
}
