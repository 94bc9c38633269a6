use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{is_fixed_effect, Error, FittedModel, Report};

/// Name given to the unlabeled term column.
pub const VARIABLE: &str = "variable";

const COEF_TABLE_ENV: &str = "LMSUMMARY_COEF_TABLE";
const DEFAULT_COEF_TABLE: usize = 1;

/// How a report is normalized. The default reads table 1 and drops fixed effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Drop the rows of fixed effect terms.
    pub exclude_fixed_effects: bool,
    /// Index of the coefficient table in the report.
    pub table_index: usize,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            exclude_fixed_effects: true,
            table_index: DEFAULT_COEF_TABLE,
        }
    }
}

impl NormalizeOptions {
    /// Defaults, with the table index taken from `LMSUMMARY_COEF_TABLE` when it is set to a
    /// valid index.
    pub fn from_env() -> Self {
        let table_index = std::env::var(COEF_TABLE_ENV)
            .ok()
            .and_then(|x| x.parse::<usize>().ok())
            .unwrap_or(DEFAULT_COEF_TABLE);
        Self {
            table_index,
            ..Self::default()
        }
    }

    /// Set whether fixed effect rows are dropped.
    pub fn with_exclude_fixed_effects(mut self, exclude_fixed_effects: bool) -> Self {
        self.exclude_fixed_effects = exclude_fixed_effects;
        self
    }

    /// Set which table of the report holds the coefficients.
    pub fn with_table_index(mut self, table_index: usize) -> Self {
        self.table_index = table_index;
        self
    }
}

/// Coefficient table whose structure has been checked, cells are still untyped.
pub(crate) struct ParsedTable<'a> {
    pub(crate) columns: Vec<String>,
    pub(crate) variable: usize,
    pub(crate) rows: &'a [Vec<String>],
}

pub(crate) fn coefficient_table<'a>(
    report: &'a Report,
    options: &NormalizeOptions,
) -> Result<ParsedTable<'a>, Error> {
    let index = options.table_index;
    let table = report.table(index)?;
    let header = table.header().ok_or(Error::MissingHeader(index))?;
    let rows = table.body();
    for (i, row) in rows.iter().enumerate() {
        if row.len() != header.len() {
            return Err(Error::RowLengthMismatch {
                row: i,
                expected: header.len(),
                found: row.len(),
            });
        }
    }
    let variable = header
        .iter()
        .position(|x| x.trim().is_empty())
        .ok_or(Error::MissingVariableColumn)?;
    let columns = header
        .iter()
        .map(|x| {
            if x.trim().is_empty() {
                VARIABLE.to_string()
            } else {
                x.to_string()
            }
        })
        .collect::<Vec<_>>();
    let mut seen = HashSet::new();
    for column in &columns {
        if !seen.insert(column.as_str()) {
            return Err(Error::DuplicateColumn(column.to_string()));
        }
    }
    debug!(
        "Coefficient table {} has {} columns and {} rows",
        index,
        columns.len(),
        rows.len()
    );
    Ok(ParsedTable {
        columns,
        variable,
        rows,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    variable: String,
    values: Vec<f64>,
}

impl SummaryRow {
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// Statistic values, in the order of the table's columns.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn value(&self, column: usize) -> Option<f64> {
        self.values.get(column).copied()
    }

    pub fn is_fixed_effect(&self) -> bool {
        is_fixed_effect(&self.variable)
    }
}

/// Per-term statistics of a fitted model, one row per term in report order.
/// Every row has one value per column and column names are unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SummaryTableData")]
pub struct SummaryTable {
    /// Statistic column names, excluding the variable column.
    columns: Vec<String>,
    rows: Vec<SummaryRow>,
}

#[derive(Deserialize)]
struct SummaryTableData {
    columns: Vec<String>,
    rows: Vec<SummaryRow>,
}

impl TryFrom<SummaryTableData> for SummaryTable {
    type Error = Error;

    fn try_from(data: SummaryTableData) -> Result<Self, Self::Error> {
        let mut seen = HashSet::new();
        for column in &data.columns {
            if !seen.insert(column.as_str()) {
                return Err(Error::DuplicateColumn(column.to_string()));
            }
        }
        for (i, row) in data.rows.iter().enumerate() {
            if row.values.len() != data.columns.len() {
                return Err(Error::RowLengthMismatch {
                    row: i,
                    expected: data.columns.len(),
                    found: row.values.len(),
                });
            }
        }
        Ok(Self {
            columns: data.columns,
            rows: data.rows,
        })
    }
}

impl SummaryTable {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|x| x.variable())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|x| x == name)
    }

    /// The first row for the variable.
    pub fn row(&self, variable: &str) -> Option<&SummaryRow> {
        self.rows.iter().find(|x| x.variable == variable)
    }

    pub fn get(&self, variable: &str, column: &str) -> Option<f64> {
        let column = self.column_index(column)?;
        self.row(variable).and_then(|x| x.value(column))
    }

    pub fn column(&self, name: &str) -> Result<Vec<f64>, Error> {
        let column = self
            .column_index(name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))?;
        Ok(self.rows.iter().map(|x| x.values[column]).collect())
    }

    /// Remove fixed effect rows, keeping the order of the others.
    pub fn without_fixed_effects(mut self) -> Self {
        let before = self.rows.len();
        self.rows.retain(|x| !x.is_fixed_effect());
        debug!("Dropped {} fixed effect rows", before - self.rows.len());
        self
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Normalize the coefficient table (table 1) of the model's summary.
/// `exclude_fixed_effects` drops the `C(...)` rows.
#[tracing::instrument(skip(model))]
pub fn normalize_summary(
    model: &impl FittedModel,
    exclude_fixed_effects: bool,
) -> Result<SummaryTable, Error> {
    normalize_summary_with(
        model,
        &NormalizeOptions::default().with_exclude_fixed_effects(exclude_fixed_effects),
    )
}

pub fn normalize_summary_with(
    model: &impl FittedModel,
    options: &NormalizeOptions,
) -> Result<SummaryTable, Error> {
    let report = model.summary()?;
    normalize_report(&report, options)
}

#[tracing::instrument(skip(report))]
pub fn normalize_report(report: &Report, options: &NormalizeOptions) -> Result<SummaryTable, Error> {
    let table = coefficient_table(report, options)?;
    let columns = table
        .columns
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != table.variable)
        .map(|(_, x)| x.to_string())
        .collect::<Vec<_>>();
    let mut rows = Vec::with_capacity(table.rows.len());
    for (r, cells) in table.rows.iter().enumerate() {
        // parsed before filtering, fixed effect rows must be numeric too
        let values = cells
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != table.variable)
            .map(|(i, value)| {
                value
                    .trim()
                    .parse::<f64>()
                    .map_err(|source| Error::ParseFloat {
                        column: table.columns[i].to_string(),
                        row: r,
                        value: value.to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        trace!("Parsed row {}", r);
        rows.push(SummaryRow {
            variable: cells[table.variable].to_string(),
            values,
        });
    }
    let summary = SummaryTable { columns, rows };
    Ok(if options.exclude_fixed_effects {
        summary.without_fixed_effects()
    } else {
        summary
    })
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::{SummaryModel, Table};

    fn options() -> NormalizeOptions {
        NormalizeOptions {
            exclude_fixed_effects: true,
            table_index: 1,
        }
    }

    fn report(rows: Vec<Vec<&str>>) -> Report {
        Report::new(vec![Table::default(), Table::from(rows)])
    }

    fn model(rows: Vec<Vec<&str>>) -> SummaryModel {
        SummaryModel::with_term_names(vec![], report(rows))
    }

    fn example() -> SummaryModel {
        model(vec![
            vec!["", "coef", "std err", "P>|t|"],
            vec!["age", "0.50", "0.10", "0.001"],
            vec!["C(region)[T.west]", "1.20", "0.30", "0.020"],
        ])
    }

    #[test]
    fn test_normalize_excluding_fixed_effects() {
        let table = normalize_summary(&example(), true).unwrap();
        assert_eq!(table.columns(), ["coef", "std err", "P>|t|"]);
        assert_eq!(table.len(), 1);
        let row = &table.rows()[0];
        assert_eq!(row.variable(), "age");
        assert_eq!(row.values(), [0.50, 0.10, 0.001]);
        assert_eq!(table.get("age", "std err"), Some(0.10));
        assert_eq!(table.get("age", "P>|t|"), Some(0.001));
    }

    #[test]
    fn test_normalize_keeping_fixed_effects() {
        let table = normalize_summary(&example(), false).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.variables().collect::<Vec<_>>(),
            ["age", "C(region)[T.west]"]
        );
        assert_eq!(table.get("C(region)[T.west]", "coef"), Some(1.20));
        assert!(table.rows()[1].is_fixed_effect());
        assert_eq!(table.column("coef").unwrap(), [0.50, 1.20]);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let model = example();
        let a = normalize_summary(&model, false).unwrap();
        let b = normalize_summary(&model, false).unwrap();
        assert_eq!(a, b);
        assert_eq!(model, example());
    }

    #[test]
    fn test_filter_keeps_order() {
        let model = model(vec![
            vec!["", "coef"],
            vec!["Intercept", "1"],
            vec!["C(a)[T.x]", "2"],
            vec!["b", "3"],
            vec!["C(a)[T.y]", "4"],
            vec!["c", "5"],
        ]);
        let table = normalize_summary(&model, true).unwrap();
        assert_eq!(
            table.variables().collect::<Vec<_>>(),
            ["Intercept", "b", "c"]
        );
        assert_eq!(table.column("coef").unwrap(), [1.0, 3.0, 5.0]);
    }

    #[test]
    fn test_normalize_text_report() {
        let report = Report::from_path("tests/data/ols_summary.txt").unwrap();
        let table = normalize_report(&report, &options()).unwrap();
        assert_eq!(
            table.columns(),
            ["coef", "std err", "t", "P>|t|", "[0.025", "0.975]"]
        );
        assert_eq!(
            table.variables().collect::<Vec<_>>(),
            ["Intercept", "age", "income"]
        );
        assert_eq!(table.get("income", "coef"), Some(-1.5e-3));
        assert_eq!(table.get("income", "std err"), Some(5.0e-4));
        assert_eq!(table.get("age", "0.975]"), Some(0.7));
    }

    #[test]
    fn test_normalize_padded_cells() {
        let table = normalize_summary(
            &model(vec![vec!["", "coef"], vec!["age", "  -1.5e-3 "]]),
            true,
        )
        .unwrap();
        assert_eq!(table.get("age", "coef"), Some(-1.5e-3));
    }

    #[test]
    fn test_non_numeric_value() {
        let err = normalize_summary(
            &model(vec![
                vec!["", "coef", "std err"],
                vec!["age", "0.50", "N/A"],
            ]),
            true,
        )
        .unwrap_err();
        assert!(err.is_conversion_error());
        match &err {
            Error::ParseFloat {
                column, row, value, ..
            } => {
                assert_eq!(column, "std err");
                assert_eq!(*row, 0);
                assert_eq!(value, "N/A");
            },
            _ => panic!("unexpected error {err}"),
        }
    }

    #[test]
    fn test_non_numeric_fixed_effect_value() {
        let err = normalize_summary(
            &model(vec![
                vec!["", "coef"],
                vec!["age", "0.50"],
                vec!["C(region)[T.west]", ""],
            ]),
            true,
        )
        .unwrap_err();
        assert!(matches!(err, Error::ParseFloat { row: 1, .. }));
    }

    #[test]
    fn test_missing_table() {
        let model = SummaryModel::with_term_names(vec![], Report::new(vec![Table::default()]));
        let err = normalize_summary(&model, true).unwrap_err();
        assert!(err.is_format_error());
        assert!(matches!(err, Error::MissingTable { index: 1, found: 1 }));
    }

    #[test]
    fn test_missing_header() {
        let err = normalize_summary(&model(vec![]), true).unwrap_err();
        assert!(err.is_format_error());
        assert!(matches!(err, Error::MissingHeader(1)));
    }

    #[test]
    fn test_header_only() {
        let table = normalize_summary(&model(vec![vec!["", "coef"]]), true).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns(), ["coef"]);
    }

    #[test]
    fn test_row_length_mismatch() {
        let err = normalize_summary(
            &model(vec![vec!["", "coef"], vec!["age", "0.5", "0.1"]]),
            true,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::RowLengthMismatch {
                row: 0,
                expected: 2,
                found: 3
            }
        ));
    }

    #[test]
    fn test_variable_column() {
        let err = normalize_summary(&model(vec![vec!["term", "coef"]]), true).unwrap_err();
        assert!(matches!(err, Error::MissingVariableColumn));
        let err = normalize_summary(&model(vec![vec!["", "coef", ""]]), true).unwrap_err();
        assert!(matches!(err, Error::DuplicateColumn(x) if x == VARIABLE));
        let err = normalize_summary(&model(vec![vec!["", "coef", "coef"]]), true).unwrap_err();
        assert!(matches!(err, Error::DuplicateColumn(x) if x == "coef"));
        let table = normalize_summary(
            &model(vec![vec!["coef", ""], vec!["1.5", "age"]]),
            true,
        )
        .unwrap();
        assert_eq!(table.columns(), ["coef"]);
        assert_eq!(table.get("age", "coef"), Some(1.5));
    }

    #[test]
    fn test_table_index() {
        let report = Report::new(vec![Table::from(vec![vec!["", "coef"], vec!["age", "2"]])]);
        let table = normalize_report(&report, &options().with_table_index(0)).unwrap();
        assert_eq!(table.get("age", "coef"), Some(2.0));
        assert!(matches!(
            normalize_report(&report, &options()),
            Err(Error::MissingTable { index: 1, found: 1 })
        ));
    }

    #[test]
    fn test_accessors() {
        let table = normalize_summary(&example(), false).unwrap();
        assert_eq!(table.column_index("std err"), Some(1));
        assert_eq!(table.column_index("variable"), None);
        assert!(table.row("income").is_none());
        assert_eq!(table.get("age", "t"), None);
        assert!(matches!(
            table.column("t"),
            Err(Error::ColumnNotFound(x)) if x == "t"
        ));
        assert_eq!(table.rows()[0].value(3), None);
        let filtered = table.clone().without_fixed_effects();
        assert_eq!(filtered, normalize_summary(&example(), true).unwrap());
    }

    #[test]
    fn test_env_table_index() {
        let model = SummaryModel::with_term_names(
            vec![],
            Report::new(vec![
                Table::from(vec![vec!["", "coef"], vec!["x", "1"]]),
                Table::from(vec![vec!["", "coef"], vec!["age", "2"]]),
            ]),
        );
        std::env::set_var(COEF_TABLE_ENV, "0");
        let pinned = normalize_summary(&model, true);
        let from_env = NormalizeOptions::from_env();
        std::env::remove_var(COEF_TABLE_ENV);
        assert_eq!(
            pinned.unwrap().variables().collect::<Vec<_>>(),
            ["age"]
        );
        assert_eq!(NormalizeOptions::default().table_index, 1);
        assert_eq!(from_env.table_index, 0);
        let table = normalize_summary_with(&model, &from_env).unwrap();
        assert_eq!(table.variables().collect::<Vec<_>>(), ["x"]);
    }

    #[test]
    fn test_json_validation() {
        let err = serde_json::from_str::<SummaryTable>(
            r#"{"columns":["coef","std err","t","P>|t|"],"rows":[{"variable":"age","values":[0.5]}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("row 0 has 1 cells, header has 4"));
        let err = serde_json::from_str::<SummaryTable>(
            r#"{"columns":["coef","coef"],"rows":[]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate column coef"));
    }

    #[test]
    fn test_json() {
        let table = normalize_summary(&example(), true).unwrap();
        let json = table.to_json().unwrap();
        assert_eq!(
            json,
            r#"{"columns":["coef","std err","P>|t|"],"rows":[{"variable":"age","values":[0.5,0.1,0.001]}]}"#
        );
        assert_eq!(serde_json::from_str::<SummaryTable>(&json).unwrap(), table);
    }
}
