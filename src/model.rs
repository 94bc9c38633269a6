use std::path::Path;

use crate::{coefficient_table, Error, NormalizeOptions, Report};

/// A fitted regression model as seen from its summary.
pub trait FittedModel {
    /// Names of the model terms, in the order the model was fit with.
    fn term_names(&self) -> &[String];

    /// The model's summary report.
    fn summary(&self) -> Result<Report, Error>;
}

impl<T: FittedModel + ?Sized> FittedModel for &T {
    fn term_names(&self) -> &[String] {
        (**self).term_names()
    }

    fn summary(&self) -> Result<Report, Error> {
        (**self).summary()
    }
}

/// A model backed by an already rendered summary report.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryModel {
    term_names: Vec<String>,
    report: Report,
}

impl SummaryModel {
    /// Take the term names from the unlabeled column of the coefficient table (table 1).
    pub fn new(report: Report) -> Result<Self, Error> {
        let term_names = {
            let table = coefficient_table(&report, &NormalizeOptions::default())?;
            table
                .rows
                .iter()
                .map(|row| row[table.variable].to_string())
                .collect()
        };
        Ok(Self { term_names, report })
    }

    pub fn with_term_names(term_names: Vec<String>, report: Report) -> Self {
        Self { term_names, report }
    }

    pub fn from_text(text: &str) -> Result<Self, Error> {
        Self::new(Report::from_text(text))
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        Self::new(Report::from_json(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::new(Report::from_path(path)?)
    }

    pub fn report(&self) -> &Report {
        &self.report
    }
}

impl FittedModel for SummaryModel {
    fn term_names(&self) -> &[String] {
        &self.term_names
    }

    fn summary(&self) -> Result<Report, Error> {
        Ok(self.report.clone())
    }
}
