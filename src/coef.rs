use serde::{Deserialize, Serialize};

use crate::{Error, SummaryTable};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coef {
    label: String,
    coef: f64,
    std_err: f64,
    t: f64,
    p: f64,
    conf_int: Option<(f64, f64)>,
}

impl Coef {
    pub fn new(label: impl ToString, coef: f64, std_err: f64, t: f64, p: f64) -> Self {
        Coef {
            label: label.to_string(),
            coef,
            std_err,
            t,
            p,
            conf_int: None,
        }
    }

    pub fn with_conf_int(mut self, lower: f64, upper: f64) -> Self {
        self.conf_int = Some((lower, upper));
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn coef(&self) -> f64 {
        self.coef
    }

    pub fn std_err(&self) -> f64 {
        self.std_err
    }

    /// The t or z statistic.
    pub fn t(&self) -> f64 {
        self.t
    }

    pub fn p(&self) -> f64 {
        self.p
    }

    pub fn conf_int(&self) -> Option<(f64, f64)> {
        self.conf_int
    }
}

const COEF: &str = "coef";
const STD_ERR: &str = "std err";
const STATISTIC: [&str; 2] = ["t", "z"];
const P_VALUE: [&str; 2] = ["P>|t|", "P>|z|"];

impl SummaryTable {
    fn find_column(&self, names: &[&str]) -> Result<usize, Error> {
        names
            .iter()
            .find_map(|x| self.column_index(x))
            .ok_or_else(|| Error::ColumnNotFound(names.join("|")))
    }

    /// Read the rows as coefficients, using the column names of statsmodels summaries.
    /// The confidence interval is taken from the `[lower` and `upper]` columns when both exist.
    pub fn coefs(&self) -> Result<Vec<Coef>, Error> {
        let coef = self.find_column(&[COEF])?;
        let std_err = self.find_column(&[STD_ERR])?;
        let t = self.find_column(&STATISTIC)?;
        let p = self.find_column(&P_VALUE)?;
        let lower = self.columns().iter().position(|x| x.starts_with('['));
        let upper = self.columns().iter().position(|x| x.ends_with(']'));
        Ok(self
            .rows()
            .iter()
            .map(|row| {
                let values = row.values();
                let c = Coef::new(
                    row.variable(),
                    values[coef],
                    values[std_err],
                    values[t],
                    values[p],
                );
                match (lower, upper) {
                    (Some(lower), Some(upper)) => c.with_conf_int(values[lower], values[upper]),
                    _ => c,
                }
            })
            .collect())
    }
}
