#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Turn the coefficient table of a fitted regression model's summary into a typed table, and
//! recognize categorical fixed effect terms by their `C(...)` names.

mod coef;
mod error;
mod fixed_effect;
mod model;
mod report;
mod summary;

pub(crate) use crate::summary::coefficient_table;
pub use crate::{
    coef::*,
    error::*,
    fixed_effect::*,
    model::*,
    report::*,
    summary::{
        normalize_report, normalize_summary, normalize_summary_with, NormalizeOptions,
        SummaryRow, SummaryTable, VARIABLE,
    },
};
