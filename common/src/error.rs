use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BreakdownError {
    #[error("Can not read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Can not read rows from csv file {path:?}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    /// Only surfaced when [`crate::config::ParseFailurePolicy::Fail`] is configured
    #[error("Row {row} column {column}: {value:?} is not a number")]
    NumericParse {
        row: usize,
        column: usize,
        value: String,
    },
    #[error("Render failed: {0}")]
    Render(String),
    #[error("Invalid config: {0}")]
    Config(String),
}

impl BreakdownError {
    pub fn render<E: std::fmt::Display>(err: E) -> Self {
        Self::Render(err.to_string())
    }
}
