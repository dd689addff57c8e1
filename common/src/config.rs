use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{error::BreakdownError, plot::Plot};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub name: String,
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub plots: Vec<Box<dyn Plot>>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub on_parse_failure: ParseFailurePolicy,
}

/// What to do with a field that is missing or is not a floating point literal
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseFailurePolicy {
    /// Record `0.0` for the field and keep the row
    #[default]
    Zero,
    /// Drop the whole row from its condition
    SkipRow,
    /// Abort with [`BreakdownError::NumericParse`]
    Fail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub name: String,
    pub rows: RowRange,
    /// Conditions without a prepare step get `0.0` instead of reading the column
    #[serde(default = "default_has_prepare_stage")]
    pub has_prepare_stage: bool,
}

fn default_has_prepare_stage() -> bool {
    true
}

impl Condition {
    pub fn new(name: &str, start: usize, end: usize, has_prepare_stage: bool) -> Self {
        Self {
            name: name.to_owned(),
            rows: RowRange { start, end },
            has_prepare_stage,
        }
    }
}

/// 1-based inclusive row indices, the header row (0) is never part of a range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRange {
    pub start: usize,
    pub end: usize,
}

impl RowRange {
    pub fn contains(&self, row: usize) -> bool {
        row >= self.start && row <= self.end
    }

    pub fn len(&self) -> usize {
        if self.start > self.end {
            return 0;
        }
        (self.end - self.start).saturating_add(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn overlaps(&self, other: &RowRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Read config file {path:?}"))?;
        let config: Config = serde_yml::from_str(&contents)
            .wrap_err_with(|| format!("Parse config file {path:?}"))?;
        Ok(config)
    }

    /// Highest row index covered by any condition
    pub fn last_row(&self) -> usize {
        self.conditions.iter().map(|c| c.rows.end).max().unwrap_or(0)
    }

    /// Data rows past the end of every condition range
    pub fn trailing_rows(&self, data_rows: usize) -> usize {
        data_rows.saturating_sub(self.last_row())
    }

    pub fn condition_names(&self) -> Vec<String> {
        self.conditions.iter().map(|c| c.name.clone()).collect()
    }

    pub fn validate(&self) -> Result<(), BreakdownError> {
        if self.conditions.is_empty() {
            return Err(BreakdownError::Config("no conditions configured".to_owned()));
        }

        for condition in &self.conditions {
            let RowRange { start, end } = condition.rows;
            if start == 0 {
                return Err(BreakdownError::Config(format!(
                    "condition {} starts at row 0, which is the header",
                    condition.name
                )));
            }
            if start > end {
                return Err(BreakdownError::Config(format!(
                    "condition {} has an empty row range {start}..={end}",
                    condition.name
                )));
            }
        }

        if let Some(name) = self.conditions.iter().map(|c| &c.name).duplicates().next() {
            return Err(BreakdownError::Config(format!(
                "condition {name} is defined more than once"
            )));
        }

        for (a, b) in self.conditions.iter().tuple_combinations() {
            if a.rows.overlaps(&b.rows) {
                return Err(BreakdownError::Config(format!(
                    "conditions {} ({}..={}) and {} ({}..={}) overlap",
                    a.name, a.rows.start, a.rows.end, b.name, b.rows.start, b.rows.end
                )));
            }
        }

        let sorted = self
            .conditions
            .iter()
            .sorted_by_key(|c| c.rows.start)
            .collect::<Vec<_>>();
        if sorted[0].rows.start > 1 {
            warn!(
                "Rows 1..{} are not covered by any condition",
                sorted[0].rows.start
            );
        }
        for (a, b) in sorted.iter().tuple_windows() {
            if b.rows.start > a.rows.end.saturating_add(1) {
                warn!(
                    "Rows {}..{} between {} and {} are not covered by any condition",
                    a.rows.end.saturating_add(1),
                    b.rows.start,
                    a.name,
                    b.name
                );
            }
        }

        Ok(())
    }
}
