use std::{fs::File, path::Path};

use common::{
    config::Config,
    plot::Plot,
    stage::{RestoreBreakdown, Stage},
};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableFormat {
    #[default]
    Csv,
    Json,
}

/// Writes the stage means per condition next to the charts
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MeanTable {
    /// Defaults to `<name>_means.csv` or `<name>_means.json`
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub format: TableFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanRow {
    pub condition: String,
    pub stage: Stage,
    pub samples: usize,
    pub mean: f64,
}

pub fn mean_rows(breakdowns: &[RestoreBreakdown]) -> Vec<MeanRow> {
    breakdowns
        .iter()
        .flat_map(|breakdown| {
            Stage::ALL.into_iter().map(move |stage| MeanRow {
                condition: breakdown.condition.clone(),
                stage,
                samples: breakdown.series(stage).len(),
                mean: breakdown.mean(stage),
            })
        })
        .collect()
}

#[typetag::serde]
impl Plot for MeanTable {
    fn name(&self) -> &'static str {
        "MeanTable"
    }

    fn plot(
        &self,
        config: &Config,
        breakdowns: &[RestoreBreakdown],
        plot_path: &Path,
    ) -> Result<()> {
        let extension = match self.format {
            TableFormat::Csv => "csv",
            TableFormat::Json => "json",
        };
        let filename = self
            .filename
            .clone()
            .unwrap_or_else(|| format!("{}_means.{extension}", config.name));
        let filepath = plot_path.join(filename);
        let rows = mean_rows(breakdowns);

        match self.format {
            TableFormat::Csv => {
                let mut writer = csv::Writer::from_path(&filepath)
                    .wrap_err_with(|| format!("Create {filepath:?}"))?;
                for row in &rows {
                    writer.serialize(row)?;
                }
                writer.flush()?;
            }
            TableFormat::Json => {
                let file =
                    File::create(&filepath).wrap_err_with(|| format!("Create {filepath:?}"))?;
                serde_json::to_writer_pretty(file, &rows)?;
            }
        }
        info!("Wrote {filepath:?}");
        Ok(())
    }
}
