use core::fmt::Debug;
use std::{fs, path::Path};

use dyn_clone::{DynClone, clone_trait_object};
use eyre::{Context, Result};
use tracing::debug;

use crate::{config::Config, stage::RestoreBreakdown};

#[typetag::serde(tag = "type")]
pub trait Plot: Debug + DynClone + Send + Sync {
    /// Name of the plot, for identification
    fn name(&self) -> &'static str;
    /// Renders the aggregated data
    ///
    /// Arguments:
    /// * `config` - The experiment config, conditions in legend/axis order
    /// * `breakdowns` - One finished breakdown per condition, same order as `config.conditions`
    /// * `plot_path` - Existing directory the output is written to
    fn plot(
        &self,
        config: &Config,
        breakdowns: &[RestoreBreakdown],
        plot_path: &Path,
    ) -> Result<()>;
}
clone_trait_object!(Plot);

pub fn ensure_plot_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir).wrap_err_with(|| format!("Create plot dir {dir:?}"))?;
    }
    Ok(())
}

pub fn plot(config: &Config, breakdowns: &[RestoreBreakdown]) -> Result<()> {
    if config.plots.is_empty() {
        debug!("No plots");
        return Ok(());
    }

    ensure_plot_dir(&config.output_dir)?;
    for plot in &config.plots {
        debug!("Running plot {}", plot.name());
        plot.plot(config, breakdowns, &config.output_dir)
            .wrap_err_with(|| format!("Plot {}", plot.name()))?;
    }
    Ok(())
}
