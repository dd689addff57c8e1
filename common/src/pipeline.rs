use eyre::{Context, Result};
use tracing::{info, warn};

use crate::{aggregate::aggregate, config::Config, loader::read_rows, plot, stage::RestoreBreakdown};

/// Validates the config, then loads and aggregates the input csv
pub fn breakdowns(config: &Config) -> Result<Vec<RestoreBreakdown>> {
    config.validate()?;
    let rows = read_rows(&config.input)?;
    let trailing = config.trailing_rows(rows.len().saturating_sub(1));
    if trailing > 0 {
        warn!(
            "{}: ignoring {trailing} rows after row {}, the last covered by a condition",
            config.name,
            config.last_row()
        );
    }
    let breakdowns = aggregate(&rows, &config.conditions, config.settings.on_parse_failure)
        .wrap_err_with(|| format!("Aggregate {:?}", config.input))?;
    Ok(breakdowns)
}

/// Loads, aggregates and runs every configured plot
pub fn run(config: &Config) -> Result<Vec<RestoreBreakdown>> {
    let breakdowns = breakdowns(config)?;
    plot::plot(config, &breakdowns)?;
    info!("Finished {}", config.name);
    Ok(breakdowns)
}
