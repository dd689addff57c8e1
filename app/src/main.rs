use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use common::{config::Config, pipeline, stage::Stage};
use eyre::Result;
use itertools::Itertools;
use tracing::error;
use tracing_subscriber::{
    EnvFilter,
    fmt::{layer, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const MODULES: &[&str] = &["common", "breakdown_bars", "mean_table"];

#[derive(Parser)]
#[command(about = "Restore duration breakdown plots")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(short, long)]
    log: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate the input csv and write every configured plot
    Plot {
        #[arg(short, long, default_value = "config.yaml")]
        config_file: PathBuf,
    },
    /// Validate a config and print its conditions
    Check {
        #[arg(short, long, default_value = "config.yaml")]
        config_file: PathBuf,
    },
    /// Print the stage means per condition without plotting
    Summary {
        #[arg(short, long, default_value = "config.yaml")]
        config_file: PathBuf,
    },
}

fn main() -> Result<()> {
    let log_level = std::env::var("RUST_LOG").unwrap_or("warn".to_owned());
    let args = Cli::parse();
    let file_appender = tracing_appender::rolling::never(".", "log.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let mut env_filter = EnvFilter::new(format!("restore_breakdown={log_level}"));

    if !args.log.is_empty() {
        for log in &args.log {
            env_filter = env_filter.add_directive(log.parse()?);
        }
    }

    for module in MODULES {
        if !args.log.iter().any(|x| x.starts_with(module)) {
            env_filter = env_filter.add_directive(format!("{module}={log_level}").parse()?);
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            layer()
                .with_timer(ChronoLocal::new("%v %k:%M:%S %z".to_owned()))
                .compact(),
        )
        .with(layer().with_writer(non_blocking))
        .init();

    default_plots::init_plots();

    let res = match args.command {
        Commands::Plot { config_file } => plot(&config_file),
        Commands::Check { config_file } => check(&config_file),
        Commands::Summary { config_file } => summary(&config_file),
    };
    if let Err(err) = &res {
        error!("{err:#?}");
    }
    res
}

fn plot(config_file: &Path) -> Result<()> {
    let config = Config::load(config_file)?;
    pipeline::run(&config)?;
    Ok(())
}

fn check(config_file: &Path) -> Result<()> {
    let config = Config::load(config_file)?;
    config.validate()?;
    println!("{} -> {:?}", config.name, config.input);
    for condition in &config.conditions {
        println!(
            "{:<16} rows {:>3}..={:<3} ({} rows) prepare stage: {}",
            condition.name,
            condition.rows.start,
            condition.rows.end,
            condition.rows.len(),
            if condition.has_prepare_stage { "yes" } else { "no" }
        );
    }
    println!(
        "plots: {}",
        config.plots.iter().map(|p| p.name()).join(", ")
    );
    Ok(())
}

fn summary(config_file: &Path) -> Result<()> {
    let config = Config::load(config_file)?;
    for breakdown in pipeline::breakdowns(&config)? {
        println!("{} ({} rows)", breakdown.condition, breakdown.samples());
        for stage in Stage::ALL {
            println!("  {:<20} {:.2}", stage.name(), breakdown.mean(stage));
        }
    }
    Ok(())
}
