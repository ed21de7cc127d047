mod args;
mod config;

use std::env;
use std::io;

use clap::Parser;
use flow_app::{AppConfig, AppState, CatalogSource, ReportOptions};
use ingest::{IngestOptions, SlotPolicy};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::args::CliArgs;
use crate::config::{CliConfig, TOKEN_ENV};

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();
}

fn app_config(args: &CliArgs, config: &CliConfig) -> AppConfig {
    let catalog = match &args.classification_file_path {
        Some(path) => CatalogSource::Local(path.clone()),
        None => CatalogSource::Remote {
            registration_domain: config.catalog.registration_domain.clone(),
            registration_token: env::var(TOKEN_ENV)
                .ok()
                .filter(|token| !token.is_empty())
                .unwrap_or_else(|| config.catalog.registration_token.clone()),
        },
    };
    let slot_policy = if args.all_slots {
        SlotPolicy::All
    } else {
        config.slot_policy
    };
    AppConfig {
        log_file_path: args.log_file_path.clone(),
        catalog,
        ingest: IngestOptions {
            marker: config.marker.clone(),
            slot_policy,
        },
        report: ReportOptions {
            format: args.format,
            charts: !args.no_chart,
            chart_width: config.chart_width,
        },
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();
    init_tracing(args.verbose);

    let config = config::load(args.config.as_deref()).map_err(io::Error::other)?;
    if config.created {
        info!(path = %config.file.display(), "created default config");
    }
    if config.config.chart_width == 0 && !args.no_chart {
        warn!("chart_width is 0; charts will be empty");
    }

    let app_state = AppState::new(app_config(&args, &config.config));
    let stdout = io::stdout();
    let mut out = stdout.lock();
    app_state.run(&mut out)?;
    Ok(())
}
