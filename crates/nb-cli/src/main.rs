//! nnbar-plots: histogram PNGs from nnbar analyzer output

mod aggregate;
mod catalog;
mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use nb_root::RootTableReader;
use nb_viz_render::font::FontHandle;
use nb_viz_render::{FileSink, PlotRenderer};
use tracing::info;

use crate::config::RunConfig;

#[derive(Parser)]
#[command(name = "nnbar-plots")]
#[command(about = "Aggregate nnbar analyzer ntuples of one sample and render histogram PNGs")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,

    /// Sample name: reads `<base>/<sample>/anahist_<i>.root`, writes `./plots/<sample>/`
    sample: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().with_max_level(cli.log_level).with_target(false).init();

    let config = RunConfig::from_env()?;
    run(&cli.sample, &config)
}

fn run(sample_name: &str, config: &RunConfig) -> Result<()> {
    let fields = catalog::fields(catalog::CATALOG, &config.modules);
    let sample = aggregate::aggregate(&RootTableReader, &config.input, sample_name, &fields)
        .with_context(|| format!("failed to aggregate sample '{sample_name}'"))?;
    catalog::log_summary(&sample);

    let out_dir = config.sample_output_dir(sample_name);
    let fonts = Arc::new(FontHandle::system());
    let mut renderer = PlotRenderer::new(config.render.clone(), &out_dir, FileSink, fonts);
    let written = catalog::render_all(&mut renderer, catalog::CATALOG, &sample, &config.modules)
        .with_context(|| format!("failed to render plots into {}", out_dir.display()))?;

    info!(plots = written.len(), out_dir = %out_dir.display(), "done");
    Ok(())
}
