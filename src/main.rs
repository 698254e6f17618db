use anyhow::{Context, Result};
use clap::Parser;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

use uso::category::CategoryMap;
use uso::cli::{Cli, OutputFormat};
use uso::histogram::UsageHistogram;
use uso::json_output::JsonSummary;
use uso::plot::{self, PlotSeries, PlotStyle};
use uso::summary::Summary;
use uso::{datafile, reconcile, sacct};

/// Initialize tracing subscriber for debug output on stderr
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

/// Write the plot next to the requested basename.
fn write_plot(cli: &Cli, series: &PlotSeries) -> Result<()> {
    let svg = plot::render_svg(
        series,
        &PlotStyle::default(),
        cli.title.as_deref().unwrap_or(""),
        cli.color,
    );
    let path = format!("{}.svg", cli.name);
    fs::write(&path, svg).with_context(|| format!("failed to write plot {path:?}"))?;
    info!("wrote {path}");
    Ok(())
}

/// Print the summary in the requested format.
fn print_summary(
    cli: &Cli,
    summary: &Summary,
    resolution: usize,
    bucket_step_secs: f64,
) -> Result<()> {
    match cli.format {
        OutputFormat::Text => print!("{}", summary.render_text()),
        OutputFormat::Json => {
            let doc = JsonSummary::new(summary, resolution, bucket_step_secs);
            println!("{}", doc.to_json()?);
        }
    }
    Ok(())
}

/// Full pipeline: query accounting, reconcile, classify, plot, summarize.
fn run_pipeline(cli: &Cli) -> Result<()> {
    let mapping = match &cli.mapping {
        Some(path) => CategoryMap::from_json_file(path)?,
        None => CategoryMap::defaults()?,
    };

    let selection = sacct::Selection {
        users: cli.users.clone(),
        jobs: cli.jobs.clone(),
        failed: cli.failed.clone(),
    };
    let raw = sacct::query(&cli.sacct, &selection)?;
    info!("collected {} accounting records", raw.len());

    let keep_failed: HashSet<String> = cli
        .failed
        .iter()
        .flat_map(|list| list.split(','))
        .map(str::to_string)
        .collect();
    let records = reconcile::reconcile(raw, &keep_failed);
    info!("{} jobs after reconciliation", records.len());

    let labels = mapping.classify_all(&records)?;
    let histogram = UsageHistogram::build(&records, &labels, cli.resolution)
        .context("cannot build usage histogram")?;

    let series = PlotSeries::from_histogram(&histogram);
    write_plot(cli, &series)?;

    if let Some(path) = &cli.data_out {
        fs::write(path, datafile::render(&histogram))
            .with_context(|| format!("failed to write data file {}", path.display()))?;
        info!("wrote {}", path.display());
    }

    let summary = Summary::compute(&records, &labels, &mapping.categories());
    print_summary(cli, &summary, histogram.resolution(), histogram.step_secs())
}

/// Replot mode: read a histogram data file, re-render, summarize.
fn run_replot(cli: &Cli, path: &Path) -> Result<()> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read data file {}", path.display()))?;
    let series = datafile::parse(&text)?;

    write_plot(cli, &series)?;

    let summary = Summary::from_series(&series.times_hours, &series.nodes, &series.labels);
    let step_secs = match series.times_hours.as_slice() {
        [first, second, ..] => (second - first) * 3600.0,
        _ => 0.0,
    };
    print_summary(cli, &summary, series.nodes.len(), step_secs)
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.data.clone() {
        Some(path) => run_replot(&cli, &path),
        None => run_pipeline(&cli),
    }
}
