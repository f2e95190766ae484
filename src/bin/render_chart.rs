//! Headless chart rendering: load exports, compose, write HTML or JSON.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use battery_plotter::chart::{render_html_with, PlotlyScript, XInteraction};
use battery_plotter::{Pipeline, PlotSettings, SheetKind};

#[derive(Parser)]
#[command(name = "render-chart")]
#[command(about = "Render a dual-axis battery chart from cycler exports", version)]
struct Cli {
    /// Input workbooks, CSV/Parquet files or export folders
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Plot settings JSON file
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Sheet family to read: channel or statistics
    #[arg(long, value_parser = parse_sheet_kind)]
    sheet: Option<SheetKind>,

    /// X-axis column
    #[arg(long)]
    x: Option<String>,

    /// Plot the x column as a discrete counter (markers), like Cycle_Index
    #[arg(long)]
    discrete_x: bool,

    /// Left y-axis column (repeatable)
    #[arg(long)]
    left: Vec<String>,

    /// Right y-axis column (repeatable)
    #[arg(long)]
    right: Vec<String>,

    /// Graph title
    #[arg(long)]
    title: Option<String>,

    /// Note shown in the top-right corner
    #[arg(long)]
    notes: Option<String>,

    /// X-axis interaction: range-slider, drag-zoom or none
    #[arg(long)]
    interaction: Option<String>,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Inline this local plotly.min.js instead of referencing the CDN
    #[arg(long, value_name = "FILE")]
    plotly_js: Option<PathBuf>,

    /// Write the chart JSON instead of an HTML page
    #[arg(long)]
    json: bool,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_sheet_kind(value: &str) -> Result<SheetKind, String> {
    match value.to_ascii_lowercase().as_str() {
        "channel" => Ok(SheetKind::Channel),
        "statistics" | "stats" => Ok(SheetKind::Statistics),
        other => Err(format!("unknown sheet kind '{other}' (expected channel or statistics)")),
    }
}

fn load_settings(cli: &Cli) -> PlotSettings {
    match &cli.settings {
        Some(path) => match PlotSettings::from_json_file(path) {
            Ok(settings) => {
                info!("Loaded settings from: {}", path.display());
                settings
            }
            Err(e) => {
                warn!(
                    "Failed to load settings from {}: {e:#}, using defaults",
                    path.display()
                );
                PlotSettings::default()
            }
        },
        None => PlotSettings::default(),
    }
}

/// Command-line flags win over the settings file.
fn apply_overrides(settings: &mut PlotSettings, cli: &Cli) {
    if let Some(x) = &cli.x {
        settings.x_column = x.clone();
        settings.x_label = x.clone();
        if cli.sheet.is_none() {
            settings.sheet_kind = SheetKind::for_x_column(x);
        }
    }
    if cli.discrete_x {
        settings.discrete_x = true;
    }
    if let Some(kind) = cli.sheet {
        settings.sheet_kind = kind;
    }
    if !cli.left.is_empty() {
        settings.left_columns = cli.left.clone();
    }
    if !cli.right.is_empty() {
        settings.right_columns = cli.right.clone();
    }
    if let Some(title) = &cli.title {
        settings.graph_title = title.clone();
    }
    if let Some(notes) = &cli.notes {
        settings.notes = notes.clone();
    }
    if let Some(interaction) = &cli.interaction {
        settings.x_interaction = XInteraction::parse(interaction);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    let mut settings = load_settings(&cli);
    apply_overrides(&mut settings, &cli);

    let output = Pipeline::new(settings)
        .run(cli.files.clone())
        .context("rendering chart")?;

    for skipped in &output.skipped {
        eprintln!("Skipping {}: {}", skipped.path.display(), skipped.error);
    }
    info!(
        "Composed {} trace(s) from {} dataset(s)",
        output.chart.visible_traces().count(),
        output.datasets.len()
    );

    let body = if cli.json {
        serde_json::to_string_pretty(&output.chart).context("serializing chart")?
    } else {
        let script = match &cli.plotly_js {
            Some(path) => PlotlyScript::from_file(path).context("reading Plotly bundle")?,
            None => PlotlyScript::Cdn,
        };
        render_html_with(&output.chart, &script).context("rendering HTML")?
    };

    match &cli.output {
        Some(path) => {
            std::fs::write(path, body).with_context(|| format!("writing {}", path.display()))?;
            println!("Graph saved to: {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(body.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }

    Ok(())
}
