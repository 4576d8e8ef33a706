//! éCO2mix CLI — terminal front end for the normalization and forecast
//! pipeline.
//!
//! Commands:
//! - `normalize` — load an upload file or a remote range, filter, preview, export CSV
//! - `models` — list the artifacts in the model directory with their features
//! - `forecast` — run one or more artifacts and compare against realized prices

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use eco2mix_core::data::{SourceEncoding, Window};
use eco2mix_core::{CanonicalFrame, ClockPolicy};
use eco2mix_runner::export::{export_canonical_csv, export_json, save_run};
use eco2mix_runner::{ForecastRun, Pipeline, PipelineConfig, SourceSpec};

#[derive(Parser)]
#[command(
    name = "eco2mix",
    about = "éCO2mix grid data normalization and spot-price forecast comparison"
)]
struct Cli {
    /// Config file. Defaults to ./eco2mix.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a source into the canonical schema and print a preview.
    Normalize {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        view: ViewArgs,

        #[command(flatten)]
        columns: ColumnArgs,

        /// Write the canonical frame as CSV to this path.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Number of rows to preview.
        #[arg(long, default_value_t = 10)]
        head: usize,
    },
    /// List available model artifacts.
    Models {
        /// Model directory. Overrides [models].directory.
        #[arg(long)]
        models_dir: Option<PathBuf>,
    },
    /// Forecast with one or more artifacts and compare with realized prices.
    Forecast {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        view: ViewArgs,

        /// Artifact name; repeat for several. Defaults to [models].default,
        /// then every artifact in the model directory.
        #[arg(long = "model")]
        models: Vec<String>,

        /// Model directory. Overrides [models].directory.
        #[arg(long)]
        models_dir: Option<PathBuf>,

        /// Ground-truth price file. Overrides [actuals].path.
        #[arg(long)]
        actuals: Option<PathBuf>,

        /// Wall-clock interpretation of canonical timestamps: utc or europe_paris.
        #[arg(long)]
        clock: Option<ClockPolicy>,

        /// Output directory. Overrides [output].directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Do not write previsions and run bundles.
        #[arg(long, default_value_t = false)]
        no_save: bool,

        /// Print each run as JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Tab-separated éCO2mix export to load.
    #[arg(long)]
    upload: Option<PathBuf>,

    /// Fetch from the remote API instead of reading a file.
    #[arg(long)]
    remote: bool,

    /// Range start for --remote (YYYY-MM-DD or "YYYY-MM-DD HH:MM"). Defaults to 7 days ago.
    #[arg(long)]
    start: Option<String>,

    /// Range end for --remote. Defaults to now.
    #[arg(long)]
    end: Option<String>,

    /// Upload encoding: latin-1, windows-1252 or utf-8. Overrides [source].encoding.
    #[arg(long)]
    encoding: Option<SourceEncoding>,
}

#[derive(Args)]
struct ViewArgs {
    /// Keep records from this date/time on.
    #[arg(long)]
    from: Option<String>,

    /// Keep records up to this date/time.
    #[arg(long)]
    to: Option<String>,

    /// Preset window ending at the newest record.
    #[arg(long, value_enum, conflicts_with_all = ["from", "to"])]
    window: Option<WindowArg>,
}

#[derive(Args)]
struct ColumnArgs {
    /// Comma-separated variables to keep, e.g. Consommation,Gaz.
    #[arg(long, value_delimiter = ',')]
    vars: Vec<String>,

    /// Keep the standard charting variables (Consommation, Gaz, Nucléaire...).
    #[arg(long, default_value_t = false, conflicts_with = "vars")]
    charted: bool,

    /// Drop rows where any of these columns is missing, e.g. Consommation.
    #[arg(long, value_delimiter = ',')]
    require: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum WindowArg {
    LastWeek,
    LastMonth,
}

impl From<WindowArg> for Window {
    fn from(w: WindowArg) -> Self {
        match w {
            WindowArg::LastWeek => Window::LastWeek,
            WindowArg::LastMonth => Window::LastMonth,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    let config = PipelineConfig::discover(cli.config.as_deref())?;
    log::debug!("configuration: {config:?}");

    match cli.command {
        Commands::Normalize {
            source,
            view,
            columns,
            output,
            head,
        } => run_normalize(config, source, view, columns, output, head),
        Commands::Models { models_dir } => run_models(config, models_dir),
        Commands::Forecast {
            source,
            view,
            models,
            models_dir,
            actuals,
            clock,
            output_dir,
            no_save,
            json,
        } => {
            let mut config = config;
            if let Some(dir) = models_dir {
                config.models.directory = dir;
            }
            if let Some(path) = actuals {
                config.actuals.path = path;
            }
            if let Some(clock) = clock {
                config.reconcile.clock = clock;
            }
            if let Some(dir) = output_dir {
                config.output.directory = dir;
            }
            run_forecast(config, source, view, models, !no_save, json)
        }
    }
}

fn run_normalize(
    mut config: PipelineConfig,
    source: SourceArgs,
    view: ViewArgs,
    columns: ColumnArgs,
    output: Option<PathBuf>,
    head: usize,
) -> Result<()> {
    if let Some(encoding) = source.encoding {
        config.source.encoding = encoding;
    }
    let pipeline = Pipeline::from_config(config)?;
    let frame = load_frame(&pipeline, &source)?;
    let frame = apply_view(&frame, &view)?;
    let frame = apply_columns(&frame, &columns);

    print_frame_summary(&frame);
    let preview = frame
        .to_dataframe()
        .context("failed to build preview table")?;
    println!("{}", preview.head(Some(head)));

    if let Some(path) = output {
        let csv = export_canonical_csv(&frame)?;
        std::fs::write(&path, csv).with_context(|| format!("failed to write {}", path.display()))?;
        println!("Canonical data written to: {}", path.display());
    }
    Ok(())
}

fn run_models(mut config: PipelineConfig, models_dir: Option<PathBuf>) -> Result<()> {
    if let Some(dir) = models_dir {
        config.models.directory = dir;
    }
    let pipeline = Pipeline::from_config(config)?;
    let names = pipeline.store().list()?;
    if names.is_empty() {
        println!(
            "No artifacts in {}",
            pipeline.config().models.directory.display()
        );
        return Ok(());
    }

    println!("{:<24} {:<10} FEATURES", "NAME", "KIND");
    for name in names {
        match pipeline.store().load(&name) {
            Ok(artifact) => println!(
                "{:<24} {:<10} {}",
                name,
                artifact.predictor_kind(),
                artifact.required_features().join(", ")
            ),
            Err(e) => println!("{name:<24} {:<10} {e}", "error"),
        }
    }
    Ok(())
}

fn run_forecast(
    mut config: PipelineConfig,
    source: SourceArgs,
    view: ViewArgs,
    models: Vec<String>,
    save: bool,
    json: bool,
) -> Result<()> {
    if let Some(encoding) = source.encoding {
        config.source.encoding = encoding;
    }
    let pipeline = Pipeline::from_config(config)?;
    let frame = load_frame(&pipeline, &source)?;
    let frame = apply_view(&frame, &view)?;
    let actuals = pipeline.load_actuals()?;

    let names = pipeline.resolve_artifacts(&models)?;
    if names.is_empty() {
        bail!(
            "no artifacts to run: pass --model or add models to {}",
            pipeline.config().models.directory.display()
        );
    }

    let mut failed = 0usize;
    for (name, result) in pipeline.run_many(&frame, &actuals, &names) {
        match result {
            Ok(run) => {
                if json {
                    println!("{}", export_json(&run)?);
                } else {
                    print_run(&run);
                }
                if save {
                    let output = &pipeline.config().output;
                    let dir = save_run(&run, &output.directory, &output.previsions_file)?;
                    println!("Run saved to: {}", dir.display());
                }
            }
            Err(failure) => {
                failed += 1;
                if json {
                    println!("{}", serde_json::to_string_pretty(&failure)?);
                } else {
                    eprintln!("{name}: {failure}");
                }
            }
        }
    }

    if failed > 0 {
        eprintln!("{failed} of {} artifact run(s) failed", names.len());
        std::process::exit(1);
    }
    Ok(())
}

fn load_frame(pipeline: &Pipeline, source: &SourceArgs) -> Result<CanonicalFrame> {
    let spec = match (&source.upload, source.remote) {
        (Some(path), false) => SourceSpec::Upload { path: path.clone() },
        (None, true) => {
            let now = chrono::Local::now().naive_local();
            let start = source
                .start
                .as_deref()
                .map(|s| parse_bound(s, NaiveTime::default()))
                .transpose()?
                .unwrap_or_else(|| now - chrono::Duration::days(7));
            let end = source
                .end
                .as_deref()
                .map(|s| parse_bound(s, end_of_day()))
                .transpose()?
                .unwrap_or(now);
            SourceSpec::Remote { start, end }
        }
        (Some(_), true) => bail!("--upload and --remote are mutually exclusive"),
        (None, false) => bail!("one of --upload or --remote is required"),
    };
    Ok(pipeline.load_source(&spec)?)
}

fn apply_view(frame: &CanonicalFrame, view: &ViewArgs) -> Result<CanonicalFrame> {
    let mut frame = match view.window {
        Some(w) => frame.window(w.into()),
        None => frame.clone(),
    };
    if view.from.is_some() || view.to.is_some() {
        let from = view
            .from
            .as_deref()
            .map(|s| parse_bound(s, NaiveTime::default()))
            .transpose()?
            .unwrap_or(NaiveDateTime::MIN);
        let to = view
            .to
            .as_deref()
            .map(|s| parse_bound(s, end_of_day()))
            .transpose()?
            .unwrap_or(NaiveDateTime::MAX);
        if to < from {
            bail!("--to is before --from");
        }
        frame = frame.between(from, to);
    }
    Ok(frame)
}

/// Row filtering runs before column selection so `--require` may name a
/// column that `--vars` leaves out.
fn apply_columns(frame: &CanonicalFrame, columns: &ColumnArgs) -> CanonicalFrame {
    let mut frame = frame.clone();
    if !columns.require.is_empty() {
        let required: Vec<&str> = columns.require.iter().map(String::as_str).collect();
        let before = frame.len();
        frame = frame.drop_missing(&required);
        log::info!(
            "dropped {} row(s) missing {}",
            before - frame.len(),
            columns.require.join(", ")
        );
    }
    if columns.charted {
        frame = frame.display_variables();
    } else if !columns.vars.is_empty() {
        let vars: Vec<&str> = columns.vars.iter().map(String::as_str).collect();
        frame = frame.select(&vars);
    }
    frame
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or_default()
}

/// A date alone takes `default_time`.
fn parse_bound(value: &str, default_time: NaiveTime) -> Result<NaiveDateTime> {
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(dt);
        }
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{value}' (expected YYYY-MM-DD[ HH:MM])"))?;
    Ok(date.and_time(default_time))
}

fn print_frame_summary(frame: &CanonicalFrame) {
    println!("=== Canonical Data ===");
    println!("Rows:    {}", frame.len());
    match (frame.first_datetime(), frame.last_datetime()) {
        (Some(first), Some(last)) => println!("Range:   {first} to {last}"),
        _ => println!("Range:   (empty)"),
    }
    println!("Columns: {}", frame.columns().join(", "));
    println!();
}

fn print_run(run: &ForecastRun) {
    println!("=== {} ===", run.artifact);
    println!("Features:      {}", run.features.join(", "));
    println!("Clock:         {}", run.clock);
    println!(
        "Rows:          {} canonical, {} forecast, {} aligned",
        run.canonical_rows, run.forecast_rows, run.aligned_rows
    );
    let fmt = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"));
    println!("MAE:           {}", fmt(run.stats.mae));
    println!("RMSE:          {}", fmt(run.stats.rmse));
    println!("Bias:          {}", fmt(run.stats.bias));
    println!("Dataset hash:  {}", run.dataset_hash);
    println!();

    if run.comparison.is_empty() {
        println!("No forecast matched a realized price.");
        println!();
        return;
    }
    println!(
        "{:<20} {:>12} {:>12} {:>10}",
        "DATETIME (UTC)", "PREDICTED", "ACTUAL", "ERROR"
    );
    for row in &run.comparison {
        println!(
            "{:<20} {:>12.2} {:>12.2} {:>10.2}",
            row.datetime.format("%Y-%m-%d %H:%M"),
            row.predicted,
            row.actual,
            row.error()
        );
    }
    println!();
}
