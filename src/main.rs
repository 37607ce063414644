use anyhow::Context;
use clap::{Parser, ValueEnum};
use gcodevm::{format_report, init_logging, GcodeVm, PerAxis, VmConfig};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(
    name = "gcodevm",
    about = "Evaluate a G-code program: run time, bounds and tool usage",
    version
)]
struct Args {
    /// G-code file to evaluate
    file: PathBuf,
    /// JSON machine configuration
    #[arg(long)]
    config: Option<PathBuf>,
    /// Axis letters, e.g. `xyz` or `xyza`
    #[arg(long)]
    axes: Option<String>,
    /// Maximum feed in mm/min; one value or one per axis, comma separated
    #[arg(long, value_delimiter = ',')]
    max_feed: Option<Vec<f64>>,
    /// Acceleration in mm/s²; one value or one per axis, comma separated
    #[arg(long, value_delimiter = ',')]
    acceleration: Option<Vec<f64>>,
    /// Minimum time per move in seconds
    #[arg(long)]
    min_move_time: Option<f64>,
    /// Time arcs over their length instead of their chord
    #[arg(long)]
    arc_length: bool,
    /// Report format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
    /// Log as JSON
    #[arg(long)]
    json_logs: bool,
}

fn per_axis(values: Vec<f64>) -> PerAxis {
    match values.as_slice() {
        [single] => PerAxis::Uniform(*single),
        _ => PerAxis::Axes(values),
    }
}

fn build_config(args: &Args) -> anyhow::Result<VmConfig> {
    let mut config = match &args.config {
        Some(path) => VmConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => VmConfig::default(),
    };
    if let Some(axes) = &args.axes {
        config = config.with_axes(axes.chars());
    }
    if let Some(values) = args.max_feed.clone() {
        config = config.with_max_feed(per_axis(values));
    }
    if let Some(values) = args.acceleration.clone() {
        config = config.with_acceleration(per_axis(values));
    }
    if let Some(seconds) = args.min_move_time {
        config = config.with_min_move_time(seconds);
    }
    if args.arc_length {
        config = config.with_arc_length_travel(true);
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.json_logs)?;

    let config = build_config(&args)?;
    let mut vm = GcodeVm::new(config).context("invalid machine configuration")?;
    let report = vm
        .run_file(&args.file)
        .with_context(|| format!("evaluating {}", args.file.display()))?;

    match args.format {
        OutputFormat::Text => print!("{}", format_report(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}
