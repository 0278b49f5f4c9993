// src/main.rs
use std::path::{Path, PathBuf};

use acceltrim::config::AppConfig;
use acceltrim::display::{render_view_png, PlotStyle, ViewWindow};
use acceltrim::edit::{EditPolicy, Selection, TrimPreview};
use acceltrim::export::{export_selection, export_series};
use acceltrim::ingest::{parse_generic, ImportReport, ImportedFile, RawLog, SensorHeader};
use acceltrim::types::SensorType;
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDateTime;
use clap::{ArgAction, Parser, Subcommand, ValueHint};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(author, version, about = "Trim and preview triaxial accelerometer logs", long_about = None)]
struct Cli {
    /// JSON config file; missing keys keep their defaults
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import logs and print their header and sample counts
    Inspect(InspectArgs),
    /// Cut ranges out of one log and export the result
    Trim(TrimArgs),
    /// Render a downsampled PNG of one log
    Preview(PreviewArgs),
}

#[derive(Parser, Debug)]
struct InspectArgs {
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    inputs: Vec<PathBuf>,

    /// Print one JSON object per file
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

#[derive(Parser, Debug)]
struct TrimArgs {
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Remove the sample range `a..b` (inclusive, repeatable)
    #[arg(long, value_parser = parse_span)]
    cut: Vec<(f64, f64)>,

    /// Keep only the sample range `a..b`
    #[arg(long, value_parser = parse_span)]
    keep: Option<(f64, f64)>,

    /// Remove samples between two timestamps, `start..end` (repeatable)
    #[arg(long)]
    cut_time: Vec<String>,

    /// Drop this many rows at the head
    #[arg(long, default_value_t = 0)]
    top: usize,

    /// Drop this many rows at the tail
    #[arg(long, default_value_t = 0)]
    bottom: usize,

    /// Export only the rows `a..b` of the result
    #[arg(long, value_parser = parse_span)]
    selection: Option<(f64, f64)>,

    /// Print the rows around the --top/--bottom cut lines and stop
    #[arg(long, action = ArgAction::SetTrue)]
    preview: bool,

    #[arg(short, long, required_unless_present = "preview", value_hint = ValueHint::DirPath)]
    out_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// First sample index of the window
    #[arg(long)]
    from: Option<f64>,

    /// Last sample index of the window
    #[arg(long)]
    to: Option<f64>,

    #[arg(short, long, default_value = "preview.png", value_hint = ValueHint::FilePath)]
    output: PathBuf,

    #[arg(long, default_value_t = 1200)]
    width: u32,

    #[arg(long, default_value_t = 450)]
    height: u32,

    /// Skip caption, axes and legend (no font needed)
    #[arg(long, action = ArgAction::SetTrue)]
    no_labels: bool,
}

fn parse_span(s: &str) -> Result<(f64, f64), String> {
    let (a, b) = s
        .split_once("..")
        .ok_or_else(|| format!("expected `start..end`, got {s:?}"))?;
    let a = a.trim().parse::<f64>().map_err(|e| format!("{a:?}: {e}"))?;
    let b = b.trim().parse::<f64>().map_err(|e| format!("{b:?}: {e}"))?;
    Ok((a, b))
}

fn parse_time_span(s: &str, header: &SensorHeader) -> Result<(NaiveDateTime, NaiveDateTime)> {
    let (a, b) = s
        .split_once("..")
        .ok_or_else(|| anyhow!("expected `start..end`, got {s:?}"))?;
    let parse = |v: &str| {
        header
            .date_format
            .as_ref()
            .and_then(|f| f.parse(v))
            .or_else(|| parse_generic(v))
            .ok_or_else(|| anyhow!("unrecognised timestamp {v:?}"))
    };
    Ok((parse(a)?, parse(b)?))
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load(path).context("loading config"),
        None => Ok(AppConfig::default()),
    }
}

fn open(path: &Path, config: &AppConfig) -> Result<ImportedFile> {
    let raw = RawLog::read(path)?;
    Ok(ImportedFile::from_raw(raw, &config.trim)?)
}

#[derive(Serialize)]
struct FileSummary<'a> {
    name: &'a str,
    size_bytes: u64,
    sensor_type: SensorType,
    header: &'a SensorHeader,
    report: ImportReport,
    first_timestamp: Option<NaiveDateTime>,
    last_timestamp: Option<NaiveDateTime>,
}

fn inspect(args: InspectArgs, config: &AppConfig) -> Result<()> {
    let mut failures = 0;
    for path in &args.inputs {
        let file = match open(path, config) {
            Ok(file) => file,
            Err(err) => {
                failures += 1;
                log::warn!("{err:#}");
                eprintln!("{}: {err:#}", path.display());
                continue;
            }
        };
        let ts = file.series.timestamps();
        let summary = FileSummary {
            name: &file.name,
            size_bytes: file.size_bytes,
            sensor_type: file.sensor_type,
            header: &file.header,
            report: file.report,
            first_timestamp: ts.first().copied(),
            last_timestamp: ts.last().copied(),
        };
        if args.json {
            println!("{}", serde_json::to_string(&summary)?);
        } else {
            println!("{}", file.name);
            println!("  device        {} ({:?})", file.header.device_name, file.sensor_type);
            println!("  sampling rate {} Hz", file.header.sampling_rate);
            if let (Some(first), Some(last)) = (summary.first_timestamp, summary.last_timestamp) {
                println!("  span          {first} .. {last}");
            }
            println!(
                "  samples       {} kept, {} dropped, {} skipped",
                file.report.kept, file.report.dropped, file.report.skipped
            );
        }
    }
    if failures == args.inputs.len() {
        return Err(anyhow!("no file could be imported"));
    }
    Ok(())
}

fn trim(args: TrimArgs, config: &AppConfig) -> Result<()> {
    let mut file = open(&args.input, config)?;
    for (min, max) in &args.cut {
        let sel = Selection::Index { min: *min, max: *max };
        acceltrim::edit::apply(&sel, EditPolicy::Cut, &mut file.series);
    }
    if let Some((min, max)) = args.keep {
        acceltrim::edit::apply(&Selection::Index { min, max }, EditPolicy::Keep, &mut file.series);
    }
    for span in &args.cut_time {
        let (start, end) = parse_time_span(span, &file.header)?;
        acceltrim::edit::apply(&Selection::Time { start, end }, EditPolicy::Cut, &mut file.series);
    }
    file.reset_marks();
    let total = file.series.len();
    file.marks.top_cut_line = args.top.min(total);
    file.marks.set_bottom_offset(args.bottom, total);
    if args.preview {
        print_trim_preview(&file.marks.preview(&file.lines()));
        return Ok(());
    }
    if args.top > 0 || args.bottom > 0 {
        acceltrim::edit::apply_trim(&mut file.series, &mut file.marks);
    }

    let out_dir = args.out_dir.ok_or_else(|| anyhow!("--out-dir is required to export"))?;
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;
    let out = match args.selection {
        Some((a, b)) => export_selection(
            &file,
            a.round() as isize,
            b.round() as isize,
            &out_dir,
            &config.export,
        )?,
        None => export_series(&file, &out_dir, &config.export)?,
    };
    println!(
        "{}: {} of {} samples kept -> {}",
        file.name,
        file.series.len(),
        file.series.original().len(),
        out.display()
    );
    Ok(())
}

fn print_trim_preview(preview: &TrimPreview) {
    let block = |title: &str, lines: &[String]| {
        println!("-- {title} ({} rows)", lines.len());
        for line in lines {
            println!("   {line}");
        }
    };
    if !preview.top_reaches_start {
        println!("   ...");
    }
    block("head: removed", &preview.top_removed);
    block("head: kept", &preview.top_kept);
    println!("   ...");
    block("tail: kept", &preview.bottom_kept);
    block("tail: removed", &preview.bottom_removed);
    if !preview.bottom_reaches_end {
        println!("   ...");
    }
}

fn preview(args: PreviewArgs, config: &AppConfig) -> Result<()> {
    let file = open(&args.input, config)?;
    let full = ViewWindow::full(&file.series);
    let window = ViewWindow::new(args.from.unwrap_or(full.min_x), args.to.unwrap_or(full.max_x));
    let view = window
        .rebuild(&file.series, &config.view)
        .ok_or_else(|| anyhow!("{} has no samples", file.name))?;
    let style = PlotStyle {
        width: args.width,
        height: args.height,
        labels: !args.no_labels,
        caption: file.name.clone(),
        ..PlotStyle::default()
    };
    let png = render_view_png(&view, &style)?;
    std::fs::write(&args.output, png)
        .with_context(|| format!("writing {}", args.output.display()))?;
    println!(
        "{}: samples {}..={} drawn with {} points per channel -> {}",
        file.name,
        view.start,
        view.end,
        view.z.len(),
        args.output.display()
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Inspect(args) => inspect(args, &config),
        Command::Trim(args) => trim(args, &config),
        Command::Preview(args) => preview(args, &config),
    }
}
