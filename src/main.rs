use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use clap::{Args, Parser, Subcommand};
use image::ImageReader;
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

use pharmalens::checkpoint::{self, SelectionPolicy};
use pharmalens::debug::DebugConfig;
use pharmalens::error::CheckpointError;
use pharmalens::{DetectorKind, OcrEngineKind, Pipeline, PipelineConfig, PipelineOutcome, RunOptions};

#[derive(Parser)]
#[command(name = "pharmalens")]
#[command(about = "Recognize pharmaceutical packages in photographs")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Detect, classify and optionally verify the package in each image
    Predict(PredictArgs),
    /// List training checkpoints and show which one a policy selects
    Checkpoints(CheckpointArgs),
}

#[derive(Args)]
struct PredictArgs {
    /// Input image files
    #[arg(value_name = "IMAGE", required = true)]
    images: Vec<PathBuf>,

    /// JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Label file (overrides the config)
    #[arg(long, value_name = "FILE")]
    vocabulary: Option<PathBuf>,

    /// Verify the classification by reading the package text
    #[arg(long)]
    verify: bool,

    /// Minimum detection confidence in [0, 1]
    #[arg(long, value_parser = parse_threshold)]
    threshold: Option<f32>,

    /// Pixels added around the detected box before classifying
    #[arg(long)]
    padding: Option<u32>,

    /// Package localizer to use
    #[arg(long, value_enum, default_value_t = DetectorKind::Model)]
    detector: DetectorKind,

    /// OCR backend (overrides the config)
    #[arg(long, value_enum)]
    ocr_engine: Option<OcrEngineKind>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Number of most probable labels to list
    #[arg(long, default_value_t = 5)]
    top: usize,

    /// Save debug outputs to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,
}

#[derive(Args)]
struct CheckpointArgs {
    /// Directory holding the checkpoint directories
    #[arg(value_name = "DIR")]
    dir: PathBuf,

    /// Ranking used to pick a checkpoint
    #[arg(long, value_enum, default_value_t = SelectionPolicy::Ordinal)]
    policy: SelectionPolicy,

    /// Name prefix of checkpoint directories
    #[arg(long, default_value = checkpoint::DEFAULT_PREFIX)]
    prefix: String,
}

#[derive(Serialize)]
struct Report {
    image: PathBuf,
    #[serde(flatten)]
    outcome: PipelineOutcome,
}

fn parse_threshold(s: &str) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|e| format!("{e}"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is not in [0, 1]"))
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let default_level = if verbose { "pharmalens=debug" } else { "pharmalens=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Predict(args) => predict(args).await,
        Command::Checkpoints(args) => list_checkpoints(&args),
    }
}

async fn predict(args: PredictArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(vocabulary) = args.vocabulary {
        config.vocabulary = vocabulary;
    }
    if let Some(engine) = args.ocr_engine {
        config.ocr.engine = engine;
    }

    let debug = args.debug_out.map(DebugConfig::new).transpose()?.map(Arc::new);

    let options = RunOptions {
        use_verification: args.verify || config.ocr.enabled,
        detection_threshold: args.threshold.unwrap_or(config.detection.threshold),
        padding: args.padding.unwrap_or(config.inference.padding),
        return_image: config.inference.return_image || debug.is_some(),
    };

    // One pipeline for every image, so the OCR backend is built at most once
    let pipeline = Arc::new(Pipeline::from_config(&config, args.detector)?);

    let mut handles = Vec::new();
    for (i, path) in args.images.into_iter().enumerate() {
        let pipeline = pipeline.clone();
        let debug = debug.clone();
        handles.push(tokio::task::spawn_blocking(move || -> anyhow::Result<Report> {
            let img = ImageReader::open(&path)?
                .decode()
                .map_err(|e| anyhow::anyhow!("Failed to decode image {}: {}", path.display(), e))?;

            let outcome = pipeline.run(&img, &options)?;

            if let Some(debug) = &debug {
                debug.save(&debug_name(i, &path), &img, &outcome)?;
            }
            Ok(Report {
                image: path,
                outcome,
            })
        }));
    }

    let mut reports = Vec::with_capacity(handles.len());
    for handle in handles {
        reports.push(handle.await??);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_report(report, args.top);
        }
    }

    Ok(())
}

fn debug_name(index: usize, path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    format!("{:02}_{}", index + 1, stem)
}

fn print_report(report: &Report, top: usize) {
    let outcome = &report.outcome;
    println!("\n=== {} ===", report.image.display());

    let Some(label) = &outcome.label else {
        match outcome.error {
            Some(error) => println!("No result: {}", error),
            None => println!("No result."),
        }
        return;
    };

    println!(
        "Package: {} (confidence: {:.2}%)",
        label,
        outcome.confidence.unwrap_or(0.0) * 100.0
    );
    if let Some(confidence) = outcome.detection_confidence {
        println!("Detection confidence: {:.2}%", confidence * 100.0);
    }
    if let Some(bbox) = &outcome.bbox {
        println!(
            "Box: ({:.0}, {:.0}) - ({:.0}, {:.0})",
            bbox.x1, bbox.y1, bbox.x2, bbox.y2
        );
    }
    if let Some(verification) = &outcome.verification {
        let mark = if outcome.verified() { " [confirmed]" } else { "" };
        println!("Verification: {}{}", verification, mark);
    }

    if top > 0 {
        println!("Top {}:", top);
        for entry in outcome.top_k(top) {
            println!("  {}: {:.2}%", entry.label, entry.probability * 100.0);
        }
    }
}

fn format_time(time: Option<SystemTime>) -> String {
    let Some(time) = time else {
        return "-".to_string();
    };
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetDateTime::from(time)
        .to_offset(offset)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "-".to_string())
}

fn list_checkpoints(args: &CheckpointArgs) -> anyhow::Result<()> {
    let candidates = checkpoint::discover(&args.dir, &args.prefix)?;

    println!("Checkpoints in {}:", args.dir.display());
    for candidate in &candidates {
        println!(
            "  {:<32} step={:<8} modified={}",
            candidate.name,
            candidate.ordinal(),
            format_time(candidate.modified)
        );
    }

    let chosen = checkpoint::resolve(&candidates, args.policy).ok_or_else(|| {
        CheckpointError::NoCheckpointFound {
            dir: args.dir.clone(),
        }
    })?;
    println!("\nSelected ({:?}): {}", args.policy, chosen.path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_dirs_are_numbered_by_argument_order() {
        assert_eq!(debug_name(0, Path::new("photos/box.jpg")), "01_box");
        assert_eq!(debug_name(11, Path::new("scan.png")), "12_scan");
    }
}
