mod batch;
mod capture;
mod config;
mod dump;

use anyhow::Context;
use batch::digitize_all;
use clap::Parser;
use common::setup_logging;
use config::DigitizeConfig;
use preprocess::Pipeline;
use std::fs;
use std::path::PathBuf;

/// Turn saved digit drawings into model input tensors.
#[derive(Parser, Debug)]
#[command(name = "digitize", version)]
struct Args {
    /// Glob pattern of input drawings (PNG or JPEG)
    input: String,

    /// Directory the tensors and manifest.json are written to
    #[arg(short, long, default_value = "tensors")]
    output: PathBuf,

    /// Stop after this many drawings
    #[arg(long)]
    limit: Option<usize>,

    /// Print an ASCII preview of each tensor
    #[arg(long)]
    preview: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = DigitizeConfig::from_env()?;

    setup_logging(config.log_format);

    tracing::info!(config = ?config, "Loaded configuration");

    let pipeline = Pipeline::new(config.pipeline_config()?)?;

    let mut paths = glob::glob(&args.input)
        .with_context(|| format!("Invalid glob pattern {}", args.input))?
        .collect::<Result<Vec<_>, _>>()?;
    paths.sort();
    if let Some(limit) = args.limit {
        paths.truncate(limit);
    }

    if paths.is_empty() {
        tracing::warn!(pattern = %args.input, "No drawings matched");
        return Ok(());
    }

    fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;

    let report = digitize_all(
        &pipeline,
        &config.preset,
        &paths,
        &args.output,
        args.preview,
    )?;

    tracing::info!(
        written = report.written,
        failed = report.failed.len(),
        "Tensors written"
    );
    println!(
        "Processed {} drawings, tensors saved to {}",
        report.written,
        args.output.display()
    );

    if !report.failed.is_empty() {
        anyhow::bail!("{} drawings could not be preprocessed", report.failed.len());
    }

    Ok(())
}
