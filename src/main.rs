//! colorit CLI - colorize grayscale photographs with a pretrained network.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use colorit::image::{default_output_path, is_supported_input, save_image};
use colorit::{ModelArtifacts, Predictor, TaskRunner};

/// Colorize grayscale photographs with a pretrained neural network.
#[derive(Parser, Debug)]
#[command(name = "colorit")]
#[command(version, about, long_about = None)]
struct Args {
    /// Input image path (jpg, jpeg, png or bmp).
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output image path (.jpg or .png). Defaults to colorized_<input name>
    /// next to the input.
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Directory containing the model artifacts.
    #[arg(long, value_name = "DIR")]
    model_dir: Option<PathBuf>,

    /// Also write the grayscale display rendition to this path.
    #[arg(long, value_name = "PATH")]
    grayscale: Option<PathBuf>,

    /// Output JPEG quality (1-100).
    #[arg(short, long, default_value = "95", value_name = "INT")]
    quality: u8,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("colorit={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(err) = run(&args) {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(args: &Args) -> Result<()> {
    // Validate inputs before the model is loaded
    if !args.input.exists() {
        anyhow::bail!("Input file does not exist: {}", args.input.display());
    }
    if !is_supported_input(&args.input) {
        anyhow::bail!("Unsupported input type: {}", args.input.display());
    }
    if !(1..=100).contains(&args.quality) {
        anyhow::bail!("Quality must be between 1 and 100");
    }

    let artifacts = ModelArtifacts::locate(args.model_dir.clone());
    let predictor =
        Predictor::load(&artifacts).context("Failed to load the colorization model")?;

    let (runner, mut deliveries) =
        TaskRunner::spawn(Arc::new(predictor)).context("Failed to start the worker")?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    spinner.set_message(format!("Colorizing {}...", args.input.display()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    runner.submit(&args.input)?;
    let delivery = deliveries
        .wait()
        .context("Worker exited without delivering a result")?;
    spinner.finish_and_clear();

    let result = delivery.outcome.context("Colorization failed")?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));
    save_image(&result.colorized, &output, args.quality)?;

    if let Some(grayscale) = &args.grayscale {
        save_image(&result.grayscale_display, grayscale, args.quality)?;
    }

    println!(
        "Successfully colorized {} -> {}",
        result.source_name,
        output.display()
    );

    Ok(())
}
