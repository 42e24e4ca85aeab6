//! The `analyze` command: run one photo through the analysis pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;

use faceclear_core::job::{JobStore, MemoryJobStore, TaskRunner};
use faceclear_core::{
    AnalysisPipeline, AnalyzeOptions, Config, ImageDecoder, IngressValidator, JobStatus,
    RetryPolicy, RustfaceLocator,
};

/// Arguments for the analyze command.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Image file to analyze (JPEG or PNG)
    pub image: PathBuf,

    /// Blur decision threshold (defaults to the configured value)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Analyze only: skip restoration and the enhanced output image
    #[arg(long)]
    pub no_correction: bool,

    /// Run through the deferred worker path with retry instead of inline
    #[arg(long)]
    pub deferred: bool,

    /// Where to write the enhanced+annotated image (PNG)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pretty-print the JSON summary
    #[arg(long)]
    pub pretty: bool,
}

/// Execute the analyze command.
pub async fn execute(args: AnalyzeArgs, config: Config) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.image)
        .with_context(|| format!("cannot read {}", args.image.display()))?;
    let file_name = args
        .image
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    // Upload-boundary checks happen before any job exists
    IngressValidator::new(config.limits.clone()).validate(file_name, &bytes)?;
    let raster = ImageDecoder::new(config.limits.clone()).decode(&bytes)?;

    let locator = RustfaceLocator::from_file(&config.model_path(), config.detector.clone())
        .context("face detection model unavailable (see `faceclear config show`)")?;
    let pipeline = Arc::new(AnalysisPipeline::new(Arc::new(locator), &config)?);
    let store = Arc::new(MemoryJobStore::new());
    let runner = TaskRunner::new(store.clone(), pipeline);

    let id = store.create(raster).await?;
    let options = AnalyzeOptions {
        threshold: args.threshold.unwrap_or(config.sharpness.threshold),
        apply_correction: !args.no_correction,
    };

    if args.deferred {
        let policy = RetryPolicy::from_config(&config.runner);
        let handle = runner.submit_async(id, options, policy)?;
        tracing::info!("Job {id} submitted to worker");
        // Single-process demo of the deferred path: wait for the worker
        // here instead of polling from another process.
        handle.wait().await;
    } else if let Err(e) = runner.run_sync(id, options).await {
        // The job record carries the failure; report it after printing
        // the summary below.
        tracing::error!("Analysis failed: {e}");
    }

    let job = store.get(id).await?;
    let summary = job.summary();
    let json = if args.pretty {
        serde_json::to_string_pretty(&summary)?
    } else {
        serde_json::to_string(&summary)?
    };
    println!("{json}");

    if let Some(path) = &args.output {
        match job.result_image() {
            Some(image) => {
                std::fs::write(path, image.encode_png()?)
                    .with_context(|| format!("cannot write {}", path.display()))?;
                tracing::info!("Wrote enhanced image to {}", path.display());
            }
            None => tracing::warn!("No enhanced image was produced; nothing written"),
        }
    }

    if job.status() == JobStatus::Failed {
        anyhow::bail!(
            "analysis failed: {}",
            job.error().unwrap_or("unknown error")
        );
    }
    Ok(())
}
