use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use likeness_core::{compare, Embedder, Pipeline, ServiceKind};
use serde_json::json;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "likeness", about = "Compare and embed images with the likeness models")]
struct Cli {
    /// Which model to use: face or general
    #[arg(short, long, env = "LIKENESS_SERVICE", default_value = "face")]
    service: ServiceKind,

    /// Directory holding the ONNX model files
    #[arg(short, long, env = "LIKENESS_MODEL_DIR")]
    model_dir: Option<PathBuf>,

    /// ONNX Runtime intra-op threads
    #[arg(long, env = "LIKENESS_INTRA_THREADS", default_value_t = 2)]
    intra_threads: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two images and print the verdict
    Compare {
        image1: PathBuf,
        image2: PathBuf,
    },
    /// Print the normalised embedding of one image
    Embed {
        image: PathBuf,
    },
    /// Show the loaded model and service contract
    Info,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let profile = cli.service.profile();
    let model_dir = cli.model_dir.unwrap_or_else(likeness_core::default_model_dir);

    let embedder = likeness_core::load_embedder(cli.service, &model_dir, cli.intra_threads)
        .with_context(|| format!("loading {} model from {}", cli.service, model_dir.display()))?;
    let mut pipeline = Pipeline::new(embedder);

    let output = match cli.command {
        Commands::Compare { image1, image2 } => {
            let first = embed_file(&mut pipeline, &image1)?;
            let second = embed_file(&mut pipeline, &image2)?;
            let (Some(a), Some(b)) = (first, second) else {
                bail!(profile.not_detected_pair);
            };
            serde_json::to_value(compare(profile, &a, &b)?)?
        }
        Commands::Embed { image } => {
            let Some(embedding) = embed_file(&mut pipeline, &image)? else {
                bail!(profile.not_detected_single);
            };
            json!({
                "embedding_dim": embedding.dim(),
                "embedding_vector": embedding.values,
            })
        }
        Commands::Info => json!({
            "service": cli.service.to_string(),
            "version": env!("CARGO_PKG_VERSION"),
            "model_version": pipeline.model_version(),
            "embedding_dim": pipeline.dim(),
            "threshold": profile.reported_threshold(),
            "compare_route": profile.compare_route,
            "embed_route": profile.embed_route,
        }),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn embed_file<E: Embedder>(
    pipeline: &mut Pipeline<E>,
    path: &Path,
) -> Result<Option<likeness_core::Embedding>> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    pipeline
        .embed(&bytes)
        .with_context(|| format!("embedding {}", path.display()))
}
