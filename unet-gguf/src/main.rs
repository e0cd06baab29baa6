use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use unet_gguf::config::{ConvertConfig, DEFAULT_ARCH, DEFAULT_MODEL};

/// Convert a model checkpoint into a GGUF file
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Model file (.safetensors) or model directory
    #[arg(default_value = DEFAULT_MODEL)]
    model: PathBuf,

    /// Model kind stored as general.architecture
    #[arg(long, default_value = DEFAULT_ARCH)]
    arch: String,

    /// Output file, defaults to <model>.gguf
    #[arg(long)]
    out: Option<PathBuf>,

    /// Do not print per-layer progress
    #[arg(long)]
    quiet: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let config = ConvertConfig {
        input: args.model,
        output: args.out,
        arch: args.arch,
        progress: !args.quiet,
        ..ConvertConfig::default()
    };

    let output = unet_gguf::convert(&config)
        .with_context(|| format!("failed to convert {}", config.input.display()))?;
    println!("Model converted and saved to '{}'", output.display());
    Ok(())
}
