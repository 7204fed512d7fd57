//! CLI for `sidekick-codegen`.
//!
//! # Subcommands
//!
//! ```text
//! # Generate one or more libraries
//! sidekick generate --config secretmanager/.sidekick.toml
//!
//! # Print the resolved model as JSON
//! sidekick dump --config secretmanager/.sidekick.toml
//! ```

#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use rayon::prelude::*;
use sidekick_codegen::{build_model, generate, CancellationToken, LibraryConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Client library generator for Google-style APIs.
#[derive(Parser)]
#[command(name = "sidekick", version, about)]
enum Cli {
    /// Parse, transform, annotate and render one or more libraries.
    ///
    /// Libraries are independent and run in parallel.
    Generate(GenerateArgs),

    /// Print the resolved and transformed model of a library as JSON.
    Dump(DumpArgs),
}

#[derive(Parser)]
struct GenerateArgs {
    /// Library configuration file (`.sidekick.toml`). Repeatable.
    #[arg(short, long = "config", required = true)]
    configs: Vec<PathBuf>,

    /// Output directory, replacing `general.output`. Only valid with a
    /// single `--config`.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Keep generating the other libraries after one fails.
    #[arg(long)]
    keep_going: bool,
}

#[derive(Parser)]
struct DumpArgs {
    /// Library configuration file (`.sidekick.toml`).
    #[arg(short, long)]
    config: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match Cli::parse() {
        Cli::Generate(args) => run_generate(&args),
        Cli::Dump(args) => run_dump(&args),
    }
}

fn run_generate(args: &GenerateArgs) -> anyhow::Result<()> {
    if args.output.is_some() && args.configs.len() > 1 {
        bail!("--output requires exactly one --config");
    }
    let cancel = CancellationToken::new();

    let results: Vec<(&PathBuf, anyhow::Result<usize>)> = args
        .configs
        .par_iter()
        .map(|path| {
            let result = LibraryConfig::load(path)
                .and_then(|config| generate(&config, args.output.as_deref(), &cancel))
                .map(|written| written.len())
                .with_context(|| format!("Failed to generate {}", path.display()));
            if result.is_err() && !args.keep_going {
                cancel.cancel();
            }
            (path, result)
        })
        .collect();

    let mut failures = 0;
    for (path, result) in results {
        match result {
            Ok(files) => eprintln!("Generated {files} files for {}", path.display()),
            Err(e) => {
                failures += 1;
                eprintln!("Error: {e:#}");
            }
        }
    }
    if failures > 0 {
        bail!("{failures} of {} libraries failed", args.configs.len());
    }
    Ok(())
}

fn run_dump(args: &DumpArgs) -> anyhow::Result<()> {
    let config = LibraryConfig::load(&args.config)
        .with_context(|| format!("Failed to load config: {}", args.config.display()))?;
    let model = build_model(&config, &CancellationToken::new())
        .with_context(|| format!("Failed to build model for {}", args.config.display()))?;
    let json = serde_json::to_string_pretty(&model).context("Failed to serialize model")?;
    println!("{json}");
    Ok(())
}
