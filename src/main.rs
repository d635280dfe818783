// SPDX-FileCopyrightText: 2024 Joshua Jewell
// SPDX-License-Identifier: MIT

//! Campus VQA Builder: training data for a building recognition assistant.
//!
//! SUBCOMMANDS:
//! 1. **normalize**: resize and rename the source photographs, write the
//!    image manifest.
//! 2. **build**: expand the manifest into bilingual conversation samples
//!    and write seeded train/validation partitions plus a provenance card.
//! 3. **pipeline**: both of the above against one output directory.

use anyhow::{Context, Result};
use campus_vqa::dataset::DatasetBuilder;
use campus_vqa::manifest::MANIFEST_FILE;
use campus_vqa::normalize::{Normalizer, TargetSize, DEFAULT_QUALITY};
use campus_vqa::split::DEFAULT_TRAIN_RATIO;
use campus_vqa::{BuildingCatalog, DialogueCheck};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_DATASET_FILE: &str = "hku_campus_dataset.json";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resize source images and write the manifest
    Normalize {
        #[command(flatten)]
        images: ImageArgs,
    },
    /// Build train/validation files from a manifest
    Build {
        #[arg(long, help = "Path to image_info.json produced by `normalize`")]
        manifest: PathBuf,

        #[arg(
            long,
            help = "Dataset path; <stem>_train.json, <stem>_val.json and <stem>_meta.json are written beside it"
        )]
        output: PathBuf,

        #[command(flatten)]
        dataset: DatasetArgs,
    },
    /// Run normalize then build into one output directory
    Pipeline {
        #[command(flatten)]
        images: ImageArgs,

        #[arg(long, help = "Dataset path (default: <output>/hku_campus_dataset.json)")]
        dataset_path: Option<PathBuf>,

        #[command(flatten)]
        dataset: DatasetArgs,
    },
}

#[derive(Args, Debug)]
struct ImageArgs {
    #[arg(long, help = "Directory with one subdirectory of photos per building")]
    source: PathBuf,

    #[arg(long, help = "Output directory for images/ and image_info.json")]
    output: PathBuf,

    #[arg(long, default_value_t = TargetSize::default().width)]
    width: u32,

    #[arg(long, default_value_t = TargetSize::default().height)]
    height: u32,

    #[arg(
        long,
        default_value_t = DEFAULT_QUALITY,
        value_parser = clap::value_parser!(u8).range(1..=100),
        help = "JPEG quality"
    )]
    quality: u8,
}

#[derive(Args, Debug)]
struct DatasetArgs {
    #[arg(long, help = "Building catalog TOML (default: built-in catalog)")]
    catalog: Option<PathBuf>,

    #[arg(long, help = "Shuffle seed; random and recorded in the card when omitted")]
    seed: Option<u64>,

    #[arg(long, default_value_t = DEFAULT_TRAIN_RATIO)]
    train_ratio: f64,

    #[arg(long, help = "Fail when a dialogue references an image missing from the manifest")]
    strict_dialogues: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campus_vqa=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match Cli::parse().command {
        Command::Normalize { images } => normalize(&images),
        Command::Build {
            manifest,
            output,
            dataset,
        } => build(&manifest, &output, &dataset),
        Command::Pipeline {
            images,
            dataset_path,
            dataset,
        } => {
            normalize(&images)?;
            let output = dataset_path.unwrap_or_else(|| images.output.join(DEFAULT_DATASET_FILE));
            build(&images.output.join(MANIFEST_FILE), &output, &dataset)
        }
    }
}

fn normalize(args: &ImageArgs) -> Result<()> {
    let (_, report) = Normalizer::new(&args.source, &args.output)
        .with_target(TargetSize {
            width: args.width,
            height: args.height,
        })
        .with_quality(args.quality)
        .run()
        .with_context(|| format!("Failed to normalize images from {}", args.source.display()))?;

    tracing::info!(
        processed = report.processed(),
        skipped = report.skipped(),
        "Images ready"
    );
    Ok(())
}

fn build(manifest: &Path, output: &Path, args: &DatasetArgs) -> Result<()> {
    let catalog = match &args.catalog {
        Some(path) => BuildingCatalog::from_file(path)
            .with_context(|| format!("Failed to load catalog {}", path.display()))?,
        None => BuildingCatalog::builtin().context("Built-in catalog is invalid")?,
    };

    let policy = if args.strict_dialogues {
        DialogueCheck::Strict
    } else {
        DialogueCheck::Warn
    };

    let report = DatasetBuilder::new(manifest, output, catalog)
        .with_seed(args.seed)
        .with_train_ratio(args.train_ratio)
        .with_dialogue_check(policy)
        .build()
        .with_context(|| format!("Failed to build dataset from {}", manifest.display()))?;

    let stats = &report.card.statistics;
    tracing::info!(
        total = stats.total_samples,
        templates = stats.template_samples,
        dialogues = stats.dialogue_samples,
        seed = report.card.split.seed,
        train = %report.paths.train.display(),
        val = %report.paths.val.display(),
        "Dataset ready"
    );
    Ok(())
}
