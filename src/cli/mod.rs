// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with clap.
// All pipeline logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `preview` — collates batches from a triplet file
//   2. `index`   — builds the cached oversampling index
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, IndexArgs, PreviewArgs};

/// The main CLI struct
#[derive(Parser, Debug)]
#[command(
    name = "embedding-batcher",
    version,
    about = "Turn (query, positive, hard-negative) JSONL triplets into padded training batches."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Preview(args) => run_preview(args),
            Commands::Index(args)   => run_index(args),
        }
    }
}

/// Handles the `preview` subcommand.
fn run_preview(args: PreviewArgs) -> Result<()> {
    use crate::application::preview_use_case::PreviewUseCase;

    tracing::info!("Previewing batches from: {}", args.data);

    let use_case  = PreviewUseCase::new(args.into_config()?);
    let summaries = use_case.execute()?;

    for (i, s) in summaries.iter().enumerate() {
        println!(
            "batch {:>3} | rows={:>4} | seq_len={:>5} | real={:>7} | pad={:>7} | wrapped={}",
            i, s.rows, s.seq_len, s.real_tokens, s.padded_tokens, s.autogenerated
        );
    }
    Ok(())
}

/// Handles the `index` subcommand.
fn run_index(args: IndexArgs) -> Result<()> {
    use crate::application::index_use_case::IndexUseCase;

    let report = IndexUseCase::new(args.into()).execute()?;
    println!(
        "Index ready: {} samples over {} records ({} distinct records used)",
        report.samples, report.records, report.distinct_records
    );
    Ok(())
}
