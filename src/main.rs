//! Corpus dedup/decontamination CLI.
//!
//! Subcommands mirror the two driver policies plus a hashing utility:
//!
//! - `decontaminate`: remove documents whose text appears in a reference
//!   corpus (or a pre-built blocklist file).
//! - `deduplicate`: remove repeated documents within a corpus, keeping one
//!   occurrence per fingerprint.
//! - `hashes`: print one hex fingerprint per document, for building
//!   blocklists with external tooling.
//!
//! # Exit Codes
//!
//! - `0`: run completed, no shard failed
//! - `1`: run completed but one or more shards failed
//! - `2`: configuration error (nothing was processed)

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dedup_rs::{builder, BuilderOptions, Document, Fingerprint, GlobalResult, Mode, RunConfig};

#[derive(Parser)]
#[command(
    name = "dedup-rs",
    version,
    about = "Shard-parallel hash dedup/decontamination for JSONL corpora"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Remove documents matching a blocklist built from a reference corpus.
    Decontaminate {
        /// Reference corpus files to build the blocklist from.
        #[arg(long, num_args = 1.., value_name = "FILE")]
        reference: Vec<PathBuf>,
        /// Pre-built blocklist file (mutually exclusive with --reference).
        #[arg(long, conflicts_with = "reference", value_name = "FILE")]
        blocklist: Option<PathBuf>,
        /// Target shards to filter.
        #[arg(long, num_args = 1.., required = true, value_name = "FILE")]
        shards: Vec<PathBuf>,
        /// Output directory for filtered shards.
        #[arg(long, value_name = "DIR")]
        out: PathBuf,
        /// Write {id, source, contaminated} records instead of documents.
        #[arg(long)]
        attributes_only: bool,
        /// Worker threads (default: CPU count, clamped to shard count).
        #[arg(long, value_name = "N")]
        workers: Option<usize>,
        /// Persist the built blocklist to this file.
        #[arg(long, value_name = "FILE")]
        save_blocklist: Option<PathBuf>,
        /// Build the blocklist and stop.
        #[arg(long, requires = "reference")]
        build_blocklist_only: bool,
    },

    /// Remove repeated documents within a corpus, keeping the first
    /// occurrence of each.
    Deduplicate {
        /// Corpus shards; both the blocklist source and the filter target.
        #[arg(long, num_args = 1.., required = true, value_name = "FILE")]
        shards: Vec<PathBuf>,
        /// Pre-built duplicates blocklist (skips the hashing pass).
        #[arg(long, value_name = "FILE")]
        blocklist: Option<PathBuf>,
        #[arg(long, value_name = "DIR")]
        out: PathBuf,
        #[arg(long)]
        attributes_only: bool,
        #[arg(long, value_name = "N")]
        workers: Option<usize>,
        #[arg(long, value_name = "FILE")]
        save_blocklist: Option<PathBuf>,
        #[arg(long)]
        build_blocklist_only: bool,
    },

    /// Print the hex fingerprint of each document's text, one per line.
    Hashes {
        /// JSONL file (optionally .gz / .zst compressed).
        file: PathBuf,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    match real_main(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            tracing::error!("{err:#}");
            std::process::exit(2);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Returns `Ok(true)` when no shard failed.
fn real_main(cli: Cli) -> anyhow::Result<bool> {
    match cli.cmd {
        Cmd::Decontaminate {
            reference,
            blocklist,
            shards,
            out,
            attributes_only,
            workers,
            save_blocklist,
            build_blocklist_only,
        } => {
            if reference.is_empty() && blocklist.is_none() {
                bail!("specify either --reference or --blocklist");
            }
            let mut config = RunConfig::new(Mode::Decontaminate, shards, out);
            config.attributes_only = attributes_only;
            if let Some(workers) = workers {
                config.workers = workers;
            }
            let opts = BuilderOptions {
                blocklist_file: blocklist,
                save_blocklist,
                build_blocklist_only,
            };
            report(builder::decontaminate(&reference, &config, &opts)?)
        }

        Cmd::Deduplicate {
            shards,
            blocklist,
            out,
            attributes_only,
            workers,
            save_blocklist,
            build_blocklist_only,
        } => {
            let mut config = RunConfig::new(Mode::DeduplicateKeepFirst, shards, out);
            config.attributes_only = attributes_only;
            if let Some(workers) = workers {
                config.workers = workers;
            }
            let opts = BuilderOptions {
                blocklist_file: blocklist,
                save_blocklist,
                build_blocklist_only,
            };
            report(builder::deduplicate(&config, &opts)?)
        }

        Cmd::Hashes { file } => {
            let reader = dedup_rs::io::ShardReader::open(&file)
                .with_context(|| format!("cannot open {file:?}"))?;
            for (idx, line) in reader.enumerate() {
                let line = line.with_context(|| format!("read error in {file:?}"))?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<Document>(&line) {
                    Ok(doc) => match doc.text.as_deref() {
                        Some(text) => println!("{}", Fingerprint::of_text(text)),
                        None => {
                            tracing::warn!(line = idx + 1, id = %doc.id, "null text, no fingerprint")
                        }
                    },
                    Err(err) => {
                        tracing::warn!(line = idx + 1, %err, "skipping malformed record")
                    }
                }
            }
            Ok(true)
        }
    }
}

/// Prints the run summary; returns whether every shard succeeded.
fn report(result: Option<GlobalResult>) -> anyhow::Result<bool> {
    let Some(result) = result else {
        // --build-blocklist-only stopped before filtering.
        return Ok(true);
    };

    for shard in &result.per_shard {
        println!(
            "{} documents matched in {}",
            shard.duplicates_removed,
            shard.shard.display()
        );
    }
    let mut per_source: Vec<_> = result.duplicates_per_source.iter().collect();
    per_source.sort();
    for (source, count) in per_source {
        println!("{count} documents were matched from {source}");
    }
    println!(
        "A total of {} documents were matched",
        result.duplicates_removed
    );

    if !result.all_succeeded() {
        eprintln!("{} shard(s) failed:", result.failed_shards.len());
        for (shard, err) in &result.failed_shards {
            eprintln!("  {}: {err}", shard.display());
        }
    }
    Ok(result.all_succeeded())
}
