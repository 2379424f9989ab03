//! Blocklist construction and the two driver policies.
//!
//! Both drivers reuse the same machinery and differ only in which corpus
//! feeds the blocklist:
//! - **Decontaminate**: fingerprint a *reference* corpus, block every match
//!   in the target corpus.
//! - **Deduplicate**: fingerprint the target corpus itself, block only
//!   fingerprints seen more than once, keep the first occurrence.
//!
//! The hashing pass is streaming and applies the same record policy as the
//! shard processor: malformed rows are skipped and logged, null text is
//! ignored. Any file error here is a configuration error — it happens before
//! filtering work starts.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::blocklist::BlocklistIndex;
use crate::config::RunConfig;
use crate::coordinator::{run_with_blocklist, GlobalResult};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::fingerprint::Fingerprint;
use crate::io::ShardReader;

/// Blocklist provenance and persistence knobs shared by both drivers.
#[derive(Clone, Debug, Default)]
pub struct BuilderOptions {
    /// Use this pre-built blocklist file instead of a hashing pass.
    pub blocklist_file: Option<PathBuf>,
    /// Persist the built blocklist here (one hex fingerprint per line).
    pub save_blocklist: Option<PathBuf>,
    /// Stop after producing the blocklist; skip the filter pass.
    pub build_blocklist_only: bool,
}

/// Streams every document in `paths` and counts fingerprint occurrences.
pub fn collect_fingerprint_counts(
    paths: &[PathBuf],
) -> Result<HashMap<Fingerprint, u64, ahash::RandomState>> {
    let mut counts: HashMap<Fingerprint, u64, ahash::RandomState> = HashMap::default();
    for path in paths {
        let reader = ShardReader::open(path).map_err(|e| Error::config_io(path, e))?;
        for (idx, line) in reader.enumerate() {
            let line = line.map_err(|e| Error::config_io(path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let doc: Document = match serde_json::from_str(&line) {
                Ok(doc) => doc,
                Err(err) => {
                    tracing::warn!(
                        file = %path.display(),
                        line = idx + 1,
                        %err,
                        "skipping malformed record in hashing pass"
                    );
                    continue;
                }
            };
            if let Some(text) = doc.text.as_deref() {
                *counts.entry(Fingerprint::of_text(text)).or_insert(0) += 1;
            }
        }
    }
    Ok(counts)
}

/// All distinct fingerprints, sorted for a deterministic blocklist file.
pub fn reference_blocklist(
    counts: &HashMap<Fingerprint, u64, ahash::RandomState>,
) -> Vec<Fingerprint> {
    let mut fps: Vec<Fingerprint> = counts.keys().copied().collect();
    fps.sort_unstable();
    fps
}

/// Only fingerprints that occur more than once — the true duplicates.
pub fn duplicate_blocklist(
    counts: &HashMap<Fingerprint, u64, ahash::RandomState>,
) -> Vec<Fingerprint> {
    let mut fps: Vec<Fingerprint> = counts
        .iter()
        .filter(|(_, &count)| count > 1)
        .map(|(fp, _)| *fp)
        .collect();
    fps.sort_unstable();
    fps
}

/// Writes a blocklist file, one lowercase hex fingerprint per line.
pub fn write_blocklist(path: &Path, fingerprints: &[Fingerprint]) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::config_io(path, e))?;
    let mut writer = BufWriter::new(file);
    for fp in fingerprints {
        writeln!(writer, "{fp}").map_err(|e| Error::config_io(path, e))?;
    }
    writer.flush().map_err(|e| Error::config_io(path, e))
}

fn build_index(
    corpus: &[PathBuf],
    select: fn(&HashMap<Fingerprint, u64, ahash::RandomState>) -> Vec<Fingerprint>,
    opts: &BuilderOptions,
) -> Result<BlocklistIndex> {
    if let Some(path) = &opts.blocklist_file {
        return BlocklistIndex::load(path);
    }
    let counts = collect_fingerprint_counts(corpus)?;
    let fps = select(&counts);
    tracing::info!(fingerprints = fps.len(), "blocklist built");
    if let Some(path) = &opts.save_blocklist {
        write_blocklist(path, &fps)?;
    }
    Ok(BlocklistIndex::from_fingerprints(fps))
}

/// Decontaminate driver: blocklist from `reference`, filter pass over
/// `config.input_shards` with no first-occurrence tracking.
///
/// Returns `None` when `build_blocklist_only` stopped before filtering.
pub fn decontaminate(
    reference: &[PathBuf],
    config: &RunConfig,
    opts: &BuilderOptions,
) -> Result<Option<GlobalResult>> {
    debug_assert!(!config.mode.keep_first_occurrence());
    let index = build_index(reference, reference_blocklist, opts)?;
    if opts.build_blocklist_only {
        return Ok(None);
    }
    run_with_blocklist(config, &index).map(Some)
}

/// Deduplicate driver: blocklist from the target corpus itself (count > 1),
/// filter pass over the same shards keeping first occurrences.
pub fn deduplicate(config: &RunConfig, opts: &BuilderOptions) -> Result<Option<GlobalResult>> {
    debug_assert!(config.mode.keep_first_occurrence());
    let index = build_index(&config.input_shards, duplicate_blocklist, opts)?;
    if opts.build_blocklist_only {
        return Ok(None);
    }
    run_with_blocklist(config, &index).map(Some)
}
