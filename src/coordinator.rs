//! Coordinator: bounded worker pool over shards, result aggregation.
//!
//! # Scheduling
//! A fixed pool of scoped OS threads pulls whole shards from a shared atomic
//! cursor; there is no work stealing within a shard. Pool size is
//! `min(workers, shard_count)` — a worker is bound to one shard at a time, so
//! oversizing only wastes threads.
//!
//! # Shared state
//! Workers share exactly three things: the read-only blocklist, the
//! occurrence tracker (mutated only through its atomic claim), and the result
//! channel. Output files are one per shard, never shared.
//!
//! # Failure model
//! A failing shard is reported and the run continues; the failed set comes
//! back in [`GlobalResult::failed_shards`]. Only configuration problems
//! (unreadable blocklist, missing shard paths, unusable output directory)
//! abort before any worker starts.
//!
//! # Ordering caveat
//! When a duplicated document spans shards in keep-first mode, which shard's
//! copy survives depends on worker scheduling. The survivor is always unique
//! but its identity is a race inherited from the parallel design; counts are
//! deterministic, identities are not.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;

use crate::blocklist::BlocklistIndex;
use crate::config::RunConfig;
use crate::error::{Error, Result};
use crate::shard::{process_shard, ShardResult};
use crate::tracker::OccurrenceTracker;

/// Aggregated outcome of a whole run.
#[derive(Debug, Default)]
pub struct GlobalResult {
    /// Sum of per-shard removal counts.
    pub duplicates_removed: u64,
    /// Per-source removal counts merged across shards.
    pub duplicates_per_source: HashMap<String, u64>,
    /// One entry per successfully processed shard.
    pub per_shard: Vec<ShardResult>,
    /// Shards that failed mid-processing, with their errors.
    pub failed_shards: Vec<(PathBuf, Error)>,
}

impl GlobalResult {
    pub fn all_succeeded(&self) -> bool {
        self.failed_shards.is_empty()
    }

    fn fold(&mut self, shard: ShardResult) {
        self.duplicates_removed += shard.duplicates_removed;
        for (source, count) in &shard.duplicates_per_source {
            *self
                .duplicates_per_source
                .entry(source.clone())
                .or_insert(0) += count;
        }
        self.per_shard.push(shard);
    }
}

/// Loads the blocklist from `path` and runs the configured filter pass.
pub fn run(config: &RunConfig, blocklist_path: &std::path::Path) -> Result<GlobalResult> {
    let blocklist = BlocklistIndex::load(blocklist_path)?;
    run_with_blocklist(config, &blocklist)
}

/// Runs the filter pass against an already-built blocklist.
pub fn run_with_blocklist(config: &RunConfig, blocklist: &BlocklistIndex) -> Result<GlobalResult> {
    // Fail on configuration before any worker starts.
    for shard in &config.input_shards {
        if !shard.is_file() {
            return Err(Error::config_io(
                shard,
                std::io::Error::new(std::io::ErrorKind::NotFound, "shard is not a file"),
            ));
        }
    }
    fs::create_dir_all(&config.output_dir)
        .map_err(|e| Error::config_io(&config.output_dir, e))?;

    let tracker = config
        .mode
        .keep_first_occurrence()
        .then(|| OccurrenceTracker::new(blocklist.len()));

    let shard_count = config.input_shards.len();
    let workers = config.workers.min(shard_count).max(1);
    tracing::info!(
        shards = shard_count,
        workers,
        blocklist = blocklist.len(),
        mode = ?config.mode,
        "starting run"
    );

    let start = Instant::now();
    let cursor = AtomicUsize::new(0);
    let (tx, rx) = crossbeam_channel::unbounded::<(PathBuf, Result<ShardResult>)>();

    let mut result = GlobalResult::default();
    thread::scope(|scope| {
        let cursor = &cursor;
        let shards = &config.input_shards;
        let tracker = tracker.as_ref();
        let out_dir = config.output_dir.as_path();
        let attributes_only = config.attributes_only;

        for _ in 0..workers {
            let tx = tx.clone();
            scope.spawn(move || loop {
                let idx = cursor.fetch_add(1, Ordering::Relaxed);
                if idx >= shards.len() {
                    break;
                }
                let shard = &shards[idx];
                let outcome = process_shard(shard, out_dir, blocklist, tracker, attributes_only);
                if tx.send((shard.clone(), outcome)).is_err() {
                    break;
                }
            });
        }
        drop(tx);

        // Drain as workers finish so per-shard progress streams instead of
        // arriving in one burst after the join.
        for (shard, outcome) in rx.iter() {
            match outcome {
                Ok(shard_result) => {
                    tracing::info!(
                        shard = %shard.display(),
                        removed = shard_result.duplicates_removed,
                        "shard complete"
                    );
                    result.fold(shard_result);
                }
                Err(err) => {
                    tracing::error!(shard = %shard.display(), %err, "shard failed");
                    result.failed_shards.push((shard, err));
                }
            }
        }
    });

    tracing::info!(
        total_removed = result.duplicates_removed,
        failed_shards = result.failed_shards.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "run complete"
    );
    Ok(result)
}
