//! Run configuration, abstracted from the CLI surface.

use std::path::PathBuf;

/// Which policy produced the blocklist, and therefore how matches are
/// treated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Blocklist built from a *reference* corpus. Every match is contaminated;
    /// there is no first-occurrence concept and no shared tracker.
    Decontaminate,
    /// Blocklist built from the target corpus itself (true duplicates only).
    /// The first occurrence of each fingerprint survives; the occurrence
    /// tracker arbitrates which worker saw it first.
    DeduplicateKeepFirst,
}

impl Mode {
    /// Whether this mode keeps the first occurrence of each blocklisted
    /// fingerprint (and therefore needs the shared tracker).
    pub fn keep_first_occurrence(self) -> bool {
        matches!(self, Mode::DeduplicateKeepFirst)
    }
}

/// Configuration for one filtering run over a set of shards.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub mode: Mode,
    /// Emit `{id, source, contaminated}` audit records instead of filtered
    /// documents.
    pub attributes_only: bool,
    /// Upper bound on worker threads; the pool never exceeds the shard count.
    pub workers: usize,
    pub input_shards: Vec<PathBuf>,
    pub output_dir: PathBuf,
}

impl RunConfig {
    pub fn new(mode: Mode, input_shards: Vec<PathBuf>, output_dir: PathBuf) -> Self {
        Self {
            mode,
            attributes_only: false,
            workers: num_cpus::get(),
            input_shards,
            output_dir,
        }
    }
}
