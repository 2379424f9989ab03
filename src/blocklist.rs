//! Blocklist index: fingerprint -> stable ordinal.
//!
//! # Invariants
//! - Ordinals are dense `0..len` in load order and never change after load.
//! - Duplicate lines in the input file collapse to the first ordinal. This is
//!   deliberate: a blocklist built by concatenating hash dumps may repeat
//!   entries, and membership must not care.
//! - The index is read-only after construction; workers share it behind a
//!   plain reference with no locking.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Error, Result};
use crate::fingerprint::Fingerprint;

/// Immutable fingerprint set with stable dense ordinals.
#[derive(Debug, Default)]
pub struct BlocklistIndex {
    ordinals: HashMap<Fingerprint, u32, ahash::RandomState>,
}

impl BlocklistIndex {
    /// Loads a blocklist file: one hex fingerprint per line, ordinal =
    /// position of first occurrence. Blank lines are skipped; a line that is
    /// not a fingerprint is a configuration error (a corrupt blocklist would
    /// silently miss matches for the rest of the run).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::config_io(path, e))?;
        let reader = BufReader::new(file);

        let mut ordinals: HashMap<Fingerprint, u32, ahash::RandomState> = HashMap::default();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| Error::config_io(path, e))?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let fp = Fingerprint::parse_hex(line).map_err(|e| Error::ConfigParse {
                path: path.to_path_buf(),
                line: idx + 1,
                reason: e.to_string(),
            })?;
            let next = ordinals.len() as u32;
            ordinals.entry(fp).or_insert(next);
        }

        Ok(Self { ordinals })
    }

    /// Builds an index directly from fingerprints, ordinal = iteration order
    /// (first occurrence wins, as with `load`).
    pub fn from_fingerprints(fingerprints: impl IntoIterator<Item = Fingerprint>) -> Self {
        let mut ordinals: HashMap<Fingerprint, u32, ahash::RandomState> = HashMap::default();
        for fp in fingerprints {
            let next = ordinals.len() as u32;
            ordinals.entry(fp).or_insert(next);
        }
        Self { ordinals }
    }

    /// O(1) expected membership test; `Some(ordinal)` addresses the
    /// occurrence tracker.
    #[inline]
    pub fn lookup(&self, fp: &Fingerprint) -> Option<u32> {
        self.ordinals.get(fp).copied()
    }

    /// Number of distinct fingerprints (and tracker slots needed).
    pub fn len(&self) -> usize {
        self.ordinals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordinals.is_empty()
    }
}
