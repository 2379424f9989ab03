//! Error taxonomy for a dedup run.
//!
//! Two severities exist:
//! - Configuration errors ([`Error::ConfigIo`], [`Error::ConfigParse`]) are
//!   fatal and must surface before any worker starts.
//! - Shard errors ([`Error::Shard`]) fail exactly one shard; the coordinator
//!   keeps running the rest and reports the failed set at the end.
//!
//! Malformed records are deliberately *not* represented here: a line that does
//! not parse is skipped and logged inside the shard loop, never propagated.

use std::io;
use std::path::PathBuf;

/// Crate-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required input (blocklist, shard, output directory) is missing or
    /// unreadable. Aborts the whole run.
    #[error("config: cannot access {path:?}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A blocklist line is not a hex-encoded fingerprint. A corrupt blocklist
    /// poisons every membership decision, so this aborts the whole run.
    #[error("config: {path:?} line {line}: {reason}")]
    ConfigParse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// An I/O failure while reading or writing one shard. Fails that shard
    /// only; other shards are unaffected.
    #[error("shard {shard:?}: {source}")]
    Shard {
        shard: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn config_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::ConfigIo {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn shard(shard: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Shard {
            shard: shard.into(),
            source,
        }
    }

    /// Whether this error fails a single shard rather than the whole run.
    pub fn is_shard_failure(&self) -> bool {
        matches!(self, Error::Shard { .. })
    }
}
