//! Shard-parallel, hash-based document deduplication and decontamination.
//!
//! ## Scope
//! This crate filters large sharded JSONL corpora against a blocklist of
//! content fingerprints (128-bit MD5 of each document's text). Two policies
//! share one engine: decontamination (blocklist from a separate reference
//! corpus, every match removed) and deduplication (blocklist from the corpus
//! itself, first occurrence kept).
//!
//! ## Key invariants
//! - Fingerprint equality over raw UTF-8 bytes is the only similarity notion;
//!   there is no normalization and no fuzzy matching.
//! - Blocklist ordinals are dense, unique, and immutable after load.
//! - In keep-first mode, exactly one occurrence per blocklisted fingerprint
//!   survives across all shards combined, arbitrated by a single atomic
//!   claim; survivor identity across shards is scheduling-dependent.
//! - Documents with null or absent text pass through unfiltered.
//! - A failing shard never aborts the run; failures are reported per shard.
//!
//! ## Run flow
//! ```text
//! corpus files -> fingerprint pass -> blocklist file / BlocklistIndex
//!                                          |
//! shards -> worker pool -> ShardProcessor (hash, lookup, claim) -> output shards
//!                |                              |
//!                +---- OccurrenceTracker <------+   (keep-first mode only)
//!                |
//!                +-> ShardResult -> Coordinator fold -> GlobalResult
//! ```
//!
//! ## Notable entry points
//! - [`builder::decontaminate`] / [`builder::deduplicate`]: driver policies.
//! - [`coordinator::run`] / [`coordinator::run_with_blocklist`]: filter pass.
//! - [`shard::process_shard`]: single-shard streaming core.
//! - [`tracker::OccurrenceTracker`]: the one piece of cross-worker state.

pub mod blocklist;
pub mod builder;
pub mod config;
pub mod coordinator;
pub mod document;
pub mod error;
pub mod fingerprint;
pub mod io;
pub mod shard;
pub mod tracker;

pub use blocklist::BlocklistIndex;
pub use builder::BuilderOptions;
pub use config::{Mode, RunConfig};
pub use coordinator::GlobalResult;
pub use document::{AttributeRecord, Document, NO_SOURCE};
pub use error::{Error, Result};
pub use fingerprint::Fingerprint;
pub use shard::ShardResult;
pub use tracker::OccurrenceTracker;
