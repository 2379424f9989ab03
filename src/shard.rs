//! Shard processing: stream one shard, test each document against the
//! blocklist, write the filtered (or annotated) copy, count removals.
//!
//! # Invariants
//! - Strictly streaming: one document resident at a time; shard size is not
//!   bounded by memory.
//! - Documents are processed and written in input order.
//! - No cross-shard state is touched except the shared tracker, and only
//!   through its single atomic claim operation.
//!
//! # Record policy
//! - Malformed line (bad JSON, missing `id`): skip, log at warn, keep going.
//!   Never fails the shard.
//! - `text` null or absent: written as non-contaminated without hashing.
//!   Hashing the absence of text would make every such document a "duplicate"
//!   of every other one.
//! - Empty string text is real text: it hashes and can match.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use crate::blocklist::BlocklistIndex;
use crate::document::{AttributeRecord, Document};
use crate::error::{Error, Result};
use crate::fingerprint::Fingerprint;
use crate::io::{ShardReader, ShardWriter};
use crate::tracker::OccurrenceTracker;

/// Per-shard outcome, owned by the worker until aggregation.
#[derive(Debug, Clone)]
pub struct ShardResult {
    pub shard: PathBuf,
    /// Documents marked contaminated in this shard.
    pub duplicates_removed: u64,
    /// Contaminated documents keyed by source label.
    pub duplicates_per_source: HashMap<String, u64>,
}

impl ShardResult {
    fn new(shard: PathBuf) -> Self {
        Self {
            shard,
            duplicates_removed: 0,
            duplicates_per_source: HashMap::new(),
        }
    }
}

/// Processes one shard. The output file lands in `out_dir` under the input
/// shard's file name (same codec, chosen by extension).
///
/// `tracker` is `Some` in deduplicate-keep-first mode and `None` in
/// decontaminate mode, where a blocklist hit is contaminated unconditionally.
///
/// Mid-shard I/O failures return [`Error::Shard`]; the caller treats them as
/// failing this shard only.
pub fn process_shard(
    shard: &Path,
    out_dir: &Path,
    blocklist: &BlocklistIndex,
    tracker: Option<&OccurrenceTracker>,
    attributes_only: bool,
) -> Result<ShardResult> {
    let file_name = shard
        .file_name()
        .ok_or_else(|| Error::shard(shard, io::Error::new(io::ErrorKind::InvalidInput, "shard path has no file name")))?;
    let out_path = out_dir.join(file_name);

    let reader = ShardReader::open(shard).map_err(|e| Error::shard(shard, e))?;
    let mut writer = ShardWriter::create(&out_path).map_err(|e| Error::shard(shard, e))?;

    let mut result = ShardResult::new(shard.to_path_buf());

    for (idx, line) in reader.enumerate() {
        let line = line.map_err(|e| Error::shard(shard, e))?;
        if line.trim().is_empty() {
            continue;
        }

        let doc: Document = match serde_json::from_str(&line) {
            Ok(doc) => doc,
            Err(err) => {
                tracing::warn!(
                    shard = %shard.display(),
                    line = idx + 1,
                    %err,
                    "skipping malformed record"
                );
                continue;
            }
        };

        let contaminated = match doc.text.as_deref() {
            None => false,
            Some(text) => match blocklist.lookup(&Fingerprint::of_text(text)) {
                None => false,
                Some(ordinal) => match tracker {
                    // Decontaminate: every match is contaminated.
                    None => true,
                    // Keep-first: the claim winner keeps its document.
                    Some(tracker) => !tracker.claim_or_reject(ordinal as usize),
                },
            },
        };

        if contaminated {
            result.duplicates_removed += 1;
            *result
                .duplicates_per_source
                .entry(doc.source_label().to_string())
                .or_insert(0) += 1;
        }

        if attributes_only {
            let source = doc.source_label().to_string();
            let record = AttributeRecord {
                id: doc.id,
                source,
                contaminated,
            };
            let json = serde_json::to_string(&record)
                .map_err(|e| Error::shard(shard, io::Error::other(e)))?;
            writer
                .write_line(&json)
                .map_err(|e| Error::shard(shard, e))?;
        } else if !contaminated {
            // Echo the raw line so fields this crate does not model survive.
            writer
                .write_line(&line)
                .map_err(|e| Error::shard(shard, e))?;
        }
    }

    writer.finish().map_err(|e| Error::shard(shard, e))?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;

    fn write_shard(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let mut f = fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(f, "{line}").unwrap();
        }
        path
    }

    fn read_lines(path: &Path) -> Vec<String> {
        ShardReader::open(path)
            .unwrap()
            .collect::<io::Result<_>>()
            .unwrap()
    }

    fn blocklist_of(texts: &[&str]) -> BlocklistIndex {
        BlocklistIndex::from_fingerprints(texts.iter().map(|t| Fingerprint::of_text(t)))
    }

    #[test]
    fn decontaminate_suppresses_every_match() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();
        let shard = write_shard(
            dir.path(),
            "s.jsonl",
            &[
                r#"{"id":"1","source":"web","text":"x"}"#,
                r#"{"id":"2","source":"web","text":"y"}"#,
                r#"{"id":"3","source":"books","text":"x"}"#,
            ],
        );
        let blocklist = blocklist_of(&["x"]);

        let result = process_shard(&shard, &out, &blocklist, None, false).unwrap();
        assert_eq!(result.duplicates_removed, 2);
        assert_eq!(result.duplicates_per_source["web"], 1);
        assert_eq!(result.duplicates_per_source["books"], 1);

        let lines = read_lines(&out.join("s.jsonl"));
        assert_eq!(lines, vec![r#"{"id":"2","source":"web","text":"y"}"#]);
    }

    #[test]
    fn keep_first_keeps_exactly_one_in_shard_order() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();
        let shard = write_shard(
            dir.path(),
            "s.jsonl",
            &[
                r#"{"id":"1","text":"x"}"#,
                r#"{"id":"2","text":"x"}"#,
                r#"{"id":"3","text":"x"}"#,
            ],
        );
        let blocklist = blocklist_of(&["x"]);
        let tracker = OccurrenceTracker::new(blocklist.len());

        let result = process_shard(&shard, &out, &blocklist, Some(&tracker), false).unwrap();
        assert_eq!(result.duplicates_removed, 2);

        // Within one shard, input order decides: id 1 survives.
        let lines = read_lines(&out.join("s.jsonl"));
        assert_eq!(lines, vec![r#"{"id":"1","text":"x"}"#]);
    }

    #[test]
    fn null_text_passes_through_and_never_claims() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();
        let shard = write_shard(
            dir.path(),
            "s.jsonl",
            &[
                r#"{"id":"1","text":null}"#,
                r#"{"id":"2"}"#,
                r#"{"id":"3","text":"x"}"#,
            ],
        );
        let blocklist = blocklist_of(&["x"]);
        let tracker = OccurrenceTracker::new(blocklist.len());

        let result = process_shard(&shard, &out, &blocklist, Some(&tracker), false).unwrap();
        assert_eq!(result.duplicates_removed, 0);
        // Only the real "x" occurrence claimed its slot.
        assert_eq!(tracker.claimed(), 1);

        let lines = read_lines(&out.join("s.jsonl"));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn empty_string_text_is_hashable() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();
        let shard = write_shard(dir.path(), "s.jsonl", &[r#"{"id":"1","text":""}"#]);
        let blocklist = blocklist_of(&[""]);

        let result = process_shard(&shard, &out, &blocklist, None, false).unwrap();
        assert_eq!(result.duplicates_removed, 1);
        assert!(read_lines(&out.join("s.jsonl")).is_empty());
    }

    #[test]
    fn malformed_lines_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();
        let shard = write_shard(
            dir.path(),
            "s.jsonl",
            &[
                "this is not json",
                r#"{"text":"missing id"}"#,
                r#"{"id":"1","text":"y"}"#,
            ],
        );
        let blocklist = blocklist_of(&["x"]);

        let result = process_shard(&shard, &out, &blocklist, None, false).unwrap();
        assert_eq!(result.duplicates_removed, 0);
        let lines = read_lines(&out.join("s.jsonl"));
        assert_eq!(lines, vec![r#"{"id":"1","text":"y"}"#]);
    }

    #[test]
    fn attributes_mode_writes_one_record_per_document() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();
        let shard = write_shard(
            dir.path(),
            "s.jsonl",
            &[
                r#"{"id":"1","source":"web","text":"x"}"#,
                r#"{"id":"2","text":"y"}"#,
                r#"{"id":"3","text":null}"#,
            ],
        );
        let blocklist = blocklist_of(&["x"]);

        let result = process_shard(&shard, &out, &blocklist, None, true).unwrap();
        assert_eq!(result.duplicates_removed, 1);
        assert_eq!(result.duplicates_per_source["web"], 1);

        let records: Vec<AttributeRecord> = read_lines(&out.join("s.jsonl"))
            .iter()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(records.len(), 3);
        assert!(records[0].contaminated);
        assert_eq!(records[0].source, "web");
        assert!(!records[1].contaminated);
        assert_eq!(records[1].source, "no_source");
        assert!(!records[2].contaminated);
    }

    #[test]
    fn unreadable_shard_is_shard_error() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();
        let blocklist = blocklist_of(&["x"]);

        let err = process_shard(
            Path::new("/nonexistent/shard.jsonl"),
            &out,
            &blocklist,
            None,
            false,
        )
        .unwrap_err();
        assert!(err.is_shard_failure());
    }

    #[test]
    fn truncated_gzip_shard_fails_mid_stream() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();
        // Garbage bytes with a .gz extension: the decoder errors on read.
        let shard = dir.path().join("bad.jsonl.gz");
        fs::write(&shard, b"\x1f\x8bthis is not a gzip stream").unwrap();
        let blocklist = blocklist_of(&["x"]);

        let err = process_shard(&shard, &out, &blocklist, None, false).unwrap_err();
        assert!(err.is_shard_failure());
    }
}
