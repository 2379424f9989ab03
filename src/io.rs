//! Codec-aware shard I/O.
//!
//! Shards are line-oriented JSON, optionally compressed. The codec is chosen
//! from the file extension (`.gz` gzip, `.zst`/`.zstd` zstd, anything else
//! plain), and output shards mirror the input shard's codec so a filtered
//! corpus keeps the layout of the original. Readers stream one line at a
//! time; shard size is never bounded by memory.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use zstd::stream::read::Decoder as ZstdDecoder;
use zstd::stream::write::Encoder as ZstdEncoder;

/// Compression codec, sniffed from a path's extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Codec {
    Plain,
    Gzip,
    Zstd,
}

impl Codec {
    pub fn detect(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("gz") => Codec::Gzip,
            Some("zst") | Some("zstd") => Codec::Zstd,
            _ => Codec::Plain,
        }
    }
}

enum Decoder {
    Plain(BufReader<File>),
    Gzip(BufReader<MultiGzDecoder<File>>),
    Zstd(BufReader<ZstdDecoder<'static, BufReader<File>>>),
}

impl Decoder {
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        match self {
            Decoder::Plain(r) => r.read_line(buf),
            Decoder::Gzip(r) => r.read_line(buf),
            Decoder::Zstd(r) => r.read_line(buf),
        }
    }
}

/// Streaming line reader over a possibly-compressed shard.
///
/// Iteration yields each line without its trailing newline.
pub struct ShardReader {
    inner: Decoder,
}

impl ShardReader {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let inner = match Codec::detect(path) {
            Codec::Plain => Decoder::Plain(BufReader::new(file)),
            Codec::Gzip => Decoder::Gzip(BufReader::new(MultiGzDecoder::new(file))),
            Codec::Zstd => Decoder::Zstd(BufReader::new(ZstdDecoder::new(file)?)),
        };
        Ok(Self { inner })
    }
}

impl Iterator for ShardReader {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut buf = String::new();
        match self.inner.read_line(&mut buf) {
            Ok(0) => None,
            Ok(_) => {
                while buf.ends_with('\n') || buf.ends_with('\r') {
                    buf.pop();
                }
                Some(Ok(buf))
            }
            Err(err) => Some(Err(err)),
        }
    }
}

enum Encoder {
    Plain(BufWriter<File>),
    Gzip(BufWriter<GzEncoder<File>>),
    Zstd(BufWriter<ZstdEncoder<'static, File>>),
}

/// Line writer for one output shard.
///
/// `create` truncates any existing file, so rerunning over an output directory
/// that holds an incomplete shard from an interrupted run overwrites it
/// cleanly. [`finish`](Self::finish) must be called to flush codec trailers;
/// dropping without it may truncate compressed output.
pub struct ShardWriter {
    inner: Encoder,
}

impl ShardWriter {
    /// Creates the output shard at `path`, compressing per the extension.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let inner = match Codec::detect(path) {
            Codec::Plain => Encoder::Plain(BufWriter::new(file)),
            Codec::Gzip => Encoder::Gzip(BufWriter::new(GzEncoder::new(
                file,
                Compression::default(),
            ))),
            Codec::Zstd => Encoder::Zstd(BufWriter::new(ZstdEncoder::new(file, 0)?)),
        };
        Ok(Self { inner })
    }

    /// Writes one line plus a trailing newline.
    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        match &mut self.inner {
            Encoder::Plain(w) => {
                w.write_all(line.as_bytes())?;
                w.write_all(b"\n")
            }
            Encoder::Gzip(w) => {
                w.write_all(line.as_bytes())?;
                w.write_all(b"\n")
            }
            Encoder::Zstd(w) => {
                w.write_all(line.as_bytes())?;
                w.write_all(b"\n")
            }
        }
    }

    /// Flushes buffers and writes the codec trailer.
    pub fn finish(self) -> io::Result<()> {
        match self.inner {
            Encoder::Plain(mut w) => w.flush(),
            Encoder::Gzip(w) => {
                let enc = w.into_inner().map_err(|e| e.into_error())?;
                enc.finish()?;
                Ok(())
            }
            Encoder::Zstd(w) => {
                let enc = w.into_inner().map_err(|e| e.into_error())?;
                enc.finish()?;
                Ok(())
            }
        }
    }
}
