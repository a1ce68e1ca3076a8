//! Common types used across seqsleuth

use crate::error::{CommonError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::num::NonZeroUsize;

/// Metadata mapping produced by every extractor.
///
/// Keys are sorted so that the serialized payload is stable across runs.
pub type Metadata = BTreeMap<String, serde_json::Value>;

// ============================================================================
// File Formats
// ============================================================================

/// Recognized genomic file formats.
///
/// The declaration order is the order in which batches are processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// Sequencing reads (plain or gzipped)
    Fastq,
    /// Binary alignments
    Bam,
    /// Variant calls (plain, gzipped, or BGZF)
    Vcf,
}

impl FileFormat {
    /// Every recognized format, in processing order
    pub const ALL: [FileFormat; 3] = [FileFormat::Fastq, FileFormat::Bam, FileFormat::Vcf];

    /// Lowercase tag as it appears in manifests and output file names
    pub fn as_str(self) -> &'static str {
        match self {
            FileFormat::Fastq => "fastq",
            FileFormat::Bam => "bam",
            FileFormat::Vcf => "vcf",
        }
    }

    /// Position of this format in [`FileFormat::ALL`]
    pub fn index(self) -> usize {
        match self {
            FileFormat::Fastq => 0,
            FileFormat::Bam => 1,
            FileFormat::Vcf => 2,
        }
    }

    /// Match a manifest tag case-insensitively, returning `None` for anything unrecognized
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        Self::ALL
            .into_iter()
            .find(|format| format.as_str().eq_ignore_ascii_case(tag))
    }

    /// Name of the output table for this format (e.g. `fastq_metadata.csv`)
    pub fn table_name(self) -> String {
        format!("{}_metadata.csv", self.as_str())
    }
}

impl std::str::FromStr for FileFormat {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_tag(s).ok_or_else(|| CommonError::UnknownFormat(s.to_string()))
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Read Limits
// ============================================================================

/// Default number of reads sampled from a FASTQ file
pub const DEFAULT_READ_LIMIT: u64 = 5;

/// How many records an extractor may read from a file.
///
/// On the command line this is an integer `>= -1` excluding zero, where `-1`
/// means "read everything".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadLimit {
    /// Read the whole file
    All,
    /// Read at most this many records (always at least one)
    First(u64),
}

impl ReadLimit {
    /// Build a limit from its integer form
    pub fn from_count(count: i64) -> Result<Self> {
        match count {
            -1 => Ok(ReadLimit::All),
            n if n >= 1 => Ok(ReadLimit::First(n as u64)),
            n => Err(CommonError::InvalidReadLimit(n.to_string())),
        }
    }

    /// Integer form of the limit (`-1` for unbounded)
    pub fn as_count(self) -> i64 {
        match self {
            ReadLimit::All => -1,
            ReadLimit::First(n) => n as i64,
        }
    }

    /// Whether the limit places no bound on the number of records
    pub fn is_unbounded(self) -> bool {
        matches!(self, ReadLimit::All)
    }

    /// Whether another record may be read after `already_read` records
    pub fn allows(self, already_read: u64) -> bool {
        match self {
            ReadLimit::All => true,
            ReadLimit::First(n) => already_read < n,
        }
    }
}

impl Default for ReadLimit {
    fn default() -> Self {
        ReadLimit::First(DEFAULT_READ_LIMIT)
    }
}

impl std::str::FromStr for ReadLimit {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self> {
        let count: i64 = s
            .trim()
            .parse()
            .map_err(|_| CommonError::InvalidReadLimit(s.to_string()))?;
        Self::from_count(count)
    }
}

impl std::fmt::Display for ReadLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_count())
    }
}

// ============================================================================
// Worker Counts
// ============================================================================

/// Concurrency limit for a worker pool.
///
/// Accepts any positive integer (including values above the number of CPU
/// cores, which helps network-bound work) or `all` for one worker per
/// available processing unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkerCount(NonZeroUsize);

impl WorkerCount {
    /// Create a worker count, rejecting zero
    pub fn new(count: usize) -> Result<Self> {
        NonZeroUsize::new(count)
            .map(Self)
            .ok_or_else(|| CommonError::InvalidWorkers(count.to_string()))
    }

    /// One worker per available processing unit
    pub fn all() -> Self {
        Self(std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN))
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for WorkerCount {
    fn default() -> Self {
        Self(NonZeroUsize::MIN)
    }
}

impl std::str::FromStr for WorkerCount {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::all());
        }
        let count: i64 = trimmed
            .parse()
            .map_err(|_| CommonError::InvalidWorkers(s.to_string()))?;
        if count < 1 {
            return Err(CommonError::InvalidWorkers(s.to_string()));
        }
        Self::new(count as usize)
    }
}

impl std::fmt::Display for WorkerCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
