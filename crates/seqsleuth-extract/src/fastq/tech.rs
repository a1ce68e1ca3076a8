//! Sequencing technology prediction from read headers
//!
//! Each platform writes read names in its own grammar. The predictor samples
//! the first headers of a file and takes a majority vote; when no grammar
//! matches, very long reads are attributed to nanopore sequencing.

use super::reader::{summarize, FastqRecord, HEADER_SAMPLE_SIZE};
use crate::error::Result;
use crate::registry::ExtractRequest;
use crate::source::SourceOpener;
use regex::Regex;
use seqsleuth_common::ReadLimit;
use std::sync::{Arc, LazyLock};
use tracing::debug;

/// Mean read length above which an unrecognized file is treated as long-read
pub const LONG_READ_THRESHOLD: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequencingTech {
    Illumina,
    PacBio,
    Ont,
    Mgi,
    Unknown,
}

impl SequencingTech {
    pub fn as_str(self) -> &'static str {
        match self {
            SequencingTech::Illumina => "illumina",
            SequencingTech::PacBio => "pacbio",
            SequencingTech::Ont => "ont",
            SequencingTech::Mgi => "mgi",
            SequencingTech::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SequencingTech {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compile one of the constant read-name grammars below
#[allow(clippy::expect_used)]
fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("read-name pattern is valid")
}

/// `A00123:8:H5KJ7DSXX:1:1101:10000:1000` (CASAVA 1.8+)
pub(crate) static ILLUMINA: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"^(?P<instrument>[\w-]+):(?P<run>\d+):(?P<flowcell>[\w-]+):(?P<lane>\d+):(?P<tile>\d+):\d+:\d+$")
});

/// `HWI-ST1234:8:1101:1234:5678#0/1` (pre-CASAVA 1.8)
pub(crate) static ILLUMINA_LEGACY: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"^(?P<instrument>[\w-]+):(?P<lane>\d+):(?P<tile>\d+):\d+:\d+(#[\w]*)?(/[12])?$")
});

/// `m64011_190830_220126/1/ccs` or `m54238_180628_014238/4194376/0_12345`
pub(crate) static PACBIO: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"^(?P<movie>m(?P<instrument>\d+)[eUu]?_\d{6}_\d{6}(_s\d)?)/(?P<zmw>\d+)(/(?P<kind>ccs|\d+_\d+))?")
});

/// Read UUIDs written by MinKNOW
pub(crate) static ONT: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
});

/// `V300012345L1C001R0010000001/1`
pub(crate) static MGI: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"^(?P<flowcell>[A-Z]{0,2}\d+)L(?P<lane>\d)C\d{3}R\d{3}\d+(/[12])?$")
});

/// Classify a single read header
pub fn classify_header(record: &FastqRecord) -> SequencingTech {
    let name = record.name();
    let description = record.description().unwrap_or("");

    if ONT.is_match(name) || description.contains("runid=") {
        SequencingTech::Ont
    } else if PACBIO.is_match(name) {
        SequencingTech::PacBio
    } else if MGI.is_match(name) {
        SequencingTech::Mgi
    } else if ILLUMINA.is_match(name) || ILLUMINA_LEGACY.is_match(name) {
        SequencingTech::Illumina
    } else {
        SequencingTech::Unknown
    }
}

/// Majority vote over sampled headers, falling back on read length
pub fn classify(records: &[FastqRecord], mean_length: f64) -> SequencingTech {
    let candidates = [
        SequencingTech::Illumina,
        SequencingTech::PacBio,
        SequencingTech::Ont,
        SequencingTech::Mgi,
    ];
    let mut votes = [0usize; 4];
    for record in records {
        let tech = classify_header(record);
        if let Some(slot) = candidates.iter().position(|c| *c == tech) {
            votes[slot] += 1;
        }
    }

    let winner = votes
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .max_by_key(|(_, count)| **count)
        .map(|(slot, _)| candidates[slot]);

    match winner {
        Some(tech) => tech,
        None if mean_length >= LONG_READ_THRESHOLD => SequencingTech::Ont,
        None => SequencingTech::Unknown,
    }
}

/// Predicts the sequencing technology of a FASTQ file
pub trait TechPredictor: Send + Sync {
    fn predict(&self, request: &ExtractRequest<'_>) -> Result<SequencingTech>;
}

/// Opens the file and classifies its first read headers
pub struct HeaderTechPredictor {
    opener: Arc<SourceOpener>,
}

impl HeaderTechPredictor {
    pub fn new(opener: Arc<SourceOpener>) -> Self {
        Self { opener }
    }
}

impl TechPredictor for HeaderTechPredictor {
    fn predict(&self, request: &ExtractRequest<'_>) -> Result<SequencingTech> {
        let reader = self.opener.open(request.locator)?;
        let sample_request = ExtractRequest {
            read_limit: ReadLimit::First(HEADER_SAMPLE_SIZE as u64),
            ..*request
        };
        let summary = summarize(reader, &sample_request)?;
        let tech = classify(&summary.sample, summary.mean_length());

        debug!(
            locator = %request.locator,
            tech = %tech,
            sampled = summary.reads,
            "Predicted sequencing technology"
        );
        Ok(tech)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(header: &str, length: usize) -> FastqRecord {
        FastqRecord {
            header: header.to_string(),
            length,
        }
    }

    #[test]
    fn test_classify_headers() {
        let cases = [
            ("A00123:8:H5KJ7DSXX:1:1101:10000:1000 1:N:0:ACGTACGT", SequencingTech::Illumina),
            ("HWI-ST1234:8:1101:1234:5678#0/1", SequencingTech::Illumina),
            ("m64011_190830_220126/1/ccs", SequencingTech::PacBio),
            ("m54238_180628_014238/4194376/0_12345", SequencingTech::PacBio),
            (
                "0a1b2c3d-1111-2222-3333-444455556666 runid=abc sampleid=HG002",
                SequencingTech::Ont,
            ),
            ("V300012345L1C001R0010000001/1", SequencingTech::Mgi),
            ("SRR1234567.1 1 length=150", SequencingTech::Unknown),
        ];

        for (header, expected) in cases {
            assert_eq!(classify_header(&record(header, 150)), expected, "{}", header);
        }
    }

    #[test]
    fn test_grammars_compile() {
        for grammar in [&ILLUMINA, &ILLUMINA_LEGACY, &PACBIO, &ONT, &MGI] {
            assert!(!grammar.as_str().is_empty());
        }
    }

    #[test]
    fn test_majority_vote() {
        let records = vec![
            record("A00123:8:H5KJ7DSXX:1:1101:10000:1000", 150),
            record("A00123:8:H5KJ7DSXX:1:1101:10000:1001", 150),
            record("weird-name", 150),
        ];
        assert_eq!(classify(&records, 150.0), SequencingTech::Illumina);
    }

    #[test]
    fn test_length_fallback() {
        let records = vec![record("read_1", 15_000)];
        assert_eq!(classify(&records, 15_000.0), SequencingTech::Ont);
        assert_eq!(classify(&records, 100.0), SequencingTech::Unknown);
        assert_eq!(classify(&[], 0.0), SequencingTech::Unknown);
    }
}
