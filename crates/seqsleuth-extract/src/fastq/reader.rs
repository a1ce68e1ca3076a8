//! Streaming FASTQ reader
//!
//! Keeps only what the read-name extractor needs: the first few headers and
//! running length statistics. Memory stays constant regardless of how many
//! reads the limit allows.

use crate::error::{ExtractorError, Result};
use crate::registry::ExtractRequest;
use seqsleuth_common::FileFormat;
use std::io::BufRead;

/// Headers retained for read-name parsing
pub const HEADER_SAMPLE_SIZE: usize = 100;

/// One FASTQ record, reduced to its header and sequence length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastqRecord {
    /// Header line without the leading `@`
    pub header: String,
    pub length: usize,
}

impl FastqRecord {
    /// Read name (header up to the first whitespace)
    pub fn name(&self) -> &str {
        self.header.split_whitespace().next().unwrap_or("")
    }

    /// Header text after the read name, if any
    pub fn description(&self) -> Option<&str> {
        self.header
            .split_once(char::is_whitespace)
            .map(|(_, rest)| rest.trim())
            .filter(|rest| !rest.is_empty())
    }
}

/// Record-at-a-time FASTQ parser
pub struct FastqReader<R: BufRead> {
    reader: R,
    header: String,
    sequence: String,
    separator: String,
    quality: String,
    records_read: u64,
}

impl<R: BufRead> FastqReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            header: String::with_capacity(256),
            sequence: String::with_capacity(256),
            separator: String::with_capacity(8),
            quality: String::with_capacity(256),
            records_read: 0,
        }
    }

    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Read the next record, or `None` at end of input
    pub fn next_record(&mut self) -> Result<Option<FastqRecord>> {
        self.header.clear();
        self.sequence.clear();
        self.separator.clear();
        self.quality.clear();

        // Tolerate blank lines between records and at end of file
        loop {
            if self.reader.read_line(&mut self.header)? == 0 {
                return Ok(None);
            }
            if !self.header.trim().is_empty() {
                break;
            }
            self.header.clear();
        }

        let record = self.records_read + 1;
        let lines = [
            (&mut self.sequence, "sequence"),
            (&mut self.separator, "separator"),
            (&mut self.quality, "quality"),
        ];
        for (line, what) in lines {
            if self.reader.read_line(line)? == 0 {
                return Err(ExtractorError::malformed(
                    FileFormat::Fastq,
                    record,
                    format!("unexpected end of file before {} line", what),
                ));
            }
        }

        let header = self.header.trim_end();
        let Some(header) = header.strip_prefix('@') else {
            return Err(ExtractorError::malformed(
                FileFormat::Fastq,
                record,
                "expected '@' at start of header",
            ));
        };

        if !self.separator.starts_with('+') {
            return Err(ExtractorError::malformed(
                FileFormat::Fastq,
                record,
                "expected '+' at start of separator",
            ));
        }

        let length = self.sequence.trim_end().len();
        let quality_length = self.quality.trim_end().len();
        if length != quality_length {
            return Err(ExtractorError::malformed(
                FileFormat::Fastq,
                record,
                format!(
                    "sequence length ({}) != quality length ({})",
                    length, quality_length
                ),
            ));
        }

        self.records_read = record;
        Ok(Some(FastqRecord {
            header: header.to_string(),
            length,
        }))
    }
}

/// What a bounded pass over a FASTQ file saw
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FastqSummary {
    /// First [`HEADER_SAMPLE_SIZE`] records
    pub sample: Vec<FastqRecord>,
    pub reads: u64,
    pub total_length: u64,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

impl FastqSummary {
    fn observe(&mut self, record: FastqRecord) {
        self.reads += 1;
        self.total_length += record.length as u64;
        self.min_length = Some(self.min_length.map_or(record.length, |m| m.min(record.length)));
        self.max_length = Some(self.max_length.map_or(record.length, |m| m.max(record.length)));
        if self.sample.len() < HEADER_SAMPLE_SIZE {
            self.sample.push(record);
        }
    }

    pub fn mean_length(&self) -> f64 {
        if self.reads == 0 {
            0.0
        } else {
            self.total_length as f64 / self.reads as f64
        }
    }
}

/// Read up to `request.read_limit` records, checking for cancellation between records
pub fn summarize<R: BufRead>(reader: R, request: &ExtractRequest<'_>) -> Result<FastqSummary> {
    let mut fastq = FastqReader::new(reader);
    let mut summary = FastqSummary::default();

    while request.read_limit.allows(fastq.records_read()) {
        request.ensure_active()?;
        match fastq.next_record()? {
            Some(record) => summary.observe(record),
            None => break,
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use seqsleuth_common::ReadLimit;
    use std::io::Cursor;
    use tokio_util::sync::CancellationToken;

    const READS: &str = "@r1 desc\nACGT\n+\nIIII\n\n@r2\nACGTAC\n+r2\nIIIIII\n@r3\nA\n+\nI\n";

    #[test]
    fn test_reads_records() {
        let mut reader = FastqReader::new(Cursor::new(READS));

        let first = reader.next_record().unwrap().unwrap();
        assert_eq!(first.name(), "r1");
        assert_eq!(first.description(), Some("desc"));
        assert_eq!(first.length, 4);

        let second = reader.next_record().unwrap().unwrap();
        assert_eq!(second.header, "r2");
        assert_eq!(second.description(), None);

        assert!(reader.next_record().unwrap().is_some());
        assert!(reader.next_record().unwrap().is_none());
        assert_eq!(reader.records_read(), 3);
    }

    #[test]
    fn test_rejects_length_mismatch() {
        let mut reader = FastqReader::new(Cursor::new("@r1\nACGT\n+\nII\n"));
        let err = reader.next_record().unwrap_err();
        assert!(err.to_string().contains("quality length"));
    }

    #[test]
    fn test_rejects_truncated_record() {
        let mut reader = FastqReader::new(Cursor::new("@r1\nACGT\n"));
        assert!(matches!(
            reader.next_record(),
            Err(ExtractorError::Malformed { record: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_missing_marker() {
        let mut reader = FastqReader::new(Cursor::new(">r1\nACGT\n+\nIIII\n"));
        assert!(reader.next_record().is_err());
    }

    #[test]
    fn test_summarize_respects_limit() {
        let cancel = CancellationToken::new();

        let request = ExtractRequest::new("x.fastq", ReadLimit::First(2), &cancel);
        let summary = summarize(Cursor::new(READS), &request).unwrap();
        assert_eq!(summary.reads, 2);
        assert_eq!(summary.min_length, Some(4));
        assert_eq!(summary.max_length, Some(6));
        assert_eq!(summary.mean_length(), 5.0);

        let request = ExtractRequest::new("x.fastq", ReadLimit::All, &cancel);
        let summary = summarize(Cursor::new(READS), &request).unwrap();
        assert_eq!(summary.reads, 3);
        assert_eq!(summary.sample.len(), 3);
    }

    #[test]
    fn test_summarize_stops_when_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let request = ExtractRequest::new("x.fastq", ReadLimit::All, &cancel);
        assert!(matches!(
            summarize(Cursor::new(READS), &request),
            Err(ExtractorError::Cancelled)
        ));
    }
}
