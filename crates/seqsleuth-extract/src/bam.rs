//! BAM header metadata
//!
//! Only the header is read: the `BAM\1` magic, the SAM header text and the
//! binary reference dictionary. Alignment records are never decoded, so the
//! read limit does not apply to this format.

use crate::error::{ExtractorError, Result};
use crate::reference;
use crate::registry::{ExtractRequest, FormatExtractor};
use crate::source::SourceOpener;
use seqsleuth_common::{FileFormat, Metadata};
use serde_json::json;
use std::collections::BTreeSet;
use std::io::{self, Read};
use std::sync::Arc;
use tracing::debug;

const BAM_MAGIC: &[u8; 4] = b"BAM\x01";

/// Upper bound on the SAM header text we are willing to buffer
const MAX_HEADER_TEXT: usize = 256 * 1024 * 1024;

/// Upper bound on a single reference name (including the NUL)
const MAX_REFERENCE_NAME: usize = 64 * 1024;

/// Entry of the binary reference dictionary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub name: String,
    pub length: u64,
}

/// Decoded BAM header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BamHeader {
    pub text: String,
    pub references: Vec<Reference>,
}

/// Read the BAM header from a decompressed stream
pub fn read_header<R: Read>(reader: &mut R, request: &ExtractRequest<'_>) -> Result<BamHeader> {
    let mut magic = [0u8; 4];
    read_exact(reader, &mut magic, "magic")?;
    if &magic != BAM_MAGIC {
        return Err(ExtractorError::invalid_header(
            FileFormat::Bam,
            format!("expected magic {:?}, got {:?}", BAM_MAGIC, magic),
        ));
    }

    let text_len = read_length(reader, "header text length", MAX_HEADER_TEXT)?;
    let mut text = vec![0u8; text_len];
    read_exact(reader, &mut text, "header text")?;
    let text = String::from_utf8_lossy(&text)
        .trim_end_matches('\0')
        .to_string();

    let n_ref = read_i32(reader, "reference count")?;
    if n_ref < 0 {
        return Err(ExtractorError::invalid_header(
            FileFormat::Bam,
            format!("negative reference count {}", n_ref),
        ));
    }

    let mut references = Vec::with_capacity((n_ref as usize).min(4096));
    for _ in 0..n_ref {
        request.ensure_active()?;
        references.push(read_reference(reader)?);
    }

    Ok(BamHeader { text, references })
}

fn read_reference<R: Read>(reader: &mut R) -> Result<Reference> {
    let name_len = read_length(reader, "reference name length", MAX_REFERENCE_NAME)?;
    if name_len == 0 {
        return Err(ExtractorError::invalid_header(
            FileFormat::Bam,
            "empty reference name",
        ));
    }

    let mut name = vec![0u8; name_len];
    read_exact(reader, &mut name, "reference name")?;
    if name.pop() != Some(0) {
        return Err(ExtractorError::invalid_header(
            FileFormat::Bam,
            "reference name not NUL-terminated",
        ));
    }

    let length = read_i32(reader, "reference length")?;
    if length < 0 {
        return Err(ExtractorError::invalid_header(
            FileFormat::Bam,
            format!("negative reference length {}", length),
        ));
    }

    Ok(Reference {
        name: String::from_utf8_lossy(&name).into_owned(),
        length: length as u64,
    })
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => {
            ExtractorError::invalid_header(FileFormat::Bam, format!("truncated {}", what))
        },
        _ => ExtractorError::Io(e),
    })
}

fn read_i32<R: Read>(reader: &mut R, what: &str) -> Result<i32> {
    let mut bytes = [0u8; 4];
    read_exact(reader, &mut bytes, what)?;
    Ok(i32::from_le_bytes(bytes))
}

fn read_length<R: Read>(reader: &mut R, what: &str, max: usize) -> Result<usize> {
    let len = read_i32(reader, what)?;
    if len < 0 || len as usize > max {
        return Err(ExtractorError::invalid_header(
            FileFormat::Bam,
            format!("implausible {} {}", what, len),
        ));
    }
    Ok(len as usize)
}

/// Tag values of every header line of `record_type`
fn tag_values<'a>(text: &'a str, record_type: &'a str, tag: &'a str) -> impl Iterator<Item = &'a str> {
    text.lines()
        .filter(move |line| line.split('\t').next() == Some(record_type))
        .filter_map(move |line| {
            line.split('\t')
                .skip(1)
                .find_map(|field| field.strip_prefix(tag)?.strip_prefix(':'))
        })
}

/// `PN VN` of a `@PG` line, falling back to its `ID`
fn program_label(line: &str) -> Option<String> {
    let tag = |name: &str| {
        line.split('\t')
            .skip(1)
            .find_map(|field| field.strip_prefix(name)?.strip_prefix(':'))
    };
    let name = tag("PN").or_else(|| tag("ID"))?;
    Some(match tag("VN") {
        Some(version) => format!("{} {}", name, version),
        None => name.to_string(),
    })
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    values.collect::<BTreeSet<_>>().into_iter().collect()
}

impl BamHeader {
    /// Flatten the header into metadata fields
    pub fn metadata(&self) -> Metadata {
        let mut metadata = Metadata::new();
        let text = self.text.as_str();

        if let Some(version) = tag_values(text, "@HD", "VN").next() {
            metadata.insert("sam_version".to_string(), json!(version));
        }
        if let Some(order) = tag_values(text, "@HD", "SO").next() {
            metadata.insert("sort_order".to_string(), json!(order));
        }

        let read_groups = text.lines().filter(|line| line.starts_with("@RG\t")).count();
        metadata.insert("read_group_count".to_string(), json!(read_groups));

        for (key, tag) in [
            ("platforms", "PL"),
            ("samples", "SM"),
            ("libraries", "LB"),
            ("sequencing_centers", "CN"),
        ] {
            let values = distinct(tag_values(text, "@RG", tag));
            if !values.is_empty() {
                metadata.insert(key.to_string(), json!(values));
            }
        }

        let programs: BTreeSet<String> = text
            .lines()
            .filter(|line| line.starts_with("@PG\t"))
            .filter_map(program_label)
            .collect();
        if !programs.is_empty() {
            metadata.insert("programs".to_string(), json!(programs));
        }

        metadata.insert("reference_count".to_string(), json!(self.references.len()));
        let total: u64 = self.references.iter().map(|r| r.length).sum();
        metadata.insert("reference_length".to_string(), json!(total));

        let build = reference::guess_from_contigs(
            self.references.iter().map(|r| (r.name.as_str(), r.length)),
        )
        .or_else(|| {
            tag_values(text, "@SQ", "AS")
                .chain(tag_values(text, "@SQ", "UR"))
                .find_map(reference::guess_from_name)
        });
        if let Some(build) = build {
            metadata.insert("reference_build".to_string(), json!(build.as_str()));
        }

        metadata
    }
}

pub struct BamExtractor {
    opener: Arc<SourceOpener>,
}

impl BamExtractor {
    pub fn new(opener: Arc<SourceOpener>) -> Self {
        Self { opener }
    }
}

impl FormatExtractor for BamExtractor {
    fn format(&self) -> FileFormat {
        FileFormat::Bam
    }

    fn extract(&self, request: &ExtractRequest<'_>) -> Result<Metadata> {
        let mut reader = self.opener.open(request.locator)?;
        let header = read_header(&mut reader, request)?;
        debug!(
            locator = %request.locator,
            references = header.references.len(),
            "Read BAM header"
        );
        Ok(header.metadata())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use seqsleuth_common::ReadLimit;
    use std::io::{Cursor, Write};
    use tokio_util::sync::CancellationToken;

    const TEXT: &str = "@HD\tVN:1.6\tSO:coordinate\n\
        @SQ\tSN:chr1\tLN:248956422\n\
        @SQ\tSN:chr2\tLN:242193529\n\
        @RG\tID:rg1\tPL:ILLUMINA\tSM:HG002\tLB:lib1\tCN:NIST\n\
        @RG\tID:rg2\tPL:ILLUMINA\tSM:HG002\tLB:lib2\n\
        @PG\tID:bwa\tPN:bwa\tVN:0.7.17\n\
        @PG\tID:md\tPN:samblaster\n";

    fn bam_header(text: &str, references: &[(&str, i32)]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(BAM_MAGIC);
        bytes.extend_from_slice(&(text.len() as i32).to_le_bytes());
        bytes.extend_from_slice(text.as_bytes());
        bytes.extend_from_slice(&(references.len() as i32).to_le_bytes());
        for (name, length) in references {
            bytes.extend_from_slice(&(name.len() as i32 + 1).to_le_bytes());
            bytes.extend_from_slice(name.as_bytes());
            bytes.push(0);
            bytes.extend_from_slice(&length.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn test_header_metadata() {
        let cancel = CancellationToken::new();
        let request = ExtractRequest::new("a.bam", ReadLimit::All, &cancel);
        let bytes = bam_header(TEXT, &[("chr1", 248_956_422), ("chr2", 242_193_529)]);

        let header = read_header(&mut Cursor::new(bytes), &request).unwrap();
        let metadata = header.metadata();

        assert_eq!(metadata["sam_version"], json!("1.6"));
        assert_eq!(metadata["sort_order"], json!("coordinate"));
        assert_eq!(metadata["read_group_count"], json!(2));
        assert_eq!(metadata["platforms"], json!(["ILLUMINA"]));
        assert_eq!(metadata["samples"], json!(["HG002"]));
        assert_eq!(metadata["libraries"], json!(["lib1", "lib2"]));
        assert_eq!(metadata["sequencing_centers"], json!(["NIST"]));
        assert_eq!(metadata["programs"], json!(["bwa 0.7.17", "samblaster"]));
        assert_eq!(metadata["reference_count"], json!(2));
        assert_eq!(metadata["reference_length"], json!(491_149_951u64));
        assert_eq!(metadata["reference_build"], json!("GRCh38"));
    }

    #[test]
    fn test_rejects_bad_magic() {
        let cancel = CancellationToken::new();
        let request = ExtractRequest::new("a.bam", ReadLimit::All, &cancel);
        let result = read_header(&mut Cursor::new(b"SAM\x01rest".to_vec()), &request);
        assert!(matches!(result, Err(ExtractorError::InvalidHeader { .. })));
    }

    #[test]
    fn test_rejects_truncated_dictionary() {
        let cancel = CancellationToken::new();
        let request = ExtractRequest::new("a.bam", ReadLimit::All, &cancel);
        let mut bytes = bam_header("", &[("chr1", 1000)]);
        bytes.truncate(bytes.len() - 2);
        let err = read_header(&mut Cursor::new(bytes), &request).unwrap_err();
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn test_extract_compressed_bam() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("HG002.GRCh37.bam");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&bam_header("@HD\tVN:1.5\n", &[("1", 249_250_621)]))
            .unwrap();
        // Alignment bytes after the header are never read
        encoder.write_all(&[0xAB; 64]).unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();

        let cancel = CancellationToken::new();
        let locator = path.to_str().unwrap();
        let request = ExtractRequest::new(locator, ReadLimit::First(5), &cancel);
        let metadata = BamExtractor::new(Arc::new(SourceOpener::default()))
            .extract(&request)
            .unwrap();

        assert_eq!(metadata["sam_version"], json!("1.5"));
        assert_eq!(metadata["reference_build"], json!("GRCh37"));
        assert!(!metadata.contains_key("platforms"));
    }
}
