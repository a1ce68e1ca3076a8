//! VCF header metadata
//!
//! Reads meta-information lines (`##key=value`) up to and including the
//! `#CHROM` column header. Variant records are never read.

use crate::error::{ExtractorError, Result};
use crate::reference;
use crate::registry::{ExtractRequest, FormatExtractor};
use crate::source::SourceOpener;
use seqsleuth_common::{FileFormat, Metadata};
use serde_json::json;
use std::io::BufRead;
use std::sync::Arc;
use tracing::debug;

/// Fixed columns preceding the sample names
const FIXED_COLUMNS: usize = 9;

/// Meta-information collected from a VCF header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VcfHeader {
    pub file_format: Option<String>,
    pub file_date: Option<String>,
    pub sources: Vec<String>,
    pub reference: Option<String>,
    /// `(ID, length)` for each `##contig` line
    pub contigs: Vec<(String, Option<u64>)>,
    /// Assembly named on any `##contig` line
    pub assembly: Option<String>,
    pub info: Vec<String>,
    pub format: Vec<String>,
    pub filters: Vec<String>,
    pub samples: Vec<String>,
}

/// Split `<ID=x,Description="a, b">` into key/value pairs, honoring quotes
pub fn parse_structured(value: &str) -> Vec<(String, String)> {
    let inner = value
        .trim()
        .strip_prefix('<')
        .and_then(|v| v.strip_suffix('>'))
        .unwrap_or(value);

    let mut pairs = Vec::new();
    let mut key = String::new();
    let mut current = String::new();
    let mut in_value = false;
    let mut quoted = false;
    let mut escaped = false;

    for ch in inner.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }
        match ch {
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            '=' if !in_value && !quoted => {
                key = std::mem::take(&mut current);
                in_value = true;
            },
            ',' if !quoted => {
                if in_value {
                    pairs.push((std::mem::take(&mut key), std::mem::take(&mut current)));
                }
                current.clear();
                in_value = false;
            },
            _ => current.push(ch),
        }
    }
    if in_value {
        pairs.push((key, current));
    }
    pairs
}

fn field<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

/// Read header lines until `#CHROM`, checking for cancellation per line
pub fn read_header<R: BufRead>(reader: &mut R, request: &ExtractRequest<'_>) -> Result<VcfHeader> {
    let mut header = VcfHeader::default();
    let mut line = String::new();
    let mut line_number = 0u64;

    loop {
        request.ensure_active()?;
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(if line_number == 0 {
                ExtractorError::Empty(request.locator.to_string())
            } else {
                ExtractorError::invalid_header(FileFormat::Vcf, "missing #CHROM header line")
            });
        }
        line_number += 1;
        let text = line.trim_end_matches(['\n', '\r']);

        if line_number == 1 && !text.starts_with("##fileformat=") {
            return Err(ExtractorError::invalid_header(
                FileFormat::Vcf,
                "first line is not ##fileformat",
            ));
        }

        if let Some(meta) = text.strip_prefix("##") {
            let Some((key, value)) = meta.split_once('=') else {
                continue;
            };
            header.observe(key, value);
        } else if let Some(columns) = text.strip_prefix('#') {
            header.samples = columns
                .split('\t')
                .skip(FIXED_COLUMNS)
                .map(str::to_string)
                .collect();
            return Ok(header);
        } else {
            return Err(ExtractorError::invalid_header(
                FileFormat::Vcf,
                format!("record on line {} before #CHROM header", line_number),
            ));
        }
    }
}

impl VcfHeader {
    fn observe(&mut self, key: &str, value: &str) {
        match key {
            "fileformat" => self.file_format = Some(value.to_string()),
            "fileDate" => self.file_date = Some(value.to_string()),
            "source" => self.sources.push(value.to_string()),
            "reference" => self.reference = Some(value.to_string()),
            "contig" => {
                let pairs = parse_structured(value);
                if let Some(id) = field(&pairs, "ID") {
                    let length = field(&pairs, "length").and_then(|l| l.parse().ok());
                    self.contigs.push((id.to_string(), length));
                }
                if self.assembly.is_none() {
                    self.assembly = field(&pairs, "assembly").map(str::to_string);
                }
            },
            "INFO" | "FORMAT" | "FILTER" => {
                let pairs = parse_structured(value);
                if let Some(id) = field(&pairs, "ID") {
                    let ids = match key {
                        "INFO" => &mut self.info,
                        "FORMAT" => &mut self.format,
                        _ => &mut self.filters,
                    };
                    ids.push(id.to_string());
                }
            },
            _ => {},
        }
    }

    /// Flatten the header into metadata fields
    pub fn metadata(&self) -> Metadata {
        let mut metadata = Metadata::new();
        let mut optional = |key: &str, value: &Option<String>| {
            if let Some(value) = value {
                metadata.insert(key.to_string(), json!(value));
            }
        };
        optional("file_format", &self.file_format);
        optional("file_date", &self.file_date);
        optional("reference", &self.reference);

        if !self.sources.is_empty() {
            metadata.insert("source".to_string(), json!(self.sources.join("; ")));
        }
        metadata.insert("contig_count".to_string(), json!(self.contigs.len()));
        metadata.insert("info_fields".to_string(), json!(self.info));
        metadata.insert("format_fields".to_string(), json!(self.format));
        metadata.insert("filters".to_string(), json!(self.filters));
        metadata.insert("samples".to_string(), json!(self.samples));
        metadata.insert("sample_count".to_string(), json!(self.samples.len()));

        let build = reference::guess_from_contigs(
            self.contigs
                .iter()
                .filter_map(|(id, length)| length.map(|l| (id.as_str(), l))),
        )
        .or_else(|| self.assembly.as_deref().and_then(reference::guess_from_name))
        .or_else(|| self.reference.as_deref().and_then(reference::guess_from_name));
        if let Some(build) = build {
            metadata.insert("reference_build".to_string(), json!(build.as_str()));
        }

        metadata
    }
}

pub struct VcfExtractor {
    opener: Arc<SourceOpener>,
}

impl VcfExtractor {
    pub fn new(opener: Arc<SourceOpener>) -> Self {
        Self { opener }
    }
}

impl FormatExtractor for VcfExtractor {
    fn format(&self) -> FileFormat {
        FileFormat::Vcf
    }

    fn extract(&self, request: &ExtractRequest<'_>) -> Result<Metadata> {
        let mut reader = self.opener.open(request.locator)?;
        let header = read_header(&mut reader, request)?;
        debug!(
            locator = %request.locator,
            samples = header.samples.len(),
            contigs = header.contigs.len(),
            "Read VCF header"
        );
        Ok(header.metadata())
    }
}
