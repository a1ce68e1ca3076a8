//! Metadata derived from file names
//!
//! Never reads file content: the locator's last path segment is split into
//! tokens on `.`, `_` and `-`, and each token is looked up in the format's
//! [`KeywordSet`].

use crate::error::{ExtractorError, Result};
use crate::keywords::KeywordSet;
use crate::source::Locator;
use regex::Regex;
use seqsleuth_common::Metadata;
use serde_json::json;
use std::sync::LazyLock;

/// GIAB sample identifiers, e.g. `HG002` or `NA24385`
// Constant pattern; covered by the tests below
#[allow(clippy::expect_used)]
static SAMPLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)(hg\d{3}|na\d{5}|hg\d{5})$").expect("sample pattern is valid")
});

/// Genome in a Bottle reference samples and their Coriell aliases
const GIAB_ALIASES: [(&str, &str); 7] = [
    ("HG001", "NA12878"),
    ("HG002", "NA24385"),
    ("HG003", "NA24149"),
    ("HG004", "NA24143"),
    ("HG005", "NA24631"),
    ("HG006", "NA24694"),
    ("HG007", "NA24695"),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct FilenameExtractor;

impl FilenameExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract keyword fields and the sample identifier from the locator's file name
    pub fn extract(&self, keywords: &KeywordSet, locator: &str) -> Result<Metadata> {
        let file_name = Locator::parse(locator)?
            .file_name()
            .ok_or_else(|| ExtractorError::UnsupportedLocator(locator.to_string()))?;

        let tokens = tokenize(&file_name);
        let mut metadata = Metadata::new();
        metadata.insert("file_name".to_string(), json!(file_name));

        for field in keywords.fields {
            let hit = tokens.iter().find_map(|token| {
                field
                    .keywords
                    .iter()
                    .find(|(keyword, _)| *keyword == token.as_str())
                    .map(|(_, value)| *value)
            });
            if let Some(value) = hit {
                metadata.insert(field.name.to_string(), json!(value));
            }
        }

        if let Some(sample) = tokens.iter().find(|token| SAMPLE_PATTERN.is_match(token)) {
            let sample = sample.to_ascii_uppercase();
            if let Some(alias) = giab_alias(&sample) {
                metadata.insert("sample_alias".to_string(), json!(alias));
            }
            metadata.insert("sample".to_string(), json!(sample));
        }

        Ok(metadata)
    }
}

fn tokenize(file_name: &str) -> Vec<String> {
    file_name
        .split(['.', '_', '-'])
        .filter(|token| !token.is_empty())
        .map(|token| token.to_ascii_lowercase())
        .collect()
}

fn giab_alias(sample: &str) -> Option<&'static str> {
    GIAB_ALIASES.iter().find_map(|(giab, coriell)| {
        if *giab == sample {
            Some(*coriell)
        } else if *coriell == sample {
            Some(*giab)
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords::{BAM_KEYWORDS, FASTQ_KEYWORDS, VCF_KEYWORDS};

    #[test]
    fn test_fastq_filename() {
        let metadata = FilenameExtractor::new()
            .extract(
                &FASTQ_KEYWORDS,
                "https://ftp-trace.ncbi.nlm.nih.gov/ReferenceSamples/giab/data/HG002_NovaSeq_PCR-free_R1.fastq.gz",
            )
            .unwrap();

        assert_eq!(metadata["platform"], json!("Illumina"));
        assert_eq!(metadata["read_pair"], json!("R1"));
        assert_eq!(metadata["sample"], json!("HG002"));
        assert_eq!(metadata["sample_alias"], json!("NA24385"));
        assert_eq!(metadata["file_name"], json!("HG002_NovaSeq_PCR-free_R1.fastq.gz"));
    }

    #[test]
    fn test_bam_filename() {
        let metadata = FilenameExtractor::new()
            .extract(&BAM_KEYWORDS, "/data/NA12878.pacbio.hifi.pbmm2.GRCh38.markdup.bam")
            .unwrap();

        assert_eq!(metadata["platform"], json!("PacBio"));
        assert_eq!(metadata["aligner"], json!("pbmm2"));
        assert_eq!(metadata["reference_build"], json!("GRCh38"));
        assert_eq!(metadata["duplicates"], json!("marked"));
        assert_eq!(metadata["sample_alias"], json!("HG001"));
    }

    #[test]
    fn test_vcf_filename_without_matches() {
        let metadata = FilenameExtractor::new()
            .extract(&VCF_KEYWORDS, "/data/calls.vcf.gz")
            .unwrap();

        assert_eq!(metadata.len(), 1);
        assert!(metadata.contains_key("file_name"));
    }

    #[test]
    fn test_locator_without_file_name() {
        let result = FilenameExtractor::new().extract(&VCF_KEYWORDS, "https://example.org/");
        assert!(matches!(result, Err(ExtractorError::UnsupportedLocator(_))));
    }
}
