//! Metadata parsed from FASTQ read names

use super::reader::FastqSummary;
use super::tech::{SequencingTech, ILLUMINA, ILLUMINA_LEGACY, MGI, PACBIO};
use seqsleuth_common::Metadata;
use serde_json::json;

/// PacBio movie prefixes and the instrument family that writes them
const PACBIO_INSTRUMENTS: [(&str, &str); 4] = [
    ("m84", "Revio"),
    ("m64", "Sequel II"),
    ("m54", "Sequel"),
    ("m1", "RS II"),
];

/// `key=value` pairs MinKNOW writes into read descriptions
const ONT_FIELDS: [(&str, &str); 5] = [
    ("runid", "run_id"),
    ("flow_cell_id", "flow_cell_id"),
    ("sampleid", "sample_id"),
    ("sample_id", "sample_id"),
    ("basecall_model_version_id", "basecall_model"),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct ReadNameExtractor;

impl ReadNameExtractor {
    /// Describe the reads in `summary`, parsed according to `tech`
    pub fn extract(&self, tech: SequencingTech, summary: &FastqSummary) -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert("sequencing_tech".to_string(), json!(tech.as_str()));

        if let Some(first) = summary.sample.first() {
            match tech {
                SequencingTech::Illumina => illumina(first.name(), first.description(), &mut metadata),
                SequencingTech::PacBio => pacbio(first.name(), &mut metadata),
                SequencingTech::Ont => ont(first.description(), &mut metadata),
                SequencingTech::Mgi => mgi(first.name(), &mut metadata),
                SequencingTech::Unknown => {},
            }
        }

        metadata.insert("reads_sampled".to_string(), json!(summary.reads));
        metadata.insert(
            "mean_read_length".to_string(),
            json!((summary.mean_length() * 100.0).round() / 100.0),
        );
        if let Some(min) = summary.min_length {
            metadata.insert("min_read_length".to_string(), json!(min));
        }
        if let Some(max) = summary.max_length {
            metadata.insert("max_read_length".to_string(), json!(max));
        }
        metadata
    }
}

fn insert(metadata: &mut Metadata, key: &str, value: &str) {
    metadata.insert(key.to_string(), json!(value));
}

fn illumina(name: &str, description: Option<&str>, metadata: &mut Metadata) {
    if let Some(caps) = ILLUMINA.captures(name) {
        insert(metadata, "instrument", &caps["instrument"]);
        insert(metadata, "run_number", &caps["run"]);
        insert(metadata, "flowcell_id", &caps["flowcell"]);
        insert(metadata, "lane", &caps["lane"]);

        // `1:N:0:ACGTACGT+TTGGCCAA`
        let index = description
            .and_then(|d| d.split(':').nth(3))
            .map(str::trim)
            .filter(|index| !index.is_empty());
        if let Some(index) = index {
            insert(metadata, "index_sequence", index);
        }
    } else if let Some(caps) = ILLUMINA_LEGACY.captures(name) {
        insert(metadata, "instrument", &caps["instrument"]);
        insert(metadata, "lane", &caps["lane"]);
    }
}

fn pacbio(name: &str, metadata: &mut Metadata) {
    let Some(caps) = PACBIO.captures(name) else {
        return;
    };
    let movie = &caps["movie"];
    insert(metadata, "movie_name", movie);

    let read_type = match caps.name("kind").map(|m| m.as_str()) {
        Some("ccs") => "ccs",
        Some(_) => "subread",
        None => "ccs",
    };
    insert(metadata, "read_type", read_type);

    if let Some((_, model)) = PACBIO_INSTRUMENTS
        .iter()
        .find(|(prefix, _)| movie.starts_with(prefix))
    {
        insert(metadata, "instrument_model", model);
    }
}

fn ont(description: Option<&str>, metadata: &mut Metadata) {
    let Some(description) = description else {
        return;
    };
    for pair in description.split_whitespace() {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        if let Some((_, field)) = ONT_FIELDS.iter().find(|(known, _)| *known == key) {
            insert(metadata, field, value);
        }
    }
}

fn mgi(name: &str, metadata: &mut Metadata) {
    if let Some(caps) = MGI.captures(name) {
        insert(metadata, "flowcell_id", &caps["flowcell"]);
        insert(metadata, "lane", &caps["lane"]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fastq::reader::FastqRecord;

    fn summary(headers: &[&str], length: usize) -> FastqSummary {
        let sample: Vec<FastqRecord> = headers
            .iter()
            .map(|header| FastqRecord {
                header: header.to_string(),
                length,
            })
            .collect();
        FastqSummary {
            reads: sample.len() as u64,
            total_length: (sample.len() * length) as u64,
            min_length: Some(length),
            max_length: Some(length),
            sample,
        }
    }

    #[test]
    fn test_illumina_fields() {
        let summary = summary(&["A00123:8:H5KJ7DSXX:2:1101:10000:1000 1:N:0:ACGTACGT+TTGGCCAA"], 151);
        let metadata = ReadNameExtractor.extract(SequencingTech::Illumina, &summary);

        assert_eq!(metadata["sequencing_tech"], json!("illumina"));
        assert_eq!(metadata["instrument"], json!("A00123"));
        assert_eq!(metadata["run_number"], json!("8"));
        assert_eq!(metadata["flowcell_id"], json!("H5KJ7DSXX"));
        assert_eq!(metadata["lane"], json!("2"));
        assert_eq!(metadata["index_sequence"], json!("ACGTACGT+TTGGCCAA"));
        assert_eq!(metadata["reads_sampled"], json!(1));
        assert_eq!(metadata["mean_read_length"], json!(151.0));
    }

    #[test]
    fn test_pacbio_fields() {
        let summary = summary(&["m64011_190830_220126/1/ccs"], 15_000);
        let metadata = ReadNameExtractor.extract(SequencingTech::PacBio, &summary);

        assert_eq!(metadata["movie_name"], json!("m64011_190830_220126"));
        assert_eq!(metadata["read_type"], json!("ccs"));
        assert_eq!(metadata["instrument_model"], json!("Sequel II"));

        let summary = summary_subread();
        let metadata = ReadNameExtractor.extract(SequencingTech::PacBio, &summary);
        assert_eq!(metadata["read_type"], json!("subread"));
        assert_eq!(metadata["instrument_model"], json!("Sequel"));
    }

    fn summary_subread() -> FastqSummary {
        summary(&["m54238_180628_014238/4194376/0_12345"], 12_345)
    }

    #[test]
    fn test_ont_fields() {
        let summary = summary(
            &["0a1b2c3d-1111-2222-3333-444455556666 runid=abc123 sampleid=HG002 flow_cell_id=PAD12345 ch=12"],
            20_000,
        );
        let metadata = ReadNameExtractor.extract(SequencingTech::Ont, &summary);

        assert_eq!(metadata["run_id"], json!("abc123"));
        assert_eq!(metadata["sample_id"], json!("HG002"));
        assert_eq!(metadata["flow_cell_id"], json!("PAD12345"));
        assert!(!metadata.contains_key("ch"));
    }

    #[test]
    fn test_unknown_keeps_stats_only() {
        let summary = summary(&["SRR1.1"], 100);
        let metadata = ReadNameExtractor.extract(SequencingTech::Unknown, &summary);
        assert_eq!(metadata["sequencing_tech"], json!("unknown"));
        assert_eq!(metadata["min_read_length"], json!(100));
        assert_eq!(metadata.len(), 5);
    }
}
