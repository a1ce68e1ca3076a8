//! File list loading
//!
//! The manifest is a CSV file with a header row naming at least the columns
//! `filetype`, `filename` and `filepath`; other columns are ignored. Rows are
//! kept in file order and validated later by the partitioner.

use crate::error::ManifestError;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const COLUMN_FILETYPE: &str = "filetype";
pub const COLUMN_FILENAME: &str = "filename";
pub const COLUMN_FILEPATH: &str = "filepath";

/// One manifest row as written. A field is `None` when the row has no cell for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRow {
    /// Line number in the manifest, for error messages
    pub line: u64,
    pub filetype: Option<String>,
    pub filename: Option<String>,
    pub filepath: Option<String>,
}

impl ManifestRow {
    pub fn new(line: u64, filetype: &str, filepath: &str, filename: &str) -> Self {
        Self {
            line,
            filetype: Some(filetype.to_string()),
            filename: Some(filename.to_string()),
            filepath: Some(filepath.to_string()),
        }
    }
}

/// Load a manifest from a file path
pub fn load(path: &Path) -> Result<Vec<ManifestRow>, ManifestError> {
    let file = File::open(path).map_err(|source| ManifestError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read(file)
}

/// Parse a manifest from any reader
pub fn read<R: Read>(reader: R) -> Result<Vec<ManifestRow>, ManifestError> {
    let mut csv = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = csv.headers()?.clone();
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|header| header == name)
            .ok_or(ManifestError::MissingColumn(name))
    };
    let filetype = column(COLUMN_FILETYPE)?;
    let filename = column(COLUMN_FILENAME)?;
    let filepath = column(COLUMN_FILEPATH)?;

    let mut rows = Vec::new();
    let mut record = StringRecord::new();
    while csv.read_record(&mut record)? {
        if record.iter().all(str::is_empty) {
            continue;
        }
        let line = record.position().map_or(0, |p| p.line());
        let cell = |index: usize| record.get(index).map(str::to_string);
        rows.push(ManifestRow {
            line,
            filetype: cell(filetype),
            filename: cell(filename),
            filepath: cell(filepath),
        });
    }

    Ok(rows)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_rows_in_order() {
        let text = "filetype,filename,filepath,size\n\
            fastq,a.fastq.gz,/giab/ftp/data/HG002,10\n\
            BAM, b.bam ,data/HG003,20\n";
        let rows = read(text.as_bytes()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], ManifestRow::new(2, "fastq", "/giab/ftp/data/HG002", "a.fastq.gz"));
        assert_eq!(rows[1].filetype.as_deref(), Some("BAM"));
        assert_eq!(rows[1].filename.as_deref(), Some("b.bam"));
        assert_eq!(rows[1].line, 3);
    }

    #[test]
    fn test_column_order_is_free() {
        let rows = read("filepath,filetype,filename\ndata,vcf,c.vcf.gz\n".as_bytes()).unwrap();
        assert_eq!(rows[0], ManifestRow::new(2, "vcf", "data", "c.vcf.gz"));
    }

    #[test]
    fn test_short_row_has_missing_cells() {
        let rows = read("filetype,filename,filepath\nfastq,a.fastq\n\n".as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].filepath, None);
    }

    #[test]
    fn test_missing_column() {
        let err = read("filetype,filename\nfastq,a.fastq\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ManifestError::MissingColumn("filepath")));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load(Path::new("/no/such/manifest.csv")).unwrap_err();
        assert!(matches!(err, ManifestError::Open { .. }));
    }
}
