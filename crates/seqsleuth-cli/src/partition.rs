//! Grouping manifest rows into per-format batches

use crate::error::ManifestError;
use crate::manifest::{ManifestRow, COLUMN_FILENAME, COLUMN_FILEPATH, COLUMN_FILETYPE};
use crate::task::{resolve_locator, TaskDescriptor};
use seqsleuth_common::{FileFormat, ReadLimit};

/// Tasks sharing one format, in manifest order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub format: FileFormat,
    pub tasks: Vec<TaskDescriptor>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Split rows into one batch per recognized format, in processing order.
///
/// Rows with an unrecognized `filetype` are dropped. Formats with no rows get
/// no batch. Any row lacking `filetype` or `filename`, or lacking a `filepath`
/// cell altogether, fails the whole partition.
pub fn partition(
    rows: &[ManifestRow],
    base_url: &str,
    read_limit: ReadLimit,
) -> Result<Vec<Batch>, ManifestError> {
    let mut tasks: [Vec<TaskDescriptor>; 3] = Default::default();

    for row in rows {
        let filetype = required(row, COLUMN_FILETYPE, row.filetype.as_deref())?;
        let filename = required(row, COLUMN_FILENAME, row.filename.as_deref())?;
        let filepath = row.filepath.as_deref().ok_or(ManifestError::MalformedRow {
            line: row.line,
            field: COLUMN_FILEPATH,
        })?;

        if let Some(format) = FileFormat::from_tag(filetype) {
            tasks[format.index()].push(TaskDescriptor {
                format,
                locator: resolve_locator(base_url, filepath, filename),
                read_limit,
            });
        }
    }

    Ok(FileFormat::ALL
        .into_iter()
        .zip(tasks)
        .filter(|(_, tasks)| !tasks.is_empty())
        .map(|(format, tasks)| Batch { format, tasks })
        .collect())
}

fn required<'a>(
    row: &ManifestRow,
    field: &'static str,
    value: Option<&'a str>,
) -> Result<&'a str, ManifestError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(ManifestError::MalformedRow {
            line: row.line,
            field,
        })
}
