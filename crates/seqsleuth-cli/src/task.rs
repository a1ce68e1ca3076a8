//! Units of work and resource locator resolution

use seqsleuth_common::{FileFormat, Metadata, ReadLimit};

/// Mirror-specific directory prefix that manifest paths carry but the public
/// mirror does not serve under
pub const MIRROR_MARKER: &str = "/giab/ftp/";

/// One file to describe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDescriptor {
    pub format: FileFormat,
    pub locator: String,
    pub read_limit: ReadLimit,
}

/// Outcome of one task. Exactly one is produced per [`TaskDescriptor`].
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionResult {
    Success { locator: String, metadata: Metadata },
    Failure { locator: String, reason: String },
}

impl ExtractionResult {
    pub fn failure(locator: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failure {
            locator: locator.into(),
            reason: reason.into(),
        }
    }

    pub fn locator(&self) -> &str {
        match self {
            Self::Success { locator, .. } | Self::Failure { locator, .. } => locator,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Build a resource locator from the base, a manifest path and a file name.
///
/// The mirror marker is removed once (also when the path starts with it
/// without a leading slash); surrounding slashes are normalized.
pub fn resolve_locator(base: &str, filepath: &str, filename: &str) -> String {
    let marker_relative = &MIRROR_MARKER[1..];
    let path = if let Some(index) = filepath.find(MIRROR_MARKER) {
        let mut path = String::with_capacity(filepath.len());
        path.push_str(&filepath[..index]);
        path.push('/');
        path.push_str(&filepath[index + MIRROR_MARKER.len()..]);
        path
    } else if let Some(rest) = filepath.strip_prefix(marker_relative) {
        rest.to_string()
    } else {
        filepath.to_string()
    };

    let base = base.trim_end_matches('/');
    let path = path.trim_matches('/');
    let filename = filename.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/{}", base, filename)
    } else {
        format!("{}/{}/{}", base, path, filename)
    }
}
