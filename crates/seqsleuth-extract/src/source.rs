//! Opening resource locators
//!
//! A locator is either an `http(s)` URL, streamed with a blocking client, or
//! a local path (optionally written as a `file://` URL). Gzip and BGZF input
//! is detected from its magic bytes and decoded transparently.

use crate::error::{ExtractorError, Result};
use flate2::bufread::MultiGzDecoder;
use reqwest::blocking::Client;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Default timeout for remote reads
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(300);

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Buffered, decoded byte stream for one file
pub type SourceReader = Box<dyn BufRead + Send>;

/// Where a locator points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// HTTP or HTTPS resource
    Remote(Url),
    /// File on the local filesystem
    Local(PathBuf),
}

impl Locator {
    pub fn parse(locator: &str) -> Result<Self> {
        match Url::parse(locator) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Locator::Remote(url)),
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map(Locator::Local)
                .map_err(|_| ExtractorError::UnsupportedLocator(locator.to_string())),
            // Windows drive letters parse as a one-letter scheme
            Ok(url) if url.scheme().len() == 1 => Ok(Locator::Local(PathBuf::from(locator))),
            Ok(_) => Err(ExtractorError::UnsupportedLocator(locator.to_string())),
            Err(_) => Ok(Locator::Local(PathBuf::from(locator))),
        }
    }

    /// Final path segment, without any query string
    pub fn file_name(&self) -> Option<String> {
        match self {
            Locator::Remote(url) => url
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .filter(|segment| !segment.is_empty())
                .map(|segment| segment.to_string()),
            Locator::Local(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
        }
    }
}

/// Opens locators for the extractors.
///
/// The HTTP client is built lazily on first remote access, which always
/// happens on a blocking worker thread.
#[derive(Debug)]
pub struct SourceOpener {
    http_timeout: Duration,
    client: OnceLock<Client>,
}

impl SourceOpener {
    pub fn new(http_timeout: Duration) -> Self {
        Self {
            http_timeout,
            client: OnceLock::new(),
        }
    }

    /// Open a locator and return a decoded, buffered reader
    pub fn open(&self, locator: &str) -> Result<SourceReader> {
        let raw: SourceReader = match Locator::parse(locator)? {
            Locator::Remote(url) => self.open_remote(locator, url)?,
            Locator::Local(path) => {
                debug!(path = %path.display(), "Opening local file");
                let file = File::open(&path).map_err(|source| ExtractorError::Open {
                    locator: locator.to_string(),
                    source,
                })?;
                Box::new(BufReader::new(file))
            },
        };

        decode(raw).map_err(|source| ExtractorError::Open {
            locator: locator.to_string(),
            source,
        })
    }

    fn open_remote(&self, locator: &str, url: Url) -> Result<SourceReader> {
        debug!(url = %url, "Streaming remote file");
        let client = self.client()?;
        let response = client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|source| ExtractorError::Http {
                locator: locator.to_string(),
                source,
            })?;
        Ok(Box::new(BufReader::new(response)))
    }

    fn client(&self) -> Result<&Client> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let client = Client::builder()
            .timeout(self.http_timeout)
            .build()
            .map_err(|source| ExtractorError::Http {
                locator: String::new(),
                source,
            })?;
        // Another worker may have raced us; either client is fine
        Ok(self.client.get_or_init(|| client))
    }
}

impl Default for SourceOpener {
    fn default() -> Self {
        Self::new(DEFAULT_HTTP_TIMEOUT)
    }
}

/// Wrap the reader in a multi-member gzip decoder when it starts with the gzip magic
fn decode(mut reader: SourceReader) -> std::io::Result<SourceReader> {
    let is_gzip = {
        let head = reader.fill_buf()?;
        head.len() >= GZIP_MAGIC.len() && head[..GZIP_MAGIC.len()] == GZIP_MAGIC
    };

    if is_gzip {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(reader))))
    } else {
        Ok(reader)
    }
}
