use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;
use url::Url;

use crate::executor::{HttpClient, HttpRequestParts};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("fetch {location}: {reason}")]
    Fetch { location: String, reason: String },
    #[error("read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse {location}: {source}")]
    Parse {
        location: String,
        #[source]
        source: arazzo_core::ParseError,
    },
}

/// Where a source description's `url` points once made absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Remote(Url),
    File(PathBuf),
}

impl Location {
    /// Resolves `reference` against the document it appears in.
    pub fn resolve(reference: &str, base: Option<&Location>) -> Location {
        if let Ok(url) = Url::parse(reference) {
            if url.scheme() == "file" {
                if let Ok(path) = url.to_file_path() {
                    return Location::File(path);
                }
            }
            if url.scheme() == "http" || url.scheme() == "https" {
                return Location::Remote(url);
            }
        }
        match base {
            Some(Location::Remote(base)) => match base.join(reference) {
                Ok(url) => Location::Remote(url),
                Err(_) => Location::File(PathBuf::from(reference)),
            },
            Some(Location::File(base)) => {
                let dir = base.parent().unwrap_or_else(|| Path::new(""));
                Location::File(dir.join(reference))
            }
            None => Location::File(PathBuf::from(reference)),
        }
    }

    pub fn as_string(&self) -> String {
        match self {
            Location::Remote(url) => url.to_string(),
            Location::File(path) => path.display().to_string(),
        }
    }
}

/// Reads a JSON or YAML document from a URL (through the HTTP seam) or a file.
pub(crate) async fn load_text(
    client: &dyn HttpClient,
    location: &Location,
    timeout: Duration,
    max_bytes: usize,
) -> Result<String, LoadError> {
    match location {
        Location::Remote(url) => {
            let req = HttpRequestParts {
                method: "GET".to_string(),
                url: url.clone(),
                headers: Default::default(),
                body: Vec::new(),
            };
            let fetch_err = |reason: String| LoadError::Fetch {
                location: url.to_string(),
                reason,
            };
            let resp = client
                .send(req, timeout, max_bytes)
                .await
                .map_err(|e| fetch_err(e.to_string()))?;
            if !(200..300).contains(&resp.status) {
                return Err(fetch_err(format!("HTTP {}", resp.status)));
            }
            Ok(String::from_utf8_lossy(&resp.body).into_owned())
        }
        Location::File(path) => tokio::fs::read_to_string(path)
            .await
            .map_err(|source| LoadError::Read {
                path: path.clone(),
                source,
            }),
    }
}

pub(crate) fn parse_tree(location: &Location, text: &str) -> Result<Value, LoadError> {
    arazzo_core::load_document_str(text, arazzo_core::DocumentFormat::Auto).map_err(|source| {
        LoadError::Parse {
            location: location.as_string(),
            source,
        }
    })
}
