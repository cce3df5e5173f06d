//! Artifact downloads.
//!
//! Remote artifacts (`http://`, `https://`) are fetched once and kept in a cache
//! directory keyed by the SHA-256 of their URI. Local artifacts (`file://` URIs
//! and plain paths) are used in place. There is no retry: a failed request is
//! reported to the caller as is.

use reqwest::blocking::Client;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{Error, Result};

const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// A downloaded file, valid for the duration of one install.
#[derive(Debug, Clone)]
pub struct Artifact {
    path: PathBuf,
    uri: String,
}

impl Artifact {
    pub fn new(path: PathBuf, uri: impl Into<String>) -> Self {
        Self {
            path,
            uri: uri.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }
}

pub trait Downloader {
    fn fetch(&self, uri: &str) -> Result<Artifact>;
}

#[derive(Debug, Clone)]
pub struct CachingDownloader {
    cache_dir: PathBuf,
    client: Client,
}

impl CachingDownloader {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { cache_dir, client })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn cached_path(&self, uri: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.cached", cache_key(uri)))
    }

    fn fetch_remote(&self, uri: &str) -> Result<Artifact> {
        let cached = self.cached_path(uri);
        if cached.is_file() {
            debug!("Using cached copy of {} at {}", uri, cached.display());
            return Ok(Artifact::new(cached, uri));
        }

        std::fs::create_dir_all(&self.cache_dir).map_err(|e| Error::io(&self.cache_dir, e))?;

        info!("Downloading {}", uri);
        let mut response = self
            .client
            .get(uri)
            .send()
            .map_err(|e| Error::download(uri, e))?;
        if !response.status().is_success() {
            return Err(Error::download(uri, format!("HTTP {}", response.status())));
        }

        let mut tmp =
            NamedTempFile::new_in(&self.cache_dir).map_err(|e| Error::io(&self.cache_dir, e))?;
        response
            .copy_to(tmp.as_file_mut())
            .map_err(|e| Error::download(uri, e))?;
        tmp.persist(&cached)
            .map_err(|e| Error::io(&cached, e.error))?;

        Ok(Artifact::new(cached, uri))
    }
}

impl Downloader for CachingDownloader {
    fn fetch(&self, uri: &str) -> Result<Artifact> {
        if uri.starts_with("http://") || uri.starts_with("https://") {
            return self.fetch_remote(uri);
        }

        let path = local_path(uri);
        if !path.is_file() {
            return Err(Error::download(uri, "no such file"));
        }
        debug!("Using local artifact {}", path.display());
        Ok(Artifact::new(path, uri))
    }
}

/// Joins a repository root and a relative name with exactly one `/`.
pub fn join_uri(root: &str, name: &str) -> String {
    format!("{}/{}", root.trim_end_matches('/'), name.trim_start_matches('/'))
}

fn local_path(uri: &str) -> PathBuf {
    PathBuf::from(uri.strip_prefix("file://").unwrap_or(uri))
}

fn cache_key(uri: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(uri.as_bytes());
    hex::encode(hasher.finalize())
}
