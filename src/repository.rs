use std::collections::BTreeMap;
use tracing::debug;

use crate::download::{Downloader, join_uri};
use crate::error::{Error, Result};
use crate::version::{DependencyVersion, VersionPattern};

pub const INDEX_FILE: &str = "index.json";

/// Version to artifact URI mapping published at the root of a repository.
#[derive(Debug, Clone)]
pub struct RepositoryIndex {
    uri: String,
    entries: BTreeMap<DependencyVersion, String>,
}

impl RepositoryIndex {
    pub fn load(downloader: &dyn Downloader, repository_root: &str) -> Result<Self> {
        let uri = join_uri(repository_root, INDEX_FILE);
        let artifact = downloader.fetch(&uri)?;
        let raw = std::fs::read_to_string(artifact.path())
            .map_err(|e| Error::io(artifact.path(), e))?;
        Self::parse(&uri, &raw)
    }

    pub fn parse(uri: &str, raw: &str) -> Result<Self> {
        let listed: BTreeMap<String, String> =
            serde_json::from_str(raw).map_err(|source| Error::Index {
                uri: uri.to_string(),
                source,
            })?;

        let mut entries = BTreeMap::new();
        for (version, artifact_uri) in listed {
            match version.parse::<DependencyVersion>() {
                Ok(parsed) => {
                    entries.insert(parsed, artifact_uri);
                }
                Err(_) => debug!("Ignoring unparseable version '{}' in {}", version, uri),
            }
        }

        Ok(Self {
            uri: uri.to_string(),
            entries,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest listed version matching `pattern`, with its artifact URI.
    pub fn resolve(&self, pattern: &VersionPattern) -> Result<(DependencyVersion, String)> {
        self.entries
            .iter()
            .rev()
            .find(|(version, _)| pattern.matches(version))
            .map(|(version, uri)| (version.clone(), uri.clone()))
            .ok_or_else(|| Error::VersionNotFound {
                pattern: pattern.to_string(),
                index: self.uri.clone(),
            })
    }
}
