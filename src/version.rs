//! Memory calculator versions.
//!
//! Versions look like `1.9.0_RELEASE` or `3.13.0`: up to three numeric
//! components, optionally followed by a qualifier after `_` or `-`. Missing
//! numeric components count as zero. Ordering is numeric, so `10.0.0` sorts
//! after `2.0.0`.

use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// First major version distributed as a compressed archive instead of a bare executable.
pub const ARCHIVE_GENERATION: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnpackStrategy {
    /// The artifact is the executable itself.
    RawBinary,
    /// The artifact is a gzip tarball holding one executable per platform.
    CompressedArchive,
}

#[derive(Debug, Clone)]
pub struct DependencyVersion {
    raw: String,
    major: u32,
    minor: u32,
    micro: u32,
    qualifier: Option<String>,
}

impl DependencyVersion {
    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn micro(&self) -> u32 {
        self.micro
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn unpack_strategy(&self) -> UnpackStrategy {
        if self.major < ARCHIVE_GENERATION {
            UnpackStrategy::RawBinary
        } else {
            UnpackStrategy::CompressedArchive
        }
    }

    fn key(&self) -> (u32, u32, u32, Option<&str>) {
        (self.major, self.minor, self.micro, self.qualifier.as_deref())
    }
}

impl FromStr for DependencyVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.trim();
        let invalid = || Error::InvalidVersion(s.to_string());

        let (numeric, qualifier) = match raw.find(['_', '-']) {
            Some(idx) => {
                let qualifier = &raw[idx + 1..];
                if qualifier.is_empty() {
                    return Err(invalid());
                }
                (&raw[..idx], Some(qualifier.to_string()))
            }
            None => (raw, None),
        };

        let components = parse_components(numeric).ok_or_else(invalid)?;
        if components.is_empty() || components.len() > 3 {
            return Err(invalid());
        }

        Ok(Self {
            raw: raw.to_string(),
            major: components[0],
            minor: components.get(1).copied().unwrap_or(0),
            micro: components.get(2).copied().unwrap_or(0),
            qualifier,
        })
    }
}

impl PartialEq for DependencyVersion {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for DependencyVersion {}

impl PartialOrd for DependencyVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DependencyVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for DependencyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for DependencyVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

/// A requested version: either exact (`1.9.0_RELEASE`) or a wildcard prefix (`3.+`, `+`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionPattern {
    Exact(DependencyVersion),
    Prefix(Vec<u32>),
}

impl VersionPattern {
    pub fn matches(&self, version: &DependencyVersion) -> bool {
        match self {
            Self::Exact(wanted) => wanted == version,
            Self::Prefix(prefix) => {
                let actual = [version.major, version.minor, version.micro];
                prefix.iter().zip(actual.iter()).all(|(p, a)| p == a)
            }
        }
    }
}

impl FromStr for VersionPattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.trim();
        let Some(head) = raw.strip_suffix('+') else {
            return raw.parse().map(Self::Exact);
        };

        let invalid = || Error::InvalidVersion(s.to_string());
        if head.is_empty() {
            return Ok(Self::Prefix(Vec::new()));
        }
        let head = head.strip_suffix('.').ok_or_else(invalid)?;
        let prefix = parse_components(head).ok_or_else(invalid)?;
        if prefix.len() > 2 {
            return Err(invalid());
        }
        Ok(Self::Prefix(prefix))
    }
}

impl fmt::Display for VersionPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(v) => write!(f, "{v}"),
            Self::Prefix(prefix) => {
                for component in prefix {
                    write!(f, "{component}.")?;
                }
                f.write_str("+")
            }
        }
    }
}

fn parse_components(numeric: &str) -> Option<Vec<u32>> {
    numeric
        .split('.')
        .map(|part| part.parse::<u32>().ok())
        .collect()
}
