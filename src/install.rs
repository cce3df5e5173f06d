//! Installation of the memory calculator into the droplet sandbox.
//!
//! First-generation calculators (`major < 2`) ship as a bare executable and are
//! copied into place. Later generations ship as a gzip tarball holding one
//! executable per platform; the host's variant is extracted next to the
//! destination and renamed to it. Either way the result lives at
//! `<sandbox>/bin/java-buildpack-memory-calculator-<version>` with mode `0755`.
//!
//! ```text
//! Uninstalled -> Downloading -> Unpacking -> Installed
//! ```
//!
//! Any failure returns the installer to `Uninstalled` and removes what was
//! written. A destination that already exists is reused as is.

use flate2::read::GzDecoder;
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tar::Archive;
use tracing::{debug, info};

use crate::download::{Artifact, Downloader};
use crate::error::{Error, Result};
use crate::platform::Platform;
use crate::version::{DependencyVersion, UnpackStrategy};

pub const BINARY_PREFIX: &str = "java-buildpack-memory-calculator";
pub const EXECUTABLE_MODE: u32 = 0o755;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallState {
    Uninstalled,
    Downloading,
    Unpacking,
    Installed,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstalledBinary {
    pub path: PathBuf,
    pub version: DependencyVersion,
    pub strategy: UnpackStrategy,
    /// False when an existing installation was reused.
    pub fresh: bool,
}

/// Where `version` is installed inside `sandbox`.
pub fn binary_path(sandbox: &Path, version: &DependencyVersion) -> PathBuf {
    sandbox
        .join("bin")
        .join(format!("{BINARY_PREFIX}-{version}"))
}

fn extracted_binary_path(bin_dir: &Path, platform: Platform) -> PathBuf {
    bin_dir.join(format!("{BINARY_PREFIX}-{platform}"))
}

pub struct VersionedInstaller<'a> {
    downloader: &'a dyn Downloader,
    platform: Platform,
    state: InstallState,
}

impl<'a> VersionedInstaller<'a> {
    pub fn new(downloader: &'a dyn Downloader, platform: Platform) -> Self {
        Self {
            downloader,
            platform,
            state: InstallState::Uninstalled,
        }
    }

    pub fn state(&self) -> InstallState {
        self.state
    }

    pub fn install(
        &mut self,
        version: &DependencyVersion,
        uri: &str,
        sandbox: &Path,
    ) -> Result<InstalledBinary> {
        let destination = binary_path(sandbox, version);
        let strategy = version.unpack_strategy();

        if destination.is_file() {
            debug!("{} already installed", destination.display());
            self.transition(InstallState::Installed);
            return Ok(InstalledBinary {
                path: destination,
                version: version.clone(),
                strategy,
                fresh: false,
            });
        }

        match self.install_fresh(version, uri, &destination, strategy) {
            Ok(()) => Ok(InstalledBinary {
                path: destination,
                version: version.clone(),
                strategy,
                fresh: true,
            }),
            Err(err) => {
                self.discard(&destination);
                self.transition(InstallState::Uninstalled);
                Err(err)
            }
        }
    }

    fn install_fresh(
        &mut self,
        version: &DependencyVersion,
        uri: &str,
        destination: &Path,
        strategy: UnpackStrategy,
    ) -> Result<()> {
        self.transition(InstallState::Downloading);
        info!("Downloading Memory Calculator {} from {}", version, uri);
        let artifact = self.downloader.fetch(uri)?;

        let bin_dir = destination
            .parent()
            .ok_or_else(|| Error::Config(format!("{} has no parent", destination.display())))?;
        fs::create_dir_all(bin_dir).map_err(|e| Error::io(bin_dir, e))?;

        self.transition(InstallState::Unpacking);
        match strategy {
            UnpackStrategy::RawBinary => copy_binary(&artifact, destination)?,
            UnpackStrategy::CompressedArchive => {
                extract_tarball(artifact.path(), bin_dir)?;
                let extracted = extracted_binary_path(bin_dir, self.platform);
                if !extracted.is_file() {
                    return Err(Error::MissingExtractedBinary(extracted));
                }
                fs::rename(&extracted, destination).map_err(|e| Error::io(&extracted, e))?;
            }
        }

        make_executable(destination)?;
        self.transition(InstallState::Installed);
        Ok(())
    }

    fn transition(&mut self, next: InstallState) {
        debug!("Memory calculator install: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn discard(&self, destination: &Path) {
        let _ = fs::remove_file(destination);
        if let Some(bin_dir) = destination.parent() {
            let _ = fs::remove_file(extracted_binary_path(bin_dir, self.platform));
        }
    }
}

fn copy_binary(artifact: &Artifact, destination: &Path) -> Result<()> {
    fs::copy(artifact.path(), destination).map_err(|e| Error::io(destination, e))?;
    Ok(())
}

fn extract_tarball(archive_path: &Path, into: &Path) -> Result<()> {
    let extract_err = |source| Error::Extract {
        archive: archive_path.to_path_buf(),
        source,
    };
    let file = File::open(archive_path).map_err(extract_err)?;
    Archive::new(GzDecoder::new(file))
        .unpack(into)
        .map_err(extract_err)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let permission_err = |source| Error::Permission {
        path: path.to_path_buf(),
        source,
    };
    let mut perms = fs::metadata(path).map_err(permission_err)?.permissions();
    perms.set_mode(EXECUTABLE_MODE);
    fs::set_permissions(path, perms).map_err(permission_err)
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
