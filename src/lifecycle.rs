use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use crate::compose;
use crate::config::{Configuration, LaunchEnvironment};
use crate::counter::{self, ClassCount};
use crate::download::Downloader;
use crate::droplet::Droplet;
use crate::error::Result;
use crate::install::{InstalledBinary, VersionedInstaller, binary_path};
use crate::platform::Platform;
use crate::repository::RepositoryIndex;
use crate::version::{DependencyVersion, VersionPattern};

pub const COMPONENT_ID: &str = "open_jdk_like_memory_calculator";
pub const COMPONENT_NAME: &str = "open-jdk-like-memory-calculator";

#[derive(Debug, Serialize)]
pub struct CompileSummary {
    pub version: DependencyVersion,
    pub binary: InstalledBinary,
    pub class_count: ClassCount,
    pub stack_threads: u32,
    pub java_opts: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReleaseOutput {
    pub command: String,
    pub java_opts: Vec<String>,
    pub launch_sequence: Vec<String>,
}

/// Everything staging needs besides the resolved artifact.
#[derive(Debug, Clone)]
pub struct StagingContext {
    pub configuration: Configuration,
    pub environment: LaunchEnvironment,
    pub application_root: PathBuf,
    pub droplet: Droplet,
    pub platform: Platform,
}

/// Stages the memory calculator for one droplet.
pub struct MemoryCalculator<'a> {
    version: DependencyVersion,
    uri: String,
    configuration: Configuration,
    environment: LaunchEnvironment,
    application_root: PathBuf,
    platform: Platform,
    downloader: &'a dyn Downloader,
    droplet: Droplet,
}

impl<'a> MemoryCalculator<'a> {
    pub fn new(
        version: DependencyVersion,
        uri: String,
        context: StagingContext,
        downloader: &'a dyn Downloader,
    ) -> Self {
        let StagingContext {
            configuration,
            environment,
            application_root,
            droplet,
            platform,
        } = context;
        Self {
            version,
            uri,
            configuration,
            environment,
            application_root,
            platform,
            downloader,
            droplet,
        }
    }

    /// Resolves the configured version pattern against the repository index.
    pub fn resolve(
        configuration: &Configuration,
        platform: Platform,
        downloader: &dyn Downloader,
    ) -> Result<(DependencyVersion, String)> {
        let pattern: VersionPattern = configuration.version.parse()?;
        let root = configuration.repository_root_for(platform)?;
        let index = RepositoryIndex::load(downloader, &root)?;
        index.resolve(&pattern)
    }

    pub fn droplet(&self) -> &Droplet {
        &self.droplet
    }

    pub fn version(&self) -> &DependencyVersion {
        &self.version
    }

    pub fn detect(&self) -> String {
        format!("{COMPONENT_NAME}={}", self.version)
    }

    pub fn installed_path(&self) -> PathBuf {
        binary_path(self.droplet.sandbox(), &self.version)
    }

    pub fn compile(&self) -> Result<CompileSummary> {
        let stack_threads = self.configuration.require_stack_threads()?;

        let mut installer = VersionedInstaller::new(self.downloader, self.platform);
        let binary = installer.install(&self.version, &self.uri, self.droplet.sandbox())?;

        let class_count = counter::resolve(&self.application_root, &self.configuration)?;
        let java_opts = self.environment.vm_options().map(str::to_string);

        info!(
            "Loaded Classes: {}, Threads: {}, JAVA_OPTS: '{}'",
            class_count.loaded_classes,
            stack_threads,
            java_opts.as_deref().unwrap_or_default()
        );

        Ok(CompileSummary {
            version: self.version.clone(),
            binary,
            class_count,
            stack_threads,
            java_opts,
        })
    }

    /// The calculator invocation wrapped as a deferred shell assignment.
    pub fn memory_calculation_command(&self) -> Result<String> {
        let binary = InstalledBinary {
            path: self.installed_path(),
            version: self.version.clone(),
            strategy: self.version.unpack_strategy(),
            fresh: false,
        };
        let class_count = counter::compute(&self.application_root, &self.configuration)?;
        let command = compose::build(
            &binary,
            self.droplet.root(),
            class_count,
            &self.configuration,
            self.environment.vm_options(),
        )?;
        Ok(compose::deferred_assignment(&command))
    }

    pub fn release(&mut self) -> Result<ReleaseOutput> {
        let command = self.memory_calculation_command()?;
        self.droplet.append_launch_step(command.clone());
        self.droplet
            .add_preformatted_java_opt(compose::calculated_memory_reference());

        Ok(ReleaseOutput {
            command,
            java_opts: self.droplet.java_opts().to_vec(),
            launch_sequence: self.droplet.launch_sequence().to_vec(),
        })
    }
}
