//! Component configuration and the launch environment.
//!
//! Configuration comes from an optional JSON file, overlaid key by key with the
//! JSON object in `MEMCALC_CONFIG`. The environment is read once, at the process
//! boundary, and handed to the rest of the crate as plain values.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::error::{Error, Result};
use crate::platform::Platform;

pub const CONFIG_ENV: &str = "MEMCALC_CONFIG";
pub const JAVA_OPTS_ENV: &str = "JAVA_OPTS";
pub const DEFAULT_VERSION: &str = "3.+";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Configuration {
    /// Version pattern resolved against the repository index.
    pub version: String,
    /// Repository holding `index.json`; `{platform}` is substituted.
    pub repository_root: Option<String>,
    /// Explicit loaded-class count. Skips the application scan when set.
    pub class_count: Option<u64>,
    pub stack_threads: Option<u32>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            repository_root: None,
            class_count: None,
            stack_threads: None,
        }
    }
}

impl Configuration {
    /// Loads `file` (if any) and applies `overlay`, a JSON object, on top of it.
    pub fn load(file: Option<&Path>, overlay: Option<&str>) -> Result<Self> {
        let mut merged = Map::new();

        if let Some(path) = file {
            let raw = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
            merge_object(&mut merged, parse_object(&raw, &path.display().to_string())?);
        }
        if let Some(raw) = overlay.filter(|s| !s.trim().is_empty()) {
            merge_object(&mut merged, parse_object(raw, CONFIG_ENV)?);
        }

        serde_json::from_value(Value::Object(merged))
            .map_err(|e| Error::Config(format!("unrecognized configuration: {e}")))
    }

    pub fn require_stack_threads(&self) -> Result<u32> {
        self.stack_threads.ok_or(Error::MissingStackThreads)
    }

    pub fn repository_root_for(&self, platform: Platform) -> Result<String> {
        let root = self
            .repository_root
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| Error::Config("repository_root is not configured".to_string()))?;
        Ok(root.replace("{platform}", platform.as_str()))
    }
}

fn parse_object(raw: &str, origin: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(Error::Config(format!("{origin} must contain a JSON object"))),
        Err(e) => Err(Error::Config(format!("{origin} is not valid JSON: {e}"))),
    }
}

fn merge_object(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        target.insert(key, value);
    }
}

/// Values the launch step passes through from the staging environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchEnvironment {
    pub java_opts: Option<String>,
}

impl LaunchEnvironment {
    pub fn from_env() -> Self {
        Self {
            java_opts: std::env::var(JAVA_OPTS_ENV).ok(),
        }
    }

    /// Passthrough VM options, `None` when unset or empty. Whitespace is kept.
    pub fn vm_options(&self) -> Option<&str> {
        self.java_opts.as_deref().filter(|s| !s.is_empty())
    }
}

pub fn resolve_configuration(cli: &Cli) -> Result<Configuration> {
    let overlay = std::env::var(CONFIG_ENV).ok();
    Configuration::load(cli.config.as_deref(), overlay.as_deref())
}

/// The application defaults to the droplet root, as it does when staging.
pub fn resolve_app_root(cli: &Cli) -> PathBuf {
    cli.app.clone().unwrap_or_else(|| cli.droplet.clone())
}

pub fn resolve_cache_dir(cli: &Cli) -> Result<PathBuf> {
    if let Some(p) = cli.cache.clone() {
        return Ok(p);
    }

    let base = dirs::cache_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| Error::Config("Failed to resolve a cache directory".to_string()))?;
    Ok(base.join("memcalc-buildpack").join("downloads"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "memcalc_config_test_{}_{}_{}",
            std::process::id(),
            nanos,
            name
        ))
    }

    #[test]
    fn defaults_without_sources() {
        let config = Configuration::load(None, None).unwrap();
        assert_eq!(config.version, DEFAULT_VERSION);
        assert_eq!(config.class_count, None);
        assert!(matches!(
            config.require_stack_threads(),
            Err(Error::MissingStackThreads)
        ));
    }

    #[test]
    fn overlay_wins_over_file() -> anyhow::Result<()> {
        let path = temp_path("overlay.json");
        std::fs::write(
            &path,
            r#"{"version":"1.+","stack_threads":200,"class_count":100}"#,
        )?;

        let config = Configuration::load(Some(&path), Some(r#"{"class_count":9000}"#))?;
        assert_eq!(config.version, "1.+");
        assert_eq!(config.stack_threads, Some(200));
        assert_eq!(config.class_count, Some(9000));

        std::fs::remove_file(path)?;
        Ok(())
    }

    #[test]
    fn rejects_unknown_keys_and_non_objects() {
        assert!(Configuration::load(None, Some(r#"{"stack_thread":5}"#)).is_err());
        assert!(Configuration::load(None, Some("[1,2]")).is_err());
        assert!(Configuration::load(None, Some("{")).is_err());
    }

    #[test]
    fn repository_root_substitutes_platform() {
        let config = Configuration {
            repository_root: Some("https://repo.example/memory-calculator/{platform}/x86_64".into()),
            ..Configuration::default()
        };
        assert_eq!(
            config.repository_root_for(Platform::Darwin).unwrap(),
            "https://repo.example/memory-calculator/darwin/x86_64"
        );
        assert!(Configuration::default().repository_root_for(Platform::Linux).is_err());
    }

    #[test]
    fn only_empty_java_opts_are_ignored() {
        let env = LaunchEnvironment {
            java_opts: Some(String::new()),
        };
        assert_eq!(env.vm_options(), None);
        assert_eq!(LaunchEnvironment::default().vm_options(), None);
        let env = LaunchEnvironment {
            java_opts: Some("  ".to_string()),
        };
        assert_eq!(env.vm_options(), Some("  "));
        let env = LaunchEnvironment {
            java_opts: Some("-Xss512k -XX:+UseG1GC".to_string()),
        };
        assert_eq!(env.vm_options(), Some("-Xss512k -XX:+UseG1GC"));
    }
}
