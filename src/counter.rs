//! Loaded-class estimation.
//!
//! The JVM never loads most of the classes an application ships, but it always
//! loads a few thousand of its own. The estimate is therefore one fifth of the
//! class-bearing entries found in the application, rounded up, plus a fixed
//! baseline. An explicit `class_count` in the configuration replaces the
//! estimate entirely and suppresses the scan.

use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

use crate::config::Configuration;
use crate::error::Result;
use crate::probe::archive_class_count;
use crate::scan::scan_application;

/// Classes the JVM loads regardless of application size.
pub const BASELINE_CLASSES: u64 = 5500;

/// One in five shipped classes is expected to be loaded.
pub const LOADED_CLASS_DIVISOR: u64 = 5;

pub fn loaded_classes_heuristic(entries: u64) -> u64 {
    entries.div_ceil(LOADED_CLASS_DIVISOR) + BASELINE_CLASSES
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassTally {
    pub class_files: u64,
    pub script_files: u64,
    pub archives: u64,
    pub archive_entries: u64,
    /// Archives that could not be opened; each contributes zero entries.
    pub unreadable_archives: u64,
}

impl ClassTally {
    pub fn total(&self) -> u64 {
        self.class_files + self.script_files + self.archive_entries
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountSource {
    Configured,
    Estimated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassCount {
    pub loaded_classes: u64,
    pub source: CountSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tally: Option<ClassTally>,
}

/// Loaded-class count for the application at `root`.
pub fn compute(root: &Path, configuration: &Configuration) -> Result<u64> {
    resolve(root, configuration).map(|count| count.loaded_classes)
}

/// Like [`compute`], but reports where the number came from.
pub fn resolve(root: &Path, configuration: &Configuration) -> Result<ClassCount> {
    if let Some(configured) = configuration.class_count {
        return Ok(ClassCount {
            loaded_classes: configured,
            source: CountSource::Configured,
            tally: None,
        });
    }

    let tally = tally(root)?;
    Ok(ClassCount {
        loaded_classes: loaded_classes_heuristic(tally.total()),
        source: CountSource::Estimated,
        tally: Some(tally),
    })
}

pub fn tally(root: &Path) -> Result<ClassTally> {
    let files = scan_application(root)?;

    let per_archive: Vec<Option<u64>> = files
        .archives
        .par_iter()
        .map(|jar| match archive_class_count(jar) {
            Ok(count) => Some(count),
            Err(err) => {
                debug!("Counting {} as empty: {}", jar.display(), err);
                None
            }
        })
        .collect();

    Ok(ClassTally {
        class_files: files.class_files,
        script_files: files.script_files,
        archives: per_archive.len() as u64,
        archive_entries: per_archive.iter().flatten().sum(),
        unreadable_archives: per_archive.iter().filter(|c| c.is_none()).count() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};
    use zip::write::FileOptions;

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "memcalc_counter_test_{}_{}_{}",
            std::process::id(),
            nanos,
            name
        ))
    }

    fn write_jar(path: &Path, entries: &[&str]) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        let mut zip = zip::ZipWriter::new(file);
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        for name in entries {
            zip.start_file(*name, options)?;
            zip.write_all(b"")?;
        }
        zip.finish()?;
        Ok(())
    }

    fn write_file(path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, b"")?;
        Ok(())
    }

    #[test]
    fn heuristic_boundaries() {
        assert_eq!(loaded_classes_heuristic(0), 5500);
        assert_eq!(loaded_classes_heuristic(1), 5501);
        assert_eq!(loaded_classes_heuristic(5), 5501);
        assert_eq!(loaded_classes_heuristic(7), 5502);
        assert_eq!(loaded_classes_heuristic(10_000), 7500);
    }

    #[test]
    fn heuristic_is_monotonic() {
        let mut previous = loaded_classes_heuristic(0);
        for n in 1..500 {
            let current = loaded_classes_heuristic(n);
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn configured_count_skips_the_scan() {
        let missing = temp_dir("never_created");
        let configuration = Configuration {
            class_count: Some(9000),
            ..Configuration::default()
        };

        let count = resolve(&missing, &configuration).unwrap();
        assert_eq!(count.loaded_classes, 9000);
        assert_eq!(count.source, CountSource::Configured);
        assert!(count.tally.is_none());

        assert!(compute(&missing, &Configuration::default()).is_err());
    }

    #[test]
    fn empty_application_gets_the_baseline() -> anyhow::Result<()> {
        let root = temp_dir("empty");
        std::fs::create_dir_all(&root)?;
        write_file(&root.join("README.txt"))?;

        assert_eq!(compute(&root, &Configuration::default())?, 5500);

        std::fs::remove_dir_all(root)?;
        Ok(())
    }

    #[test]
    fn counts_files_and_archive_entries() -> anyhow::Result<()> {
        let root = temp_dir("mixed");
        write_file(&root.join("classes/org/example/A.class"))?;
        write_file(&root.join("classes/org/example/B.class"))?;
        write_file(&root.join("scripts/App.groovy"))?;
        write_jar(
            &root.join("lib/dep.jar"),
            &["org/dep/C.class", "org/dep/D.class", "META-INF/MANIFEST.MF"],
        )?;
        write_jar(&root.join("lib/more.jar"), &["org/more/E.groovy"])?;
        std::fs::write(root.join("lib/broken.jar"), b"not a zip")?;

        let tally = tally(&root)?;
        assert_eq!(
            tally,
            ClassTally {
                class_files: 2,
                script_files: 1,
                archives: 3,
                archive_entries: 3,
                unreadable_archives: 1,
            }
        );
        assert_eq!(tally.total(), 6);

        let count = resolve(&root, &Configuration::default())?;
        assert_eq!(count.source, CountSource::Estimated);
        assert_eq!(count.loaded_classes, 5502);

        std::fs::remove_dir_all(root)?;
        Ok(())
    }
}
