use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tracing::debug;

use crate::error::{Error, Result};

pub const CLASS_EXTENSION: &str = "class";
pub const SCRIPT_EXTENSION: &str = "groovy";
pub const ARCHIVE_EXTENSION: &str = "jar";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Class,
    Script,
    Archive,
}

impl FileKind {
    pub fn of(path: &Path) -> Option<Self> {
        let ext = path.extension()?;
        if ext == CLASS_EXTENSION {
            Some(Self::Class)
        } else if ext == SCRIPT_EXTENSION {
            Some(Self::Script)
        } else if ext == ARCHIVE_EXTENSION {
            Some(Self::Archive)
        } else {
            None
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct ApplicationFiles {
    pub class_files: u64,
    pub script_files: u64,
    pub archives: Vec<PathBuf>,
}

/// Walks `root` for class files, Groovy scripts and jars.
///
/// Hidden files and directories are skipped (this keeps the droplet's own
/// `.java-buildpack` sandbox out of the count). Symlinked directories are not
/// descended into, but symlinks to regular files are counted like the files
/// themselves. Entries that cannot be read are skipped.
pub fn scan_application(root: &Path) -> Result<ApplicationFiles> {
    if !root.is_dir() {
        return Err(Error::ApplicationRoot(root.to_path_buf()));
    }

    let (tx, rx) = mpsc::channel();

    let walker = WalkBuilder::new(root)
        .hidden(true)
        .ignore(false)
        .parents(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .build_parallel();

    walker.run(|| {
        let tx = tx.clone();
        Box::new(move |entry| {
            match entry {
                Ok(entry) => {
                    let is_file = entry.file_type().is_some_and(|t| {
                        t.is_file() || (t.is_symlink() && entry.path().is_file())
                    });
                    if let Some(kind) = FileKind::of(entry.path()).filter(|_| is_file) {
                        let _ = tx.send((kind, entry.into_path()));
                    }
                }
                Err(err) => debug!("Skipping unreadable entry: {}", err),
            }
            ignore::WalkState::Continue
        })
    });

    drop(tx);

    let mut files = ApplicationFiles::default();
    for (kind, path) in rx.iter() {
        match kind {
            FileKind::Class => files.class_files += 1,
            FileKind::Script => files.script_files += 1,
            FileKind::Archive => files.archives.push(path),
        }
    }
    files.archives.sort();
    Ok(files)
}
