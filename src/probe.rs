use memmap2::Mmap;
use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::scan::{CLASS_EXTENSION, SCRIPT_EXTENSION};

/// True for archive entry names ending in `.class` or `.groovy`.
pub fn is_class_bearing_entry(name: &str) -> bool {
    [CLASS_EXTENSION, SCRIPT_EXTENSION]
        .iter()
        .any(|ext| name.strip_suffix(ext).is_some_and(|stem| stem.ends_with('.')))
}

/// Number of class and script entries in a jar, counted from the central
/// directory by name. Entries are never decompressed and nested jars are not
/// opened.
pub fn archive_class_count(jar_path: &Path) -> Result<u64> {
    let file = File::open(jar_path).map_err(|e| Error::io(jar_path, e))?;
    // SAFETY: The file is opened read-only and outlives the mapping, which is
    // dropped at the end of this function.
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| Error::io(jar_path, e))?;
    let archive = ZipArchive::new(Cursor::new(&mmap[..])).map_err(|e| {
        Error::io(
            jar_path,
            std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        )
    })?;

    let count = archive
        .file_names()
        .filter(|name| is_class_bearing_entry(name))
        .count();
    Ok(count as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, Ordering};
    use zip::write::{FileOptions, ZipWriter};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_jar_path() -> PathBuf {
        let mut p = std::env::temp_dir();
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        p.push(format!(
            "memcalc-probe-{}-{}-{}.jar",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_millis(),
            n
        ));
        p
    }

    #[test]
    fn entry_names_are_matched_on_extension() {
        assert!(is_class_bearing_entry("org/example/A.class"));
        assert!(is_class_bearing_entry("org/example/A$Inner.class"));
        assert!(is_class_bearing_entry("scripts/build.groovy"));
        assert!(!is_class_bearing_entry("META-INF/MANIFEST.MF"));
        assert!(!is_class_bearing_entry("org/example/"));
        assert!(!is_class_bearing_entry("lib/inner.jar"));
        assert!(!is_class_bearing_entry("A.classes"));
    }

    #[test]
    fn counts_class_and_script_entries() {
        let jar_path = temp_jar_path();
        let file = fs::File::create(&jar_path).unwrap();
        let mut zip = ZipWriter::new(file);

        for name in [
            "META-INF/MANIFEST.MF",
            "org/example/A.class",
            "org/example/A$Inner.class",
            "org/example/Build.groovy",
            "BOOT-INF/lib/nested.jar",
        ] {
            zip.start_file(name, FileOptions::default()).unwrap();
            zip.write_all(b"dummy").unwrap();
        }
        zip.add_directory("org/example/", FileOptions::default())
            .unwrap();
        zip.finish().unwrap();

        assert_eq!(archive_class_count(&jar_path).unwrap(), 3);

        let _ = fs::remove_file(&jar_path);
    }

    /// Rewrites the compression method of every local and central header.
    fn set_compression_method(bytes: &mut [u8], method: u16) {
        const LOCAL_HEADER: [u8; 4] = [0x50, 0x4b, 0x03, 0x04];
        const CENTRAL_HEADER: [u8; 4] = [0x50, 0x4b, 0x01, 0x02];
        let mut i = 0;
        while i + 12 <= bytes.len() {
            let offset = match &bytes[i..i + 4] {
                sig if sig == LOCAL_HEADER => Some(8),
                sig if sig == CENTRAL_HEADER => Some(10),
                _ => None,
            };
            if let Some(offset) = offset {
                bytes[i + offset..i + offset + 2].copy_from_slice(&method.to_le_bytes());
            }
            i += 1;
        }
    }

    #[test]
    fn entries_with_unsupported_compression_are_still_counted() {
        let jar_path = temp_jar_path();
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let stored = FileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for name in ["a/A.class", "a/B.class", "META-INF/MANIFEST.MF"] {
            zip.start_file(name, stored).unwrap();
            zip.write_all(b"dummy").unwrap();
        }
        let mut bytes = zip.finish().unwrap().into_inner();
        // bzip2, which this build cannot decompress
        set_compression_method(&mut bytes, 12);
        fs::write(&jar_path, &bytes).unwrap();

        assert_eq!(archive_class_count(&jar_path).unwrap(), 2);

        let _ = fs::remove_file(&jar_path);
    }

    #[test]
    fn corrupt_archive_is_an_error() {
        let jar_path = temp_jar_path();
        fs::write(&jar_path, b"definitely not a zip file").unwrap();

        assert!(archive_class_count(&jar_path).is_err());

        let _ = fs::remove_file(&jar_path);
    }
}
