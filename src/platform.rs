use std::fmt;

/// Variant of the memory calculator packaged inside second-generation archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Darwin,
    Linux,
}

impl Platform {
    /// Probes the host once. Only macOS selects the darwin build.
    pub fn detect() -> Self {
        Self::from_os_name(std::env::consts::OS)
    }

    /// Maps a kernel or OS name (`uname -s` style, or Rust's `macos`) to a variant.
    pub fn from_os_name(name: &str) -> Self {
        let name = name.trim();
        if name.eq_ignore_ascii_case("darwin") || name.eq_ignore_ascii_case("macos") {
            Self::Darwin
        } else {
            Self::Linux
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Darwin => "darwin",
            Self::Linux => "linux",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
