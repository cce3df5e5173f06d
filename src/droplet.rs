use std::path::{Path, PathBuf};

pub const BUILDPACK_DIR: &str = ".java-buildpack";

/// The staged application: its root, this component's sandbox beneath it, and
/// the launch options accumulated during release.
#[derive(Debug, Clone)]
pub struct Droplet {
    root: PathBuf,
    sandbox: PathBuf,
    java_opts: Vec<String>,
    launch_sequence: Vec<String>,
}

impl Droplet {
    pub fn new(root: PathBuf, component_id: &str) -> Self {
        let sandbox = root.join(BUILDPACK_DIR).join(component_id);
        Self {
            root,
            sandbox,
            java_opts: Vec::new(),
            launch_sequence: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sandbox(&self) -> &Path {
        &self.sandbox
    }

    pub fn java_opts(&self) -> &[String] {
        &self.java_opts
    }

    pub fn launch_sequence(&self) -> &[String] {
        &self.launch_sequence
    }

    /// Adds an option that is already shell-formatted and must not be quoted again.
    pub fn add_preformatted_java_opt(&mut self, option: impl Into<String>) {
        self.java_opts.push(option.into());
    }

    pub fn append_launch_step(&mut self, step: impl Into<String>) {
        self.launch_sequence.push(step.into());
    }
}

/// `$PWD`-relative form of `path` for use from the droplet root at launch.
/// Paths outside `root` are returned as they are.
pub fn qualify_path(path: &Path, root: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(relative) => format!("$PWD/{}", relative.display()),
        Err(_) => path.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sandbox_lives_under_the_buildpack_dir() {
        let droplet = Droplet::new(PathBuf::from("/tmp/app"), "memory-calculator");
        assert_eq!(
            droplet.sandbox(),
            Path::new("/tmp/app/.java-buildpack/memory-calculator")
        );
    }

    #[test]
    fn launch_options_keep_insertion_order() {
        let mut droplet = Droplet::new(PathBuf::from("/tmp/app"), "c");
        droplet.append_launch_step("A=$(a)");
        droplet.append_launch_step("B=$(b)");
        droplet.add_preformatted_java_opt("$A");
        assert_eq!(droplet.launch_sequence(), ["A=$(a)", "B=$(b)"]);
        assert_eq!(droplet.java_opts(), ["$A"]);
    }

    #[test]
    fn qualify_path_relativizes_against_root() {
        let root = Path::new("/tmp/app");
        assert_eq!(
            qualify_path(Path::new("/tmp/app/.java-buildpack/c/bin/calc"), root),
            "$PWD/.java-buildpack/c/bin/calc"
        );
        assert_eq!(qualify_path(Path::new("/opt/calc"), root), "/opt/calc");
    }
}
