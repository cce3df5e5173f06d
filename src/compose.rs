//! The memory calculator invocation embedded in the launch sequence.
//!
//! The command is composed at staging time but only evaluated when the
//! container starts, so the memory limit is passed by variable name. The
//! composer builds strings; it never runs anything.

use std::path::Path;

use crate::config::Configuration;
use crate::droplet::qualify_path;
use crate::error::Result;
use crate::install::InstalledBinary;

/// Variable holding the container memory limit at launch.
pub const MEMORY_LIMIT_VAR: &str = "MEMORY_LIMIT";

/// Variable receiving the calculator's output at launch.
pub const CALCULATED_MEMORY_VAR: &str = "CALCULATED_MEMORY";

/// Calculator invocation, qualified for execution from `relative_root`.
pub fn build(
    binary: &InstalledBinary,
    relative_root: &Path,
    class_count: u64,
    configuration: &Configuration,
    vm_options: Option<&str>,
) -> Result<String> {
    let stack_threads = configuration.require_stack_threads()?;

    let mut tokens = vec![
        qualify_path(&binary.path, relative_root),
        format!("-totMemory=${MEMORY_LIMIT_VAR}"),
        format!("-stackThreads={stack_threads}"),
        format!("-loadedClasses={class_count}"),
    ];
    if let Some(opts) = vm_options.filter(|s| !s.is_empty()) {
        tokens.push(format!("-vmOptions={}", single_quote(opts)));
    }

    Ok(tokens.join(" "))
}

/// `CALCULATED_MEMORY=$(<command>)`, evaluated by the launch shell.
pub fn deferred_assignment(command: &str) -> String {
    format!("{CALCULATED_MEMORY_VAR}=$({command})")
}

/// Reference to the calculated memory settings for the java options.
pub fn calculated_memory_reference() -> String {
    format!("${CALCULATED_MEMORY_VAR}")
}

/// Wraps `value` in single quotes, closing and reopening around embedded quotes.
fn single_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
