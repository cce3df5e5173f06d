use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "memcalc-buildpack")]
#[command(about = "Stage the JVM memory calculator and compose its launch-time invocation")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// JSON configuration file; MEMCALC_CONFIG is applied on top of it.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(long, value_name = "DIR", default_value = ".")]
    pub droplet: PathBuf,

    /// Application to scan for classes. Defaults to the droplet root.
    #[arg(long, value_name = "DIR")]
    pub app: Option<PathBuf>,

    #[arg(long, value_name = "DIR")]
    pub cache: Option<PathBuf>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Print the component id and resolved version.
    Detect,
    /// Install the calculator and report the loaded-class estimate.
    Compile,
    /// Print the deferred calculator invocation and launch options.
    Release,
    /// Report the loaded-class count without installing anything.
    Count,
}
