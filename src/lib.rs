//! # memcalc-buildpack
//!
//! Stages the JVM memory calculator into a droplet and composes the command
//! that runs it when the container starts.
//!
//! ## Architecture
//!
//! - **version**: Calculator version parsing, ordering and wildcard patterns
//! - **repository**: Version to artifact URI index of a calculator repository
//! - **download**: Artifact fetching with a per-user download cache
//! - **platform**: Host probe selecting the darwin or linux calculator build
//! - **install**: Versioned install state machine (raw copy or tarball extraction)
//! - **scan**: Discovery of class files, Groovy scripts and jars in an application
//! - **probe**: Jar inspection counting class-bearing entries
//! - **counter**: Loaded-class heuristic, or the configured override
//! - **compose**: Deferred calculator invocation for the launch sequence
//! - **droplet**: Droplet sandbox layout and accumulated launch options
//! - **lifecycle**: Detect, compile and release hooks tying it together
//! - **config**: Configuration file, environment overlay and path resolution

pub mod cli;
pub mod compose;
pub mod config;
pub mod counter;
pub mod download;
pub mod droplet;
pub mod error;
pub mod install;
pub mod lifecycle;
pub mod platform;
pub mod probe;
pub mod repository;
pub mod scan;
pub mod version;
