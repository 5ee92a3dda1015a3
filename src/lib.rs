//! simplelog Library
//!
//! Asynchronous, buffered logging to stdout, a file, or both, driven by a
//! controller actor and a writer actor. This crate re-exports the workspace
//! crates and hosts the pieces behind the `simplelog` binary.

pub mod pipe;
pub mod signals;

pub use simplelog_core::{
    config, format, load_config, logging, Error, LogMessage, Result, ServiceConfig,
    ServiceState, Target,
};
pub use simplelog_service::{write_log, LogService};
