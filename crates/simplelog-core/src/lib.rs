//! # simplelog-core - Core Domain Types
//!
//! Foundation crate for simplelog. Provides the record and lifecycle types,
//! error handling, line formatting and service configuration.
//!
//! ## Public API
//!
//! ### Domain Types (`types`)
//! - [`Target`] - Destination of a record (Stdout, File, Multi)
//! - [`Sink`] - A single output a target expands to
//! - [`LogMessage`] - A record on its way to the writer
//! - [`ServiceState`] - Lifecycle phase with its transition table
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Error enum with `misuse` vs `fatal` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ### Formatting (`format`)
//! - [`format_values()`] - Join display values into one payload
//!
//! ### Configuration (`config`)
//! - [`ServiceConfig`] - Buffer size, log file, archiving, flush interval, prefixes
//! - [`load_config()`] - Load from TOML, falling back to defaults

pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod prelude;
pub mod types;

pub use config::{load_config, write_default_config, ServiceConfig, CONFIG_FILENAME};
pub use error::{Error, Result, ResultExt};
pub use format::format_values;
pub use types::{LogMessage, ServiceState, Sink, Target};
