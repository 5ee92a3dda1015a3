//! # simplelog-service - Controller and Writer Actors
//!
//! Asynchronous, buffered logging to stdout, a file, or both. A controller
//! actor owns the lifecycle state and serializes start/stop/reconfigure
//! requests against a writer actor that owns every output handle.
//!
//! Depends on [`simplelog_core`] for domain types and error handling.
//!
//! ## Public API
//!
//! ### Caller Handle
//! - [`LogService`] - Startup, shutdown, init/switch log file, write
//! - [`write_log!`] - Format display values into one record and write it
//!
//! ### Actors
//! - [`ControllerHandle`] - Action, state-check and state-set primitives
//! - [`WriterSettings`] - Flush interval, prefixes and stdout factory for a writer
//!
//! ### Sinks
//! - [`LineSink`] - A destination for rendered record lines
//! - [`StdoutSink`], [`FileSink`] - The two sink implementations
//!
//! ## Example
//!
//! ```no_run
//! use simplelog_service::{write_log, LogService, Target};
//!
//! # async fn run() -> simplelog_service::Result<()> {
//! let service = LogService::new();
//! service.startup(16).await?;
//! service.init_log_file("app.log").await?;
//! write_log!(service, Target::Multi, "answer", 42).await?;
//! service.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod controller;
pub mod protocol;
pub mod service;
pub mod sink;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;
pub mod writer;

pub use controller::{spawn_controller, ControllerHandle};
pub use protocol::{Action, ConfigKind};
pub use service::LogService;
pub use sink::{FileSink, LineSink, LocalLineSink, StdoutSink, StdoutWriter};
pub use writer::{MakeStdout, WriterSettings};

/// Re-exported from `simplelog_core` for convenience.
pub use simplelog_core::{format_values, Error, LogMessage, Result, ServiceState, Target};

/// Write display values, space separated, as one record
///
/// Expands to the future returned by [`LogService::write`]; `.await` it.
/// Pass the service as a place expression (a variable or field).
#[macro_export]
macro_rules! write_log {
    ($service:expr, $target:expr, $($value:expr),+ $(,)?) => {{
        let payload = $crate::format_values(&[$(&$value as &dyn ::std::fmt::Display),+]);
        $service.write($target, payload)
    }};
}
