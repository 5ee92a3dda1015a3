//! Core domain types for the log service

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Destination of a log record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    #[default]
    Stdout,
    File,
    /// Stdout first, then the file
    Multi,
}

/// A single output a record can be routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sink {
    Stdout,
    File,
}

impl Target {
    /// Ordered list of sinks this target writes to
    pub fn sinks(self) -> &'static [Sink] {
        match self {
            Target::Stdout => &[Sink::Stdout],
            Target::File => &[Sink::File],
            Target::Multi => &[Sink::Stdout, Sink::File],
        }
    }

    /// Whether writing to this target needs an initialized log file
    pub fn needs_file(self) -> bool {
        self.sinks().contains(&Sink::File)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Target::Stdout => "stdout",
            Target::File => "file",
            Target::Multi => "multi",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdout" => Ok(Target::Stdout),
            "file" => Ok(Target::File),
            "multi" | "both" => Ok(Target::Multi),
            _ => Err(Error::unknown_target(s)),
        }
    }
}

/// A log record on its way to the writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessage {
    target: Target,
    payload: String,
}

impl LogMessage {
    pub fn new(target: Target, payload: impl Into<String>) -> Self {
        Self {
            target,
            payload: payload.into(),
        }
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }
}

/// Lifecycle phase of the log service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ServiceState {
    /// No writer is alive; writes are rejected
    #[default]
    Stopped,
    /// Writer spawned, not yet confirmed running
    Starting,
    /// Writer is accepting records
    Running,
    /// Stop signalled, writer is draining
    Stopping,
}

impl ServiceState {
    /// Transition table of the service lifecycle
    ///
    /// `Starting -> Stopped` covers a writer that exits before it ever
    /// reported itself running.
    pub fn can_transition_to(self, next: ServiceState) -> bool {
        use ServiceState::*;
        matches!(
            (self, next),
            (Stopped, Starting)
                | (Starting, Running)
                | (Starting, Stopped)
                | (Running, Stopping)
                | (Stopping, Stopped)
        )
    }

    /// Apply a transition, returning the new state
    pub fn transition(self, next: ServiceState) -> crate::Result<ServiceState> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(Error::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn is_running(self) -> bool {
        self == ServiceState::Running
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceState::Stopped => "Stopped",
            ServiceState::Starting => "Starting",
            ServiceState::Running => "Running",
            ServiceState::Stopping => "Stopping",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_sinks() {
        assert_eq!(Target::Stdout.sinks(), &[Sink::Stdout]);
        assert_eq!(Target::File.sinks(), &[Sink::File]);
        assert_eq!(Target::Multi.sinks(), &[Sink::Stdout, Sink::File]);
    }

    #[test]
    fn test_target_needs_file() {
        assert!(!Target::Stdout.needs_file());
        assert!(Target::File.needs_file());
        assert!(Target::Multi.needs_file());
    }

    #[test]
    fn test_target_from_str() {
        assert_eq!("stdout".parse::<Target>().unwrap(), Target::Stdout);
        assert_eq!("FILE".parse::<Target>().unwrap(), Target::File);
        assert_eq!(" multi ".parse::<Target>().unwrap(), Target::Multi);
        assert_eq!("both".parse::<Target>().unwrap(), Target::Multi);
    }

    #[test]
    fn test_unknown_target_is_an_error() {
        let err = "syslog".parse::<Target>().unwrap_err();
        assert!(matches!(err, Error::UnknownTarget { ref name } if name == "syslog"));
    }

    #[test]
    fn test_target_serde_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            target: Target,
        }
        let w: Wrapper = toml::from_str("target = \"multi\"").unwrap();
        assert_eq!(w.target, Target::Multi);
    }

    #[test]
    fn test_log_message_accessors() {
        let msg = LogMessage::new(Target::File, "answer 42");
        assert_eq!(msg.target(), Target::File);
        assert_eq!(msg.payload(), "answer 42");
    }

    #[test]
    fn test_lifecycle_alternates() {
        let state = ServiceState::Stopped;
        let state = state.transition(ServiceState::Starting).unwrap();
        let state = state.transition(ServiceState::Running).unwrap();
        let state = state.transition(ServiceState::Stopping).unwrap();
        let state = state.transition(ServiceState::Stopped).unwrap();
        assert_eq!(state, ServiceState::Stopped);
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        use ServiceState::*;
        for (from, to) in [
            (Stopped, Running),
            (Stopped, Stopping),
            (Stopped, Stopped),
            (Running, Running),
            (Running, Starting),
            (Running, Stopped),
            (Stopping, Running),
            (Stopping, Starting),
            (Starting, Stopping),
        ] {
            assert!(
                from.transition(to).is_err(),
                "{from} -> {to} should be rejected"
            );
        }
    }

    #[test]
    fn test_aborted_startup_returns_to_stopped() {
        assert!(ServiceState::Starting.can_transition_to(ServiceState::Stopped));
    }

    #[test]
    fn test_default_state_is_stopped() {
        assert_eq!(ServiceState::default(), ServiceState::Stopped);
        assert!(!ServiceState::default().is_running());
        assert!(ServiceState::Running.is_running());
    }
}
