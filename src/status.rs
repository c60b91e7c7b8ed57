//! Status events emitted while a report runs.
//!
//! The pipeline never writes to a UI itself. It reports what happens to a
//! [`StatusObserver`]; [`Diagnostics`] keeps a timestamped running log and
//! mirrors every event to the `log` facade.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Error,
    Success,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "INFO",
            Severity::Error => "ERROR",
            Severity::Success => "OK",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct StatusEvent {
    pub severity: Severity,
    pub message: String,
    pub at: DateTime<Local>,
}

impl StatusEvent {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        StatusEvent {
            severity,
            message: message.into(),
            at: Local::now(),
        }
    }
}

impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}",
            self.at.format("%H:%M:%S"),
            self.severity,
            self.message
        )
    }
}

pub trait StatusObserver {
    fn notify(&mut self, event: StatusEvent);

    fn info(&mut self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.notify(StatusEvent::new(Severity::Info, message));
    }

    fn error(&mut self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.notify(StatusEvent::new(Severity::Error, message));
    }

    fn success(&mut self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.notify(StatusEvent::new(Severity::Success, message));
    }
}

/// Discards every event.
pub struct Silent;

impl StatusObserver for Silent {
    fn notify(&mut self, _event: StatusEvent) {}
}

/// Running diagnostic log for one run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Diagnostics {
    events: Vec<StatusEvent>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[StatusEvent] {
        &self.events
    }

    pub fn latest(&self) -> Option<&StatusEvent> {
        self.events.last()
    }

    /// The event a status badge shows: the last error or success, or the
    /// last event when the run has not finished.
    pub fn headline(&self) -> Option<&StatusEvent> {
        self.events
            .iter()
            .rev()
            .find(|e| e.severity != Severity::Info)
            .or_else(|| self.events.last())
    }

    pub fn lines(&self) -> Vec<String> {
        self.events.iter().map(|e| e.to_string()).collect()
    }
}

impl StatusObserver for Diagnostics {
    fn notify(&mut self, event: StatusEvent) {
        match event.severity {
            Severity::Error => log::error!("{}", event.message),
            Severity::Info | Severity::Success => log::info!("{}", event.message),
        }
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_keep_events_in_order() {
        let mut diag = Diagnostics::new();
        diag.info("reading file");
        diag.error("header not found");

        assert_eq!(diag.events().len(), 2);
        assert_eq!(diag.events()[0].severity, Severity::Info);
        let latest = diag.latest().unwrap();
        assert_eq!(latest.severity, Severity::Error);
        assert!(diag.lines()[1].ends_with("ERROR header not found"));

        diag.info("header row found: []");
        assert_eq!(diag.headline().unwrap().message, "header not found");
    }
}
