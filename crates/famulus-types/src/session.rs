//! The session context threaded through every combat and crafting call.
//!
//! There is no process-wide continuation global: [`Session`] is an
//! explicit value passed down the call tree and polled at defined
//! points (before every round, before every production sub-request).
//! Once continuation is denied, every component unwinds without
//! issuing further service calls and without treating the unwind as an
//! error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// How urgent a notice is to the consuming display layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// Routine progress information.
    Normal,
    /// A fatal condition; the run cannot continue.
    Error,
    /// The run was stopped deliberately.
    Abort,
}

/// A single notification for the display layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Urgency of the notice.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// When the notice was raised.
    pub at: DateTime<Utc>,
}

/// Per-run session state: continuation flag, credential, notices.
#[derive(Debug, Clone)]
pub struct Session {
    continue_run: bool,
    credential: Option<String>,
    notices: Vec<Notice>,
}

impl Session {
    /// Start a session. A `None` credential means the session is
    /// unauthenticated: policies force plain attacks and no mana
    /// gating applies.
    pub const fn new(credential: Option<String>) -> Self {
        Self {
            continue_run: true,
            credential,
            notices: Vec::new(),
        }
    }

    /// Whether components may issue further external calls.
    pub const fn permits_continue(&self) -> bool {
        self.continue_run
    }

    /// The authenticated credential, if any.
    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    /// Whether an authenticated session is active.
    pub const fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    /// Raise a notice for the display layer.
    ///
    /// `Error` and `Abort` severities clear the continuation flag:
    /// both represent conditions after which no component may issue
    /// further calls. `Normal` notices never touch the flag.
    pub fn notify(&mut self, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        match severity {
            Severity::Normal => info!(message, "notice"),
            Severity::Error | Severity::Abort => {
                warn!(message, severity = ?severity, "run-ending notice");
                self.continue_run = false;
            }
        }
        self.notices.push(Notice {
            severity,
            message,
            at: Utc::now(),
        });
    }

    /// Remove and return all pending notices, oldest first.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Pending notices, oldest first.
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_permits_continue() {
        let session = Session::new(None);
        assert!(session.permits_continue());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn abort_notice_clears_continuation() {
        let mut session = Session::new(Some(String::from("hash")));
        session.notify(Severity::Abort, "stopped by user");
        assert!(!session.permits_continue());
    }

    #[test]
    fn error_notice_clears_continuation() {
        let mut session = Session::new(None);
        session.notify(Severity::Error, "defeated");
        assert!(!session.permits_continue());
    }

    #[test]
    fn normal_notice_keeps_running() {
        let mut session = Session::new(None);
        session.notify(Severity::Normal, "round resolved");
        assert!(session.permits_continue());
        assert_eq!(session.notices().len(), 1);
    }

    #[test]
    fn drain_empties_the_queue() {
        let mut session = Session::new(None);
        session.notify(Severity::Normal, "one");
        session.notify(Severity::Normal, "two");
        let drained = session.drain_notices();
        assert_eq!(drained.len(), 2);
        assert!(session.notices().is_empty());
    }
}
