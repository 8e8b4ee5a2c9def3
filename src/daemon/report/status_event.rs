use std::fmt::{self, Display};

use chrono::{DateTime, Utc};

/// User-facing lifecycle states of the watcher. The `Display` strings are the exact words shown
/// on the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfkStatus {
    /// No session is running.
    Idle,
    /// A session was accepted and the polling loop is starting up.
    Monitoring,
    Active,
    Afk,
    Stopped,
}

impl Display for AfkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            AfkStatus::Idle => "Idle",
            AfkStatus::Monitoring => "Monitoring...",
            AfkStatus::Active => "Active",
            AfkStatus::Afk => "AFK",
            AfkStatus::Stopped => "Stopped",
        };
        f.write_str(text)
    }
}

/// Represents a status change at a certain point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub status: AfkStatus,
    pub moment: DateTime<Utc>,
}
