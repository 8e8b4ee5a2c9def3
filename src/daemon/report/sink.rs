use ansi_term::{Colour, Style};
use anyhow::Result;

use super::status_event::{AfkStatus, StatusEvent};

/// Represents a write-only status display. This should realistically be able to abstract over
/// different surfaces: console line, desktop notification, tray tooltip.
pub trait StatusSink {
    fn push_status(&mut self, event: StatusEvent) -> impl std::future::Future<Output = Result<()>>;

    fn finalize(&mut self) -> impl std::future::Future<Output = Result<()>>;
}

fn status_style(status: AfkStatus) -> Style {
    match status {
        AfkStatus::Active => Colour::Green.normal(),
        AfkStatus::Afk => Colour::Red.bold(),
        AfkStatus::Stopped => Colour::Yellow.normal(),
        AfkStatus::Idle | AfkStatus::Monitoring => Style::new(),
    }
}

/// Prints one line per transition to stdout.
pub struct ConsoleStatusSink;

impl StatusSink for ConsoleStatusSink {
    async fn push_status(&mut self, event: StatusEvent) -> Result<()> {
        println!(
            "[{}] Status: {}",
            event.moment.format("%H:%M:%S"),
            status_style(event.status).paint(event.status.to_string())
        );
        Ok(())
    }

    async fn finalize(&mut self) -> Result<()> {
        Ok(())
    }
}
