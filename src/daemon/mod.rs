use std::time::Duration;

use anyhow::{Result, bail};
use monitor::{MonitorModule, afk::AfkEvaluator};
use report::{ReportModule, sink::ConsoleStatusSink, status_event::StatusEvent};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::{
    input_api::{GenericInputManager, InputManager},
    utils::clock::{Clock, DefaultClock},
};

pub mod args;
pub mod monitor;
pub mod report;
pub mod shutdown;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

pub const MIN_AFK_TIMEOUT_SECONDS: u64 = 5;

/// Settings of one monitoring session, fixed before the session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    afk_timeout: Duration,
}

impl SessionConfig {
    /// Validates the user-supplied timeout against the [MIN_AFK_TIMEOUT_SECONDS] floor.
    pub fn from_seconds(seconds: u64) -> Result<Self> {
        if seconds < MIN_AFK_TIMEOUT_SECONDS {
            bail!("AFK timeout must be at least {MIN_AFK_TIMEOUT_SECONDS} seconds");
        }
        Ok(Self {
            afk_timeout: Duration::from_secs(seconds),
        })
    }

    pub fn afk_timeout(&self) -> Duration {
        self.afk_timeout
    }
}

/// Represents the starting point for one monitoring session. Resolves only after the session was
/// stopped.
pub async fn start_session(config: SessionConfig) -> Result<()> {
    let (sender, receiver) = mpsc::channel::<StatusEvent>(10);
    let manager = GenericInputManager::new()?;

    let shutdown_token = CancellationToken::new();

    let monitor = create_monitor(sender, manager, &shutdown_token, config, DefaultClock);

    let reporter = ReportModule::new(receiver, ConsoleStatusSink);

    let (_, monitor_result, report_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token),
        monitor.run(),
        reporter.run(),
    );

    if let Err(monitor_result) = monitor_result {
        error!("Monitor module got an error {:?}", monitor_result);
    }

    if let Err(report_result) = report_result {
        error!("Report module got an error {:?}", report_result);
    }

    Ok(())
}

fn create_monitor(
    sender: mpsc::Sender<StatusEvent>,
    manager: impl InputManager + 'static,
    shutdown_token: &CancellationToken,
    config: SessionConfig,
    clock: impl Clock,
) -> MonitorModule {
    MonitorModule::new(
        sender,
        Box::new(manager),
        shutdown_token.clone(),
        AfkEvaluator::from_timeout(config.afk_timeout()),
        DEFAULT_POLL_INTERVAL,
        Box::new(clock),
    )
}

#[cfg(test)]
mod daemon_tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use anyhow::Result;
    use tokio::{sync::mpsc, time::Instant};
    use tokio_util::sync::CancellationToken;

    use crate::{
        daemon::{
            SessionConfig, create_monitor,
            report::status_event::{AfkStatus, StatusEvent},
        },
        input_api::MockInputManager,
        utils::{clock::DefaultClock, logging::TEST_LOGGING},
    };

    #[test]
    fn rejects_timeouts_below_the_floor() {
        assert!(SessionConfig::from_seconds(0).is_err());
        assert!(SessionConfig::from_seconds(3).is_err());
        assert!(SessionConfig::from_seconds(4).is_err());

        let error = SessionConfig::from_seconds(3).unwrap_err();
        assert!(error.to_string().contains("at least 5 seconds"));
    }

    #[test]
    fn accepts_timeouts_at_and_above_the_floor() {
        assert_eq!(
            SessionConfig::from_seconds(5).unwrap().afk_timeout(),
            Duration::from_secs(5)
        );
        assert_eq!(
            SessionConfig::from_seconds(30).unwrap().afk_timeout(),
            Duration::from_secs(30)
        );
    }

    /// Mocked input backend where the last-input tick follows a scripted profile of virtual
    /// time. Injected moves are recorded instead of hitting the OS.
    fn scripted_manager(
        last_input: impl Fn(u64) -> u64 + Send + Clone + 'static,
        moves: &Arc<Mutex<Vec<(i32, i32)>>>,
    ) -> MockInputManager {
        let start = Instant::now();
        let mut manager = MockInputManager::new();

        let profile = last_input.clone();
        manager.expect_idle_duration().returning(move || {
            let now = start.elapsed().as_millis() as u64;
            Ok(now.saturating_sub(profile(now)))
        });
        manager
            .expect_last_input_tick()
            .returning(move || Ok(last_input(start.elapsed().as_millis() as u64)));

        let moves = moves.clone();
        manager.expect_move_pointer().returning(move |dx, dy| {
            moves.lock().unwrap().push((dx, dy));
            Ok(())
        });
        manager
    }

    /// With a 5 second timeout and no input at all the session must report AFK once and inject
    /// exactly one zero-sum square.
    #[tokio::test(start_paused = true)]
    async fn idle_session_goes_afk_and_nudges_once() -> Result<()> {
        *TEST_LOGGING;
        let moves = Arc::new(Mutex::new(Vec::new()));
        let manager = scripted_manager(|_now| 0, &moves);

        let shutdown_token = CancellationToken::new();
        let (sender, mut receiver) = mpsc::channel::<StatusEvent>(10);
        let monitor = create_monitor(
            sender,
            manager,
            &shutdown_token,
            SessionConfig::from_seconds(5)?,
            DefaultClock,
        );

        let (monitor_result, statuses) = tokio::join!(monitor.run(), async {
            let mut statuses = Vec::new();
            while let Some(event) = receiver.recv().await {
                statuses.push(event.status);
                if event.status == AfkStatus::Afk {
                    shutdown_token.cancel();
                }
            }
            statuses
        });
        monitor_result?;

        assert_eq!(
            statuses,
            vec![
                AfkStatus::Monitoring,
                AfkStatus::Active,
                AfkStatus::Afk,
                AfkStatus::Stopped
            ]
        );

        let moves = moves.lock().unwrap();
        assert_eq!(moves.len(), 4);
        assert_eq!(moves[0], (10, 0));
        assert_eq!(moves.iter().map(|(dx, _)| dx).sum::<i32>(), 0);
        assert_eq!(moves.iter().map(|(_, dy)| dy).sum::<i32>(), 0);
        Ok(())
    }

    /// Input that keeps advancing past the grace window is a real user: the session returns to
    /// Active without another injection.
    #[tokio::test(start_paused = true)]
    async fn persisting_input_returns_to_active() -> Result<()> {
        *TEST_LOGGING;
        let moves = Arc::new(Mutex::new(Vec::new()));
        // Idle from the start, then constant input from second 7 onwards.
        let manager = scripted_manager(|now| if now >= 7000 { now } else { 0 }, &moves);

        let shutdown_token = CancellationToken::new();
        let (sender, mut receiver) = mpsc::channel::<StatusEvent>(10);
        let monitor = create_monitor(
            sender,
            manager,
            &shutdown_token,
            SessionConfig::from_seconds(5)?,
            DefaultClock,
        );

        let (monitor_result, statuses) = tokio::join!(monitor.run(), async {
            let mut statuses = Vec::new();
            while let Some(event) = receiver.recv().await {
                let was_afk = statuses.contains(&AfkStatus::Afk);
                statuses.push(event.status);
                if event.status == AfkStatus::Active && was_afk {
                    shutdown_token.cancel();
                }
            }
            statuses
        });
        monitor_result?;

        assert_eq!(
            statuses,
            vec![
                AfkStatus::Monitoring,
                AfkStatus::Active,
                AfkStatus::Afk,
                AfkStatus::Active,
                AfkStatus::Stopped
            ]
        );

        // Only the injection that happened on the way into AFK.
        assert_eq!(moves.lock().unwrap().len(), 4);
        Ok(())
    }

    /// A one-shot last-input advance is the signature of our own injected motion. It must not
    /// flip the session back to Active, and injection must recur after every timeout interval.
    #[tokio::test(start_paused = true)]
    async fn self_generated_input_keeps_session_afk() -> Result<()> {
        *TEST_LOGGING;
        let moves = Arc::new(Mutex::new(Vec::new()));
        // A single advance at second 5.3, where the injected square lands, then silence.
        let manager = scripted_manager(|now| if now >= 5300 { 5300 } else { 0 }, &moves);

        let shutdown_token = CancellationToken::new();
        let (sender, mut receiver) = mpsc::channel::<StatusEvent>(10);
        let monitor = create_monitor(
            sender,
            manager,
            &shutdown_token,
            SessionConfig::from_seconds(5)?,
            DefaultClock,
        );

        let (monitor_result, statuses) = tokio::join!(monitor.run(), async {
            let mut statuses = Vec::new();
            while let Some(event) = receiver.recv().await {
                statuses.push(event.status);
                if event.status == AfkStatus::Afk {
                    // Give the sustain rule one full timeout interval to fire again.
                    tokio::time::sleep(Duration::from_millis(6000)).await;
                    shutdown_token.cancel();
                }
            }
            statuses
        });
        monitor_result?;

        assert_eq!(
            statuses,
            vec![
                AfkStatus::Monitoring,
                AfkStatus::Active,
                AfkStatus::Afk,
                AfkStatus::Stopped
            ]
        );

        // The entry injection plus one sustain injection.
        assert_eq!(moves.lock().unwrap().len(), 8);
        Ok(())
    }
}
