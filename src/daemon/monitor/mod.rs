use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{
    daemon::report::status_event::{AfkStatus, StatusEvent},
    input_api::InputManager,
    utils::clock::Clock,
};

pub mod afk;

use afk::{AfkEvaluator, AfkState};

/// Pause between the four steps of one injection sequence.
const MOVE_STEP_PAUSE: Duration = Duration::from_millis(100);
/// How long a last-input advance has to persist before it counts as a real user.
const CONFIRM_GRACE: Duration = Duration::from_millis(100);
/// Length of one edge of the injected square, in pixels.
const MOVE_PIXELS: i32 = 10;

/// Relative steps of one injection sequence: right, down, left, up. The deltas sum to zero so
/// the cursor ends where it started.
const SQUARE_PATH: [(i32, i32); 4] = [
    (MOVE_PIXELS, 0),
    (0, MOVE_PIXELS),
    (-MOVE_PIXELS, 0),
    (0, -MOVE_PIXELS),
];

/// Runs the polling loop of one monitoring session: samples inactivity, transitions between
/// Active and AFK, and injects pointer motion while the user is away.
pub struct MonitorModule {
    next: mpsc::Sender<StatusEvent>,
    producer: Box<dyn InputManager>,
    shutdown: CancellationToken,
    afk_evaluator: AfkEvaluator,
    poll_frequency: Duration,
    time_provider: Box<dyn Clock>,
}

impl MonitorModule {
    pub fn new(
        next: mpsc::Sender<StatusEvent>,
        producer: Box<dyn InputManager>,
        shutdown: CancellationToken,
        afk_evaluator: AfkEvaluator,
        poll_frequency: Duration,
        time_provider: Box<dyn Clock>,
    ) -> Self {
        Self {
            next,
            producer,
            shutdown,
            afk_evaluator,
            poll_frequency,
            time_provider,
        }
    }

    async fn report(&mut self, status: AfkStatus) -> Result<()> {
        let event = StatusEvent {
            status,
            moment: self.time_provider.time(),
        };
        debug!("Sending status {:?}", event);
        self.next
            .send(event)
            .await
            .inspect_err(|e| error!("Unexpected error during sending {e:?}"))?;
        Ok(())
    }

    fn sample_last_input(&mut self) -> Option<u64> {
        self.producer
            .last_input_tick()
            .inspect_err(|e| error!("Encountered an error during input sampling {e:?}"))
            .ok()
    }

    /// Injects the four-step square. Injection failures are logged and skipped, the next
    /// sustain window will inject again anyway.
    async fn move_in_square(&mut self) {
        for (dx, dy) in SQUARE_PATH {
            if let Err(e) = self.producer.move_pointer(dx, dy) {
                error!("Encountered an error during pointer injection {:?}", e);
            }
            self.time_provider.sleep(MOVE_STEP_PAUSE).await;
        }
    }

    /// Evaluates the state machine once. Sampler errors degrade to a skipped tick, the loop is
    /// self-correcting. Only a dead status channel propagates out.
    async fn tick(&mut self, state: &mut AfkState) -> Result<()> {
        match state {
            AfkState::Active => {
                let Ok(idle) = self
                    .producer
                    .idle_duration()
                    .inspect_err(|e| error!("Encountered an error during idle sampling {e:?}"))
                else {
                    return Ok(());
                };
                if !self.afk_evaluator.is_afk(idle) {
                    return Ok(());
                }

                let Some(confirm_baseline) = self.sample_last_input() else {
                    return Ok(());
                };
                let last_move = self.time_provider.instant();
                info!("User went AFK after {idle}ms of inactivity");
                self.report(AfkStatus::Afk).await?;
                self.move_in_square().await;
                *state = AfkState::Afk {
                    confirm_baseline,
                    last_move,
                };
            }
            AfkState::Afk {
                confirm_baseline,
                last_move,
            } => {
                let Some(sample) = self.sample_last_input() else {
                    return Ok(());
                };
                if sample != *confirm_baseline {
                    // Possibly a real user. Our own injected motion shows up as a single
                    // advance, a present user keeps the tick moving, so re-sample after a
                    // short grace window.
                    self.time_provider.sleep(CONFIRM_GRACE).await;
                    let Some(settled) = self.sample_last_input() else {
                        return Ok(());
                    };
                    if settled != sample {
                        info!("User input confirmed, leaving AFK");
                        self.report(AfkStatus::Active).await?;
                        *state = AfkState::Active;
                        return Ok(());
                    }
                    *confirm_baseline = sample;
                }

                let since_move = self.time_provider.instant() - *last_move;
                if self.afk_evaluator.is_afk(since_move.as_millis() as u64) {
                    debug!("User is still AFK, injecting again");
                    *last_move = self.time_provider.instant();
                    self.move_in_square().await;
                }
            }
        }
        Ok(())
    }

    /// Executes the monitoring event loop.
    pub async fn run(mut self) -> Result<()> {
        self.report(AfkStatus::Monitoring).await?;
        // A session always begins by assuming the user is present.
        self.report(AfkStatus::Active).await?;
        let mut state = AfkState::Active;

        let mut poll_point = self.time_provider.instant();
        loop {
            poll_point += self.poll_frequency;

            self.tick(&mut state).await?;

            tokio::select! {
                // Cancelation means we stop execution of the event loop, finishing any
                // in-progress injection first. Dropping the sender afterwards also stops the
                // report module.
                _ = self.shutdown.cancelled() => {
                    self.report(AfkStatus::Stopped).await?;
                    return Ok(())
                }
                _ = self.time_provider.sleep_until(poll_point) => ()
            }
        }
    }
}
