use anyhow::Result;
use sink::StatusSink;
use tokio::sync::mpsc::Receiver;
use tracing::{debug, error, info};

use status_event::StatusEvent;

pub mod sink;
pub mod status_event;

/// Represents the consumer of status changes. This module is responsible for receiving status
/// events and pushing them to the configured display.
pub struct ReportModule<Sink> {
    receiver: Receiver<StatusEvent>,
    sink: Sink,
}

impl<S: StatusSink> ReportModule<S> {
    pub fn new(receiver: Receiver<StatusEvent>, sink: S) -> Self {
        Self { receiver, sink }
    }

    pub async fn run(mut self) -> Result<()> {
        while let Some(event) = self.receiver.recv().await {
            debug!("Displaying status {:?}", event);
            match self.sink.push_status(event.clone()).await {
                Ok(_) => {
                    info!("Displayed status {:?}", event)
                }
                Err(e) => {
                    error!("Error displaying status {:?}: {e:?}", event)
                }
            }
        }

        let result = self.sink.finalize().await;
        self.receiver.close();
        result
    }
}

#[cfg(test)]
mod report_tests {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    };

    use anyhow::Result;
    use chrono::Utc;
    use tokio::sync::mpsc;

    use super::{
        ReportModule,
        sink::StatusSink,
        status_event::{AfkStatus, StatusEvent},
    };

    #[derive(Default, Clone)]
    struct RecordingSink {
        events: Arc<Mutex<Vec<StatusEvent>>>,
        finalized: Arc<AtomicBool>,
    }

    impl StatusSink for RecordingSink {
        async fn push_status(&mut self, event: StatusEvent) -> Result<()> {
            self.events.lock().unwrap().push(event);
            Ok(())
        }

        async fn finalize(&mut self) -> Result<()> {
            self.finalized.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn pushes_statuses_in_order_and_finalizes() -> Result<()> {
        let (sender, receiver) = mpsc::channel::<StatusEvent>(10);
        let sink = RecordingSink::default();
        let module = ReportModule::new(receiver, sink.clone());

        let statuses = [
            AfkStatus::Monitoring,
            AfkStatus::Active,
            AfkStatus::Afk,
            AfkStatus::Stopped,
        ];

        let (run_result, send_result) = tokio::join!(module.run(), async move {
            for status in statuses {
                sender
                    .send(StatusEvent {
                        status,
                        moment: Utc::now(),
                    })
                    .await?;
            }
            Ok::<_, anyhow::Error>(())
        });
        run_result?;
        send_result?;

        let seen = sink
            .events
            .lock()
            .unwrap()
            .iter()
            .map(|event| event.status)
            .collect::<Vec<_>>();
        assert_eq!(seen, statuses);
        assert!(sink.finalized.load(Ordering::SeqCst));
        Ok(())
    }
}
