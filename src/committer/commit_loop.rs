//! Commit loop
//!
//! The single task that owns the pending batch. Every event (insert, forced
//! flush, shutdown) arrives on one FIFO channel, so events are handled in the
//! order they were sent and only one flush can run at a time.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use super::batch::{FlushTrigger, PendingBatch};
use crate::client::SeriesWriter;
use crate::series::Series;

/// Events accepted by the commit loop
#[derive(Debug)]
pub(crate) enum Message {
    /// Buffer one series
    Insert(Series),
    /// Flush now and acknowledge with the outcome
    Flush(oneshot::Sender<FlushReport>),
    /// Final flush, acknowledge with its outcome, then stop
    Shutdown(oneshot::Sender<FlushReport>),
}

/// Outcome of one flush attempt
#[derive(Debug, Clone)]
pub struct FlushReport {
    pub trigger: FlushTrigger,
    /// Series handed to the store in this attempt
    pub series: usize,
    /// Error message when the write failed and the batch was dropped
    pub error: Option<String>,
}

impl FlushReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

pub(crate) struct CommitLoop {
    writer: Arc<dyn SeriesWriter>,
    batch: PendingBatch,
    max_wait: Duration,
    reports: Option<mpsc::UnboundedSender<FlushReport>>,
}

impl CommitLoop {
    pub(crate) fn new(
        writer: Arc<dyn SeriesWriter>,
        capacity: usize,
        max_wait: Duration,
        reports: Option<mpsc::UnboundedSender<FlushReport>>,
    ) -> Self {
        Self {
            writer,
            batch: PendingBatch::new(capacity),
            max_wait,
            reports,
        }
    }

    /// Run until a shutdown message arrives or every sender is gone
    pub(crate) async fn run(mut self, mut inbox: mpsc::Receiver<Message>) {
        tracing::debug!(
            capacity = self.batch.capacity(),
            max_wait_ms = self.max_wait.as_millis() as u64,
            "Commit loop started"
        );

        let timer = tokio::time::sleep(self.max_wait);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                message = inbox.recv() => match message {
                    Some(Message::Insert(series)) => {
                        if self.batch.push(series) {
                            self.flush(FlushTrigger::CapacityReached).await;
                            timer.as_mut().reset(Instant::now() + self.max_wait);
                        }
                    }
                    Some(Message::Flush(ack)) => {
                        let report = self.flush(FlushTrigger::ForcedFlush).await;
                        timer.as_mut().reset(Instant::now() + self.max_wait);
                        let _ = ack.send(report);
                    }
                    Some(Message::Shutdown(ack)) => {
                        let report = self.flush(FlushTrigger::ShutdownDrain).await;
                        let _ = ack.send(report);
                        break;
                    }
                    None => {
                        tracing::debug!("All committer handles dropped, draining");
                        self.flush(FlushTrigger::ShutdownDrain).await;
                        break;
                    }
                },
                () = &mut timer => {
                    self.flush(FlushTrigger::TimerElapsed).await;
                    timer.as_mut().reset(Instant::now() + self.max_wait);
                }
            }
        }

        tracing::debug!("Commit loop stopped");
    }

    /// Hand the pending batch to the store and reset it
    ///
    /// A failed write is logged and its series are dropped. An empty batch
    /// yields an unreported, successful zero-series report.
    async fn flush(&mut self, trigger: FlushTrigger) -> FlushReport {
        if self.batch.is_empty() {
            tracing::trace!(%trigger, "Nothing to flush");
            return FlushReport {
                trigger,
                series: 0,
                error: None,
            };
        }

        let snapshot = self.batch.take();
        let count = snapshot.len();
        let start = std::time::Instant::now();

        let error = match self.writer.write_series(&snapshot).await {
            Ok(()) => {
                tracing::debug!(
                    %trigger,
                    series = count,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Flushed async inserts"
                );
                None
            }
            Err(e) => {
                tracing::error!(
                    %trigger,
                    series = count,
                    error = %e,
                    "Failed to write {} series, batch dropped",
                    count
                );
                Some(e.to_string())
            }
        };

        let report = FlushReport {
            trigger,
            series: count,
            error,
        };
        if let Some(reports) = &self.reports {
            let _ = reports.send(report.clone());
        }

        report
    }
}
