//! Committer handle
//!
//! The producer side of the commit loop: submit series, request flushes, and
//! shut the loop down with a bounded wait.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::commit_loop::{CommitLoop, FlushReport, Message};
use crate::client::SeriesWriter;
use crate::series::Series;

/// Configuration for the batch committer
#[derive(Debug, Clone)]
pub struct CommitterConfig {
    /// Series buffered before a flush is forced
    pub capacity: usize,
    /// Longest time a buffered series waits for a flush
    pub max_wait: Duration,
    /// Slots in the inbound channel
    pub channel_capacity: usize,
}

impl Default for CommitterConfig {
    fn default() -> Self {
        Self::new(1000, Duration::from_millis(500))
    }
}

impl CommitterConfig {
    /// Create a configuration whose inbound channel is as deep as one batch
    pub fn new(capacity: usize, max_wait: Duration) -> Self {
        Self {
            capacity,
            max_wait,
            channel_capacity: capacity,
        }
    }

    /// Builder method: set the inbound channel depth
    pub fn channel_capacity(mut self, slots: usize) -> Self {
        self.channel_capacity = slots;
        self
    }

    fn validate(&self) -> Result<(), CommitterError> {
        if self.capacity == 0 {
            return Err(CommitterError::InvalidConfig(
                "capacity must be at least 1".to_string(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(CommitterError::InvalidConfig(
                "channel capacity must be at least 1".to_string(),
            ));
        }
        if self.max_wait.is_zero() {
            return Err(CommitterError::InvalidConfig(
                "max wait must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of [`Committer::shutdown`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Final flush done; `flushed` series were written (zero when nothing was pending)
    Completed { flushed: usize },
    /// Final write failed and its `dropped` series were lost
    Failed { dropped: usize },
    /// The bounded wait elapsed before the final flush finished
    TimedOut,
    /// The commit loop had already stopped
    AlreadyStopped,
}

/// Errors returned to committer callers
#[derive(Error, Debug)]
pub enum CommitterError {
    #[error("Invalid committer configuration: {0}")]
    InvalidConfig(String),

    /// The commit loop is no longer running
    #[error("Committer is not running")]
    Closed,
}

/// Handle to a running batch committer
///
/// Dropping the handle without calling [`Committer::shutdown`] still drains
/// the buffer, but nobody is told how it went.
#[derive(Debug)]
pub struct Committer {
    inbox: mpsc::Sender<Message>,
    task: JoinHandle<()>,
}

impl Committer {
    /// Start a commit loop writing through `writer`
    pub fn spawn(
        writer: Arc<dyn SeriesWriter>,
        config: CommitterConfig,
    ) -> Result<Self, CommitterError> {
        Self::start(writer, config, None)
    }

    /// Start a commit loop that also reports every flush attempt on `reports`
    pub fn spawn_observed(
        writer: Arc<dyn SeriesWriter>,
        config: CommitterConfig,
        reports: mpsc::UnboundedSender<FlushReport>,
    ) -> Result<Self, CommitterError> {
        Self::start(writer, config, Some(reports))
    }

    fn start(
        writer: Arc<dyn SeriesWriter>,
        config: CommitterConfig,
        reports: Option<mpsc::UnboundedSender<FlushReport>>,
    ) -> Result<Self, CommitterError> {
        config.validate()?;

        let (inbox, rx) = mpsc::channel(config.channel_capacity);
        let commit_loop = CommitLoop::new(writer, config.capacity, config.max_wait, reports);
        let task = tokio::spawn(commit_loop.run(rx));

        Ok(Self { inbox, task })
    }

    /// Queue a series for the next flush
    ///
    /// Waits for a free slot when the inbound channel is full.
    pub async fn submit(&self, series: Series) -> Result<(), CommitterError> {
        self.inbox
            .send(Message::Insert(series))
            .await
            .map_err(|_| CommitterError::Closed)
    }

    /// Flush everything submitted so far
    ///
    /// Resolves after the flush was attempted, with the number of series
    /// handed to the store (zero when nothing was pending).
    pub async fn force_flush(&self) -> Result<usize, CommitterError> {
        let (ack, done) = oneshot::channel();
        self.inbox
            .send(Message::Flush(ack))
            .await
            .map_err(|_| CommitterError::Closed)?;
        let report = done.await.map_err(|_| CommitterError::Closed)?;
        Ok(report.series)
    }

    /// Whether the commit loop has stopped
    pub fn is_closed(&self) -> bool {
        self.inbox.is_closed()
    }

    /// Stop accepting series, flush what is pending, and wait at most `wait`
    ///
    /// On timeout the loop keeps running in the background until its write
    /// returns, but the caller is free to move on.
    pub async fn shutdown(self, wait: Duration) -> DrainOutcome {
        let Committer { inbox, task } = self;
        let (ack, done) = oneshot::channel();

        let drain = async move {
            inbox
                .send(Message::Shutdown(ack))
                .await
                .map_err(|_| CommitterError::Closed)?;
            let report = done.await.map_err(|_| CommitterError::Closed)?;
            let _ = task.await;
            Ok::<FlushReport, CommitterError>(report)
        };

        match tokio::time::timeout(wait, drain).await {
            Ok(Ok(report)) if report.succeeded() => {
                tracing::debug!(flushed = report.series, "Committer drained");
                DrainOutcome::Completed {
                    flushed: report.series,
                }
            }
            Ok(Ok(report)) => DrainOutcome::Failed {
                dropped: report.series,
            },
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Committer stopped before shutdown");
                DrainOutcome::AlreadyStopped
            }
            Err(_) => {
                tracing::warn!(
                    wait_ms = wait.as_millis() as u64,
                    "Committer drain did not finish in time"
                );
                DrainOutcome::TimedOut
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientError, ClientResult};
    use crate::committer::FlushTrigger;
    use crate::series::Value;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const LONG_WAIT: Duration = Duration::from_secs(3600);
    const DRAIN_WAIT: Duration = Duration::from_secs(5);

    #[derive(Default)]
    struct RecordingWriter {
        batches: Mutex<Vec<Vec<String>>>,
        fail: bool,
    }

    impl RecordingWriter {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn batches(&self) -> Vec<Vec<String>> {
            self.batches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SeriesWriter for RecordingWriter {
        async fn write_series(&self, batch: &[Series]) -> ClientResult<()> {
            let names = batch.iter().map(|s| s.name.clone()).collect();
            self.batches.lock().unwrap().push(names);
            if self.fail {
                Err(ClientError::Api {
                    status: 500,
                    message: "write failed".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    /// A store that never answers
    #[derive(Default)]
    struct HangingWriter {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SeriesWriter for HangingWriter {
        async fn write_series(&self, _batch: &[Series]) -> ClientResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    fn series(name: &str) -> Series {
        Series::with_default_columns(name).point(vec![
            Value::Integer(1406231160000),
            Value::Integer(0),
            Value::Integer(10),
        ])
    }

    fn drain_reports(rx: &mut mpsc::UnboundedReceiver<FlushReport>) -> Vec<FlushReport> {
        let mut reports = Vec::new();
        while let Ok(report) = rx.try_recv() {
            reports.push(report);
        }
        reports
    }

    #[test]
    fn test_default_config() {
        let config = CommitterConfig::default();
        assert_eq!(config.capacity, 1000);
        assert_eq!(config.max_wait, Duration::from_millis(500));
        assert_eq!(config.channel_capacity, 1000);
    }

    #[tokio::test]
    async fn test_rejects_zero_capacity() {
        let writer = Arc::new(RecordingWriter::default());
        let result = Committer::spawn(writer, CommitterConfig::new(0, LONG_WAIT));
        assert!(matches!(result, Err(CommitterError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_capacity_flush_count_and_leftover() {
        let writer = Arc::new(RecordingWriter::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let committer =
            Committer::spawn_observed(writer.clone(), CommitterConfig::new(3, LONG_WAIT), tx)
                .unwrap();

        for i in 0..7 {
            committer.submit(series(&format!("s{i}"))).await.unwrap();
        }

        let outcome = committer.shutdown(DRAIN_WAIT).await;
        assert_eq!(outcome, DrainOutcome::Completed { flushed: 1 });

        let reports = drain_reports(&mut rx);
        let triggers: Vec<_> = reports.iter().map(|r| (r.trigger, r.series)).collect();
        assert_eq!(
            triggers,
            vec![
                (FlushTrigger::CapacityReached, 3),
                (FlushTrigger::CapacityReached, 3),
                (FlushTrigger::ShutdownDrain, 1),
            ]
        );
        assert!(reports.iter().all(FlushReport::succeeded));
        assert_eq!(writer.batches().concat().len(), 7);
    }

    #[tokio::test]
    async fn test_batches_keep_submission_order() {
        let writer = Arc::new(RecordingWriter::default());
        let committer =
            Committer::spawn(writer.clone(), CommitterConfig::new(2, LONG_WAIT)).unwrap();

        committer.submit(series("A")).await.unwrap();
        committer.submit(series("B")).await.unwrap();
        committer.submit(series("C")).await.unwrap();
        committer.shutdown(DRAIN_WAIT).await;

        assert_eq!(
            writer.batches(),
            vec![
                vec!["A".to_string(), "B".to_string()],
                vec!["C".to_string()],
            ]
        );
    }

    #[tokio::test]
    async fn test_flush_on_empty_batch_is_noop() {
        let writer = Arc::new(RecordingWriter::default());
        let committer =
            Committer::spawn(writer.clone(), CommitterConfig::new(10, LONG_WAIT)).unwrap();

        assert_eq!(committer.force_flush().await.unwrap(), 0);
        assert_eq!(committer.force_flush().await.unwrap(), 0);
        assert_eq!(
            committer.shutdown(DRAIN_WAIT).await,
            DrainOutcome::Completed { flushed: 0 }
        );
        assert!(writer.batches().is_empty());
    }

    #[tokio::test]
    async fn test_force_flush_precedes_later_submits() {
        let writer = Arc::new(RecordingWriter::default());
        let committer =
            Committer::spawn(writer.clone(), CommitterConfig::new(10, LONG_WAIT)).unwrap();

        committer.submit(series("X")).await.unwrap();
        assert_eq!(committer.force_flush().await.unwrap(), 1);

        // X was written before Y ever reached the committer
        assert_eq!(writer.batches(), vec![vec!["X".to_string()]]);

        committer.submit(series("Y")).await.unwrap();
        committer.shutdown(DRAIN_WAIT).await;

        assert_eq!(
            writer.batches(),
            vec![vec!["X".to_string()], vec!["Y".to_string()]]
        );
    }

    #[tokio::test]
    async fn test_shutdown_drains_partial_batch() {
        let writer = Arc::new(RecordingWriter::default());
        let committer =
            Committer::spawn(writer.clone(), CommitterConfig::new(10, LONG_WAIT)).unwrap();

        committer.submit(series("a")).await.unwrap();
        committer.submit(series("b")).await.unwrap();
        committer.submit(series("c")).await.unwrap();

        let outcome = committer.shutdown(DRAIN_WAIT).await;
        assert_eq!(outcome, DrainOutcome::Completed { flushed: 3 });
        assert_eq!(writer.batches().len(), 1);
        assert_eq!(writer.batches()[0].len(), 3);
    }

    #[tokio::test]
    async fn test_failing_store_does_not_stop_the_loop() {
        let writer = Arc::new(RecordingWriter::failing());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let committer =
            Committer::spawn_observed(writer.clone(), CommitterConfig::new(1, LONG_WAIT), tx)
                .unwrap();

        for i in 0..6 {
            committer.submit(series(&format!("s{i}"))).await.unwrap();
        }
        // Still accepting after repeated failures
        committer.submit(series("late")).await.unwrap();
        assert_eq!(committer.force_flush().await.unwrap(), 0);
        assert!(!committer.is_closed());

        let outcome = committer.shutdown(DRAIN_WAIT).await;
        assert_eq!(outcome, DrainOutcome::Completed { flushed: 0 });

        let reports = drain_reports(&mut rx);
        assert_eq!(reports.len(), 7);
        assert!(reports.iter().all(|r| !r.succeeded() && r.series == 1));
        assert_eq!(writer.batches().len(), 7);
    }

    #[tokio::test]
    async fn test_failed_final_write_is_reported_as_dropped() {
        let writer = Arc::new(RecordingWriter::failing());
        let committer =
            Committer::spawn(writer.clone(), CommitterConfig::new(10, LONG_WAIT)).unwrap();

        committer.submit(series("a")).await.unwrap();
        committer.submit(series("b")).await.unwrap();

        let outcome = committer.shutdown(DRAIN_WAIT).await;
        assert_eq!(outcome, DrainOutcome::Failed { dropped: 2 });
        assert_eq!(writer.batches(), vec![vec!["a".to_string(), "b".to_string()]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_flushes_idle_batch() {
        let writer = Arc::new(RecordingWriter::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let config = CommitterConfig::new(10, Duration::from_millis(500));
        let committer = Committer::spawn_observed(writer.clone(), config, tx).unwrap();

        committer.submit(series("a")).await.unwrap();
        committer.submit(series("b")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;

        let reports = drain_reports(&mut rx);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].trigger, FlushTrigger::TimerElapsed);
        assert_eq!(reports[0].series, 2);

        // Idle periods with nothing buffered never reach the store
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(writer.batches().len(), 1);

        committer.shutdown(DRAIN_WAIT).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_flush_restarts_timer() {
        let writer = Arc::new(RecordingWriter::default());
        let config = CommitterConfig::new(2, Duration::from_millis(500));
        let committer = Committer::spawn(writer.clone(), config).unwrap();

        tokio::time::sleep(Duration::from_millis(300)).await;
        committer.submit(series("a")).await.unwrap();
        committer.submit(series("b")).await.unwrap();
        committer.submit(series("c")).await.unwrap();

        // The original deadline (t=500ms) was pushed back by the capacity flush
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(writer.batches(), vec![vec!["a".to_string(), "b".to_string()]]);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(writer.batches().len(), 2);
        assert_eq!(writer.batches()[1], vec!["c".to_string()]);

        committer.shutdown(DRAIN_WAIT).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_times_out_on_hanging_store() {
        let writer = Arc::new(HangingWriter::default());
        let committer =
            Committer::spawn(writer.clone(), CommitterConfig::new(10, LONG_WAIT)).unwrap();

        committer.submit(series("stuck")).await.unwrap();

        let outcome = committer.shutdown(Duration::from_secs(5)).await;
        assert_eq!(outcome, DrainOutcome::TimedOut);
        assert_eq!(writer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dropped_handle_still_drains() {
        let writer = Arc::new(RecordingWriter::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let committer =
            Committer::spawn_observed(writer.clone(), CommitterConfig::new(10, LONG_WAIT), tx)
                .unwrap();

        committer.submit(series("a")).await.unwrap();
        drop(committer);

        let report = rx.recv().await.unwrap();
        assert_eq!(report.trigger, FlushTrigger::ShutdownDrain);
        assert_eq!(report.series, 1);
    }
}
