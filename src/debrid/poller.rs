//! Bounded wait for a provider-side torrent to become downloadable
//!
//! The loop is capped by both a retry count and a wall-clock timeout.

use async_trait::async_trait;
use bon::Builder;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::error::{DebridError, Result};

/// Polling budget
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct PollConfig {
    /// Maximum number of status re-reads
    #[builder(default = 60)]
    pub max_retries: u32,
    /// Sleep between status reads
    #[builder(default = Duration::from_millis(1000))]
    pub interval: Duration,
    /// Overall wall-clock budget
    #[builder(default = Duration::from_secs(30))]
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Where a torrent stands from the poller's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Links can be resolved
    Ready,
    /// Still resolving from the provider cache; worth waiting for
    Converting,
    /// Terminal failure (error, virus, dead)
    Failed,
    /// Needs a real download, not waited for
    Pending,
}

/// Status snapshot the poller can classify
pub trait PollSnapshot {
    fn phase(&self) -> Phase;
    fn status(&self) -> &str;
}

/// Re-reads the provider-side state of a torrent
#[async_trait]
pub trait StatusSource: Send + Sync {
    type Snapshot: PollSnapshot + Send;

    async fn fetch(&self, torrent_id: &str) -> Result<Self::Snapshot>;
}

/// Sender side of a cancellation signal
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

/// Cancellation signal observed by waits
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

/// Create a linked cancellation handle and signal.
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx })
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancelled. A dropped handle never cancels.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Race `fut` against `cancel`; the losing future is dropped.
pub(crate) async fn guard<F: Future>(cancel: Option<&CancelSignal>, fut: F) -> Result<F::Output> {
    match cancel {
        None => Ok(fut.await),
        Some(signal) => {
            tokio::select! {
                out = fut => Ok(out),
                _ = signal.cancelled() => Err(DebridError::Cancelled),
            }
        }
    }
}

/// Readiness state machine driver
#[derive(Debug, Clone)]
pub struct ReadinessPoller {
    config: PollConfig,
    cancel: Option<CancelSignal>,
}

impl ReadinessPoller {
    pub fn new(config: PollConfig) -> Self {
        Self {
            config,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, signal: CancelSignal) -> Self {
        self.cancel = Some(signal);
        self
    }

    /// Wait until `snapshot` (the last status read) reaches [`Phase::Ready`].
    ///
    /// Returns the ready snapshot. Fails with `PermanentFailure` on a failed
    /// torrent, `NotReady` on a torrent needing a real download or when the
    /// budget runs out, and `Cancelled` when the signal fires.
    pub async fn wait_until_ready<S>(
        &self,
        source: &S,
        torrent_id: &str,
        mut snapshot: S::Snapshot,
    ) -> Result<S::Snapshot>
    where
        S: StatusSource,
    {
        if snapshot.phase() == Phase::Ready {
            return Ok(snapshot);
        }

        let max_retries = self.config.max_retries;
        let start = Instant::now();

        info!(
            torrent_id,
            status = snapshot.status(),
            "Torrent not ready, checking if cached"
        );

        for attempt in 1..=max_retries {
            let elapsed = start.elapsed();
            if elapsed > self.config.timeout {
                warn!(torrent_id, elapsed_ms = elapsed.as_millis() as u64, "Torrent wait timed out");
                return Err(DebridError::NotReady(format!(
                    "torrent {} timed out after {}s",
                    torrent_id,
                    elapsed.as_secs()
                )));
            }

            match snapshot.phase() {
                Phase::Ready => return Ok(snapshot),
                Phase::Failed => {
                    warn!(torrent_id, status = snapshot.status(), "Torrent failed");
                    return Err(DebridError::PermanentFailure {
                        torrent_id: torrent_id.to_string(),
                        status: snapshot.status().to_string(),
                    });
                }
                Phase::Pending => {
                    info!(
                        torrent_id,
                        status = snapshot.status(),
                        "Torrent not cached, only cached torrents are instant"
                    );
                    return Err(DebridError::NotReady(format!(
                        "torrent {} is {} and not cached",
                        torrent_id,
                        snapshot.status()
                    )));
                }
                Phase::Converting => {}
            }

            debug!(
                torrent_id,
                attempt,
                max_retries,
                status = snapshot.status(),
                interval_ms = self.config.interval.as_millis() as u64,
                "Waiting for torrent"
            );

            self.guard(tokio::time::sleep(self.config.interval)).await?;
            snapshot = self.guard(source.fetch(torrent_id)).await??;

            if snapshot.phase() == Phase::Ready {
                info!(
                    torrent_id,
                    attempt,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Torrent cached and ready"
                );
                return Ok(snapshot);
            }
        }

        info!(
            torrent_id,
            status = snapshot.status(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Torrent not cached after retries"
        );
        Err(DebridError::NotReady(format!(
            "torrent {} not ready after {} checks",
            torrent_id, max_retries
        )))
    }

    async fn guard<F: Future>(&self, fut: F) -> Result<F::Output> {
        guard(self.cancel.as_ref(), fut).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, Copy)]
    struct Snap(Phase, &'static str);

    impl PollSnapshot for Snap {
        fn phase(&self) -> Phase {
            self.0
        }

        fn status(&self) -> &str {
            self.1
        }
    }

    const CONVERTING: Snap = Snap(Phase::Converting, "magnet_conversion");
    const DOWNLOADED: Snap = Snap(Phase::Ready, "downloaded");
    const DOWNLOADING: Snap = Snap(Phase::Pending, "downloading");
    const DEAD: Snap = Snap(Phase::Failed, "dead");

    /// Replays scripted snapshots, repeating the last one forever
    struct Scripted {
        script: Mutex<VecDeque<Snap>>,
        last: Mutex<Snap>,
        fetches: AtomicUsize,
    }

    impl Scripted {
        fn new(script: Vec<Snap>, fallback: Snap) -> Self {
            Self {
                script: Mutex::new(script.into()),
                last: Mutex::new(fallback),
                fetches: AtomicUsize::new(0),
            }
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatusSource for Scripted {
        type Snapshot = Snap;

        async fn fetch(&self, _torrent_id: &str) -> Result<Snap> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front();
            let mut last = self.last.lock().unwrap();
            if let Some(snap) = next {
                *last = snap;
            }
            Ok(*last)
        }
    }

    fn config(max_retries: u32, interval_ms: u64, timeout_secs: u64) -> PollConfig {
        PollConfig::builder()
            .max_retries(max_retries)
            .interval(Duration::from_millis(interval_ms))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
    }

    #[test]
    fn test_poll_config_defaults() {
        let config = PollConfig::default();
        assert_eq!(config.max_retries, 60);
        assert_eq!(config.interval, Duration::from_millis(1000));
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_skips_polling() {
        let source = Scripted::new(vec![], DOWNLOADED);
        let poller = ReadinessPoller::new(config(5, 1000, 30));

        let snap = poller.wait_until_ready(&source, "T1", DOWNLOADED).await.unwrap();
        assert_eq!(snap.status(), "downloaded");
        assert_eq!(source.fetches(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dead_fails_without_polling() {
        let source = Scripted::new(vec![], DOWNLOADED);
        let poller = ReadinessPoller::new(config(5, 1000, 30));

        let err = poller.wait_until_ready(&source, "T1", DEAD).await.unwrap_err();
        assert!(matches!(
            err,
            DebridError::PermanentFailure { ref status, .. } if status == "dead"
        ));
        assert_eq!(source.fetches(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_instant_status_is_not_ready() {
        let source = Scripted::new(vec![], DOWNLOADED);
        let poller = ReadinessPoller::new(config(5, 1000, 30));

        let err = poller
            .wait_until_ready(&source, "T1", DOWNLOADING)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NOT_READY");
        assert_eq!(source.fetches(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_converting_then_ready() {
        let source = Scripted::new(vec![CONVERTING, CONVERTING, DOWNLOADED], DOWNLOADED);
        let poller = ReadinessPoller::new(config(10, 500, 30));

        let start = Instant::now();
        let snap = poller.wait_until_ready(&source, "T1", CONVERTING).await.unwrap();

        assert_eq!(snap.phase(), Phase::Ready);
        assert_eq!(source.fetches(), 3);
        assert_eq!(start.elapsed(), Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_after_conversion() {
        let source = Scripted::new(vec![CONVERTING, Snap(Phase::Failed, "virus")], DEAD);
        let poller = ReadinessPoller::new(config(10, 500, 30));

        let err = poller
            .wait_until_ready(&source, "T1", CONVERTING)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DebridError::PermanentFailure { ref status, .. } if status == "virus"
        ));
        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_count_bound() {
        let source = Scripted::new(vec![], CONVERTING);
        let poller = ReadinessPoller::new(config(5, 100, 3600));

        let err = poller
            .wait_until_ready(&source, "T1", CONVERTING)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NOT_READY");
        assert_eq!(source.fetches(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_bound() {
        let source = Scripted::new(vec![], CONVERTING);
        let poller = ReadinessPoller::new(config(10_000, 1000, 10));

        let start = Instant::now();
        let err = poller
            .wait_until_ready(&source, "T1", CONVERTING)
            .await
            .unwrap_err();
        let elapsed = start.elapsed();

        assert_eq!(err.code(), "NOT_READY");
        assert!(elapsed >= Duration::from_secs(10));
        assert!(elapsed <= Duration::from_secs(11));
        assert!(source.fetches() <= 11);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_wait() {
        let source = Scripted::new(vec![], CONVERTING);
        let (handle, signal) = cancel_pair();
        let poller = ReadinessPoller::new(config(10_000, 1000, 3600)).with_cancel(signal);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2500)).await;
            handle.cancel();
        });

        let start = Instant::now();
        let err = poller
            .wait_until_ready(&source, "T1", CONVERTING)
            .await
            .unwrap_err();

        assert!(matches!(err, DebridError::Cancelled));
        assert_eq!(source.fetches(), 2);
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_dropped_handle_never_cancels() {
        let (handle, signal) = cancel_pair();
        drop(handle);
        assert!(!signal.is_cancelled());

        let waited =
            tokio::time::timeout(Duration::from_millis(20), signal.cancelled()).await;
        assert!(waited.is_err());
    }
}
