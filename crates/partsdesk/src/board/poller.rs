//! Fixed-interval refresh of the job board.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::api::{ApiClient, ApiError};
use crate::board::job_board::{JobBoard, ReplaceOutcome};
use crate::models::JobRecord;

/// Default delay between list refreshes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Where the poller reads job pages from.
#[async_trait]
pub trait JobSource: Send + Sync {
    async fn fetch_jobs(&self, skip: u64, limit: u64) -> Result<Vec<JobRecord>, ApiError>;
}

#[async_trait]
impl JobSource for ApiClient {
    async fn fetch_jobs(&self, skip: u64, limit: u64) -> Result<Vec<JobRecord>, ApiError> {
        self.list_jobs(skip, limit).await
    }
}

/// What happened on a refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BoardEvent {
    Refreshed {
        seq: u64,
        page: u32,
        jobs: usize,
        integrity_errors: usize,
    },
    /// A newer fetch or a page change overtook this one.
    Discarded { seq: u64 },
    /// The cached view is kept as it was.
    FetchFailed { seq: u64, message: String },
}

/// Re-fetches the current board page on a fixed interval.
pub struct JobPoller<S: JobSource + 'static> {
    source: Arc<S>,
    board: Arc<JobBoard>,
    interval: Duration,
    seq: Arc<AtomicU64>,
    shutdown: Arc<AtomicBool>,
    events: broadcast::Sender<BoardEvent>,
}

impl<S: JobSource + 'static> Clone for JobPoller<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            board: Arc::clone(&self.board),
            interval: self.interval,
            seq: Arc::clone(&self.seq),
            shutdown: Arc::clone(&self.shutdown),
            events: self.events.clone(),
        }
    }
}

impl<S: JobSource + 'static> JobPoller<S> {
    pub fn new(source: Arc<S>, board: Arc<JobBoard>, interval: Duration) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            source,
            board,
            interval,
            seq: Arc::new(AtomicU64::new(0)),
            shutdown: Arc::new(AtomicBool::new(false)),
            events,
        }
    }

    pub fn board(&self) -> &Arc<JobBoard> {
        &self.board
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.events.subscribe()
    }

    /// Fetches the board's current page once and offers it to the board.
    ///
    /// May run concurrently with the loop (e.g. right after an action); the
    /// board keeps whichever fetch was issued last.
    pub async fn poll_once(&self) -> BoardEvent {
        let seq = self.seq.fetch_add(1, Ordering::AcqRel) + 1;
        let page = self.board.page();
        let skip = self.board.skip();
        let limit = self.board.page_size() as u64;

        let event = match self.source.fetch_jobs(skip, limit).await {
            Ok(records) => {
                let jobs = records.len();
                match self.board.replace(seq, page, records) {
                    ReplaceOutcome::Applied => BoardEvent::Refreshed {
                        seq,
                        page,
                        jobs,
                        integrity_errors: self
                            .board
                            .rows()
                            .iter()
                            .filter(|r| r.integrity_error().is_some())
                            .count(),
                    },
                    ReplaceOutcome::Stale | ReplaceOutcome::WrongPage => {
                        BoardEvent::Discarded { seq }
                    }
                }
            }
            Err(e) => {
                log::warn!("Job list refresh {} failed: {}", seq, e);
                BoardEvent::FetchFailed {
                    seq,
                    message: e.to_string(),
                }
            }
        };

        // No subscribers is fine
        let _ = self.events.send(event.clone());
        event
    }

    /// Starts the refresh loop. The first refresh happens immediately; a
    /// message on `trigger_rx` forces an early one.
    pub fn start(&self, mut trigger_rx: broadcast::Receiver<()>) -> JoinHandle<()> {
        let poller = self.clone();

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(poller.interval);
            interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                if poller.shutdown.load(Ordering::Acquire) {
                    break;
                }

                tokio::select! {
                    _ = interval_timer.tick() => {},
                    Ok(()) = trigger_rx.recv() => {
                        log::debug!("Manual job list refresh triggered");
                    },
                }

                if poller.shutdown.load(Ordering::Acquire) {
                    break;
                }

                poller.poll_once().await;
            }
            log::debug!("Job poller stopped");
        })
    }

    /// Signals the loop to stop before its next refresh.
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }
}
