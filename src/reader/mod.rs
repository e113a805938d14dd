//! Queue-driven reader that backs off when the far side rate limits it.
//!
//! URLs go into a FIFO queue and are fetched by spawned tasks, optionally
//! capped at `limit` reads in flight. A failed read puts its URL back at the
//! end of the queue and pauses dispatch, for the server's `Retry-After` when
//! it sent one and for the configured pause otherwise. Failures that come
//! back while the reader is already paused are re-queued without pausing again.

mod http;

pub use http::{HttpReader, Reader, parse_retry_after};

use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Notify, mpsc};
use tracing::{debug, info, warn};

use crate::error::ReadError;

/// Progress reported on the caller's event channel.
#[derive(Debug)]
pub enum ReadEvent {
    /// A read succeeded.
    Data { url: String, body: Vec<u8> },
    /// Dispatch is paused after a failure.
    Pause { retry_after: Option<Duration> },
    /// A read failed; the URL has been queued again.
    Error { url: String, error: ReadError },
    /// The read task itself died. The URL is dropped.
    SysError { url: String, error: String },
}

struct Failure {
    url: String,
    retry_after: Option<Duration>,
}

struct Shared {
    queue: Mutex<VecDeque<String>>,
    in_progress: AtomicUsize,
    limit: AtomicUsize, // 0 = unlimited
    reader: RwLock<Arc<dyn Reader>>,
    wake: Notify,
    stop: Notify,
}

/// Handle to a running reader. Dropping it stops dispatch.
pub struct SustainableReader {
    shared: Arc<Shared>,
}

impl SustainableReader {
    /// Start a reader that fetches over HTTP. Must be called inside a tokio runtime.
    pub fn new(pause: Duration, events: mpsc::Sender<ReadEvent>) -> Self {
        Self::with_reader(pause, events, Arc::new(HttpReader::default()))
    }

    pub fn with_reader(
        pause: Duration,
        events: mpsc::Sender<ReadEvent>,
        reader: Arc<dyn Reader>,
    ) -> Self {
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            in_progress: AtomicUsize::new(0),
            limit: AtomicUsize::new(0),
            reader: RwLock::new(reader),
            wake: Notify::new(),
            stop: Notify::new(),
        });

        tokio::spawn(process(Arc::clone(&shared), pause, events));
        Self { shared }
    }

    pub fn set_reader(&self, reader: Arc<dyn Reader>) {
        *self.shared.reader.write() = reader;
    }

    // Cap on reads in flight, 0 for no cap
    pub fn set_limit(&self, limit: usize) {
        self.shared.limit.store(limit, Ordering::SeqCst);
        self.shared.wake.notify_one();
    }

    pub fn add(&self, url: impl Into<String>) {
        self.shared.queue.lock().push_back(url.into());
        self.shared.wake.notify_one();
    }

    pub fn in_progress(&self) -> usize {
        self.shared.in_progress.load(Ordering::SeqCst)
    }

    pub fn queued(&self) -> usize {
        self.shared.queue.lock().len()
    }

    pub fn is_working(&self) -> bool {
        !self.is_free()
    }

    /// Nothing queued and nothing in flight.
    pub fn is_free(&self) -> bool {
        self.in_progress() == 0 && self.queued() == 0
    }

    // Reads already in flight still report their outcome
    pub fn stop(&self) {
        self.shared.stop.notify_one();
    }
}

impl Drop for SustainableReader {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Shared {
    fn finish(&self) {
        self.in_progress.fetch_sub(1, Ordering::SeqCst);
        self.wake.notify_one();
    }

    // back of the queue, then release the in-flight slot
    fn requeue(&self, url: String) {
        self.queue.lock().push_back(url);
        self.in_progress.fetch_sub(1, Ordering::SeqCst);
    }

    fn dispatch(
        self: &Arc<Self>,
        events: &mpsc::Sender<ReadEvent>,
        failed_tx: &mpsc::UnboundedSender<Failure>,
    ) {
        loop {
            let limit = self.limit.load(Ordering::SeqCst);
            if limit != 0 && self.in_progress.load(Ordering::SeqCst) >= limit {
                break;
            }
            let Some(url) = self.queue.lock().pop_front() else {
                break;
            };

            self.in_progress.fetch_add(1, Ordering::SeqCst);
            let reader = Arc::clone(&*self.reader.read());
            debug!(url = %url, "Dispatching read");

            tokio::spawn(read_one(
                Arc::clone(self),
                reader,
                url,
                events.clone(),
                failed_tx.clone(),
            ));
        }
    }
}

async fn process(shared: Arc<Shared>, pause: Duration, events: mpsc::Sender<ReadEvent>) {
    let (failed_tx, mut failed_rx) = mpsc::unbounded_channel::<Failure>();
    debug!("Reader started");

    loop {
        tokio::select! {
            biased;
            _ = shared.stop.notified() => break,
            Some(failure) = failed_rx.recv() => {
                shared.requeue(failure.url);
                if !pause_dispatch(&shared, &events, failure.retry_after, pause).await {
                    break;
                }
                // failures that came back during the pause
                while let Ok(failure) = failed_rx.try_recv() {
                    shared.requeue(failure.url);
                }
            }
            _ = shared.wake.notified() => {}
        }

        shared.dispatch(&events, &failed_tx);
    }

    info!("Reader stopped");
}

// false when stopped mid-pause
async fn pause_dispatch(
    shared: &Shared,
    events: &mpsc::Sender<ReadEvent>,
    retry_after: Option<Duration>,
    pause: Duration,
) -> bool {
    let wait = retry_after.unwrap_or(pause);
    info!(wait_secs = wait.as_secs_f64(), "Pausing reads");
    let _ = events.send(ReadEvent::Pause { retry_after }).await;

    tokio::select! {
        _ = shared.stop.notified() => false,
        _ = tokio::time::sleep(wait) => true,
    }
}

async fn read_one(
    shared: Arc<Shared>,
    reader: Arc<dyn Reader>,
    url: String,
    events: mpsc::Sender<ReadEvent>,
    failed_tx: mpsc::UnboundedSender<Failure>,
) {
    let task_url = url.clone();
    let outcome = tokio::spawn(async move { reader.read(&task_url).await }).await;

    match outcome {
        Ok(Ok(body)) => {
            let _ = events.send(ReadEvent::Data { url, body }).await;
            shared.finish();
        }
        Ok(Err(error)) => {
            let retry_after = error.retry_after();
            warn!(url = %url, error = %error, "Read failed, queueing again");
            let _ = events
                .send(ReadEvent::Error {
                    url: url.clone(),
                    error,
                })
                .await;

            // the loop is gone after a stop; nobody will requeue
            if failed_tx.send(Failure { url, retry_after }).is_err() {
                shared.in_progress.fetch_sub(1, Ordering::SeqCst);
            }
        }
        Err(join_error) => {
            warn!(url = %url, error = %join_error, "Read task failed");
            let _ = events
                .send(ReadEvent::SysError {
                    url,
                    error: join_error.to_string(),
                })
                .await;
            shared.finish();
        }
    }
}
