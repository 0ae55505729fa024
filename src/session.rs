use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::api::{ApiError, DownloadBackend, DownloadRequest};
use crate::models::{ProgressUpdate, VideoMetadata};

/// Outcome of a background call, delivered back to the UI thread.
pub enum SessionEvent {
    InfoFetched(Result<VideoMetadata, ApiError>),
    DownloadSubmitted(Result<String, ApiError>),
    Progress(ProgressUpdate),
    /// Polling gave up after transport failures; the session is over.
    PollFailed(ApiError),
}

/// Every worker is tagged with the generation that spawned it, so the app
/// can drop responses superseded by a newer request.
pub struct SessionUpdate {
    pub generation: u64,
    pub event: SessionEvent,
}

/// What the polling loop does when it cannot reach the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailurePolicy {
    /// Give up on the first failure.
    Abort,
    /// Tolerate up to `max_attempts` consecutive failures, sleeping
    /// `backoff` between retries.
    Retry { max_attempts: u32, backoff: Duration },
}

#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    pub on_transport_failure: TransportFailurePolicy,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            on_transport_failure: TransportFailurePolicy::Abort,
        }
    }
}

pub fn fetch_video_info(
    backend: Arc<dyn DownloadBackend>,
    url: String,
    generation: u64,
    tx: Sender<SessionUpdate>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let result = backend.fetch_video_info(&url);
        let _ = tx.send(SessionUpdate {
            generation,
            event: SessionEvent::InfoFetched(result),
        });
    })
}

pub fn submit_download(
    backend: Arc<dyn DownloadBackend>,
    request: DownloadRequest,
    generation: u64,
    tx: Sender<SessionUpdate>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let result = backend.submit_download(&request);
        let _ = tx.send(SessionUpdate {
            generation,
            event: SessionEvent::DownloadSubmitted(result),
        });
    })
}

/// One tracked download on the server, alive exactly as long as its polling
/// worker. The worker stops on a terminal status, on exhausted transport
/// retries, or when the stop flag is raised.
pub struct DownloadSession {
    download_id: String,
    generation: u64,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl DownloadSession {
    pub fn start(
        backend: Arc<dyn DownloadBackend>,
        download_id: String,
        generation: u64,
        policy: PollPolicy,
        tx: Sender<SessionUpdate>,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let worker = {
            let stop = stop.clone();
            let download_id = download_id.clone();
            thread::spawn(move || poll_loop(&*backend, &download_id, generation, policy, tx, &stop))
        };
        Self {
            download_id,
            generation,
            stop,
            worker: Some(worker),
        }
    }

    pub fn download_id(&self) -> &str {
        &self.download_id
    }

    /// The tag its progress events carry.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Stops polling and waits for the worker to wind down.
    pub fn shutdown(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for DownloadSession {
    fn drop(&mut self) {
        // Raise the flag and detach; the worker exits at its next wakeup.
        self.stop.store(true, Ordering::Relaxed);
        self.worker.take();
    }
}

fn poll_loop(
    backend: &dyn DownloadBackend,
    download_id: &str,
    generation: u64,
    policy: PollPolicy,
    tx: Sender<SessionUpdate>,
    stop: &AtomicBool,
) {
    // First poll happens immediately, before any interval elapses.
    let mut consecutive_failures = 0u32;
    loop {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        match backend.poll_progress(download_id) {
            Ok(update) => {
                consecutive_failures = 0;
                let terminal = update.status.is_terminal();
                let sent = tx.send(SessionUpdate {
                    generation,
                    event: SessionEvent::Progress(update),
                });
                if sent.is_err() || terminal {
                    break;
                }
            }
            Err(err) => {
                consecutive_failures += 1;
                match policy.on_transport_failure {
                    TransportFailurePolicy::Abort => {
                        let _ = tx.send(SessionUpdate {
                            generation,
                            event: SessionEvent::PollFailed(err),
                        });
                        break;
                    }
                    TransportFailurePolicy::Retry {
                        max_attempts,
                        backoff,
                    } => {
                        if consecutive_failures > max_attempts {
                            let _ = tx.send(SessionUpdate {
                                generation,
                                event: SessionEvent::PollFailed(err),
                            });
                            break;
                        }
                        log::warn!(
                            "progress poll failed ({}/{}): {}",
                            consecutive_failures,
                            max_attempts,
                            err
                        );
                        thread::sleep(backoff);
                        continue;
                    }
                }
            }
        }
        thread::sleep(policy.interval);
    }
    log::debug!("polling worker for {} finished", download_id);
}
