// Queue Runner - owns the single processing loop task

use super::worker::constants::SHUTDOWN_GRACE_PERIOD;
use super::worker::{shutdown_channel, ActiveJob, ProcessingLoop, ShutdownSender};
use crate::domain::JobId;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

struct Running {
    shutdown: ShutdownSender,
    handle: JoinHandle<()>,
}

/// Starts the processing loop at most once per process
pub struct QueueRunner {
    processing_loop: Arc<ProcessingLoop>,
    active: ActiveJob,
    running: Mutex<Option<Running>>,
}

impl QueueRunner {
    pub fn new(processing_loop: ProcessingLoop) -> Self {
        let active = processing_loop.active_job();
        Self {
            processing_loop: Arc::new(processing_loop),
            active,
            running: Mutex::new(None),
        }
    }

    /// Start the loop unless it is already running.
    ///
    /// Returns `true` if this call started it. Must be called from inside a
    /// tokio runtime.
    pub fn start(&self) -> bool {
        let mut running = self.running.lock().unwrap_or_else(|p| p.into_inner());
        if matches!(running.as_ref(), Some(r) if !r.handle.is_finished()) {
            return false;
        }

        let (shutdown, token) = shutdown_channel();
        let processing_loop = Arc::clone(&self.processing_loop);
        let handle = tokio::spawn(async move { processing_loop.run(token).await });
        *running = Some(Running { shutdown, handle });

        info!("Queue runner started");
        true
    }

    pub fn is_running(&self) -> bool {
        let running = self.running.lock().unwrap_or_else(|p| p.into_inner());
        matches!(running.as_ref(), Some(r) if !r.handle.is_finished())
    }

    /// Job the loop is working on right now
    pub fn active_job(&self) -> Option<JobId> {
        self.active.get()
    }

    /// Stop the loop, waiting up to `grace` before aborting it
    pub async fn shutdown_with_grace(&self, grace: Duration) {
        let running = self
            .running
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take();
        let Some(Running { shutdown, mut handle }) = running else {
            return;
        };

        shutdown.shutdown();
        match tokio::time::timeout(grace, &mut handle).await {
            Ok(_) => info!("Queue runner stopped"),
            Err(_) => {
                warn!(
                    grace_secs = grace.as_secs(),
                    "Processing loop did not stop in time, aborting"
                );
                handle.abort();
            }
        }
    }

    pub async fn shutdown(&self) {
        self.shutdown_with_grace(SHUTDOWN_GRACE_PERIOD).await
    }
}
