use futures::future::join_all;
use log::{ debug, error, info };
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{ self, UnboundedReceiver, UnboundedSender };
use tokio::task::JoinHandle;

use crate::agent::RelayAgent;
use crate::gateway::InboundEvent;
use crate::models::chat::UserId;

/// A worker with nothing queued for this long shuts itself down.
pub const WORKER_IDLE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

struct Worker {
    queue: UnboundedSender<InboundEvent>,
    handle: JoinHandle<()>,
}

/// Fans inbound events out to one worker per user.
///
/// A user's events are handled one at a time in arrival order; different
/// users proceed concurrently. Idle workers exit on their own and are
/// replaced on the user's next event.
pub struct Dispatcher {
    agent: Arc<RelayAgent>,
    workers: HashMap<UserId, Worker>,
    idle_timeout: Duration,
}

impl Dispatcher {
    pub fn new(agent: Arc<RelayAgent>) -> Self {
        Self {
            agent,
            workers: HashMap::new(),
            idle_timeout: WORKER_IDLE_TIMEOUT,
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Users with a live worker.
    pub fn active_users(&self) -> usize {
        self.workers
            .values()
            .filter(|w| !w.handle.is_finished())
            .count()
    }

    pub fn dispatch(&mut self, event: InboundEvent) {
        let user_id = event.user_id;
        let (event, previous) = match self.workers.remove(&user_id) {
            Some(worker) =>
                match worker.queue.send(event) {
                    Ok(()) => {
                        self.workers.insert(user_id, worker);
                        return;
                    }
                    Err(mpsc::error::SendError(event)) => (event, Some(worker.handle)),
                }
            None => (event, None),
        };

        self.workers.retain(|_, w| !w.handle.is_finished());
        let worker = self.spawn_worker(user_id, previous);
        if worker.queue.send(event).is_err() {
            error!("Dropping event for user {}: worker exited immediately", user_id);
        }
        self.workers.insert(user_id, worker);
    }

    /// `previous` is the user's retiring worker; the new one waits for it so
    /// events it drained on the way out still run first.
    fn spawn_worker(&self, user_id: UserId, previous: Option<JoinHandle<()>>) -> Worker {
        debug!("Starting worker for user {}", user_id);
        let (queue, rx) = mpsc::unbounded_channel::<InboundEvent>();
        let agent = self.agent.clone();
        let idle_timeout = self.idle_timeout;
        let handle = tokio::spawn(async move {
            if let Some(previous) = previous {
                if let Err(e) = previous.await {
                    error!("Previous worker for user {} failed: {}", user_id, e);
                }
            }
            run_worker(agent, rx, idle_timeout).await;
            debug!("Worker for user {} stopped", user_id);
        });
        Worker { queue, handle }
    }

    /// Closes every queue and waits for queued events to finish.
    pub async fn shutdown(self) {
        let count = self.workers.len();
        let handles: Vec<JoinHandle<()>> = self.workers
            .into_values()
            .map(|w| w.handle)
            .collect();
        for result in join_all(handles).await {
            if let Err(e) = result {
                error!("Worker task failed: {}", e);
            }
        }
        info!("Stopped {} conversation workers", count);
    }
}

async fn run_worker(
    agent: Arc<RelayAgent>,
    mut rx: UnboundedReceiver<InboundEvent>,
    idle_timeout: Duration
) {
    loop {
        match tokio::time::timeout(idle_timeout, rx.recv()).await {
            Ok(Some(event)) => agent.handle_event(event).await,
            Ok(None) => {
                return;
            }
            Err(_) => {
                // Refuse new sends, then finish whatever slipped in.
                rx.close();
                while let Some(event) = rx.recv().await {
                    agent.handle_event(event).await;
                }
                return;
            }
        }
    }
}
