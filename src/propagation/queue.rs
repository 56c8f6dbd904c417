use crate::propagation::{CollaborationPropagator, PropagationReport};
use crate::types::error::AppError;
use crate::types::record::Record;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, error, info};

/// How long a site's worker waits for more work before it exits.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

type Workers = Arc<Mutex<HashMap<String, mpsc::UnboundedSender<Job>>>>;

struct Job {
    collaboration: Record,
    deleting: bool,
    reply: oneshot::Sender<Result<PropagationReport, AppError>>,
}

/// Handle on an enqueued propagation. Dropping it is fine; the work still
/// runs and its outcome is logged.
pub struct Ticket {
    pub site_id: String,
    rx: oneshot::Receiver<Result<PropagationReport, AppError>>,
}

impl Ticket {
    pub async fn wait(self) -> Result<PropagationReport, AppError> {
        self.rx
            .await
            .map_err(|_| AppError::Internal(format!("propagation worker for site {} stopped", self.site_id)))?
    }
}

/// Runs propagations in the background, one FIFO worker per site, so two
/// roster changes on the same site never interleave their writes. A worker
/// with nothing to do for `idle_timeout` retires and is started again by the
/// next change on its site.
pub struct PropagationQueue {
    propagator: Arc<CollaborationPropagator>,
    workers: Workers,
    idle_timeout: Duration,
}

fn lock(workers: &Workers) -> MutexGuard<'_, HashMap<String, mpsc::UnboundedSender<Job>>> {
    workers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Takes a job that raced in, or unregisters the worker when there is none.
/// Jobs are only sent under the same lock, so nothing can slip in after the
/// entry is gone.
fn retire_if_idle(workers: &Workers, site_id: &str, rx: &mut mpsc::UnboundedReceiver<Job>) -> Option<Job> {
    let mut map = lock(workers);
    match rx.try_recv() {
        Ok(job) => Some(job),
        Err(_) => {
            map.remove(site_id);
            None
        }
    }
}

impl PropagationQueue {
    pub fn new(propagator: Arc<CollaborationPropagator>) -> Self {
        Self::with_idle_timeout(propagator, IDLE_TIMEOUT)
    }

    pub fn with_idle_timeout(propagator: Arc<CollaborationPropagator>, idle_timeout: Duration) -> Self {
        Self {
            propagator,
            workers: Arc::new(Mutex::new(HashMap::new())),
            idle_timeout,
        }
    }

    pub fn propagator(&self) -> &CollaborationPropagator {
        &self.propagator
    }

    /// Sites with a live worker.
    pub fn active_workers(&self) -> usize {
        lock(&self.workers).len()
    }

    /// Queues the change and returns at once.
    pub fn enqueue(&self, collaboration: Record, deleting: bool) -> Result<Ticket, AppError> {
        let site_id = collaboration
            .pointer("site")
            .map(|p| p.object_id)
            .ok_or_else(|| AppError::Validation("collaboration has no site".into()))?;
        let (reply, rx) = oneshot::channel();
        let job = Job {
            collaboration,
            deleting,
            reply,
        };

        let mut workers = lock(&self.workers);
        let sender = workers
            .entry(site_id.clone())
            .or_insert_with(|| self.spawn_worker(&site_id));
        if let Err(mpsc::error::SendError(job)) = sender.send(job) {
            // worker is gone, start a fresh one
            let sender = self.spawn_worker(&site_id);
            sender
                .send(job)
                .map_err(|_| AppError::Internal(format!("cannot queue propagation for site {site_id}")))?;
            workers.insert(site_id.clone(), sender);
        }

        Ok(Ticket { site_id, rx })
    }

    fn spawn_worker(&self, site_id: &str) -> mpsc::UnboundedSender<Job> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let propagator = Arc::clone(&self.propagator);
        let workers = Arc::clone(&self.workers);
        let idle = self.idle_timeout;
        let site_id = site_id.to_string();
        tokio::spawn(async move {
            info!("Propagation worker for site {site_id} started");
            loop {
                let job = match timeout(idle, rx.recv()).await {
                    Ok(Some(job)) => job,
                    Ok(None) => break,
                    Err(_) => match retire_if_idle(&workers, &site_id, &mut rx) {
                        Some(job) => job,
                        None => break,
                    },
                };
                let result = propagator.propagate(&job.collaboration, job.deleting).await;
                if let Err(err) = &result {
                    error!("Propagation on site {site_id} failed: {err}");
                }
                let _ = job.reply.send(result);
            }
            debug!("Propagation worker for site {site_id} retired");
        });
        tx
    }
}
