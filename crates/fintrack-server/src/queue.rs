//! Background transaction categorization
//!
//! Request handlers enqueue a job right after storing a transaction and
//! return immediately. A single dispatcher task drains the queue and runs
//! every job as its own task, with a semaphore capping how many
//! classifications are in flight.

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, error, warn};

use fintrack_core::{CategoryClassifier, Database};

/// A transaction waiting for its category
#[derive(Debug, Clone)]
pub struct ClassificationJob {
    pub transaction_id: i64,
    pub vendor: String,
}

/// Sending half of the classification queue
///
/// Cheap to clone. The dispatcher exits after the last clone is dropped
/// and every queued job has been handed to a worker.
#[derive(Clone)]
pub struct ClassificationQueue {
    tx: mpsc::UnboundedSender<ClassificationJob>,
}

impl ClassificationQueue {
    /// Spawn the dispatcher; must be called inside a tokio runtime
    pub fn start(db: Database, classifier: CategoryClassifier, workers: usize) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let permits = Arc::new(Semaphore::new(workers.max(1)));
        tokio::spawn(dispatch(rx, db, classifier, permits));
        Self { tx }
    }

    /// Queue a job without waiting
    ///
    /// Returns false when the dispatcher is gone; the transaction then stays
    /// uncategorized until a backfill picks it up.
    pub fn enqueue(&self, job: ClassificationJob) -> bool {
        let transaction_id = job.transaction_id;
        match self.tx.send(job) {
            Ok(()) => true,
            Err(_) => {
                warn!(transaction_id, "Classification queue closed, job dropped");
                false
            }
        }
    }
}

async fn dispatch(
    mut rx: mpsc::UnboundedReceiver<ClassificationJob>,
    db: Database,
    classifier: CategoryClassifier,
    permits: Arc<Semaphore>,
) {
    while let Some(job) = rx.recv().await {
        let Ok(permit) = permits.clone().acquire_owned().await else {
            break;
        };
        let db = db.clone();
        let classifier = classifier.clone();

        tokio::spawn(async move {
            let _permit = permit;
            if let Err(e) = classifier
                .classify_and_update(&db, job.transaction_id, &job.vendor)
                .await
            {
                error!(
                    transaction_id = job.transaction_id,
                    "Failed to store category: {}", e
                );
            }
        });
    }
    debug!("Classification queue drained, dispatcher stopping");
}
