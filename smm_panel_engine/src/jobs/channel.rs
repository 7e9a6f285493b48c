use std::sync::Arc;

use log::*;
use tokio::sync::{mpsc, Mutex};

use crate::jobs::SideJob;

/// Creates the bounded side-job queue. The sender side lives in the APIs; the receiving side is shared by
/// the worker pool.
pub fn side_job_channel(buffer: usize) -> (SideJobSender, SideJobQueue) {
    let (tx, rx) = mpsc::channel(buffer);
    (SideJobSender { tx }, SideJobQueue { rx: Arc::new(Mutex::new(rx)) })
}

#[derive(Clone)]
pub struct SideJobSender {
    tx: mpsc::Sender<SideJob>,
}

impl SideJobSender {
    /// Enqueues without waiting. When the queue is full or no worker is running any more, the job is dropped
    /// with a warning; side work is best effort by contract.
    pub fn dispatch(&self, job: SideJob) {
        if let Err(e) = self.tx.try_send(job) {
            warn!("📬️ Side job dropped: {e}");
        }
    }
}

/// The shared receiving end of the queue. Workers take jobs one at a time; the mutex serializes pickup, not
/// processing.
#[derive(Clone)]
pub struct SideJobQueue {
    rx: Arc<Mutex<mpsc::Receiver<SideJob>>>,
}

impl SideJobQueue {
    /// The next job, or `None` once every sender has been dropped.
    pub async fn next_job(&self) -> Option<SideJob> {
        self.rx.lock().await.recv().await
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn dispatch_is_non_blocking_and_ordered() {
        let (tx, queue) = side_job_channel(8);
        tx.dispatch(SideJob::RecordPurchase { source_service_id: "2493".into() });
        tx.dispatch(SideJob::CancelRemote { order_id: 7, provider_order_id: "900123".into() });
        assert_eq!(queue.next_job().await, Some(SideJob::RecordPurchase { source_service_id: "2493".into() }));
        assert_eq!(
            queue.next_job().await,
            Some(SideJob::CancelRemote { order_id: 7, provider_order_id: "900123".into() })
        );
        drop(tx);
        assert_eq!(queue.next_job().await, None);
    }

    #[tokio::test]
    async fn full_queue_drops_instead_of_blocking() {
        let (tx, queue) = side_job_channel(1);
        tx.dispatch(SideJob::RecordPurchase { source_service_id: "1".into() });
        // Capacity is 1, so this one is dropped with a warning.
        tx.dispatch(SideJob::RecordPurchase { source_service_id: "2".into() });
        assert_eq!(queue.next_job().await, Some(SideJob::RecordPurchase { source_service_id: "1".into() }));
        drop(tx);
        assert_eq!(queue.next_job().await, None);
    }
}
