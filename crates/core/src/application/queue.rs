// Job Queue - unbounded FIFO between the submission gate and the dispatcher

use crate::domain::JobRequest;
use crate::error::{AppError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Producer handle. Cheap to clone; every clone feeds the same queue.
#[derive(Clone)]
pub struct QueueSender {
    tx: mpsc::UnboundedSender<JobRequest>,
    depth: Arc<AtomicUsize>,
}

impl QueueSender {
    /// Append a request; fails only once the consumer has been dropped
    pub fn push(&self, request: JobRequest) -> Result<()> {
        self.depth.fetch_add(1, Ordering::SeqCst);
        self.tx.send(request).map_err(|e| {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            AppError::Internal(format!(
                "job queue closed, dropped request for {}",
                e.0.client_id
            ))
        })
    }

    /// Requests admitted but not yet taken by the dispatcher
    pub fn pending(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }
}

/// Consumer handle, owned by the dispatcher
pub struct QueueReceiver {
    rx: mpsc::UnboundedReceiver<JobRequest>,
    depth: Arc<AtomicUsize>,
}

impl QueueReceiver {
    /// Next request in submission order; `None` once every sender is gone
    pub async fn recv(&mut self) -> Option<JobRequest> {
        let request = self.rx.recv().await?;
        self.depth.fetch_sub(1, Ordering::SeqCst);
        Some(request)
    }
}

/// Create a connected queue pair
pub fn job_queue() -> (QueueSender, QueueReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let depth = Arc::new(AtomicUsize::new(0));
    (
        QueueSender {
            tx,
            depth: Arc::clone(&depth),
        },
        QueueReceiver { rx, depth },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fifo_order_and_depth() {
        let (tx, mut rx) = job_queue();
        for i in 0..3 {
            tx.push(JobRequest::new(format!("c{}", i), "text", "en"))
                .unwrap();
        }
        assert_eq!(tx.pending(), 3);

        for i in 0..3 {
            let request = rx.recv().await.unwrap();
            assert_eq!(request.client_id, format!("c{}", i));
        }
        assert_eq!(tx.pending(), 0);
    }

    #[tokio::test]
    async fn test_multiple_producers() {
        let (tx, mut rx) = job_queue();
        let mut handles = Vec::new();
        for p in 0..4 {
            let tx = tx.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..25 {
                    tx.push(JobRequest::new(format!("p{}-{}", p, i), "t", "en"))
                        .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        drop(tx);

        let mut received = 0;
        while rx.recv().await.is_some() {
            received += 1;
        }
        assert_eq!(received, 100);
    }

    #[tokio::test]
    async fn test_push_after_consumer_dropped_fails() {
        let (tx, rx) = job_queue();
        drop(rx);

        let result = tx.push(JobRequest::new("c1", "text", "en"));
        assert!(matches!(result, Err(AppError::Internal(_))));
        assert_eq!(tx.pending(), 0);
    }
}
