//! Single-threaded completion queue for asynchronous readbacks.

use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Sender};
use tracing::{debug, warn};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs submitted jobs one at a time, in submission order, on a dedicated
/// worker thread.
pub struct ReadbackQueue {
    sender: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl ReadbackQueue {
    pub fn new(name: &str) -> std::io::Result<Self> {
        let (sender, receiver) = channel::unbounded::<Job>();
        let worker = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                for job in receiver {
                    job();
                }
                debug!("Readback queue drained");
            })?;

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    /// Queues `job`. If the worker is gone the job runs on the calling thread,
    /// so a submitted completion is never lost.
    pub fn submit(&self, job: impl FnOnce() + Send + 'static) {
        let job: Job = Box::new(job);
        let rejected = match &self.sender {
            Some(sender) => sender.send(job).err().map(|e| e.into_inner()),
            None => Some(job),
        };
        if let Some(job) = rejected {
            warn!("Readback worker unavailable, completing inline");
            job();
        }
    }
}

impl Drop for ReadbackQueue {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            // The last owner may be a job running on the worker itself.
            if worker.thread().id() != thread::current().id() {
                let _ = worker.join();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_jobs_run_in_order_off_thread() {
        let queue = ReadbackQueue::new("test-readback").unwrap();
        let (tx, rx) = channel::unbounded();
        let caller = thread::current().id();
        for i in 0..5 {
            let tx = tx.clone();
            queue.submit(move || {
                tx.send((i, thread::current().id())).unwrap();
            });
        }

        let received: Vec<_> = (0..5)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        assert_eq!(received.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
        assert!(received.iter().all(|(_, id)| *id != caller));
    }

    #[test]
    fn test_drop_waits_for_pending_jobs() {
        let (tx, rx) = channel::unbounded();
        {
            let queue = ReadbackQueue::new("test-readback").unwrap();
            queue.submit(move || tx.send(42).unwrap());
        }
        assert_eq!(rx.try_recv().unwrap(), 42);
    }
}
