//! Worker pool for concurrent dispatch
//!
//! A fixed number of scoped OS threads pull work from a shared FIFO queue.
//! The queue is guarded by a mutex with condvar wait/notify; closing it
//! wakes idle workers so they can exit once the backlog is drained.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::thread;
use tracing::{debug, warn};

/// Pool size used when hardware parallelism cannot be determined
pub const FALLBACK_WORKERS: usize = 2;

/// Blocking FIFO queue shared between the dispatcher and its workers
pub struct TaskQueue<T> {
    state: Mutex<QueueState<T>>,
    ready: Condvar,
}

struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

impl<T> TaskQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                closed: false,
            }),
            ready: Condvar::new(),
        }
    }

    pub fn push(&self, item: T) {
        self.state.lock().items.push_back(item);
        self.ready.notify_one();
    }

    /// Signal that no more work will arrive
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.ready.notify_all();
    }

    /// Block until an item is available; `None` once closed and drained
    pub fn pop(&self) -> Option<T> {
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                return Some(item);
            }
            if state.closed {
                return None;
            }
            self.ready.wait(&mut state);
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-size pool of worker threads, scoped to one batch of work
#[derive(Clone, Copy, Debug)]
pub struct WorkerPool {
    size: usize,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        Self { size: size.max(1) }
    }

    /// Size the pool to the available hardware parallelism
    pub fn with_available_parallelism() -> Self {
        Self::new(available_workers())
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Run every item through `work`, returning results in enqueue order.
    ///
    /// Workers start before the first item is queued and are all joined
    /// before this returns. Execution order across workers is unspecified.
    pub fn run<T, R, W>(&self, items: impl IntoIterator<Item = T>, work: W) -> Vec<R>
    where
        T: Send,
        R: Send,
        W: Fn(T) -> R + Sync,
    {
        let queue = TaskQueue::new();
        let results = Mutex::new(Vec::new());

        thread::scope(|scope| {
            let worker = || {
                while let Some((index, item)) = queue.pop() {
                    let result = work(item);
                    results.lock().push((index, result));
                }
            };

            let mut spawned = 0;
            for id in 0..self.size {
                let spawn = thread::Builder::new()
                    .name(format!("unitrun-worker-{id}"))
                    .spawn_scoped(scope, worker);
                match spawn {
                    Ok(_) => spawned += 1,
                    Err(e) => warn!("failed to spawn worker {id}: {e}"),
                }
            }
            debug!(workers = spawned, "worker pool started");

            for entry in items.into_iter().enumerate() {
                queue.push(entry);
            }
            queue.close();

            if spawned == 0 {
                warn!("no worker threads available, draining queue on dispatching thread");
                worker();
            }
        });

        let mut results = results.into_inner();
        results.sort_by_key(|(index, _)| *index);
        results.into_iter().map(|(_, result)| result).collect()
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::with_available_parallelism()
    }
}

/// Hardware execution units, or [`FALLBACK_WORKERS`] when unknown
pub fn available_workers() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(FALLBACK_WORKERS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_queue_is_fifo() {
        let queue = TaskQueue::new();
        for i in 0..5 {
            queue.push(i);
        }
        queue.close();

        let drained: Vec<_> = std::iter::from_fn(|| queue.pop()).collect();
        assert_eq!(drained, vec![0, 1, 2, 3, 4]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_pop_wakes_on_push_from_other_thread() {
        let queue = Arc::new(TaskQueue::new());
        let consumer = {
            let queue = Arc::clone(&queue);
            std::thread::spawn(move || queue.pop())
        };
        std::thread::sleep(Duration::from_millis(20));
        queue.push("late");
        assert_eq!(consumer.join().unwrap(), Some("late"));
    }

    #[test]
    fn test_close_releases_idle_workers() {
        let queue: Arc<TaskQueue<u32>> = Arc::new(TaskQueue::new());
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let queue = Arc::clone(&queue);
                std::thread::spawn(move || queue.pop())
            })
            .collect();
        std::thread::sleep(Duration::from_millis(20));
        queue.close();
        for waiter in waiters {
            assert_eq!(waiter.join().unwrap(), None);
        }
    }

    #[test]
    fn test_single_worker_preserves_order() {
        let order = Mutex::new(Vec::new());
        let pool = WorkerPool::new(1);
        pool.run(0..10, |i| order.lock().push(i));
        assert_eq!(order.into_inner(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_results_returned_in_enqueue_order() {
        let pool = WorkerPool::new(4);
        let results = pool.run(0..50u64, |i| {
            std::thread::sleep(Duration::from_millis(50 - i));
            i * 2
        });
        assert_eq!(results, (0..50u64).map(|i| i * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_work_spreads_across_workers() {
        let pool = WorkerPool::new(4);
        let threads = Mutex::new(HashSet::new());
        let processed = AtomicUsize::new(0);
        pool.run(0..16, |_| {
            std::thread::sleep(Duration::from_millis(20));
            threads.lock().insert(std::thread::current().id());
            processed.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(processed.load(Ordering::SeqCst), 16);
        assert!(threads.lock().len() > 1);
        assert!(!threads.lock().contains(&std::thread::current().id()));
    }

    #[test]
    fn test_empty_batch() {
        let pool = WorkerPool::new(3);
        let results: Vec<u32> = pool.run(Vec::<u32>::new(), |i| i);
        assert!(results.is_empty());
    }

    #[test]
    fn test_pool_size_never_zero() {
        assert_eq!(WorkerPool::new(0).size(), 1);
        assert!(available_workers() >= 1);
    }
}
