//! Task supervisor for delayed transitions.
//!
//! The decision loop never waits for a transition to finish.  Each
//! delayed transition (settle, brake-cooldown, water soak) is spawned onto
//! a single-threaded `edge-executor`, and the supervisor keeps the task
//! handles so they can be awaited in tests or abandoned on shutdown.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Main thread                                                 │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │  futures_lite::future::block_on                        │  │
//! │  │  ┌──────────────────────────────────────────────────┐  │  │
//! │  │  │  edge_executor::LocalExecutor                    │  │  │
//! │  │  │                                                  │  │  │
//! │  │  │  ┌────────────┐  ┌──────────┐  ┌──────────────┐  │  │  │
//! │  │  │  │ Decision   │  │ Settle   │  │ Water soak   │  │  │  │
//! │  │  │  │ loop (run) │  │ 2s ⏱     │  │ 3s ⏱         │  │  │  │
//! │  │  │  └────────────┘  └──────────┘  └──────────────┘  │  │  │
//! │  │  └──────────────────────────────────────────────────┘  │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use core::cell::RefCell;
use core::future::Future;

use edge_executor::{LocalExecutor, Task};
use log::{debug, info};

/// Upper bound on tasks queued on the executor at once.
const TASK_QUEUE_DEPTH: usize = 64;

/// Owns the executor and every spawned transition task.
pub struct Supervisor<'a> {
    executor: LocalExecutor<'a, TASK_QUEUE_DEPTH>,
    tasks: RefCell<Vec<Task<()>>>,
}

impl<'a> Supervisor<'a> {
    pub fn new() -> Self {
        Self {
            executor: LocalExecutor::new(),
            tasks: RefCell::new(Vec::new()),
        }
    }

    /// Start `fut` concurrently with whatever is currently running.
    pub fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + 'a,
    {
        let task = self.executor.spawn(fut);
        let mut tasks = self.tasks.borrow_mut();
        tasks.retain(|t| !t.is_finished());
        tasks.push(task);
        debug!("Supervisor: {} task(s) in flight", tasks.len());
    }

    /// Tasks spawned and not yet finished.
    pub fn in_flight(&self) -> usize {
        self.tasks.borrow().iter().filter(|t| !t.is_finished()).count()
    }

    /// Wait for every spawned task, including ones spawned while waiting.
    pub async fn join_all(&self) {
        loop {
            // Pop before awaiting so the RefCell is not borrowed across the await.
            let next = self.tasks.borrow_mut().pop();
            match next {
                Some(task) => task.await,
                None => break,
            }
        }
    }

    /// Drive the executor until `fut` completes.
    pub fn block_on<F: Future>(&self, fut: F) -> F::Output {
        futures_lite::future::block_on(self.executor.run(fut))
    }

    /// Drop every unfinished task without waiting for it.
    /// Returns how many were still running.
    pub fn abandon(self) -> usize {
        let tasks = self.tasks.into_inner();
        let pending = tasks.iter().filter(|t| !t.is_finished()).count();
        if pending > 0 {
            info!("Supervisor: abandoning {} in-flight task(s)", pending);
        }
        drop(tasks);
        pending
    }
}

impl Default for Supervisor<'_> {
    fn default() -> Self {
        Self::new()
    }
}
