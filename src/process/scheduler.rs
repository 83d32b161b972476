use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// A unit of work posted to a host loop.
pub type Task = Box<dyn FnOnce() + 'static>;

/// Cancellation handle for a posted task.
///
/// Clones share the same flag. A cancelled task is dropped by the host loop without running.
#[derive(Clone, Debug, Default)]
pub struct TaskHandle {
    cancelled: Rc<Cell<bool>>,
}

impl TaskHandle {
    /// Create a live handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Prevent the task from running if it has not started yet.
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    /// Return `true` once [`TaskHandle::cancel`] has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

/// Single-threaded host loop the processor posts continuations to.
///
/// Contract: tasks run later, in FIFO order, on the posting thread, and never before `post_task`
/// returns.
pub trait HostScheduler {
    /// Queue `task` and return a handle that can cancel it.
    fn post_task(&self, task: Task) -> TaskHandle;
}

impl<S: HostScheduler + ?Sized> HostScheduler for Rc<S> {
    fn post_task(&self, task: Task) -> TaskHandle {
        (**self).post_task(task)
    }
}

/// FIFO task queue driven explicitly by its owner.
#[derive(Default)]
pub struct LocalTaskQueue {
    queue: RefCell<VecDeque<(TaskHandle, Task)>>,
    ran: Cell<u64>,
}

impl LocalTaskQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queued tasks, cancelled ones included.
    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Return `true` when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Total tasks run so far.
    pub fn tasks_run(&self) -> u64 {
        self.ran.get()
    }

    /// Run the tasks queued at the time of the call. Tasks they post wait for the next call.
    ///
    /// Returns how many tasks ran.
    pub fn run_all_pending(&self) -> usize {
        let n = self.queue.borrow().len();
        let mut ran = 0;
        for _ in 0..n {
            if self.run_one() {
                ran += 1;
            }
        }
        ran
    }

    /// Run tasks until the queue is empty, including tasks posted along the way.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while !self.is_empty() {
            if self.run_one() {
                ran += 1;
            }
        }
        ran
    }

    fn run_one(&self) -> bool {
        // The borrow must end before the task runs: tasks may post more tasks.
        let Some((handle, task)) = self.queue.borrow_mut().pop_front() else {
            return false;
        };
        if handle.is_cancelled() {
            return false;
        }
        task();
        self.ran.set(self.ran.get() + 1);
        true
    }
}

impl HostScheduler for LocalTaskQueue {
    fn post_task(&self, task: Task) -> TaskHandle {
        let handle = TaskHandle::new();
        self.queue.borrow_mut().push_back((handle.clone(), task));
        handle
    }
}

#[cfg(test)]
#[path = "../../tests/unit/process/scheduler.rs"]
mod tests;
