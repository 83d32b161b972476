use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::command::executor::Executor;
use crate::foundation::error::{CmdbufError, CmdbufResult};
use crate::process::processor::{Processor, TickReport};
use crate::process::scheduler::{HostScheduler, TaskHandle};

struct Shared<E, S> {
    processor: RefCell<Processor<E>>,
    scheduler: S,
    pending: RefCell<Option<TaskHandle>>,
    posted: Cell<u64>,
    last_report: Cell<Option<TickReport>>,
}

/// A [`Processor`] that re-posts itself to a host loop while its quantum keeps running out.
///
/// At most one continuation is outstanding at a time. Dropping the `ScheduledProcessor` cancels
/// it; so does [`ScheduledProcessor::cancel_pending`].
pub struct ScheduledProcessor<E: Executor + 'static, S: HostScheduler + 'static> {
    shared: Rc<Shared<E, S>>,
}

impl<E: Executor + 'static, S: HostScheduler + 'static> ScheduledProcessor<E, S> {
    /// Attach `processor` to `scheduler`.
    pub fn new(processor: Processor<E>, scheduler: S) -> Self {
        Self {
            shared: Rc::new(Shared {
                processor: RefCell::new(processor),
                scheduler,
                pending: RefCell::new(None),
                posted: Cell::new(0),
                last_report: Cell::new(None),
            }),
        }
    }

    /// Run one tick now, posting a continuation if the quantum ran out.
    ///
    /// Fails with [`CmdbufError::Reentrant`] when called from inside a running tick.
    pub fn process_commands(&self) -> CmdbufResult<TickReport> {
        tick(&self.shared)
    }

    /// Return `true` while a continuation is posted and has not started.
    pub fn has_pending_continuation(&self) -> bool {
        self.shared.pending.borrow().is_some()
    }

    /// Cancel the outstanding continuation. Returns `false` if there was none.
    pub fn cancel_pending(&self) -> bool {
        match self.shared.pending.borrow_mut().take() {
            Some(handle) => {
                handle.cancel();
                tracing::debug!("continuation cancelled");
                true
            }
            None => false,
        }
    }

    /// Continuations posted so far.
    pub fn continuations_posted(&self) -> u64 {
        self.shared.posted.get()
    }

    /// Report of the most recent tick, whether driven directly or by a continuation.
    pub fn last_report(&self) -> Option<TickReport> {
        self.shared.last_report.get()
    }

    /// Run `f` against the processor outside of a tick.
    pub fn with_processor<R>(&self, f: impl FnOnce(&mut Processor<E>) -> R) -> CmdbufResult<R> {
        let mut processor = self
            .shared
            .processor
            .try_borrow_mut()
            .map_err(|_| CmdbufError::Reentrant)?;
        Ok(f(&mut processor))
    }

    /// Borrow the host scheduler.
    pub fn scheduler(&self) -> &S {
        &self.shared.scheduler
    }
}

impl<E: Executor + 'static, S: HostScheduler + 'static> Drop for ScheduledProcessor<E, S> {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

fn tick<E: Executor + 'static, S: HostScheduler + 'static>(
    shared: &Rc<Shared<E, S>>,
) -> CmdbufResult<TickReport> {
    let report = {
        let mut processor = shared
            .processor
            .try_borrow_mut()
            .map_err(|_| CmdbufError::Reentrant)?;
        processor.process_commands()
    };
    shared.last_report.set(Some(report));
    if report.needs_continuation() {
        post_continuation(shared);
    }
    Ok(report)
}

fn post_continuation<E: Executor + 'static, S: HostScheduler + 'static>(
    shared: &Rc<Shared<E, S>>,
) {
    if shared.pending.borrow().is_some() {
        return;
    }
    let weak: Weak<Shared<E, S>> = Rc::downgrade(shared);
    let handle = shared.scheduler.post_task(Box::new(move || {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        shared.pending.borrow_mut().take();
        if let Err(e) = tick(&shared) {
            tracing::warn!(error = %e, "continuation tick skipped");
        }
    }));
    *shared.pending.borrow_mut() = Some(handle);
    shared.posted.set(shared.posted.get() + 1);
    tracing::debug!("continuation posted");
}

#[cfg(test)]
#[path = "../../tests/unit/process/scheduled.rs"]
mod tests;
