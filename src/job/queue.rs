//! Job Queue (§4.6, §5): FIFO scheduling with a single synchronized
//! cross-thread posting path.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// A job enqueued from the owning thread: may close over `Rc`-shared
/// engine state, so it is not `Send`.
pub type LocalJob = Box<dyn FnOnce()>;

/// A job posted from another thread onto the synchronized queue; must
/// be `Send` since it crosses the thread boundary (§5).
pub type PendingJob = Box<dyn FnOnce() + Send>;

/// FIFO queue of jobs enqueued on this thread plus the cross-thread
/// posting path (§5 "two logical parts"). The same-thread queue needs
/// no synchronization (the engine is single-threaded and cooperative,
/// §5); the cross-thread queue is the one synchronized structure,
/// guarded by a single mutex + condition variable pairing.
#[derive(Default)]
pub struct JobQueue {
    local: std::cell::RefCell<VecDeque<LocalJob>>,
    cross_thread: Mutex<VecDeque<PendingJob>>,
    wake: Condvar,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a job from the owning thread.
    pub fn enqueue(&self, job: LocalJob) {
        self.local.borrow_mut().push_back(job);
    }

    /// Post a job from another thread; takes the wake lock, appends,
    /// and signals the condition variable (§5).
    pub fn post_from_another_thread(&self, job: PendingJob) {
        let mut guard = self.cross_thread.lock();
        guard.push_back(job);
        self.wake.notify_one();
    }

    pub fn has_pending_job(&self) -> bool {
        !self.local.borrow().is_empty() || !self.cross_thread.lock().is_empty()
    }

    /// Block the calling thread until a cross-thread job arrives or
    /// `timeout` elapses, then fold it into the local queue (§5
    /// `waitEventFromAnotherThread`).
    pub fn wait_event_from_another_thread(&self, timeout: Duration) {
        let mut guard = self.cross_thread.lock();
        if guard.is_empty() {
            self.wake.wait_for(&mut guard, timeout);
        }
        let mut local = self.local.borrow_mut();
        local.extend(guard.drain(..).map(|j| -> LocalJob { j }));
    }

    /// Run every currently-queued job to completion, in enqueue order
    /// (§8 invariant 6). Jobs enqueued by a running job are appended
    /// and drained within the same call (§4.6 "Ordering").
    pub fn drain(&self) {
        loop {
            {
                let mut cross = self.cross_thread.lock();
                if !cross.is_empty() {
                    self.local.borrow_mut().extend(cross.drain(..).map(|j| -> LocalJob { j }));
                }
            }
            let next = self.local.borrow_mut().pop_front();
            match next {
                Some(job) => job(),
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn jobs_drain_in_fifo_order() {
        let queue = JobQueue::new();
        let order: Rc<RefCell<Vec<i32>>> = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let order = Rc::clone(&order);
            queue.enqueue(Box::new(move || order.borrow_mut().push(i)));
        }
        queue.drain();
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn jobs_enqueued_during_drain_are_drained_in_the_same_call() {
        let queue = Rc::new(JobQueue::new());
        let order: Rc<RefCell<Vec<i32>>> = Rc::new(RefCell::new(Vec::new()));
        {
            let queue2 = Rc::clone(&queue);
            let order2 = Rc::clone(&order);
            queue.enqueue(Box::new(move || {
                order2.borrow_mut().push(0);
                let order3 = Rc::clone(&order2);
                queue2.enqueue(Box::new(move || order3.borrow_mut().push(1)));
            }));
        }
        queue.drain();
        assert_eq!(*order.borrow(), vec![0, 1]);
    }
}
