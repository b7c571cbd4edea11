//! Bounded task queue
//!
//! Posting a task that is already pending is a no-op, so the queue never
//! holds more than one entry per [`Task`] and cannot overflow. Tasks run by
//! priority, then in posting order.

use super::{Priority, Task};
use heapless::Vec;

pub struct TaskQueue {
    pending: Vec<Task, { Task::COUNT }>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Mark `task` as pending.
    ///
    /// Returns false if it was already pending.
    pub fn post(&mut self, task: Task) -> bool {
        if self.is_pending(task) {
            return false;
        }
        // One slot per task variant
        self.pending.push(task).is_ok()
    }

    /// Take the next task to run
    pub fn pop(&mut self) -> Option<Task> {
        let mut best: Option<(usize, Priority)> = None;
        for (index, task) in self.pending.iter().enumerate() {
            let priority = task.priority();
            match best {
                Some((_, current)) if current <= priority => {}
                _ => best = Some((index, priority)),
            }
        }
        best.map(|(index, _)| self.pending.remove(index))
    }

    pub fn is_pending(&self, task: Task) -> bool {
        self.pending.contains(&task)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop all pending tasks
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}
