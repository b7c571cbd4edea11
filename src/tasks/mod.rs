//! Cooperative tasks
//!
//! Interrupt handlers and timer callbacks never run application logic; they
//! post one of these tasks and the main loop drains the queue, one task at a
//! time, to completion.

pub mod queue;

pub use queue::TaskQueue;

/// Deferred work items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Let the LoRaWAN stack run and collect its events
    MacProcess,
    /// Build and send an uplink
    SendUplink,
    /// Persist the stack context to flash
    StoreContext,
    /// Abandon the current join and switch activation mode
    StopJoin,
}

/// Static task priority, lower runs first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    High = 0,
    Normal = 1,
}

impl Task {
    /// Number of distinct tasks
    pub const COUNT: usize = 4;

    pub fn priority(self) -> Priority {
        match self {
            Task::MacProcess => Priority::High,
            Task::SendUplink | Task::StoreContext | Task::StopJoin => Priority::Normal,
        }
    }
}
