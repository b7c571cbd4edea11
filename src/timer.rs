//! Timer service interface
//!
//! All application timers are one-shot. Expiry callbacks run in interrupt
//! context and must only post tasks, see [`crate::app::App`].

/// Application timers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerId {
    /// Uplink period
    Tx,
    /// Join window before switching activation mode
    StopJoin,
    /// Joining indicator blink
    JoinLed,
}

impl TimerId {
    pub const COUNT: usize = 3;

    pub fn index(self) -> usize {
        match self {
            TimerId::Tx => 0,
            TimerId::StopJoin => 1,
            TimerId::JoinLed => 2,
        }
    }
}

/// Timer primitive provided by the platform
pub trait Timers {
    /// Arm the timer with its current period
    fn start(&mut self, id: TimerId);

    /// Disarm the timer; no-op if it is not running
    fn stop(&mut self, id: TimerId);

    /// Change the period used by the next start
    fn set_period(&mut self, id: TimerId, period_ms: u32);

    fn is_running(&self, id: TimerId) -> bool;
}
