//! Join supervisor
//!
//! Starts in `Joining` with the configured activation mode. When the join
//! window expires without a session and the node is still on its default
//! mode, a [`Task::StopJoin`] is posted; running it halts the attempt and
//! retries in the other mode. The mode never flips back on its own.

use crate::radio::{ActivationMode, LorawanStack, RadioError, StackParams};
use crate::tasks::{Task, TaskQueue};
use crate::timer::{TimerId, Timers};
use log::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinState {
    Joining,
    Joined,
}

pub struct JoinSupervisor {
    state: JoinState,
    default_mode: ActivationMode,
    mode: ActivationMode,
    window_ms: u32,
    force_rejoin_at_boot: bool,
}

impl JoinSupervisor {
    pub fn new(default_mode: ActivationMode, window_ms: u32, force_rejoin_at_boot: bool) -> Self {
        Self {
            state: JoinState::Joining,
            default_mode,
            mode: default_mode,
            window_ms,
            force_rejoin_at_boot,
        }
    }

    /// Arm the join window and the joining indicator, then issue the first join
    pub fn start<R, T>(&mut self, radio: &mut R, timers: &mut T)
    where
        R: LorawanStack,
        T: Timers,
    {
        timers.start(TimerId::JoinLed);
        timers.set_period(TimerId::StopJoin, self.window_ms);
        timers.start(TimerId::StopJoin);

        info!("Joining in {} mode", self.mode);
        radio.join(self.mode, self.force_rejoin_at_boot);
    }

    /// Join window expiry (timer context)
    ///
    /// Returns true when a mode switch was posted.
    pub fn on_window_expired(&self, queue: &mut TaskQueue) -> bool {
        if self.state == JoinState::Joining && self.mode == self.default_mode {
            queue.post(Task::StopJoin)
        } else {
            false
        }
    }

    /// Whether a pending StopJoin task still has a join to abandon
    pub fn rotation_due<R: LorawanStack>(&self, radio: &R) -> bool {
        self.state == JoinState::Joining && !radio.is_joined()
    }

    /// StopJoin task: halt the current attempt and retry in the other mode.
    ///
    /// The TX timer is owned by the caller; it must be stopped before this
    /// call and restarted only when it returns true. Any halt error leaves
    /// the mode unchanged and re-arms the window so the switch is tried
    /// again.
    pub fn rotate_mode<R, T>(&mut self, radio: &mut R, timers: &mut T, params: &StackParams) -> bool
    where
        R: LorawanStack,
        T: Timers,
    {
        if !self.rotation_due(radio) {
            debug!("Join window expired after join, ignored");
            return false;
        }

        if let Err(e) = radio.halt() {
            match e {
                RadioError::Busy => warn!("Stack still halting, mode switch postponed"),
                e => warn!("Halt failed ({}), mode switch postponed", e),
            }
            timers.start(TimerId::StopJoin);
            return false;
        }

        self.mode = self.default_mode.other();
        info!("Switching to {} mode", self.mode);

        if let Err(e) = radio.configure(params) {
            warn!("Stack configuration failed: {}", e);
        }
        radio.join(self.mode, true);
        timers.start(TimerId::StopJoin);
        true
    }

    /// Join result reported by the stack
    pub fn on_join_result<R, T>(
        &mut self,
        mode: ActivationMode,
        success: bool,
        radio: &mut R,
        timers: &mut T,
        queue: &mut TaskQueue,
    ) where
        R: LorawanStack,
        T: Timers,
    {
        if success {
            info!("JOINED = {}", mode);
            self.state = JoinState::Joined;
            timers.stop(TimerId::StopJoin);
            timers.stop(TimerId::JoinLed);
            queue.post(Task::StoreContext);
        } else if self.mode == self.default_mode {
            info!("JOIN FAILED ({}), retrying", mode);
            radio.join(self.mode, self.force_rejoin_at_boot);
        } else {
            info!("JOIN FAILED ({}), waiting for join window", mode);
        }
    }

    /// Reset requests are honoured only after a clean halt while joined.
    ///
    /// The session is checked first so a request arriving mid-join does
    /// not halt the join it is about to drop.
    pub fn reset_allowed<R: LorawanStack>(&self, radio: &mut R) -> bool {
        radio.is_joined() && radio.halt().is_ok()
    }

    pub fn state(&self) -> JoinState {
        self.state
    }

    /// Mode used by the current join attempt
    pub fn mode(&self) -> ActivationMode {
        self.mode
    }

    pub fn default_mode(&self) -> ActivationMode {
        self.default_mode
    }
}
