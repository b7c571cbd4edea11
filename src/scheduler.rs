//! Uplink scheduling
//!
//! In timer-driven mode the TX timer is re-armed after every send attempt
//! with `max(duty-cycle wait, nominal period)`, so the node never sends
//! faster than configured and always honours the radio's wait time.

use crate::board::Board;
use crate::config::ports;
use crate::config::timing::APP_TX_DUTYCYCLE_MS;
use crate::payload::PayloadEncoder;
use crate::radio::{LorawanStack, RadioError};
use crate::tasks::{Task, TaskQueue};
use crate::telegram::TelegramSlot;
use crate::timer::{TimerId, Timers};
use log::{info, warn};

/// What triggers an uplink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxTrigger {
    /// Every TX period
    Timer,
    /// External signal such as a button press
    Event,
}

/// Result of one send attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Uplink accepted by the stack
    Sent,
    /// Stack asked to wait before the next uplink
    Deferred { wait_ms: u32 },
    /// Stack rejected the uplink
    Failed(RadioError),
}

pub struct TxScheduler {
    trigger: TxTrigger,
    period_ms: u32,
    next_period_ms: u32,
    confirmed: bool,
    encoder: PayloadEncoder,
}

impl TxScheduler {
    /// A period of zero selects the default period
    pub fn new(trigger: TxTrigger, period_ms: u32, confirmed: bool) -> Self {
        let period_ms = if period_ms == 0 {
            APP_TX_DUTYCYCLE_MS
        } else {
            period_ms
        };
        Self {
            trigger,
            period_ms,
            next_period_ms: period_ms,
            confirmed,
            encoder: PayloadEncoder::new(),
        }
    }

    /// Arm the TX timer in timer-driven mode
    pub fn start<T: Timers>(&self, timers: &mut T) {
        if self.trigger == TxTrigger::Timer {
            timers.set_period(TimerId::Tx, self.period_ms);
            timers.start(TimerId::Tx);
        }
    }

    /// TX timer expiry (interrupt context): defer the send and re-arm
    pub fn on_timer_expired<T: Timers>(&self, queue: &mut TaskQueue, timers: &mut T) {
        queue.post(Task::SendUplink);
        timers.start(TimerId::Tx);
    }

    /// External trigger (interrupt context)
    pub fn on_external_event(&self, queue: &mut TaskQueue) {
        queue.post(Task::SendUplink);
    }

    /// Send task: encode, submit and reschedule
    pub fn send_uplink<R, T, B>(
        &mut self,
        slot: &mut TelegramSlot,
        board: &mut B,
        radio: &mut R,
        timers: &mut T,
    ) -> SendOutcome
    where
        R: LorawanStack,
        T: Timers,
        B: Board,
    {
        let payload = self.encoder.encode(slot, board);

        if timers.is_running(TimerId::JoinLed) && radio.is_joined() {
            timers.stop(TimerId::JoinLed);
        }

        let mut wait_ms = 0;
        let outcome = match radio.send(ports::USER_APP, payload.as_bytes(), self.confirmed) {
            Ok(()) => {
                info!("SEND REQUEST ({} bytes)", payload.len());
                SendOutcome::Sent
            }
            Err(RadioError::DutyCycleRestricted) => {
                wait_ms = radio.duty_cycle_wait_ms();
                if wait_ms > 0 {
                    info!("Next Tx in: ~{} second(s)", wait_ms / 1000);
                }
                SendOutcome::Deferred { wait_ms }
            }
            Err(e) => {
                warn!("Send failed: {}", e);
                SendOutcome::Failed(e)
            }
        };

        self.next_period_ms = wait_ms.max(self.period_ms);
        if self.trigger == TxTrigger::Timer {
            timers.stop(TimerId::Tx);
            timers.set_period(TimerId::Tx, self.next_period_ms);
            timers.start(TimerId::Tx);
        }

        outcome
    }

    /// Change the nominal period; zero reverts to the default
    pub fn set_period<T: Timers>(&mut self, period_ms: u32, timers: &mut T) {
        self.period_ms = if period_ms == 0 {
            APP_TX_DUTYCYCLE_MS
        } else {
            period_ms
        };
        self.next_period_ms = self.period_ms;
        info!("Tx period set to {} ms", self.period_ms);

        if self.trigger == TxTrigger::Timer {
            timers.stop(TimerId::Tx);
            timers.set_period(TimerId::Tx, self.period_ms);
            timers.start(TimerId::Tx);
        }
    }

    /// Stop the TX timer (e.g. while the join mode changes)
    pub fn suspend<T: Timers>(&self, timers: &mut T) {
        timers.stop(TimerId::Tx);
    }

    /// Restart the TX timer after [`suspend`](Self::suspend)
    pub fn resume<T: Timers>(&self, timers: &mut T) {
        if self.trigger == TxTrigger::Timer {
            timers.start(TimerId::Tx);
        }
    }

    pub fn set_confirmed(&mut self, confirmed: bool) {
        self.confirmed = confirmed;
    }

    pub fn confirmed(&self) -> bool {
        self.confirmed
    }

    pub fn trigger(&self) -> TxTrigger {
        self.trigger
    }

    /// Nominal period
    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    /// Period used for the next TX timer run
    pub fn next_period_ms(&self) -> u32 {
        self.next_period_ms
    }

    /// Encoder holding the last payload built
    pub fn encoder(&self) -> &PayloadEncoder {
        &self.encoder
    }
}
