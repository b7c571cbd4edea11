//! Application context
//!
//! [`App`] owns every piece of mutable state (task queue, telegram slot,
//! scheduler, join supervisor) together with the platform collaborators.
//! The `on_*` entry points are meant to be called from interrupt or timer
//! context and only post tasks or store data; all real work happens in
//! [`App::run_pending`], called from the main loop.

use crate::board::Board;
use crate::config::{lorawan_defaults, nvm::PAGE_SIZE, ports, timing, version};
use crate::downlink::{DownlinkCommand, DownlinkParser};
use crate::join::JoinSupervisor;
use crate::radio::{ActivationMode, LorawanStack, NvmSnapshot, StackEvent, StackParams};
use crate::scheduler::{SendOutcome, TxScheduler, TxTrigger};
use crate::storage::{ContextError, ContextStore, NvmStorage};
use crate::tasks::{Task, TaskQueue};
use crate::telegram::TelegramSlot;
use crate::timer::{TimerId, Timers};
use log::{debug, info, warn};

/// Startup choices for one node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppConfig {
    pub trigger: TxTrigger,
    pub activation_mode: ActivationMode,
    pub confirmed: bool,
    /// Nominal uplink period, zero selects the default
    pub period_ms: u32,
    pub join_window_ms: u32,
    pub force_rejoin_at_boot: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            trigger: TxTrigger::Timer,
            activation_mode: lorawan_defaults::ACTIVATION_MODE,
            confirmed: lorawan_defaults::CONFIRMED_MSG,
            period_ms: timing::APP_TX_DUTYCYCLE_MS,
            join_window_ms: timing::JOIN_TIME_MS,
            force_rejoin_at_boot: lorawan_defaults::FORCE_REJOIN_AT_BOOT,
        }
    }
}

/// Top-level context of the metering node
pub struct App<R, T, B, S>
where
    R: LorawanStack,
    T: Timers,
    B: Board,
    S: NvmStorage,
{
    radio: R,
    timers: T,
    board: B,
    storage: S,
    queue: TaskQueue,
    slot: TelegramSlot,
    scheduler: TxScheduler,
    join: JoinSupervisor,
    context_store: ContextStore,
    downlinks: DownlinkParser,
    params: StackParams,
}

impl<R, T, B, S> App<R, T, B, S>
where
    R: LorawanStack,
    T: Timers,
    B: Board,
    S: NvmStorage,
{
    pub fn new(config: AppConfig, radio: R, timers: T, board: B, storage: S) -> Self {
        let params = StackParams {
            confirmed: config.confirmed,
            ..StackParams::default()
        };

        Self {
            radio,
            timers,
            board,
            storage,
            queue: TaskQueue::new(),
            slot: TelegramSlot::new(),
            scheduler: TxScheduler::new(config.trigger, config.period_ms, config.confirmed),
            join: JoinSupervisor::new(
                config.activation_mode,
                config.join_window_ms,
                config.force_rejoin_at_boot,
            ),
            context_store: ContextStore::default(),
            downlinks: DownlinkParser::new(),
            params,
        }
    }

    /// Bring the node up: restore the stack context, configure the stack,
    /// start joining and arm the TX timer.
    pub fn init(&mut self) {
        info!(
            "APP_VERSION: V{}.{}.{}",
            version::MAJOR,
            version::MINOR,
            version::PATCH
        );

        self.restore_context();

        if let Err(e) = self.radio.configure(&self.params) {
            warn!("Stack configuration failed: {}", e);
        }

        self.timers.set_period(TimerId::JoinLed, timing::LED_PERIOD_MS);
        self.join.start(&mut self.radio, &mut self.timers);
        self.scheduler.start(&mut self.timers);
    }

    /// TX timer expired
    pub fn on_tx_timer(&mut self) {
        self.scheduler.on_timer_expired(&mut self.queue, &mut self.timers);
    }

    /// External trigger (button), only used in event-driven mode
    pub fn on_button(&mut self) {
        if self.scheduler.trigger() == TxTrigger::Event {
            self.scheduler.on_external_event(&mut self.queue);
        }
    }

    /// Join window expired
    pub fn on_join_timer(&mut self) {
        self.join.on_window_expired(&mut self.queue);
    }

    /// Joining indicator period elapsed
    pub fn on_join_led_timer(&mut self) {
        self.board.toggle_join_led();
        self.timers.start(TimerId::JoinLed);
    }

    /// The LoRaWAN stack has work to do
    pub fn on_mac_notify(&mut self) {
        self.queue.post(Task::MacProcess);
    }

    /// A complete telegram was received from the meter
    pub fn on_telegram(&mut self, data: &[u8]) {
        self.slot.store(data);
    }

    /// Drain the task queue. Returns the number of tasks run.
    pub fn run_pending(&mut self) -> usize {
        let mut count = 0;
        while let Some(task) = self.queue.pop() {
            self.run_task(task);
            count += 1;
        }
        count
    }

    fn run_task(&mut self, task: Task) {
        debug!("Running task {:?}", task);
        match task {
            Task::MacProcess => self.process_stack(),
            Task::SendUplink => {
                let outcome = self.scheduler.send_uplink(
                    &mut self.slot,
                    &mut self.board,
                    &mut self.radio,
                    &mut self.timers,
                );
                if let SendOutcome::Failed(e) = outcome {
                    debug!("Uplink not sent: {}", e);
                }
            }
            Task::StoreContext => self.store_context(),
            Task::StopJoin => {
                if !self.join.rotation_due(&self.radio) {
                    debug!("Join already complete, mode switch skipped");
                    return;
                }
                // TX stays stopped until the stack has halted cleanly
                self.scheduler.suspend(&mut self.timers);
                if self
                    .join
                    .rotate_mode(&mut self.radio, &mut self.timers, &self.params)
                {
                    self.scheduler.resume(&mut self.timers);
                }
            }
        }
    }

    fn process_stack(&mut self) {
        while let Some(event) = self.radio.process() {
            self.handle_stack_event(event);
        }
    }

    fn handle_stack_event(&mut self, event: StackEvent) {
        match event {
            StackEvent::JoinResult { mode, success } => {
                self.join.on_join_result(
                    mode,
                    success,
                    &mut self.radio,
                    &mut self.timers,
                    &mut self.queue,
                );
            }
            StackEvent::TxDone {
                uplink_counter,
                port,
                confirmed,
                ack,
            } => {
                info!(
                    "TX DONE: counter={} port={} {}",
                    uplink_counter,
                    port,
                    match (confirmed, ack) {
                        (false, _) => "UNCONFIRMED",
                        (true, true) => "CONFIRMED ACK",
                        (true, false) => "CONFIRMED NACK",
                    }
                );
            }
            StackEvent::RxData {
                port,
                data,
                rssi,
                snr,
            } => {
                info!(
                    "RX: port={} {} bytes rssi={} snr={}",
                    port,
                    data.len(),
                    rssi,
                    snr
                );
                self.handle_downlink(port, &data);
            }
            StackEvent::NvmChanged(state) => info!("NVM context {:?}", state),
            StackEvent::ClassChanged(class) => {
                info!("Switched to class {:?}", class);
                self.params.class = class;
            }
            StackEvent::TxPeriodicityChanged(period_ms) => {
                self.scheduler.set_period(period_ms, &mut self.timers);
            }
            StackEvent::TxFrameCtrlChanged(confirmed) => {
                info!("Confirmed uplinks: {}", confirmed);
                self.scheduler.set_confirmed(confirmed);
                self.params.confirmed = confirmed;
            }
            StackEvent::SystemResetRequested => self.system_reset(),
        }
    }

    fn handle_downlink(&mut self, port: u8, data: &[u8]) {
        if port == ports::USER_APP || data.is_empty() {
            debug!("Downlink on port {} ignored", port);
            return;
        }

        let command = match self.downlinks.parse(port, data) {
            Ok(command) => command,
            Err(e) => {
                warn!("Invalid downlink on port {}: {}", port, e);
                return;
            }
        };

        match command {
            DownlinkCommand::SetReportingInterval { .. } => {
                if let Some(period_ms) = command.period_ms() {
                    self.scheduler.set_period(period_ms, &mut self.timers);
                }
            }
            DownlinkCommand::Reset => self.system_reset(),
            DownlinkCommand::FactoryReset => {
                match self.context_store.clear(&mut self.storage) {
                    Ok(()) => info!("Stored context erased"),
                    Err(e) => warn!("Context erase failed: {}", e),
                }
                self.system_reset();
            }
            DownlinkCommand::SwitchClass(class) => {
                if let Err(e) = self.radio.request_class(class) {
                    warn!("Class {:?} switch failed: {}", class, e);
                }
            }
        }
    }

    /// Persist the stack context if it changed. Failures are logged only;
    /// the next successful join stores it again.
    fn store_context(&mut self) {
        match self.radio.nvm_context() {
            Ok(NvmSnapshot::UpToDate) => info!("NVM DATA UP TO DATE"),
            Ok(NvmSnapshot::Changed(context)) => {
                match self.context_store.save(&mut self.storage, context) {
                    Ok(()) => info!("NVM DATA STORED ({} bytes)", context.len()),
                    Err(e) => warn!("NVM store failed: {}", e),
                }
            }
            Err(e) => warn!("NVM context unavailable: {}", e),
        }
    }

    fn restore_context(&mut self) {
        let mut buf = [0u8; PAGE_SIZE];
        match self.context_store.load(&mut self.storage, &mut buf) {
            Ok(context) => match self.radio.restore_nvm_context(context) {
                Ok(()) => info!("NVM context restored ({} bytes)", context.len()),
                Err(e) => warn!("NVM context rejected by stack: {}", e),
            },
            Err(ContextError::Blank) => info!("No stored NVM context"),
            Err(e) => warn!("NVM context not restored: {}", e),
        }
    }

    /// Reset the MCU if the stack halts cleanly and a session exists
    fn system_reset(&mut self) {
        if self.join.reset_allowed(&mut self.radio) {
            info!("System reset");
            self.board.system_reset();
        } else {
            debug!("Reset request dropped");
        }
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    pub fn timers(&self) -> &T {
        &self.timers
    }

    pub fn timers_mut(&mut self) -> &mut T {
        &mut self.timers
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut B {
        &mut self.board
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    pub fn scheduler(&self) -> &TxScheduler {
        &self.scheduler
    }

    pub fn join(&self) -> &JoinSupervisor {
        &self.join
    }

    pub fn params(&self) -> &StackParams {
        &self.params
    }

    pub fn telegram_slot(&self) -> &TelegramSlot {
        &self.slot
    }
}
