//! LoRaWAN stack interface
//!
//! The MAC layer (join procedure, duty-cycle bookkeeping, retransmissions,
//! security) lives behind this trait. The application only issues requests
//! and reacts to status codes and to the events returned by
//! [`LorawanStack::process`].

use crate::config::payload::LORAWAN_APP_DATA_BUFFER_MAX_SIZE;
use core::fmt;
use heapless::Vec;

/// Network activation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationMode {
    /// Over-the-air activation
    Otaa,
    /// Activation by personalisation (pre-provisioned session)
    Abp,
}

impl ActivationMode {
    /// The other of the two supported modes
    pub fn other(self) -> Self {
        match self {
            ActivationMode::Otaa => ActivationMode::Abp,
            ActivationMode::Abp => ActivationMode::Otaa,
        }
    }
}

impl fmt::Display for ActivationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivationMode::Otaa => f.write_str("OTAA"),
            ActivationMode::Abp => f.write_str("ABP"),
        }
    }
}

/// LoRaWAN device class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    A,
    B,
    C,
}

impl DeviceClass {
    /// Decode the class index used by the class-switch downlink
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::A),
            1 => Some(Self::B),
            2 => Some(Self::C),
            _ => None,
        }
    }
}

/// Errors reported by the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// Regional duty-cycle limit: retry after `duty_cycle_wait_ms()`
    DutyCycleRestricted,
    /// Stack is busy (e.g. a halt is still in progress)
    Busy,
    /// No network session yet
    NoNetworkJoined,
    /// Payload exceeds the current data rate's limit
    PayloadTooLong,
    /// Request rejected for any other reason
    Failed,
}

impl fmt::Display for RadioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RadioError::DutyCycleRestricted => "duty cycle restricted",
            RadioError::Busy => "stack busy",
            RadioError::NoNetworkJoined => "no network joined",
            RadioError::PayloadTooLong => "payload too long",
            RadioError::Failed => "request failed",
        };
        f.write_str(text)
    }
}

/// Parameters handed to the stack on (re)configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackParams {
    pub class: DeviceClass,
    pub adr_enabled: bool,
    pub data_rate: u8,
    pub confirmed: bool,
}

impl Default for StackParams {
    fn default() -> Self {
        use crate::config::lorawan_defaults;

        Self {
            class: DeviceClass::A,
            adr_enabled: lorawan_defaults::ADR_ENABLED,
            data_rate: lorawan_defaults::DATA_RATE,
            confirmed: lorawan_defaults::CONFIRMED_MSG,
        }
    }
}

/// Direction of an NVM context change notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NvmState {
    Stored,
    Restored,
}

/// Result of asking the stack for its persistent context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NvmSnapshot<'a> {
    /// Nothing changed since the last store
    UpToDate,
    /// Context bytes that should be written to flash
    Changed(&'a [u8]),
}

/// Asynchronous notifications from the stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackEvent {
    /// Outcome of a join attempt
    JoinResult { mode: ActivationMode, success: bool },
    /// Uplink confirmed by the MAC layer
    TxDone {
        uplink_counter: u32,
        port: u8,
        confirmed: bool,
        ack: bool,
    },
    /// Downlink received
    RxData {
        port: u8,
        data: Vec<u8, LORAWAN_APP_DATA_BUFFER_MAX_SIZE>,
        rssi: i16,
        snr: i8,
    },
    /// NVM context written or read back by the stack
    NvmChanged(NvmState),
    /// Device class switch completed
    ClassChanged(DeviceClass),
    /// Network asks for a new uplink period (ms, zero means default)
    TxPeriodicityChanged(u32),
    /// Network asks for confirmed or unconfirmed uplinks
    TxFrameCtrlChanged(bool),
    /// Network asks for a device reset
    SystemResetRequested,
}

/// Abstract LoRaWAN stack for testability
pub trait LorawanStack {
    /// Apply stack parameters
    fn configure(&mut self, params: &StackParams) -> Result<(), RadioError>;

    /// Start a join procedure in the given mode
    fn join(&mut self, mode: ActivationMode, force_rejoin: bool);

    /// Stop the current activity. `Err(Busy)` means the stop is still ongoing.
    fn halt(&mut self) -> Result<(), RadioError>;

    /// Whether a network session is established
    fn is_joined(&self) -> bool;

    /// Queue an uplink
    fn send(&mut self, port: u8, data: &[u8], confirmed: bool) -> Result<(), RadioError>;

    /// Time until the next uplink is legal, in milliseconds
    fn duty_cycle_wait_ms(&self) -> u32;

    /// Request a device class switch
    fn request_class(&mut self, class: DeviceClass) -> Result<(), RadioError>;

    /// Run pending MAC work and return the next event, if any
    fn process(&mut self) -> Option<StackEvent>;

    /// Current persistent context
    fn nvm_context(&mut self) -> Result<NvmSnapshot<'_>, RadioError>;

    /// Hand back a context previously read from flash
    fn restore_nvm_context(&mut self, context: &[u8]) -> Result<(), RadioError>;
}

#[cfg(test)]
pub mod mock {
    //! Mock LoRaWAN stack for testing

    use super::*;
    use heapless::Deque;

    /// Uplink recorded by the mock
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SentFrame {
        pub port: u8,
        pub data: Vec<u8, LORAWAN_APP_DATA_BUFFER_MAX_SIZE>,
        pub confirmed: bool,
    }

    /// Mock stack for unit testing
    pub struct MockLorawanStack {
        sent: Vec<SentFrame, 16>,
        joins: Vec<(ActivationMode, bool), 16>,
        configs: Vec<StackParams, 8>,
        class_requests: Vec<DeviceClass, 4>,
        events: Deque<StackEvent, 8>,
        next_send_error: Option<RadioError>,
        halt_result: Result<(), RadioError>,
        halt_calls: usize,
        joined: bool,
        duty_cycle_wait_ms: u32,
        context: Vec<u8, 64>,
        context_dirty: bool,
        restored: Option<Vec<u8, 64>>,
    }

    impl MockLorawanStack {
        /// Create a new mock stack, not joined
        pub fn new() -> Self {
            Self {
                sent: Vec::new(),
                joins: Vec::new(),
                configs: Vec::new(),
                class_requests: Vec::new(),
                events: Deque::new(),
                next_send_error: None,
                halt_result: Ok(()),
                halt_calls: 0,
                joined: false,
                duty_cycle_wait_ms: 0,
                context: Vec::new(),
                context_dirty: false,
                restored: None,
            }
        }

        /// Queue an event returned by the next process() call
        pub fn push_event(&mut self, event: StackEvent) {
            let _ = self.events.push_back(event);
        }

        /// Set an error to be returned by the next send() call
        pub fn set_next_send_error(&mut self, error: RadioError) {
            self.next_send_error = Some(error);
        }

        /// Set the result every halt() call returns
        pub fn set_halt_result(&mut self, result: Result<(), RadioError>) {
            self.halt_result = result;
        }

        pub fn set_joined(&mut self, joined: bool) {
            self.joined = joined;
        }

        pub fn set_duty_cycle_wait_ms(&mut self, wait_ms: u32) {
            self.duty_cycle_wait_ms = wait_ms;
        }

        /// Give the stack a context that needs storing
        pub fn set_context(&mut self, context: &[u8]) {
            self.context.clear();
            let _ = self.context.extend_from_slice(context);
            self.context_dirty = true;
        }

        pub fn sent(&self) -> &[SentFrame] {
            &self.sent
        }

        pub fn joins(&self) -> &[(ActivationMode, bool)] {
            &self.joins
        }

        pub fn configs(&self) -> &[StackParams] {
            &self.configs
        }

        pub fn class_requests(&self) -> &[DeviceClass] {
            &self.class_requests
        }

        pub fn halt_calls(&self) -> usize {
            self.halt_calls
        }

        pub fn restored(&self) -> Option<&[u8]> {
            self.restored.as_deref()
        }
    }

    impl Default for MockLorawanStack {
        fn default() -> Self {
            Self::new()
        }
    }

    impl LorawanStack for MockLorawanStack {
        fn configure(&mut self, params: &StackParams) -> Result<(), RadioError> {
            let _ = self.configs.push(params.clone());
            Ok(())
        }

        fn join(&mut self, mode: ActivationMode, force_rejoin: bool) {
            let _ = self.joins.push((mode, force_rejoin));
        }

        fn halt(&mut self) -> Result<(), RadioError> {
            self.halt_calls += 1;
            self.halt_result
        }

        fn is_joined(&self) -> bool {
            self.joined
        }

        fn send(&mut self, port: u8, data: &[u8], confirmed: bool) -> Result<(), RadioError> {
            if let Some(error) = self.next_send_error.take() {
                return Err(error);
            }

            let mut frame = Vec::new();
            frame
                .extend_from_slice(data)
                .map_err(|_| RadioError::PayloadTooLong)?;
            let _ = self.sent.push(SentFrame {
                port,
                data: frame,
                confirmed,
            });
            Ok(())
        }

        fn duty_cycle_wait_ms(&self) -> u32 {
            self.duty_cycle_wait_ms
        }

        fn request_class(&mut self, class: DeviceClass) -> Result<(), RadioError> {
            let _ = self.class_requests.push(class);
            Ok(())
        }

        fn process(&mut self) -> Option<StackEvent> {
            self.events.pop_front()
        }

        fn nvm_context(&mut self) -> Result<NvmSnapshot<'_>, RadioError> {
            if !self.context_dirty {
                return Ok(NvmSnapshot::UpToDate);
            }
            self.context_dirty = false;
            Ok(NvmSnapshot::Changed(&self.context))
        }

        fn restore_nvm_context(&mut self, context: &[u8]) -> Result<(), RadioError> {
            let mut restored = Vec::new();
            restored
                .extend_from_slice(context)
                .map_err(|_| RadioError::Failed)?;
            self.restored = Some(restored);
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_mock_send() {
            let mut stack = MockLorawanStack::new();
            stack.send(2, &[0x02, 0x64], false).unwrap();

            assert_eq!(stack.sent().len(), 1);
            assert_eq!(stack.sent()[0].port, 2);
            assert_eq!(stack.sent()[0].data.as_slice(), &[0x02, 0x64]);
        }

        #[test]
        fn test_mock_send_error_is_one_shot() {
            let mut stack = MockLorawanStack::new();
            stack.set_next_send_error(RadioError::DutyCycleRestricted);

            assert_eq!(stack.send(2, &[1], false), Err(RadioError::DutyCycleRestricted));
            assert!(stack.send(2, &[1], false).is_ok());
        }

        #[test]
        fn test_mock_events_fifo() {
            let mut stack = MockLorawanStack::new();
            stack.push_event(StackEvent::SystemResetRequested);
            stack.push_event(StackEvent::TxPeriodicityChanged(0));

            assert_eq!(stack.process(), Some(StackEvent::SystemResetRequested));
            assert_eq!(stack.process(), Some(StackEvent::TxPeriodicityChanged(0)));
            assert_eq!(stack.process(), None);
        }

        #[test]
        fn test_mock_context_snapshot() {
            let mut stack = MockLorawanStack::new();
            assert_eq!(stack.nvm_context(), Ok(NvmSnapshot::UpToDate));

            stack.set_context(&[1, 2, 3]);
            assert_eq!(stack.nvm_context(), Ok(NvmSnapshot::Changed(&[1, 2, 3][..])));
            assert_eq!(stack.nvm_context(), Ok(NvmSnapshot::UpToDate));
        }
    }
}
