pub mod traits;

pub use traits::{
    ActivationMode, DeviceClass, LorawanStack, NvmSnapshot, NvmState, RadioError, StackEvent,
    StackParams,
};
