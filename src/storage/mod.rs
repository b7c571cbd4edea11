pub mod context;
pub mod traits;

pub use context::{ContextError, ContextStore};
pub use traits::{NvmStorage, Region, StorageError};
