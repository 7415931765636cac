//! Common utilities and types shared across the relay.

pub mod clock;
pub mod error;
pub mod types;

pub use clock::{Clock, SystemClock};
pub use error::{
    BlockMessage, ConfigError, ContextError, ContextResult, FilterResult, RelayError,
    ReplayError, StorageError, StorageResult,
};
pub use types::{AccountId, Permission, ServerName};
