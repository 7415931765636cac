//! Channels and the per-message context.

pub mod context;
pub mod types;

pub use context::{Context, Field, Requirement};
pub use types::{ChannelSpec, ChannelType};
