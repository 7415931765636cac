//! Chat Relay - cross-server chat routing core
//!
//! Routes chat from a sender to the right set of connected accounts across
//! the backend servers of a proxy network: channel rules, filter chains,
//! recipient predicates, delivery and chat logging.

pub mod account;
pub mod channel;
pub mod common;
pub mod config;
pub mod dispatch;
pub mod filter;
pub mod module;
pub mod render;
pub mod replay;
pub mod routing;
pub mod sink;

pub use account::{Account, AccountDirectory, AccountRef, InMemoryDirectory, PlayerAccount};
pub use channel::{ChannelType, Context, Requirement};
pub use common::{AccountId, BlockMessage, ContextError, Permission, RelayError, ServerName};
pub use dispatch::{Dispatcher, Outcome, RelaySettings};
pub use filter::{Filters, PostParseFilter, PreParseFilter};
pub use module::{ModuleKind, ModuleRegistry};
pub use render::{MarkupRenderer, RenderedMessage};
pub use routing::AccountPredicate;
pub use sink::{ChatLogger, DeliverySink};
