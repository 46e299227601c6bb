//! Host side of the to-do core: configuration, HTTP transport, and a
//! session type that drives `todo_core::TodoStore` operations to completion.
//!
//! # Design
//! - The core builds requests and applies responses; this crate only moves
//!   bytes. `Transport` is the seam between the two.
//! - `TodoApp` runs one operation at a time on the calling thread. Hosts
//!   that need overlapping requests use `TodoStore`'s `begin_*` / `finish_*`
//!   pairs directly.

pub mod app;
pub mod config;
pub mod logging;
pub mod transport;

pub use app::TodoApp;
pub use config::{ConfigError, HostConfig};
pub use logging::init_tracing;
pub use transport::{Transport, TransportError, UreqTransport};
