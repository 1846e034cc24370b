//! Metric relay (TCP line bridge).
//!
//! Lets the collector's carbon exporter push line protocol into a check
//! process: every accepted connection streams newline-terminated lines, each
//! line is written to the process output sink and echoed back to the sender.
//!
//! Lifecycle:
//! - `RelayServer::bind` claims the socket (bind failure is fatal).
//! - `RelayServer::serve` accepts until the lifetime deadline or the shutdown
//!   future, then drops the listener.
//! - Handlers are spawned per connection and are not cancelled by the
//!   deadline; `RelayHandle::drain` waits for them. After an explicit stop,
//!   or once the `drain_until` future resolves, open handlers are aborted.

mod connection;
pub mod server;
pub mod sink;

pub use server::{RelayConfig, RelayHandle, RelayServer, RelayStats, StopCause};
pub use sink::OutputSink;
