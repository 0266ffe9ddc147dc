//! OpAMP-style control-channel client embedded in a monitored process.
//!
//! The client reports identity and health to a control server over a binary
//! HTTP protocol and tracks the remote configuration the server pushes back:
//!
//! - **Handshake**: first exchange with bounded retries, yields the remote
//!   resource attributes the telemetry pipeline needs
//! - **Heartbeat**: periodic keep-alive on a background worker, echoing the
//!   last acknowledged remote config hash
//! - **Shutdown**: interrupts the worker and sends a final disconnect
//!
//! The host constructs an [`OpampClient`], calls [`OpampClient::start`],
//! waits on [`OpampClient::wait_for_handshake`] to learn whether resource
//! attributes are available, and calls [`OpampClient::shutdown`] when the
//! process exits.

pub mod client;
pub mod config;
pub mod messages;
pub mod remote_config;
pub mod session;
pub mod suppress;
pub mod transport;

mod handshake;
mod heartbeat;

pub use client::{OpampClient, RemoteConfigCallback, RuntimeSupport};
pub use config::{ConfigError, OpampConfig};
pub use suppress::{InstrumentationSuppression, NoopSuppression};
