//! Subscription connection and its supervisor.
//!
//! This module provides:
//! - [`SubscriptionConnection`] for one physical connection and its handshake
//! - [`StreamSupervisor`] for reconnecting, filtering and emitting records
//! - [`ReconnectConfig`] for backoff between failed connection attempts

mod connection;
mod reconnect;
mod state;
mod supervisor;

pub use connection::{SubscriptionConfig, SubscriptionConnection};
pub use reconnect::ReconnectConfig;
pub use state::{AtomicSupervisorState, SupervisorState};
pub use supervisor::StreamSupervisor;
