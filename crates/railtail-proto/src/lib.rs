//! # railtail-proto
//!
//! Wire definitions for talking to the log provider:
//!
//! - [`ClientMessage`] / [`ServerFrame`]: `graphql-transport-ws` control frames
//! - [`SubscribePayload`] / [`SubscribeVariables`]: the log subscription request
//! - [`GraphQlRequest`] / [`GraphQlResponse`]: request/response envelopes
//! - [`queries`]: the GraphQL documents sent to the provider
//! - [`types`]: result shapes of the metadata queries

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod graphql;
pub mod messages;
pub mod queries;
pub mod types;

pub use error::ProtoError;
pub use graphql::{GraphQlError, GraphQlRequest, GraphQlResponse};
pub use messages::{
    ClientMessage, FrameKind, ServerFrame, SubscribePayload, SubscribeVariables, CONNECTION_ACK,
    GRAPHQL_TRANSPORT_WS,
};
pub use types::{EnvironmentData, NamedNode, NodeConnection, ProjectData};
