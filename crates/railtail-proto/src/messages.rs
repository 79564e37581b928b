//! `graphql-transport-ws` control frames.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ProtoError;

/// Websocket subprotocol negotiated with the provider.
pub const GRAPHQL_TRANSPORT_WS: &str = "graphql-transport-ws";

/// The only reply accepted after `connection_init`, compared byte for byte.
pub const CONNECTION_ACK: &[u8] = br#"{"type":"connection_ack"}"#;

/// Frames sent from this client to the provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Opens the protocol session.
    ConnectionInit,
    /// Starts a subscription operation.
    Subscribe {
        /// Operation id, unique per subscription attempt.
        id: String,
        /// Query and variables.
        payload: SubscribePayload,
    },
    /// Reply to a server `ping`.
    Pong,
}

impl ClientMessage {
    /// Build a subscribe frame.
    #[must_use]
    pub fn subscribe(
        id: impl Into<String>,
        query: impl Into<String>,
        variables: SubscribeVariables,
    ) -> Self {
        Self::Subscribe {
            id: id.into(),
            payload: SubscribePayload {
                query: query.into(),
                variables,
            },
        }
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, ProtoError> {
        serde_json::to_string(self).map_err(|e| ProtoError::Encoding(e.to_string()))
    }

    /// Deserialize from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> Result<Self, ProtoError> {
        serde_json::from_str(json).map_err(|e| ProtoError::Decoding(e.to_string()))
    }
}

/// Payload of a subscribe frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubscribePayload {
    /// GraphQL subscription document.
    pub query: String,
    /// Operation variables.
    pub variables: SubscribeVariables,
}

/// Variables of the environment log subscription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeVariables {
    /// Environment whose logs are streamed.
    pub environment_id: String,
    /// Provider filter expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Number of historical records requested before `before_date`.
    pub before_limit: i64,
    /// RFC 3339 anchor for the historical backlog.
    pub before_date: String,
}

/// Kind of a frame received from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// `connection_ack`
    ConnectionAck,
    /// `next`, carries subscription data.
    Next,
    /// `error`, the operation failed.
    Error,
    /// `complete`, the server finished the operation.
    Complete,
    /// `ping`
    Ping,
    /// `pong`
    Pong,
    /// Anything else.
    Unknown,
}

impl FrameKind {
    /// Classify a `type` discriminator.
    #[must_use]
    pub fn from_type(frame_type: &str) -> Self {
        match frame_type {
            "connection_ack" => Self::ConnectionAck,
            "next" => Self::Next,
            "error" => Self::Error,
            "complete" => Self::Complete,
            "ping" => Self::Ping,
            "pong" => Self::Pong,
            _ => Self::Unknown,
        }
    }
}

/// A frame received from the provider.
///
/// The `type` discriminator is kept as text so unexpected kinds still decode
/// and can be reported.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ServerFrame {
    /// Raw `type` discriminator.
    #[serde(rename = "type")]
    pub frame_type: String,
    /// Operation id, absent on connection-level frames.
    #[serde(default)]
    pub id: Option<String>,
    /// Frame payload, if any.
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
}

impl ServerFrame {
    /// Deserialize from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a frame object.
    pub fn from_json(json: &str) -> Result<Self, ProtoError> {
        serde_json::from_str(json).map_err(|e| ProtoError::Decoding(e.to_string()))
    }

    /// Classified frame kind.
    #[must_use]
    pub fn kind(&self) -> FrameKind {
        FrameKind::from_type(&self.frame_type)
    }

    /// Decode the payload into `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is missing or has the wrong shape.
    pub fn into_payload<T: DeserializeOwned>(self) -> Result<T, ProtoError> {
        let payload = self.payload.ok_or(ProtoError::MissingField("payload"))?;
        serde_json::from_value(payload).map_err(|e| ProtoError::Decoding(e.to_string()))
    }
}
