//! One physical subscription connection.
//!
//! Establishment is strictly ordered: dial, `connection_init`, exactly one
//! acknowledgement frame, `subscribe`. Any step failing aborts with
//! [`StreamError::Handshake`]. Reads and close are guarded so a panic in the
//! transport surfaces as [`StreamError::Connection`].

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use futures::{FutureExt, SinkExt, StreamExt};
use railtail_proto::queries::STREAM_ENVIRONMENT_LOGS;
use railtail_proto::{
    ClientMessage, ServerFrame, SubscribeVariables, CONNECTION_ACK, GRAPHQL_TRANSPORT_WS,
};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{
    HeaderValue, AUTHORIZATION, CONTENT_TYPE, SEC_WEBSOCKET_PROTOCOL,
};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async_with_config, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StreamError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// What to request on (re)subscribe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionConfig {
    /// Environment whose logs are streamed.
    pub environment_id: String,
    /// Provider filter expression.
    pub filter: Option<String>,
    /// Backlog anchor: history is requested from before this instant.
    pub since: DateTime<Utc>,
    /// Number of historical records requested.
    pub backlog_limit: i64,
}

impl SubscriptionConfig {
    /// Wire variables of the subscribe frame.
    #[must_use]
    pub fn variables(&self) -> SubscribeVariables {
        SubscribeVariables {
            environment_id: self.environment_id.clone(),
            filter: self.filter.clone(),
            before_limit: self.backlog_limit,
            before_date: self.since.to_rfc3339_opts(SecondsFormat::Nanos, true),
        }
    }
}

/// An established, subscribed connection.
pub struct SubscriptionConnection {
    stream: WsStream,
    operation_id: String,
}

impl std::fmt::Debug for SubscriptionConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionConnection")
            .field("operation_id", &self.operation_id)
            .finish_non_exhaustive()
    }
}

impl SubscriptionConnection {
    /// Dial `url`, run the handshake and subscribe.
    ///
    /// `connect_timeout` bounds the dial and, separately, the wait for the
    /// acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Handshake`] if any establishment step fails.
    pub async fn open(
        url: &str,
        token: &str,
        subscription: &SubscriptionConfig,
        connect_timeout: Duration,
    ) -> Result<Self, StreamError> {
        let mut request = url
            .into_client_request()
            .map_err(|e| StreamError::Handshake(format!("invalid subscription url: {e}")))?;

        let authorization = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| StreamError::Handshake(format!("invalid api key header: {e}")))?;
        let headers = request.headers_mut();
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            SEC_WEBSOCKET_PROTOCOL,
            HeaderValue::from_static(GRAPHQL_TRANSPORT_WS),
        );

        let mut config = WebSocketConfig::default();
        config.max_message_size = None;
        config.max_frame_size = None;

        let (mut stream, _response) =
            timeout(connect_timeout, connect_async_with_config(request, Some(config), false))
                .await
                .map_err(|_| StreamError::Handshake("connection timed out".to_string()))?
                .map_err(|e| StreamError::Handshake(format!("connection failed: {e}")))?;

        send_message(&mut stream, &ClientMessage::ConnectionInit)
            .await
            .map_err(|e| StreamError::Handshake(format!("failed to send connection_init: {e}")))?;

        let reply = timeout(connect_timeout, stream.next())
            .await
            .map_err(|_| StreamError::Handshake("timed out waiting for connection_ack".to_string()))?;

        match reply {
            Some(Ok(Message::Text(text))) if text.as_bytes() == CONNECTION_ACK => {}
            Some(Ok(Message::Binary(data))) if &data[..] == CONNECTION_ACK => {}
            Some(Ok(other)) => {
                return Err(StreamError::Handshake(format!(
                    "expected connection_ack, got: {other}"
                )));
            }
            Some(Err(e)) => {
                return Err(StreamError::Handshake(format!(
                    "failed to read connection_ack: {e}"
                )));
            }
            None => {
                return Err(StreamError::Handshake(
                    "connection closed before connection_ack".to_string(),
                ));
            }
        }

        let operation_id = Uuid::new_v4().to_string();
        let subscribe = ClientMessage::subscribe(
            operation_id.clone(),
            STREAM_ENVIRONMENT_LOGS,
            subscription.variables(),
        );
        send_message(&mut stream, &subscribe)
            .await
            .map_err(|e| StreamError::Handshake(format!("failed to send subscribe: {e}")))?;

        info!(%operation_id, environment_id = %subscription.environment_id, "subscribed");

        Ok(Self {
            stream,
            operation_id,
        })
    }

    /// Id of the subscribe operation on this connection.
    #[must_use]
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// Wait for the next protocol frame.
    ///
    /// Websocket-level ping/pong is handled by the transport and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Connection`] if the connection fails or closes
    /// and [`StreamError::Protocol`] if a frame cannot be decoded.
    pub async fn next_frame(&mut self) -> Result<ServerFrame, StreamError> {
        let stream = &mut self.stream;
        guard_transport(async move {
            loop {
                let message = match stream.next().await {
                    Some(Ok(message)) => message,
                    Some(Err(e)) => return Err(StreamError::Connection(e.to_string())),
                    None => {
                        return Err(StreamError::Connection("connection closed".to_string()))
                    }
                };

                match message {
                    Message::Text(text) => return Ok(ServerFrame::from_json(text.as_str())?),
                    Message::Binary(data) => {
                        let text = std::str::from_utf8(&data).map_err(|e| {
                            StreamError::Connection(format!("binary frame is not utf-8: {e}"))
                        })?;
                        return Ok(ServerFrame::from_json(text)?);
                    }
                    Message::Close(frame) => {
                        return Err(StreamError::Connection(format!(
                            "closed by server: {frame:?}"
                        )));
                    }
                    Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
                }
            }
        })
        .await
    }

    /// Send a protocol message.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Connection`] if the write fails.
    pub async fn send(&mut self, message: &ClientMessage) -> Result<(), StreamError> {
        let stream = &mut self.stream;
        guard_transport(send_message(stream, message)).await
    }

    /// Close the connection.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Connection`] if the close handshake fails.
    pub async fn close(mut self) -> Result<(), StreamError> {
        debug!(operation_id = %self.operation_id, "closing subscription connection");
        let stream = &mut self.stream;
        guard_transport(async move {
            stream
                .close(None)
                .await
                .map_err(|e| StreamError::Connection(e.to_string()))
        })
        .await
    }
}

async fn send_message(stream: &mut WsStream, message: &ClientMessage) -> Result<(), StreamError> {
    let json = message.to_json()?;
    stream
        .send(Message::Text(json.into()))
        .await
        .map_err(|e| StreamError::Connection(e.to_string()))
}

/// Run a transport operation, turning a panic into [`StreamError::Connection`].
pub(crate) async fn guard_transport<F, T>(operation: F) -> Result<T, StreamError>
where
    F: Future<Output = Result<T, StreamError>>,
{
    match AssertUnwindSafe(operation).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => Err(StreamError::Connection(format!(
            "transport panicked: {}",
            panic_message(panic.as_ref())
        ))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
