//! Mock log provider shared by the integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use railtail::StreamConfig;
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::{HeaderValue, StatusCode};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_hdr_async, WebSocketStream};

pub const TEST_TOKEN: &str = "test-token";
pub const STEP: Duration = Duration::from_secs(5);

/// A mock subscription endpoint bound to an available port.
pub struct MockProvider {
    listener: TcpListener,
    addr: SocketAddr,
}

impl MockProvider {
    pub async fn new() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind mock provider");
        let addr = listener.local_addr().expect("no local addr");
        Self { listener, addr }
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Accept a raw TCP connection without upgrading it.
    pub async fn accept_tcp(&self) -> TcpStream {
        let (stream, _) = timeout(STEP, self.listener.accept())
            .await
            .expect("timed out waiting for connection")
            .expect("accept failed");
        stream
    }

    /// Accept one websocket connection, negotiating the subprotocol.
    pub async fn accept(&self) -> ProviderConn {
        let stream = self.accept_tcp().await;
        let ws = accept_hdr_async(stream, negotiate)
            .await
            .expect("websocket upgrade failed");
        ProviderConn { ws }
    }

    /// Accept a connection and complete the handshake. Returns the connection
    /// and the subscribe frame.
    pub async fn accept_subscribed(&self) -> (ProviderConn, Value) {
        let mut conn = self.accept().await;
        let subscribe = conn.handshake().await;
        (conn, subscribe)
    }
}

/// Require the test bearer token and select `graphql-transport-ws`.
pub fn negotiate(request: &Request, mut response: Response) -> Result<Response, ErrorResponse> {
    let expected = format!("Bearer {TEST_TOKEN}");
    let authorized = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        == Some(expected.as_str());

    if !authorized {
        let mut rejection = ErrorResponse::new(Some("unauthorized".to_string()));
        *rejection.status_mut() = StatusCode::UNAUTHORIZED;
        return Err(rejection);
    }

    response.headers_mut().insert(
        "sec-websocket-protocol",
        HeaderValue::from_static("graphql-transport-ws"),
    );
    Ok(response)
}

/// Server side of one accepted connection.
pub struct ProviderConn {
    ws: WebSocketStream<TcpStream>,
}

impl ProviderConn {
    /// Next text frame as JSON, or `None` once the client went away.
    pub async fn recv(&mut self) -> Option<Value> {
        loop {
            match timeout(STEP, self.ws.next()).await.ok()?? {
                Ok(Message::Text(text)) => {
                    return Some(serde_json::from_str(text.as_str()).expect("client sent invalid json"))
                }
                Ok(Message::Close(_)) | Err(_) => return None,
                Ok(_) => {}
            }
        }
    }

    pub async fn send_raw(&mut self, text: &str) {
        self.ws
            .send(Message::Text(text.to_string().into()))
            .await
            .expect("failed to send frame");
    }

    /// Expect `connection_init`, acknowledge it and return the subscribe frame.
    pub async fn handshake(&mut self) -> Value {
        let init = self.recv().await.expect("no connection_init");
        assert_eq!(init["type"], "connection_init");

        self.send_raw(r#"{"type":"connection_ack"}"#).await;

        let subscribe = self.recv().await.expect("no subscribe");
        assert_eq!(subscribe["type"], "subscribe");
        subscribe
    }

    /// Send a `next` frame carrying `records`.
    pub async fn send_records(&mut self, id: &str, records: Vec<Value>) {
        let frame = json!({
            "id": id,
            "type": "next",
            "payload": { "data": { "environmentLogs": records } },
        });
        self.send_raw(&frame.to_string()).await;
    }
}

/// Operation id of a subscribe frame.
pub fn operation_id(subscribe: &Value) -> String {
    subscribe["id"].as_str().expect("subscribe without id").to_string()
}

/// A wire record at `2026-01-01T00:00:<secs>Z`.
pub fn record(secs: u32, message: &str) -> Value {
    json!({
        "timestamp": format!("2026-01-01T00:00:{secs:02}Z"),
        "message": message,
        "severity": "info",
        "tags": {
            "projectId": "proj-1",
            "environmentId": "env-1",
            "serviceId": "svc-1",
        },
        "attributes": [],
    })
}

/// Configuration pointed at `provider`, with fast backoff.
pub fn config_for(provider: &MockProvider) -> StreamConfig {
    let mut config = StreamConfig::new(TEST_TOKEN, "env-1");
    config.subscription_url = provider.url();
    config.api_url = "http://127.0.0.1:1/graphql".to_string();
    config.connect_timeout_secs = 2;
    config.reconnect_initial_delay_ms = 10;
    config.reconnect_max_delay_secs = 1;
    config
}
