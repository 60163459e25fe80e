use log::*;
use serde_json::Value;
use std::net::TcpStream;
use std::time::Duration;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tungstenite::client::IntoClientRequest;
use tungstenite::http::header::{HeaderValue, SEC_WEBSOCKET_PROTOCOL, USER_AGENT};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use control::{Cost, CostSample};

mod message;

use message::{live_measurement_query, ClientMessage, ConnectionInit, NextPayload, ServerMessage, Subscribe};

const PROTOCOL: &str = "graphql-transport-ws";
const SUBSCRIPTION_ID: &str = "1";
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);
const CLOSE_READ_LIMIT: usize = 8;

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error(transparent)]
    Socket(#[from] tungstenite::Error),

    #[error("invalid telemetry message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("subscription rejected: {0}")]
    Rejected(String),

    #[error("invalid sample timestamp {value:?}: {cause}")]
    Timestamp {
        value: String,
        cause: time::error::Parse,
    },

    #[error("measurement at {0} carries no accumulated cost")]
    MissingCost(String),
}

/// Live measurement subscription of a single home.
///
/// Yields one sample per measurement pushed by the server. The iterator ends
/// for good once the server completes the subscription, closes the socket or
/// reports an error.
pub struct LiveMeasurements {
    socket: Socket,
    finished: bool,
}

impl LiveMeasurements {
    pub fn subscribe(
        url: &str,
        token: &str,
        home_id: &str,
        read_timeout: Duration,
    ) -> Result<LiveMeasurements, TelemetryError> {
        let mut request = url.into_client_request()?;
        let headers = request.headers_mut();
        headers.insert(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_static(PROTOCOL));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("burnrate-alarm/", env!("CARGO_PKG_VERSION"))),
        );

        let (mut socket, _) = tungstenite::connect(request)?;
        set_read_timeout(&socket, read_timeout).map_err(tungstenite::Error::from)?;
        info!("Connected to {}", url);

        send(
            &mut socket,
            &ClientMessage::ConnectionInit {
                payload: ConnectionInit { token },
            },
        )?;

        loop {
            match read_message(&mut socket)? {
                Some(ServerMessage::ConnectionAck { .. }) => break,
                Some(ServerMessage::Ping { .. }) => send(&mut socket, &ClientMessage::Pong {})?,
                Some(other) => return Err(TelemetryError::Handshake(format!("{:?}", other))),
                None => return Err(TelemetryError::Handshake("connection closed".to_string())),
            }
        }

        send(
            &mut socket,
            &ClientMessage::Subscribe {
                id: SUBSCRIPTION_ID,
                payload: Subscribe {
                    query: live_measurement_query(home_id),
                },
            },
        )?;
        info!("Subscribed to live measurements of home {}", home_id);

        Ok(LiveMeasurements {
            socket,
            finished: false,
        })
    }

    /// Stop the subscription and close the socket. Failures are only logged.
    pub fn close(mut self) {
        let complete = ClientMessage::Complete {
            id: SUBSCRIPTION_ID,
        };
        if let Err(e) = send(&mut self.socket, &complete) {
            debug!("Unable to complete subscription: {}", e);
        }
        if let Err(e) = self.socket.close(None) {
            debug!("Unable to close socket: {}", e);
            return;
        }

        // Drive the close handshake, without waiting long for the server's reply
        if let Err(e) = set_read_timeout(&self.socket, CLOSE_TIMEOUT) {
            debug!("Unable to shorten read timeout: {}", e);
        }
        for _ in 0..CLOSE_READ_LIMIT {
            if self.socket.read().is_err() {
                break;
            }
        }
    }

    fn next_sample(&mut self) -> Option<Result<CostSample, TelemetryError>> {
        loop {
            let message = match read_message(&mut self.socket) {
                Ok(Some(message)) => message,
                Ok(None) => return None,
                Err(e) => return Some(Err(e)),
            };

            match message {
                ServerMessage::Next { id, payload } if id == SUBSCRIPTION_ID => {
                    return Some(sample_from(payload));
                }
                ServerMessage::Error { payload, .. } => {
                    return Some(Err(TelemetryError::Rejected(payload.to_string())));
                }
                ServerMessage::Complete { .. } => {
                    info!("Server completed the subscription");
                    return None;
                }
                ServerMessage::Ping { .. } => {
                    if let Err(e) = send(&mut self.socket, &ClientMessage::Pong {}) {
                        return Some(Err(e));
                    }
                }
                other => debug!("Ignoring {:?}", other),
            }
        }
    }
}

impl Iterator for LiveMeasurements {
    type Item = Result<CostSample, TelemetryError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let item = self.next_sample();
        if !matches!(item, Some(Ok(_))) {
            self.finished = true;
        }
        item
    }
}

fn set_read_timeout(socket: &Socket, timeout: Duration) -> std::io::Result<()> {
    match socket.get_ref() {
        MaybeTlsStream::Plain(stream) => stream.set_read_timeout(Some(timeout)),
        MaybeTlsStream::Rustls(stream) => stream.get_ref().set_read_timeout(Some(timeout)),
        _ => Ok(()),
    }
}

fn send(socket: &mut Socket, message: &ClientMessage) -> Result<(), TelemetryError> {
    let text = serde_json::to_string(message)?;
    socket.send(Message::Text(text))?;
    Ok(())
}

fn read_message(socket: &mut Socket) -> Result<Option<ServerMessage>, TelemetryError> {
    loop {
        match socket.read() {
            Ok(Message::Text(text)) => return Ok(Some(serde_json::from_str(&text)?)),
            Ok(Message::Close(frame)) => {
                info!("Telemetry socket closed by server: {:?}", frame);
                return Ok(None);
            }
            // Websocket pings are answered by tungstenite itself
            Ok(_) => continue,
            Err(tungstenite::Error::ConnectionClosed) | Err(tungstenite::Error::AlreadyClosed) => {
                return Ok(None)
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn sample_from(payload: NextPayload) -> Result<CostSample, TelemetryError> {
    if let Some(errors) = payload.errors.filter(|errors| !errors.is_empty()) {
        return Err(TelemetryError::Rejected(Value::Array(errors).to_string()));
    }

    let measurement = payload
        .data
        .ok_or_else(|| TelemetryError::Rejected("measurement without data".to_string()))?
        .live_measurement;

    let timestamp = OffsetDateTime::parse(&measurement.timestamp, &Rfc3339).map_err(|cause| {
        TelemetryError::Timestamp {
            value: measurement.timestamp.clone(),
            cause,
        }
    })?;
    let cost = measurement
        .accumulated_cost
        .ok_or_else(|| TelemetryError::MissingCost(measurement.timestamp.clone()))?;

    info!(
        "Received data point {} (accumulated cost {}, power {:?} W)",
        measurement.timestamp, cost, measurement.power
    );

    Ok(CostSample::new(timestamp, Cost::new(cost)))
}
