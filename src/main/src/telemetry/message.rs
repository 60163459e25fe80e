use serde::{Deserialize, Serialize};
use serde_json::Value;

// graphql-transport-ws messages sent by us
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage<'a> {
    ConnectionInit { payload: ConnectionInit<'a> },
    Subscribe { id: &'a str, payload: Subscribe },
    Complete { id: &'a str },
    Pong {},
}

#[derive(Debug, Serialize)]
pub struct ConnectionInit<'a> {
    pub token: &'a str,
}

#[derive(Debug, Serialize)]
pub struct Subscribe {
    pub query: String,
}

// graphql-transport-ws messages sent by the server
#[allow(dead_code)]
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    ConnectionAck {
        #[serde(default)]
        payload: Option<Value>,
    },
    Next {
        id: String,
        payload: NextPayload,
    },
    Error {
        id: String,
        payload: Value,
    },
    Complete {
        id: String,
    },
    Ping {
        #[serde(default)]
        payload: Option<Value>,
    },
    Pong {
        #[serde(default)]
        payload: Option<Value>,
    },
}

#[derive(Debug, Deserialize)]
pub struct NextPayload {
    #[serde(default)]
    pub data: Option<LiveMeasurementData>,
    #[serde(default)]
    pub errors: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveMeasurementData {
    pub live_measurement: LiveMeasurement,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveMeasurement {
    pub timestamp: String,
    pub accumulated_cost: Option<f64>,
    pub power: Option<f64>,
}

pub fn live_measurement_query(home_id: &str) -> String {
    format!(
        "subscription {{ liveMeasurement(homeId:\"{}\") {{ timestamp accumulatedCost power }} }}",
        home_id
    )
}
