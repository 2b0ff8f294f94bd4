// SenseHub - Network Payloads & Sinks
//
// JSON bodies shared by the uploader and the local HTTP server. The ESP-IDF
// bindings (Wi-Fi, server, client) only exist on the device target.

pub mod api;
pub mod link;

#[cfg(target_os = "espidf")]
pub mod client;
#[cfg(target_os = "espidf")]
pub mod server;
#[cfg(target_os = "espidf")]
pub mod wifi;

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize, Serializer};

use crate::error::NetError;
use crate::events::{AccelReading, ClickEvent, ThReading};

/// Round to one decimal place for the wire format.
pub fn one_decimal(value: f32) -> f64 {
    (value as f64 * 10.0).round() / 10.0
}

fn serialize_one_decimal<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(one_decimal(*value))
}

/// Body of an upload: `{"temperature":..,"humidity":..,"timestamp":..}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThPayload {
    #[serde(serialize_with = "serialize_one_decimal")]
    pub temperature: f32,
    #[serde(serialize_with = "serialize_one_decimal")]
    pub humidity: f32,
    pub timestamp: u64,
}

impl ThPayload {
    pub fn new(reading: ThReading, timestamp: u64) -> Self {
        Self {
            temperature: reading.temperature_c,
            humidity: reading.humidity_pct,
            timestamp,
        }
    }

    pub fn to_json(&self) -> Result<String, NetError> {
        serde_json::to_string(self).map_err(|e| NetError::Encode(e.to_string()))
    }
}

/// Body of a pull request for the latest values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatestPayload {
    #[serde(serialize_with = "serialize_one_decimal")]
    pub temperature: f32,
    #[serde(serialize_with = "serialize_one_decimal")]
    pub humidity: f32,
}

impl From<ThReading> for LatestPayload {
    fn from(reading: ThReading) -> Self {
        Self {
            temperature: reading.temperature_c,
            humidity: reading.humidity_pct,
        }
    }
}

/// Latest accelerometer axes (in g) and the last decoded tap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccelPayload {
    #[serde(serialize_with = "serialize_one_decimal")]
    pub x: f32,
    #[serde(serialize_with = "serialize_one_decimal")]
    pub y: f32,
    #[serde(serialize_with = "serialize_one_decimal")]
    pub z: f32,
    pub click: &'static str,
}

impl AccelPayload {
    pub fn new(reading: AccelReading, click: ClickEvent) -> Self {
        Self {
            x: reading.x_g,
            y: reading.y_g,
            z: reading.z_g,
            click: match click {
                ClickEvent::None => "none",
                ClickEvent::Single => "single",
                ClickEvent::Double => "double",
            },
        }
    }
}

/// Seconds since the Unix epoch, or 0 if the clock was never set.
pub fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Push-side destination for TH readings. Returns the HTTP status code.
pub trait NetworkSink {
    fn post_json(&mut self, payload: &ThPayload) -> Result<u16, NetError>;
}

/// The collection server answers 200 or 201 when it stored the sample.
pub fn is_accepted(status: u16) -> bool {
    matches!(status, 200 | 201)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_has_one_decimal_and_epoch_seconds() {
        let payload = ThPayload::new(
            ThReading { temperature_c: 23.4567, humidity_pct: 45.04 },
            1_700_000_000,
        );
        assert_eq!(
            payload.to_json().unwrap(),
            r#"{"temperature":23.5,"humidity":45.0,"timestamp":1700000000}"#
        );
    }

    #[test]
    fn negative_temperatures_round_symmetrically() {
        assert_eq!(one_decimal(-10.04), -10.0);
        assert_eq!(one_decimal(-9.96), -10.0);
    }

    #[test]
    fn latest_payload_omits_timestamp() {
        let latest = LatestPayload::from(ThReading { temperature_c: 21.0, humidity_pct: 40.25 });
        assert_eq!(
            serde_json::to_string(&latest).unwrap(),
            r#"{"temperature":21.0,"humidity":40.3}"#
        );
    }

    #[test]
    fn payload_parses_from_posted_body() {
        let body = r#"{"temperature": 19.5, "humidity": 55.1, "timestamp": 42}"#;
        let payload: ThPayload = serde_json::from_str(body).unwrap();
        assert_eq!(payload.timestamp, 42);
        assert_eq!(payload.temperature, 19.5);
    }

    #[test]
    fn accepted_statuses() {
        assert!(is_accepted(200));
        assert!(is_accepted(201));
        assert!(!is_accepted(204));
        assert!(!is_accepted(500));
    }
}
