// SenseHub - Local HTTP API
//
// Route table and request handling, independent of the server implementation.

use crate::config::*;
use crate::error::NetError;
use crate::net::{AccelPayload, LatestPayload, ThPayload};
use crate::state::AppContext;

pub const ROUTE_HELLO: &str = "/hello";
pub const ROUTE_TH_SENSOR: &str = "/th_sensor";
pub const ROUTE_ACCELEROMETER: &str = "/accelerometer";
pub const ROUTE_FAVICON: &str = "/favicon.ico";

pub const GREETING: &str = "Hello ESP32";
pub const POST_REPLY: &str = "OK";
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// GET /th_sensor: latest temperature and humidity as JSON.
pub fn latest_json<T>(ctx: &AppContext<T>) -> Result<String, NetError> {
    let latest = LatestPayload::from(ctx.th.load());
    serde_json::to_string(&latest).map_err(|e| NetError::Encode(e.to_string()))
}

/// GET /accelerometer: latest axes and the tap seen on the last cycle.
pub fn accel_json<T>(ctx: &AppContext<T>) -> Result<String, NetError> {
    let latest = AccelPayload::new(ctx.accel.load(), ctx.last_click.load());
    serde_json::to_string(&latest).map_err(|e| NetError::Encode(e.to_string()))
}

/// POST /th_sensor: log what a peer pushed to us.
///
/// The reply is always `OK`; a body that is not a valid payload is only
/// logged. At most [`HTTP_POST_BUFFER_SIZE`] bytes are looked at.
pub fn accept_post(body: &[u8]) -> Option<ThPayload> {
    let body = &body[..body.len().min(HTTP_POST_BUFFER_SIZE)];
    log::info!("Received: {}", String::from_utf8_lossy(body));

    match serde_json::from_slice::<ThPayload>(body) {
        Ok(payload) => Some(payload),
        Err(e) => {
            log::warn!("Ignoring malformed th_sensor body: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{AccelReading, ClickEvent, ThReading};

    #[test]
    fn latest_json_reflects_shared_state() {
        let ctx: AppContext<()> = AppContext::new();
        assert_eq!(latest_json(&ctx).unwrap(), r#"{"temperature":0.0,"humidity":0.0}"#);

        ctx.th.store(ThReading { temperature_c: 22.04, humidity_pct: 51.96 });
        assert_eq!(latest_json(&ctx).unwrap(), r#"{"temperature":22.0,"humidity":52.0}"#);
    }

    #[test]
    fn accel_json_reports_axes_and_last_click() {
        let ctx: AppContext<()> = AppContext::new();
        assert_eq!(
            accel_json(&ctx).unwrap(),
            r#"{"x":0.0,"y":0.0,"z":0.0,"click":"none"}"#
        );

        ctx.accel.store(AccelReading { x_g: 0.01, y_g: -0.26, z_g: 0.98 });
        ctx.last_click.store(ClickEvent::Double);
        assert_eq!(
            accel_json(&ctx).unwrap(),
            r#"{"x":0.0,"y":-0.3,"z":1.0,"click":"double"}"#
        );
    }

    #[test]
    fn post_accepts_upload_format() {
        let parsed = accept_post(br#"{"temperature":20.1,"humidity":33.3,"timestamp":1}"#);
        assert_eq!(parsed.map(|p| p.timestamp), Some(1));
    }

    #[test]
    fn post_tolerates_garbage() {
        assert_eq!(accept_post(b"not json"), None);
        assert_eq!(accept_post(&[0xFF; 400]), None);
    }
}
