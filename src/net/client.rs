// SenseHub - HTTP Uploader (ESP-IDF)
//
// One connection per upload, torn down afterwards.

use std::fmt::Debug;

use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
use esp_idf_svc::http::Method;
use esp_idf_svc::io::Write;

use crate::config::*;
use crate::error::NetError;
use crate::net::{NetworkSink, ThPayload};

pub struct HttpUploader {
    url: String,
}

impl HttpUploader {
    pub fn new(url: String) -> Self {
        Self { url }
    }
}

fn transport<E: Debug>(error: E) -> NetError {
    NetError::Transport(format!("{:?}", error))
}

impl NetworkSink for HttpUploader {
    fn post_json(&mut self, payload: &ThPayload) -> Result<u16, NetError> {
        let body = payload.to_json()?;
        log::info!("HTTP request with url => {}", self.url);

        let mut conn = EspHttpConnection::new(&Configuration {
            timeout: Some(HTTP_CLIENT_TIMEOUT),
            ..Default::default()
        })
        .map_err(transport)?;

        let content_length = body.len().to_string();
        let headers = [
            ("Content-Type", "application/json"),
            ("Content-Length", content_length.as_str()),
        ];
        conn.initiate_request(Method::Post, &self.url, &headers)
            .map_err(transport)?;
        conn.write_all(body.as_bytes()).map_err(transport)?;
        conn.initiate_response().map_err(transport)?;

        Ok(conn.status())
    }
}
