// SenseHub - HTTP Server (ESP-IDF)

use std::sync::Arc;

use esp_idf_svc::http::server::{Configuration, EspHttpServer};
use esp_idf_svc::http::Method;
use esp_idf_svc::io::{Read, Write};

use crate::config::*;
use crate::net::api::*;
use crate::state::AppContext;

/// Start the server and register all routes. The server stops when the
/// returned handle is dropped.
pub fn start<T: Send + 'static>(ctx: Arc<AppContext<T>>) -> anyhow::Result<EspHttpServer<'static>> {
    let config = Configuration {
        http_port: HTTP_SERVER_PORT,
        lru_purge_enable: true,
        ..Default::default()
    };

    log::info!("Starting server on port: '{}'", config.http_port);
    let mut server = EspHttpServer::new(&config)?;

    log::info!("Registering URI handlers");
    server.fn_handler::<anyhow::Error, _>(ROUTE_HELLO, Method::Get, |req| {
        req.into_ok_response()?.write_all(GREETING.as_bytes())?;
        Ok(())
    })?;

    let accel_ctx = Arc::clone(&ctx);
    server.fn_handler::<anyhow::Error, _>(ROUTE_TH_SENSOR, Method::Get, move |req| {
        let body = latest_json(&ctx)?;
        req.into_response(200, None, &[("Content-Type", CONTENT_TYPE_JSON)])?
            .write_all(body.as_bytes())?;
        Ok(())
    })?;

    server.fn_handler::<anyhow::Error, _>(ROUTE_ACCELEROMETER, Method::Get, move |req| {
        let body = accel_json(&accel_ctx)?;
        req.into_response(200, None, &[("Content-Type", CONTENT_TYPE_JSON)])?
            .write_all(body.as_bytes())?;
        Ok(())
    })?;

    server.fn_handler::<anyhow::Error, _>(ROUTE_TH_SENSOR, Method::Post, |mut req| {
        let mut buf = [0u8; HTTP_POST_BUFFER_SIZE];
        let len = req.read(&mut buf)?;
        accept_post(&buf[..len]);
        req.into_ok_response()?.write_all(POST_REPLY.as_bytes())?;
        Ok(())
    })?;

    server.fn_handler::<anyhow::Error, _>(ROUTE_FAVICON, Method::Get, |req| {
        req.into_ok_response()?;
        Ok(())
    })?;

    Ok(server)
}
