use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::metrics::REGISTRY;

pub async fn metrics_handler() -> Response {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        log::error!("Could not encode custom metrics: {}", e);
    };
    let mut res = match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            log::error!("Custom metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    };

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        log::error!("Could not encode prometheus metrics: {}", e);
    };
    let res_custom = match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            log::error!("Prometheus metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    };

    res.push_str(&res_custom);

    (StatusCode::OK, res).into_response()
}
