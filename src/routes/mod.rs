mod health;
mod latest_detection;
mod metrics;
mod signs;
mod status;
mod video_feed;

use crate::server::SharedState;
use axum::{routing::get, Router};

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/video_feed", get(video_feed::video_feed))
        .route("/latest_detection", get(latest_detection::latest_detection))
        .route("/status", get(status::status))
        .route("/signs", get(signs::signs))
        .route("/health", get(health::healthcheck))
        .route("/metrics", get(metrics::metrics_handler))
}
