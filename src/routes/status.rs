use crate::server::SharedState;
use axum::{extract::State, response::Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct Status {
    camera_connected: bool,
    detector_initialized: bool,
}

pub async fn status(State(state): State<SharedState>) -> Json<Status> {
    state.metrics.record_request("/status");
    Json(Status {
        camera_connected: state.status.camera_connected(),
        detector_initialized: state.status.detector_initialized(),
    })
}
