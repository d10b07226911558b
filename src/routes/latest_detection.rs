use crate::{audio::AudioFiles, prediction::Detection, server::SharedState};
use axum::{extract::State, response::Json};
use serde::Serialize;
use tracing::instrument;

const NO_DETECTION: &str = "No detection available";

/// Class id reported when a detection's name is not in the catalog.
const FALLBACK_CLASS_ID: usize = 0;

#[derive(Debug, Serialize)]
pub struct DetectionPayload {
    pub name: String,
    pub description: String,
    pub confidence: f32,
    #[serde(rename = "box")]
    pub bbox: [i32; 4],
    pub class_id: String,
    pub audio_files: AudioFiles,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum LatestDetectionResponse {
    Detection(DetectionPayload),
    Empty { error: &'static str },
}

async fn enrich(state: &SharedState, detection: Detection) -> DetectionPayload {
    let class_id = state
        .catalog
        .class_id_for_name(&detection.name)
        .unwrap_or(FALLBACK_CLASS_ID);

    if !state.audio.is_available(class_id).await {
        tracing::warn!(
            "Audio clips for sign {} ({}) not found in {:?}",
            class_id,
            detection.name,
            state.audio.dir()
        );
    }

    DetectionPayload {
        name: detection.name,
        description: detection.description,
        confidence: detection.confidence,
        bbox: detection.bbox,
        class_id: class_id.to_string(),
        audio_files: state.audio.urls(class_id),
    }
}

#[instrument(skip(state))]
pub async fn latest_detection(State(state): State<SharedState>) -> Json<LatestDetectionResponse> {
    state.metrics.record_request("/latest_detection");

    match state.latest_detection.take() {
        Some(detection) => Json(LatestDetectionResponse::Detection(
            enrich(&state, detection).await,
        )),
        None => Json(LatestDetectionResponse::Empty {
            error: NO_DETECTION,
        }),
    }
}
