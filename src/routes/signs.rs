use crate::{audio::AudioFiles, server::SharedState};
use axum::{extract::State, response::Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct SignEntry {
    class_id: String,
    name: &'static str,
    description: &'static str,
    audio_files: AudioFiles,
    audio_available: bool,
}

pub async fn signs(State(state): State<SharedState>) -> Json<Vec<SignEntry>> {
    state.metrics.record_request("/signs");

    let mut entries = Vec::new();
    for (class_id, sign) in state.catalog.iter() {
        entries.push(SignEntry {
            class_id: class_id.to_string(),
            name: sign.name,
            description: sign.description,
            audio_files: state.audio.urls(class_id),
            audio_available: state.audio.is_available(class_id).await,
        });
    }

    Json(entries)
}

#[cfg(test)]
mod tests {
    use crate::{
        routes::test_support::{get_json, router, state},
        slot::LatestDetection,
    };
    use std::sync::Arc;

    #[tokio::test]
    async fn test_lists_catalog_with_audio_availability() {
        let root = std::env::temp_dir().join(format!("road_sign_signs_{}", std::process::id()));
        let audio_dir = root.join("audio");
        std::fs::create_dir_all(&audio_dir).unwrap();
        std::fs::write(audio_dir.join("sign_014_name.mp3"), b"id3").unwrap();
        std::fs::write(audio_dir.join("sign_014_desc.mp3"), b"id3").unwrap();

        let router = router(state(Arc::new(LatestDetection::new()), audio_dir), &root);
        let (_, body) = get_json(&router, "/signs").await;

        let entries = body.as_array().unwrap();
        assert_eq!(entries.len(), 43);
        assert_eq!(entries[14]["name"], "Stop");
        assert_eq!(entries[14]["class_id"], "14");
        assert_eq!(entries[14]["audio_available"], true);
        assert_eq!(entries[13]["audio_available"], false);
        assert_eq!(entries[13]["audio_files"]["description"], "/audio/sign_013_desc.mp3");

        std::fs::remove_dir_all(&root).unwrap();
    }
}
