use crate::{server::SharedState, stream::FRAME_BOUNDARY};
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::convert::Infallible;
use thiserror::Error;
use tokio_stream::{
    wrappers::{errors::BroadcastStreamRecvError, BroadcastStream},
    StreamExt,
};
use tracing::instrument;

#[derive(Error, Debug)]
pub enum VideoStreamError {
    #[error("Http builder error: {0}")]
    HttpBuilderError(String),
}

impl IntoResponse for VideoStreamError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

/// Subscribes to the shared streaming loop; every viewer sees the same frames.
#[instrument(skip(state))]
pub async fn video_feed(State(state): State<SharedState>) -> Result<Response, VideoStreamError> {
    state.metrics.record_request("/video_feed");

    let mut shutdown_rx = state.shutdown.subscribe();
    let stream = BroadcastStream::new(state.frames.subscribe()).filter_map(|part| match part {
        Ok(part) => Some(Ok::<_, Infallible>(part)),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::debug!("Viewer lagged, skipped {} frames", skipped);
            None
        }
    });
    let stream = futures::StreamExt::take_until(stream, async move {
        shutdown_rx.recv().await.ok();
        tracing::debug!("Closing video feed on shutdown");
    });

    let body = Body::from_stream(stream);

    Response::builder()
        .header(
            header::CONTENT_TYPE,
            format!("multipart/x-mixed-replace; boundary={}", FRAME_BOUNDARY),
        )
        .body(body)
        .map_err(|e| VideoStreamError::HttpBuilderError(e.to_string()))
}
