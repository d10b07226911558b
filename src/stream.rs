use crate::{
    annotator,
    camera::{CameraError, FrameSource},
    cv_utils::{self, CvUtilsError},
    model::SignModel,
    prediction::{Detection, SignDetector},
    slot::LatestDetection,
    telemetry::Metrics,
};
use bytes::{BufMut, Bytes, BytesMut};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};
use thiserror::Error;
use tokio::sync::broadcast::{self, error::TryRecvError};

pub const FRAME_BOUNDARY: &str = "frame";

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),
    #[error("Encoding error: {0}")]
    Encode(#[from] CvUtilsError),
}

/// One part of a `multipart/x-mixed-replace` body carrying a JPEG image.
pub fn multipart_part(jpeg: &[u8]) -> Bytes {
    let header = format!("--{}\r\nContent-Type: image/jpeg\r\n\r\n", FRAME_BOUNDARY);
    let mut part = BytesMut::with_capacity(header.len() + jpeg.len() + 2);
    part.put_slice(header.as_bytes());
    part.put_slice(jpeg);
    part.put_slice(b"\r\n");
    part.freeze()
}

/// Health of the pipeline as seen by `/status`.
#[derive(Debug)]
pub struct PipelineStatus {
    camera_connected: AtomicBool,
    detector_initialized: bool,
}

impl PipelineStatus {
    pub fn new(camera_connected: bool, detector_initialized: bool) -> Self {
        Self {
            camera_connected: AtomicBool::new(camera_connected),
            detector_initialized,
        }
    }

    pub fn camera_connected(&self) -> bool {
        self.camera_connected.load(Ordering::Relaxed)
    }

    pub fn set_camera_connected(&self, connected: bool) {
        self.camera_connected.store(connected, Ordering::Relaxed);
    }

    pub fn detector_initialized(&self) -> bool {
        self.detector_initialized
    }
}

/// Read, detect, annotate, encode, publish. Owns the camera for its lifetime.
pub struct StreamingLoop<S: FrameSource, M: SignModel> {
    source: S,
    detector: Option<SignDetector<M>>,
    latest_detection: Arc<LatestDetection>,
    frames: broadcast::Sender<Bytes>,
    status: Arc<PipelineStatus>,
    metrics: Arc<Metrics>,
}

impl<S: FrameSource, M: SignModel> StreamingLoop<S, M> {
    pub fn new(
        source: S,
        detector: Option<SignDetector<M>>,
        latest_detection: Arc<LatestDetection>,
        frames: broadcast::Sender<Bytes>,
        status: Arc<PipelineStatus>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            source,
            detector,
            latest_detection,
            frames,
            status,
            metrics,
        }
    }

    /// Runs cycles until `shutdown_rx` fires. Blocks the calling thread.
    pub fn run(mut self, mut shutdown_rx: broadcast::Receiver<()>) {
        tracing::info!("Streaming loop started");
        loop {
            match shutdown_rx.try_recv() {
                Err(TryRecvError::Empty) => {}
                _ => {
                    tracing::info!("Streaming loop received shutdown signal");
                    break;
                }
            }

            if let Err(e) = self.cycle() {
                match e {
                    StreamError::Camera(_) => {
                        self.metrics.record_camera_read_failure();
                        tracing::warn!("Failed to read from camera: {}", e);
                    }
                    StreamError::Encode(_) => tracing::error!("Error in streaming loop: {}", e),
                }
            }
        }
        tracing::info!("Streaming loop stopped");
    }

    /// One READING then PUBLISHING pass.
    pub fn cycle(&mut self) -> Result<(), StreamError> {
        let frame = self.source.read();
        self.status.set_camera_connected(self.source.is_opened());
        let frame = frame?;

        let started = Instant::now();
        let detections: Vec<Detection> = match self.detector.as_mut() {
            Some(detector) => detector.detect(&frame),
            None => Vec::new(),
        };
        if self.detector.is_some() {
            self.metrics
                .record_detection_duration(started.elapsed().as_millis() as u64);
        }

        let annotated = annotator::draw(&frame, &detections);
        let jpeg = cv_utils::encode_jpeg(&annotated)?;

        if let Some(first) = detections.into_iter().next() {
            self.metrics.record_detection_published(&first.name);
            self.latest_detection.publish(first);
        }

        // No viewers is not an error; the frame is simply dropped.
        let _ = self.frames.send(multipart_part(&jpeg));
        self.metrics.record_frame_streamed();

        Ok(())
    }
}
