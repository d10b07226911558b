use crate::config::CameraConfig;
use opencv::{core::Mat, prelude::*, videoio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Failed to open camera: {0}")]
    OpenCameraFailed(opencv::Error),
    #[error("Failed to read frame: {0}")]
    ReadFrameFailed(opencv::Error),
    #[error("Camera returned no frame")]
    NoFrame,
}

/// Blocking frame producer driven by the streaming loop.
pub trait FrameSource: Send + 'static {
    fn read(&mut self) -> Result<Mat, CameraError>;
    fn is_opened(&self) -> bool;
}

pub struct Camera {
    capture: videoio::VideoCapture,
}

impl Camera {
    pub fn open(camera_config: &CameraConfig) -> Result<Self, CameraError> {
        let mut capture = videoio::VideoCapture::new(camera_config.device_index, videoio::CAP_ANY)
            .map_err(CameraError::OpenCameraFailed)?;

        if let Some(width) = camera_config.frame_width {
            if let Err(e) = capture.set(videoio::CAP_PROP_FRAME_WIDTH, width as f64) {
                tracing::warn!("Failed to request frame width {}: {:?}", width, e);
            }
        }
        if let Some(height) = camera_config.frame_height {
            if let Err(e) = capture.set(videoio::CAP_PROP_FRAME_HEIGHT, height as f64) {
                tracing::warn!("Failed to request frame height {}: {:?}", height, e);
            }
        }

        let camera = Self { capture };
        if camera.is_opened() {
            tracing::info!("Opened camera {}", camera_config.device_index);
        } else {
            tracing::error!(
                "Could not open video capture device {}",
                camera_config.device_index
            );
        }

        Ok(camera)
    }
}

impl FrameSource for Camera {
    fn read(&mut self) -> Result<Mat, CameraError> {
        let mut frame = Mat::default();
        let grabbed = self
            .capture
            .read(&mut frame)
            .map_err(CameraError::ReadFrameFailed)?;
        if !grabbed || frame.empty() {
            return Err(CameraError::NoFrame);
        }
        Ok(frame)
    }

    fn is_opened(&self) -> bool {
        self.capture.is_opened().unwrap_or(false)
    }
}

impl Drop for Camera {
    fn drop(&mut self) {
        if let Err(e) = self.capture.release() {
            tracing::warn!("Failed to release camera: {:?}", e);
        } else {
            tracing::info!("Camera released");
        }
    }
}
