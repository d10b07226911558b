use crate::{
    bounding_box::RawDetection,
    catalog::SignCatalog,
    config::DetectorConfig,
    cv_utils,
    model::SignModel,
};
use opencv::{core::Mat, prelude::*};
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

/// A recognized sign in original-frame pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub name: String,
    pub description: String,
    pub confidence: f32,
    pub bbox: [i32; 4],
}

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Box has non-finite values: {0:?}")]
    NonFiniteBox(RawDetection),
    #[error("Box does not fit in pixel coordinates: {0:?}")]
    OutOfRange(RawDetection),
}

/// Processing resolution and original frame size, used to map model boxes back.
#[derive(Debug, Clone, Copy)]
struct Rescale {
    processing_width: f64,
    processing_height: f64,
    original_width: f64,
    original_height: f64,
}

impl Rescale {
    fn x(&self, x: f32) -> f64 {
        x as f64 * self.original_width / self.processing_width
    }

    fn y(&self, y: f32) -> f64 {
        y as f64 * self.original_height / self.processing_height
    }
}

fn to_pixel(value: f64) -> Option<i32> {
    if value.is_finite() && value >= i32::MIN as f64 && value <= i32::MAX as f64 {
        Some(value as i32)
    } else {
        None
    }
}

pub struct SignDetector<M: SignModel> {
    model: M,
    catalog: Arc<SignCatalog>,
    confidence_threshold: f32,
    processing_width: u32,
    processing_height: u32,
}

impl<M: SignModel> SignDetector<M> {
    pub fn new(model: M, catalog: Arc<SignCatalog>, detector_config: &DetectorConfig) -> Self {
        Self {
            model,
            catalog,
            confidence_threshold: detector_config.confidence_threshold,
            processing_width: detector_config.processing_width,
            processing_height: detector_config.processing_height,
        }
    }

    /// Detections for `frame`, in model order. Never fails: problems are logged
    /// and yield fewer (or no) detections.
    #[instrument(skip(self, frame))]
    pub fn detect(&mut self, frame: &Mat) -> Vec<Detection> {
        if frame.empty() {
            return Vec::new();
        }

        let resized =
            match cv_utils::resize(frame, self.processing_width, self.processing_height) {
                Ok(resized) => resized,
                Err(e) => {
                    tracing::error!("Failed to prepare frame for inference: {:?}", e);
                    return Vec::new();
                }
            };

        let raw_detections = match self.model.infer(&resized) {
            Ok(raw_detections) => raw_detections,
            Err(e) => {
                tracing::error!("Inference failed: {:?}", e);
                return Vec::new();
            }
        };

        let rescale = Rescale {
            processing_width: self.processing_width as f64,
            processing_height: self.processing_height as f64,
            original_width: frame.cols() as f64,
            original_height: frame.rows() as f64,
        };

        let mut detections = Vec::with_capacity(raw_detections.len());
        for raw in raw_detections {
            if !(raw.confidence > self.confidence_threshold) {
                continue;
            }
            match self.to_detection(&raw, &rescale) {
                Ok(detection) => detections.push(detection),
                Err(e) => {
                    tracing::warn!("Skipping detection: {}", e);
                    continue;
                }
            }
        }

        tracing::debug!("Returning {} detections", detections.len());
        detections
    }

    fn to_detection(
        &self,
        raw: &RawDetection,
        rescale: &Rescale,
    ) -> Result<Detection, DetectionError> {
        if !raw.is_finite() {
            return Err(DetectionError::NonFiniteBox(*raw));
        }

        let bbox = [
            to_pixel(rescale.x(raw.x1)),
            to_pixel(rescale.y(raw.y1)),
            to_pixel(rescale.x(raw.x2)),
            to_pixel(rescale.y(raw.y2)),
        ];
        let [Some(x1), Some(y1), Some(x2), Some(y2)] = bbox else {
            return Err(DetectionError::OutOfRange(*raw));
        };

        let sign = self.catalog.lookup(raw.class_id);

        Ok(Detection {
            name: sign.name.to_string(),
            description: sign.description.to_string(),
            confidence: raw.confidence,
            bbox: [x1, y1, x2, y2],
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{cv_utils::blank_frame, model::ModelError};
    use std::path::PathBuf;

    /// Returns the same boxes for every frame and records the frame sizes it saw.
    pub(crate) struct MockSignModel {
        pub boxes: Vec<RawDetection>,
        pub fail: bool,
        pub seen_sizes: Vec<(i32, i32)>,
    }

    impl MockSignModel {
        pub(crate) fn new(boxes: Vec<RawDetection>) -> Self {
            Self {
                boxes,
                fail: false,
                seen_sizes: Vec::new(),
            }
        }
    }

    impl SignModel for MockSignModel {
        fn infer(&mut self, frame: &Mat) -> Result<Vec<RawDetection>, ModelError> {
            self.seen_sizes.push((frame.cols(), frame.rows()));
            if self.fail {
                return Err(ModelError::InferenceFailed("mock failure".to_string()));
            }
            Ok(self.boxes.clone())
        }
    }

    pub(crate) fn detector_config() -> DetectorConfig {
        DetectorConfig {
            model_dir: PathBuf::from("models"),
            onnx_file: "best.onnx".to_string(),
            confidence_threshold: 0.5,
            model_confidence: 0.25,
            iou_threshold: 0.7,
            processing_width: 640,
            processing_height: 480,
        }
    }

    pub(crate) fn raw(class_id: usize, confidence: f32, bbox: [f32; 4]) -> RawDetection {
        RawDetection {
            class_id,
            confidence,
            x1: bbox[0],
            y1: bbox[1],
            x2: bbox[2],
            y2: bbox[3],
        }
    }

    fn detector(boxes: Vec<RawDetection>) -> SignDetector<MockSignModel> {
        SignDetector::new(
            MockSignModel::new(boxes),
            Arc::new(SignCatalog::gtsrb()),
            &detector_config(),
        )
    }

    #[test]
    fn test_detect_rescales_to_original_frame() {
        let mut detector = detector(vec![raw(14, 0.73, [100., 100., 200., 200.])]);
        let frame = blank_frame(1280, 960);

        let detections = detector.detect(&frame);

        assert_eq!(detector.model.seen_sizes, vec![(640, 480)]);
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].name, "Stop");
        assert_eq!(detections[0].confidence, 0.73);
        assert_eq!(detections[0].bbox, [200, 200, 400, 400]);
    }

    #[test]
    fn test_detect_uses_independent_scale_factors() {
        let mut detector = detector(vec![raw(1, 0.9, [64., 48., 320., 240.])]);
        let frame = blank_frame(320, 480);

        let detections = detector.detect(&frame);

        // x scales by 320/640, y by 480/480.
        assert_eq!(detections[0].bbox, [32, 48, 160, 240]);
    }

    #[test]
    fn test_confidence_threshold_is_strict() {
        let mut detector = detector(vec![
            raw(1, 0.5, [0., 0., 10., 10.]),
            raw(2, 0.2, [0., 0., 10., 10.]),
            raw(3, 0.5001, [0., 0., 10., 10.]),
            raw(4, 1.0, [0., 0., 10., 10.]),
        ]);
        let frame = blank_frame(640, 480);

        let names: Vec<_> = detector
            .detect(&frame)
            .into_iter()
            .map(|d| d.name)
            .collect();

        assert_eq!(names, vec!["Speed limit (60km/h)", "Speed limit (70km/h)"]);
    }

    #[test]
    fn test_unknown_class_uses_sentinel() {
        let mut detector = detector(vec![raw(99, 0.9, [0., 0., 10., 10.])]);
        let detections = detector.detect(&blank_frame(640, 480));

        assert_eq!(detections[0].name, "Unknown Sign");
        assert_eq!(detections[0].description, "Sign not recognized");
    }

    #[test]
    fn test_invalid_box_is_skipped_and_siblings_kept() {
        let mut detector = detector(vec![
            raw(13, 0.9, [f32::NAN, 0., 10., 10.]),
            raw(14, 0.8, [0., 0., 10., 10.]),
            raw(17, 0.7, [0., 0., f32::MAX, 10.]),
        ]);
        let detections = detector.detect(&blank_frame(1280, 960));

        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].name, "Stop");
    }

    #[test]
    fn test_inference_failure_yields_no_detections() {
        let mut model = MockSignModel::new(vec![raw(14, 0.9, [0., 0., 10., 10.])]);
        model.fail = true;
        let mut detector =
            SignDetector::new(model, Arc::new(SignCatalog::gtsrb()), &detector_config());

        assert!(detector.detect(&blank_frame(640, 480)).is_empty());
    }

    #[test]
    fn test_empty_frame_yields_no_detections() {
        let mut detector = detector(vec![raw(14, 0.9, [0., 0., 10., 10.])]);

        assert!(detector.detect(&Mat::default()).is_empty());
        assert!(detector.model.seen_sizes.is_empty());
    }

    #[test]
    fn test_detections_keep_model_order() {
        let mut detector = detector(vec![
            raw(13, 0.6, [0., 0., 10., 10.]),
            raw(14, 0.95, [0., 0., 10., 10.]),
        ]);
        let detections = detector.detect(&blank_frame(640, 480));

        assert_eq!(detections[0].name, "Yield");
        assert_eq!(detections[1].name, "Stop");
    }
}
