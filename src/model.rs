use crate::{
    bounding_box::{non_max_suppression, RawDetection},
    config::DetectorConfig,
};
use ndarray::{s, Array, ArrayD, Axis, Ix3, Ix4};
use opencv::{core::Mat, prelude::*};
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::TensorRef,
};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model file not found: {0:?}")]
    ModelNotFound(PathBuf),
    #[error("Failed to load model: {0}")]
    LoadFailed(String),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    #[error("Unexpected model output: {0}")]
    InvalidOutput(String),
    #[error("Invalid input frame: {0}")]
    InvalidInput(String),
    #[error("OpenCV error: {0}")]
    OpenCv(#[from] opencv::Error),
}

/// Object detector invoked on frames already resized to the processing resolution.
///
/// Boxes are returned in the coordinate space of the frame passed in, in the
/// model's own output order.
pub trait SignModel: Send + 'static {
    fn infer(&mut self, frame: &Mat) -> Result<Vec<RawDetection>, ModelError>;
}

/// YOLOv8 ONNX export run through onnxruntime.
pub struct OrtSignModel {
    session: Session,
    min_confidence: f32,
    iou_threshold: f32,
}

impl OrtSignModel {
    pub fn new(detector_config: &DetectorConfig) -> Result<Self, ModelError> {
        let model_path = detector_config.get_model_path();
        if !model_path.exists() {
            return Err(ModelError::ModelNotFound(model_path));
        }

        let load = || -> Result<Session, ort::Error> {
            let session = Session::builder()?
                .with_optimization_level(GraphOptimizationLevel::Level3)?
                .commit_from_file(&model_path)?;
            Ok(session)
        };
        let session = load().map_err(|e| ModelError::LoadFailed(e.to_string()))?;

        tracing::info!("Loaded ONNX model from {:?}", detector_config.get_model_path());

        Ok(Self {
            session,
            min_confidence: detector_config.model_confidence,
            iou_threshold: detector_config.iou_threshold,
        })
    }

    fn run_inference(&mut self, input: &Array<f32, Ix4>) -> Result<ArrayD<f32>, ModelError> {
        let tensor_ref = TensorRef::from_array_view(input.view())
            .map_err(|e| ModelError::InferenceFailed(format!("failed to build tensor: {}", e)))?;

        let outputs = self
            .session
            .run(ort::inputs![tensor_ref])
            .map_err(|e| ModelError::InferenceFailed(e.to_string()))?;

        let (shape, data) = outputs["output0"]
            .try_extract_tensor::<f32>()
            .map_err(|e| ModelError::InvalidOutput(format!("failed to extract tensor: {}", e)))?;

        ArrayD::from_shape_vec(shape.to_ixdyn(), data.to_vec())
            .map_err(|e| ModelError::InvalidOutput(format!("invalid tensor shape: {}", e)))
    }
}

impl SignModel for OrtSignModel {
    fn infer(&mut self, frame: &Mat) -> Result<Vec<RawDetection>, ModelError> {
        let input = frame_to_tensor(frame)?;
        let output = self.run_inference(&input)?;
        let boxes = decode_output(output, self.min_confidence)?;
        Ok(non_max_suppression(boxes, self.iou_threshold))
    }
}

/// BGR 8-bit frame to a `1x3xHxW` RGB tensor scaled to `[0, 1]`.
fn frame_to_tensor(frame: &Mat) -> Result<Array<f32, Ix4>, ModelError> {
    if frame.channels() != 3 {
        return Err(ModelError::InvalidInput(format!(
            "expected 3 channels, got {}",
            frame.channels()
        )));
    }

    let width = frame.cols() as usize;
    let height = frame.rows() as usize;
    let data = frame.data_bytes()?;
    if data.len() != width * height * 3 {
        return Err(ModelError::InvalidInput(format!(
            "expected {} bytes of 8-bit pixels, got {}",
            width * height * 3,
            data.len()
        )));
    }

    let mut input = Array::zeros((1, 3, height, width));
    for (index, pixel) in data.chunks_exact(3).enumerate() {
        let y = index / width;
        let x = index % width;
        let [b, g, r] = [pixel[0], pixel[1], pixel[2]];
        input[[0, 0, y, x]] = (r as f32) / 255.;
        input[[0, 1, y, x]] = (g as f32) / 255.;
        input[[0, 2, y, x]] = (b as f32) / 255.;
    }

    Ok(input)
}

/// Decodes a `1x(4+C)xN` YOLOv8 output of `cx, cy, w, h` followed by class scores.
fn decode_output(output: ArrayD<f32>, min_confidence: f32) -> Result<Vec<RawDetection>, ModelError> {
    let output = output
        .into_dimensionality::<Ix3>()
        .map_err(|e| ModelError::InvalidOutput(format!("expected a 3-D output: {}", e)))?;
    if output.shape()[1] <= 4 {
        return Err(ModelError::InvalidOutput(format!(
            "expected box coordinates and class scores, got {:?}",
            output.shape()
        )));
    }

    let predictions = output.slice(s![0, .., ..]);
    let mut boxes = Vec::new();

    for row in predictions.t().axis_iter(Axis(0)) {
        let best = row
            .iter()
            .skip(4)
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1));
        let Some((class_id, confidence)) = best else {
            continue;
        };

        if confidence < min_confidence {
            continue;
        }

        boxes.push(RawDetection::from_center(
            class_id, confidence, row[0], row[1], row[2], row[3],
        ));
    }

    Ok(boxes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cv_utils::blank_frame;
    use ndarray::Array3;

    #[test]
    fn test_frame_to_tensor() {
        let frame = blank_frame(64, 48);
        let input = frame_to_tensor(&frame).unwrap();

        assert_eq!(input.shape(), &[1, 3, 48, 64]);
        assert!(input.iter().all(|v| *v == 0.));
    }

    #[test]
    fn test_frame_to_tensor_swaps_to_rgb() {
        use opencv::core::{Scalar, CV_8UC3};

        // BGR (255, 0, 0) is pure blue.
        let frame =
            Mat::new_rows_cols_with_default(2, 2, CV_8UC3, Scalar::new(255., 0., 0., 0.)).unwrap();
        let input = frame_to_tensor(&frame).unwrap();

        assert_eq!(input[[0, 0, 1, 1]], 0.);
        assert_eq!(input[[0, 2, 1, 1]], 1.);
    }

    #[test]
    fn test_decode_output() {
        // Two anchors, two classes.
        let mut output = Array3::<f32>::zeros((1, 6, 2));
        output[[0, 0, 0]] = 150.;
        output[[0, 1, 0]] = 150.;
        output[[0, 2, 0]] = 100.;
        output[[0, 3, 0]] = 100.;
        output[[0, 4, 0]] = 0.1;
        output[[0, 5, 0]] = 0.73;

        output[[0, 4, 1]] = 0.05;
        output[[0, 5, 1]] = 0.02;

        let boxes = decode_output(output.into_dyn(), 0.25).unwrap();

        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].class_id, 1);
        assert_eq!(boxes[0].confidence, 0.73);
        assert_eq!(
            (boxes[0].x1, boxes[0].y1, boxes[0].x2, boxes[0].y2),
            (100., 100., 200., 200.)
        );
    }

    #[test]
    fn test_decode_output_rejects_wrong_rank() {
        let output = ArrayD::<f32>::zeros(ndarray::IxDyn(&[6, 2]));
        assert!(matches!(
            decode_output(output, 0.25),
            Err(ModelError::InvalidOutput(_))
        ));
    }
}
