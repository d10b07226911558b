use crate::prediction::Detection;
use opencv::{
    core::{Mat, Point, Rect, Scalar},
    imgproc,
    prelude::*,
};
use std::borrow::Cow;
use thiserror::Error;

const MAX_LABEL_CHARS: usize = 20;

fn box_color() -> Scalar {
    Scalar::new(0.0, 255.0, 0.0, 0.0)
}

pub fn label_for(detection: &Detection) -> String {
    let name = if detection.name.chars().count() > MAX_LABEL_CHARS {
        let truncated: String = detection.name.chars().take(MAX_LABEL_CHARS).collect();
        format!("{}...", truncated)
    } else {
        detection.name.clone()
    };
    format!("{} ({:.2})", name, detection.confidence)
}

#[derive(Error, Debug)]
enum DrawError {
    #[error("Box {0:?} is too large to draw")]
    BoxOverflow([i32; 4]),
    #[error("OpenCV error: {0}")]
    OpenCv(#[from] opencv::Error),
}

fn draw_one(frame: &mut Mat, detection: &Detection) -> Result<(), DrawError> {
    let [x1, y1, x2, y2] = detection.bbox;
    let (Some(width), Some(height)) = (x2.checked_sub(x1), y2.checked_sub(y1)) else {
        return Err(DrawError::BoxOverflow(detection.bbox));
    };

    imgproc::rectangle(
        frame,
        Rect::new(x1, y1, width, height),
        box_color(),
        2,
        imgproc::LINE_8,
        0,
    )?;

    imgproc::put_text(
        frame,
        &label_for(detection),
        Point::new(x1, y1.saturating_sub(10)),
        imgproc::FONT_HERSHEY_SIMPLEX,
        0.5,
        box_color(),
        2,
        imgproc::LINE_8,
        false,
    )?;

    Ok(())
}

/// Draws boxes and labels on a copy of `frame`. The input is never modified;
/// with nothing to draw the input itself is returned.
pub fn draw<'a>(frame: &'a Mat, detections: &[Detection]) -> Cow<'a, Mat> {
    if detections.is_empty() || frame.empty() {
        return Cow::Borrowed(frame);
    }

    let mut annotated = match frame.try_clone() {
        Ok(annotated) => annotated,
        Err(e) => {
            tracing::error!("Failed to copy frame for annotation: {:?}", e);
            return Cow::Borrowed(frame);
        }
    };

    for detection in detections {
        if let Err(e) = draw_one(&mut annotated, detection) {
            tracing::warn!("Failed to draw detection {:?}: {}", detection.name, e);
        }
    }

    Cow::Owned(annotated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cv_utils::blank_frame;

    fn detection(name: &str, confidence: f32, bbox: [i32; 4]) -> Detection {
        Detection {
            name: name.to_string(),
            description: String::new(),
            confidence,
            bbox,
        }
    }

    #[test]
    fn test_label_short_name_is_intact() {
        assert_eq!(label_for(&detection("Stop", 0.734, [0; 4])), "Stop (0.73)");
        assert_eq!(
            label_for(&detection("Speed limit (20km/h)", 0.5, [0; 4])),
            "Speed limit (20km/h) (0.50)"
        );
    }

    #[test]
    fn test_label_long_name_is_truncated() {
        let label = label_for(&detection(
            "Right-of-way at the next intersection",
            0.916,
            [0; 4],
        ));
        assert_eq!(label, "Right-of-way at the ... (0.92)");
    }

    #[test]
    fn test_draw_does_not_mutate_input() {
        let frame = blank_frame(200, 200);
        let detections = vec![detection("Stop", 0.9, [20, 40, 120, 140])];

        let annotated = draw(&frame, &detections);

        assert!(frame.data_bytes().unwrap().iter().all(|b| *b == 0));
        assert!(matches!(annotated, Cow::Owned(_)));
        assert!(annotated.data_bytes().unwrap().iter().any(|b| *b != 0));
    }

    #[test]
    fn test_draw_skips_overflowing_box_and_draws_the_rest() {
        let frame = blank_frame(200, 200);
        let detections = vec![
            detection("Stop", 0.9, [-2_000_000_000, 0, 2_000_000_000, 20]),
            detection("Yield", 0.8, [0, i32::MIN, 10, i32::MAX]),
            detection("No entry", 0.7, [20, 40, 120, 140]),
        ];

        let annotated = draw(&frame, &detections);

        assert!(matches!(annotated, Cow::Owned(_)));
        assert!(annotated.data_bytes().unwrap().iter().any(|b| *b != 0));
    }

    #[test]
    fn test_draw_without_detections_returns_input() {
        let frame = blank_frame(32, 32);
        let annotated = draw(&frame, &[]);
        assert!(matches!(annotated, Cow::Borrowed(_)));
    }

    #[test]
    fn test_draw_on_empty_frame_returns_input() {
        let frame = Mat::default();
        let annotated = draw(&frame, &[detection("Stop", 0.9, [0, 0, 10, 10])]);
        assert!(matches!(annotated, Cow::Borrowed(_)));
    }
}
