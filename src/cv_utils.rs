use bytes::Bytes;
use opencv::{
    core::{Mat, Size, Vector},
    imgcodecs, imgproc,
    prelude::*,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CvUtilsError {
    #[error("Failed to encode frame: {0}")]
    EncodeFrameFailed(opencv::Error),
    #[error("Failed to resize frame: {0}")]
    ResizeFrameFailed(opencv::Error),
    #[error("Encoder produced no data")]
    EmptyEncoding,
}

pub fn encode_jpeg(frame: &Mat) -> Result<Bytes, CvUtilsError> {
    let mut buf = Vector::<u8>::new();
    imgcodecs::imencode(".jpg", frame, &mut buf, &Vector::new())
        .map_err(CvUtilsError::EncodeFrameFailed)?;
    if buf.is_empty() {
        return Err(CvUtilsError::EmptyEncoding);
    }
    Ok(Bytes::from(buf.to_vec()))
}

pub fn resize(frame: &Mat, width: u32, height: u32) -> Result<Mat, CvUtilsError> {
    let mut resized = Mat::default();
    imgproc::resize(
        frame,
        &mut resized,
        Size::new(width as i32, height as i32),
        0.0,
        0.0,
        imgproc::INTER_LINEAR,
    )
    .map_err(CvUtilsError::ResizeFrameFailed)?;
    Ok(resized)
}

#[cfg(test)]
pub(crate) fn blank_frame(width: i32, height: i32) -> Mat {
    use opencv::core::{Scalar, CV_8UC3};

    Mat::new_rows_cols_with_default(height, width, CV_8UC3, Scalar::all(0.0)).unwrap()
}
