use crate::shared::detection::Detection;
use crate::shared::frame::Frame;

/// Domain interface for face detection.
///
/// The frame is borrowed immutably for the duration of inference; producing
/// detections never mutates pixel data. Implementations may be stateful,
/// hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>>;
}
