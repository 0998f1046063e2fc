/// One of the six facial keypoints BlazeFace reports, in frame pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keypoint {
    pub x: i32,
    pub y: i32,
}

/// A single detected face: bounding box, confidence, and facial keypoints.
///
/// Produced fresh by the detector for every frame and dropped after the
/// frame is displayed; detections are never carried across frames.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Post-sigmoid detector score in [0, 1].
    pub confidence: f64,
    /// Eyes, nose tip, mouth center, ears — empty if the model variant
    /// does not report keypoints.
    pub keypoints: Vec<Keypoint>,
}

impl Detection {
    pub fn iou(&self, other: &Detection) -> f64 {
        let ix1 = self.x.max(other.x);
        let iy1 = self.y.max(other.y);
        let ix2 = (self.x + self.width).min(other.x + other.width);
        let iy2 = (self.y + self.height).min(other.y + other.height);

        let inter = (ix2 - ix1).max(0) as f64 * (iy2 - iy1).max(0) as f64;
        if inter == 0.0 {
            return 0.0;
        }

        let area_a = self.width as f64 * self.height as f64;
        let area_b = other.width as f64 * other.height as f64;
        inter / (area_a + area_b - inter)
    }
}
