use crate::shared::detection::Detection;
use crate::shared::frame::Frame;

/// Overlays the annotation for one detection onto a frame, in place.
///
/// Implementations draw only; they must never resize or reallocate the
/// frame. The loop calls this once per detection.
pub trait DetectionDrawer: Send {
    fn draw(
        &self,
        frame: &mut Frame,
        detection: &Detection,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
