use crate::shared::frame::Frame;

/// Presents frames in a named window and reports key presses.
///
/// The window is created when the implementation is constructed and
/// destroyed by `close`; the loop calls `show` once per frame.
pub trait FrameDisplay: Send {
    /// Displays the frame, replacing the window's current content.
    fn show(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;

    /// Non-blocking key poll with a bounded wait.
    ///
    /// Returns the most recent key pressed since the last poll, or `None`
    /// if no key arrived within the wait.
    fn poll_key(&mut self) -> Result<Option<char>, Box<dyn std::error::Error>>;

    /// Destroys the window. Idempotent.
    fn close(&mut self);
}
