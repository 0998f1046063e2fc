use crate::annotation::domain::detection_drawer::DetectionDrawer;
use crate::detection::domain::face_detector::FaceDetector;
use crate::display::domain::frame_display::FrameDisplay;
use crate::shared::constants::QUIT_KEY;
use crate::shared::frame::ChannelOrder;
use crate::video::domain::video_reader::VideoReader;

/// Why the viewing loop stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The quit key was pressed.
    QuitRequested,
    /// The source yielded no further frame (end of stream or unreadable).
    StreamEnded,
}

/// Loop state. `Stopped` is terminal; entering it releases the reader and
/// destroys the display window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LoopState {
    Running,
    Stopped(StopReason),
}

/// Drives the read → detect → draw → display cycle until termination.
///
/// Exactly one frame is in flight at a time: each frame is pulled from the
/// reader, converted to RGB for detection, converted back to BGR, annotated
/// in place, displayed, and dropped. The reader and the display are
/// released exactly once on every exit path, including propagated
/// collaborator faults.
pub struct ViewFacesUseCase {
    reader: Box<dyn VideoReader>,
    detector: Box<dyn FaceDetector>,
    drawer: Box<dyn DetectionDrawer>,
    display: Box<dyn FrameDisplay>,
}

impl ViewFacesUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        detector: Box<dyn FaceDetector>,
        drawer: Box<dyn DetectionDrawer>,
        display: Box<dyn FrameDisplay>,
    ) -> Self {
        Self {
            reader,
            detector,
            drawer,
            display,
        }
    }

    /// Runs the loop until the quit key, stream exhaustion, or a fault.
    pub fn execute(&mut self) -> Result<StopReason, Box<dyn std::error::Error>> {
        let result = self.run_loop();
        self.reader.close();
        self.display.close();
        result
    }

    fn run_loop(&mut self) -> Result<StopReason, Box<dyn std::error::Error>> {
        let mut frames = self.reader.frames();
        let mut state = LoopState::Running;

        while state == LoopState::Running {
            if self.display.poll_key()? == Some(QUIT_KEY) {
                log::info!("Quit key pressed, stopping");
                state = LoopState::Stopped(StopReason::QuitRequested);
                continue;
            }

            let mut frame = match frames.next() {
                Some(Ok(frame)) => frame,
                Some(Err(e)) => {
                    // End of stream and an unreadable source are treated
                    // the same: one warning, then stop.
                    log::warn!("No frame available: {e}");
                    state = LoopState::Stopped(StopReason::StreamEnded);
                    continue;
                }
                None => {
                    log::warn!("No frame available: end of stream");
                    state = LoopState::Stopped(StopReason::StreamEnded);
                    continue;
                }
            };

            frame.convert_to(ChannelOrder::Rgb);
            let detections = self.detector.detect(&frame)?;
            frame.convert_to(ChannelOrder::Bgr);

            for detection in &detections {
                self.drawer.draw(&mut frame, detection)?;
            }

            self.display.show(&frame)?;
        }

        let LoopState::Stopped(reason) = state else {
            unreachable!("loop exits only in the Stopped state");
        };
        Ok(reason)
    }
}
