use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

use show_image::event::{VirtualKeyCode, WindowEvent};
use show_image::{ImageInfo, ImageView, WindowProxy};

use crate::display::domain::frame_display::FrameDisplay;
use crate::shared::frame::{ChannelOrder, Frame};

/// Bounded wait for the key poll.
const POLL_WAIT: Duration = Duration::from_millis(1);

/// `show-image` backed display window.
///
/// Frame bytes are handed to the window as a raw [`ImageView`] in the
/// frame's own channel order, so no conversion copy happens here. Key
/// presses are drained from the window's event channel.
///
/// Requires the global `show-image` context (`#[show_image::main]` on the
/// binary entry point).
pub struct ShowImageDisplay {
    window: Option<WindowProxy>,
    events: Option<Receiver<WindowEvent>>,
}

impl ShowImageDisplay {
    /// Creates the named window.
    pub fn new(window_name: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let window = show_image::create_window(window_name, Default::default())?;
        let events = window.event_channel()?;
        Ok(Self {
            window: Some(window),
            events: Some(events),
        })
    }
}

impl FrameDisplay for ShowImageDisplay {
    fn show(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let window = self.window.as_ref().ok_or("display window is closed")?;
        let info = match frame.order() {
            ChannelOrder::Bgr => ImageInfo::bgr8(frame.width(), frame.height()),
            ChannelOrder::Rgb => ImageInfo::rgb8(frame.width(), frame.height()),
        };
        let view = ImageView::new(info, frame.data());
        window.set_image("frame", view)?;
        Ok(())
    }

    fn poll_key(&mut self) -> Result<Option<char>, Box<dyn std::error::Error>> {
        let Some(events) = self.events.as_ref() else {
            return Ok(None);
        };

        let mut last = None;
        let mut disconnected = false;

        match events.recv_timeout(POLL_WAIT) {
            Ok(event) => {
                if let Some(c) = pressed_key_char(&event) {
                    last = Some(c);
                }
                // Drain whatever else queued up since the last poll; the
                // most recent press wins.
                loop {
                    match events.try_recv() {
                        Ok(event) => {
                            if let Some(c) = pressed_key_char(&event) {
                                last = Some(c);
                            }
                        }
                        Err(TryRecvError::Empty) => break,
                        Err(TryRecvError::Disconnected) => {
                            disconnected = true;
                            break;
                        }
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => disconnected = true,
        }

        if disconnected {
            self.events = None;
        }
        Ok(last)
    }

    fn close(&mut self) {
        self.events = None;
        if let Some(window) = self.window.take() {
            window.run_function(|window| {
                window.destroy();
            });
        }
    }
}

fn pressed_key_char(event: &WindowEvent) -> Option<char> {
    if let WindowEvent::KeyboardInput(event) = event {
        if event.input.state.is_pressed() {
            return event.input.key_code.and_then(key_char);
        }
    }
    None
}

/// Maps a keyboard key to the character the loop compares against.
fn key_char(key: VirtualKeyCode) -> Option<char> {
    let c = match key {
        VirtualKeyCode::A => 'a',
        VirtualKeyCode::B => 'b',
        VirtualKeyCode::C => 'c',
        VirtualKeyCode::D => 'd',
        VirtualKeyCode::E => 'e',
        VirtualKeyCode::F => 'f',
        VirtualKeyCode::G => 'g',
        VirtualKeyCode::H => 'h',
        VirtualKeyCode::I => 'i',
        VirtualKeyCode::J => 'j',
        VirtualKeyCode::K => 'k',
        VirtualKeyCode::L => 'l',
        VirtualKeyCode::M => 'm',
        VirtualKeyCode::N => 'n',
        VirtualKeyCode::O => 'o',
        VirtualKeyCode::P => 'p',
        VirtualKeyCode::Q => 'q',
        VirtualKeyCode::R => 'r',
        VirtualKeyCode::S => 's',
        VirtualKeyCode::T => 't',
        VirtualKeyCode::U => 'u',
        VirtualKeyCode::V => 'v',
        VirtualKeyCode::W => 'w',
        VirtualKeyCode::X => 'x',
        VirtualKeyCode::Y => 'y',
        VirtualKeyCode::Z => 'z',
        VirtualKeyCode::Escape => '\u{1b}',
        _ => return None,
    };
    Some(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_char_letters() {
        assert_eq!(key_char(VirtualKeyCode::Q), Some('q'));
        assert_eq!(key_char(VirtualKeyCode::A), Some('a'));
        assert_eq!(key_char(VirtualKeyCode::Z), Some('z'));
    }

    #[test]
    fn test_key_char_escape() {
        assert_eq!(key_char(VirtualKeyCode::Escape), Some('\u{1b}'));
    }

    #[test]
    fn test_key_char_unmapped() {
        assert_eq!(key_char(VirtualKeyCode::F1), None);
        assert_eq!(key_char(VirtualKeyCode::LShift), None);
    }
}
