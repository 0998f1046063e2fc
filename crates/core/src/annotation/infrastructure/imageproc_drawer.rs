use image::{ImageBuffer, Rgb};
use imageproc::drawing::{draw_cross_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::annotation::domain::detection_drawer::DetectionDrawer;
use crate::shared::detection::Detection;
use crate::shared::frame::{ChannelOrder, Frame};

/// Bounding box color, as RGB.
const BOX_COLOR: [u8; 3] = [0, 255, 0];

/// Keypoint cross color, as RGB.
const KEYPOINT_COLOR: [u8; 3] = [255, 0, 0];

/// Box outline thickness in pixels.
const BOX_THICKNESS: i32 = 2;

/// Draws a hollow bounding rectangle and a cross per facial keypoint using
/// `imageproc` primitives over a borrowed view of the frame bytes.
///
/// Colors are declared as RGB and reordered to the frame's channel order at
/// draw time, so annotations render correctly on BGR and RGB frames alike.
pub struct ImageprocDrawer {
    box_color: [u8; 3],
    keypoint_color: [u8; 3],
    thickness: i32,
}

impl ImageprocDrawer {
    pub fn new() -> Self {
        Self {
            box_color: BOX_COLOR,
            keypoint_color: KEYPOINT_COLOR,
            thickness: BOX_THICKNESS,
        }
    }
}

impl Default for ImageprocDrawer {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionDrawer for ImageprocDrawer {
    fn draw(
        &self,
        frame: &mut Frame,
        detection: &Detection,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let width = frame.width();
        let height = frame.height();
        let order = frame.order();
        let box_color = channel_color(self.box_color, order);
        let keypoint_color = channel_color(self.keypoint_color, order);

        let mut canvas: ImageBuffer<Rgb<u8>, &mut [u8]> =
            ImageBuffer::from_raw(width, height, frame.data_mut())
                .ok_or("frame buffer size does not match its dimensions")?;

        for t in 0..self.thickness {
            let w = detection.width - 2 * t;
            let h = detection.height - 2 * t;
            if w <= 0 || h <= 0 {
                break;
            }
            let rect = Rect::at(detection.x + t, detection.y + t).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(&mut canvas, rect, box_color);
        }

        for kp in &detection.keypoints {
            draw_cross_mut(&mut canvas, keypoint_color, kp.x, kp.y);
        }

        Ok(())
    }
}

/// Reorders an RGB color constant to the frame's channel order.
fn channel_color(rgb: [u8; 3], order: ChannelOrder) -> Rgb<u8> {
    match order {
        ChannelOrder::Rgb => Rgb(rgb),
        ChannelOrder::Bgr => Rgb([rgb[2], rgb[1], rgb[0]]),
    }
}
