use ndarray::{ArrayView3, ArrayViewMut3};

/// Interleaved 3-channel pixel order of a frame buffer.
///
/// Decoders produce BGR (the display-native order); the detector expects
/// RGB. The loop converts at the detection boundary and back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelOrder {
    Bgr,
    Rgb,
}

/// A single video frame: contiguous interleaved bytes in row-major order.
///
/// The frame knows its own channel order; `convert_to` swaps channels in
/// place and converting to the current order is a no-op, so a forward and
/// backward conversion restores the exact byte content.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    order: ChannelOrder,
    index: usize,
}

impl Frame {
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        channels: u8,
        order: ChannelOrder,
        index: usize,
    ) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            order,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Converts the frame to the given channel order in place.
    ///
    /// BGR ↔ RGB is a first/third channel swap per pixel; requesting the
    /// current order leaves the buffer untouched.
    pub fn convert_to(&mut self, order: ChannelOrder) {
        if self.order == order {
            return;
        }
        debug_assert_eq!(self.channels, 3, "channel swap requires 3 channels");
        for pixel in self.data.chunks_exact_mut(3) {
            pixel.swap(0, 2);
        }
        self.order = order;
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bgr_frame(data: Vec<u8>, width: u32, height: u32) -> Frame {
        Frame::new(data, width, height, 3, ChannelOrder::Bgr, 0)
    }

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 3, ChannelOrder::Bgr, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.order(), ChannelOrder::Bgr);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    fn test_data_mut_allows_modification() {
        let mut frame = bgr_frame(vec![0u8; 6], 2, 1);
        frame.data_mut()[0] = 255;
        assert_eq!(frame.data()[0], 255);
    }

    #[test]
    fn test_convert_swaps_first_and_third_channel() {
        // One pixel: B=10, G=20, R=30
        let mut frame = bgr_frame(vec![10, 20, 30], 1, 1);
        frame.convert_to(ChannelOrder::Rgb);
        assert_eq!(frame.order(), ChannelOrder::Rgb);
        assert_eq!(frame.data(), &[30, 20, 10]);
    }

    #[test]
    fn test_convert_to_current_order_is_noop() {
        let data = vec![1, 2, 3, 4, 5, 6];
        let mut frame = bgr_frame(data.clone(), 2, 1);
        frame.convert_to(ChannelOrder::Bgr);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    fn test_convert_round_trip_restores_bytes() {
        let data: Vec<u8> = (0..24).collect(); // 2x4x3
        let mut frame = bgr_frame(data.clone(), 4, 2);
        frame.convert_to(ChannelOrder::Rgb);
        frame.convert_to(ChannelOrder::Bgr);
        assert_eq!(frame.order(), ChannelOrder::Bgr);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    fn test_convert_preserves_dimensions_and_index() {
        let mut frame = Frame::new(vec![0u8; 12], 2, 2, 3, ChannelOrder::Bgr, 7);
        frame.convert_to(ChannelOrder::Rgb);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.index(), 7);
    }

    #[test]
    fn test_clone_is_independent() {
        let frame = bgr_frame(vec![100u8; 12], 2, 2);
        let mut cloned = frame.clone();
        cloned.data_mut()[0] = 0;
        assert_eq!(frame.data()[0], 100);
        assert_eq!(cloned.data()[0], 0);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        let data = vec![0u8; 10]; // wrong size for 2x2x3
        Frame::new(data, 2, 2, 3, ChannelOrder::Bgr, 0);
    }

    #[test]
    fn test_as_ndarray_shape() {
        let frame = bgr_frame(vec![0u8; 24], 4, 2);
        let arr = frame.as_ndarray();
        assert_eq!(arr.shape(), &[2, 4, 3]); // (height, width, channels)
    }

    #[test]
    fn test_as_ndarray_mut_modification() {
        let mut frame = bgr_frame(vec![0u8; 12], 2, 2);
        {
            let mut arr = frame.as_ndarray_mut();
            arr[[0, 1, 2]] = 128;
        }
        assert_eq!(frame.as_ndarray()[[0, 1, 2]], 128);
    }
}
