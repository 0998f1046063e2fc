//! BlazeFace face detector using ONNX Runtime via `ort`.
//!
//! Supports the two published model variants: short-range (close-up faces,
//! 128×128 input) and full-range (faces further from the camera, 192×192
//! input). Variant choice and the minimum confidence threshold are the only
//! two recognized detector options.

use std::path::Path;

use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::detection::{Detection, Keypoint};
use crate::shared::frame::{ChannelOrder, Frame};

/// Default confidence threshold.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.3;

/// Facial keypoints per detection (eyes, nose tip, mouth center, ears).
const NUM_KEYPOINTS: usize = 6;

/// Which BlazeFace variant to run.
///
/// Mirrors the upstream numeric option: 0 selects short-range, 1 full-range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelSelection {
    ShortRange,
    FullRange,
}

impl ModelSelection {
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::ShortRange),
            1 => Some(Self::FullRange),
            _ => None,
        }
    }

    /// Square model input resolution.
    pub fn input_size(self) -> u32 {
        match self {
            Self::ShortRange => 128,
            Self::FullRange => 192,
        }
    }

    /// `(stride, anchors_per_cell)` pairs defining the anchor grid.
    fn anchor_layout(self) -> &'static [(usize, usize)] {
        match self {
            Self::ShortRange => &[(8, 2), (16, 6)],
            Self::FullRange => &[(4, 1)],
        }
    }

    /// Total anchor count: 896 short-range, 2304 full-range.
    pub fn num_anchors(self) -> usize {
        self.anchor_layout()
            .iter()
            .map(|&(stride, num)| {
                let grid = self.input_size() as usize / stride;
                grid * grid * num
            })
            .sum()
    }
}

/// BlazeFace face detector backed by an ONNX Runtime session.
pub struct OnnxBlazefaceDetector {
    session: ort::session::Session,
    selection: ModelSelection,
    min_confidence: f64,
    anchors: Vec<[f32; 2]>,
}

impl OnnxBlazefaceDetector {
    /// Load a BlazeFace ONNX model for the given variant.
    ///
    /// `min_confidence` is the post-sigmoid score threshold in [0, 1].
    pub fn new(
        model_path: &Path,
        selection: ModelSelection,
        min_confidence: f64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?.commit_from_file(model_path)?;
        let anchors = generate_anchors(selection);
        Ok(Self {
            session,
            selection,
            min_confidence,
            anchors,
        })
    }

    pub fn selection(&self) -> ModelSelection {
        self.selection
    }
}

impl FaceDetector for OnnxBlazefaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
        if frame.order() != ChannelOrder::Rgb {
            return Err("BlazeFace detector requires RGB frames".into());
        }

        let fw = frame.width();
        let fh = frame.height();
        let input_size = self.selection.input_size();

        // 1. Preprocess: resize to model input, normalize to [0,1], NCHW
        let input_tensor = preprocess(frame, input_size);

        // 2. Inference
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        // BlazeFace outputs two tensors:
        // - regressors: [1, N, 16] (box deltas + 6 keypoints)
        // - classificators: [1, N, 1] (raw confidence scores)
        if outputs.len() < 2 {
            return Err(
                format!("BlazeFace model expected 2 outputs, got {}", outputs.len()).into(),
            );
        }

        let regressors = outputs[0].try_extract_array::<f32>()?;
        let scores = outputs[1].try_extract_array::<f32>()?;
        let reg_data = regressors.as_slice().ok_or("Cannot get regressor slice")?;
        let score_data = scores.as_slice().ok_or("Cannot get score slice")?;

        // 3. Decode anchors into clamped detections, filter by confidence
        let mut candidates = Vec::new();
        let num_anchors = self.anchors.len().min(score_data.len());

        for (i, &raw_score) in score_data.iter().enumerate().take(num_anchors) {
            let score = sigmoid(raw_score);
            if (score as f64) < self.min_confidence {
                continue;
            }

            let reg_offset = i * 16;
            if reg_offset + 16 > reg_data.len() {
                break;
            }

            candidates.push(decode_detection(
                &self.anchors[i],
                &reg_data[reg_offset..reg_offset + 16],
                input_size,
                fw,
                fh,
                score as f64,
            ));
        }

        // 4. NMS
        Ok(nms(candidates, NMS_IOU_THRESH))
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Resize frame to `size × size` and normalize to [0,1] NCHW float32.
fn preprocess(frame: &Frame, size: u32) -> ndarray::Array4<f32> {
    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;
    let s = size as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, s, s));

    for y in 0..s {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / s as f64) as usize).min(src_h - 1);
        for x in 0..s {
            let src_x = (((x as f64 + 0.5) * src_w as f64 / s as f64) as usize).min(src_w - 1);
            for c in 0..3 {
                tensor[[0, c, y, x]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    tensor
}

// ---------------------------------------------------------------------------
// Anchor generation
// ---------------------------------------------------------------------------

/// Generate the anchor grid for the selected model variant.
///
/// Short-range uses 16×16 and 8×8 feature maps with 2 and 6 anchors per
/// cell; full-range a single 48×48 map with 1 anchor per cell.
fn generate_anchors(selection: ModelSelection) -> Vec<[f32; 2]> {
    let mut anchors = Vec::with_capacity(selection.num_anchors());

    for &(stride, num) in selection.anchor_layout() {
        let grid_size = selection.input_size() as usize / stride;
        for y in 0..grid_size {
            for x in 0..grid_size {
                let cx = (x as f32 + 0.5) / grid_size as f32;
                let cy = (y as f32 + 0.5) / grid_size as f32;
                for _ in 0..num {
                    anchors.push([cx, cy]);
                }
            }
        }
    }

    anchors
}

// ---------------------------------------------------------------------------
// Decoding + NMS
// ---------------------------------------------------------------------------

/// Decodes one anchor's 16-float regressor row into a frame-space detection.
///
/// Corners are clamped to the frame bounds with `x1 <= x2` and `y1 <= y2`,
/// so width and height are never negative; a box decoded entirely outside
/// the frame collapses to a zero-area detection at the edge.
fn decode_detection(
    anchor: &[f32; 2],
    reg: &[f32],
    input_size: u32,
    fw: u32,
    fh: u32,
    score: f64,
) -> Detection {
    // Box center + size relative to anchor, in input-normalized units
    let cx = anchor[0] + reg[0] / input_size as f32;
    let cy = anchor[1] + reg[1] / input_size as f32;
    let w = reg[2] / input_size as f32;
    let h = reg[3] / input_size as f32;

    let x1 = ((cx - w / 2.0) * fw as f32).clamp(0.0, fw as f32);
    let y1 = ((cy - h / 2.0) * fh as f32).clamp(0.0, fh as f32);
    let x2 = ((cx + w / 2.0) * fw as f32).clamp(x1, fw as f32);
    let y2 = ((cy + h / 2.0) * fh as f32).clamp(y1, fh as f32);

    let mut keypoints = Vec::with_capacity(NUM_KEYPOINTS);
    for k in 0..NUM_KEYPOINTS {
        let kx = anchor[0] + reg[4 + 2 * k] / input_size as f32;
        let ky = anchor[1] + reg[5 + 2 * k] / input_size as f32;
        keypoints.push(Keypoint {
            x: (kx * fw as f32).clamp(0.0, fw as f32 - 1.0) as i32,
            y: (ky * fh as f32).clamp(0.0, fh as f32 - 1.0) as i32,
        });
    }

    Detection {
        x: x1 as i32,
        y: y1 as i32,
        width: (x2 - x1) as i32,
        height: (y2 - y1) as i32,
        confidence: score,
        keypoints,
    }
}

/// Greedy non-maximum suppression over [`Detection::iou`].
fn nms(mut dets: Vec<Detection>, iou_thresh: f64) -> Vec<Detection> {
    dets.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<Detection> = Vec::new();
    for det in dets {
        if keep.iter().all(|kept| kept.iou(&det) <= iou_thresh) {
            keep.push(det);
        }
    }
    keep
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(x: i32, y: i32, w: i32, h: i32, confidence: f64) -> Detection {
        Detection {
            x,
            y,
            width: w,
            height: h,
            confidence,
            keypoints: Vec::new(),
        }
    }

    #[test]
    fn test_model_selection_from_index() {
        assert_eq!(
            ModelSelection::from_index(0),
            Some(ModelSelection::ShortRange)
        );
        assert_eq!(
            ModelSelection::from_index(1),
            Some(ModelSelection::FullRange)
        );
        assert_eq!(ModelSelection::from_index(2), None);
    }

    #[test]
    fn test_short_range_anchor_count() {
        // 16×16 grid × 2 anchors + 8×8 grid × 6 anchors = 512 + 384 = 896
        assert_eq!(ModelSelection::ShortRange.num_anchors(), 896);
        assert_eq!(generate_anchors(ModelSelection::ShortRange).len(), 896);
    }

    #[test]
    fn test_full_range_anchor_count() {
        // 48×48 grid × 1 anchor = 2304
        assert_eq!(ModelSelection::FullRange.num_anchors(), 2304);
        assert_eq!(generate_anchors(ModelSelection::FullRange).len(), 2304);
    }

    #[test]
    fn test_anchors_in_unit_range() {
        for selection in [ModelSelection::ShortRange, ModelSelection::FullRange] {
            for a in generate_anchors(selection) {
                assert!(a[0] > 0.0 && a[0] < 1.0);
                assert!(a[1] > 0.0 && a[1] < 1.0);
            }
        }
    }

    #[test]
    fn test_input_sizes() {
        assert_eq!(ModelSelection::ShortRange.input_size(), 128);
        assert_eq!(ModelSelection::FullRange.input_size(), 192);
    }

    #[test]
    fn test_preprocess_shape() {
        let data = vec![128u8; 200 * 100 * 3];
        let frame = Frame::new(data, 200, 100, 3, ChannelOrder::Rgb, 0);
        let tensor = preprocess(&frame, 128);
        assert_eq!(tensor.shape(), &[1, 3, 128, 128]);
    }

    #[test]
    fn test_preprocess_normalized() {
        let data = vec![255u8; 50 * 50 * 3];
        let frame = Frame::new(data, 50, 50, 3, ChannelOrder::Rgb, 0);
        let tensor = preprocess(&frame, 128);
        // All source pixels are 255, so resized pixels should be ~1.0
        assert!((tensor[[0, 0, 0, 0]] - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_sigmoid_zero() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_sigmoid_large_positive() {
        assert!((sigmoid(10.0) - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_sigmoid_large_negative() {
        assert!(sigmoid(-10.0) < 0.001);
    }

    #[test]
    fn test_decode_detection_in_frame() {
        let anchor = [0.5f32, 0.5];
        let mut reg = [0f32; 16];
        reg[2] = 25.6; // w = 0.2 of the input
        reg[3] = 25.6;

        let det = decode_detection(&anchor, &reg, 128, 100, 100, 0.8);
        assert_eq!(det.x, 40);
        assert_eq!(det.y, 40);
        assert_eq!(det.width, 20);
        assert_eq!(det.height, 20);
        assert!((det.confidence - 0.8).abs() < 1e-9);
        assert_eq!(det.keypoints.len(), NUM_KEYPOINTS);
    }

    #[test]
    fn test_decode_detection_beyond_edge_never_negative() {
        // Anchor near the right edge plus a large center offset pushes the
        // whole box past the frame; it must collapse, not go negative.
        let anchor = [0.95f32, 0.5];
        let mut reg = [0f32; 16];
        reg[0] = 64.0; // cx offset 0.5 of the input → cx = 1.45
        reg[2] = 12.8; // w = 0.1
        reg[3] = 12.8;

        let det = decode_detection(&anchor, &reg, 128, 640, 480, 0.9);
        assert!(det.width >= 0);
        assert!(det.height >= 0);
        assert!(det.x + det.width <= 640);
        assert!(det.y + det.height <= 480);
    }

    #[test]
    fn test_decode_detection_clamps_to_frame_bounds() {
        // Oversized box centered in the frame clips to the full frame.
        let anchor = [0.5f32, 0.5];
        let mut reg = [0f32; 16];
        reg[2] = 256.0; // w = 2.0 of the input
        reg[3] = 256.0;

        let det = decode_detection(&anchor, &reg, 128, 320, 240, 0.9);
        assert_eq!(det.x, 0);
        assert_eq!(det.y, 0);
        assert_eq!(det.width, 320);
        assert_eq!(det.height, 240);
    }

    #[test]
    fn test_nms_suppresses_overlapping() {
        let dets = vec![scored(0, 0, 100, 100, 0.9), scored(5, 5, 100, 100, 0.7)];
        let kept = nms(dets, 0.3);
        assert_eq!(kept.len(), 1);
        assert!((kept[0].confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_nms_keeps_separate() {
        let dets = vec![scored(0, 0, 50, 50, 0.9), scored(200, 200, 50, 50, 0.8)];
        let kept = nms(dets, 0.3);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_nms_highest_confidence_first() {
        let dets = vec![
            scored(200, 200, 50, 50, 0.6),
            scored(0, 0, 100, 100, 0.7),
            scored(5, 5, 100, 100, 0.9),
        ];
        let kept = nms(dets, 0.3);
        assert_eq!(kept.len(), 2);
        assert!((kept[0].confidence - 0.9).abs() < 1e-9);
    }
}
