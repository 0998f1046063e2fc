pub const SHORT_RANGE_MODEL_NAME: &str = "blazeface_short_range.onnx";
pub const SHORT_RANGE_MODEL_URL: &str =
    "https://github.com/faceview/faceview/releases/download/v0.1.0/blazeface_short_range.onnx";

pub const FULL_RANGE_MODEL_NAME: &str = "blazeface_full_range.onnx";
pub const FULL_RANGE_MODEL_URL: &str =
    "https://github.com/faceview/faceview/releases/download/v0.1.0/blazeface_full_range.onnx";

/// Key that ends the viewing loop.
pub const QUIT_KEY: char = 'q';

pub const DEFAULT_WINDOW_NAME: &str = "Face Detection";
