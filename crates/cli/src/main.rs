use std::path::PathBuf;
use std::process;

use clap::Parser;

use faceview_core::annotation::domain::detection_drawer::DetectionDrawer;
use faceview_core::annotation::infrastructure::imageproc_drawer::ImageprocDrawer;
use faceview_core::detection::domain::face_detector::FaceDetector;
use faceview_core::detection::infrastructure::model_resolver;
use faceview_core::detection::infrastructure::onnx_blazeface_detector::{
    ModelSelection, OnnxBlazefaceDetector,
};
use faceview_core::display::domain::frame_display::FrameDisplay;
use faceview_core::display::infrastructure::show_image_display::ShowImageDisplay;
use faceview_core::pipeline::view_faces_use_case::{StopReason, ViewFacesUseCase};
use faceview_core::shared::constants::{
    DEFAULT_WINDOW_NAME, FULL_RANGE_MODEL_NAME, FULL_RANGE_MODEL_URL, SHORT_RANGE_MODEL_NAME,
    SHORT_RANGE_MODEL_URL,
};
use faceview_core::video::domain::video_reader::VideoReader;
use faceview_core::video::infrastructure::ffmpeg_reader::FfmpegReader;

/// Face detection viewer for video files.
#[derive(Parser)]
#[command(name = "faceview")]
struct Cli {
    /// Input video file.
    input: PathBuf,

    /// Detection model variant: 0 = short-range, 1 = full-range.
    #[arg(long, default_value = "1")]
    model_selection: u8,

    /// Minimum detection confidence threshold (0.0-1.0).
    #[arg(long, default_value = "0.5")]
    confidence: f64,

    /// Local ONNX model file (skips the model download).
    #[arg(long)]
    model: Option<PathBuf>,

    /// Display window title.
    #[arg(long, default_value = DEFAULT_WINDOW_NAME)]
    window_name: String,
}

#[show_image::main]
fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let selection = ModelSelection::from_index(cli.model_selection)
        .expect("model selection validated above");
    let detector = build_detector(&cli, selection)?;
    let drawer: Box<dyn DetectionDrawer> = Box::new(ImageprocDrawer::new());
    let display: Box<dyn FrameDisplay> = Box::new(ShowImageDisplay::new(&cli.window_name)?);

    let mut reader: Box<dyn VideoReader> = Box::new(FfmpegReader::new());
    let metadata = reader.open(&cli.input)?;
    log::info!(
        "Opened {} ({}x{}, {:.1} fps, codec {})",
        cli.input.display(),
        metadata.width,
        metadata.height,
        metadata.fps,
        metadata.codec
    );

    let mut use_case = ViewFacesUseCase::new(reader, detector, drawer, display);
    match use_case.execute()? {
        StopReason::QuitRequested => log::info!("Stopped: quit key pressed"),
        StopReason::StreamEnded => log::info!("Stopped: stream ended"),
    }

    Ok(())
}

fn build_detector(
    cli: &Cli,
    selection: ModelSelection,
) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    let model_path = match &cli.model {
        Some(path) => path.clone(),
        None => {
            let (name, url) = match selection {
                ModelSelection::ShortRange => (SHORT_RANGE_MODEL_NAME, SHORT_RANGE_MODEL_URL),
                ModelSelection::FullRange => (FULL_RANGE_MODEL_NAME, FULL_RANGE_MODEL_URL),
            };
            log::info!("Resolving model: {name}");
            let path =
                model_resolver::resolve(name, url, None, Some(Box::new(download_progress)))?;
            eprintln!();
            path
        }
    };

    Ok(Box::new(OnnxBlazefaceDetector::new(
        &model_path,
        selection,
        cli.confidence,
    )?))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if cli.model_selection > 1 {
        return Err(format!(
            "Model selection must be 0 (short-range) or 1 (full-range), got {}",
            cli.model_selection
        )
        .into());
    }
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    if let Some(model) = &cli.model {
        if !model.exists() {
            return Err(format!("Model file not found: {}", model.display()).into());
        }
    }
    Ok(())
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face detection model... {pct}%");
    } else {
        eprint!("\rDownloading face detection model... {downloaded} bytes");
    }
}
