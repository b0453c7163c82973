//! Compute region activity for a raw frame file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use fip_common::config::AppConfig;
use fip_common::error::FipResult;
use fip_data_writer::{FipBinaryWriter, FipCsvWriter};
use fip_processing_core::activity::{ActivityCollection, RegionActivityReducer};
use fip_processing_core::flip::{FlipInPlace, FlipMode};
use fip_processing_core::matrix::ActivityBuffer;
use fip_processing_core::reduce::ReduceOperation;
use fip_rig_model::frame::{CameraSource, FipFrame, Frame, FrameData, PixelDepth};
use fip_rig_model::roi::RoiSettings;

pub struct ReduceArgs {
    pub frames: PathBuf,
    pub output: PathBuf,
    pub width: Option<usize>,
    pub height: Option<usize>,
    pub channels: usize,
    pub depth: String,
    pub camera: String,
    pub rois: Option<PathBuf>,
    pub operation: Option<String>,
    pub flip: Option<String>,
    pub frame_interval: i64,
    pub matrices: Option<PathBuf>,
}

enum Sink {
    Csv(FipCsvWriter),
    Binary(FipBinaryWriter),
}

impl Sink {
    fn for_path(path: PathBuf) -> FipResult<Self> {
        if path.extension().and_then(|e| e.to_str()) == Some("csv") {
            Ok(Sink::Csv(FipCsvWriter::new(path)?))
        } else {
            Ok(Sink::Binary(FipBinaryWriter::new(path)))
        }
    }

    fn write(&mut self, frame: &FipFrame, activities: &ActivityCollection) -> FipResult<()> {
        match self {
            Sink::Csv(writer) => writer.write(frame, activities),
            Sink::Binary(writer) => writer.write(frame, activities),
        }
    }
}

pub fn run(config: &AppConfig, args: ReduceArgs) -> anyhow::Result<()> {
    println!("Reducing frames from: {}", args.frames.display());

    let width = args.width.unwrap_or(config.acquisition.frame_width as usize);
    let height = args.height.unwrap_or(config.acquisition.frame_height as usize);
    let depth: PixelDepth = args.depth.parse()?;
    let camera: CameraSource = args.camera.parse()?;
    let operation: ReduceOperation = args
        .operation
        .as_deref()
        .unwrap_or(&config.acquisition.operation)
        .parse()?;
    let flip = FlipInPlace::new(args.flip.as_deref().map(str::parse::<FlipMode>).transpose()?);

    // An explicit --rois file must exist; the configured default may not.
    let settings = match &args.rois {
        Some(path) => RoiSettings::load(path),
        None => RoiSettings::resolve(None, &config.acquisition.roi_defaults_path),
    }
    .map_err(|e| anyhow::anyhow!("Failed to load ROI settings: {e}"))?;
    let circles = settings.circles_for(camera);
    println!(
        "  {} regions for {} camera, operation={}",
        circles.len(),
        camera,
        operation
    );

    let bytes = std::fs::read(&args.frames)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", args.frames.display()))?;
    let Some(frame_bytes) = Frame::sample_count(width, height, args.channels)
        .ok()
        .and_then(|samples| samples.checked_mul(depth.bytes_per_sample()))
    else {
        anyhow::bail!(
            "frame size {}x{}x{} is too large",
            width,
            height,
            args.channels
        );
    };
    if frame_bytes == 0 || bytes.len() % frame_bytes != 0 {
        anyhow::bail!(
            "{} bytes is not a whole number of {}x{}x{} {:?} frames",
            bytes.len(),
            width,
            height,
            args.channels,
            depth
        );
    }
    let frame_count = bytes.len() / frame_bytes;
    println!("  Loaded {frame_count} frames ({width}x{height})");

    let mut reducer = RegionActivityReducer::new(circles, operation)?;
    let mut sink = Sink::for_path(args.output.clone())?;
    let mut matrices = match &args.matrices {
        Some(path) => Some((
            ActivityBuffer::new(config.buffering.buffer_size, config.buffering.skip_size)?,
            BufWriter::new(File::create(path)?),
        )),
        None => None,
    };
    let mut matrices_written = 0usize;

    for (index, chunk) in bytes.chunks_exact(frame_bytes).enumerate() {
        let data = FrameData::from_le_bytes(depth, chunk)?;
        let image = flip.apply_shared(Arc::new(Frame::new(width, height, args.channels, data)?))?;
        let activities = reducer.process(&image)?;

        let frame_number = index as i64;
        let frame = FipFrame::new(image, camera, frame_number, frame_number * args.frame_interval);
        sink.write(&frame, &activities)?;

        if let Some((buffer, out)) = matrices.as_mut() {
            if let Some(matrix) = buffer.push(activities)? {
                serde_json::to_writer(&mut *out, &matrix)?;
                writeln!(out)?;
                matrices_written += 1;
            }
        }
    }

    if let Some((_, mut out)) = matrices {
        out.flush()?;
        println!("  Wrote {matrices_written} activity matrices");
    }

    tracing::debug!(mask_rebuilds = reducer.mask_rebuilds(), "Reduction finished");
    println!("  Activity written to: {}", args.output.display());
    println!("\nReduction complete.");

    Ok(())
}
