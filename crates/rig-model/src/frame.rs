//! Image frames and per-frame acquisition metadata.
//!
//! A [`Frame`] is an interleaved, row-major raster: the sample for pixel
//! `(x, y)` and channel `c` lives at `(y * width + x) * channels + c`.
//! Frames are shared behind [`Arc`] so downstream results can point back at
//! the image they were computed from without copying pixel data.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use fip_common::{FipError, FipResult};

/// Maximum number of interleaved channels a frame may carry.
pub const MAX_CHANNELS: usize = 4;

/// Numeric depth of a single sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelDepth {
    U8,
    U16,
    I16,
    I32,
    F32,
    F64,
}

impl PixelDepth {
    /// Size of one sample in bytes.
    pub fn bytes_per_sample(self) -> usize {
        match self {
            PixelDepth::U8 => 1,
            PixelDepth::U16 | PixelDepth::I16 => 2,
            PixelDepth::I32 | PixelDepth::F32 => 4,
            PixelDepth::F64 => 8,
        }
    }

    /// Whether samples hold integer values.
    pub fn is_integer(self) -> bool {
        !matches!(self, PixelDepth::F32 | PixelDepth::F64)
    }
}

impl std::str::FromStr for PixelDepth {
    type Err = FipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "u8" => Ok(PixelDepth::U8),
            "u16" => Ok(PixelDepth::U16),
            "i16" => Ok(PixelDepth::I16),
            "i32" => Ok(PixelDepth::I32),
            "f32" => Ok(PixelDepth::F32),
            "f64" => Ok(PixelDepth::F64),
            other => Err(FipError::invalid_configuration(format!(
                "unknown pixel depth '{other}'"
            ))),
        }
    }
}

/// Typed sample storage for a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameData {
    U8(Vec<u8>),
    U16(Vec<u16>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl FrameData {
    pub fn depth(&self) -> PixelDepth {
        match self {
            FrameData::U8(_) => PixelDepth::U8,
            FrameData::U16(_) => PixelDepth::U16,
            FrameData::I16(_) => PixelDepth::I16,
            FrameData::I32(_) => PixelDepth::I32,
            FrameData::F32(_) => PixelDepth::F32,
            FrameData::F64(_) => PixelDepth::F64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FrameData::U8(s) => s.len(),
            FrameData::U16(s) => s.len(),
            FrameData::I16(s) => s.len(),
            FrameData::I32(s) => s.len(),
            FrameData::F32(s) => s.len(),
            FrameData::F64(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode little-endian bytes into samples of the given depth.
    pub fn from_le_bytes(depth: PixelDepth, bytes: &[u8]) -> FipResult<Self> {
        let size = depth.bytes_per_sample();
        if bytes.len() % size != 0 {
            return Err(FipError::invalid_input(format!(
                "{} bytes is not a whole number of {:?} samples",
                bytes.len(),
                depth
            )));
        }
        let chunks = bytes.chunks_exact(size);
        // chunks_exact guarantees each slice has exactly `size` bytes
        let data = match depth {
            PixelDepth::U8 => FrameData::U8(bytes.to_vec()),
            PixelDepth::U16 => {
                FrameData::U16(chunks.map(|c| u16::from_le_bytes([c[0], c[1]])).collect())
            }
            PixelDepth::I16 => {
                FrameData::I16(chunks.map(|c| i16::from_le_bytes([c[0], c[1]])).collect())
            }
            PixelDepth::I32 => FrameData::I32(
                chunks
                    .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            ),
            PixelDepth::F32 => FrameData::F32(
                chunks
                    .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            ),
            PixelDepth::F64 => FrameData::F64(
                chunks
                    .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                    .collect(),
            ),
        };
        Ok(data)
    }
}

/// Run `$body` with `$samples` bound to the typed sample slice of `$data`.
#[macro_export]
macro_rules! with_samples {
    ($data:expr, $samples:ident => $body:expr) => {
        match $data {
            $crate::frame::FrameData::U8($samples) => $body,
            $crate::frame::FrameData::U16($samples) => $body,
            $crate::frame::FrameData::I16($samples) => $body,
            $crate::frame::FrameData::I32($samples) => $body,
            $crate::frame::FrameData::F32($samples) => $body,
            $crate::frame::FrameData::F64($samples) => $body,
        }
    };
}

/// A single raster image from an acquisition source.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: usize,
    height: usize,
    channels: usize,
    data: FrameData,
}

impl Frame {
    /// Build a frame, checking dimensions against the sample buffer.
    pub fn new(width: usize, height: usize, channels: usize, data: FrameData) -> FipResult<Self> {
        if width == 0 || height == 0 {
            return Err(FipError::invalid_input(format!(
                "frame size {width}x{height} must be non-zero"
            )));
        }
        if channels == 0 || channels > MAX_CHANNELS {
            return Err(FipError::invalid_input(format!(
                "frame has {channels} channels, expected 1 to {MAX_CHANNELS}"
            )));
        }
        let expected = Self::sample_count(width, height, channels)?;
        if data.len() != expected {
            return Err(FipError::invalid_input(format!(
                "frame {width}x{height}x{channels} needs {expected} samples, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Samples needed for a `width` x `height` x `channels` raster.
    pub fn sample_count(width: usize, height: usize, channels: usize) -> FipResult<usize> {
        width
            .checked_mul(height)
            .and_then(|pixels| pixels.checked_mul(channels))
            .ok_or_else(|| {
                FipError::invalid_input(format!(
                    "frame {width}x{height}x{channels} is too large to address"
                ))
            })
    }

    /// Single-channel frame filled with `value`.
    pub fn filled_f64(width: usize, height: usize, value: f64) -> FipResult<Self> {
        let count = Self::sample_count(width, height, 1)?;
        Self::new(width, height, 1, FrameData::F64(vec![value; count]))
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn depth(&self) -> PixelDepth {
        self.data.depth()
    }

    pub fn data(&self) -> &FrameData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut FrameData {
        &mut self.data
    }

    /// Index of the first sample of pixel `(x, y)`.
    pub fn pixel_offset(&self, x: usize, y: usize) -> usize {
        (y * self.width + x) * self.channels
    }

    /// Sample value as f64, or `None` outside the frame.
    pub fn sample(&self, x: usize, y: usize, channel: usize) -> Option<f64> {
        if x >= self.width || y >= self.height || channel >= self.channels {
            return None;
        }
        let idx = self.pixel_offset(x, y) + channel;
        Some(with_samples!(&self.data, s => s[idx] as f64))
    }

    /// Whether the frame is square, as required for in-place flips.
    pub fn is_square(&self) -> bool {
        self.width == self.height
    }

    pub fn into_shared(self) -> Arc<Frame> {
        Arc::new(self)
    }
}

/// Which camera/excitation pairing produced a frame.
///
/// Iso and Green share one physical camera; Red has its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraSource {
    Iso = 0,
    Green = 1,
    Red = 2,
}

impl CameraSource {
    pub fn as_str(self) -> &'static str {
        match self {
            CameraSource::Iso => "Iso",
            CameraSource::Green => "Green",
            CameraSource::Red => "Red",
        }
    }
}

impl std::fmt::Display for CameraSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CameraSource {
    type Err = FipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "iso" => Ok(CameraSource::Iso),
            "green" => Ok(CameraSource::Green),
            "red" => Ok(CameraSource::Red),
            other => Err(FipError::invalid_configuration(format!(
                "unknown camera source '{other}'"
            ))),
        }
    }
}

/// A frame of fiber photometry data with its acquisition metadata.
#[derive(Debug, Clone)]
pub struct FipFrame {
    pub image: Arc<Frame>,
    /// `None` for frames that did not come from a tagged camera stream.
    pub source: Option<CameraSource>,
    /// Hardware frame counter.
    pub frame_number: i64,
    /// Hardware timestamp.
    pub frame_time: i64,
}

impl FipFrame {
    pub fn new(
        image: Arc<Frame>,
        source: CameraSource,
        frame_number: i64,
        frame_time: i64,
    ) -> Self {
        Self {
            image,
            source: Some(source),
            frame_number,
            frame_time,
        }
    }

    /// Wrap a bare image with no source and zeroed counters.
    pub fn untagged(image: Arc<Frame>) -> Self {
        Self {
            image,
            source: None,
            frame_number: 0,
            frame_time: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_rejects_bad_shapes() {
        assert!(Frame::new(0, 10, 1, FrameData::U8(vec![])).is_err());
        assert!(Frame::new(2, 2, 5, FrameData::U8(vec![0; 20])).is_err());
        let err = Frame::new(2, 2, 1, FrameData::U8(vec![0; 3])).unwrap_err();
        assert!(err.is_input());
        assert!(Frame::new(2, 2, 1, FrameData::U8(vec![0; 4])).is_ok());
    }

    #[test]
    fn test_oversized_dimensions_are_input_errors() {
        let err = Frame::new(usize::MAX / 2, 3, 1, FrameData::U8(vec![0; 4])).unwrap_err();
        assert!(err.is_input());
        assert!(Frame::new(usize::MAX, 1, 2, FrameData::U8(vec![0; 4]))
            .unwrap_err()
            .is_input());
        assert!(Frame::filled_f64(usize::MAX, 2, 0.0).unwrap_err().is_input());
        assert_eq!(Frame::sample_count(4, 3, 2).unwrap(), 24);
    }

    #[test]
    fn test_sample_indexing_is_interleaved() {
        let data = FrameData::U16(vec![1, 2, 3, 4, 5, 6, 7, 8]);
        let frame = Frame::new(2, 2, 2, data).unwrap();
        assert_eq!(frame.sample(0, 0, 1), Some(2.0));
        assert_eq!(frame.sample(1, 0, 0), Some(3.0));
        assert_eq!(frame.sample(0, 1, 0), Some(5.0));
        assert_eq!(frame.sample(1, 1, 1), Some(8.0));
        assert_eq!(frame.sample(2, 0, 0), None);
        assert_eq!(frame.sample(0, 0, 2), None);
    }

    #[test]
    fn test_from_le_bytes() {
        let bytes = [0x01, 0x00, 0xff, 0x03];
        let data = FrameData::from_le_bytes(PixelDepth::U16, &bytes).unwrap();
        assert_eq!(data, FrameData::U16(vec![1, 1023]));

        assert!(FrameData::from_le_bytes(PixelDepth::U16, &[0x01]).is_err());
    }

    #[test]
    fn test_depth_parsing() {
        assert_eq!("U16".parse::<PixelDepth>().unwrap(), PixelDepth::U16);
        assert!("u12".parse::<PixelDepth>().is_err());
        assert!(PixelDepth::I32.is_integer());
        assert!(!PixelDepth::F32.is_integer());
    }

    #[test]
    fn test_camera_source_roundtrip() {
        for source in [CameraSource::Iso, CameraSource::Green, CameraSource::Red] {
            assert_eq!(source.as_str().parse::<CameraSource>().unwrap(), source);
        }
        assert!("blue".parse::<CameraSource>().is_err());
    }

    #[test]
    fn test_untagged_frame() {
        let image = Frame::filled_f64(4, 4, 1.0).unwrap().into_shared();
        let frame = FipFrame::untagged(image);
        assert!(frame.source.is_none());
        assert_eq!(frame.frame_number, 0);
        assert_eq!(frame.frame_time, 0);
    }
}
