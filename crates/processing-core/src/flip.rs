//! In-place image flips for mirrored camera mounts.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use fip_common::{FipError, FipResult};
use fip_rig_model::frame::Frame;
use fip_rig_model::with_samples;

/// Flip axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlipMode {
    /// Flip around the horizontal axis (rows reversed).
    Vertical,
    /// Flip around the vertical axis (columns reversed).
    Horizontal,
    /// Both axes, i.e. a 180 degree rotation.
    Both,
}

impl std::str::FromStr for FlipMode {
    type Err = FipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vertical" => Ok(FlipMode::Vertical),
            "horizontal" => Ok(FlipMode::Horizontal),
            "both" => Ok(FlipMode::Both),
            other => Err(FipError::invalid_configuration(format!(
                "unknown flip mode '{other}'"
            ))),
        }
    }
}

/// Optional in-place flip. With no mode, frames pass through untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlipInPlace {
    pub mode: Option<FlipMode>,
}

impl FlipInPlace {
    pub fn new(mode: Option<FlipMode>) -> Self {
        Self { mode }
    }

    /// Flip `frame` in place. Only square images can be flipped.
    pub fn apply(&self, frame: &mut Frame) -> FipResult<()> {
        let Some(mode) = self.mode else {
            return Ok(());
        };
        if !frame.is_square() {
            return Err(FipError::invalid_input(format!(
                "image must be square to flip in place, got {}x{}",
                frame.width(),
                frame.height()
            )));
        }
        let (width, height, channels) = (frame.width(), frame.height(), frame.channels());
        with_samples!(frame.data_mut(), samples => {
            flip_samples(samples, width, height, channels, mode)
        });
        Ok(())
    }

    /// Flip a shared frame, cloning the pixels only if other owners exist.
    pub fn apply_shared(&self, mut frame: Arc<Frame>) -> FipResult<Arc<Frame>> {
        if self.mode.is_some() {
            self.apply(Arc::make_mut(&mut frame))?;
        }
        Ok(frame)
    }
}

fn flip_samples<T>(samples: &mut [T], width: usize, height: usize, channels: usize, mode: FlipMode) {
    let row = width * channels;
    if matches!(mode, FlipMode::Vertical | FlipMode::Both) {
        for y in 0..height / 2 {
            let (top, bottom) = samples.split_at_mut((height - 1 - y) * row);
            top[y * row..(y + 1) * row].swap_with_slice(&mut bottom[..row]);
        }
    }
    if matches!(mode, FlipMode::Horizontal | FlipMode::Both) {
        for y in 0..height {
            let base = y * row;
            for x in 0..width / 2 {
                let mirror = width - 1 - x;
                for c in 0..channels {
                    samples.swap(base + x * channels + c, base + mirror * channels + c);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fip_rig_model::frame::FrameData;

    fn grid() -> Frame {
        // 1 2 3
        // 4 5 6
        // 7 8 9
        Frame::new(3, 3, 1, FrameData::U8((1..=9).collect())).unwrap()
    }

    fn values(frame: &Frame) -> Vec<u8> {
        match frame.data() {
            FrameData::U8(v) => v.clone(),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_vertical_flip() {
        let mut frame = grid();
        FlipInPlace::new(Some(FlipMode::Vertical))
            .apply(&mut frame)
            .unwrap();
        assert_eq!(values(&frame), vec![7, 8, 9, 4, 5, 6, 1, 2, 3]);
    }

    #[test]
    fn test_horizontal_flip() {
        let mut frame = grid();
        FlipInPlace::new(Some(FlipMode::Horizontal))
            .apply(&mut frame)
            .unwrap();
        assert_eq!(values(&frame), vec![3, 2, 1, 6, 5, 4, 9, 8, 7]);
    }

    #[test]
    fn test_both_is_rotation() {
        let mut frame = grid();
        FlipInPlace::new(Some(FlipMode::Both))
            .apply(&mut frame)
            .unwrap();
        assert_eq!(values(&frame), vec![9, 8, 7, 6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_multichannel_pixels_move_together() {
        let data = FrameData::U16(vec![1, 10, 2, 20, 3, 30, 4, 40]);
        let mut frame = Frame::new(2, 2, 2, data).unwrap();
        FlipInPlace::new(Some(FlipMode::Horizontal))
            .apply(&mut frame)
            .unwrap();
        assert_eq!(frame.data(), &FrameData::U16(vec![2, 20, 1, 10, 4, 40, 3, 30]));
    }

    #[test]
    fn test_non_square_rejected_only_when_flipping() {
        let mut frame = Frame::filled_f64(4, 2, 1.0).unwrap();
        assert!(FlipInPlace::default().apply(&mut frame).is_ok());
        let err = FlipInPlace::new(Some(FlipMode::Vertical))
            .apply(&mut frame)
            .unwrap_err();
        assert!(err.is_input());
    }

    #[test]
    fn test_shared_frame_is_copied_on_write() {
        let original = Arc::new(grid());
        let kept = Arc::clone(&original);
        let flipped = FlipInPlace::new(Some(FlipMode::Vertical))
            .apply_shared(original)
            .unwrap();
        assert_eq!(values(&kept)[0], 1);
        assert_eq!(values(&flipped)[0], 7);
    }
}
