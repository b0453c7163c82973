//! Reduction operators applied over a region's pixels.
//!
//! Every operator is a pure function of the frame samples and a region
//! mask, producing one scalar per channel. Channels are reduced
//! independently; Min and Max are not combined into a magnitude.

use serde::{Deserialize, Serialize};

use fip_common::FipError;
use fip_rig_model::frame::Frame;
use fip_rig_model::with_samples;

use crate::mask::RegionMask;

/// How a region's pixels are collapsed into its activity value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReduceOperation {
    /// Sum of the pixels inside the region.
    #[default]
    Sum,
    /// Arithmetic mean of the pixels inside the region.
    #[serde(alias = "average", alias = "mean")]
    Avg,
    /// Smallest pixel inside the region.
    Min,
    /// Largest pixel inside the region.
    Max,
}

impl ReduceOperation {
    pub const ALL: [ReduceOperation; 4] = [
        ReduceOperation::Sum,
        ReduceOperation::Avg,
        ReduceOperation::Min,
        ReduceOperation::Max,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReduceOperation::Sum => "sum",
            ReduceOperation::Avg => "avg",
            ReduceOperation::Min => "min",
            ReduceOperation::Max => "max",
        }
    }

    /// Value reported for a region with no pixels inside the frame.
    ///
    /// A NaN sample inside a non-empty region makes every operator report
    /// NaN for that channel.
    pub fn empty_value(self) -> f64 {
        match self {
            ReduceOperation::Sum => 0.0,
            ReduceOperation::Avg | ReduceOperation::Min | ReduceOperation::Max => f64::NAN,
        }
    }

    /// Reduce the frame pixels under `mask`, one value per channel.
    pub fn reduce(self, frame: &Frame, mask: &RegionMask) -> Vec<f64> {
        let channels = frame.channels();
        if mask.is_empty() {
            return vec![self.empty_value(); channels];
        }
        let width = frame.width();
        with_samples!(frame.data(), samples => match self {
            ReduceOperation::Sum => sum(samples, width, channels, mask),
            ReduceOperation::Avg => average(samples, width, channels, mask),
            ReduceOperation::Min => extreme(samples, width, channels, mask, nan_min),
            ReduceOperation::Max => extreme(samples, width, channels, mask, nan_max),
        })
    }
}

impl std::fmt::Display for ReduceOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReduceOperation {
    type Err = FipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(ReduceOperation::Sum),
            "avg" | "average" | "mean" => Ok(ReduceOperation::Avg),
            "min" => Ok(ReduceOperation::Min),
            "max" => Ok(ReduceOperation::Max),
            other => Err(FipError::invalid_configuration(format!(
                "the specified reduction operation '{other}' is invalid"
            ))),
        }
    }
}

/// Call `visit(channel, value)` for every sample under the mask.
fn for_each_masked<T, F>(samples: &[T], width: usize, channels: usize, mask: &RegionMask, mut visit: F)
where
    T: Copy + Into<f64>,
    F: FnMut(usize, f64),
{
    for (x, y) in mask.pixels() {
        let base = (y * width + x) * channels;
        for (c, sample) in samples[base..base + channels].iter().enumerate() {
            visit(c, (*sample).into());
        }
    }
}

pub(crate) fn sum<T: Copy + Into<f64>>(
    samples: &[T],
    width: usize,
    channels: usize,
    mask: &RegionMask,
) -> Vec<f64> {
    let mut totals = vec![0.0; channels];
    for_each_masked(samples, width, channels, mask, |c, v| totals[c] += v);
    totals
}

fn average<T: Copy + Into<f64>>(
    samples: &[T],
    width: usize,
    channels: usize,
    mask: &RegionMask,
) -> Vec<f64> {
    let count = mask.pixel_count() as f64;
    sum(samples, width, channels, mask)
        .into_iter()
        .map(|total| total / count)
        .collect()
}

fn extreme<T: Copy + Into<f64>>(
    samples: &[T],
    width: usize,
    channels: usize,
    mask: &RegionMask,
    pick: fn(f64, f64) -> f64,
) -> Vec<f64> {
    let mut best: Vec<Option<f64>> = vec![None; channels];
    for_each_masked(samples, width, channels, mask, |c, v| {
        best[c] = Some(best[c].map_or(v, |b| pick(b, v)));
    });
    best.into_iter().map(|b| b.unwrap_or(f64::NAN)).collect()
}

// `f64::min`/`f64::max` drop NaN operands; these keep them.
fn nan_min(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.min(b)
    }
}

fn nan_max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fip_rig_model::frame::FrameData;
    use fip_rig_model::geometry::Circle;

    fn gradient_frame() -> Frame {
        // value = x + 10 * y on a 10x10 u16 frame
        let data = (0..10u16)
            .flat_map(|y| (0..10u16).map(move |x| x + 10 * y))
            .collect();
        Frame::new(10, 10, 1, FrameData::U16(data)).unwrap()
    }

    #[test]
    fn test_parse_operations() {
        assert_eq!("Sum".parse::<ReduceOperation>().unwrap(), ReduceOperation::Sum);
        assert_eq!("mean".parse::<ReduceOperation>().unwrap(), ReduceOperation::Avg);
        assert_eq!(" MAX ".parse::<ReduceOperation>().unwrap(), ReduceOperation::Max);
        let err = "median".parse::<ReduceOperation>().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_serde_names() {
        let op: ReduceOperation = serde_json::from_str("\"average\"").unwrap();
        assert_eq!(op, ReduceOperation::Avg);
        assert_eq!(serde_json::to_string(&ReduceOperation::Min).unwrap(), "\"min\"");
        assert!(serde_json::from_str::<ReduceOperation>("\"median\"").is_err());
    }

    #[test]
    fn test_operators_on_gradient() {
        let frame = gradient_frame();
        // Radius 1 around (5, 5): (5,4) (4,5) (5,5) (6,5) (5,6)
        let mask = RegionMask::rasterize(&Circle::new(5.0, 5.0, 1.0), 10, 10);
        assert_eq!(mask.pixel_count(), 5);

        assert_eq!(ReduceOperation::Sum.reduce(&frame, &mask), vec![275.0]);
        assert_eq!(ReduceOperation::Avg.reduce(&frame, &mask), vec![55.0]);
        assert_eq!(ReduceOperation::Min.reduce(&frame, &mask), vec![45.0]);
        assert_eq!(ReduceOperation::Max.reduce(&frame, &mask), vec![65.0]);
    }

    #[test]
    fn test_channels_reduce_independently() {
        // Channel 0 rises left to right, channel 1 falls.
        let data = vec![1.0, 9.0, 2.0, 8.0, 3.0, 7.0];
        let frame = Frame::new(3, 1, 2, FrameData::F64(data)).unwrap();
        let mask = RegionMask::rasterize(&Circle::new(1.0, 0.0, 1.0), 3, 1);

        assert_eq!(ReduceOperation::Min.reduce(&frame, &mask), vec![1.0, 7.0]);
        assert_eq!(ReduceOperation::Max.reduce(&frame, &mask), vec![3.0, 9.0]);
        assert_eq!(ReduceOperation::Sum.reduce(&frame, &mask), vec![6.0, 24.0]);
    }

    #[test]
    fn test_nan_sample_poisons_every_operator() {
        let data = vec![1.0, f64::NAN, 3.0];
        let frame = Frame::new(3, 1, 1, FrameData::F64(data)).unwrap();
        let mask = RegionMask::rasterize(&Circle::new(1.0, 0.0, 1.0), 3, 1);
        for op in ReduceOperation::ALL {
            assert!(op.reduce(&frame, &mask)[0].is_nan(), "{op}");
        }

        // A NaN outside the region does not leak in.
        let edge = RegionMask::rasterize(&Circle::new(0.0, 0.0, 0.0), 3, 1);
        assert_eq!(ReduceOperation::Min.reduce(&frame, &edge), vec![1.0]);
    }

    #[test]
    fn test_empty_mask_values() {
        let frame = gradient_frame();
        let mask = RegionMask::rasterize(&Circle::new(-50.0, -50.0, 3.0), 10, 10);
        assert_eq!(ReduceOperation::Sum.reduce(&frame, &mask), vec![0.0]);
        for op in [ReduceOperation::Avg, ReduceOperation::Min, ReduceOperation::Max] {
            assert!(op.reduce(&frame, &mask)[0].is_nan());
        }
    }
}
