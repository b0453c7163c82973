//! Region activity: per-frame intensity inside circular regions.
//!
//! # Algorithm
//!
//! 1. **Cache check:** masks are keyed on the value of the region list and
//!    the frame size. They are rebuilt only when either changes.
//! 2. **Active copy** (Sum only): the frame is copied once into a reusable
//!    f64 buffer with every pixel outside all regions zeroed.
//! 3. **Reduce:** each region is reduced over its clipped bounding box,
//!    one value per channel.
//! 4. **Collect:** results are emitted in region order, each pointing back
//!    at the shared source frame.

use std::sync::Arc;

use fip_common::{FipError, FipResult};
use fip_rig_model::frame::Frame;
use fip_rig_model::geometry::{Circle, Point, DEFAULT_POLYGON_SEGMENTS};
use fip_rig_model::with_samples;

use crate::mask::MaskSet;
use crate::reduce::{self, ReduceOperation};

/// Activity of one region on one frame.
#[derive(Debug, Clone)]
pub struct CircleActivity {
    pub circle: Circle,
    /// One value per frame channel.
    pub activity: Vec<f64>,
    pub image: Arc<Frame>,
}

impl CircleActivity {
    /// First-channel activity, the value used for single-channel cameras.
    pub fn value(&self) -> f64 {
        self.activity.first().copied().unwrap_or(f64::NAN)
    }

    /// Region outline for drawing overlays.
    pub fn as_polygon(&self) -> Vec<Point> {
        self.circle.as_polygon(DEFAULT_POLYGON_SEGMENTS)
    }
}

impl std::fmt::Display for CircleActivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Circle: (({}, {}), {}), Activity: {:?}",
            self.circle.center.x, self.circle.center.y, self.circle.radius, self.activity
        )
    }
}

/// All region activities computed from one frame, in region order.
#[derive(Debug, Clone)]
pub struct ActivityCollection {
    image: Arc<Frame>,
    activities: Vec<CircleActivity>,
}

impl ActivityCollection {
    pub fn new(image: Arc<Frame>, activities: Vec<CircleActivity>) -> Self {
        Self { image, activities }
    }

    /// The frame the activities were computed from.
    pub fn image(&self) -> &Arc<Frame> {
        &self.image
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CircleActivity> {
        self.activities.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CircleActivity> {
        self.activities.iter()
    }

    /// Regions in output order.
    pub fn circles(&self) -> Vec<Circle> {
        self.activities.iter().map(|a| a.circle).collect()
    }

    /// First-channel value per region.
    pub fn values(&self) -> Vec<f64> {
        self.activities.iter().map(CircleActivity::value).collect()
    }
}

impl<'a> IntoIterator for &'a ActivityCollection {
    type Item = &'a CircleActivity;
    type IntoIter = std::slice::Iter<'a, CircleActivity>;

    fn into_iter(self) -> Self::IntoIter {
        self.activities.iter()
    }
}

impl std::ops::Index<usize> for ActivityCollection {
    type Output = CircleActivity;

    fn index(&self, index: usize) -> &Self::Output {
        &self.activities[index]
    }
}

/// Computes region activity for each frame.
///
/// Holds the region list, the operator, and the mask cache. Calls take
/// `&mut self`; one reducer serves one stream of frames.
#[derive(Debug, Default)]
pub struct RegionActivityReducer {
    circles: Vec<Circle>,
    operation: ReduceOperation,
    masks: Option<MaskSet>,
    /// Frame copy with pixels outside every region zeroed (Sum only).
    active: Vec<f64>,
    mask_rebuilds: u64,
}

impl RegionActivityReducer {
    pub fn new(circles: Vec<Circle>, operation: ReduceOperation) -> FipResult<Self> {
        let mut reducer = Self {
            operation,
            ..Self::default()
        };
        reducer.set_circles(circles)?;
        Ok(reducer)
    }

    pub fn circles(&self) -> &[Circle] {
        &self.circles
    }

    /// Replace the region list. Takes effect on the next frame.
    pub fn set_circles(&mut self, circles: Vec<Circle>) -> FipResult<()> {
        for (index, circle) in circles.iter().enumerate() {
            circle.validate().map_err(|e| {
                FipError::invalid_configuration(format!("region {index}: {e}"))
            })?;
        }
        self.circles = circles;
        Ok(())
    }

    pub fn operation(&self) -> ReduceOperation {
        self.operation
    }

    /// Switch the operator. Masks are kept.
    pub fn set_operation(&mut self, operation: ReduceOperation) {
        self.operation = operation;
    }

    /// How many times masks have been rasterized so far.
    pub fn mask_rebuilds(&self) -> u64 {
        self.mask_rebuilds
    }

    /// Compute one activity per region for `frame`.
    pub fn process(&mut self, frame: &Arc<Frame>) -> FipResult<ActivityCollection> {
        let (width, height, channels) = (frame.width(), frame.height(), frame.channels());
        if width == 0 || height == 0 {
            return Err(FipError::invalid_input("frame has zero width or height"));
        }

        let stale = self
            .masks
            .as_ref()
            .map_or(true, |set| !set.matches(&self.circles, width, height));
        if stale {
            tracing::debug!(
                regions = self.circles.len(),
                width,
                height,
                "Rebuilding region masks"
            );
            self.masks = None;
            self.mask_rebuilds += 1;
        }
        let circles = &self.circles;
        let masks = self
            .masks
            .get_or_insert_with(|| MaskSet::build(circles, width, height));

        let operation = self.operation;
        let values: Vec<Vec<f64>> = match operation {
            ReduceOperation::Sum => {
                let active = &mut self.active;
                active.clear();
                active.resize(width * height * channels, 0.0);
                with_samples!(frame.data(), samples => {
                    for (pixel, inside) in masks.union().iter().enumerate() {
                        if *inside {
                            let base = pixel * channels;
                            for c in 0..channels {
                                active[base + c] = samples[base + c].into();
                            }
                        }
                    }
                });
                let active: &[f64] = active;
                masks
                    .masks()
                    .iter()
                    .map(|mask| {
                        if mask.is_empty() {
                            vec![operation.empty_value(); channels]
                        } else {
                            reduce::sum(active, width, channels, mask)
                        }
                    })
                    .collect()
            }
            _ => {
                self.active.clear();
                masks
                    .masks()
                    .iter()
                    .map(|mask| operation.reduce(frame, mask))
                    .collect()
            }
        };

        let activities = self
            .circles
            .iter()
            .zip(values)
            .map(|(circle, activity)| CircleActivity {
                circle: *circle,
                activity,
                image: Arc::clone(frame),
            })
            .collect();

        Ok(ActivityCollection::new(Arc::clone(frame), activities))
    }
}
