//! FIP Processing Core
//!
//! Turns image frames into per-region activity values:
//! - **Masks:** Rasterize circular regions and cache them per region set
//! - **Reduction:** Sum, average, minimum, or maximum over each region
//! - **Activity:** The region activity reducer and its result collections
//! - **Matrix:** Buffer activity streams into region x time matrices
//! - **Flip:** In-place image flips for mirrored camera mounts
//!
//! This crate is pure computation: no I/O, no device access.
//! All inputs are data; all outputs are data.

pub mod activity;
pub mod flip;
pub mod mask;
pub mod matrix;
pub mod reduce;

pub use activity::{ActivityCollection, CircleActivity, RegionActivityReducer};
pub use flip::{FlipInPlace, FlipMode};
pub use mask::{MaskSet, RegionMask};
pub use matrix::{ActivityBuffer, ActivityMatrix};
pub use reduce::ReduceOperation;
