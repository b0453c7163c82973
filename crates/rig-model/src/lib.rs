//! FIP Rig Model
//!
//! Defines the data contracts shared by every FIP stage:
//! - **Geometry:** Points, circular regions of interest, pixel rectangles
//! - **Frames:** Typed image rasters and per-frame acquisition metadata
//! - **ROI settings:** Background and signal circles for each camera
//! - **Devices:** Camera acquisition settings and light source calibration
//!
//! All coordinates are in sensor pixels after binning, with `(0, 0)` at
//! the top-left corner of the frame.

pub mod camera;
pub mod frame;
pub mod geometry;
pub mod light_source;
pub mod roi;

pub use camera::*;
pub use frame::*;
pub use geometry::*;
pub use light_source::*;
pub use roi::*;
