pub mod camera;
pub mod reduce;
pub mod rois;
