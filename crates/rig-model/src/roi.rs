//! Region-of-interest settings for the two FIP cameras.
//!
//! Each camera has one background circle followed by any number of signal
//! circles. When the settings are flattened into a circle list the
//! background always comes first, so downstream writers can label column
//! zero as the background.

use std::path::Path;

use serde::{Deserialize, Serialize};

use fip_common::{FipError, FipResult};

use crate::frame::CameraSource;
use crate::geometry::Circle;

/// Background and signal regions for both cameras.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoiSettings {
    /// ROI used to compute the background for the green/iso camera.
    pub camera_green_iso_background: Circle,
    /// ROI used to compute the background for the red camera.
    pub camera_red_background: Circle,
    /// Signal ROIs for the green/iso camera.
    pub camera_green_iso_roi: Vec<Circle>,
    /// Signal ROIs for the red camera.
    pub camera_red_roi: Vec<Circle>,
}

impl Default for RoiSettings {
    fn default() -> Self {
        Self {
            camera_green_iso_background: Circle::new(10.0, 10.0, 10.0),
            camera_red_background: Circle::new(10.0, 10.0, 10.0),
            camera_green_iso_roi: default_grid(),
            camera_red_roi: default_grid(),
        }
    }
}

/// 2x2 grid of r=20 circles at x, y in {50, 150}.
fn default_grid() -> Vec<Circle> {
    [50.0, 150.0]
        .into_iter()
        .flat_map(|x| {
            [50.0, 150.0]
                .into_iter()
                .map(move |y| Circle::new(x, y, 20.0))
        })
        .collect()
}

impl RoiSettings {
    /// Background followed by signal circles for the camera that produces
    /// `source`.
    pub fn circles_for(&self, source: CameraSource) -> Vec<Circle> {
        let (background, rois) = match source {
            CameraSource::Iso | CameraSource::Green => {
                (&self.camera_green_iso_background, &self.camera_green_iso_roi)
            }
            CameraSource::Red => (&self.camera_red_background, &self.camera_red_roi),
        };
        std::iter::once(*background).chain(rois.iter().copied()).collect()
    }

    /// Check every circle in the settings.
    pub fn validate(&self) -> FipResult<()> {
        self.camera_green_iso_background.validate()?;
        self.camera_red_background.validate()?;
        for circle in self.camera_green_iso_roi.iter().chain(&self.camera_red_roi) {
            circle.validate()?;
        }
        Ok(())
    }

    /// Parse settings from JSON. A literal `null` yields `None`.
    pub fn from_json(json: &str) -> FipResult<Option<Self>> {
        let settings: Option<RoiSettings> = serde_json::from_str(json)?;
        if let Some(settings) = &settings {
            settings.validate()?;
        }
        Ok(settings)
    }

    pub fn to_json(&self) -> FipResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Pick the settings to run with.
    ///
    /// Explicit settings win. Otherwise the file at `fallback_path` is
    /// read; a missing file or a `null` document falls through to the
    /// defaults. Unreadable or malformed files are errors.
    pub fn resolve(explicit: Option<&RoiSettings>, fallback_path: &Path) -> FipResult<Self> {
        if let Some(settings) = explicit {
            settings.validate()?;
            return Ok(settings.clone());
        }

        if !fallback_path.exists() {
            tracing::debug!(
                "No ROI file at {:?}, using default ROI settings",
                fallback_path
            );
            return Ok(Self::default());
        }
        Self::load(fallback_path)
    }

    /// Read settings from a file that must exist. A `null` document yields
    /// the defaults.
    pub fn load(path: &Path) -> FipResult<Self> {
        if !path.exists() {
            return Err(FipError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        match Self::from_json(&content)? {
            Some(settings) => {
                tracing::info!("Loaded ROI settings from {:?}", path);
                Ok(settings)
            }
            None => Ok(Self::default()),
        }
    }

    /// Write settings as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> FipResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Flattened circle lists per physical camera, background first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CameraRoiCircles {
    pub green_iso: Vec<Circle>,
    pub red: Vec<Circle>,
}

impl CameraRoiCircles {
    pub fn new(green_iso: Vec<Circle>, red: Vec<Circle>) -> Self {
        Self { green_iso, red }
    }

    /// Circle list for the camera that produces `source`.
    pub fn get(&self, source: CameraSource) -> &[Circle] {
        match source {
            CameraSource::Iso | CameraSource::Green => &self.green_iso,
            CameraSource::Red => &self.red,
        }
    }

    /// Rebuild settings. An empty list has no background circle, which is
    /// not representable in [`RoiSettings`] and is rejected.
    pub fn to_settings(&self) -> FipResult<RoiSettings> {
        let (green_bg, green_rois) = self.green_iso.split_first().ok_or_else(|| {
            FipError::invalid_configuration("green/iso camera has no background circle")
        })?;
        let (red_bg, red_rois) = self
            .red
            .split_first()
            .ok_or_else(|| FipError::invalid_configuration("red camera has no background circle"))?;
        Ok(RoiSettings {
            camera_green_iso_background: *green_bg,
            camera_red_background: *red_bg,
            camera_green_iso_roi: green_rois.to_vec(),
            camera_red_roi: red_rois.to_vec(),
        })
    }
}

impl From<&RoiSettings> for CameraRoiCircles {
    fn from(settings: &RoiSettings) -> Self {
        Self {
            green_iso: settings.circles_for(CameraSource::Green),
            red: settings.circles_for(CameraSource::Red),
        }
    }
}
