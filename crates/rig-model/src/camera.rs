//! FIP camera acquisition settings.
//!
//! The camera SDK itself is external. This module only describes what has
//! to be written to the device: an ordered list of node settings that the
//! capture layer applies before acquisition starts.

use serde::{Deserialize, Serialize};

use fip_common::{FipError, FipResult};

use crate::geometry::Point2f;

/// Sensor readout width after binning.
pub const SENSOR_WIDTH: u32 = 200;
/// Sensor readout height after binning.
pub const SENSOR_HEIGHT: u32 = 200;
/// Horizontal and vertical binning factor.
pub const BINNING: u32 = 4;

/// A camera used for fiber photometry acquisition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FipCamera {
    /// Camera serial number.
    pub serial_number: String,
    /// Sensor gain.
    #[serde(default)]
    pub gain: f64,
    /// Offset (px).
    #[serde(default)]
    pub offset: Point2f,
}

/// Value written to a camera node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CameraValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Enum(String),
    /// Use the node's own minimum.
    Min,
    /// Use the node's own maximum.
    Max,
}

impl CameraValue {
    fn enumeration(name: &str) -> Self {
        CameraValue::Enum(name.to_string())
    }
}

/// One node assignment in an acquisition plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraSetting {
    pub node: String,
    pub value: CameraValue,
}

/// Sensor readout rectangle. All zeros selects the full sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl SensorRegion {
    pub const FULL_SENSOR: SensorRegion = SensorRegion {
        x: 0,
        y: 0,
        width: 0,
        height: 0,
    };

    pub fn new(x: u32, y: u32, width: u32, height: u32) -> FipResult<Self> {
        let region = Self {
            x,
            y,
            width,
            height,
        };
        region.validate()?;
        Ok(region)
    }

    /// A zero width or height is only allowed as the all-zero full sensor.
    pub fn validate(&self) -> FipResult<()> {
        if (self.width == 0 || self.height == 0) && *self != Self::FULL_SENSOR {
            return Err(FipError::invalid_configuration(
                "if sensor region width or height is 0, all size arguments must be 0",
            ));
        }
        Ok(())
    }

    pub fn is_full_sensor(&self) -> bool {
        *self == Self::FULL_SENSOR
    }

    /// Node settings for this region. Size is written before offset so the
    /// offset limits are already relaxed when it is applied.
    fn settings(&self) -> Vec<CameraSetting> {
        if self.is_full_sensor() {
            vec![
                setting("OffsetX", CameraValue::Int(0)),
                setting("OffsetY", CameraValue::Int(0)),
                setting("Width", CameraValue::Max),
                setting("Height", CameraValue::Max),
            ]
        } else {
            vec![
                setting("Width", CameraValue::Int(self.width as i64)),
                setting("Height", CameraValue::Int(self.height as i64)),
                setting("OffsetX", CameraValue::Int(self.x as i64)),
                setting("OffsetY", CameraValue::Int(self.y as i64)),
            ]
        }
    }
}

fn setting(node: &str, value: CameraValue) -> CameraSetting {
    CameraSetting {
        node: node.to_string(),
        value,
    }
}

impl FipCamera {
    pub fn new(serial_number: impl Into<String>) -> Self {
        Self {
            serial_number: serial_number.into(),
            gain: 0.0,
            offset: Point2f::default(),
        }
    }

    pub fn validate(&self) -> FipResult<()> {
        if self.serial_number.trim().is_empty() {
            return Err(FipError::invalid_configuration(
                "camera serial number is empty",
            ));
        }
        if !self.gain.is_finite() || self.gain < 0.0 {
            return Err(FipError::invalid_configuration(format!(
                "camera gain {} must be finite and non-negative",
                self.gain
            )));
        }
        let Point2f { x, y } = self.offset;
        if !(x.is_finite() && y.is_finite()) || x < 0.0 || y < 0.0 {
            return Err(FipError::invalid_configuration(format!(
                "camera offset ({x}, {y}) must be finite and non-negative"
            )));
        }
        Ok(())
    }

    /// Readout rectangle: a fixed-size window placed at the offset.
    pub fn sensor_region(&self) -> FipResult<SensorRegion> {
        self.validate()?;
        SensorRegion::new(
            self.offset.x as u32,
            self.offset.y as u32,
            SENSOR_WIDTH,
            SENSOR_HEIGHT,
        )
    }

    /// Ordered node settings that configure the camera for triggered
    /// 16-bit acquisition.
    pub fn acquisition_plan(&self) -> FipResult<Vec<CameraSetting>> {
        let region = self.sensor_region()?;

        let mut plan = vec![
            setting("PixelFormat", CameraValue::enumeration("Mono16")),
            setting("AdcBitDepth", CameraValue::enumeration("Bit10")),
            setting("BinningSelector", CameraValue::enumeration("All")),
            setting("BinningHorizontalMode", CameraValue::enumeration("Sum")),
            setting("BinningVerticalMode", CameraValue::enumeration("Sum")),
            setting("BinningHorizontal", CameraValue::Int(BINNING as i64)),
            setting("BinningVertical", CameraValue::Int(BINNING as i64)),
            setting("DecimationHorizontalMode", CameraValue::enumeration("Discard")),
            setting("DecimationVerticalMode", CameraValue::enumeration("Discard")),
            setting("DecimationHorizontal", CameraValue::Int(1)),
            setting("DecimationVertical", CameraValue::Int(1)),
            setting("AcquisitionFrameRateEnable", CameraValue::Bool(false)),
            setting("IspEnable", CameraValue::Bool(false)),
            setting("TriggerMode", CameraValue::enumeration("On")),
            setting("TriggerDelay", CameraValue::Min),
            setting("TriggerSelector", CameraValue::enumeration("FrameStart")),
            setting("TriggerSource", CameraValue::enumeration("Line0")),
            setting("TriggerOverlap", CameraValue::enumeration("ReadOut")),
            setting("TriggerActivation", CameraValue::enumeration("RisingEdge")),
            setting("LineInputFilterSelector", CameraValue::enumeration("Deglitch")),
            setting("ExposureAuto", CameraValue::enumeration("Off")),
            setting("ExposureMode", CameraValue::enumeration("TriggerWidth")),
            setting("BlackLevelSelector", CameraValue::enumeration("All")),
            setting("BlackLevel", CameraValue::Float(0.0)),
            setting("DeviceLinkThroughputLimit", CameraValue::Max),
            setting("GainAuto", CameraValue::enumeration("Off")),
            setting("Gain", CameraValue::Float(self.gain)),
            setting("GammaEnable", CameraValue::Bool(false)),
        ];
        plan.extend(region.settings());
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find<'a>(plan: &'a [CameraSetting], node: &str) -> &'a CameraValue {
        &plan.iter().find(|s| s.node == node).unwrap().value
    }

    #[test]
    fn test_plan_carries_gain_and_region() {
        let mut camera = FipCamera::new("21990001");
        camera.gain = 3.5;
        let plan = camera.acquisition_plan().unwrap();

        assert_eq!(find(&plan, "Gain"), &CameraValue::Float(3.5));
        assert_eq!(find(&plan, "PixelFormat"), &CameraValue::Enum("Mono16".into()));
        assert_eq!(find(&plan, "Width"), &CameraValue::Int(200));
        assert_eq!(find(&plan, "Height"), &CameraValue::Int(200));
        assert_eq!(find(&plan, "OffsetX"), &CameraValue::Int(0));

        // Gain auto must be disabled before the manual gain is applied.
        let auto = plan.iter().position(|s| s.node == "GainAuto").unwrap();
        let gain = plan.iter().position(|s| s.node == "Gain").unwrap();
        assert!(auto < gain);
    }

    #[test]
    fn test_plan_rejects_bad_camera() {
        let mut camera = FipCamera::new("21990001");
        camera.gain = -1.0;
        assert!(camera.acquisition_plan().unwrap_err().is_configuration());
        assert!(FipCamera::new("  ").acquisition_plan().is_err());
    }

    #[test]
    fn test_offset_moves_readout_window() {
        let mut camera = FipCamera::new("21990001");
        camera.offset = Point2f::new(16.0, 8.0);
        let region = camera.sensor_region().unwrap();
        assert_eq!(region, SensorRegion::new(16, 8, 200, 200).unwrap());

        camera.offset = Point2f::new(-1.0, 0.0);
        assert!(camera.sensor_region().is_err());
    }

    #[test]
    fn test_camera_value_json_shape() {
        let json = serde_json::to_string(&CameraValue::Max).unwrap();
        assert_eq!(json, r#"{"kind":"max"}"#);
        let value: CameraValue = serde_json::from_str(r#"{"kind":"int","value":4}"#).unwrap();
        assert_eq!(value, CameraValue::Int(4));
    }

    #[test]
    fn test_sensor_region_rules() {
        assert!(SensorRegion::new(0, 0, 0, 0).unwrap().is_full_sensor());
        assert!(SensorRegion::new(10, 0, 0, 0).is_err());
        assert!(SensorRegion::new(0, 0, 200, 0).is_err());
        assert!(SensorRegion::new(4, 4, 200, 200).is_ok());

        let full = SensorRegion::FULL_SENSOR.settings();
        assert_eq!(full[2].value, CameraValue::Max);
    }

    #[test]
    fn test_camera_deserialize_defaults() {
        let camera: FipCamera = serde_json::from_str(r#"{"serial_number": "abc"}"#).unwrap();
        assert_eq!(camera, FipCamera::new("abc"));
    }
}
