//! Excitation light sources and their power calibration.

use serde::{Deserialize, Serialize};

use fip_common::{FipError, FipResult};

/// Measured (duty cycle %, power mW) pairs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PowerLut {
    pub points: Vec<LutPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LutPoint {
    /// Duty cycle (0-100%).
    pub duty_cycle: f64,
    /// Measured power (mW).
    pub power: f64,
}

impl PowerLut {
    pub fn new(points: impl IntoIterator<Item = (f64, f64)>) -> Self {
        Self {
            points: points
                .into_iter()
                .map(|(duty_cycle, power)| LutPoint { duty_cycle, power })
                .collect(),
        }
    }

    /// Identity mapping: power is used directly as duty cycle.
    pub fn unity() -> Self {
        Self::new([(0.0, 0.0), (1.0, 1.0)])
    }

    pub fn validate(&self) -> FipResult<()> {
        if self.points.len() < 2 {
            return Err(FipError::invalid_configuration(
                "power calibration needs at least two points",
            ));
        }
        for point in &self.points {
            if !(0.0..=100.0).contains(&point.duty_cycle) {
                return Err(FipError::invalid_configuration(format!(
                    "calibration duty cycle {} is outside 0-100",
                    point.duty_cycle
                )));
            }
            if !point.power.is_finite() || point.power < 0.0 {
                return Err(FipError::invalid_configuration(format!(
                    "calibration power {} must be finite and non-negative",
                    point.power
                )));
            }
        }
        Ok(())
    }

    /// Duty cycle that produces `power`, by linear interpolation between
    /// the two nearest measured powers. Extrapolates past either end.
    pub fn duty_cycle_for(&self, power: f64) -> FipResult<f64> {
        self.validate()?;

        let mut sorted = self.points.clone();
        sorted.sort_by(|a, b| a.power.total_cmp(&b.power));
        if sorted.windows(2).any(|w| w[0].power == w[1].power) {
            return Err(FipError::invalid_configuration(
                "calibration has repeated power values and cannot be inverted",
            ));
        }

        // First segment whose upper end reaches `power`, or the last one.
        let segment = sorted
            .windows(2)
            .find(|w| power <= w[1].power)
            .unwrap_or(&sorted[sorted.len() - 2..]);
        let (lo, hi) = (segment[0], segment[1]);
        let t = (power - lo.power) / (hi.power - lo.power);
        Ok(lo.duty_cycle + t * (hi.duty_cycle - lo.duty_cycle))
    }
}

/// An excitation light source.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LightSource {
    /// Requested power (mW), or duty cycle when uncalibrated.
    #[serde(default)]
    pub power: f64,
    #[serde(default)]
    pub calibration: Option<PowerLut>,
}

impl LightSource {
    pub fn validate(&self) -> FipResult<()> {
        if !self.power.is_finite() || self.power < 0.0 {
            return Err(FipError::invalid_configuration(format!(
                "light source power {} must be finite and non-negative",
                self.power
            )));
        }
        match &self.calibration {
            None if self.power > 100.0 => Err(FipError::invalid_configuration(
                "power must be between 0 and 100 when no calibration is provided",
            )),
            None => Ok(()),
            Some(lut) => lut.validate(),
        }
    }

    /// Resolve the duty cycle to drive this source at.
    pub fn calibrate(&self) -> FipResult<CalibratedLightSource> {
        self.validate()?;
        let lut = self.calibration.clone().unwrap_or_else(PowerLut::unity);
        let duty_cycle = lut.duty_cycle_for(self.power)?;
        Ok(CalibratedLightSource {
            light_source: self.clone(),
            lut,
            duty_cycle,
        })
    }
}

/// A light source paired with the duty cycle that realizes its power.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibratedLightSource {
    pub light_source: LightSource,
    pub lut: PowerLut,
    pub duty_cycle: f64,
}
