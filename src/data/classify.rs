//! Threshold-based status classification.
//!
//! Each parameter has a [`Band`]: values outside the critical bounds are
//! `Critical`, values outside the warning bounds are `Warning`, everything
//! else is `Good`. Comparisons are strict, so a value sitting exactly on a
//! bound belongs to the better status.

use serde::{Deserialize, Serialize};

use aquawatch_types::{Parameter, Status};

/// Warning and critical bounds for one parameter.
///
/// A `None` bound is open; turbidity, for instance, has no lower bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub warning_low: Option<f64>,
    pub warning_high: Option<f64>,
    pub critical_low: Option<f64>,
    pub critical_high: Option<f64>,
}

impl Band {
    /// A band bounded on both sides.
    pub const fn two_sided(
        critical_low: f64,
        warning_low: f64,
        warning_high: f64,
        critical_high: f64,
    ) -> Self {
        Self {
            warning_low: Some(warning_low),
            warning_high: Some(warning_high),
            critical_low: Some(critical_low),
            critical_high: Some(critical_high),
        }
    }

    /// A band bounded only from above.
    pub const fn upper(warning_high: f64, critical_high: f64) -> Self {
        Self {
            warning_low: None,
            warning_high: Some(warning_high),
            critical_low: None,
            critical_high: Some(critical_high),
        }
    }

    /// Classify a value against this band.
    pub fn classify(&self, value: f64) -> Status {
        if outside(value, self.critical_low, self.critical_high) {
            Status::Critical
        } else if outside(value, self.warning_low, self.warning_high) {
            Status::Warning
        } else {
            Status::Good
        }
    }

    /// Check that the bounds nest: `critical_low <= warning_low <= warning_high <= critical_high`.
    ///
    /// Open bounds are skipped.
    pub fn validate(&self) -> Result<(), InvalidBand> {
        let ordered = [
            ("critical_low", self.critical_low),
            ("warning_low", self.warning_low),
            ("warning_high", self.warning_high),
            ("critical_high", self.critical_high),
        ];

        for (name, bound) in ordered {
            if let Some(v) = bound {
                if !v.is_finite() {
                    return Err(InvalidBand(format!("{} must be a finite number", name)));
                }
            }
        }

        let present: Vec<(&str, f64)> =
            ordered.iter().filter_map(|(name, b)| b.map(|v| (*name, v))).collect();
        for pair in present.windows(2) {
            let (lo_name, lo) = pair[0];
            let (hi_name, hi) = pair[1];
            if lo > hi {
                return Err(InvalidBand(format!(
                    "{} ({}) must not exceed {} ({})",
                    lo_name, lo, hi_name, hi
                )));
            }
        }

        Ok(())
    }
}

fn outside(value: f64, low: Option<f64>, high: Option<f64>) -> bool {
    low.is_some_and(|lo| value < lo) || high.is_some_and(|hi| value > hi)
}

/// Bounds that do not nest.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct InvalidBand(pub String);

/// The set of bands used to classify every parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdPolicy {
    pub ph: Band,
    pub temperature: Band,
    pub turbidity: Band,
    pub tds: Band,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            ph: Band::two_sided(6.5, 6.8, 8.2, 8.5),
            temperature: Band::two_sided(15.0, 20.0, 30.0, 35.0),
            turbidity: Band::upper(1.0, 5.0),
            tds: Band::two_sided(50.0, 100.0, 500.0, 1000.0),
        }
    }
}

impl ThresholdPolicy {
    /// The band for a parameter.
    pub fn band(&self, parameter: Parameter) -> &Band {
        match parameter {
            Parameter::Ph => &self.ph,
            Parameter::Temperature => &self.temperature,
            Parameter::Turbidity => &self.turbidity,
            Parameter::Tds => &self.tds,
        }
    }

    /// Mutable access to the band for a parameter.
    pub fn band_mut(&mut self, parameter: Parameter) -> &mut Band {
        match parameter {
            Parameter::Ph => &mut self.ph,
            Parameter::Temperature => &mut self.temperature,
            Parameter::Turbidity => &mut self.turbidity,
            Parameter::Tds => &mut self.tds,
        }
    }

    /// Classify a value for a parameter.
    ///
    /// Non-finite values cannot be trusted and classify as `Critical`.
    pub fn classify(&self, parameter: Parameter, value: f64) -> Status {
        if !value.is_finite() {
            tracing::warn!(%parameter, value, "non-finite reading value");
            return Status::Critical;
        }
        self.band(parameter).classify(value)
    }

    /// Validate every band, naming the parameter at fault.
    pub fn validate(&self) -> Result<(), (Parameter, InvalidBand)> {
        for parameter in Parameter::ALL {
            self.band(parameter).validate().map_err(|e| (parameter, e))?;
        }
        Ok(())
    }
}

/// Classify a value against the default policy.
pub fn classify(parameter: Parameter, value: f64) -> Status {
    ThresholdPolicy::default().classify(parameter, value)
}
