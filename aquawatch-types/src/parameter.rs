//! The set of water-quality parameters tracked by a sensor.

use core::fmt;
use core::str::FromStr;

/// A measured water-quality parameter.
///
/// The declaration order is the display order used everywhere (cards,
/// alerts, chart series).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Parameter {
    /// Acidity/alkalinity, unitless pH scale.
    Ph,
    /// Water temperature in degrees Celsius.
    Temperature,
    /// Cloudiness in nephelometric turbidity units.
    Turbidity,
    /// Total dissolved solids in parts per million.
    Tds,
}

impl Parameter {
    /// Every parameter, in display order.
    pub const ALL: [Parameter; 4] = [
        Parameter::Ph,
        Parameter::Temperature,
        Parameter::Turbidity,
        Parameter::Tds,
    ];

    /// Short lowercase key, matching the store's field names.
    pub fn key(&self) -> &'static str {
        match self {
            Parameter::Ph => "ph",
            Parameter::Temperature => "temperature",
            Parameter::Turbidity => "turbidity",
            Parameter::Tds => "tds",
        }
    }

    /// Measurement unit for display.
    pub fn unit(&self) -> &'static str {
        match self {
            Parameter::Ph => "pH",
            Parameter::Temperature => "°C",
            Parameter::Turbidity => "NTU",
            Parameter::Tds => "ppm",
        }
    }

    /// Human-readable name for cards and tables.
    pub fn label(&self) -> &'static str {
        match self {
            Parameter::Ph => "pH Level",
            Parameter::Temperature => "Temperature",
            Parameter::Turbidity => "Turbidity",
            Parameter::Tds => "TDS",
        }
    }

    /// Label used for chart series, including the unit.
    pub fn series_label(&self) -> &'static str {
        match self {
            Parameter::Ph => "pH Level",
            Parameter::Temperature => "Temperature (°C)",
            Parameter::Turbidity => "Turbidity (NTU)",
            Parameter::Tds => "TDS (ppm)",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Error returned when a string does not name a known parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownParameter(pub String);

impl fmt::Display for UnknownParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown parameter: {}", self.0)
    }
}

impl std::error::Error for UnknownParameter {}

impl FromStr for Parameter {
    type Err = UnknownParameter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ph" => Ok(Parameter::Ph),
            "temperature" | "temp" => Ok(Parameter::Temperature),
            "turbidity" => Ok(Parameter::Turbidity),
            "tds" => Ok(Parameter::Tds),
            _ => Err(UnknownParameter(s.to_string())),
        }
    }
}
