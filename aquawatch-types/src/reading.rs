//! Reading - one timestamped sensor sample.

use chrono::{DateTime, Utc};

use crate::Parameter;

/// A single sensor sample as persisted in the reading store.
///
/// Readings are created by sensor ingestion outside this workspace and are
/// only ever read here. With the `serde` feature, documents exported from the
/// store deserialize directly: `$id` and `$createdAt` are accepted as aliases
/// for `id` and `created_at`.
///
/// # Example
///
/// ```rust
/// use aquawatch_types::{Parameter, Reading};
/// use chrono::{TimeZone, Utc};
///
/// let reading = Reading::builder()
///     .id("abc")
///     .created_at(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
///     .ph(7.4)
///     .build();
///
/// assert_eq!(reading.value(Parameter::Ph), 7.4);
/// assert_eq!(reading.value(Parameter::Tds), 0.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reading {
    /// Opaque store identifier.
    #[cfg_attr(feature = "serde", serde(alias = "$id"))]
    pub id: String,

    /// When the store persisted this reading.
    #[cfg_attr(feature = "serde", serde(alias = "$createdAt"))]
    pub created_at: DateTime<Utc>,

    /// pH (unitless).
    pub ph: f64,

    /// Temperature in °C.
    pub temperature: f64,

    /// Turbidity in NTU.
    pub turbidity: f64,

    /// Total dissolved solids in ppm.
    pub tds: f64,
}

impl Reading {
    /// Create a builder for a reading.
    pub fn builder() -> ReadingBuilder {
        ReadingBuilder::new()
    }

    /// The measured value for a parameter.
    pub fn value(&self, parameter: Parameter) -> f64 {
        match parameter {
            Parameter::Ph => self.ph,
            Parameter::Temperature => self.temperature,
            Parameter::Turbidity => self.turbidity,
            Parameter::Tds => self.tds,
        }
    }

    /// Iterate over `(parameter, value)` pairs in display order.
    pub fn values(&self) -> impl Iterator<Item = (Parameter, f64)> + '_ {
        Parameter::ALL.into_iter().map(move |p| (p, self.value(p)))
    }
}

/// Builder for constructing [`Reading`] instances.
///
/// Unset measurements default to `0.0`, an unset id to an empty string and an
/// unset timestamp to the current time.
#[derive(Debug, Default)]
pub struct ReadingBuilder {
    id: String,
    created_at: Option<DateTime<Utc>>,
    ph: f64,
    temperature: f64,
    turbidity: f64,
    tds: f64,
}

impl ReadingBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the store identifier.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the creation timestamp.
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Set the pH value.
    pub fn ph(mut self, value: f64) -> Self {
        self.ph = value;
        self
    }

    /// Set the temperature in °C.
    pub fn temperature(mut self, value: f64) -> Self {
        self.temperature = value;
        self
    }

    /// Set the turbidity in NTU.
    pub fn turbidity(mut self, value: f64) -> Self {
        self.turbidity = value;
        self
    }

    /// Set total dissolved solids in ppm.
    pub fn tds(mut self, value: f64) -> Self {
        self.tds = value;
        self
    }

    /// Set a value by parameter.
    pub fn value(self, parameter: Parameter, value: f64) -> Self {
        match parameter {
            Parameter::Ph => self.ph(value),
            Parameter::Temperature => self.temperature(value),
            Parameter::Turbidity => self.turbidity(value),
            Parameter::Tds => self.tds(value),
        }
    }

    /// Build the reading.
    pub fn build(self) -> Reading {
        Reading {
            id: self.id,
            created_at: self.created_at.unwrap_or_else(Utc::now),
            ph: self.ph,
            temperature: self.temperature,
            turbidity: self.turbidity,
            tds: self.tds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_builder_sets_every_field() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap();
        let reading = Reading::builder()
            .id("doc-1")
            .created_at(at)
            .ph(7.0)
            .temperature(22.0)
            .turbidity(0.5)
            .tds(300.0)
            .build();

        assert_eq!(reading.id, "doc-1");
        assert_eq!(reading.created_at, at);
        let values: Vec<f64> = reading.values().map(|(_, v)| v).collect();
        assert_eq!(values, vec![7.0, 22.0, 0.5, 300.0]);
    }

    #[test]
    fn test_builder_value_by_parameter() {
        let reading = Reading::builder()
            .value(Parameter::Turbidity, 3.2)
            .value(Parameter::Tds, 640.0)
            .build();
        assert_eq!(reading.value(Parameter::Turbidity), 3.2);
        assert_eq!(reading.value(Parameter::Tds), 640.0);
        assert_eq!(reading.value(Parameter::Ph), 0.0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_store_document() {
        let json = r#"{
            "$id": "6824b2",
            "$createdAt": "2024-05-01T12:00:00.000+00:00",
            "ph": 7.2,
            "temperature": 24.5,
            "turbidity": 0.8,
            "tds": 320
        }"#;

        let reading: Reading = serde_json::from_str(json).unwrap();
        assert_eq!(reading.id, "6824b2");
        assert_eq!(
            reading.created_at,
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
        );
        assert_eq!(reading.tds, 320.0);
    }
}
