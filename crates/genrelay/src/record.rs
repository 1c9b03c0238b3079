//! The telemetry record produced once per extractor run.

use crate::error::PayloadError;
use crate::payload::{GeneratorPayload, GeneratorReading};
use chrono::{DateTime, FixedOffset, Local, SubsecRound};

/// One normalized reading of the generator.
///
/// A record only exists fully populated: [`RecordBuilder::build`] refuses to
/// produce one with a missing or nonsensical field.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    /// Cumulative engine run time in hours.
    pub runtime_hours: f64,
    /// Starting battery voltage at the time of the reading.
    pub battery_voltage: f64,
    /// Completion of the most recent self-test (exercise) cycle.
    pub last_exercise: DateTime<FixedOffset>,
    /// When this record was produced.
    pub captured_at: DateTime<FixedOffset>,
}

impl TelemetryRecord {
    pub fn builder() -> RecordBuilder {
        RecordBuilder::default()
    }

    /// Wrap the record in its wire envelope.
    pub fn to_payload(&self) -> GeneratorPayload {
        GeneratorPayload {
            generator: GeneratorReading {
                runtime_hours: self.runtime_hours,
                battery_voltage: self.battery_voltage,
                last_exercise_date: self.last_exercise,
                last_updated: self.captured_at,
            },
        }
    }

    /// Serialize to the single-line JSON payload.
    pub fn to_payload_line(&self) -> Result<String, PayloadError> {
        self.to_payload().to_line()
    }

    /// Parse a payload line back into a validated record.
    pub fn from_payload_line(line: &str) -> Result<Self, PayloadError> {
        let reading = GeneratorPayload::from_line(line)?.generator;
        Self::builder()
            .runtime_hours(reading.runtime_hours)
            .battery_voltage(reading.battery_voltage)
            .last_exercise(reading.last_exercise_date)
            .captured_at(reading.last_updated)
            .build()
    }
}

/// Current local time with an explicit offset, to whole seconds.
pub fn captured_now() -> DateTime<FixedOffset> {
    Local::now().fixed_offset().trunc_subsecs(0)
}

/// Accumulates fields as the extractor discovers them.
#[derive(Debug, Clone, Default)]
pub struct RecordBuilder {
    runtime_hours: Option<f64>,
    battery_voltage: Option<f64>,
    last_exercise: Option<DateTime<FixedOffset>>,
    captured_at: Option<DateTime<FixedOffset>>,
}

impl RecordBuilder {
    pub fn runtime_hours(mut self, hours: f64) -> Self {
        self.runtime_hours = Some(hours);
        self
    }

    pub fn battery_voltage(mut self, volts: f64) -> Self {
        self.battery_voltage = Some(volts);
        self
    }

    pub fn last_exercise(mut self, at: DateTime<FixedOffset>) -> Self {
        self.last_exercise = Some(at);
        self
    }

    pub fn captured_at(mut self, at: DateTime<FixedOffset>) -> Self {
        self.captured_at = Some(at);
        self
    }

    /// Stamp the capture time with [`captured_now`].
    pub fn captured_now(self) -> Self {
        self.captured_at(captured_now())
    }

    /// Validate and produce the record.
    pub fn build(self) -> Result<TelemetryRecord, PayloadError> {
        let runtime_hours = self
            .runtime_hours
            .ok_or(PayloadError::MissingField("runtime_hours"))?;
        let battery_voltage = self
            .battery_voltage
            .ok_or(PayloadError::MissingField("battery_voltage"))?;
        let last_exercise = self
            .last_exercise
            .ok_or(PayloadError::MissingField("last_exercise_date"))?;
        let captured_at = self
            .captured_at
            .ok_or(PayloadError::MissingField("last_updated"))?;

        if !runtime_hours.is_finite() || runtime_hours < 0.0 {
            return Err(PayloadError::InvalidValue {
                field: "runtime_hours",
                value: runtime_hours,
            });
        }
        if !battery_voltage.is_finite() {
            return Err(PayloadError::InvalidValue {
                field: "battery_voltage",
                value: battery_voltage,
            });
        }

        Ok(TelemetryRecord {
            runtime_hours,
            battery_voltage,
            last_exercise,
            captured_at,
        })
    }
}
