use std::collections::BTreeMap;

use tracing::debug;

use crate::consts::EXP_OFFSET;
use crate::error::{BeamviewError, Result};

/// Probe values at which a calibration must round-trip exactly.
const CALIBRATION_PROBES: [f64; 2] = [1.0, 10.0];

/// Linear calibration between a raw register value and its display value:
/// `display = scale * raw + offset`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearMap {
    scale: f64,
    offset: f64,
}

impl LinearMap {
    /// Build a calibration, checking that the two directions invert each
    /// other exactly at the probe values.
    pub fn new(scale: f64, offset: f64) -> Result<Self> {
        if scale == 0.0 || !scale.is_finite() || !offset.is_finite() {
            return Err(BeamviewError::InvalidCalibration {
                scale,
                offset,
                reason: "scale must be finite and non-zero".into(),
            });
        }

        let map = Self { scale, offset };
        for probe in CALIBRATION_PROBES {
            let back = map.to_raw(map.to_display(probe));
            if back != probe {
                return Err(BeamviewError::InvalidCalibration {
                    scale,
                    offset,
                    reason: format!("probe {probe} maps back to {back}"),
                });
            }
        }
        Ok(map)
    }

    pub fn identity() -> Self {
        Self {
            scale: 1.0,
            offset: 0.0,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn to_display(&self, raw: f64) -> f64 {
        self.scale * raw + self.offset
    }

    pub fn to_raw(&self, display: f64) -> f64 {
        (display - self.offset) / self.scale
    }
}

#[derive(Clone, Debug)]
struct RegisterEntry {
    value: Option<i64>,
    calibration: LinearMap,
}

/// Last-known device register values with their calibrations.
#[derive(Clone, Debug, Default)]
pub struct RegisterMap {
    entries: BTreeMap<String, RegisterEntry>,
}

impl RegisterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers of the SUI camera: exposure and frame period, both offset
    /// by the 28-count readout overhead.
    pub fn sui_camera() -> Result<Self> {
        let mut map = Self::new();
        map.register("EXP", LinearMap::new(1.0, EXP_OFFSET)?);
        map.register("FRAME:PERIOD", LinearMap::new(1.0, EXP_OFFSET)?);
        Ok(map)
    }

    /// Add a register; its value is unknown until a reply is parsed.
    pub fn register(&mut self, name: impl Into<String>, calibration: LinearMap) {
        self.entries.insert(
            name.into(),
            RegisterEntry {
                value: None,
                calibration,
            },
        );
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse one complete reply line. Returns true if any register was
    /// assigned from it.
    pub fn update(&mut self, raw_line: &str) -> bool {
        let mut updated = false;
        for (name, entry) in self.entries.iter_mut() {
            let Some(rest) = raw_line
                .strip_prefix(name.as_str())
                .and_then(|r| r.strip_prefix(' '))
            else {
                continue;
            };

            match rest.trim().parse::<i64>() {
                Ok(value) => {
                    entry.value = Some(value);
                    updated = true;
                }
                Err(_) => {
                    debug!(register = %name, line = %raw_line.escape_default(), "Unparsable register value");
                }
            }
        }
        updated
    }

    /// Raw value as last read from the device.
    pub fn value(&self, name: &str) -> Result<Option<i64>> {
        Ok(self.entry(name)?.value)
    }

    pub fn calibration(&self, name: &str) -> Result<LinearMap> {
        Ok(self.entry(name)?.calibration)
    }

    /// Calibrated value of a register.
    pub fn to_display(&self, name: &str) -> Result<f64> {
        let entry = self.entry(name)?;
        let raw = entry
            .value
            .ok_or_else(|| BeamviewError::RegisterUnknown(name.to_string()))?;
        Ok(entry.calibration.to_display(raw as f64))
    }

    /// Raw register value corresponding to a display value.
    pub fn to_device(&self, name: &str, display_value: f64) -> Result<f64> {
        Ok(self.entry(name)?.calibration.to_raw(display_value))
    }

    /// Forget all values, e.g. after reconnecting to a device.
    pub fn clear(&mut self) {
        for entry in self.entries.values_mut() {
            entry.value = None;
        }
    }

    fn entry(&self, name: &str) -> Result<&RegisterEntry> {
        self.entries
            .get(name)
            .ok_or_else(|| BeamviewError::UnknownRegister(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_requires_space() {
        let mut map = RegisterMap::new();
        map.register("EXP", LinearMap::identity());
        assert!(!map.update("EXPOSURE 5\r"));
        assert_eq!(map.value("EXP").unwrap(), None);
    }

    #[test]
    fn test_negative_value() {
        let mut map = RegisterMap::new();
        map.register("OFFSET", LinearMap::identity());
        assert!(map.update("OFFSET -12\r"));
        assert_eq!(map.value("OFFSET").unwrap(), Some(-12));
    }
}
