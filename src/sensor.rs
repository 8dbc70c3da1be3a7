use std::collections::HashMap;

use crate::{prelude::*, quantity::power::Watts};

/// Sensor state as seen on a single tick.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Reading {
    Value(Watts),

    /// Sensor exists, but its state is `unavailable`, `unknown`, or not a number.
    Unavailable,

    NotFound,
}

impl Reading {
    /// Parse a Home Assistant state string.
    pub fn from_state(entity_id: &str, state: &str) -> Self {
        match state {
            "unavailable" | "unknown" => {
                debug!(entity_id, state, "power sensor is not ready");
                Self::Unavailable
            }
            _ => match state.trim().parse::<f64>() {
                Ok(value) if value.is_finite() => Self::Value(Watts(value)),
                Ok(_) | Err(_) => {
                    warn!(entity_id, state, "could not convert the state to a number");
                    Self::Unavailable
                }
            },
        }
    }
}

/// Synchronous, non-blocking lookup of the current sensor states.
pub trait PowerSource {
    fn read_power(&self, sensor_id: &str) -> Reading;
}

/// In-memory snapshot of the sensor states, refreshed by the host between ticks.
pub type StateCache = HashMap<String, Reading>;

impl PowerSource for StateCache {
    fn read_power(&self, sensor_id: &str) -> Reading {
        self.get(sensor_id).copied().unwrap_or(Reading::NotFound)
    }
}

/// Sum the readings of all the sensors.
///
/// Returns [`None`] when no sensor reported a number, which is not the same as zero watts.
pub fn total_power<S: AsRef<str>>(source: &impl PowerSource, sensor_ids: &[S]) -> Option<Watts> {
    let mut total = None;
    for sensor_id in sensor_ids {
        let sensor_id = sensor_id.as_ref();
        match source.read_power(sensor_id) {
            Reading::Value(power) => {
                total = Some(total.unwrap_or_default() + power);
            }
            Reading::Unavailable => {}
            Reading::NotFound => {
                debug!(sensor_id, "power sensor not found, it may still be loading");
            }
        }
    }
    if total.is_none() {
        debug!("no valid power sensors available");
    }
    total
}
