//! One observed or simulated vehicle state.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    /// Digit string exactly as it appeared in the source text.
    pub id: String,
    /// `[latitude, longitude]`
    pub location: [f64; 2],
    /// Degrees, 0 when the source omits it.
    pub heading: u32,
    pub onboard_quantity: u64,
    /// Source units (miles/hour).
    pub speed: f64,
}

impl VehicleRecord {
    pub fn new(id: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            location: [latitude, longitude],
            heading: 0,
            onboard_quantity: 0,
            speed: 0.0,
        }
    }

    pub fn with_heading(mut self, heading: u32) -> Self {
        self.heading = heading;
        self
    }

    pub fn with_onboard_quantity(mut self, quantity: u64) -> Self {
        self.onboard_quantity = quantity;
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn latitude(&self) -> f64 {
        self.location[0]
    }

    pub fn longitude(&self) -> f64 {
        self.location[1]
    }

    pub fn heading_radians(&self) -> f64 {
        f64::from(self.heading).to_radians()
    }
}
