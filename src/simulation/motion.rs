//! Dead-reckoning step.

use crate::telemetry::VehicleRecord;

/// Moves `vehicle` one tick along its heading.
///
/// Heading 0 points along the first coordinate axis and grows
/// counterclockwise. The displacement length is `speed * scale`.
pub fn advance(vehicle: &VehicleRecord, scale: f64) -> VehicleRecord {
    let step = vehicle.speed * scale;
    let (sin, cos) = vehicle.heading_radians().sin_cos();

    VehicleRecord {
        location: [
            vehicle.location[0] + cos * step,
            vehicle.location[1] + sin * step,
        ],
        ..vehicle.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_zero_moves_along_first_axis() {
        let v = VehicleRecord::new("1", 10.0, 20.0).with_speed(100.0);
        let moved = advance(&v, 0.001);
        assert!((moved.location[0] - 10.1).abs() < 1e-12);
        assert!((moved.location[1] - 20.0).abs() < 1e-12);
    }

    #[test]
    fn heading_ninety_moves_along_second_axis() {
        let v = VehicleRecord::new("1", 0.0, 0.0).with_heading(90).with_speed(10.0);
        let moved = advance(&v, 0.5);
        assert!(moved.location[0].abs() < 1e-12);
        assert!((moved.location[1] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn other_fields_carry_forward() {
        let v = VehicleRecord::new("77", 1.0, 2.0)
            .with_heading(300)
            .with_onboard_quantity(12)
            .with_speed(4.0);
        let moved = advance(&v, 0.001);
        assert_eq!(moved.id, "77");
        assert_eq!(moved.heading, 300);
        assert_eq!(moved.onboard_quantity, 12);
        assert_eq!(moved.speed, 4.0);
    }
}
