//! Pattern-based extraction of vehicle records from bot reply text.
//!
//! A telemetry block starts at a `Vehicle ID:` label and runs until the next
//! one (or the end of the text). `Location:` is mandatory inside the block;
//! `Heading:`, `Onboard quantity:` and `Speed:` are each looked up on their
//! own and default to zero when absent. A field that is present but does not
//! parse excludes the record.

use crate::telemetry::record::VehicleRecord;
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

const ID_PATTERN: &str = r"Vehicle ID:\s*([0-9]+)";
const LOCATION_PATTERN: &str =
    r"Location:\s*([-+]?[0-9]+(?:\.[0-9]*)?)\s*,\s*([-+]?[0-9]+(?:\.[0-9]*)?)";
const HEADING_PATTERN: &str = r"Heading:\s*([0-9]+)";
const ONBOARD_PATTERN: &str = r"Onboard quantity:\s*([0-9]+)";
const SPEED_PATTERN: &str = r"Speed:\s*([0-9]+(?:\.[0-9]*)?)";

struct Patterns {
    id: Regex,
    location: Regex,
    heading: Regex,
    onboard: Regex,
    speed: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        id: Regex::new(ID_PATTERN).expect("vehicle id pattern"),
        location: Regex::new(LOCATION_PATTERN).expect("location pattern"),
        heading: Regex::new(HEADING_PATTERN).expect("heading pattern"),
        onboard: Regex::new(ONBOARD_PATTERN).expect("onboard quantity pattern"),
        speed: Regex::new(SPEED_PATTERN).expect("speed pattern"),
    })
}

pub struct Extractor;

impl Extractor {
    /// Every well-formed block in `text`, in source order.
    pub fn extract(text: &str) -> Vec<VehicleRecord> {
        let patterns = patterns();
        let anchors: Vec<(usize, usize, &str)> = patterns
            .id
            .captures_iter(text)
            .filter_map(|caps| {
                let label = caps.get(0)?;
                let id = caps.get(1)?;
                Some((label.start(), label.end(), id.as_str()))
            })
            .collect();

        let mut vehicles = Vec::with_capacity(anchors.len());
        for (i, &(_, body_start, id)) in anchors.iter().enumerate() {
            let body_end = anchors
                .get(i + 1)
                .map(|&(next_start, _, _)| next_start)
                .unwrap_or(text.len());

            if let Some(record) = Self::parse_block(id, &text[body_start..body_end]) {
                vehicles.push(record);
            }
        }

        debug!(
            anchors = anchors.len(),
            vehicles = vehicles.len(),
            "Telemetry extraction completed"
        );
        vehicles
    }

    fn parse_block(id: &str, block: &str) -> Option<VehicleRecord> {
        let patterns = patterns();

        let location = patterns.location.captures(block)?;
        let latitude = parse_coordinate(location.get(1)?.as_str())?;
        let longitude = parse_coordinate(location.get(2)?.as_str())?;

        let mut record = VehicleRecord::new(id, latitude, longitude);
        if let Some(heading) = capture(&patterns.heading, block) {
            record.heading = parse_field(id, "heading", heading)?;
        }
        if let Some(quantity) = capture(&patterns.onboard, block) {
            record.onboard_quantity = parse_field(id, "onboard quantity", quantity)?;
        }
        if let Some(speed) = capture(&patterns.speed, block) {
            record.speed = parse_field::<f64>(id, "speed", speed).filter(|s| s.is_finite())?;
        }

        Some(record)
    }
}

/// Null-tolerant entry point: `None` reads as "no records".
pub fn extract_all(text: Option<&str>) -> Vec<VehicleRecord> {
    text.map(Extractor::extract).unwrap_or_default()
}

fn capture<'t>(pattern: &Regex, block: &'t str) -> Option<&'t str> {
    pattern
        .captures(block)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// A present field that does not parse drops the whole record.
fn parse_field<T: std::str::FromStr>(id: &str, field: &str, literal: &str) -> Option<T> {
    let parsed = literal.parse().ok();
    if parsed.is_none() {
        debug!(vehicle = id, field, literal, "Unrepresentable field, skipping record");
    }
    parsed
}

fn parse_coordinate(literal: &str) -> Option<f64> {
    literal.parse::<f64>().ok().filter(|value| value.is_finite())
}
