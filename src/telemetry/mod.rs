//! Vehicle telemetry embedded in free-form bot replies.
//! `record` holds the typed vehicle state, `extractor` pulls those
//! records out of unstructured text.

pub mod extractor;
pub mod record;

pub use extractor::{extract_all, Extractor};
pub use record::VehicleRecord;
