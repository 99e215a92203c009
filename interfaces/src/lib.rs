//! Canonical hackathon schema shared between the aggregation pipeline and
//! the static frontend that reads `hackathons.json`.

pub mod defs;

pub use defs::{EventType, HackathonRecord, Source, Status};
