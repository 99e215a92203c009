use crate::types::{HackathonRecord, Status};
use chrono::{DateTime, NaiveDate, Utc};

/// Status of an event spanning `start..=end` as of `now`, compared by UTC
/// calendar date.
pub fn classify(start: NaiveDate, end: NaiveDate, now: DateTime<Utc>) -> Status {
    let today = now.date_naive();
    if today < start {
        Status::Upcoming
    } else if today > end {
        Status::Ended
    } else {
        Status::Active
    }
}

/// Overwrite the status of every record.
pub fn apply(records: &mut [HackathonRecord], now: DateTime<Utc>) {
    for record in records.iter_mut() {
        record.status = classify(record.start_date, record.end_date, now);
    }
}
