use crate::listing_utils::text::fingerprint_title;
use crate::types::HackathonRecord;
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

/// Identity of an event across sources: normalized title plus date range.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

pub fn fingerprint(record: &HackathonRecord) -> Fingerprint {
    Fingerprint {
        title: fingerprint_title(&record.title),
        start_date: record.start_date,
        end_date: record.end_date,
    }
}

/// Records that survived the merge and how many were dropped.
#[derive(Debug, Clone, Default)]
pub struct DedupOutcome {
    pub records: Vec<HackathonRecord>,
    pub merged: usize,
}

/// Collapse records that share a fingerprint into the richest variant.
/// Survivors keep the position of the first record seen for their
/// fingerprint.
pub fn deduplicate(records: Vec<HackathonRecord>) -> DedupOutcome {
    let input_len = records.len();
    let mut slots: HashMap<Fingerprint, usize> = HashMap::new();
    let mut survivors: Vec<HackathonRecord> = Vec::with_capacity(input_len);

    for record in records {
        let key = fingerprint(&record);
        match slots.get(&key) {
            Some(&index) => {
                let kept = &mut survivors[index];
                if prefer(&record, kept) == Ordering::Greater {
                    debug!(
                        "Merged '{}': {} replaces {}",
                        record.title, record.source, kept.source
                    );
                    *kept = record;
                } else {
                    debug!(
                        "Merged '{}': {} kept over {}",
                        kept.title, kept.source, record.source
                    );
                }
            }
            None => {
                slots.insert(key, survivors.len());
                survivors.push(record);
            }
        }
    }

    DedupOutcome {
        merged: input_len - survivors.len(),
        records: survivors,
    }
}

/// `Greater` when `challenger` should replace `incumbent`. An exact tie keeps
/// the incumbent, which was seen first.
fn prefer(challenger: &HackathonRecord, incumbent: &HackathonRecord) -> Ordering {
    challenger
        .populated_optional_fields()
        .cmp(&incumbent.populated_optional_fields())
        .then_with(|| incumbent.source.priority().cmp(&challenger.source.priority()))
}
