use crate::types::{AggregatorError, HackathonRecord, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, error, info};

pub const DATA_FILE: &str = "hackathons.json";
pub const TIMESTAMP_FILE: &str = "last_update.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The serialized output matched the existing artifact; nothing was written
    Unchanged,
    Published { records: usize },
}

/// Deterministic publication order: start date, title, end date, then source
/// priority.
pub fn sort_records(records: &mut [HackathonRecord]) {
    records.sort_by(|a, b| {
        a.start_date
            .cmp(&b.start_date)
            .then_with(|| a.title.cmp(&b.title))
            .then_with(|| a.end_date.cmp(&b.end_date))
            .then_with(|| a.source.priority().cmp(&b.source.priority()))
    });
}

/// Pretty JSON array with a trailing newline.
pub fn render(records: &[HackathonRecord]) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(records)?;
    bytes.push(b'\n');
    Ok(bytes)
}

pub struct Publisher {
    output_dir: PathBuf,
}

impl Publisher {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn data_path(&self) -> PathBuf {
        self.output_dir.join(DATA_FILE)
    }

    pub fn timestamp_path(&self) -> PathBuf {
        self.output_dir.join(TIMESTAMP_FILE)
    }

    /// Sort, serialize and write `hackathons.json` together with
    /// `last_update.txt`. Both files are replaced or neither is.
    pub fn publish(&self, mut records: Vec<HackathonRecord>, now: DateTime<Utc>) -> Result<PublishOutcome> {
        sort_records(&mut records);
        let payload = render(&records)?;

        fs::create_dir_all(&self.output_dir)
            .map_err(|e| AggregatorError::publish(&self.output_dir, e))?;

        let data_path = self.data_path();
        let previous = match fs::read(&data_path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(AggregatorError::publish(&data_path, e)),
        };

        if previous.as_deref() == Some(payload.as_slice()) {
            info!("Output unchanged, skipping publish of {} records", records.len());
            return Ok(PublishOutcome::Unchanged);
        }

        let stamp = format!("{}\n", now.to_rfc3339_opts(SecondsFormat::Secs, true));
        let timestamp_path = self.timestamp_path();

        let data_tmp = self.stage(&payload)?;
        let stamp_tmp = self.stage(stamp.as_bytes())?;

        data_tmp
            .persist(&data_path)
            .map_err(|e| AggregatorError::publish(&data_path, e.error))?;

        if let Err(e) = stamp_tmp.persist(&timestamp_path) {
            error!("Failed to replace {:?}, rolling back {:?}", timestamp_path, data_path);
            self.roll_back(&data_path, previous.as_deref());
            return Err(AggregatorError::publish(&timestamp_path, e.error));
        }

        info!("Published {} records to {:?}", records.len(), data_path);
        Ok(PublishOutcome::Published {
            records: records.len(),
        })
    }

    /// Write `contents` to a flushed temp file beside the targets, so the
    /// final rename stays on one filesystem.
    fn stage(&self, contents: &[u8]) -> Result<NamedTempFile> {
        let publish_err = |e| AggregatorError::publish(&self.output_dir, e);
        let mut file = NamedTempFile::new_in(&self.output_dir).map_err(publish_err)?;
        file.write_all(contents).map_err(publish_err)?;
        file.as_file().sync_all().map_err(publish_err)?;
        debug!("Staged {} bytes at {:?}", contents.len(), file.path());
        Ok(file)
    }

    fn roll_back(&self, data_path: &Path, previous: Option<&[u8]>) {
        let restored = match previous {
            Some(bytes) => self
                .stage(bytes)
                .and_then(|tmp| {
                    tmp.persist(data_path)
                        .map(|_| ())
                        .map_err(|e| AggregatorError::publish(data_path, e.error))
                }),
            None => fs::remove_file(data_path).map_err(|e| AggregatorError::publish(data_path, e)),
        };

        if let Err(e) = restored {
            error!("Rollback of {:?} failed: {}", data_path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EventType, Source, Status};
    use chrono::{NaiveDate, TimeZone};
    use std::collections::BTreeSet;

    fn record(title: &str, day: u32, source: Source) -> HackathonRecord {
        HackathonRecord {
            title: title.to_string(),
            description: String::new(),
            start_date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, day + 1).unwrap(),
            registration_deadline: None,
            location: String::new(),
            event_type: EventType::Online,
            prize_pool: String::new(),
            status: Status::Upcoming,
            tags: BTreeSet::new(),
            registration_url: None,
            website_url: None,
            organizer: String::new(),
            source,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 6, 30, 0).unwrap()
    }

    #[test]
    fn sorts_by_start_then_title() {
        let mut records = vec![
            record("Zeta", 5, Source::Curated),
            record("Beta", 2, Source::Mlh),
            record("Alpha", 5, Source::DevPost),
        ];
        sort_records(&mut records);
        let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Beta", "Alpha", "Zeta"]);
    }

    #[test]
    fn writes_both_files_then_skips_identical_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("data");
        let publisher = Publisher::new(&out);

        let outcome = publisher
            .publish(vec![record("B", 4, Source::Mlh), record("A", 2, Source::DevPost)], now())
            .unwrap();
        assert_eq!(outcome, PublishOutcome::Published { records: 2 });

        let json = fs::read_to_string(publisher.data_path()).unwrap();
        assert!(json.ends_with("]\n"));
        let parsed: Vec<HackathonRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0].title, "A");
        assert_eq!(
            fs::read_to_string(publisher.timestamp_path()).unwrap(),
            "2025-03-01T06:30:00Z\n"
        );

        let later = Utc.with_ymd_and_hms(2025, 3, 2, 6, 30, 0).unwrap();
        let outcome = publisher
            .publish(vec![record("A", 2, Source::DevPost), record("B", 4, Source::Mlh)], later)
            .unwrap();
        assert_eq!(outcome, PublishOutcome::Unchanged);
        assert_eq!(
            fs::read_to_string(publisher.timestamp_path()).unwrap(),
            "2025-03-01T06:30:00Z\n"
        );
    }

    #[test]
    fn empty_run_publishes_an_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = Publisher::new(dir.path());
        let outcome = publisher.publish(Vec::new(), now()).unwrap();
        assert_eq!(outcome, PublishOutcome::Published { records: 0 });
        assert_eq!(fs::read_to_string(publisher.data_path()).unwrap(), "[]\n");
    }

    #[test]
    fn output_dir_that_is_a_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("data");
        fs::write(&blocker, "not a directory").unwrap();
        let result = Publisher::new(&blocker).publish(vec![record("A", 2, Source::Mlh)], now());
        assert!(matches!(result, Err(AggregatorError::Publish { .. })));
    }

    #[test]
    fn failed_timestamp_write_restores_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = Publisher::new(dir.path());
        let previous = "[]\n";
        fs::write(publisher.data_path(), previous).unwrap();
        // A directory in place of the timestamp file makes the second rename fail
        fs::create_dir(publisher.timestamp_path()).unwrap();

        let result = publisher.publish(vec![record("A", 2, Source::Mlh)], now());
        assert!(matches!(result, Err(AggregatorError::Publish { .. })));
        assert_eq!(fs::read_to_string(publisher.data_path()).unwrap(), previous);
    }

    #[test]
    fn failed_first_publish_leaves_no_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = Publisher::new(dir.path());
        fs::create_dir(publisher.timestamp_path()).unwrap();

        let result = publisher.publish(vec![record("A", 2, Source::Mlh)], now());
        assert!(result.is_err());
        assert!(!publisher.data_path().exists());
    }
}
