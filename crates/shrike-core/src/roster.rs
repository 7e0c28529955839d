use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use tempfile::NamedTempFile;

/// Marker written into `email_id` when a row failed terminally. Resumption
/// treats marked rows the same as rows with an extracted address.
pub const FAILED_MARKER: &str = "#failed";

/// One row of the working table: a channel URL and its (possibly absent)
/// extracted contact address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub channel_url: String,
    #[serde(default)]
    pub email_id: Option<String>,
}

impl ChannelRecord {
    pub fn new(channel_url: impl Into<String>) -> Self {
        Self {
            channel_url: channel_url.into(),
            email_id: None,
        }
    }

    /// A settled record already carries a result (an extracted address or the
    /// failure marker) and is skipped on resumption. Pre-seeded values are
    /// trusted as-is; re-scraping a row requires clearing its `email_id`.
    pub fn is_settled(&self) -> bool {
        self.email_id
            .as_deref()
            .is_some_and(|value| !value.trim().is_empty())
    }

    pub fn mark_failed(&mut self) {
        self.email_id = Some(FAILED_MARKER.to_string());
    }
}

/// The ordered, file-backed collection of records. Ordering matches the input
/// file end to end so resumption and the CSV round-trip stay stable.
pub struct Roster {
    records: Vec<ChannelRecord>,
}

impl Roster {
    pub fn from_records(records: Vec<ChannelRecord>) -> Self {
        Self { records }
    }

    /// Read records from a CSV file with a header row.
    ///
    /// The `channel_url` column is required; `email_id` is optional and
    /// carries pre-seeded results on resumption. Rows with an empty
    /// `channel_url` are logged and dropped rather than aborting the load.
    pub fn load(path: &Path) -> Result<Self> {
        tracing::debug!("Reading roster from: {}", path.display());

        let file = File::open(path)?;
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(file);

        let has_url_column = reader.headers()?.iter().any(|h| h == "channel_url");
        if !has_url_column {
            return Err(Error::Format(
                "missing required column `channel_url`".to_string(),
            ));
        }

        let mut records = Vec::new();
        for (idx, row) in reader.deserialize().enumerate() {
            let record: ChannelRecord = row?;
            if record.channel_url.is_empty() {
                tracing::warn!("Skipping row {} with empty channel_url", idx + 1);
                continue;
            }
            records.push(record);
        }

        tracing::info!("Loaded {} records from {}", records.len(), path.display());

        Ok(Self { records })
    }

    /// Persist all records to `path`, header first, in input order.
    ///
    /// The table is written to a temporary file in the destination directory
    /// and atomically renamed over the output, so an interrupted save never
    /// leaves a truncated table behind.
    pub fn save(&self, path: &Path) -> Result<()> {
        tracing::debug!("Writing roster to: {}", path.display());

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let tmp = NamedTempFile::new_in(dir)?;

        {
            let mut writer = csv::Writer::from_writer(tmp.as_file());
            if self.records.is_empty() {
                writer.write_record(["channel_url", "email_id"])?;
            }
            for record in &self.records {
                writer.serialize(record)?;
            }
            writer.flush()?;
        }

        tmp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Wrote {} records", self.records.len());

        Ok(())
    }

    pub fn records(&self) -> &[ChannelRecord] {
        &self.records
    }

    pub fn record_mut(&mut self, idx: usize) -> &mut ChannelRecord {
        &mut self.records[idx]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows the pipeline still has to visit.
    pub fn pending(&self) -> usize {
        self.records.iter().filter(|r| !r.is_settled()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_records() -> Vec<ChannelRecord> {
        vec![
            ChannelRecord {
                channel_url: "https://a.example/about".to_string(),
                email_id: Some("jane@a.example".to_string()),
            },
            ChannelRecord::new("https://b.example/about"),
        ]
    }

    #[test]
    fn test_round_trip_preserves_records_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.csv");

        let roster = Roster::from_records(sample_records());
        roster.save(&path).unwrap();

        let reloaded = Roster::load(&path).unwrap();
        assert_eq!(reloaded.records(), roster.records());
    }

    #[test]
    fn test_load_requires_channel_url_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "url,email_id\nhttps://a.example,\n").unwrap();

        let result = Roster::load(&path);
        assert!(matches!(result, Err(Error::Format(_))));
    }

    #[test]
    fn test_load_skips_rows_with_empty_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gaps.csv");
        std::fs::write(
            &path,
            "channel_url,email_id\nhttps://a.example/about,\n,\nhttps://b.example/about,\n",
        )
        .unwrap();

        let roster = Roster::load(&path).unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.records()[1].channel_url, "https://b.example/about");
    }

    #[test]
    fn test_load_without_email_column_defaults_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls-only.csv");
        std::fs::write(&path, "channel_url\nhttps://a.example/about\n").unwrap();

        let roster = Roster::load(&path).unwrap();
        assert_eq!(roster.records()[0].email_id, None);
    }

    #[test]
    fn test_save_overwrites_previous_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.csv");

        Roster::from_records(sample_records()).save(&path).unwrap();

        let single = Roster::from_records(vec![ChannelRecord::new("https://c.example")]);
        single.save(&path).unwrap();

        let reloaded = Roster::load(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.records()[0].channel_url, "https://c.example");
    }

    #[test]
    fn test_settled_rows() {
        let mut record = ChannelRecord::new("https://a.example");
        assert!(!record.is_settled());

        record.email_id = Some("  ".to_string());
        assert!(!record.is_settled());

        record.mark_failed();
        assert!(record.is_settled());
        assert_eq!(record.email_id.as_deref(), Some(FAILED_MARKER));

        let mut pending = Roster::from_records(sample_records());
        assert_eq!(pending.pending(), 1);
        pending.record_mut(1).email_id = Some("ops@b.example".to_string());
        assert_eq!(pending.pending(), 0);
    }
}
