//! Directory statistics report.
//!
//! Aggregates a stream of scanned files into per-category, per-size and
//! per-age counters, rendered either as aligned text or as JSON.
//! Aggregation is pure: it consumes records and never touches the
//! filesystem itself.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::classify::{self, Classifier};
use crate::error::{CoreError, CoreResult};
use crate::scan::FileRecord;

/// Count and cumulative size for one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BucketStats {
    pub count: u64,
    pub size: u64,
}

impl BucketStats {
    fn add(&mut self, bytes: u64) {
        self.count += 1;
        self.size += bytes;
    }
}

/// Aggregated statistics for a set of files.
///
/// Bucket maps are `BTreeMap`s so rendering order is stable.
#[derive(Debug, Default, Serialize)]
pub struct Report {
    pub total_files: u64,
    pub total_size: u64,
    pub by_type: BTreeMap<String, BucketStats>,
    pub by_size: BTreeMap<String, BucketStats>,
    pub by_date: BTreeMap<String, BucketStats>,
}

impl Report {
    /// Build a report from scanned records. `now` anchors the age
    /// buckets, so callers pass it once and the whole report is
    /// internally consistent.
    pub fn aggregate(
        records: impl IntoIterator<Item = FileRecord>,
        classifier: &Classifier,
        now: DateTime<Local>,
    ) -> Report {
        let mut report = Report::default();
        for record in records {
            report.total_files += 1;
            report.total_size += record.size;

            let category = classifier.classify(&record);
            report
                .by_type
                .entry(category.dir_name().to_string())
                .or_default()
                .add(record.size);

            let size_bucket = classify::size_bucket(record.size);
            report
                .by_size
                .entry(size_bucket.dir_name().to_string())
                .or_default()
                .add(record.size);

            let date_bucket = classify::date_bucket(record.modified, now);
            report
                .by_date
                .entry(date_bucket.dir_name().to_string())
                .or_default()
                .add(record.size);
        }
        report
    }

    /// Human-readable rendering with aligned columns.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Files: {}", self.total_files);
        let _ = writeln!(out, "Total size: {}", human_size(self.total_size));

        for (title, map) in [
            ("By type", &self.by_type),
            ("By size", &self.by_size),
            ("By age", &self.by_date),
        ] {
            if map.is_empty() {
                continue;
            }
            let _ = writeln!(out, "\n{}:", title);
            let width = map.keys().map(|k| k.len()).max().unwrap_or(0);
            for (name, stats) in map {
                let _ = writeln!(
                    out,
                    "  {:<width$}  {:>6} file(s)  {:>10}",
                    name,
                    stats.count,
                    human_size(stats.size),
                    width = width
                );
            }
        }
        out
    }

    /// Pretty-printed JSON rendering.
    pub fn to_json(&self) -> CoreResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| CoreError::Io {
            path: std::path::PathBuf::new(),
            source: std::io::Error::other(e),
        })
    }
}

/// Render a byte count with a binary unit, one decimal place.
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{Duration, SystemTime};

    fn record(name: &str, size: u64, age_days: u64) -> FileRecord {
        let path = PathBuf::from(name);
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());
        FileRecord {
            path,
            size,
            modified: SystemTime::now() - Duration::from_secs(age_days * 86_400),
            extension,
        }
    }

    #[test]
    fn test_aggregate_totals_and_buckets() {
        let classifier = Classifier::new();
        let now = Local::now();
        let records = vec![
            record("photo.jpg", 500, 0),
            record("rapport.pdf", 2_000_000, 0),
            record("clip.mp4", 1_000, 0),
        ];

        let report = Report::aggregate(records, &classifier, now);

        assert_eq!(report.total_files, 3);
        assert_eq!(report.total_size, 2_001_500);
        assert_eq!(report.by_type["images"].count, 1);
        assert_eq!(report.by_type["documents"].size, 2_000_000);
        assert_eq!(report.by_type["videos"].count, 1);
        assert_eq!(report.by_size["tiny"].count, 2);
        assert_eq!(report.by_size["small"].count, 1);
        assert_eq!(report.by_date["today"].count, 3);
    }

    #[test]
    fn test_empty_report() {
        let classifier = Classifier::new();
        let report = Report::aggregate(Vec::new(), &classifier, Local::now());

        assert_eq!(report.total_files, 0);
        assert_eq!(report.total_size, 0);
        assert!(report.by_type.is_empty());

        let text = report.to_text();
        assert!(text.contains("Files: 0"));
    }

    #[test]
    fn test_json_shape() {
        let classifier = Classifier::new();
        let report = Report::aggregate(
            vec![record("a.txt", 10, 0)],
            &classifier,
            Local::now(),
        );

        let json: serde_json::Value =
            serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["total_files"], 1);
        assert_eq!(json["total_size"], 10);
        assert_eq!(json["by_type"]["text"]["count"], 1);
        assert_eq!(json["by_size"]["tiny"]["size"], 10);
    }

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(0), "0 B");
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KiB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MiB");
        assert_eq!(human_size(3 * 1024 * 1024 * 1024), "3.0 GiB");
    }
}
