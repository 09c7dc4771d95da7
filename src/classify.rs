//! File classification: extension category, size bucket and date bucket.
//!
//! All functions here are pure and total. The extension table is fixed by
//! default but can be overridden through [`crate::config::Config`]; the
//! classifier never touches the filesystem.
//!
//! # Examples
//!
//! ```
//! use tidyfile::classify::{Category, Classifier};
//!
//! let classifier = Classifier::default();
//! assert_eq!(classifier.classify_extension(Some("png")), Category::Images);
//! assert_eq!(classifier.classify_extension(Some("xyz")), Category::Other);
//! assert_eq!(classifier.classify_extension(None), Category::Other);
//! ```

use std::collections::HashMap;
use std::time::SystemTime;

use chrono::{DateTime, Datelike, Local};

use crate::scan::FileRecord;

/// Broad file category assigned from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Image files (PNG, JPG, GIF, etc.)
    Images,
    /// Document files (PDF, DOCX, ODT, etc.)
    Documents,
    /// Video files (MP4, MKV, AVI, etc.)
    Videos,
    /// Audio files (MP3, WAV, FLAC, etc.)
    Audio,
    /// Archive files (ZIP, RAR, 7Z, etc.)
    Archives,
    /// Source code files (Rust, Python, JavaScript, etc.)
    Code,
    /// Plain-text files (TXT, MD, CSV, LOG)
    Text,
    /// Anything without a recognized extension.
    Other,
}

impl Category {
    /// Returns the directory name used when sorting by type.
    ///
    /// ```
    /// use tidyfile::classify::Category;
    ///
    /// assert_eq!(Category::Images.dir_name(), "images");
    /// assert_eq!(Category::Other.dir_name(), "other");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Images => "images",
            Category::Documents => "documents",
            Category::Videos => "videos",
            Category::Audio => "audio",
            Category::Archives => "archives",
            Category::Code => "code",
            Category::Text => "text",
            Category::Other => "other",
        }
    }

    /// Parse a category name as it appears in configuration files.
    pub fn from_name(name: &str) -> Option<Category> {
        match name {
            "images" => Some(Category::Images),
            "documents" => Some(Category::Documents),
            "videos" => Some(Category::Videos),
            "audio" => Some(Category::Audio),
            "archives" => Some(Category::Archives),
            "code" => Some(Category::Code),
            "text" => Some(Category::Text),
            "other" => Some(Category::Other),
            _ => None,
        }
    }
}

/// Size bucket with fixed thresholds: tiny < 1 MiB <= small < 10 MiB <=
/// medium < 100 MiB <= large.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SizeBucket {
    Tiny,
    Small,
    Medium,
    Large,
}

impl SizeBucket {
    pub fn dir_name(&self) -> &'static str {
        match self {
            SizeBucket::Tiny => "tiny",
            SizeBucket::Small => "small",
            SizeBucket::Medium => "medium",
            SizeBucket::Large => "large",
        }
    }
}

/// Date bucket relative to a reference instant, by calendar comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DateBucket {
    Today,
    ThisWeek,
    ThisMonth,
    ThisYear,
    Older,
}

impl DateBucket {
    pub fn dir_name(&self) -> &'static str {
        match self {
            DateBucket::Today => "today",
            DateBucket::ThisWeek => "this_week",
            DateBucket::ThisMonth => "this_month",
            DateBucket::ThisYear => "this_year",
            DateBucket::Older => "older",
        }
    }
}

const MIB: u64 = 1024 * 1024;

/// Bucket a byte count. Total over all of `u64`.
pub fn size_bucket(bytes: u64) -> SizeBucket {
    if bytes < MIB {
        SizeBucket::Tiny
    } else if bytes < 10 * MIB {
        SizeBucket::Small
    } else if bytes < 100 * MIB {
        SizeBucket::Medium
    } else {
        SizeBucket::Large
    }
}

/// Bucket a modification time relative to `now`.
///
/// Same calendar date is `today`; within seven days is `this_week`; same
/// month and year is `this_month`; same year is `this_year`; everything
/// else (including future timestamps from clock skew) is compared by the
/// same rules, so a file dated tomorrow still lands in `this_week`.
pub fn date_bucket(mtime: SystemTime, now: DateTime<Local>) -> DateBucket {
    let dt: DateTime<Local> = mtime.into();

    if dt.date_naive() == now.date_naive() {
        DateBucket::Today
    } else if (now.date_naive() - dt.date_naive()).num_days().abs() <= 7 {
        DateBucket::ThisWeek
    } else if dt.year() == now.year() && dt.month() == now.month() {
        DateBucket::ThisMonth
    } else if dt.year() == now.year() {
        DateBucket::ThisYear
    } else {
        DateBucket::Older
    }
}

/// Maps lower-cased file extensions to categories.
///
/// Built from a fixed default table, or from an injected mapping supplied
/// by configuration. Lookup is case-insensitive on the extension.
#[derive(Debug, Clone)]
pub struct Classifier {
    extension_map: HashMap<String, Category>,
}

impl Classifier {
    /// Create a classifier with the standard extension table.
    pub fn new() -> Self {
        let mut classifier = Self {
            extension_map: HashMap::new(),
        };
        for (category, extensions) in DEFAULT_TABLE {
            for ext in *extensions {
                classifier.add_extension(ext, *category);
            }
        }
        classifier
    }

    /// Create a classifier from an explicit extension table, e.g. one
    /// loaded from configuration. Entries fully replace the defaults.
    pub fn from_table(table: &HashMap<Category, Vec<String>>) -> Self {
        let mut classifier = Self {
            extension_map: HashMap::new(),
        };
        for (category, extensions) in table {
            for ext in extensions {
                classifier.add_extension(ext, *category);
            }
        }
        classifier
    }

    /// Register one extension mapping (case-insensitive).
    pub fn add_extension(&mut self, ext: &str, category: Category) {
        self.extension_map
            .insert(ext.trim_start_matches('.').to_lowercase(), category);
    }

    /// Classify by extension alone. Unknown or missing extensions map to
    /// [`Category::Other`].
    pub fn classify_extension(&self, ext: Option<&str>) -> Category {
        ext.and_then(|e| self.extension_map.get(&e.to_lowercase()).copied())
            .unwrap_or(Category::Other)
    }

    /// Classify a scanned file record.
    pub fn classify(&self, record: &FileRecord) -> Category {
        self.classify_extension(record.extension.as_deref())
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

/// The fixed default extension table.
const DEFAULT_TABLE: &[(Category, &[&str])] = &[
    (
        Category::Images,
        &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp", "svg"],
    ),
    (
        Category::Documents,
        &["pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "rtf"],
    ),
    (
        Category::Videos,
        &["mp4", "avi", "mkv", "mov", "wmv", "flv", "webm"],
    ),
    (
        Category::Audio,
        &["mp3", "wav", "flac", "ogg", "aac", "m4a"],
    ),
    (Category::Archives, &["zip", "tar", "gz", "rar", "7z", "bz2", "xz"]),
    (
        Category::Code,
        &[
            "py", "js", "ts", "html", "css", "java", "c", "cpp", "h", "php", "rb", "rs", "go",
            "sh", "json", "yaml", "yml", "toml",
        ],
    ),
    (Category::Text, &["txt", "md", "csv", "log"]),
];

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    #[test]
    fn test_known_extensions() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify_extension(Some("jpg")), Category::Images);
        assert_eq!(
            classifier.classify_extension(Some("pdf")),
            Category::Documents
        );
        assert_eq!(classifier.classify_extension(Some("mp4")), Category::Videos);
        assert_eq!(classifier.classify_extension(Some("mp3")), Category::Audio);
        assert_eq!(
            classifier.classify_extension(Some("zip")),
            Category::Archives
        );
        assert_eq!(classifier.classify_extension(Some("rs")), Category::Code);
        assert_eq!(classifier.classify_extension(Some("txt")), Category::Text);
    }

    #[test]
    fn test_unknown_extension_is_other() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify_extension(Some("xyz")), Category::Other);
        assert_eq!(classifier.classify_extension(None), Category::Other);
    }

    #[test]
    fn test_case_insensitive() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify_extension(Some("PNG")), Category::Images);
        assert_eq!(classifier.classify_extension(Some("Pdf")), Category::Documents);
    }

    #[test]
    fn test_custom_table_replaces_defaults() {
        let mut table = HashMap::new();
        table.insert(Category::Images, vec!["raw".to_string()]);
        let classifier = Classifier::from_table(&table);

        assert_eq!(classifier.classify_extension(Some("raw")), Category::Images);
        // jpg is not in the injected table, so it no longer maps
        assert_eq!(classifier.classify_extension(Some("jpg")), Category::Other);
    }

    #[test]
    fn test_size_buckets() {
        assert_eq!(size_bucket(0), SizeBucket::Tiny);
        assert_eq!(size_bucket(MIB - 1), SizeBucket::Tiny);
        assert_eq!(size_bucket(MIB), SizeBucket::Small);
        assert_eq!(size_bucket(10 * MIB), SizeBucket::Medium);
        assert_eq!(size_bucket(100 * MIB), SizeBucket::Large);
        assert_eq!(size_bucket(u64::MAX), SizeBucket::Large);
    }

    #[test]
    fn test_date_buckets() {
        let now = Local.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap();

        let today: SystemTime = now.with_timezone(&chrono::Utc).into();
        assert_eq!(date_bucket(today, now), DateBucket::Today);

        let three_days = today - Duration::from_secs(3 * 86400);
        assert_eq!(date_bucket(three_days, now), DateBucket::ThisWeek);

        let ten_days = today - Duration::from_secs(10 * 86400);
        assert_eq!(date_bucket(ten_days, now), DateBucket::ThisMonth);

        let three_months = today - Duration::from_secs(90 * 86400);
        assert_eq!(date_bucket(three_months, now), DateBucket::ThisYear);

        let two_years = today - Duration::from_secs(730 * 86400);
        assert_eq!(date_bucket(two_years, now), DateBucket::Older);
    }
}
