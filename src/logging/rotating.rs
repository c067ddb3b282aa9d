//! Rotating file groups.
//!
//! # Responsibilities
//! - Append persisted lines to the active segment of a file group
//! - Open a new segment when the date bucket changes or the size cap is hit
//! - Gzip closed segments when archiving is enabled
//! - Prune segments beyond the retention window every time a segment opens
//!
//! # Layout
//! A group with base name `server.log` in `logs/` produces
//! `logs/server.2024-03-09.log`, then `logs/server.2024-03-09.1.log`,
//! `logs/server.2024-03-09.2.log`, ... as the size cap is reached within a day.
//! A base name without extension produces `error.2024-03-09`, `error.2024-03-09.1`.
//! Archived segments keep their name plus a `.gz` suffix.
//!
//! # Design Decisions
//! - Date bucket zone (UTC, local or a fixed offset) is fixed when the sink is built
//! - A segment may exceed the cap by one line; a line is never split
//! - Day retention is an age cutoff relative to the current bucket
//! - Retention runs eagerly on rotation, before the triggering write returns
//! - On startup the newest unarchived segment of the current bucket is resumed

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Days, FixedOffset, Local, NaiveDate, Utc};
use flate2::{write::GzEncoder, Compression};

use crate::logging::format::{FileLayout, Formatter};
use crate::logging::record::{Level, LogRecord};
use crate::logging::sink::{lock, report_failure, Sink, SinkError};
use crate::observability::metrics;

const DATE_FORMAT: &str = "%Y-%m-%d";
const ARCHIVE_SUFFIX: &str = ".gz";

/// Default segment size cap (20 MiB).
pub const DEFAULT_MAX_SIZE: u64 = 20 * 1024 * 1024;

/// Default retention window (14 days).
pub const DEFAULT_RETENTION: Retention = Retention::Days(14);

/// How many segments of a group survive pruning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// Delete segments whose date is more than `n - 1` days before the
    /// current bucket.
    Days(u32),
    /// Keep the newest `n` segments, active segment included.
    Files(u32),
}

impl FromStr for Retention {
    type Err = String;

    /// Parses `"14d"` as [`Retention::Days`] and `"14"` as [`Retention::Files`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (digits, days) = match trimmed.strip_suffix(['d', 'D']) {
            Some(rest) => (rest, true),
            None => (trimmed, false),
        };
        let count: u32 = digits
            .parse()
            .map_err(|_| format!("invalid retention '{}'", s))?;
        if count == 0 {
            return Err(format!("retention '{}' must be greater than zero", s));
        }
        Ok(if days {
            Retention::Days(count)
        } else {
            Retention::Files(count)
        })
    }
}

/// Zone whose calendar date names a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketZone {
    Utc,
    /// The host's local zone, daylight saving included.
    Local,
    Fixed(FixedOffset),
}

impl BucketZone {
    pub fn date_of(&self, at: DateTime<Utc>) -> NaiveDate {
        match self {
            BucketZone::Utc => at.date_naive(),
            BucketZone::Local => at.with_timezone(&Local).date_naive(),
            BucketZone::Fixed(offset) => at.with_timezone(offset).date_naive(),
        }
    }
}

/// Source of wall-clock time for date bucketing.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self(Mutex::new(start))
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *lock(&self.0) = at;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = lock(&self.0);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *lock(&self.0)
    }
}

/// Where and how a file group rotates.
#[derive(Debug, Clone)]
pub struct RotationPolicy {
    pub dir: PathBuf,
    pub base: String,
    pub max_size: u64,
    pub retention: Retention,
    pub zone: BucketZone,
    pub zipped: bool,
    pub min_level: Level,
    pub layout: FileLayout,
}

impl RotationPolicy {
    pub fn new(dir: impl Into<PathBuf>, base: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            base: base.into(),
            max_size: DEFAULT_MAX_SIZE,
            retention: DEFAULT_RETENTION,
            zone: BucketZone::Utc,
            zipped: false,
            min_level: Level::Http,
            layout: FileLayout::Json,
        }
    }

    pub fn max_size(mut self, bytes: u64) -> Self {
        self.max_size = bytes.max(1);
        self
    }

    pub fn retention(mut self, retention: Retention) -> Self {
        self.retention = retention;
        self
    }

    /// Shorthand for [`BucketZone::Utc`] or [`BucketZone::Local`].
    pub fn utc(self, utc: bool) -> Self {
        self.zone(if utc { BucketZone::Utc } else { BucketZone::Local })
    }

    pub fn zone(mut self, zone: BucketZone) -> Self {
        self.zone = zone;
        self
    }

    /// Gzip each segment once it is closed.
    pub fn zipped_archive(mut self, zipped: bool) -> Self {
        self.zipped = zipped;
        self
    }

    pub fn min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    pub fn layout(mut self, layout: FileLayout) -> Self {
        self.layout = layout;
        self
    }

    fn stem_and_ext(&self) -> (&str, Option<&str>) {
        match self.base.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, Some(ext)),
            _ => (self.base.as_str(), None),
        }
    }

    /// File name of segment `index` in date bucket `date`.
    pub fn segment_name(&self, date: NaiveDate, index: u32) -> String {
        let (stem, ext) = self.stem_and_ext();
        let mut name = format!("{}.{}", stem, date.format(DATE_FORMAT));
        if index > 0 {
            name.push_str(&format!(".{}", index));
        }
        if let Some(ext) = ext {
            name.push('.');
            name.push_str(ext);
        }
        name
    }

    /// Parse a file name back into `(date, index)` if it belongs to this group.
    pub fn parse_segment(&self, file_name: &str) -> Option<(NaiveDate, u32)> {
        let (stem, ext) = self.stem_and_ext();
        let rest = file_name.strip_prefix(stem)?.strip_prefix('.')?;
        let rest = match ext {
            Some(ext) => rest.strip_suffix(ext)?.strip_suffix('.')?,
            None => rest,
        };
        let (date_part, index) = match rest.split_once('.') {
            Some((date, index)) => (date, index.parse().ok()?),
            None => (rest, 0),
        };
        let date = NaiveDate::parse_from_str(date_part, DATE_FORMAT).ok()?;
        // Reject padded or reformatted dates that would not round-trip.
        (date.format(DATE_FORMAT).to_string() == date_part).then_some((date, index))
    }
}

/// A segment found on disk.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Segment {
    date: NaiveDate,
    index: u32,
    archived: bool,
    path: PathBuf,
}

struct ActiveSegment {
    date: NaiveDate,
    index: u32,
    path: PathBuf,
    file: File,
    size: u64,
}

/// A date- and size-rotated file group.
pub struct RotatingFileSink {
    policy: RotationPolicy,
    clock: Arc<dyn Clock>,
    active: Mutex<Option<ActiveSegment>>,
}

impl RotatingFileSink {
    pub fn new(policy: RotationPolicy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    pub fn with_clock(policy: RotationPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            policy,
            clock,
            active: Mutex::new(None),
        }
    }

    /// Path of the segment currently open for appends, if any.
    pub fn current_path(&self) -> Option<PathBuf> {
        lock(&self.active).as_ref().map(|a| a.path.clone())
    }

    /// All segments of this group on disk, archived ones included, oldest first.
    pub fn segments(&self) -> Vec<PathBuf> {
        list_segments(&self.policy)
            .into_iter()
            .map(|segment| segment.path)
            .collect()
    }

    fn append(&self, line: &str) -> Result<(), SinkError> {
        let date = self.policy.zone.date_of(self.clock.now());
        let incoming = line.len() as u64;
        let mut slot = lock(&self.active);

        let next = match slot.as_ref() {
            Some(active) if active.date == date => {
                if active.size > 0 && active.size + incoming > self.policy.max_size {
                    Some(active.index + 1)
                } else {
                    None
                }
            }
            _ => {
                // First write, or the bucket rolled over: resume that bucket's
                // newest segment instead of clobbering it. An archived segment
                // is never reopened.
                let next = list_segments(&self.policy)
                    .into_iter()
                    .filter(|segment| segment.date == date)
                    .map(|segment| segment.index + u32::from(segment.archived))
                    .max()
                    .unwrap_or(0);
                Some(next)
            }
        };

        if let Some(index) = next {
            let mut closed: Vec<PathBuf> = slot.take().map(|a| a.path).into_iter().collect();
            let rotated = !closed.is_empty();
            let mut segment = self.open(date, index)?;
            if segment.size > 0 && segment.size + incoming > self.policy.max_size {
                closed.push(segment.path.clone());
                segment = self.open(date, segment.index + 1)?;
            }
            if rotated {
                metrics::record_rotation(&self.policy.base);
                tracing::debug!(path = %segment.path.display(), "Log segment rotated");
            }
            if self.policy.zipped {
                closed.iter().for_each(|path| archive(path));
            }
            prune(&self.policy, date, &segment.path);
            *slot = Some(segment);
        }

        let Some(active) = slot.as_mut() else {
            return Ok(());
        };
        if let Err(source) = active.file.write_all(line.as_bytes()) {
            let path = active.path.display().to_string();
            *slot = None;
            return Err(SinkError::Io { path, source });
        }
        active.size += incoming;
        Ok(())
    }

    fn open(&self, date: NaiveDate, index: u32) -> Result<ActiveSegment, SinkError> {
        let path = self.policy.dir.join(self.policy.segment_name(date, index));
        let io_error = |source| SinkError::Io {
            path: path.display().to_string(),
            source,
        };
        fs::create_dir_all(&self.policy.dir).map_err(io_error)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_error)?;
        let size = file.metadata().map(|m| m.len()).map_err(io_error)?;
        Ok(ActiveSegment {
            date,
            index,
            path,
            file,
            size,
        })
    }
}

impl Sink for RotatingFileSink {
    fn name(&self) -> &str {
        &self.policy.base
    }

    fn accepts(&self, level: Level) -> bool {
        level >= self.policy.min_level
    }

    fn write(&self, record: &LogRecord, formatter: &Formatter) {
        let mut line = formatter.render_file(record, self.policy.layout);
        line.push('\n');
        if let Err(error) = self.append(&line) {
            report_failure(&self.policy.base, line.trim_end(), &error);
        }
    }
}

fn list_segments(policy: &RotationPolicy) -> Vec<Segment> {
    let Ok(entries) = fs::read_dir(&policy.dir) else {
        return Vec::new();
    };
    let mut segments: Vec<_> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|entry| {
            let name = entry.file_name();
            let name = name.to_str()?;
            let (plain, archived) = match name.strip_suffix(ARCHIVE_SUFFIX) {
                Some(plain) => (plain, true),
                None => (name, false),
            };
            let (date, index) = policy.parse_segment(plain)?;
            Some(Segment {
                date,
                index,
                archived,
                path: entry.path(),
            })
        })
        .collect();
    segments.sort();
    segments
}

fn archive(path: &Path) {
    match compress(path) {
        Ok(target) => tracing::debug!(path = %target.display(), "Log segment archived"),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to archive log segment")
        }
    }
}

/// Replace `path` with `path.gz`. The plain file survives any failure.
fn compress(path: &Path) -> io::Result<PathBuf> {
    let mut target = path.as_os_str().to_owned();
    target.push(ARCHIVE_SUFFIX);
    let target = PathBuf::from(target);

    let written = (|| {
        let mut source = File::open(path)?;
        let mut encoder = GzEncoder::new(File::create(&target)?, Compression::default());
        io::copy(&mut source, &mut encoder)?;
        encoder.finish()?.sync_all()
    })();
    if let Err(e) = written {
        let _ = fs::remove_file(&target);
        return Err(e);
    }
    fs::remove_file(path)?;
    Ok(target)
}

fn prune(policy: &RotationPolicy, today: NaiveDate, active: &Path) {
    let segments = list_segments(policy);
    let doomed: Vec<&Segment> = match policy.retention {
        Retention::Days(days) => {
            let cutoff = today
                .checked_sub_days(Days::new(u64::from(days.saturating_sub(1))))
                .unwrap_or(NaiveDate::MIN);
            segments.iter().filter(|s| s.date < cutoff).collect()
        }
        Retention::Files(files) => {
            let excess = segments.len().saturating_sub(files as usize);
            segments.iter().take(excess).collect()
        }
    };

    for path in doomed.into_iter().map(|s| &s.path).filter(|p| p.as_path() != active) {
        match fs::remove_file(path) {
            Ok(()) => tracing::debug!(path = %path.display(), "Expired log segment removed"),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove expired log segment"),
        }
    }
}
