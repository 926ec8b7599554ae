use std::fs;
use std::io;
use std::path::Path;

use crate::error::SettingsError;

/// Assumed time for the smallest maze when nothing smaller is logged.
const FLOOR: (u64, f64) = (8, 0.01);
/// Assumed time for a very large maze when nothing larger is logged.
const CEILING: (u64, f64) = (1_000_001, 300_000.0);

/// Past generation times by maze size (cell count), sorted by size with one entry per size.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeLog {
    entries: Vec<(u64, f64)>,
}

impl TimeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[(u64, f64)] {
        &self.entries
    }

    /// Parses `size,seconds;` records. The trailing `;` is optional.
    pub fn parse(text: &str) -> Result<Self, SettingsError> {
        let mut entries = text
            .split(';')
            .map(str::trim)
            .filter(|record| !record.is_empty())
            .enumerate()
            .map(|(i, record)| -> Result<(u64, f64), SettingsError> {
                let malformed = |reason: String| SettingsError::Malformed {
                    kind: "time log",
                    index: i + 1,
                    reason,
                };
                let (size, secs) = record
                    .split_once(',')
                    .ok_or_else(|| malformed(format!("{record:?} is not size,seconds")))?;
                let size = size
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| malformed(format!("bad size {size:?}")))?;
                let secs = secs
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|s| s.is_finite() && *s >= 0.0)
                    .ok_or_else(|| malformed(format!("bad duration {secs:?}")))?;
                Ok((size, secs))
            })
            .collect::<Result<Vec<_>, _>>()?;
        normalize(&mut entries);
        Ok(TimeLog { entries })
    }

    pub fn to_text(&self) -> String {
        self.entries
            .iter()
            .map(|(size, secs)| format!("{size},{secs};"))
            .collect()
    }

    /// Reads the log. A missing file is an empty log.
    pub fn load(path: &Path) -> crate::Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(Self::parse(&text)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> crate::Result<()> {
        fs::write(path, self.to_text())?;
        Ok(())
    }

    /// Adds a measurement. A size already logged is averaged with the new time.
    pub fn record(&mut self, size: u64, seconds: f64) {
        self.entries.push((size, seconds));
        normalize(&mut self.entries);
        tracing::debug!("[time log] recorded {} cells in {:.3}s", size, seconds);
    }

    /// Estimated seconds to generate a maze of `size` cells, interpolated linearly
    /// between the nearest logged sizes below and above.
    pub fn estimate(&self, size: u64) -> f64 {
        let mut small = FLOOR;
        let mut large = CEILING;
        for &(logged, secs) in &self.entries {
            if logged == size {
                return secs;
            } else if logged < size && logged > small.0 {
                small = (logged, secs);
            } else if logged > size && logged < large.0 {
                large = (logged, secs);
            }
        }
        let fraction = (size as f64 - small.0 as f64) / (large.0 as f64 - small.0 as f64);
        (small.1 + fraction * (large.1 - small.1)).max(0.0)
    }
}

/// Sorts by size and folds each run of equal sizes into a running average.
fn normalize(entries: &mut Vec<(u64, f64)>) {
    entries.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));
    entries.dedup_by(|later, kept| {
        if later.0 == kept.0 {
            kept.1 = (kept.1 + later.1) / 2.0;
            true
        } else {
            false
        }
    });
}

/// Rough number of carving steps for a `width` x `height` maze.
pub fn estimated_iterations(width: u16, height: u16) -> u64 {
    (width as f64 * height as f64 * 1.25).round() as u64
}

/// `"H hours, M minutes, S seconds"`, each part truncated to a whole number.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!(
        "{} hours, {} minutes, {} seconds",
        total / 3600,
        total % 3600 / 60,
        total % 60
    )
}
