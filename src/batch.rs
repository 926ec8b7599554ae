use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use rand::Rng;

use crate::config::Config;
use crate::error::{ConfigError, Error, FormatError, SettingsError};
use crate::list::{ListMaze, export, export_blocks};
use crate::loops::LoopInjector;
use crate::maze::Grid;
use crate::pipeline::generate_with_rng;
use crate::timelog::TimeLog;

const SEPARATOR: &str = " && ";

/// One stored set of maze settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub width: u16,
    pub height: u16,
    /// Carried for consumers that build geometry from the layout.
    pub gen_3d: bool,
    pub allow_loops: bool,
    pub loop_chance: u32,
    /// Carried for consumers that build geometry from the layout.
    pub allow_islands: bool,
    /// Import `list_maze` instead of generating.
    pub use_list_maze: bool,
    /// Path of a list maze file.
    pub list_maze: String,
    pub write_list_maze: bool,
}

impl Default for BatchEntry {
    fn default() -> Self {
        BatchEntry {
            width: 10,
            height: 10,
            gen_3d: false,
            allow_loops: false,
            loop_chance: 3,
            allow_islands: false,
            use_list_maze: false,
            list_maze: String::new(),
            write_list_maze: false,
        }
    }
}

impl BatchEntry {
    /// `wd,<w>;ht,<h>;3d,<0|1>;al,<0|1>;lc,<n>;ai,<0|1>;fl,<0|1>;lm,<ref>;wl,<0|1>`
    pub fn encode(&self) -> String {
        format!(
            "wd,{};ht,{};3d,{};al,{};lc,{};ai,{};fl,{};lm,{};wl,{}",
            self.width,
            self.height,
            u8::from(self.gen_3d),
            u8::from(self.allow_loops),
            self.loop_chance,
            u8::from(self.allow_islands),
            u8::from(self.use_list_maze),
            self.list_maze,
            u8::from(self.write_list_maze),
        )
    }

    /// Decodes one record. Missing keys keep their defaults and unknown keys are skipped.
    /// `index` is the 1-based record position, used in errors.
    pub fn decode(record: &str, index: usize) -> Result<Self, SettingsError> {
        let malformed = |reason: String| SettingsError::Malformed {
            kind: "batch",
            index,
            reason,
        };
        let number = |key: &str, value: &str| {
            value
                .trim()
                .parse::<u32>()
                .map_err(|_| malformed(format!("{key}: {value:?} is not a number")))
        };
        let flag = |key: &str, value: &str| number(key, value).map(|n| n != 0);
        let dimension = |key: &str, value: &str| {
            let n = number(key, value)?;
            u16::try_from(n).map_err(|_| malformed(format!("{key}: {n} is too large")))
        };

        let mut entry = BatchEntry::default();
        for slot in record.split(';').filter(|slot| !slot.trim().is_empty()) {
            let Some((key, value)) = slot.split_once(',') else {
                return Err(malformed(format!("slot {slot:?} has no value")));
            };
            match key.trim() {
                "wd" => entry.width = dimension(key, value)?,
                "ht" => entry.height = dimension(key, value)?,
                "3d" => entry.gen_3d = flag(key, value)?,
                "al" => entry.allow_loops = flag(key, value)?,
                "lc" => entry.loop_chance = number(key, value)?,
                "ai" => entry.allow_islands = flag(key, value)?,
                "fl" => entry.use_list_maze = flag(key, value)?,
                "lm" => entry.list_maze = value.to_string(),
                "wl" => entry.write_list_maze = flag(key, value)?,
                other => tracing::debug!("[batch] record {}: ignoring key {:?}", index, other),
            }
        }
        Ok(entry)
    }

    /// Overrides the dimensions and loop setting of `base`.
    pub fn apply(&self, base: &Config) -> Config {
        let mut config = base.clone();
        config.width = self.width;
        config.height = self.height;
        config.loop_chance = self.allow_loops.then_some(self.loop_chance);
        config
    }
}

impl fmt::Display for BatchEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)?;
        if self.allow_loops {
            write!(f, ", loops 1 in {}", self.loop_chance)?;
        }
        if self.use_list_maze {
            write!(f, ", from list {:?}", self.list_maze)?;
        }
        if self.write_list_maze {
            write!(f, ", writes list")?;
        }
        Ok(())
    }
}

/// Splits the store text into its records. Every record is prefixed by the separator.
pub fn decode_all(text: &str) -> Result<Vec<BatchEntry>, SettingsError> {
    let text = text.trim_end_matches(['\n', '\r']);
    let text = text.strip_prefix(SEPARATOR).unwrap_or(text);
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    text.split(SEPARATOR)
        .enumerate()
        .map(|(i, record)| BatchEntry::decode(record, i + 1))
        .collect()
}

pub fn encode_all(entries: &[BatchEntry]) -> String {
    entries
        .iter()
        .map(|entry| format!("{SEPARATOR}{}", entry.encode()))
        .collect()
}

/// Stored batch settings, kept in one flat text file.
#[derive(Debug, Clone)]
pub struct BatchStore {
    path: PathBuf,
}

impl BatchStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        BatchStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stored entries. A missing file is an empty store.
    pub fn load(&self) -> crate::Result<Vec<BatchEntry>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(decode_all(&text)?)
    }

    pub fn count(&self) -> crate::Result<usize> {
        Ok(self.load()?.len())
    }

    /// The entry at the 1-based `index`.
    pub fn get(&self, index: usize) -> crate::Result<BatchEntry> {
        let mut entries = self.load()?;
        let slot = checked_slot(index, entries.len())?;
        Ok(entries.swap_remove(slot))
    }

    /// Appends an entry and returns its 1-based index.
    pub fn store(&self, entry: &BatchEntry) -> crate::Result<usize> {
        let count = self.count()?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        write!(file, "{SEPARATOR}{}", entry.encode())?;
        tracing::info!("[batch] stored maze {}: {}", count + 1, entry);
        Ok(count + 1)
    }

    /// Removes the entry at the 1-based `index` and returns it.
    pub fn delete(&self, index: usize) -> crate::Result<BatchEntry> {
        let mut entries = self.load()?;
        let slot = checked_slot(index, entries.len())?;
        let removed = entries.remove(slot);
        fs::write(&self.path, encode_all(&entries))?;
        tracing::info!("[batch] deleted maze {}: {}", index, removed);
        Ok(removed)
    }

    pub fn clear(&self) -> crate::Result<()> {
        fs::write(&self.path, "")?;
        tracing::info!("[batch] cleared {}", self.path.display());
        Ok(())
    }

    /// Builds every stored maze with the carving options of `base`, writes the requested
    /// layouts into `out_dir` and adds the build times to the log at `time_log`.
    pub fn run(
        &self,
        base: &Config,
        out_dir: &Path,
        time_log: &Path,
    ) -> crate::Result<BatchReport> {
        let entries = self.load()?;
        if entries.is_empty() {
            return Err(SettingsError::Empty.into());
        }
        let mut log = TimeLog::load(time_log)?;
        let mut rng = base.rng();
        let report = run_batch(&entries, base, out_dir, &mut log, &mut rng)?;
        log.save(time_log)?;
        Ok(report)
    }
}

/// One maze built by a batch run.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltMaze {
    /// 1-based position of the entry.
    pub index: usize,
    pub width: u16,
    pub height: u16,
    pub seconds: f64,
    /// Where the block layout was written, if the entry asked for it.
    pub written: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub built: Vec<BuiltMaze>,
    /// Entries rejected for bad settings or a bad list maze, by 1-based index.
    pub skipped: Vec<(usize, Error)>,
    pub seconds: f64,
}

/// Builds `entries` in order. Entries failing with a [`ConfigError`] or a
/// [`FormatError`] are logged and skipped. IO errors stop the run.
///
/// Each built maze adds its cell count and build time to `time_log`. Entries with
/// `write_list_maze` set are written to `out_dir/maze_<index>.txt` as a block layout.
pub fn run_batch<R: Rng + ?Sized>(
    entries: &[BatchEntry],
    base: &Config,
    out_dir: &Path,
    time_log: &mut TimeLog,
    rng: &mut R,
) -> crate::Result<BatchReport> {
    let batch_start = Instant::now();
    let mut report = BatchReport::default();

    for (i, entry) in entries.iter().enumerate() {
        let index = i + 1;
        let start = Instant::now();
        let built = build_entry(entry, &entry.apply(base), rng).and_then(|grid| {
            let seconds = start.elapsed().as_secs_f64();
            let text = if entry.write_list_maze {
                Some(layout(entry, &grid)?.to_text())
            } else {
                None
            };
            Ok((grid, seconds, text))
        });
        let (grid, seconds, text) = match built {
            Ok(built) => built,
            Err(e @ (Error::Config(_) | Error::Format(_))) => {
                tracing::warn!("[batch] skipping maze {}: {}", index, e);
                report.skipped.push((index, e));
                continue;
            }
            Err(e) => return Err(e),
        };
        time_log.record(grid.len() as u64, seconds);

        let written = match text {
            Some(text) => {
                let path = out_dir.join(format!("maze_{index}.txt"));
                fs::write(&path, text)?;
                tracing::info!("[batch] wrote {}", path.display());
                Some(path)
            }
            None => None,
        };
        tracing::info!(
            "[batch] maze {}: {}x{} in {:.3}s",
            index,
            grid.width(),
            grid.height(),
            seconds
        );
        report.built.push(BuiltMaze {
            index,
            width: grid.width(),
            height: grid.height(),
            seconds,
            written,
        });
    }
    report.seconds = batch_start.elapsed().as_secs_f64();
    Ok(report)
}

/// Generates the maze for one entry, or imports its block layout when `use_list_maze`
/// is set. An imported layout keeps its own dimensions and gets loops from wall blocks.
pub fn build_entry<R: Rng + ?Sized>(
    entry: &BatchEntry,
    config: &Config,
    rng: &mut R,
) -> crate::Result<Grid> {
    if !entry.use_list_maze {
        return Ok(generate_with_rng(config, rng)?);
    }
    let grid = ListMaze::parse(&fs::read_to_string(&entry.list_maze)?)?.into_grid()?;
    match config.loop_chance {
        Some(0) => Err(ConfigError::LoopChance(0).into()),
        Some(chance) => Ok(LoopInjector::new(chance).apply_blocks(grid, rng)),
        None => Ok(grid),
    }
}

/// The block layout written for an entry. An imported layout already is one, so it is
/// written back cell for cell.
fn layout(entry: &BatchEntry, grid: &Grid) -> Result<ListMaze, FormatError> {
    if entry.use_list_maze {
        Ok(export(grid))
    } else {
        export_blocks(grid)
    }
}

fn checked_slot(index: usize, count: usize) -> Result<usize, SettingsError> {
    if count == 0 {
        return Err(SettingsError::Empty);
    }
    if index == 0 || index > count {
        return Err(SettingsError::NoSuchEntry { index, count });
    }
    Ok(index - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Algorithm;
    use rand::{SeedableRng, rngs::StdRng};
    use tempfile::TempDir;

    fn entry(width: u16, height: u16) -> BatchEntry {
        BatchEntry {
            width,
            height,
            ..BatchEntry::default()
        }
    }

    fn store_in(dir: &TempDir) -> BatchStore {
        BatchStore::new(dir.path().join("maze_setups.txt"))
    }

    #[test]
    fn test_encode_layout() {
        let e = BatchEntry {
            width: 12,
            height: 7,
            gen_3d: true,
            allow_loops: true,
            loop_chance: 4,
            allow_islands: false,
            use_list_maze: true,
            list_maze: "levels/a.txt".to_string(),
            write_list_maze: false,
        };
        assert_eq!(
            e.encode(),
            "wd,12;ht,7;3d,1;al,1;lc,4;ai,0;fl,1;lm,levels/a.txt;wl,0"
        );
        assert_eq!(BatchEntry::decode(&e.encode(), 1).unwrap(), e);
    }

    #[test]
    fn test_decode_skips_unknown_keys() {
        let e = BatchEntry::decode("wd,5;zz,9;ht,6", 1).unwrap();
        assert_eq!((e.width, e.height), (5, 6));
        assert!(!e.allow_loops);
    }

    #[test]
    fn test_decode_rejects_bad_values() {
        let err = BatchEntry::decode("wd,five;ht,6", 3).unwrap_err();
        assert!(matches!(err, SettingsError::Malformed { index: 3, .. }));
        assert!(BatchEntry::decode("wd,70000", 1).is_err());
        assert!(BatchEntry::decode("wd", 1).is_err());
    }

    #[test]
    fn test_decode_all_strips_leading_separator() {
        let text = " && wd,3;ht,4 && wd,5;ht,6";
        let entries = decode_all(text).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].width, 5);
        assert!(decode_all("").unwrap().is_empty());
        assert_eq!(encode_all(&entries), format!(" && {} && {}", entries[0].encode(), entries[1].encode()));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.count().unwrap(), 0);
        assert!(matches!(
            store.get(1),
            Err(Error::Settings(SettingsError::Empty))
        ));
    }

    #[test]
    fn test_store_get_delete() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.store(&entry(3, 4)).unwrap(), 1);
        assert_eq!(store.store(&entry(5, 6)).unwrap(), 2);
        assert_eq!(store.store(&entry(7, 8)).unwrap(), 3);
        assert_eq!(store.count().unwrap(), 3);
        assert_eq!(store.get(2).unwrap(), entry(5, 6));

        assert_eq!(store.delete(2).unwrap(), entry(5, 6));
        assert_eq!(store.load().unwrap(), vec![entry(3, 4), entry(7, 8)]);
        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.starts_with(" && wd,3;"));
    }

    #[test]
    fn test_index_out_of_range() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.store(&entry(3, 4)).unwrap();
        for index in [0, 2] {
            assert!(matches!(
                store.get(index),
                Err(Error::Settings(SettingsError::NoSuchEntry { count: 1, .. }))
            ));
        }
        assert!(store.delete(5).is_err());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_clear() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.store(&entry(3, 4)).unwrap();
        store.clear().unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_apply_overrides_dimensions_and_loops() {
        let base = Config::new(20, 20, Algorithm::Prims).with_seed(Some(9));
        let looped = BatchEntry {
            allow_loops: true,
            loop_chance: 6,
            ..entry(4, 5)
        };
        let config = looped.apply(&base);
        assert_eq!((config.width, config.height), (4, 5));
        assert_eq!(config.loop_chance, Some(6));
        assert_eq!(config.algorithm, Algorithm::Prims);
        assert_eq!(config.seed, Some(9));

        let plain = entry(4, 5).apply(&base.with_loops(Some(2)));
        assert_eq!(plain.loop_chance, None);
    }

    fn run(entries: &[BatchEntry], dir: &TempDir) -> (BatchReport, TimeLog) {
        let base = Config::new(2, 2, Algorithm::DepthFirst);
        let mut log = TimeLog::new();
        let mut rng = StdRng::seed_from_u64(3);
        let report = run_batch(entries, &base, dir.path(), &mut log, &mut rng).unwrap();
        (report, log)
    }

    #[test]
    fn test_run_skips_bad_entries() {
        let dir = TempDir::new().unwrap();
        let bad_loops = BatchEntry {
            allow_loops: true,
            loop_chance: 0,
            ..entry(6, 6)
        };
        let entries = [entry(5, 4), entry(1, 8), bad_loops, entry(7, 3)];
        let (report, log) = run(&entries, &dir);

        let built = report.built.iter().map(|m| (m.index, m.width, m.height)).collect::<Vec<_>>();
        assert_eq!(built, vec![(1, 5, 4), (4, 7, 3)]);
        assert_eq!(report.skipped.len(), 2);
        assert!(matches!(
            report.skipped[0],
            (2, Error::Config(ConfigError::Dimensions { width: 1, height: 8 }))
        ));
        assert!(matches!(report.skipped[1], (3, Error::Config(ConfigError::LoopChance(0)))));
        // Only the built mazes are timed
        let sizes = log.entries().iter().map(|&(size, _)| size).collect::<Vec<_>>();
        assert_eq!(sizes, vec![20, 21]);
    }

    #[test]
    fn test_run_writes_block_layouts() {
        let dir = TempDir::new().unwrap();
        let entries = [
            BatchEntry {
                write_list_maze: true,
                ..entry(6, 5)
            },
            entry(4, 4),
        ];
        let (report, _) = run(&entries, &dir);
        let path = dir.path().join("maze_1.txt");
        assert_eq!(report.built[0].written.as_deref(), Some(path.as_path()));
        assert_eq!(report.built[1].written, None);
        assert!(!dir.path().join("maze_2.txt").exists());

        // The written file is a wall-block layout of a perfect maze
        let grid = ListMaze::parse(&fs::read_to_string(&path).unwrap())
            .unwrap()
            .into_grid()
            .unwrap();
        assert_eq!((grid.width(), grid.height()), (13, 11));
        let paths = grid.cells().iter().filter(|c| c.is_path).count();
        assert_eq!(paths, 30 + 29);
        assert_eq!(grid.edge_count(), paths - 1);
    }

    #[test]
    fn test_run_imports_written_layout() {
        let dir = TempDir::new().unwrap();
        let first = [BatchEntry {
            write_list_maze: true,
            ..entry(8, 8)
        }];
        run(&first, &dir);
        let layout = dir.path().join("maze_1.txt");
        let text = fs::read_to_string(&layout).unwrap();

        let import = BatchEntry {
            use_list_maze: true,
            list_maze: layout.to_string_lossy().into_owned(),
            write_list_maze: true,
            ..entry(3, 3)
        };
        let looped = BatchEntry {
            allow_loops: true,
            loop_chance: 1,
            write_list_maze: false,
            ..import.clone()
        };
        let (report, log) = run(&[import, looped], &dir);
        assert_eq!(report.built.len(), 2);
        assert!(report.skipped.is_empty());
        // Dimensions come from the file, not the entry
        assert_eq!((report.built[0].width, report.built[0].height), (17, 17));
        assert_eq!(log.entries().len(), 1);
        assert_eq!(log.entries()[0].0, 289);

        // Imported without loops and written back unchanged
        let rewritten = fs::read_to_string(dir.path().join("maze_1.txt")).unwrap();
        assert_eq!(rewritten, text);
    }

    #[test]
    fn test_imported_layout_gets_loops() {
        let dir = TempDir::new().unwrap();
        let base = Config::new(10, 10, Algorithm::DepthFirst);
        let mut rng = StdRng::seed_from_u64(5);
        let grid = generate_with_rng(&base, &mut rng).unwrap();
        let layout = dir.path().join("layout.txt");
        fs::write(&layout, export_blocks(&grid).unwrap().to_text()).unwrap();

        let entry = BatchEntry {
            use_list_maze: true,
            list_maze: layout.to_string_lossy().into_owned(),
            allow_loops: true,
            loop_chance: 1,
            ..entry(10, 10)
        };
        let looped = build_entry(&entry, &entry.apply(&base), &mut rng).unwrap();
        let plain = ListMaze::parse(&fs::read_to_string(&layout).unwrap())
            .unwrap()
            .into_grid()
            .unwrap();
        let count = |g: &Grid| g.cells().iter().filter(|c| c.is_path).count();
        assert!(count(&looped) > count(&plain));
        assert!(looped.edge_count() > count(&looped) - 1);
        let reached = looped.reachable_from((1, 1));
        assert!(reached.iter().zip(looped.cells()).all(|(&r, c)| r == c.is_path));
    }

    #[test]
    fn test_bad_list_maze_is_skipped() {
        let dir = TempDir::new().unwrap();
        let broken = dir.path().join("broken.txt");
        fs::write(&broken, "0,0,1\n").unwrap();
        let entries = [
            BatchEntry {
                use_list_maze: true,
                list_maze: broken.to_string_lossy().into_owned(),
                ..entry(3, 3)
            },
            entry(3, 3),
        ];
        let (report, _) = run(&entries, &dir);
        assert_eq!(report.built.len(), 1);
        assert!(matches!(
            report.skipped[0],
            (1, Error::Format(FormatError::Parse { line: 1, .. }))
        ));
    }

    #[test]
    fn test_missing_list_maze_stops_the_run() {
        let dir = TempDir::new().unwrap();
        let entries = [BatchEntry {
            use_list_maze: true,
            list_maze: dir.path().join("nope.txt").to_string_lossy().into_owned(),
            ..entry(3, 3)
        }];
        let base = Config::new(2, 2, Algorithm::DepthFirst);
        let mut rng = StdRng::seed_from_u64(0);
        let result = run_batch(&entries, &base, dir.path(), &mut TimeLog::new(), &mut rng);
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_store_run_saves_time_log() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let log_path = dir.path().join("estimate_time_log.txt");
        let base = Config::new(2, 2, Algorithm::Prims).with_seed(Some(1));
        assert!(matches!(
            store.run(&base, dir.path(), &log_path),
            Err(Error::Settings(SettingsError::Empty))
        ));

        store.store(&entry(6, 6)).unwrap();
        store.store(&entry(0, 6)).unwrap();
        let report = store.run(&base, dir.path(), &log_path).unwrap();
        assert_eq!(report.built.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        let log = TimeLog::load(&log_path).unwrap();
        assert_eq!(log.entries().len(), 1);
        assert_eq!(log.entries()[0].0, 36);
    }

    #[test]
    fn test_cell_list_is_not_a_block_layout() {
        // A per-cell list has no walls, so it imports fully open
        let base = Config::new(4, 4, Algorithm::DepthFirst);
        let mut rng = StdRng::seed_from_u64(2);
        let grid = generate_with_rng(&base, &mut rng).unwrap();
        let cells = ListMaze::parse(&export(&grid).to_text()).unwrap().into_grid().unwrap();
        assert_eq!(cells.edge_count(), 24);
        let blocks = ListMaze::parse(&export_blocks(&grid).unwrap().to_text())
            .unwrap()
            .into_grid()
            .unwrap();
        let paths = blocks.cells().iter().filter(|c| c.is_path).count();
        assert_eq!(blocks.edge_count(), paths - 1);
    }
}
