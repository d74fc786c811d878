use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::*;

/// Slots kept per difficulty.
pub const TOP_TIMES: usize = 5;

/// File name used when no other location is configured.
pub const DEFAULT_SCORES_FILE: &str = "scores.txt";

/// Best-first completion times for one tier, `None` marks an unfilled slot.
pub type TopTimes = [Option<f64>; TOP_TIMES];

/// Best completion times per difficulty, stored as `<seconds> <tier label>` lines.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreLedger {
    path: Option<PathBuf>,
    times: BTreeMap<Difficulty, TopTimes>,
}

impl Default for ScoreLedger {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl ScoreLedger {
    /// A ledger that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            times: Difficulty::ALL
                .into_iter()
                .map(|tier| (tier, [None; TOP_TIMES]))
                .collect(),
        }
    }

    /// Loads the ledger stored at `path`, a missing or unreadable file is an empty history.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let mut ledger = Self::in_memory();
        match fs::File::open(&path) {
            Ok(file) => {
                if let Err(err) = ledger.load_from(BufReader::new(file)) {
                    log::warn!("Could not read scores from {}: {}", path.display(), err);
                }
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::debug!("No score file at {}, starting empty", path.display());
            }
            Err(err) => log::warn!("Could not open {}: {}", path.display(), err),
        }
        ledger.path = Some(path);
        ledger
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Replays every well-formed line through [`ScoreLedger::record`], skipping the rest.
    pub fn load_from<R: BufRead>(&mut self, reader: R) -> io::Result<()> {
        for (number, line) in reader.split(b'\n').enumerate() {
            let line = line?;
            let Ok(line) = std::str::from_utf8(&line) else {
                log::debug!("Skipping undecodable score line {}", number + 1);
                continue;
            };
            match parse_line(line) {
                Some((time, tier)) => {
                    self.record(time, tier, false);
                }
                None if line.trim().is_empty() => {}
                None => log::debug!("Skipping malformed score line {}: {:?}", number + 1, line),
            }
        }
        Ok(())
    }

    /// Inserts `time` if it beats a kept time or an empty slot is left, returns whether the table changed.
    pub fn record(&mut self, time: f64, tier: Difficulty, persist: bool) -> bool {
        if !time.is_finite() || time <= 0.0 {
            log::debug!("Ignoring invalid time {} for {}", time, tier);
            return false;
        }

        let slots = self.times.entry(tier).or_insert([None; TOP_TIMES]);
        let mut carried = Some(time);
        let mut changed = false;
        for slot in slots.iter_mut() {
            let Some(candidate) = carried else {
                break;
            };
            if slot.is_none_or(|kept| candidate < kept) {
                carried = slot.replace(candidate);
                changed = true;
            }
        }

        if changed {
            log::debug!("New best time {:.2}s for {}", time, tier);
            if persist {
                self.persist();
            }
        }
        changed
    }

    pub fn top_times(&self, tier: Difficulty) -> &TopTimes {
        const EMPTY: TopTimes = [None; TOP_TIMES];
        self.times.get(&tier).unwrap_or(&EMPTY)
    }

    /// Writes the table, one line per kept time.
    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for (tier, slots) in &self.times {
            for time in slots.iter().flatten() {
                writeln!(writer, "{} {}", time, tier.label())?;
            }
        }
        writer.flush()
    }

    /// Saves to the backing file, creating it on a first failure; a second failure is logged and dropped.
    fn persist(&self) {
        let Some(path) = &self.path else {
            return;
        };

        if let Err(err) = self.write_file(path) {
            log::debug!("Retrying score save to {}: {}", path.display(), err);
            let retried = ensure_file(path).and_then(|()| self.write_file(path));
            if let Err(err) = retried {
                log::warn!("Dropping score save to {}: {}", path.display(), err);
            }
        }
    }

    fn write_file(&self, path: &Path) -> io::Result<()> {
        let file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(path)?;
        self.write_to(BufWriter::new(file))
    }
}

fn ensure_file(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)?;
    Ok(())
}

fn parse_line(line: &str) -> Option<(f64, Difficulty)> {
    let (time, tier) = line.trim_end().split_once(' ')?;
    Some((time.parse().ok()?, tier.parse().ok()?))
}
