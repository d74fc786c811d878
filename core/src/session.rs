//! Saving and restoring a running session.
//!
//! A session is written as one versioned JSON document. Loading parses and checks the whole document before the
//! engine is touched, so a failed load leaves the current game exactly as it was.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::*;

/// Version written into every saved session.
pub const SESSION_FORMAT_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SessionSnapshot {
    version: u32,
    grid: Grid,
    mine_total: CellCount,
    difficulty: Difficulty,
    game_over: bool,
    revealed_count: CellCount,
    won: bool,
    /// Whole seconds on the clock, `None` if the game never started.
    elapsed_secs: Option<u64>,
}

/// Validated state waiting to be committed.
struct StagedSession {
    difficulty: Difficulty,
    grid: Grid,
    state: EngineState,
    revealed_count: CellCount,
    elapsed_ms: Option<u64>,
}

impl SessionSnapshot {
    fn capture(engine: &Engine) -> Self {
        Self {
            version: SESSION_FORMAT_VERSION,
            grid: engine.grid().clone(),
            mine_total: engine.mine_total(),
            difficulty: engine.difficulty(),
            game_over: engine.is_game_over(),
            revealed_count: engine.revealed_count(),
            won: engine.did_win(),
            elapsed_secs: engine.elapsed_ms().map(|ms| ms / 1000),
        }
    }

    fn stage(self) -> core::result::Result<StagedSession, SessionError> {
        if self.version != SESSION_FORMAT_VERSION {
            return Err(SessionError::UnsupportedVersion(self.version));
        }

        self.grid.validate()?;
        if self.mine_total != self.grid.mine_total() {
            return Err(SessionError::Corrupt(format!(
                "mine total {} does not match the grid's {}",
                self.mine_total,
                self.grid.mine_total()
            )));
        }

        let revealed = self.grid.count_status(RevealStatus::Revealed);
        if self.revealed_count != revealed {
            return Err(SessionError::Corrupt(format!(
                "revealed count {} but {} cells are revealed",
                self.revealed_count, revealed
            )));
        }

        let state = match (self.grid.is_generated(), self.game_over, self.won) {
            (_, false, false) => {
                return Err(SessionError::Corrupt(
                    "lost game that is not over".to_owned(),
                ));
            }
            (false, true, _) => {
                return Err(SessionError::Corrupt(
                    "finished game without a board".to_owned(),
                ));
            }
            (false, false, true) => EngineState::NotStarted,
            (true, false, true) => EngineState::InProgress,
            (true, true, true) => EngineState::Won,
            (true, true, false) => EngineState::Lost,
        };

        let cleared = self.revealed_count >= self.grid.config().safe_cell_count();
        match state {
            EngineState::InProgress if cleared => {
                return Err(SessionError::Corrupt(
                    "cleared board that is still in progress".to_owned(),
                ));
            }
            EngineState::Won if !cleared => {
                return Err(SessionError::Corrupt(
                    "won game with safe cells left".to_owned(),
                ));
            }
            _ => {}
        }

        let elapsed_ms = match (state, self.elapsed_secs) {
            (EngineState::NotStarted, _) => None,
            (_, secs) => Some(secs.unwrap_or(0).saturating_mul(1000)),
        };

        Ok(StagedSession {
            difficulty: self.difficulty,
            grid: self.grid,
            state,
            revealed_count: self.revealed_count,
            elapsed_ms,
        })
    }
}

impl Engine {
    /// Writes the session to `writer`, the game itself is unaffected.
    pub fn save_to<W: Write>(&self, mut writer: W) -> core::result::Result<(), SessionError> {
        let snapshot = serde_json::to_vec(&SessionSnapshot::capture(self))?;
        writer.write_all(&snapshot)?;
        writer.flush()?;
        log::debug!("Saved session {:?}", self.session_id());
        Ok(())
    }

    /// Replaces this session with one read from `reader`.
    ///
    /// Either the whole saved session is taken over or nothing changes. The restored clock stays stopped until
    /// [`Engine::enable_timer`] is called, and the session gets a new identity.
    pub fn load_from<R: Read>(&mut self, reader: R) -> core::result::Result<(), SessionError> {
        let snapshot: SessionSnapshot = serde_json::from_reader(reader)?;
        let staged = snapshot.stage()?;
        self.replace_session(
            staged.difficulty,
            staged.grid,
            staged.state,
            staged.revealed_count,
            staged.elapsed_ms,
        );
        self.notify();
        Ok(())
    }

    /// Builds a new engine from a saved session, `config` supplies everything the save does not carry.
    pub fn from_reader<R: Read>(
        config: EngineConfig,
        reader: R,
    ) -> core::result::Result<Self, SessionError> {
        let mut engine = Engine::new(config);
        engine.load_from(reader)?;
        Ok(engine)
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> core::result::Result<(), SessionError> {
        let file = File::create(path)?;
        self.save_to(BufWriter::new(file))
    }

    pub fn load_from_path(&mut self, path: impl AsRef<Path>) -> core::result::Result<(), SessionError> {
        let file = File::open(path)?;
        self.load_from(BufReader::new(file))
    }
}
