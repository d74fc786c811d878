use core::fmt;
use core::time::Duration;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::*;

/// Default interval between two [`Engine::tick`] calls.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 10;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    /// No cell has been revealed, the board does not exist yet
    #[default]
    NotStarted,
    InProgress,
    Won,
    Lost,
}

impl EngineState {
    pub const fn is_started(self) -> bool {
        !matches!(self, Self::NotStarted)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// What a paused session does with incoming moves.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PausePolicy {
    /// Pausing only stops the clock.
    #[default]
    AcceptInput,
    /// Moves are ignored until the timer is enabled again.
    BlockInput,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub difficulty: Difficulty,
    /// Board used instead of the tier's preset; such games do not enter the score ledger.
    pub custom_board: Option<GameConfig>,
    pub tick_interval_ms: u64,
    pub pause_policy: PausePolicy,
    /// Fixed seed for mine placement, fresh entropy when `None`.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            custom_board: None,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            pause_policy: PausePolicy::default(),
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            ..Default::default()
        }
    }

    pub fn game_config(&self) -> GameConfig {
        self.custom_board
            .unwrap_or_else(|| self.difficulty.game_config())
    }
}

/// Identity of one game session, used to tell stale timer tasks apart.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Receives the board every time something visible changed.
pub trait Observer: Send {
    fn update(&mut self, engine: &Engine, grid: &Grid);
}

impl<F> Observer for F
where
    F: FnMut(&Engine, &Grid) + Send,
{
    fn update(&mut self, engine: &Engine, grid: &Grid) {
        self(engine, grid)
    }
}

pub type SharedLedger = Arc<Mutex<ScoreLedger>>;

/// A single game session on top of a [`Grid`].
pub struct Engine {
    session: SessionId,
    config: EngineConfig,
    grid: Grid,
    state: EngineState,
    revealed_count: CellCount,
    elapsed_ms: Option<u64>,
    timer_enabled: bool,
    rng: SmallRng,
    observer: Option<Box<dyn Observer>>,
    ledger: Option<SharedLedger>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("session", &self.session)
            .field("config", &self.config)
            .field("state", &self.state)
            .field("revealed_count", &self.revealed_count)
            .field("elapsed_ms", &self.elapsed_ms)
            .field("timer_enabled", &self.timer_enabled)
            .field("has_observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        let grid = Grid::new(config.game_config());
        let session = SessionId::next();
        log::debug!(
            "New session {:?}: {} ({}x{}, {} mines)",
            session,
            config.difficulty,
            grid.rows(),
            grid.cols(),
            grid.mine_total()
        );
        Self {
            session,
            config,
            grid,
            state: EngineState::default(),
            revealed_count: 0,
            elapsed_ms: None,
            timer_enabled: true,
            rng,
            observer: None,
            ledger: None,
        }
    }

    pub fn with_difficulty(difficulty: Difficulty) -> Self {
        Self::new(EngineConfig::new(difficulty))
    }

    pub fn with_ledger(mut self, ledger: SharedLedger) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn set_ledger(&mut self, ledger: Option<SharedLedger>) {
        self.ledger = ledger;
    }

    pub fn ledger(&self) -> Option<&SharedLedger> {
        self.ledger.as_ref()
    }

    /// Registers the single observer, returning the one it replaces.
    pub fn set_observer(&mut self, observer: impl Observer + 'static) -> Option<Box<dyn Observer>> {
        self.observer.replace(Box::new(observer))
    }

    pub fn clear_observer(&mut self) -> Option<Box<dyn Observer>> {
        self.observer.take()
    }

    pub fn session_id(&self) -> SessionId {
        self.session
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn difficulty(&self) -> Difficulty {
        self.config.difficulty
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_game_over(&self) -> bool {
        self.state.is_finished()
    }

    /// True until a mine is hit.
    pub fn did_win(&self) -> bool {
        !matches!(self.state, EngineState::Lost)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn rows(&self) -> Coord {
        self.grid.rows()
    }

    pub fn cols(&self) -> Coord {
        self.grid.cols()
    }

    pub fn mine_total(&self) -> CellCount {
        self.grid.mine_total()
    }

    pub fn flag_count(&self) -> CellCount {
        self.grid.flag_count()
    }

    /// How many mines have not been flagged yet, negative when over-flagged.
    pub fn mines_left(&self) -> isize {
        (self.mine_total() as isize) - (self.flag_count() as isize)
    }

    /// Counter text shown next to the board, e.g. `3 / 76`.
    pub fn mine_counter_label(&self) -> String {
        format!("{} / {}", self.flag_count(), self.mine_total())
    }

    pub fn revealed_count(&self) -> CellCount {
        self.revealed_count
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.config.tick_interval_ms)
    }

    /// Adds one tick interval to the clock if it is running.
    pub fn tick(&mut self) {
        if !self.timer_enabled || self.state.is_finished() {
            return;
        }
        if let Some(elapsed) = self.elapsed_ms.as_mut() {
            *elapsed += self.config.tick_interval_ms;
        }
    }

    /// Milliseconds on the clock, `None` before the board is generated.
    pub fn elapsed_ms(&self) -> Option<u64> {
        self.elapsed_ms
    }

    pub fn seconds_elapsed(&self) -> f64 {
        self.elapsed_ms.map_or(0.0, |ms| ms as f64 / 1000.0)
    }

    pub fn enable_timer(&mut self) {
        log::debug!("Timer enabled");
        self.timer_enabled = true;
    }

    pub fn disable_timer(&mut self) {
        log::debug!("Timer disabled");
        self.timer_enabled = false;
    }

    pub fn is_paused(&self) -> bool {
        !self.timer_enabled
    }

    /// Generates the board around `first` with a caller supplied RNG and starts the clock, without revealing anything.
    pub fn seed_board_generation<R: rand::Rng + ?Sized>(
        &mut self,
        first: Coord2,
        rng: &mut R,
    ) -> Result<()> {
        self.grid.config().validate_coords(first)?;
        self.grid.generate(first, rng)?;
        self.mark_started();
        Ok(())
    }

    /// Uses a fixed layout instead of random placement and starts the clock.
    pub fn populate_board(&mut self, layout: MineLayout) -> Result<()> {
        self.grid.populate(layout)?;
        self.mark_started();
        Ok(())
    }

    /// Applies a reveal or flag gesture. Moves that do not apply are ignored and reported as `NoChange`.
    pub fn apply_action(&mut self, coords: Coord2, action: Action) -> ActionOutcome {
        let outcome = self.apply_action_quiet(coords, action);
        self.publish(outcome);
        outcome
    }

    /// Reveals every neighbor of a cell at once, unless the cell itself is flagged.
    pub fn neighbor_click_action(&mut self, coords: Coord2) -> ActionOutcome {
        if !self.accepts_input() {
            return ActionOutcome::NoChange;
        }
        match self.grid.tile(coords) {
            Some(tile) if tile.status() != RevealStatus::Flagged => {}
            _ => return ActionOutcome::NoChange,
        }

        let mut outcome = ActionOutcome::NoChange;
        for neighbor in self.grid.iter_neighbors(coords) {
            outcome = outcome | self.apply_action_quiet(neighbor, Action::Reveal);
            if outcome.is_terminal() {
                break;
            }
        }
        self.publish(outcome);
        outcome
    }

    fn accepts_input(&self) -> bool {
        if self.state.is_finished() {
            return false;
        }
        match self.config.pause_policy {
            PausePolicy::AcceptInput => true,
            PausePolicy::BlockInput => self.timer_enabled,
        }
    }

    fn apply_action_quiet(&mut self, coords: Coord2, action: Action) -> ActionOutcome {
        use ActionOutcome::*;
        use RevealStatus::*;

        if !self.accepts_input() || !self.grid.contains(coords) {
            return NoChange;
        }

        if !self.grid.is_generated() {
            if action != Action::Reveal {
                return NoChange;
            }
            if let Err(err) = self.grid.generate(coords, &mut self.rng) {
                log::warn!("Could not generate board around {:?}: {}", coords, err);
                return NoChange;
            }
            self.mark_started();
        }

        let Some(tile) = self.grid.tile(coords).copied() else {
            return NoChange;
        };

        let outcome = match (tile.status(), action) {
            (Flagged, Action::ToggleFlag) => {
                self.set_status(coords, Unrevealed);
                Changed
            }
            (Flagged, Action::Reveal) => NoChange,
            (Unrevealed, Action::Reveal) if tile.is_mine() => {
                log::debug!("Mine hit at {:?}", coords);
                self.reveal_all_mines();
                self.end_game(false);
                return HitMine;
            }
            (Unrevealed, Action::Reveal) => {
                self.flood_reveal(coords);
                Changed
            }
            (Unrevealed, Action::ToggleFlag) => {
                self.set_status(coords, Flagged);
                Changed
            }
            (Revealed | MineExposed, _) => NoChange,
        };

        if outcome.has_update() && self.revealed_count >= self.grid.config().safe_cell_count() {
            self.reveal_all_mines();
            self.end_game(true);
            return Won;
        }
        outcome
    }

    fn set_status(&mut self, coords: Coord2, status: RevealStatus) {
        if let Some(tile) = self.grid.tile_mut(coords) {
            tile.set_status(status);
        }
    }

    /// Reveals `start` and keeps opening outward while the opened cells have no adjacent mines.
    fn flood_reveal(&mut self, start: Coord2) {
        let mut to_visit = VecDeque::from([start]);

        while let Some(coords) = to_visit.pop_front() {
            let Some(tile) = self.grid.tile_mut(coords) else {
                continue;
            };
            // flagged and already opened cells stop the fill
            if tile.status() != RevealStatus::Unrevealed || tile.is_mine() {
                continue;
            }

            tile.set_status(RevealStatus::Revealed);
            let adjacent_mines = tile.adjacent_mines();
            self.revealed_count += 1;
            log::trace!("Revealed {:?}, adjacent mines: {}", coords, adjacent_mines);

            if adjacent_mines == 0 {
                let grid = &self.grid;
                to_visit.extend(grid.iter_neighbors(coords).filter(|&pos| {
                    grid.tile(pos).is_some_and(|neighbor| {
                        neighbor.status() == RevealStatus::Unrevealed && !neighbor.is_mine()
                    })
                }));
            }
        }
    }

    /// Shows every mine, leaves the other cells untouched.
    fn reveal_all_mines(&mut self) {
        for tile in self.grid.iter_tiles_mut().filter(|tile| tile.is_mine()) {
            tile.set_status(RevealStatus::MineExposed);
        }
    }

    fn mark_started(&mut self) {
        if matches!(self.state, EngineState::NotStarted) {
            log::debug!("Session {:?} started", self.session);
            self.state = EngineState::InProgress;
            self.elapsed_ms = Some(0);
        }
    }

    fn end_game(&mut self, won: bool) {
        if self.state.is_finished() {
            return;
        }

        self.state = if won {
            EngineState::Won
        } else {
            EngineState::Lost
        };
        log::debug!(
            "Session {:?} ended ({:?}) after {:.2}s",
            self.session,
            self.state,
            self.seconds_elapsed()
        );
        if won {
            self.record_score();
        }
    }

    fn record_score(&self) {
        if self.config.custom_board.is_some() {
            log::debug!("Custom board, time not recorded");
            return;
        }
        let Some(ledger) = &self.ledger else {
            return;
        };
        match ledger.lock() {
            Ok(mut ledger) => {
                ledger.record(self.seconds_elapsed(), self.config.difficulty, true);
            }
            Err(_) => log::warn!("Score ledger lock poisoned, time not recorded"),
        }
    }

    fn publish(&mut self, outcome: ActionOutcome) {
        if outcome.has_update() {
            self.notify();
        }
    }

    pub(crate) fn notify(&mut self) {
        if let Some(mut observer) = self.observer.take() {
            observer.update(self, &self.grid);
            self.observer = Some(observer);
        }
    }

    /// Replaces the whole session with already validated state.
    pub(crate) fn replace_session(
        &mut self,
        difficulty: Difficulty,
        grid: Grid,
        state: EngineState,
        revealed_count: CellCount,
        elapsed_ms: Option<u64>,
    ) {
        let board = grid.config();
        self.config.difficulty = difficulty;
        self.config.custom_board = (board != difficulty.game_config()).then_some(board);
        self.session = SessionId::next();
        self.grid = grid;
        self.state = state;
        self.revealed_count = revealed_count;
        self.elapsed_ms = elapsed_ms;
        self.timer_enabled = false;
        log::debug!("Session {:?} loaded ({:?})", self.session, self.state);
    }
}
