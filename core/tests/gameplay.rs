use hexsweeper_core::*;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::sync::{Arc, Mutex};

const SEED: u64 = 57;

fn seeded(difficulty: Difficulty, first: Coord2) -> Engine {
    let mut engine = Engine::with_difficulty(difficulty);
    let mut rng = SmallRng::seed_from_u64(SEED);
    engine.seed_board_generation(first, &mut rng).unwrap();
    engine
}

fn in_bounds_neighbors(grid: &Grid, coords: Coord2) -> Vec<Coord2> {
    grid.neighbors_of(coords)
        .into_iter()
        .filter(|&(row, col)| {
            row >= 0 && col >= 0 && row < grid.rows() as isize && col < grid.cols() as isize
        })
        .map(|(row, col)| (row as Coord, col as Coord))
        .collect()
}

#[test]
fn every_tier_starts_without_tiles() {
    let table = [
        (Difficulty::VeryEasy, 16, 16, 12),
        (Difficulty::Easy, 16, 20, 40),
        (Difficulty::Normal, 16, 24, 76),
        (Difficulty::Hard, 20, 24, 120),
        (Difficulty::VeryHard, 24, 30, 240),
    ];
    for (tier, rows, cols, mines) in table {
        let engine = Engine::with_difficulty(tier);
        assert_eq!(engine.rows(), rows);
        assert_eq!(engine.cols(), cols);
        assert_eq!(engine.mine_total(), mines);
        assert!(!engine.grid().is_generated());
        assert_eq!(engine.grid().iter_tiles().count(), 0);
        assert!(!engine.is_game_over());
        assert!(engine.did_win());
    }
}

#[test]
fn first_reveal_is_always_safe() {
    for seed in 0..32 {
        let mut engine = Engine::new(EngineConfig {
            seed: Some(seed),
            ..EngineConfig::new(Difficulty::VeryHard)
        });
        let first = ((seed % 24) as Coord, (seed * 7 % 30) as Coord);
        let outcome = engine.apply_action(first, Action::Reveal);

        assert_ne!(outcome, ActionOutcome::HitMine);
        assert_eq!(engine.grid().mine_count(), 240);
        let near_first = engine
            .grid()
            .iter_tiles()
            .filter(|tile| tile.is_mine())
            .filter(|tile| {
                tile.row().abs_diff(first.0) <= 1 && tile.col().abs_diff(first.1) <= 1
            })
            .count();
        assert_eq!(near_first, 0, "seed {seed}");
    }
}

#[test]
fn counts_match_brute_force_recount() {
    let engine = seeded(Difficulty::Normal, (0, 0));
    let grid = engine.grid();
    for tile in grid.iter_tiles().filter(|tile| !tile.is_mine()) {
        let mines = in_bounds_neighbors(grid, tile.coords())
            .into_iter()
            .filter(|&pos| grid.tile(pos).is_some_and(Tile::is_mine))
            .count();
        assert_eq!(tile.adjacent_mines() as usize, mines, "{:?}", tile.coords());
    }
}

#[test]
fn reveal_opens_zero_region_and_its_border() {
    let mut engine = seeded(Difficulty::Normal, (8, 12));
    engine.apply_action((8, 12), Action::Reveal);
    let grid = engine.grid();

    let mut revealed = 0;
    for tile in grid.iter_tiles() {
        match tile.status() {
            RevealStatus::Revealed => {
                revealed += 1;
                assert!(!tile.is_mine());
                if tile.adjacent_mines() == 0 {
                    for pos in in_bounds_neighbors(grid, tile.coords()) {
                        assert_eq!(
                            grid.tile(pos).unwrap().status(),
                            RevealStatus::Revealed,
                            "zero cell {:?} left {:?} closed",
                            tile.coords(),
                            pos
                        );
                    }
                }
            }
            status => assert_eq!(status, RevealStatus::Unrevealed),
        }
    }
    assert!(revealed >= 7);
    assert_eq!(engine.revealed_count(), revealed);
}

#[test]
fn mine_hit_freezes_the_board() {
    let mut engine = seeded(Difficulty::Normal, (0, 0));
    let mine = engine
        .grid()
        .iter_tiles()
        .find(|tile| tile.is_mine())
        .map(Tile::coords)
        .unwrap();

    assert_eq!(engine.apply_action(mine, Action::Reveal), ActionOutcome::HitMine);
    assert!(engine.is_game_over());
    assert!(!engine.did_win());
    assert!(
        engine
            .grid()
            .iter_tiles()
            .all(|tile| tile.is_mine() == (tile.status() == RevealStatus::MineExposed))
    );

    let before = engine.grid().clone();
    for coords in [(0, 0), (5, 5), mine] {
        assert_eq!(engine.apply_action(coords, Action::Reveal), ActionOutcome::NoChange);
        assert_eq!(engine.apply_action(coords, Action::ToggleFlag), ActionOutcome::NoChange);
    }
    assert_eq!(engine.neighbor_click_action((5, 5)), ActionOutcome::NoChange);
    assert_eq!(engine.grid(), &before);
}

#[test]
fn double_flag_restores_and_flag_blocks_reveal() {
    let mut engine = seeded(Difficulty::Normal, (0, 0));
    let mine = engine
        .grid()
        .iter_tiles()
        .find(|tile| tile.is_mine())
        .map(Tile::coords)
        .unwrap();

    engine.apply_action(mine, Action::ToggleFlag);
    assert_eq!(engine.apply_action(mine, Action::Reveal), ActionOutcome::NoChange);
    assert!(!engine.is_game_over());
    engine.apply_action(mine, Action::ToggleFlag);
    assert_eq!(
        engine.grid().tile(mine).unwrap().status(),
        RevealStatus::Unrevealed
    );
}

#[test]
fn flag_counter_tracks_flags() {
    let mut engine = seeded(Difficulty::Normal, (0, 0));
    for coords in [(4, 4), (3, 6), (2, 2)] {
        engine.apply_action(coords, Action::ToggleFlag);
    }
    assert_eq!(engine.flag_count(), 3);
    assert_eq!(engine.mine_counter_label(), "3 / 76");
    assert_eq!(engine.mines_left(), 73);
}

#[test]
fn clearing_the_board_wins_and_records_time() {
    let ledger = Arc::new(Mutex::new(ScoreLedger::in_memory()));
    let mut engine = seeded(Difficulty::Easy, (4, 4)).with_ledger(ledger.clone());
    for _ in 0..300 {
        engine.tick();
    }

    let safe: Vec<_> = engine
        .grid()
        .iter_tiles()
        .filter(|tile| !tile.is_mine())
        .map(Tile::coords)
        .collect();
    let mut last = ActionOutcome::NoChange;
    for coords in safe {
        last = last | engine.apply_action(coords, Action::Reveal);
    }

    assert_eq!(last, ActionOutcome::Won);
    assert!(engine.is_game_over());
    assert!(engine.did_win());
    assert_eq!(engine.revealed_count(), 320 - 40);
    let ledger = ledger.lock().unwrap();
    assert_eq!(ledger.top_times(Difficulty::Easy)[0], Some(3.0));
}

#[test]
fn save_then_load_reproduces_the_board() {
    let mut engine = seeded(Difficulty::Normal, (0, 0));
    engine.apply_action((0, 0), Action::Reveal);
    for coords in [(4, 4), (3, 6), (2, 2)] {
        engine.apply_action(coords, Action::ToggleFlag);
    }
    let mut data = Vec::new();
    engine.save_to(&mut data).unwrap();

    let mut loaded = Engine::from_reader(EngineConfig::default(), data.as_slice()).unwrap();
    loaded.tick();

    for (a, b) in engine.grid().iter_tiles().zip(loaded.grid().iter_tiles()) {
        assert_eq!(a.status(), b.status());
    }
    assert_eq!(loaded.flag_count(), engine.flag_count());
    assert_eq!(loaded.grid().mine_count(), engine.grid().mine_count());
    assert!(loaded.is_paused());
    assert_eq!(loaded.elapsed_ms(), Some(0));
}

#[test]
fn two_ticks_are_two_increments() {
    let mut engine = seeded(Difficulty::Normal, (0, 0));
    engine.enable_timer();
    engine.tick();
    assert_eq!(engine.seconds_elapsed(), 0.01);
    engine.tick();
    assert_eq!(engine.seconds_elapsed(), 0.02);
    assert!(!engine.is_game_over());
}

#[test]
fn ledger_keeps_a_recorded_time() {
    let mut ledger = ScoreLedger::in_memory();
    ledger.record(5.75, Difficulty::VeryEasy, true);
    assert!(ledger.top_times(Difficulty::VeryEasy).contains(&Some(5.75)));
}
