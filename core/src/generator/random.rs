use rand::Rng;

use super::*;

/// Uniform mine placement that keeps the 3x3 box around the first click free of mines, so the opening move is always
/// safe and usually opens a region.
#[derive(Debug)]
pub struct RandomMineGenerator<'a, R: ?Sized> {
    rng: &'a mut R,
    start: Coord2,
}

impl<'a, R: Rng + ?Sized> RandomMineGenerator<'a, R> {
    pub fn new(rng: &'a mut R, start: Coord2) -> Self {
        Self { rng, start }
    }
}

impl<R: Rng + ?Sized> MineGenerator for RandomMineGenerator<'_, R> {
    fn generate(self, config: GameConfig) -> Result<MineLayout> {
        let start = config.validate_coords(self.start)?;
        let (rows, cols) = config.size;

        // rejection sampling only terminates if enough cells are eligible
        let excluded = (0..rows)
            .flat_map(|row| (0..cols).map(move |col| (row, col)))
            .filter(|&coords| within_exclusion_zone(coords, start))
            .count() as CellCount;
        let eligible = config.total_cells() - excluded;
        if config.mines > eligible {
            log::warn!(
                "Cannot place {} mines outside the opening zone, only {} cells are eligible",
                config.mines,
                eligible
            );
            return Err(GameError::TooManyMines);
        }

        let mut mines: Array2<bool> = Array2::default(config.size.to_nd_index());
        let mut mines_placed: CellCount = 0;
        let mut rejected = 0usize;
        while mines_placed < config.mines {
            let coords = (self.rng.random_range(0..rows), self.rng.random_range(0..cols));
            if mines[coords.to_nd_index()] || within_exclusion_zone(coords, start) {
                rejected += 1;
                continue;
            }
            mines[coords.to_nd_index()] = true;
            mines_placed += 1;
        }

        log::debug!(
            "Placed {} mines around start {:?}, {} draws rejected",
            mines_placed,
            start,
            rejected
        );
        Ok(MineLayout::from_mine_mask(mines))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn keeps_opening_zone_clear() {
        let config = Difficulty::VeryHard.game_config();
        for seed in 0..16 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let start = (10, 17);
            let layout = RandomMineGenerator::new(&mut rng, start)
                .generate(config)
                .unwrap();

            assert_eq!(layout.mine_count(), config.mines);
            assert!(layout.iter_mines().all(|mine| !within_exclusion_zone(mine, start)));
        }
    }

    #[test]
    fn corner_start_leaves_a_smaller_zone() {
        // 4x4 board, a corner start excludes 4 cells so 12 mines fit
        let config = GameConfig::new((4, 4), 12);
        let mut rng = SmallRng::seed_from_u64(7);
        let layout = RandomMineGenerator::new(&mut rng, (0, 0))
            .generate(config)
            .unwrap();
        assert_eq!(layout.mine_count(), 12);
        assert!(!layout.contains_mine((1, 1)));
    }

    #[test]
    fn rejects_impossible_density() {
        let config = GameConfig::new((3, 3), 1);
        let mut rng = SmallRng::seed_from_u64(1);
        let result = RandomMineGenerator::new(&mut rng, (1, 1)).generate(config);
        assert_eq!(result, Err(GameError::TooManyMines));
    }

    #[test]
    fn same_seed_same_layout() {
        let config = Difficulty::Normal.game_config();
        let mut a = SmallRng::seed_from_u64(57);
        let mut b = SmallRng::seed_from_u64(57);
        let first = RandomMineGenerator::new(&mut a, (0, 0)).generate(config);
        let second = RandomMineGenerator::new(&mut b, (0, 0)).generate(config);
        assert_eq!(first, second);
    }

    #[test]
    fn fixed_layout_must_match_config() {
        let layout = MineLayout::from_mine_coords((2, 3), &[(0, 0)]).unwrap();
        assert!(layout.clone().generate(GameConfig::new((2, 3), 1)).is_ok());
        assert_eq!(
            layout.generate(GameConfig::new((3, 3), 1)),
            Err(GameError::InvalidBoardShape)
        );
    }
}
