use ndarray::Array2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::*;

/// Cell storage, tiles only exist once the first reveal generated the board.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Cells {
    #[default]
    Empty,
    Populated(Array2<Tile>),
}

/// The board of a single session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    config: GameConfig,
    cells: Cells,
}

impl Grid {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            cells: Cells::Empty,
        }
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn rows(&self) -> Coord {
        self.config.rows()
    }

    pub fn cols(&self) -> Coord {
        self.config.cols()
    }

    pub fn size(&self) -> Coord2 {
        self.config.size
    }

    pub fn mine_total(&self) -> CellCount {
        self.config.mines
    }

    pub fn total_cells(&self) -> CellCount {
        self.config.total_cells()
    }

    pub fn contains(&self, coords: Coord2) -> bool {
        self.config.contains(coords)
    }

    pub fn is_generated(&self) -> bool {
        matches!(self.cells, Cells::Populated(_))
    }

    /// Tile at `coords`, `None` before generation or out of bounds.
    pub fn tile(&self, coords: Coord2) -> Option<&Tile> {
        match &self.cells {
            Cells::Populated(tiles) if self.contains(coords) => Some(&tiles[coords.to_nd_index()]),
            _ => None,
        }
    }

    pub(crate) fn tile_mut(&mut self, coords: Coord2) -> Option<&mut Tile> {
        let in_bounds = self.contains(coords);
        match &mut self.cells {
            Cells::Populated(tiles) if in_bounds => Some(&mut tiles[coords.to_nd_index()]),
            _ => None,
        }
    }

    /// Row-major iteration over the tiles, empty before generation.
    pub fn iter_tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        let tiles = match &self.cells {
            Cells::Populated(tiles) => Some(tiles.iter()),
            Cells::Empty => None,
        };
        tiles.into_iter().flatten()
    }

    pub(crate) fn iter_tiles_mut(&mut self) -> impl Iterator<Item = &mut Tile> + '_ {
        let tiles = match &mut self.cells {
            Cells::Populated(tiles) => Some(tiles.iter_mut()),
            Cells::Empty => None,
        };
        tiles.into_iter().flatten()
    }

    /// The six hex neighbors of a cell, unfiltered; callers must bounds-check.
    pub fn neighbors_of(&self, coords: Coord2) -> [RawCoord2; HEX_NEIGHBORS] {
        hex_neighbors(coords)
    }

    /// Neighbors of a cell that lie on the board.
    pub fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        NeighborIter::new(coords, self.size())
    }

    /// Places the mines uniformly at random, never within the opening zone around `first`.
    pub fn generate<R: Rng + ?Sized>(&mut self, first: Coord2, rng: &mut R) -> Result<()> {
        self.build(RandomMineGenerator::new(rng, first))
    }

    /// Uses a finished layout, which must match the grid's size and mine total.
    pub fn populate(&mut self, layout: MineLayout) -> Result<()> {
        self.build(layout)
    }

    /// Builds every tile from the generator's layout and fixes the adjacency counts.
    fn build(&mut self, generator: impl MineGenerator) -> Result<()> {
        if self.is_generated() {
            return Err(GameError::AlreadyGenerated);
        }
        let layout = generator.generate(self.config)?;

        let tiles = Array2::from_shape_fn(self.size().to_nd_index(), |(row, col)| {
            let coords = (row as Coord, col as Coord);
            Tile::new(
                coords,
                layout.contains_mine(coords),
                layout.adjacent_mine_count(coords),
            )
        });
        log::debug!(
            "Populated {}x{} grid with {} mines",
            self.rows(),
            self.cols(),
            layout.mine_count()
        );
        self.cells = Cells::Populated(tiles);
        Ok(())
    }

    pub fn flag_count(&self) -> CellCount {
        self.count_status(RevealStatus::Flagged)
    }

    pub fn count_status(&self, status: RevealStatus) -> CellCount {
        self.iter_tiles().filter(|tile| tile.status() == status).count() as CellCount
    }

    /// Mines actually present, 0 before generation.
    pub fn mine_count(&self) -> CellCount {
        self.iter_tiles().filter(|tile| tile.is_mine()).count() as CellCount
    }

    /// Checks a grid coming from outside (a saved session) against its own declared size.
    pub fn validate(&self) -> Result<()> {
        let Cells::Populated(tiles) = &self.cells else {
            return Ok(());
        };

        let expected = (self.rows() as usize, self.cols() as usize);
        if tiles.dim() != expected {
            return Err(GameError::InvalidBoardShape);
        }
        if self.mine_count() != self.mine_total() {
            return Err(GameError::TooManyMines);
        }

        for ((row, col), tile) in tiles.indexed_iter() {
            let coords = (row as Coord, col as Coord);
            if tile.coords() != coords {
                return Err(GameError::InvalidCoords);
            }
            let adjacent = self
                .iter_neighbors(coords)
                .filter(|&pos| tiles[pos.to_nd_index()].is_mine())
                .count() as u8;
            let expected = if tile.is_mine() { 0 } else { adjacent };
            if tile.adjacent_mines() != expected {
                return Err(GameError::InvalidBoardShape);
            }
            // the engine never opens a mine, it only exposes it
            if tile.is_mine() && tile.status() == RevealStatus::Revealed {
                return Err(GameError::InvalidBoardShape);
            }
        }

        Ok(())
    }
}
