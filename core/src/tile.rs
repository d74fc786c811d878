use serde::{Deserialize, Serialize};

use crate::*;

/// What the player currently sees on a cell.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RevealStatus {
    #[default]
    Unrevealed,
    Revealed,
    Flagged,
    /// Mine shown at the end of a game.
    MineExposed,
}

/// A single cell of a generated grid.
///
/// Position and mine contents are fixed once the grid is generated, only the status changes during play.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    row: Coord,
    col: Coord,
    status: RevealStatus,
    mine: bool,
    adjacent_mines: u8,
}

impl Tile {
    pub const fn new(coords: Coord2, mine: bool, adjacent_mines: u8) -> Self {
        Self {
            row: coords.0,
            col: coords.1,
            status: RevealStatus::Unrevealed,
            mine,
            adjacent_mines: if mine { 0 } else { adjacent_mines },
        }
    }

    pub const fn row(&self) -> Coord {
        self.row
    }

    pub const fn col(&self) -> Coord {
        self.col
    }

    pub const fn coords(&self) -> Coord2 {
        (self.row, self.col)
    }

    pub const fn status(&self) -> RevealStatus {
        self.status
    }

    pub const fn is_mine(&self) -> bool {
        self.mine
    }

    /// Mines among the hex neighbors, always 0 for a mine.
    pub const fn adjacent_mines(&self) -> u8 {
        self.adjacent_mines
    }

    pub(crate) fn set_status(&mut self, status: RevealStatus) {
        self.status = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mines_never_carry_a_count() {
        let tile = Tile::new((3, 4), true, 5);
        assert!(tile.is_mine());
        assert_eq!(tile.adjacent_mines(), 0);
        assert_eq!(tile.status(), RevealStatus::Unrevealed);
        assert_eq!(tile.coords(), (3, 4));
    }

    #[test]
    fn status_changes_keep_contents() {
        let mut tile = Tile::new((0, 0), false, 2);
        tile.set_status(RevealStatus::Flagged);
        assert_eq!(tile.status(), RevealStatus::Flagged);
        tile.set_status(RevealStatus::Revealed);
        assert_eq!(tile.status(), RevealStatus::Revealed);
        assert_eq!(tile.adjacent_mines(), 2);
        assert!(!tile.is_mine());
    }
}
