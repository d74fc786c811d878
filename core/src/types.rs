use ndarray::Array2;

/// Single coordinate axis used for board rows, columns, and positions.
pub type Coord = u8;

/// Count type used for mine counts and total-cell counts.
pub type CellCount = u16;

/// Two-dimensional coordinates `(row, col)`.
pub type Coord2 = (Coord, Coord);

/// Signed `(row, col)` pair, may point outside of the board.
pub type RawCoord2 = (isize, isize);

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

pub const fn mult(a: Coord, b: Coord) -> CellCount {
    let a = a as CellCount;
    let b = b as CellCount;
    a.saturating_mul(b)
}

/// Number of neighbors every cell has on the hex grid, bounds ignored.
pub const HEX_NEIGHBORS: usize = 6;

/// Offsets for cells on even rows.
///
/// Odd rows are drawn shifted half a cell to the right, so the rows above and below an even row reach one column
/// further to the left, and the rows around an odd row reach one column further to the right.
const EVEN_ROW_DISPLACEMENTS: [(isize, isize); HEX_NEIGHBORS] =
    [(0, -1), (0, 1), (1, -1), (1, 0), (-1, -1), (-1, 0)];

/// Offsets for cells on odd rows.
const ODD_ROW_DISPLACEMENTS: [(isize, isize); HEX_NEIGHBORS] =
    [(0, -1), (0, 1), (1, 0), (1, 1), (-1, 0), (-1, 1)];

const fn displacements(row: Coord) -> [(isize, isize); HEX_NEIGHBORS] {
    if row % 2 == 0 {
        EVEN_ROW_DISPLACEMENTS
    } else {
        ODD_ROW_DISPLACEMENTS
    }
}

/// The six hex neighbors of `coords`, in a stable order and without any bounds check.
pub fn hex_neighbors(coords: Coord2) -> [RawCoord2; HEX_NEIGHBORS] {
    let (row, col) = (coords.0 as isize, coords.1 as isize);
    displacements(coords.0).map(|(dr, dc)| (row + dr, col + dc))
}

/// Whether two cells are within one row and one column of each other.
pub const fn within_exclusion_zone(a: Coord2, b: Coord2) -> bool {
    a.0.abs_diff(b.0) < 2 && a.1.abs_diff(b.1) < 2
}

pub trait NeighborIterExt {
    fn iter_neighbors(&self, index: Coord2) -> NeighborIter;
}

impl<T> NeighborIterExt for Array2<T> {
    fn iter_neighbors(&self, index: Coord2) -> NeighborIter {
        let (rows, cols) = self.dim();
        let bounds = (
            rows.try_into().unwrap_or(Coord::MAX),
            cols.try_into().unwrap_or(Coord::MAX),
        );
        NeighborIter::new(index, bounds)
    }
}

/// Applies `delta` to `coords`, returning a value only when it remains in bounds.
fn apply_delta(coords: Coord2, delta: (isize, isize), bounds: Coord2) -> Option<Coord2> {
    let (row, col) = coords;
    let (dr, dc) = delta;
    let (max_row, max_col) = bounds;

    let next_row = row.checked_add_signed(dr.try_into().ok()?)?;
    if next_row >= max_row {
        return None;
    }

    let next_col = col.checked_add_signed(dc.try_into().ok()?)?;
    if next_col >= max_col {
        return None;
    }

    Some((next_row, next_col))
}

/// In-bounds hex neighbors of a cell.
#[derive(Debug)]
pub struct NeighborIter {
    center: Coord2,
    bounds: Coord2,
    index: u8,
}

impl NeighborIter {
    pub fn new(center: Coord2, bounds: Coord2) -> Self {
        Self {
            center,
            bounds,
            index: 0,
        }
    }
}

impl Iterator for NeighborIter {
    type Item = Coord2;

    fn next(&mut self) -> Option<Self::Item> {
        let deltas = displacements(self.center.0);
        loop {
            if usize::from(self.index) >= deltas.len() {
                return None;
            }

            let next_item = apply_delta(self.center, deltas[self.index as usize], self.bounds);
            self.index += 1;

            if next_item.is_some() {
                return next_item;
            }
        }
    }
}
