//! Common value types shared by the grid and building components.

use serde::{Deserialize, Serialize};

/// Integer grid coordinate. Signed so that neighbours of edge cells can be
/// expressed before bounds checking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellCoord {
    pub x: i32,
    pub y: i32,
}

impl CellCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn distance_squared(&self, other: &Self) -> i64 {
        let dx = (other.x - self.x) as i64;
        let dy = (other.y - self.y) as i64;
        dx * dx + dy * dy
    }
}

impl From<(i32, i32)> for CellCoord {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for CellCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Rectangular footprint anchored at its top-left (root) cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footprint {
    pub origin: CellCoord,
    pub width: i32,
    pub height: i32,
}

impl Footprint {
    pub fn new(origin: CellCoord, width: i32, height: i32) -> Self {
        Self {
            origin,
            width,
            height,
        }
    }

    pub fn contains(&self, coord: CellCoord) -> bool {
        coord.x >= self.origin.x
            && coord.x < self.origin.x + self.width
            && coord.y >= self.origin.y
            && coord.y < self.origin.y + self.height
    }

    /// Every covered cell, row-major.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        (0..self.height).flat_map(move |dy| {
            (0..self.width).map(move |dx| self.origin.offset(dx, dy))
        })
    }

    /// The 4-connected ring just outside the rectangle: the row above, the
    /// row below, the column to the left and the column to the right.
    /// Corners are not included.
    pub fn border(&self) -> Vec<CellCoord> {
        let o = self.origin;
        let mut ring = Vec::with_capacity(2 * (self.width + self.height) as usize);
        for x in o.x..o.x + self.width {
            ring.push(CellCoord::new(x, o.y - 1));
            ring.push(CellCoord::new(x, o.y + self.height));
        }
        for y in o.y..o.y + self.height {
            ring.push(CellCoord::new(o.x - 1, y));
            ring.push(CellCoord::new(o.x + self.width, y));
        }
        ring
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_footprint_cells_row_major() {
        let fp = Footprint::new(CellCoord::new(2, 3), 2, 2);
        let cells: Vec<_> = fp.cells().collect();
        assert_eq!(
            cells,
            vec![
                CellCoord::new(2, 3),
                CellCoord::new(3, 3),
                CellCoord::new(2, 4),
                CellCoord::new(3, 4),
            ]
        );
        assert!(fp.contains(CellCoord::new(3, 4)));
        assert!(!fp.contains(CellCoord::new(4, 4)));
    }

    #[test]
    fn test_border_excludes_corners() {
        let fp = Footprint::new(CellCoord::new(1, 1), 2, 1);
        let ring = fp.border();
        assert_eq!(ring.len(), 6);
        assert!(ring.contains(&CellCoord::new(0, 1)));
        assert!(ring.contains(&CellCoord::new(3, 1)));
        assert!(ring.contains(&CellCoord::new(1, 0)));
        assert!(ring.contains(&CellCoord::new(2, 2)));
        assert!(!ring.contains(&CellCoord::new(0, 0)));
    }

    #[test]
    fn test_distance_squared() {
        let a = CellCoord::new(0, 0);
        assert_eq!(a.distance_squared(&CellCoord::new(3, 4)), 25);
    }
}
