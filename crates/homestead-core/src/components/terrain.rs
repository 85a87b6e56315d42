//! Terrain grid: the arena every building is layered on top of.
//!
//! Cells are created once and never destroyed. A building marks every cell it
//! covers with its entity, kind and root coordinate; only the root cell's
//! entity carries authoritative state.

use hecs::Entity;
use serde::{Deserialize, Serialize};

use super::buildings::BuildingKind;
use super::common::{CellCoord, Footprint};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileType {
    #[default]
    Plains,
    Water,
    Forest,
    Mountain,
}

/// One grid cell
#[derive(Debug, Clone, Copy, Default)]
pub struct Cell {
    pub tile: TileType,
    /// Entity holding the state of the building covering this cell
    pub building: Option<Entity>,
    pub kind: Option<BuildingKind>,
    /// Root cell of the covering building; equals this cell's own coordinate
    /// on the root itself
    pub root: Option<CellCoord>,
    pub under_construction: bool,
}

impl Cell {
    pub fn is_occupied(&self) -> bool {
        self.building.is_some()
    }

    fn clear_building(&mut self) {
        self.building = None;
        self.kind = None;
        self.root = None;
        self.under_construction = false;
    }
}

/// Row-major grid of cells
#[derive(Debug, Clone)]
pub struct Grid {
    cells: Vec<Cell>,
    width: i32,
    height: i32,
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            cells: vec![Cell::default(); (width * height) as usize],
            width,
            height,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    pub fn in_bounds(&self, coord: CellCoord) -> bool {
        coord.x >= 0 && coord.y >= 0 && coord.x < self.width && coord.y < self.height
    }

    #[inline]
    fn index(&self, coord: CellCoord) -> usize {
        (coord.y * self.width + coord.x) as usize
    }

    pub fn get(&self, coord: CellCoord) -> Option<&Cell> {
        if self.in_bounds(coord) {
            Some(&self.cells[self.index(coord)])
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, coord: CellCoord) -> Option<&mut Cell> {
        if self.in_bounds(coord) {
            let idx = self.index(coord);
            Some(&mut self.cells[idx])
        } else {
            None
        }
    }

    pub fn tile(&self, coord: CellCoord) -> Option<TileType> {
        self.get(coord).map(|c| c.tile)
    }

    pub fn set_tile(&mut self, coord: CellCoord, tile: TileType) -> bool {
        match self.get_mut(coord) {
            Some(cell) => {
                cell.tile = tile;
                true
            }
            None => false,
        }
    }

    /// Convert a world-space position (pixels) to a cell, clamped to the grid
    pub fn world_to_cell(&self, world_x: f32, world_y: f32, tile_size: f32) -> CellCoord {
        let clamp = |v: f32, max: i32| -> i32 {
            let c = (v / tile_size).floor();
            if c.is_nan() {
                return 0;
            }
            (c as i64).clamp(0, (max - 1).max(0) as i64) as i32
        };
        CellCoord::new(clamp(world_x, self.width), clamp(world_y, self.height))
    }

    /// Root coordinate of whatever building covers `coord`
    pub fn root_of(&self, coord: CellCoord) -> Option<CellCoord> {
        self.get(coord).and_then(|c| c.root)
    }

    /// Root cells in deterministic scan order (y, then x)
    pub fn roots(&self) -> impl Iterator<Item = (CellCoord, &Cell)> + '_ {
        self.cells.iter().enumerate().filter_map(move |(i, cell)| {
            let coord = CellCoord::new(i as i32 % self.width, i as i32 / self.width);
            (cell.root == Some(coord)).then_some((coord, cell))
        })
    }

    /// Root cells of one building kind, scan order
    pub fn roots_of_kind(
        &self,
        kind: BuildingKind,
    ) -> impl Iterator<Item = (CellCoord, &Cell)> + '_ {
        self.roots().filter(move |(_, c)| c.kind == Some(kind))
    }

    /// Mark every cell of `footprint` as covered by `entity`
    pub fn occupy(&mut self, footprint: &Footprint, entity: Entity, kind: BuildingKind, under_construction: bool) {
        for coord in footprint.cells() {
            if let Some(cell) = self.get_mut(coord) {
                cell.building = Some(entity);
                cell.kind = Some(kind);
                cell.root = Some(footprint.origin);
                cell.under_construction = under_construction;
            }
        }
    }

    pub fn set_under_construction(&mut self, footprint: &Footprint, value: bool) {
        for coord in footprint.cells() {
            if let Some(cell) = self.get_mut(coord) {
                cell.under_construction = value;
            }
        }
    }

    /// Clear building references from every cell of `footprint`, leaving terrain
    pub fn vacate(&mut self, footprint: &Footprint) {
        for coord in footprint.cells() {
            if let Some(cell) = self.get_mut(coord) {
                cell.clear_building();
            }
        }
    }

    /// Terrain as rows of tile types, for the save layer
    pub fn tile_rows(&self) -> Vec<Vec<TileType>> {
        self.cells
            .chunks(self.width.max(1) as usize)
            .map(|row| row.iter().map(|c| c.tile).collect())
            .collect()
    }

    /// Overwrite terrain from rows; cells outside `rows` keep their tile.
    /// Returns the number of cells written.
    pub fn load_tile_rows(&mut self, rows: &[Vec<TileType>]) -> usize {
        let mut written = 0;
        for (y, row) in rows.iter().enumerate().take(self.height as usize) {
            for (x, tile) in row.iter().enumerate().take(self.width as usize) {
                if self.set_tile(CellCoord::new(x as i32, y as i32), *tile) {
                    written += 1;
                }
            }
        }
        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_to_cell_clamps() {
        let grid = Grid::new(42, 42);
        assert_eq!(grid.world_to_cell(0.0, 0.0, 24.0), CellCoord::new(0, 0));
        assert_eq!(grid.world_to_cell(50.0, 73.0, 24.0), CellCoord::new(2, 3));
        assert_eq!(grid.world_to_cell(-10.0, 99999.0, 24.0), CellCoord::new(0, 41));
    }

    #[test]
    fn test_bounds() {
        let grid = Grid::new(4, 3);
        assert!(grid.get(CellCoord::new(3, 2)).is_some());
        assert!(grid.get(CellCoord::new(4, 2)).is_none());
        assert!(grid.get(CellCoord::new(-1, 0)).is_none());
    }

    #[test]
    fn test_tile_rows_roundtrip() {
        let mut grid = Grid::new(3, 2);
        grid.set_tile(CellCoord::new(1, 0), TileType::Forest);
        grid.set_tile(CellCoord::new(2, 1), TileType::Water);
        let rows = grid.tile_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec![TileType::Plains, TileType::Forest, TileType::Plains]);

        let mut other = Grid::new(3, 2);
        assert_eq!(other.load_tile_rows(&rows), 6);
        assert_eq!(other.tile(CellCoord::new(2, 1)), Some(TileType::Water));
    }

    #[test]
    fn test_tile_serializes_lowercase() {
        let json = serde_json::to_string(&TileType::Mountain).unwrap();
        assert_eq!(json, "\"mountain\"");
    }
}
