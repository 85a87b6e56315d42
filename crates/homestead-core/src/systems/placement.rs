//! Placement validation - footprint, terrain and adjacency rules

use crate::components::{BuildingKind, CellCoord, Footprint, Grid, TileType};
use crate::settlement::Settlement;

/// First rule that rejected a placement, for tooltips
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlacementBlocker {
    /// Fields are created by their farm, never placed directly
    NotPlaceable,
    Unaffordable { cost: f64, gold: f64 },
    OutOfBounds,
    Occupied,
    NotPlains,
    MissingAdjacentTerrain(TileType),
}

/// Every footprint cell exists and is empty
pub fn can_place_footprint(grid: &Grid, footprint: &Footprint) -> bool {
    footprint
        .cells()
        .all(|c| grid.get(c).is_some_and(|cell| !cell.is_occupied()))
}

/// Every footprint cell is plains
pub fn can_place_on_plains(grid: &Grid, footprint: &Footprint) -> bool {
    footprint
        .cells()
        .all(|c| grid.tile(c) == Some(TileType::Plains))
}

/// Any 4-connected border cell just outside the footprint has `tile`
pub fn is_adjacent_to_tile_type(grid: &Grid, footprint: &Footprint, tile: TileType) -> bool {
    footprint
        .border()
        .into_iter()
        .any(|c| grid.tile(c) == Some(tile))
}

pub fn is_within_radius(from: CellCoord, target: CellCoord, radius: i32) -> bool {
    let r = radius as i64;
    from.distance_squared(&target) <= r * r
}

/// Run every placement rule in order: affordability, bounds, occupancy,
/// terrain, adjacency
pub fn check_placement(
    settlement: &Settlement,
    kind: BuildingKind,
    origin: CellCoord,
) -> Result<(), PlacementBlocker> {
    if kind == BuildingKind::FarmField {
        return Err(PlacementBlocker::NotPlaceable);
    }

    let cost = settlement.config.cost(kind);
    if !settlement.ledger.can_afford(cost) {
        return Err(PlacementBlocker::Unaffordable {
            cost,
            gold: settlement.ledger.gold,
        });
    }

    let (w, h) = kind.size();
    let footprint = Footprint::new(origin, w, h);
    let grid = &settlement.grid;
    if !footprint.cells().all(|c| grid.in_bounds(c)) {
        return Err(PlacementBlocker::OutOfBounds);
    }
    if !can_place_footprint(grid, &footprint) {
        return Err(PlacementBlocker::Occupied);
    }
    if !can_place_on_plains(grid, &footprint) {
        return Err(PlacementBlocker::NotPlains);
    }
    if let Some(tile) = kind.required_adjacent_tile() {
        if !is_adjacent_to_tile_type(grid, &footprint, tile) {
            return Err(PlacementBlocker::MissingAdjacentTerrain(tile));
        }
    }
    Ok(())
}
