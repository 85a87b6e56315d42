//! The simulation context every system operates on.
//!
//! Grid, ECS world, ledger, census, scheduler and configuration live together
//! in one value owned by the engine. Nothing here is global, so independent
//! settlements can coexist (tests run many in parallel).

use hecs::{Entity, World};

use crate::components::*;
use crate::config::SimConfig;
use crate::scheduler::Scheduler;
use crate::systems::Census;

pub struct Settlement {
    pub config: SimConfig,
    pub grid: Grid,
    /// One entity per placed building
    pub world: World,
    pub ledger: ResourceLedger,
    pub census: Census,
    pub scheduler: Scheduler,
    next_building_id: u64,
}

impl Settlement {
    pub fn new(config: SimConfig) -> Self {
        Self {
            grid: Grid::new(config.grid_width, config.grid_height),
            world: World::new(),
            ledger: ResourceLedger::new(config.starting_gold),
            census: Census::default(),
            scheduler: Scheduler::new(),
            next_building_id: 1,
            config,
        }
    }

    pub(crate) fn allocate_id(&mut self) -> BuildingId {
        let id = BuildingId(self.next_building_id);
        self.next_building_id += 1;
        id
    }

    pub(crate) fn next_building_id(&self) -> u64 {
        self.next_building_id
    }

    pub(crate) fn set_next_building_id(&mut self, next: u64) {
        self.next_building_id = next;
    }

    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    /// Building covering `coord`, whichever cell of the footprint it is
    pub fn building_at(&self, coord: CellCoord) -> Option<(Entity, Building)> {
        let root = self.grid.root_of(coord)?;
        let entity = self.grid.get(root)?.building?;
        let building = *self.world.get::<&Building>(entity).ok()?;
        Some((entity, building))
    }

    /// Completed building of `kind` covering `coord`
    pub fn usable_building_at(&self, coord: CellCoord, kind: BuildingKind) -> Option<(Entity, Building)> {
        self.building_at(coord)
            .filter(|(_, b)| b.kind == kind && !b.under_construction)
    }

    /// Completed building whose root is exactly `root`
    pub fn usable_root(&self, root: CellCoord, kind: BuildingKind) -> Option<Entity> {
        let cell = self.grid.get(root)?;
        if cell.root != Some(root) || cell.kind != Some(kind) || cell.under_construction {
            return None;
        }
        cell.building
    }

    /// Resolve a stored reference, failing if the building is gone or the
    /// cells now belong to a different building
    pub fn resolve(&self, reference: BuildingRef) -> Option<(Entity, Building)> {
        let cell = self.grid.get(reference.root)?;
        if cell.root != Some(reference.root) {
            return None;
        }
        let entity = cell.building?;
        let building = *self.world.get::<&Building>(entity).ok()?;
        (building.id == reference.id).then_some((entity, building))
    }

    /// Completed production building covering `coord`
    pub fn production_at(&self, coord: CellCoord) -> Option<(Entity, Building)> {
        self.building_at(coord)
            .filter(|(_, b)| b.kind.is_production() && !b.under_construction)
    }

    /// Roots of every building of `kind`, scan order (y, then x)
    pub fn roots_of_kind(&self, kind: BuildingKind) -> Vec<(CellCoord, Entity)> {
        self.grid
            .roots_of_kind(kind)
            .filter_map(|(coord, cell)| cell.building.map(|e| (coord, e)))
            .collect()
    }

    /// Roots of every production building, scan order
    pub fn production_roots(&self) -> Vec<(CellCoord, Entity)> {
        self.grid
            .roots()
            .filter(|(_, cell)| cell.kind.is_some_and(|k| k.is_production()))
            .filter_map(|(coord, cell)| cell.building.map(|e| (coord, e)))
            .collect()
    }
}
