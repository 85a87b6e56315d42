//! Simulation engine - main entry point for running the settlement
//!
//! The engine owns one `Settlement` and advances its logical clock. Every
//! periodic or delayed effect is a scheduler event; `update` fires all events
//! due within the step in time order and dispatches them to the systems.

use std::path::Path;

use crate::components::*;
use crate::config::{ConfigError, SimConfig};
use crate::generation::{generate_terrain, TerrainConfig, TerrainStats};
use crate::payload::{click_payload, ClickPayload};
use crate::persistence::{self, SaveError};
use crate::scheduler::SimEvent;
use crate::settlement::Settlement;
use crate::systems::*;

/// Main simulation engine
pub struct SimulationEngine {
    settlement: Settlement,
    /// Events dispatched since creation (or load)
    events_fired: u64,
}

impl SimulationEngine {
    /// Create an empty settlement and start the periodic arrival and payout
    /// timers
    pub fn new(config: SimConfig) -> Self {
        let mut settlement = Settlement::new(config);
        settlement
            .scheduler
            .schedule_every(settlement.config.villager_arrival_ms, SimEvent::VillagerArrival);
        settlement
            .scheduler
            .schedule_every(settlement.config.gold_payout_ms, SimEvent::GoldPayout);
        Self {
            settlement,
            events_fired: 0,
        }
    }

    /// Create an engine from a JSON configuration file
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Ok(Self::new(SimConfig::from_json_file(path)?))
    }

    /// Replace the terrain with seeded generated terrain
    pub fn generate_terrain(&mut self, config: &TerrainConfig) -> TerrainStats {
        generate_terrain(&mut self.settlement.grid, config)
    }

    /// Advance the simulation by `delta_ms`, firing every event due in the
    /// step. Returns the number of events fired.
    pub fn update(&mut self, delta_ms: u64) -> usize {
        let until = self.settlement.now_ms().saturating_add(delta_ms);
        let mut fired = 0;
        while let Some((_, event)) = self.settlement.scheduler.pop_due(until) {
            self.dispatch(event);
            fired += 1;
        }
        self.settlement.scheduler.advance_clock(until);
        self.events_fired += fired as u64;
        fired
    }

    fn dispatch(&mut self, event: SimEvent) {
        let s = &mut self.settlement;
        match event {
            SimEvent::ProductionTick { building } => production::production_tick(s, building),
            SimEvent::DeliveryArrival {
                producer,
                warehouse,
                resource,
                amount,
            } => {
                delivery::complete_delivery(s, producer, warehouse, resource, amount);
            }
            SimEvent::VillagerArrival => {
                population::villager_arrival_tick(s);
            }
            SimEvent::ArrivalComplete { house } => {
                population::complete_arrival(s, house);
            }
            SimEvent::TrainingComplete { center, profession } => {
                population::complete_training(s, center, profession);
            }
            SimEvent::GoldPayout => {
                income::gold_payout(s);
            }
            SimEvent::ConstructionComplete { building } => {
                lifecycle::complete_construction(s, building);
            }
        }
    }

    // ── Mutators ──

    /// Validate, charge and build `kind` with its root at `origin`
    pub fn place_building(&mut self, kind: BuildingKind, origin: CellCoord) -> bool {
        lifecycle::place_building(&mut self.settlement, kind, origin)
    }

    /// Why `kind` cannot be placed at `origin`, if it cannot
    pub fn check_placement(&self, kind: BuildingKind, origin: CellCoord) -> Result<(), PlacementBlocker> {
        placement::check_placement(&self.settlement, kind, origin)
    }

    pub fn remove(&mut self, at: CellCoord) -> bool {
        lifecycle::remove_building(&mut self.settlement, at)
    }

    pub fn assign_worker(&mut self, at: CellCoord, kind: WorkerKind) -> bool {
        workforce::assign_worker(&mut self.settlement, at, kind)
    }

    pub fn unassign_last_worker(&mut self, at: CellCoord) -> bool {
        workforce::unassign_last_worker(&mut self.settlement, at)
    }

    pub fn set_target_tile(&mut self, at: CellCoord, tile: CellCoord) -> bool {
        production::set_target_tile(&mut self.settlement, at, tile)
    }

    pub fn clear_target_tile(&mut self, at: CellCoord) -> bool {
        production::clear_target_tile(&mut self.settlement, at)
    }

    pub fn create_fields(&mut self, at: CellCoord) -> bool {
        production::create_fields(&mut self.settlement, at)
    }

    pub fn assign_warehouse(&mut self, at: CellCoord, warehouse: CellCoord) -> bool {
        delivery::assign_warehouse(&mut self.settlement, at, warehouse)
    }

    pub fn deliver_if_ready(&mut self, at: CellCoord) -> bool {
        delivery::deliver_if_ready(&mut self.settlement, at)
    }

    pub fn start_training(&mut self, center: CellCoord, profession: Profession) -> bool {
        population::start_training(&mut self.settlement, center, profession)
    }

    /// Handle a "train profession" request from the UI by profession key
    pub fn train_villager(&mut self, key: &str) -> bool {
        match Profession::from_key(key) {
            Some(p) => population::train_villager(&mut self.settlement, p),
            None => false,
        }
    }

    /// Store goods directly into a warehouse. Returns the amount stored.
    pub fn store(&mut self, warehouse: CellCoord, kind: ResourceKind, amount: f64) -> f64 {
        warehouse::store_at(&mut self.settlement, warehouse, kind, amount)
    }

    pub fn pay_tribute(&mut self, kind: ResourceKind, amount: f64) -> bool {
        warehouse::pay_tribute(&mut self.settlement, kind, amount)
    }

    pub fn charge_gold(&mut self, amount: f64) {
        income::charge_gold(&mut self.settlement, amount)
    }

    // ── Queries ──

    /// Current logical time in milliseconds
    pub fn now_ms(&self) -> u64 {
        self.settlement.now_ms()
    }

    pub fn events_fired(&self) -> u64 {
        self.events_fired
    }

    pub fn gold(&self) -> f64 {
        self.settlement.ledger.gold
    }

    pub fn resource(&self, kind: ResourceKind) -> f64 {
        self.settlement.ledger.amount(kind)
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.settlement.ledger
    }

    pub fn census(&self) -> Census {
        self.settlement.census
    }

    pub fn population(&self) -> PopulationSummary {
        population::summarize(&self.settlement)
    }

    pub fn warehouse_usage(&self) -> Vec<WarehouseUsage> {
        warehouse::warehouse_usage(&self.settlement)
    }

    pub fn full_warehouse_count(&self) -> usize {
        warehouse::full_warehouse_count(&self.settlement)
    }

    pub fn click_payload(&self, at: CellCoord) -> Option<ClickPayload> {
        click_payload(&self.settlement, at)
    }

    pub fn building(&self, at: CellCoord) -> Option<Building> {
        self.settlement.building_at(at).map(|(_, b)| b)
    }

    pub fn house(&self, at: CellCoord) -> Option<House> {
        self.component::<House>(at)
    }

    pub fn production(&self, at: CellCoord) -> Option<Production> {
        self.component::<Production>(at)
    }

    pub fn warehouse(&self, at: CellCoord) -> Option<Warehouse> {
        self.component::<Warehouse>(at)
    }

    pub fn training_center(&self, at: CellCoord) -> Option<TrainingCenter> {
        self.component::<TrainingCenter>(at)
    }

    fn component<T: hecs::Component + Clone>(&self, at: CellCoord) -> Option<T> {
        let (entity, _) = self.settlement.building_at(at)?;
        let c = self.settlement.world.get::<&T>(entity).ok()?;
        Some(T::clone(&c))
    }

    pub fn tile(&self, at: CellCoord) -> Option<TileType> {
        self.settlement.grid.tile(at)
    }

    pub fn set_tile(&mut self, at: CellCoord, tile: TileType) -> bool {
        self.settlement.grid.set_tile(at, tile)
    }

    /// Cell under a world-space pixel position, clamped to the grid
    pub fn world_to_cell(&self, world_x: f32, world_y: f32) -> CellCoord {
        self.settlement
            .grid
            .world_to_cell(world_x, world_y, self.settlement.config.tile_size)
    }

    pub fn config(&self) -> &SimConfig {
        &self.settlement.config
    }

    pub fn settlement(&self) -> &Settlement {
        &self.settlement
    }

    pub fn settlement_mut(&mut self) -> &mut Settlement {
        &mut self.settlement
    }

    // ── Persistence ──

    pub fn export_terrain_json(&self) -> Result<String, SaveError> {
        persistence::export_terrain_json(&self.settlement.grid)
    }

    /// Bulk overwrite terrain from a JSON snapshot
    pub fn load_terrain_json(&mut self, json: &str) -> Result<usize, SaveError> {
        persistence::import_terrain_json(&mut self.settlement.grid, json)
    }

    /// Save simulation state to a writer
    pub fn save<W: std::io::Write>(&self, writer: W) -> Result<(), SaveError> {
        persistence::save_simulation(writer, &self.settlement)
    }

    /// Load simulation state from a reader, replacing the current settlement
    pub fn load<R: std::io::Read>(&mut self, reader: R) -> Result<(), SaveError> {
        self.settlement = persistence::load_simulation(reader)?;
        self.events_fired = 0;
        Ok(())
    }
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_creation() {
        let engine = SimulationEngine::default();
        assert_eq!(engine.now_ms(), 0);
        assert_eq!(engine.gold(), 100.0);
        assert_eq!(engine.population().population, 0);
    }

    #[test]
    fn test_update_advances_clock() {
        let mut engine = SimulationEngine::default();
        // arrival at 6000, payout at 10000, arrival at 12000
        assert_eq!(engine.update(12_000), 3);
        assert_eq!(engine.now_ms(), 12_000);
        engine.update(500);
        assert_eq!(engine.now_ms(), 12_500);
    }

    #[test]
    fn test_villagers_arrive_and_pay() {
        let mut engine = SimulationEngine::default();
        let house = CellCoord::new(10, 10);
        assert!(engine.place_building(BuildingKind::House, house));
        assert_eq!(engine.gold(), 90.0);

        // arrival tick at 6000, walk done at 8000
        engine.update(8_000);
        assert_eq!(engine.house(house).unwrap().occupants, 1);
        assert_eq!(engine.census().population, 1);

        // payout at 10000: one villager
        engine.update(2_000);
        assert!((engine.gold() - 90.4).abs() < 1e-9);
    }

    #[test]
    fn test_train_villager_by_key() {
        let mut engine = SimulationEngine::default();
        assert!(!engine.train_villager("wizard"));
        assert!(!engine.train_villager("miner"));
    }

    #[test]
    fn test_world_to_cell() {
        let engine = SimulationEngine::default();
        assert_eq!(engine.world_to_cell(49.0, 24.0), CellCoord::new(2, 1));
    }
}
