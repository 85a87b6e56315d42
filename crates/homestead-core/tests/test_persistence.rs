//! Integration tests for save/load and terrain snapshots.
//!
//! A settlement saved mid-simulation must resume exactly where it stopped:
//! pending production ticks, deliveries in transit and trainings all fire
//! after load just as they would have without the round trip.

use homestead_core::generation::TerrainConfig;
use homestead_core::payload::ClickPayload;
use homestead_core::persistence::SaveError;
use homestead_core::prelude::*;

// ── Helpers ────────────────────────────────────────────────────────────

const HOUSES: [CellCoord; 3] = [
    CellCoord::new(2, 2),
    CellCoord::new(5, 2),
    CellCoord::new(8, 2),
];
const CENTER: CellCoord = CellCoord::new(14, 2);
const YARD: CellCoord = CellCoord::new(10, 10);
const QUARRY: CellCoord = CellCoord::new(16, 10);
const FARM: CellCoord = CellCoord::new(24, 10);
const WAREHOUSE: CellCoord = CellCoord::new(4, 20);

fn busy_settlement() -> SimulationEngine {
    let mut engine = SimulationEngine::new(SimConfig {
        starting_gold: 1_000.0,
        villager_arrival_ms: 1_500,
        ..Default::default()
    });
    engine.settlement_mut().config.production.interval_ms = 2_000;
    engine.set_tile(CellCoord::new(12, 10), TileType::Forest);
    engine.set_tile(CellCoord::new(18, 10), TileType::Mountain);

    for house in HOUSES {
        assert!(engine.place_building(BuildingKind::House, house));
    }
    assert!(engine.place_building(BuildingKind::TrainingCenter, CENTER));
    assert!(engine.place_building(BuildingKind::Warehouse, WAREHOUSE));
    assert!(engine.place_building(BuildingKind::Lumberyard, YARD));
    assert!(engine.place_building(BuildingKind::Quarry, QUARRY));
    assert!(engine.place_building(BuildingKind::Farm, FARM));
    assert!(engine.set_target_tile(YARD, CellCoord::new(12, 10)));
    assert!(engine.set_target_tile(QUARRY, CellCoord::new(18, 10)));
    for producer in [YARD, QUARRY, FARM] {
        assert!(engine.assign_warehouse(producer, WAREHOUSE));
    }

    // let villagers arrive, then staff everything
    engine.update(20_000);
    for producer in [YARD, QUARRY, FARM] {
        assert!(engine.assign_worker(producer, WorkerKind::Villager));
        assert!(engine.assign_worker(producer, WorkerKind::Villager));
    }
    assert!(engine.create_fields(FARM));
    assert!(engine.train_villager("miner"));
    engine
}

fn snapshot_payloads(engine: &SimulationEngine) -> Vec<Option<ClickPayload>> {
    let mut cells = HOUSES.to_vec();
    cells.extend([CENTER, YARD, QUARRY, FARM, WAREHOUSE]);
    cells.into_iter().map(|c| engine.click_payload(c)).collect()
}

fn round_trip(engine: &SimulationEngine) -> SimulationEngine {
    let mut bytes = Vec::new();
    engine.save(&mut bytes).expect("save failed");
    let mut loaded = SimulationEngine::default();
    loaded.load(&bytes[..]).expect("load failed");
    loaded
}

// ── Round trip ─────────────────────────────────────────────────────────

#[test]
fn loaded_settlement_matches_saved_one() {
    let mut engine = busy_settlement();
    engine.update(9_000);

    let loaded = round_trip(&engine);
    assert_eq!(loaded.now_ms(), engine.now_ms());
    assert_eq!(loaded.ledger(), engine.ledger());
    assert_eq!(loaded.census(), engine.census());
    assert_eq!(loaded.population(), engine.population());
    assert_eq!(snapshot_payloads(&loaded), snapshot_payloads(&engine));
    assert_eq!(
        loaded.settlement().scheduler.active_count(),
        engine.settlement().scheduler.active_count()
    );
}

#[test]
fn pending_timers_resume_after_load() {
    let mut engine = busy_settlement();
    // mid-training, between production ticks
    engine.update(2_500);
    let mut loaded = round_trip(&engine);

    for _ in 0..120 {
        engine.update(500);
        loaded.update(500);
    }

    assert_eq!(loaded.now_ms(), engine.now_ms());
    assert_eq!(loaded.ledger(), engine.ledger());
    assert_eq!(loaded.census(), engine.census());
    assert_eq!(loaded.warehouse_usage(), engine.warehouse_usage());
    assert_eq!(snapshot_payloads(&loaded), snapshot_payloads(&engine));
    assert!(engine.census().professions.miner >= 1);
    assert!(engine.warehouse(WAREHOUSE).unwrap().storage.total() > 0.0);
}

#[test]
fn new_buildings_after_load_get_fresh_ids() {
    let engine = busy_settlement();
    let mut loaded = round_trip(&engine);
    let before: Vec<_> = [YARD, QUARRY, FARM, WAREHOUSE]
        .iter()
        .map(|c| loaded.building(*c).unwrap().id)
        .collect();

    assert!(loaded.place_building(BuildingKind::Tower, CellCoord::new(30, 30)));
    let tower = loaded.building(CellCoord::new(30, 30)).unwrap();
    assert!(before.iter().all(|id| *id < tower.id));
}

#[test]
fn garbage_is_rejected() {
    let mut engine = SimulationEngine::default();
    let result = engine.load(&b"definitely not a save"[..]);
    assert!(matches!(result, Err(SaveError::Bincode(_))));
    // the old settlement survives a failed load
    assert_eq!(engine.gold(), 100.0);
}

// ── Terrain snapshots ──────────────────────────────────────────────────

#[test]
fn terrain_snapshot_round_trip() {
    let mut source = SimulationEngine::default();
    let stats = source.generate_terrain(&TerrainConfig::default());
    assert!(stats.forest > 0);

    let json = source.export_terrain_json().expect("export failed");
    let mut target = SimulationEngine::default();
    let written = target.load_terrain_json(&json).expect("import failed");
    assert_eq!(written, 42 * 42);
    assert_eq!(
        target.export_terrain_json().expect("export failed"),
        json
    );
}

#[test]
fn terrain_snapshot_keeps_buildings() {
    let mut engine = SimulationEngine::default();
    assert!(engine.place_building(BuildingKind::House, CellCoord::new(0, 0)));
    let written = engine
        .load_terrain_json(r#"[["forest","water"],["mountain","plains"]]"#)
        .expect("import failed");
    assert_eq!(written, 4);
    assert_eq!(engine.tile(CellCoord::new(1, 0)), Some(TileType::Water));
    assert_eq!(
        engine.building(CellCoord::new(1, 1)).map(|b| b.kind),
        Some(BuildingKind::House)
    );
}
