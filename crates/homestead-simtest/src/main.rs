//! Homestead Headless Simulation Harness
//!
//! Drives scripted settlements through the public engine API and checks the
//! economy invariants after every step. Runs entirely in-process with
//! logical time, so a full simulated hour takes well under a second.
//!
//! Usage:
//!   cargo run -p homestead-simtest
//!   cargo run -p homestead-simtest -- --verbose
//!   cargo run -p homestead-simtest -- --config balance.json

use homestead_core::components::*;
use homestead_core::config::{ConfigError, SimConfig};
use homestead_core::engine::SimulationEngine;
use homestead_core::generation::TerrainConfig;
use tracing_subscriber::filter::LevelFilter;

// ── Logging ─────────────────────────────────────────────────────────────

/// Send the core's `log` records to stderr through a tracing subscriber
fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let installed = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .without_time()
        .try_init();
    if installed.is_err() {
        eprintln!("logging already initialised, keeping the existing subscriber");
    }
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn new(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

struct Options {
    verbose: bool,
    config_path: Option<String>,
}

fn parse_args() -> Options {
    let mut options = Options {
        verbose: false,
        config_path: None,
    };
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--verbose" => options.verbose = true,
            "--config" => options.config_path = args.next(),
            other => eprintln!("ignoring unknown argument {:?}", other),
        }
    }
    options
}

fn main() {
    let options = parse_args();
    init_logging(options.verbose);
    println!("=== Homestead Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Balance configuration
    let config = match load_config(options.config_path.as_deref()) {
        Ok(config) => {
            results.push(TestResult::new("config_valid", true, "configuration accepted"));
            config
        }
        Err(e) => {
            results.push(TestResult::new("config_valid", false, e.to_string()));
            report(&results, options.verbose);
            std::process::exit(1);
        }
    };
    results.extend(validate_config_rules());

    // 2. Terrain generation
    results.extend(validate_terrain(&config));

    // 3. Delivery protocol
    results.extend(validate_delivery(&config));

    // 4. Long-running economy with invariant sweep
    results.extend(validate_economy(&config));

    // 5. Teardown
    results.extend(validate_teardown(&config));

    // 6. Save/load determinism
    results.extend(validate_persistence(&config));

    if !report(&results, options.verbose) {
        std::process::exit(1);
    }
}

/// Print the summary; true when everything passed
fn report(results: &[TestResult], verbose: bool) -> bool {
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.len() - passed;

    for r in results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed,
        results.len(),
        failed
    );
    failed == 0
}

fn load_config(path: Option<&str>) -> Result<SimConfig, ConfigError> {
    match path {
        Some(path) => SimConfig::from_json_file(path),
        None => {
            let config = SimConfig::default();
            config.validate()?;
            Ok(config)
        }
    }
}

/// Config with enough gold to build every scripted layout
fn funded(config: &SimConfig) -> SimConfig {
    SimConfig {
        starting_gold: config.starting_gold.max(10_000.0),
        ..config.clone()
    }
}

// ── 1. Config rules ─────────────────────────────────────────────────────

fn validate_config_rules() -> Vec<TestResult> {
    println!("--- Configuration ---");
    let mut results = Vec::new();

    let broken = SimConfig::from_json_str(r#"{ "production": { "availability_cap": 30 } }"#);
    results.push(TestResult::new(
        "config_cap_ratio_enforced",
        matches!(broken, Err(ConfigError::Invalid(_))),
        "availability cap must stay 5x the delivery quantum",
    ));

    let partial = SimConfig::from_json_str(r#"{ "starting_gold": 250 }"#);
    results.push(TestResult::new(
        "config_partial_override",
        partial.map(|c| c.starting_gold == 250.0 && c.house_capacity == 4).unwrap_or(false),
        "omitted keys keep their defaults",
    ));

    results
}

// ── 2. Terrain ──────────────────────────────────────────────────────────

fn validate_terrain(config: &SimConfig) -> Vec<TestResult> {
    println!("--- Terrain ---");
    let mut results = Vec::new();
    let terrain = TerrainConfig::default();

    let mut a = SimulationEngine::new(config.clone());
    let mut b = SimulationEngine::new(config.clone());
    let stats = a.generate_terrain(&terrain);
    b.generate_terrain(&terrain);

    let same = a.export_terrain_json().ok() == b.export_terrain_json().ok();
    results.push(TestResult::new(
        "terrain_deterministic",
        same,
        format!("seed {} reproduces the same map", terrain.seed),
    ));

    let cells = (config.grid_width * config.grid_height) as usize;
    results.push(TestResult::new(
        "terrain_counts_cover_grid",
        stats.plains + stats.water + stats.forest + stats.mountain == cells,
        format!(
            "plains {} water {} forest {} mountain {}",
            stats.plains, stats.water, stats.forest, stats.mountain
        ),
    ));

    let center = CellCoord::new(config.grid_width / 2, config.grid_height / 2);
    results.push(TestResult::new(
        "terrain_center_clear",
        a.tile(center) == Some(TileType::Plains),
        format!("center {} is buildable", center),
    ));

    results
}

// ── 3. Delivery ─────────────────────────────────────────────────────────

fn validate_delivery(config: &SimConfig) -> Vec<TestResult> {
    println!("--- Delivery ---");
    let mut results = Vec::new();
    let quantum = config.production.delivery_quantum;
    let yard = CellCoord::new(10, 10);
    let warehouse = CellCoord::new(20, 20);

    let mut engine = SimulationEngine::new(funded(config));
    engine.set_tile(CellCoord::new(12, 10), TileType::Forest);
    let placed = engine.place_building(BuildingKind::Lumberyard, yard)
        && engine.place_building(BuildingKind::Warehouse, warehouse)
        && engine.assign_warehouse(yard, warehouse);
    results.push(TestResult::new("delivery_layout", placed, "lumberyard and warehouse placed"));
    if !placed {
        return results;
    }

    let stock = quantum * 4.0;
    set_available(&mut engine, yard, stock);
    let sent = engine.deliver_if_ready(yard);
    let reserved = engine.production(yard).map(|p| p.incoming_delivery).unwrap_or(0.0);
    results.push(TestResult::new(
        "delivery_reserves_quantum",
        sent && reserved == quantum,
        format!("reserved {} of {}", reserved, stock),
    ));

    engine.update(config.production.delivery_transit_ms);
    let stored = engine.warehouse(warehouse).map(|w| w.storage.wood).unwrap_or(0.0);
    let left = engine.production(yard).map(|p| p.available_to_deliver).unwrap_or(0.0);
    results.push(TestResult::new(
        "delivery_completes",
        stored == quantum && left == stock - quantum,
        format!("stored {}, {} left at the yard", stored, left),
    ));

    // nearly full warehouse takes only what fits
    let capacity = config.warehouse_capacity;
    engine.store(warehouse, ResourceKind::Stone, capacity - stored - quantum / 2.0);
    engine.deliver_if_ready(yard);
    engine.update(config.production.delivery_transit_ms);
    let total = engine.warehouse(warehouse).map(|w| w.storage.total()).unwrap_or(0.0);
    let p = engine.production(yard);
    let incoming = p.as_ref().map(|p| p.incoming_delivery).unwrap_or(-1.0);
    results.push(TestResult::new(
        "delivery_partial_fill",
        total == capacity && incoming == 0.0 && engine.full_warehouse_count() == 1,
        format!("warehouse at {}/{}", total, capacity),
    ));

    results
}

fn set_available(engine: &mut SimulationEngine, at: CellCoord, amount: f64) {
    let s = engine.settlement_mut();
    if let Some((entity, _)) = s.building_at(at) {
        if let Ok(mut p) = s.world.get::<&mut Production>(entity) {
            p.available_to_deliver = amount;
        }
    }
}

// ── 4. Economy ──────────────────────────────────────────────────────────

struct Layout {
    houses: Vec<CellCoord>,
    center: CellCoord,
    warehouses: Vec<CellCoord>,
    producers: Vec<(CellCoord, Profession)>,
}

fn build_settlement(config: &SimConfig) -> (SimulationEngine, Layout) {
    let mut engine = SimulationEngine::new(funded(config));
    for (x, y, tile) in [
        (12, 10, TileType::Forest),
        (18, 10, TileType::Mountain),
        (24, 10, TileType::Water),
    ] {
        engine.set_tile(CellCoord::new(x, y), tile);
    }

    let layout = Layout {
        houses: (0..6).map(|i| CellCoord::new(2 + 3 * i, 2)).collect(),
        center: CellCoord::new(22, 2),
        warehouses: vec![CellCoord::new(2, 20), CellCoord::new(6, 20), CellCoord::new(10, 20)],
        producers: vec![
            (CellCoord::new(10, 10), Profession::Forester),
            (CellCoord::new(16, 10), Profession::Miner),
            (CellCoord::new(22, 10), Profession::Fisherman),
            (CellCoord::new(28, 10), Profession::Farmer),
        ],
    };

    for &house in &layout.houses {
        engine.place_building(BuildingKind::House, house);
    }
    engine.place_building(BuildingKind::TrainingCenter, layout.center);
    for &warehouse in &layout.warehouses {
        engine.place_building(BuildingKind::Warehouse, warehouse);
    }
    let kinds = [
        BuildingKind::Lumberyard,
        BuildingKind::Quarry,
        BuildingKind::FishermanHut,
        BuildingKind::Farm,
    ];
    for (&(at, _), kind) in layout.producers.iter().zip(kinds) {
        engine.place_building(kind, at);
        engine.assign_warehouse(at, layout.warehouses[0]);
    }
    engine.set_target_tile(layout.producers[0].0, CellCoord::new(12, 10));
    engine.set_target_tile(layout.producers[1].0, CellCoord::new(18, 10));
    engine.set_target_tile(layout.producers[2].0, CellCoord::new(24, 10));
    (engine, layout)
}

/// One scripted step: staff, train, reroute deliveries away from full
/// warehouses
fn manage(engine: &mut SimulationEngine, layout: &Layout, step: usize) {
    for &(at, profession) in &layout.producers {
        if !engine.assign_worker(at, WorkerKind::Specialist(profession)) {
            engine.assign_worker(at, WorkerKind::Villager);
        }
        engine.create_fields(at);
        let assigned = engine.production(at).and_then(|p| p.assigned_warehouse);
        let full = assigned
            .and_then(|w| engine.warehouse(w))
            .map(|w| w.storage.total() >= w.capacity)
            .unwrap_or(true);
        if full {
            let open = engine
                .warehouse_usage()
                .into_iter()
                .find(|u| u.used < u.capacity)
                .map(|u| u.root);
            if let Some(open) = open {
                engine.assign_warehouse(at, open);
            }
        }
        engine.deliver_if_ready(at);
    }
    if step % 10 == 0 {
        let p = Profession::ALL[(step / 10) % Profession::ALL.len()];
        engine.train_villager(p.key());
    }
}

/// Every violated invariant, as human-readable lines
fn invariant_violations(engine: &SimulationEngine) -> Vec<String> {
    let mut violations = Vec::new();
    let world = &engine.settlement().world;
    let production = &engine.config().production;

    for (_, (building, house)) in world.query::<(&Building, &House)>().iter() {
        if house.employed.villager > house.villagers {
            violations.push(format!("house {} over-employs villagers", building.root()));
        }
        for p in Profession::ALL {
            if house.employed.professions.get(p) > house.professions.get(p) {
                violations.push(format!("house {} over-employs {}", building.root(), p.key()));
            }
        }
        if house.occupants + house.incoming > house.capacity {
            violations.push(format!("house {} over capacity", building.root()));
        }
    }
    for (_, (building, w)) in world.query::<(&Building, &Warehouse)>().iter() {
        if w.storage.total() > w.capacity + 1e-9 {
            violations.push(format!("warehouse {} holds {}", building.root(), w.storage.total()));
        }
    }
    for (_, (building, p)) in world.query::<(&Building, &Production)>().iter() {
        if p.available_to_deliver > production.availability_cap + 1e-9 {
            violations.push(format!("{} {} above cap", building.kind.key(), building.root()));
        }
        if p.incoming_delivery > p.available_to_deliver + 1e-9 {
            violations.push(format!("{} {} reserved more than held", building.kind.key(), building.root()));
        }
        if p.workers.len() > production.max_workers {
            violations.push(format!("{} {} has too many workers", building.kind.key(), building.root()));
        }
    }
    violations
}

fn validate_economy(config: &SimConfig) -> Vec<TestResult> {
    println!("--- Economy (1 simulated hour) ---");
    let mut results = Vec::new();
    let (mut engine, layout) = build_settlement(config);

    let mut violations = Vec::new();
    let mut last_ledger = engine.ledger().resources;
    let mut ledger_decreased = false;
    for step in 0..3_600 {
        engine.update(1_000);
        manage(&mut engine, &layout, step);
        if violations.is_empty() {
            violations = invariant_violations(&engine)
                .into_iter()
                .map(|v| format!("t={}ms: {}", engine.now_ms(), v))
                .collect();
        }
        let now = engine.ledger().resources;
        if ResourceKind::ALL.iter().any(|&k| now.get(k) + 1e-9 < last_ledger.get(k)) {
            ledger_decreased = true;
        }
        last_ledger = now;
    }

    results.push(TestResult::new(
        "economy_invariants",
        violations.is_empty(),
        violations
            .first()
            .cloned()
            .unwrap_or_else(|| "3600 steps clean".into()),
    ));
    results.push(TestResult::new(
        "economy_ledger_monotonic",
        !ledger_decreased,
        "production totals only grow without removals or tribute",
    ));

    let summary = engine.population();
    let expected = summary.capacity.min(config.population_cap);
    results.push(TestResult::new(
        "economy_houses_filled",
        summary.population == expected,
        format!(
            "{}/{} residents (cap {})",
            summary.population, summary.capacity, config.population_cap
        ),
    ));
    let census = engine.census();
    results.push(TestResult::new(
        "economy_census_matches_houses",
        census.population == summary.population,
        format!("census {} vs houses {}", census.population, summary.population),
    ));
    results.push(TestResult::new(
        "economy_specialists_trained",
        census.professions.total() > 0,
        format!("{} specialists", census.professions.total()),
    ));
    let stored: f64 = engine.warehouse_usage().iter().map(|u| u.used).sum();
    results.push(TestResult::new(
        "economy_goods_stored",
        stored > 0.0,
        format!("{:.1} units in storage, {:.1} gold", stored, engine.gold()),
    ));

    // the UI reads payloads as JSON tagged by building type
    let yard = layout.producers[0].0;
    let json = engine
        .click_payload(yard)
        .and_then(|p| serde_json::to_value(&p).ok());
    let tagged = json
        .as_ref()
        .map(|v| v["type"] == "lumberyard" && v["workers"].as_array().is_some_and(|w| !w.is_empty()))
        .unwrap_or(false);
    results.push(TestResult::new(
        "economy_payload_json",
        tagged,
        json.map(|v| v.to_string()).unwrap_or_else(|| "no payload".into()),
    ));

    results
}

// ── 5. Teardown ─────────────────────────────────────────────────────────

fn validate_teardown(config: &SimConfig) -> Vec<TestResult> {
    println!("--- Teardown ---");
    let mut results = Vec::new();
    let (mut engine, layout) = build_settlement(config);
    for step in 0..300 {
        engine.update(1_000);
        manage(&mut engine, &layout, step);
    }

    let home = layout.houses[0];
    let employed_from_home = |engine: &SimulationEngine| {
        layout
            .producers
            .iter()
            .filter_map(|&(at, _)| engine.production(at))
            .flat_map(|p| p.workers)
            .filter(|w| w.home == home)
            .count()
    };
    let before = employed_from_home(&engine);
    engine.remove(home);
    results.push(TestResult::new(
        "teardown_house_drops_workers",
        employed_from_home(&engine) == 0,
        format!("{} workers detached", before),
    ));

    let census = engine.census();
    let summary = engine.population();
    results.push(TestResult::new(
        "teardown_census_follows",
        census.population == summary.population,
        format!("census {} vs houses {}", census.population, summary.population),
    ));

    let warehouse = layout.warehouses[0];
    let held = engine.warehouse(warehouse).map(|w| w.storage).unwrap_or_default();
    let ledger_before = engine.ledger().resources;
    engine.remove(warehouse);
    let written_off = ResourceKind::ALL.iter().all(|&k| {
        let expected = (ledger_before.get(k) - held.get(k)).max(0.0);
        (engine.resource(k) - expected).abs() < 1e-9
    });
    let orphaned = layout
        .producers
        .iter()
        .filter_map(|&(at, _)| engine.production(at))
        .any(|p| p.assigned_warehouse == Some(warehouse));
    results.push(TestResult::new(
        "teardown_warehouse_written_off",
        written_off && !orphaned,
        format!("{:.1} units written off", held.total()),
    ));

    let violations = invariant_violations(&engine);
    results.push(TestResult::new(
        "teardown_invariants",
        violations.is_empty(),
        violations.first().cloned().unwrap_or_else(|| "clean".into()),
    ));

    results
}

// ── 6. Persistence ──────────────────────────────────────────────────────

fn validate_persistence(config: &SimConfig) -> Vec<TestResult> {
    println!("--- Persistence ---");
    let mut results = Vec::new();
    let (mut engine, layout) = build_settlement(config);
    for step in 0..120 {
        engine.update(1_000);
        manage(&mut engine, &layout, step);
    }

    let mut bytes = Vec::new();
    if let Err(e) = engine.save(&mut bytes) {
        results.push(TestResult::new("persistence_save", false, e.to_string()));
        return results;
    }
    let mut loaded = SimulationEngine::new(config.clone());
    if let Err(e) = loaded.load(&bytes[..]) {
        results.push(TestResult::new("persistence_load", false, e.to_string()));
        return results;
    }
    results.push(TestResult::new(
        "persistence_round_trip",
        loaded.ledger() == engine.ledger() && loaded.census() == engine.census(),
        format!("{} bytes", bytes.len()),
    ));

    for step in 120..600 {
        engine.update(1_000);
        loaded.update(1_000);
        manage(&mut engine, &layout, step);
        manage(&mut loaded, &layout, step);
    }
    let cells = layout
        .houses
        .iter()
        .chain(&layout.warehouses)
        .chain(layout.producers.iter().map(|(at, _)| at))
        .chain(std::iter::once(&layout.center));
    let diverged: Vec<_> = cells
        .filter(|&&c| engine.click_payload(c) != loaded.click_payload(c))
        .collect();
    results.push(TestResult::new(
        "persistence_deterministic_resume",
        diverged.is_empty() && loaded.ledger() == engine.ledger(),
        if diverged.is_empty() {
            "loaded settlement tracks the saved one for 8 minutes".into()
        } else {
            format!("{} buildings diverged, first at {}", diverged.len(), diverged[0])
        },
    ));

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_initialises_once() {
        init_logging(false);
        // a second call keeps the first subscriber instead of panicking
        init_logging(true);
    }
}
