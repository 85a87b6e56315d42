//! Production state machine shared by every gathering building
//!
//! A producer is Idle (no timer) or Producing (repeating timer). The timer
//! interval never changes; worker efficiency scales the output of each tick.

use hecs::Entity;

use crate::components::{
    Building, BuildingKind, BuildingRef, CellCoord, GatherTarget, Production, TileType, WorkerKind,
    WorkerRef,
};
use crate::config::ProductionConfig;
use crate::scheduler::SimEvent;
use crate::settlement::Settlement;

use super::delivery::deliver_from;
use super::lifecycle::spawn_field;
use super::placement::is_within_radius;

/// Summed worker contribution in percent, capped at `max_efficiency`
pub fn efficiency(workers: &[WorkerRef], config: &ProductionConfig) -> u32 {
    let sum: u32 = workers
        .iter()
        .map(|w| match w.kind {
            WorkerKind::Villager => config.villager_contribution,
            WorkerKind::Specialist(_) => config.specialist_contribution,
        })
        .sum();
    sum.min(config.max_efficiency)
}

/// Gating precondition for Idle -> Producing
pub fn can_produce(production: &Production, config: &ProductionConfig) -> bool {
    if production.workers.is_empty() {
        return false;
    }
    match &production.target {
        GatherTarget::Tile(tile) => tile.is_some(),
        GatherTarget::Fields(fields) => fields.len() >= config.fields_per_farm,
    }
}

/// Start or stop the production timer to match the gating precondition.
/// Safe to call any number of times.
pub fn update_production_timer(s: &mut Settlement, entity: Entity) {
    let Some(building) = s.world.get::<&Building>(entity).ok().map(|b| *b) else {
        return;
    };
    let (should_run, timer) = match s.world.get::<&Production>(entity) {
        Ok(p) => (
            !building.under_construction && can_produce(&p, &s.config.production),
            p.timer,
        ),
        Err(_) => return,
    };

    match (should_run, timer) {
        (true, None) => {
            let id = s.scheduler.schedule_every(
                s.config.production.interval_ms,
                SimEvent::ProductionTick {
                    building: building.reference(),
                },
            );
            if let Ok(mut p) = s.world.get::<&mut Production>(entity) {
                p.timer = Some(id);
            }
            log::debug!("{:?} at {} started producing", building.kind, building.root());
        }
        (false, Some(id)) => {
            s.scheduler.cancel(id);
            if let Ok(mut p) = s.world.get::<&mut Production>(entity) {
                p.timer = None;
            }
            log::debug!("{:?} at {} went idle", building.kind, building.root());
        }
        _ => {}
    }
}

/// Cancel the timer of a building being torn down
pub fn stop_production(s: &mut Settlement, entity: Entity) {
    let timer = match s.world.get::<&mut Production>(entity) {
        Ok(mut p) => p.timer.take(),
        Err(_) => None,
    };
    if let Some(id) = timer {
        s.scheduler.cancel(id);
    }
}

/// One production tick. Output is clamped so undelivered stock never exceeds
/// the availability cap.
pub fn production_tick(s: &mut Settlement, reference: BuildingRef) {
    let Some((entity, building)) = s.resolve(reference) else {
        return;
    };
    let Some(profile) = building.kind.production_profile() else {
        return;
    };
    let config = &s.config.production;
    let cap = config.availability_cap;

    let gained = {
        let Ok(mut p) = s.world.get::<&mut Production>(entity) else {
            return;
        };
        let eff = efficiency(&p.workers, config);
        if eff == 0 {
            return;
        }
        if p.available_to_deliver >= cap {
            log::trace!("{:?} at {} stalled at cap", building.kind, building.root());
            return;
        }
        let output = eff as f64 / 100.0 * config.output_per_full_efficiency;
        let gain = output.min(cap - p.available_to_deliver);
        p.gathered_total += gain;
        p.available_to_deliver += gain;
        gain
    };

    s.ledger.resources.add(profile.resource, gained);
    log::trace!(
        "{:?} at {} produced {} {:?}",
        building.kind,
        building.root(),
        gained,
        profile.resource
    );
    deliver_from(s, entity);
}

/// Point a gatherer at a terrain tile of its kind within radius
pub fn set_target_tile(s: &mut Settlement, at: CellCoord, tile: CellCoord) -> bool {
    let Some((entity, building)) = s.production_at(at) else {
        return false;
    };
    let Some(required) = building.kind.production_profile().and_then(|p| p.terrain) else {
        return false;
    };
    if s.grid.tile(tile) != Some(required) {
        return false;
    }
    // radius counts from the root cell
    if !is_within_radius(building.root(), tile, s.config.production.gather_radius) {
        return false;
    }

    match s.world.get::<&mut Production>(entity) {
        Ok(mut p) => p.target = GatherTarget::Tile(Some(tile)),
        Err(_) => return false,
    }
    update_production_timer(s, entity);
    true
}

/// Clear the target tile. Succeeds for every tile-working producer whether
/// or not a target was set; false for farms and non-producers.
pub fn clear_target_tile(s: &mut Settlement, at: CellCoord) -> bool {
    let Some((entity, _)) = s.production_at(at) else {
        return false;
    };
    match s.world.get::<&mut Production>(entity) {
        Ok(mut p) if matches!(p.target, GatherTarget::Tile(_)) => {
            p.target = GatherTarget::Tile(None);
        }
        _ => return false,
    }
    update_production_timer(s, entity);
    true
}

/// Cells a farm's fields occupy: the row directly below its footprint
pub fn field_cells(s: &Settlement, farm_root: CellCoord) -> Vec<CellCoord> {
    let (_, h) = BuildingKind::Farm.size();
    (0..s.config.production.fields_per_farm as i32)
        .map(|dx| farm_root.offset(dx, h))
        .collect()
}

/// Claim the field cells below a staffed farm, all or nothing
pub fn create_fields(s: &mut Settlement, at: CellCoord) -> bool {
    let Some((entity, building)) = s.usable_building_at(at, BuildingKind::Farm) else {
        return false;
    };
    let ready = s
        .world
        .get::<&Production>(entity)
        .map(|p| !p.workers.is_empty() && p.fields().len() < s.config.production.fields_per_farm)
        .unwrap_or(false);
    if !ready {
        return false;
    }

    let cells = field_cells(s, building.root());
    let clear = cells.iter().all(|c| {
        s.grid
            .get(*c)
            .is_some_and(|cell| !cell.is_occupied() && cell.tile == TileType::Plains)
    });
    if !clear {
        return false;
    }

    let mut claimed = Vec::with_capacity(cells.len());
    for cell in cells {
        if spawn_field(s, building.reference(), cell).is_some() {
            claimed.push(cell);
        }
    }
    if let Ok(mut p) = s.world.get::<&mut Production>(entity) {
        p.target = GatherTarget::Fields(claimed);
    }
    log::debug!("Farm at {} created its fields", building.root());
    update_production_timer(s, entity);
    true
}
