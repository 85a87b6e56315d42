//! Building lifecycle - placement, construction and teardown

use hecs::Entity;

use crate::components::{
    Building, BuildingKind, BuildingRef, CellCoord, FarmField, Footprint, House, Production,
    ResourceKind, Tower, TrainingCenter, Warehouse,
};
use crate::scheduler::SimEvent;
use crate::settlement::Settlement;

use super::placement::{can_place_footprint, check_placement};
use super::population::{forget_house, refund_trainees};
use super::production::{stop_production, update_production_timer};
use super::warehouse::clear_assignments_to;
use super::workforce::{detach_workers_from_house, release_all_workers};

/// Validate, charge and build. Any failed rule is a silent no-op.
pub fn place_building(s: &mut Settlement, kind: BuildingKind, origin: CellCoord) -> bool {
    if check_placement(s, kind, origin).is_err() {
        return false;
    }
    let cost = s.config.cost(kind);
    match init_building(s, kind, origin) {
        Some(reference) => {
            s.ledger.gold -= cost;
            log::debug!(
                "Placed {} at {} for {} gold",
                kind.key(),
                reference.root,
                cost
            );
            true
        }
        None => false,
    }
}

/// Spawn the building entity with its kind's starting state and mark its
/// cells. Construction starts immediately when the kind has a build time.
pub fn init_building(s: &mut Settlement, kind: BuildingKind, origin: CellCoord) -> Option<BuildingRef> {
    let (w, h) = kind.size();
    let footprint = Footprint::new(origin, w, h);
    if !can_place_footprint(&s.grid, &footprint) {
        return None;
    }
    let build_ms = s.config.construction_ms.get(kind);
    let building = Building {
        id: s.allocate_id(),
        kind,
        footprint,
        under_construction: build_ms > 0,
    };

    let entity = spawn_with_state(s, building);
    s.grid
        .occupy(&footprint, entity, kind, building.under_construction);
    if building.under_construction {
        s.scheduler.schedule_once(
            build_ms,
            SimEvent::ConstructionComplete {
                building: building.reference(),
            },
        );
    }
    Some(building.reference())
}

fn spawn_with_state(s: &mut Settlement, building: Building) -> Entity {
    let config = &s.config;
    match building.kind {
        BuildingKind::House => s.world.spawn((building, House::new(config.house_capacity))),
        BuildingKind::TrainingCenter => s.world.spawn((building, TrainingCenter::default())),
        BuildingKind::Warehouse => s
            .world
            .spawn((building, Warehouse::new(config.warehouse_capacity))),
        BuildingKind::Tower => s.world.spawn((
            building,
            Tower {
                last_shot_ms: 0,
                cooldown_ms: config.tower.cooldown_ms,
                range: config.tower.range,
                damage: config.tower.damage,
            },
        )),
        BuildingKind::Farm => s.world.spawn((building, Production::with_fields())),
        BuildingKind::Lumberyard | BuildingKind::Quarry | BuildingKind::FishermanHut => {
            s.world.spawn((building, Production::with_target_tile()))
        }
        BuildingKind::FarmField => s.world.spawn((building,)),
    }
}

/// Claim one cell as a self-rooted field of `farm`
pub fn spawn_field(s: &mut Settlement, farm: BuildingRef, cell: CellCoord) -> Option<Entity> {
    let footprint = Footprint::new(cell, 1, 1);
    if !can_place_footprint(&s.grid, &footprint) {
        return None;
    }
    let building = Building {
        id: s.allocate_id(),
        kind: BuildingKind::FarmField,
        footprint,
        under_construction: false,
    };
    let entity = s.world.spawn((building, FarmField { farm }));
    s.grid.occupy(&footprint, entity, BuildingKind::FarmField, false);
    Some(entity)
}

/// Finish construction and let the building start working
pub fn complete_construction(s: &mut Settlement, reference: BuildingRef) -> bool {
    let Some((entity, building)) = s.resolve(reference) else {
        return false;
    };
    if !building.under_construction {
        return false;
    }
    if let Ok(mut b) = s.world.get::<&mut Building>(entity) {
        b.under_construction = false;
    }
    s.grid.set_under_construction(&building.footprint, false);
    if building.kind.is_production() {
        update_production_timer(s, entity);
    }
    log::debug!("{} at {} finished construction", building.kind.key(), building.root());
    true
}

/// Tear down the building covering `at`. Fields go with their farm and
/// cannot be removed on their own.
pub fn remove_building(s: &mut Settlement, at: CellCoord) -> bool {
    let Some((entity, building)) = s.building_at(at) else {
        return false;
    };

    match building.kind {
        BuildingKind::FarmField => return false,
        BuildingKind::House => {
            let house = s.world.get::<&House>(entity).ok().map(|h| House::clone(&h));
            let detached = detach_workers_from_house(s, building.root());
            if let Some(house) = house {
                forget_house(s, &house);
            }
            log::debug!("House at {} removed, {} workers dropped", building.root(), detached);
        }
        BuildingKind::TrainingCenter => refund_trainees(s, entity),
        BuildingKind::Warehouse => {
            let storage = s.world.get::<&Warehouse>(entity).ok().map(|w| w.storage);
            if let Some(storage) = storage {
                for kind in ResourceKind::ALL {
                    s.ledger.resources.remove_floored(kind, storage.get(kind));
                }
            }
            clear_assignments_to(s, building.root());
        }
        BuildingKind::Tower => {}
        BuildingKind::Lumberyard
        | BuildingKind::Quarry
        | BuildingKind::Farm
        | BuildingKind::FishermanHut => teardown_producer(s, entity, building),
    }

    s.grid.vacate(&building.footprint);
    let _ = s.world.despawn(entity);
    log::debug!("Removed {} at {}", building.kind.key(), building.root());
    true
}

/// Release workers, stop the timer, write off undelivered stock and clear
/// any fields
fn teardown_producer(s: &mut Settlement, entity: Entity, building: Building) {
    stop_production(s, entity);
    release_all_workers(s, entity);

    let Some(production) = s.world.get::<&Production>(entity).ok().map(|p| Production::clone(&p)) else {
        return;
    };
    // goods already in transit still arrive
    if let Some(profile) = building.kind.production_profile() {
        s.ledger
            .resources
            .remove_floored(profile.resource, production.unreserved());
    }

    for &cell in production.fields() {
        let Some((field, b)) = s.building_at(cell) else {
            continue;
        };
        let owned = s
            .world
            .get::<&FarmField>(field)
            .map(|f| f.farm == building.reference())
            .unwrap_or(false);
        if owned {
            s.grid.vacate(&b.footprint);
            let _ = s.world.despawn(field);
        }
    }
}
