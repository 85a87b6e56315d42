//! Worker assignment - lending residents to production buildings
//!
//! A worker is never moved out of its house. The house's `employed` counter
//! records the loan and the building keeps a `WorkerRef` pointing home, so
//! either side can be torn down independently.

use hecs::Entity;

use crate::components::{BuildingKind, CellCoord, House, Production, WorkerKind, WorkerRef};
use crate::settlement::Settlement;

use super::production::update_production_timer;

/// First completed house (scan order) with an unemployed resident of `kind`
pub fn find_house_with_available(s: &Settlement, kind: WorkerKind) -> Option<(CellCoord, Entity)> {
    s.roots_of_kind(BuildingKind::House)
        .into_iter()
        .filter(|(root, _)| s.usable_root(*root, BuildingKind::House).is_some())
        .find(|(_, entity)| {
            s.world
                .get::<&House>(*entity)
                .map(|h| h.available(kind) > 0)
                .unwrap_or(false)
        })
}

/// Borrow a resident of `kind` for the production building covering `at`
pub fn assign_worker(s: &mut Settlement, at: CellCoord, kind: WorkerKind) -> bool {
    let Some((entity, building)) = s.production_at(at) else {
        return false;
    };
    let accepts = building
        .kind
        .production_profile()
        .is_some_and(|profile| profile.accepts(kind));
    if !accepts {
        return false;
    }

    let max_workers = s.config.production.max_workers;
    let has_slot = s
        .world
        .get::<&Production>(entity)
        .map(|p| p.workers.len() < max_workers)
        .unwrap_or(false);
    if !has_slot {
        return false;
    }

    let Some((home, house)) = find_house_with_available(s, kind) else {
        return false;
    };
    if let Ok(mut h) = s.world.get::<&mut House>(house) {
        *h.employed.get_mut(kind) += 1;
    }
    if let Ok(mut p) = s.world.get::<&mut Production>(entity) {
        p.workers.push(WorkerRef { kind, home });
    }
    update_production_timer(s, entity);
    true
}

/// Send the most recently assigned worker home
pub fn unassign_last_worker(s: &mut Settlement, at: CellCoord) -> bool {
    let Some((entity, _)) = s.production_at(at) else {
        return false;
    };
    let worker = match s.world.get::<&mut Production>(entity) {
        Ok(mut p) => p.workers.pop(),
        Err(_) => None,
    };
    let Some(worker) = worker else {
        return false;
    };
    release_to_home(s, worker);
    update_production_timer(s, entity);
    true
}

/// Credit the worker back to its house; a demolished home gets nothing
pub fn release_to_home(s: &mut Settlement, worker: WorkerRef) {
    let Some(house) = house_entity(s, worker.home) else {
        return;
    };
    if let Ok(mut h) = s.world.get::<&mut House>(house) {
        h.release(worker.kind);
    }
}

/// Release every worker of a building being torn down
pub fn release_all_workers(s: &mut Settlement, entity: Entity) {
    let workers = match s.world.get::<&mut Production>(entity) {
        Ok(mut p) => std::mem::take(&mut p.workers),
        Err(_) => return,
    };
    for worker in workers.into_iter().rev() {
        release_to_home(s, worker);
    }
}

/// Drop every worker whose home is the house at `home` from every producer,
/// then recompute each affected producer's gating. Returns the number of
/// workers dropped.
pub fn detach_workers_from_house(s: &mut Settlement, home: CellCoord) -> usize {
    let mut detached = 0;
    for (_, entity) in s.production_roots() {
        let gone: Vec<WorkerRef> = match s.world.get::<&mut Production>(entity) {
            Ok(mut p) => {
                let (gone, kept): (Vec<_>, Vec<_>) =
                    p.workers.drain(..).partition(|w| w.home == home);
                p.workers = kept;
                gone
            }
            Err(_) => continue,
        };
        if gone.is_empty() {
            continue;
        }
        detached += gone.len();
        for worker in gone {
            release_to_home(s, worker);
        }
        update_production_timer(s, entity);
    }
    detached
}

/// Entity of the house rooted exactly at `root`, built or not
fn house_entity(s: &Settlement, root: CellCoord) -> Option<Entity> {
    let cell = s.grid.get(root)?;
    if cell.root != Some(root) || cell.kind != Some(BuildingKind::House) {
        return None;
    }
    cell.building
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Profession, TileType};
    use crate::config::SimConfig;
    use crate::systems::lifecycle::place_building;

    fn settlement_with_lumberyard() -> (Settlement, CellCoord, CellCoord) {
        let mut s = Settlement::new(SimConfig {
            starting_gold: 1000.0,
            ..Default::default()
        });
        s.grid.set_tile(CellCoord::new(12, 10), TileType::Forest);
        let house = CellCoord::new(2, 2);
        let yard = CellCoord::new(10, 10);
        assert!(place_building(&mut s, BuildingKind::House, house));
        assert!(place_building(&mut s, BuildingKind::Lumberyard, yard));
        (s, house, yard)
    }

    fn house_mut(s: &mut Settlement, at: CellCoord) -> hecs::RefMut<'_, House> {
        let (entity, _) = s.building_at(at).unwrap();
        s.world.get::<&mut House>(entity).unwrap()
    }

    #[test]
    fn test_no_villagers_means_no_assignment() {
        let (mut s, _, yard) = settlement_with_lumberyard();
        assert!(!assign_worker(&mut s, yard, WorkerKind::Villager));
        let (entity, _) = s.building_at(yard).unwrap();
        assert!(s.world.get::<&Production>(entity).unwrap().workers.is_empty());
    }

    #[test]
    fn test_assign_then_unassign_round_trip() {
        let (mut s, house, yard) = settlement_with_lumberyard();
        house_mut(&mut s, house).villagers = 3;

        assert!(assign_worker(&mut s, yard, WorkerKind::Villager));
        assert_eq!(house_mut(&mut s, house).employed.villager, 1);

        // any covered cell addresses the building
        assert!(unassign_last_worker(&mut s, yard.offset(1, 1)));
        assert_eq!(house_mut(&mut s, house).employed.villager, 0);
        assert!(!unassign_last_worker(&mut s, yard));
    }

    #[test]
    fn test_slot_cap_and_specialist_match() {
        let (mut s, house, yard) = settlement_with_lumberyard();
        {
            let mut h = house_mut(&mut s, house);
            h.villagers = 3;
            h.professions.miner = 1;
            h.professions.forester = 2;
        }
        assert!(!assign_worker(&mut s, yard, WorkerKind::Specialist(Profession::Miner)));
        assert!(assign_worker(&mut s, yard, WorkerKind::Specialist(Profession::Forester)));
        assert!(assign_worker(&mut s, yard, WorkerKind::Specialist(Profession::Forester)));
        assert!(!assign_worker(&mut s, yard, WorkerKind::Villager));
        assert_eq!(house_mut(&mut s, house).employed.professions.forester, 2);
    }

    #[test]
    fn test_detach_workers_from_house() {
        let (mut s, house, yard) = settlement_with_lumberyard();
        house_mut(&mut s, house).villagers = 2;
        assert!(assign_worker(&mut s, yard, WorkerKind::Villager));
        assert!(assign_worker(&mut s, yard, WorkerKind::Villager));

        assert_eq!(detach_workers_from_house(&mut s, house), 2);
        assert_eq!(house_mut(&mut s, house).employed.villager, 0);
        let (entity, _) = s.building_at(yard).unwrap();
        assert!(s.world.get::<&Production>(entity).unwrap().workers.is_empty());
    }
}
