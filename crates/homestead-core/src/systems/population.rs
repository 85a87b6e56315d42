//! Population - arrivals, training and the census query surface

use serde::{Deserialize, Serialize};

use crate::components::{
    Building, BuildingKind, BuildingRef, CellCoord, House, Profession, ProfessionCounts, Training,
    TrainingCenter, WorkerKind,
};
use crate::scheduler::SimEvent;
use crate::settlement::Settlement;

/// Running global counters, updated on arrival and training completion
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Census {
    pub population: u32,
    pub professions: ProfessionCounts,
}

/// Totals for one kind of worker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkerTally {
    pub total: u32,
    pub employed: u32,
    pub unemployed: u32,
}

impl WorkerTally {
    fn add(&mut self, total: u32, employed: u32) {
        self.total += total;
        self.employed += employed;
        self.unemployed = self.total.saturating_sub(self.employed);
    }
}

/// Population summary derived from house roots
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PopulationSummary {
    /// Sum of occupants
    pub population: u32,
    pub capacity: u32,
    pub villagers: WorkerTally,
    pub farmer: WorkerTally,
    pub forester: WorkerTally,
    pub miner: WorkerTally,
    pub fisherman: WorkerTally,
}

impl PopulationSummary {
    pub fn tally(&self, kind: WorkerKind) -> WorkerTally {
        match kind {
            WorkerKind::Villager => self.villagers,
            WorkerKind::Specialist(Profession::Farmer) => self.farmer,
            WorkerKind::Specialist(Profession::Forester) => self.forester,
            WorkerKind::Specialist(Profession::Miner) => self.miner,
            WorkerKind::Specialist(Profession::Fisherman) => self.fisherman,
        }
    }

    fn tally_mut(&mut self, kind: WorkerKind) -> &mut WorkerTally {
        match kind {
            WorkerKind::Villager => &mut self.villagers,
            WorkerKind::Specialist(Profession::Farmer) => &mut self.farmer,
            WorkerKind::Specialist(Profession::Forester) => &mut self.forester,
            WorkerKind::Specialist(Profession::Miner) => &mut self.miner,
            WorkerKind::Specialist(Profession::Fisherman) => &mut self.fisherman,
        }
    }
}

/// Completed houses in scan order
fn houses(s: &Settlement) -> impl Iterator<Item = (CellCoord, hecs::Entity)> + '_ {
    s.roots_of_kind(BuildingKind::House)
        .into_iter()
        .filter(move |(root, _)| s.usable_root(*root, BuildingKind::House).is_some())
}

pub fn summarize(s: &Settlement) -> PopulationSummary {
    let mut summary = PopulationSummary::default();
    for (_, entity) in houses(s) {
        let Ok(house) = s.world.get::<&House>(entity) else {
            continue;
        };
        summary.population += house.occupants;
        summary.capacity += house.capacity;
        let kinds = std::iter::once(WorkerKind::Villager)
            .chain(Profession::ALL.into_iter().map(WorkerKind::Specialist));
        for kind in kinds {
            summary
                .tally_mut(kind)
                .add(house.residents(kind), house.employed.get(kind));
        }
    }
    summary
}

/// Unemployed villagers across every house
pub fn available_villagers(s: &Settlement) -> u32 {
    houses(s)
        .filter_map(|(_, e)| s.world.get::<&House>(e).ok().map(|h| h.available(WorkerKind::Villager)))
        .sum()
}

/// Beds reserved by newcomers still walking in
pub fn pending_arrivals(s: &Settlement) -> u32 {
    houses(s)
        .filter_map(|(_, e)| s.world.get::<&House>(e).ok().map(|h| h.incoming))
        .sum()
}

/// Periodic arrival: reserve a bed in the first house with room and send a
/// newcomer walking there. Returns the chosen house.
///
/// Nobody new sets out once residents plus walkers reach `population_cap`.
pub fn villager_arrival_tick(s: &mut Settlement) -> Option<CellCoord> {
    if s.census.population + pending_arrivals(s) >= s.config.population_cap {
        return None;
    }
    let (root, entity) = houses(s).find(|(_, e)| {
        s.world
            .get::<&House>(*e)
            .map(|h| h.has_room())
            .unwrap_or(false)
    })?;
    let building = *s.world.get::<&Building>(entity).ok()?;
    s.world.get::<&mut House>(entity).ok()?.incoming += 1;
    s.scheduler.schedule_once(
        s.config.villager_walk_ms,
        SimEvent::ArrivalComplete {
            house: building.reference(),
        },
    );
    log::trace!("Villager heading to house at {}", root);
    Some(root)
}

/// The newcomer moves in
pub fn complete_arrival(s: &mut Settlement, house: BuildingRef) -> bool {
    let Some((entity, _)) = s.resolve(house) else {
        return false;
    };
    let Ok(mut h) = s.world.get::<&mut House>(entity) else {
        return false;
    };
    h.incoming = h.incoming.saturating_sub(1);
    if h.occupants >= h.capacity {
        return false;
    }
    h.occupants += 1;
    h.villagers += 1;
    drop(h);
    s.census.population += 1;
    log::debug!("Villager moved into house at {}", house.root);
    true
}

/// Begin training one unemployed villager at the center covering `at`.
/// Fails if this center is already training `profession` or nobody is free.
pub fn start_training(s: &mut Settlement, at: CellCoord, profession: Profession) -> bool {
    let Some((center, center_building)) = s.usable_building_at(at, BuildingKind::TrainingCenter) else {
        return false;
    };
    let busy = s
        .world
        .get::<&TrainingCenter>(center)
        .map(|c| c.is_training(profession))
        .unwrap_or(true);
    if busy {
        return false;
    }

    let Some((_, house)) = houses(s).find(|(_, e)| {
        s.world
            .get::<&House>(*e)
            .map(|h| h.available(WorkerKind::Villager) > 0)
            .unwrap_or(false)
    }) else {
        return false;
    };
    let Some(home) = s.world.get::<&Building>(house).ok().map(|b| b.reference()) else {
        return false;
    };
    if let Ok(mut h) = s.world.get::<&mut House>(house) {
        h.villagers -= 1;
    }

    let now = s.now_ms();
    let duration = s.config.training_ms;
    if let Ok(mut c) = s.world.get::<&mut TrainingCenter>(center) {
        c.in_training.push(Training {
            profession,
            home,
            started_ms: now,
            completes_ms: now + duration,
        });
    }
    s.scheduler.schedule_once(
        duration,
        SimEvent::TrainingComplete {
            center: center_building.reference(),
            profession,
        },
    );
    log::debug!(
        "Training {} at {} with villager from house at {}",
        profession.key(),
        center_building.root(),
        home.root
    );
    true
}

/// Route a training request to the first center not already training
/// `profession`
pub fn train_villager(s: &mut Settlement, profession: Profession) -> bool {
    let candidate = s
        .roots_of_kind(BuildingKind::TrainingCenter)
        .into_iter()
        .filter(|(root, _)| s.usable_root(*root, BuildingKind::TrainingCenter).is_some())
        .find(|(_, e)| {
            s.world
                .get::<&TrainingCenter>(*e)
                .map(|c| !c.is_training(profession))
                .unwrap_or(false)
        });
    match candidate {
        Some((root, _)) => start_training(s, root, profession),
        None => false,
    }
}

/// The trainee becomes a specialist at its home, if the home still stands
pub fn complete_training(s: &mut Settlement, center: BuildingRef, profession: Profession) -> bool {
    let Some((entity, _)) = s.resolve(center) else {
        return false;
    };
    let training = match s.world.get::<&mut TrainingCenter>(entity) {
        Ok(mut c) => {
            let Some(idx) = c.in_training.iter().position(|t| t.profession == profession) else {
                return false;
            };
            c.in_training.remove(idx)
        }
        Err(_) => return false,
    };

    *s.census.professions.get_mut(profession) += 1;
    let Some((house, _)) = s.resolve(training.home) else {
        log::debug!("Trained {} has no home to return to", profession.key());
        return true;
    };
    if let Ok(mut h) = s.world.get::<&mut House>(house) {
        *h.professions.get_mut(profession) += 1;
    }
    log::debug!(
        "Trained {} returned to house at {}",
        profession.key(),
        training.home.root
    );
    true
}

/// Give trainees of a demolished center back to their houses as villagers
pub fn refund_trainees(s: &mut Settlement, center: hecs::Entity) {
    let trainees = match s.world.get::<&mut TrainingCenter>(center) {
        Ok(mut c) => std::mem::take(&mut c.in_training),
        Err(_) => return,
    };
    for training in trainees {
        if let Some((house, _)) = s.resolve(training.home) {
            if let Ok(mut h) = s.world.get::<&mut House>(house) {
                h.villagers += 1;
            }
        }
    }
}

/// Remove a demolished house's residents from the census
pub fn forget_house(s: &mut Settlement, house: &House) {
    s.census.population = s.census.population.saturating_sub(house.occupants);
    for p in Profession::ALL {
        let count = s.census.professions.get_mut(p);
        *count = count.saturating_sub(house.professions.get(p));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::systems::lifecycle::{place_building, remove_building};

    fn settlement() -> Settlement {
        Settlement::new(SimConfig {
            starting_gold: 1000.0,
            ..Default::default()
        })
    }

    fn house(s: &Settlement, at: CellCoord) -> House {
        let (e, _) = s.building_at(at).unwrap();
        House::clone(&s.world.get::<&House>(e).unwrap())
    }

    #[test]
    fn test_arrival_reserves_then_moves_in() {
        let mut s = settlement();
        let at = CellCoord::new(0, 0);
        assert!(place_building(&mut s, BuildingKind::House, at));

        assert_eq!(villager_arrival_tick(&mut s), Some(at));
        assert_eq!(house(&s, at).incoming, 1);
        assert_eq!(house(&s, at).occupants, 0);

        let (_, b) = s.building_at(at).unwrap();
        assert!(complete_arrival(&mut s, b.reference()));
        let h = house(&s, at);
        assert_eq!((h.incoming, h.occupants, h.villagers), (0, 1, 1));
        assert_eq!(s.census.population, 1);
    }

    #[test]
    fn test_arrival_skips_full_houses() {
        let mut s = settlement();
        let first = CellCoord::new(0, 0);
        let second = CellCoord::new(5, 0);
        assert!(place_building(&mut s, BuildingKind::House, first));
        assert!(place_building(&mut s, BuildingKind::House, second));
        for _ in 0..4 {
            assert_eq!(villager_arrival_tick(&mut s), Some(first));
        }
        assert_eq!(villager_arrival_tick(&mut s), Some(second));
    }

    #[test]
    fn test_arrivals_stop_at_population_cap() {
        let mut s = Settlement::new(SimConfig {
            starting_gold: 1000.0,
            population_cap: 6,
            ..Default::default()
        });
        for x in [0, 5, 10] {
            assert!(place_building(&mut s, BuildingKind::House, CellCoord::new(x, 0)));
        }
        {
            let (e, _) = s.building_at(CellCoord::new(0, 0)).unwrap();
            let mut h = s.world.get::<&mut House>(e).unwrap();
            h.occupants = 4;
            h.villagers = 4;
        }
        s.census.population = 4;

        // two walkers bring the settlement to the cap
        assert!(villager_arrival_tick(&mut s).is_some());
        assert!(villager_arrival_tick(&mut s).is_some());
        assert_eq!(pending_arrivals(&s), 2);
        assert_eq!(villager_arrival_tick(&mut s), None);
        assert_eq!(pending_arrivals(&s), 2);
    }

    #[test]
    fn test_training_outlives_demolished_home() {
        let mut s = settlement();
        let home = CellCoord::new(0, 0);
        let center = CellCoord::new(5, 5);
        assert!(place_building(&mut s, BuildingKind::House, home));
        assert!(place_building(&mut s, BuildingKind::TrainingCenter, center));
        {
            let (e, _) = s.building_at(home).unwrap();
            let mut h = s.world.get::<&mut House>(e).unwrap();
            h.occupants = 1;
            h.villagers = 1;
        }
        s.census.population = 1;
        assert!(start_training(&mut s, center, Profession::Miner));
        assert!(remove_building(&mut s, home));

        // the specialist is counted even though nobody houses them
        let (_, b) = s.building_at(center).unwrap();
        assert!(complete_training(&mut s, b.reference(), Profession::Miner));
        assert_eq!(s.census.professions.miner, 1);
        assert_eq!(s.census.population, 0);
        assert_eq!(summarize(&s).tally(WorkerKind::Specialist(Profession::Miner)).total, 0);
    }

    #[test]
    fn test_training_keeps_occupants() {
        let mut s = settlement();
        let home = CellCoord::new(0, 0);
        let center = CellCoord::new(5, 5);
        assert!(place_building(&mut s, BuildingKind::House, home));
        assert!(place_building(&mut s, BuildingKind::TrainingCenter, center));
        {
            let (e, _) = s.building_at(home).unwrap();
            let mut h = s.world.get::<&mut House>(e).unwrap();
            h.occupants = 2;
            h.villagers = 2;
        }

        assert!(start_training(&mut s, center, Profession::Miner));
        assert!(!start_training(&mut s, center, Profession::Miner));
        assert_eq!(house(&s, home).villagers, 1);
        assert_eq!(house(&s, home).occupants, 2);

        let (_, b) = s.building_at(center).unwrap();
        assert!(complete_training(&mut s, b.reference(), Profession::Miner));
        let h = house(&s, home);
        assert_eq!(h.professions.miner, 1);
        assert_eq!(h.occupants, 2);
        assert_eq!(s.census.professions.miner, 1);
    }

    #[test]
    fn test_summary() {
        let mut s = settlement();
        let at = CellCoord::new(0, 0);
        assert!(place_building(&mut s, BuildingKind::House, at));
        {
            let (e, _) = s.building_at(at).unwrap();
            let mut h = s.world.get::<&mut House>(e).unwrap();
            h.occupants = 3;
            h.villagers = 2;
            h.professions.farmer = 1;
            h.employed.villager = 1;
        }
        let summary = summarize(&s);
        assert_eq!(summary.population, 3);
        assert_eq!(summary.capacity, 4);
        assert_eq!(
            summary.villagers,
            WorkerTally {
                total: 2,
                employed: 1,
                unemployed: 1
            }
        );
        assert_eq!(summary.tally(WorkerKind::Specialist(Profession::Farmer)).unemployed, 1);
        assert_eq!(available_villagers(&s), 1);
    }
}
