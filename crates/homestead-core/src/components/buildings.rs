//! Building components: identity, houses, warehouses, training centers, towers.
//!
//! Each placed building is one entity. Its `Building` component records the
//! footprint; the kind-specific component carries the state that the root
//! cell owns.

use serde::{Deserialize, Serialize};

use super::common::{CellCoord, Footprint};
use super::resources::{Profession, ProfessionCounts, ResourceKind, Stock, WorkerKind};
use super::terrain::TileType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    House,
    TrainingCenter,
    Lumberyard,
    Quarry,
    Farm,
    FarmField,
    FishermanHut,
    Warehouse,
    Tower,
}

impl BuildingKind {
    /// Kinds a player can place directly (fields are created by farms)
    pub const PLACEABLE: [BuildingKind; 8] = [
        BuildingKind::House,
        BuildingKind::TrainingCenter,
        BuildingKind::Lumberyard,
        BuildingKind::Quarry,
        BuildingKind::Farm,
        BuildingKind::FishermanHut,
        BuildingKind::Warehouse,
        BuildingKind::Tower,
    ];

    /// Footprint (width, height) in cells
    pub fn size(&self) -> (i32, i32) {
        match self {
            BuildingKind::House => (2, 2),
            BuildingKind::TrainingCenter => (3, 2),
            BuildingKind::Lumberyard => (2, 2),
            BuildingKind::Quarry => (2, 2),
            BuildingKind::Farm => (2, 2),
            BuildingKind::FarmField => (1, 1),
            BuildingKind::FishermanHut => (2, 2),
            BuildingKind::Warehouse => (3, 3),
            BuildingKind::Tower => (1, 2),
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            BuildingKind::House => "house",
            BuildingKind::TrainingCenter => "training_center",
            BuildingKind::Lumberyard => "lumberyard",
            BuildingKind::Quarry => "quarry",
            BuildingKind::Farm => "farm",
            BuildingKind::FarmField => "farm_field",
            BuildingKind::FishermanHut => "fisherman_hut",
            BuildingKind::Warehouse => "warehouse",
            BuildingKind::Tower => "tower",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::PLACEABLE
            .into_iter()
            .chain(std::iter::once(BuildingKind::FarmField))
            .find(|k| k.key() == key)
    }

    /// Production parameters, for the four gathering kinds
    pub fn production_profile(&self) -> Option<ProductionProfile> {
        let (resource, terrain, specialist) = match self {
            BuildingKind::Lumberyard => (ResourceKind::Wood, Some(TileType::Forest), Profession::Forester),
            BuildingKind::Quarry => (ResourceKind::Stone, Some(TileType::Mountain), Profession::Miner),
            BuildingKind::FishermanHut => (ResourceKind::Fish, Some(TileType::Water), Profession::Fisherman),
            BuildingKind::Farm => (ResourceKind::Wheat, None, Profession::Farmer),
            _ => return None,
        };
        Some(ProductionProfile {
            resource,
            terrain,
            specialist,
        })
    }

    pub fn is_production(&self) -> bool {
        self.production_profile().is_some()
    }

    /// Terrain that must border the footprint for placement to be allowed
    pub fn required_adjacent_tile(&self) -> Option<TileType> {
        self.production_profile().and_then(|p| p.terrain)
    }
}

/// What a gathering building produces and who works it best
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductionProfile {
    pub resource: ResourceKind,
    /// Terrain of the target tile and of placement adjacency; `None` for
    /// the farm, which works its own fields instead
    pub terrain: Option<TileType>,
    pub specialist: Profession,
}

impl ProductionProfile {
    pub fn accepts(&self, worker: WorkerKind) -> bool {
        match worker {
            WorkerKind::Villager => true,
            WorkerKind::Specialist(p) => p == self.specialist,
        }
    }
}

/// Monotonic identity of a placed building
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuildingId(pub u64);

/// Serializable reference to a building: its root cell plus identity, so a
/// stale reference never resolves to a newer building on the same cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildingRef {
    pub root: CellCoord,
    pub id: BuildingId,
}

/// Identity and footprint, present on every building entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: BuildingId,
    pub kind: BuildingKind,
    pub footprint: Footprint,
    pub under_construction: bool,
}

impl Building {
    pub fn root(&self) -> CellCoord {
        self.footprint.origin
    }

    pub fn reference(&self) -> BuildingRef {
        BuildingRef {
            root: self.footprint.origin,
            id: self.id,
        }
    }
}

/// Employed counters of a house, one per worker kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employment {
    pub villager: u32,
    pub professions: ProfessionCounts,
}

impl Employment {
    pub fn get(&self, kind: WorkerKind) -> u32 {
        match kind {
            WorkerKind::Villager => self.villager,
            WorkerKind::Specialist(p) => self.professions.get(p),
        }
    }

    pub fn get_mut(&mut self, kind: WorkerKind) -> &mut u32 {
        match kind {
            WorkerKind::Villager => &mut self.villager,
            WorkerKind::Specialist(p) => self.professions.get_mut(p),
        }
    }
}

/// Residents of a house
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct House {
    pub capacity: u32,
    /// Residents living here; training changes roles, not headcount
    pub occupants: u32,
    /// Newcomers walking here with a reserved bed
    pub incoming: u32,
    /// Untrained residents
    pub villagers: u32,
    pub professions: ProfessionCounts,
    pub employed: Employment,
}

impl House {
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    /// Residents of this kind living here
    pub fn residents(&self, kind: WorkerKind) -> u32 {
        match kind {
            WorkerKind::Villager => self.villagers,
            WorkerKind::Specialist(p) => self.professions.get(p),
        }
    }

    /// Residents of this kind not currently working elsewhere
    pub fn available(&self, kind: WorkerKind) -> u32 {
        self.residents(kind).saturating_sub(self.employed.get(kind))
    }

    pub fn has_room(&self) -> bool {
        self.occupants + self.incoming < self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.occupants >= self.capacity
    }

    /// Give back an employed slot, floored at zero
    pub fn release(&mut self, kind: WorkerKind) {
        let slot = self.employed.get_mut(kind);
        *slot = slot.saturating_sub(1);
    }
}

/// Shared-capacity store for all raw resources
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Warehouse {
    pub capacity: f64,
    pub storage: Stock,
}

impl Warehouse {
    pub fn new(capacity: f64) -> Self {
        Self {
            capacity,
            storage: Stock::default(),
        }
    }
}

/// A villager being trained into a specialist
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Training {
    pub profession: Profession,
    /// House the trainee came from and returns to
    pub home: BuildingRef,
    pub started_ms: u64,
    pub completes_ms: u64,
}

impl Training {
    pub fn progress_percent(&self, now_ms: u64) -> f32 {
        let span = self.completes_ms.saturating_sub(self.started_ms);
        if span == 0 {
            return 100.0;
        }
        let elapsed = now_ms.saturating_sub(self.started_ms);
        ((elapsed as f64 / span as f64) * 100.0).min(100.0) as f32
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingCenter {
    pub in_training: Vec<Training>,
}

impl TrainingCenter {
    pub fn is_training(&self, profession: Profession) -> bool {
        self.in_training.iter().any(|t| t.profession == profession)
    }
}

/// Defensive tower stats, read by the combat layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tower {
    pub last_shot_ms: u64,
    pub cooldown_ms: u64,
    pub range: f32,
    pub damage: f32,
}

/// Marker for a 1x1 field worked by a farm
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FarmField {
    pub farm: BuildingRef,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_house_availability() {
        let mut house = House::new(4);
        house.villagers = 3;
        house.employed.villager = 1;
        house.professions.miner = 1;
        assert_eq!(house.available(WorkerKind::Villager), 2);
        assert_eq!(house.available(WorkerKind::Specialist(Profession::Miner)), 1);
        assert_eq!(house.available(WorkerKind::Specialist(Profession::Farmer)), 0);

        house.release(WorkerKind::Specialist(Profession::Farmer));
        assert_eq!(house.employed.professions.farmer, 0);
    }

    #[test]
    fn test_profiles() {
        let lumber = BuildingKind::Lumberyard.production_profile().unwrap();
        assert_eq!(lumber.resource, ResourceKind::Wood);
        assert_eq!(lumber.terrain, Some(TileType::Forest));
        assert!(lumber.accepts(WorkerKind::Villager));
        assert!(lumber.accepts(WorkerKind::Specialist(Profession::Forester)));
        assert!(!lumber.accepts(WorkerKind::Specialist(Profession::Miner)));

        assert_eq!(BuildingKind::Farm.required_adjacent_tile(), None);
        assert!(BuildingKind::Warehouse.production_profile().is_none());
    }

    #[test]
    fn test_kind_keys() {
        for kind in BuildingKind::PLACEABLE {
            assert_eq!(BuildingKind::from_key(kind.key()), Some(kind));
        }
        assert_eq!(BuildingKind::from_key("farm_field"), Some(BuildingKind::FarmField));
    }

    #[test]
    fn test_training_progress() {
        let t = Training {
            profession: Profession::Miner,
            home: BuildingRef {
                root: CellCoord::new(0, 0),
                id: BuildingId(1),
            },
            started_ms: 1000,
            completes_ms: 6000,
        };
        assert_eq!(t.progress_percent(1000), 0.0);
        assert_eq!(t.progress_percent(3500), 50.0);
        assert_eq!(t.progress_percent(9000), 100.0);
    }
}
