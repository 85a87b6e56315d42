//! Save/Load functionality for persisting simulation state
//!
//! Two formats:
//! - terrain snapshots, a JSON array of rows of tile names, exchanged with
//!   the outer save layer
//! - full saves, bincode of the whole settlement including pending timers,
//!   so a loaded settlement resumes exactly where it stopped
//!
//! Components are serialized per building then reattached on load; grid cell
//! references are rebuilt from each building's footprint.

use hecs::World;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::components::*;
use crate::config::{ConfigError, SimConfig};
use crate::scheduler::{Scheduler, SchedulerSnapshot};
use crate::settlement::Settlement;
use crate::systems::Census;

/// Version number for save file format (increment when format changes)
const SAVE_VERSION: u32 = 1;

/// Serializable snapshot of the simulation state
#[derive(Serialize, Deserialize)]
pub struct SaveData {
    /// Save format version
    pub version: u32,
    pub config: SimConfig,
    /// Clock and pending timers
    pub scheduler: SchedulerSnapshot,
    pub ledger: ResourceLedger,
    pub census: Census,
    pub next_building_id: u64,
    /// Terrain, row-major
    pub terrain: Vec<Vec<TileType>>,
    /// Every building with its components
    pub buildings: Vec<SerializableBuilding>,
}

/// All possible components of a building entity, serialized as optionals
#[derive(Serialize, Deserialize)]
pub struct SerializableBuilding {
    pub building: Building,
    pub house: Option<House>,
    pub training_center: Option<TrainingCenter>,
    pub warehouse: Option<Warehouse>,
    pub tower: Option<Tower>,
    pub production: Option<Production>,
    pub farm_field: Option<FarmField>,
}

/// Extract every building entity, ordered by id so saves are stable
fn serialize_buildings(world: &World) -> Vec<SerializableBuilding> {
    let mut buildings = Vec::new();

    for entity_ref in world.iter() {
        let Some(building) = entity_ref.get::<&Building>().map(|b| *b) else {
            continue;
        };
        buildings.push(SerializableBuilding {
            building,
            house: entity_ref.get::<&House>().map(|c| (*c).clone()),
            training_center: entity_ref.get::<&TrainingCenter>().map(|c| (*c).clone()),
            warehouse: entity_ref.get::<&Warehouse>().map(|c| (*c).clone()),
            tower: entity_ref.get::<&Tower>().map(|c| (*c).clone()),
            production: entity_ref.get::<&Production>().map(|c| (*c).clone()),
            farm_field: entity_ref.get::<&FarmField>().map(|c| *c),
        });
    }

    buildings.sort_by_key(|b| b.building.id);
    buildings
}

/// Spawn a building with all its components and mark its cells
fn spawn_building(settlement: &mut Settlement, sb: SerializableBuilding) {
    let world = &mut settlement.world;
    let entity = world.spawn((sb.building,));

    if let Some(c) = sb.house {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = sb.training_center {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = sb.warehouse {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = sb.tower {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = sb.production {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = sb.farm_field {
        let _ = world.insert_one(entity, c);
    }

    let b = sb.building;
    settlement
        .grid
        .occupy(&b.footprint, entity, b.kind, b.under_construction);
}

/// Save the complete settlement to a writer
pub fn save_simulation<W: Write>(writer: W, settlement: &Settlement) -> Result<(), SaveError> {
    let save_data = SaveData {
        version: SAVE_VERSION,
        config: settlement.config.clone(),
        scheduler: settlement.scheduler.snapshot(),
        ledger: settlement.ledger.clone(),
        census: settlement.census,
        next_building_id: settlement.next_building_id(),
        terrain: settlement.grid.tile_rows(),
        buildings: serialize_buildings(&settlement.world),
    };

    bincode::serialize_into(writer, &save_data)?;
    Ok(())
}

/// Load a settlement from a reader
pub fn load_simulation<R: Read>(reader: R) -> Result<Settlement, SaveError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;

    if save_data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save_data.version,
        });
    }
    save_data.config.validate()?;

    let mut settlement = Settlement::new(save_data.config);
    settlement.grid.load_tile_rows(&save_data.terrain);
    settlement.ledger = save_data.ledger;
    settlement.census = save_data.census;
    settlement.scheduler = Scheduler::restore(save_data.scheduler);
    settlement.set_next_building_id(save_data.next_building_id);
    for sb in save_data.buildings {
        spawn_building(&mut settlement, sb);
    }

    log::debug!(
        "Loaded settlement at {} ms with {} buildings",
        settlement.now_ms(),
        settlement.world.len()
    );
    Ok(settlement)
}

/// Terrain as a JSON array of rows of tile names
pub fn export_terrain_json(grid: &Grid) -> Result<String, SaveError> {
    Ok(serde_json::to_string(&grid.tile_rows())?)
}

/// Overwrite terrain from a JSON snapshot. Rows or columns beyond the grid
/// are ignored; cells the snapshot does not cover keep their tile. Returns
/// the number of cells written.
pub fn import_terrain_json(grid: &mut Grid, json: &str) -> Result<usize, SaveError> {
    let rows: Vec<Vec<TileType>> = serde_json::from_str(json)?;
    Ok(grid.load_tile_rows(&rows))
}

/// Errors that can occur during save/load
#[derive(Debug)]
pub enum SaveError {
    Io(std::io::Error),
    Bincode(Box<bincode::ErrorKind>),
    Json(serde_json::Error),
    Config(ConfigError),
    VersionMismatch { expected: u32, found: u32 },
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for SaveError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        SaveError::Bincode(e)
    }
}

impl From<serde_json::Error> for SaveError {
    fn from(e: serde_json::Error) -> Self {
        SaveError::Json(e)
    }
}

impl From<ConfigError> for SaveError {
    fn from(e: ConfigError) -> Self {
        SaveError::Config(e)
    }
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "IO error: {}", e),
            SaveError::Bincode(e) => write!(f, "Serialization error: {}", e),
            SaveError::Json(e) => write!(f, "Terrain snapshot error: {}", e),
            SaveError::Config(e) => write!(f, "Saved config rejected: {}", e),
            SaveError::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Save version mismatch: expected {}, found {}",
                    expected, found
                )
            }
        }
    }
}

impl std::error::Error for SaveError {}
