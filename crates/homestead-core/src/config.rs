//! Simulation balance and layout configuration.
//!
//! Every tunable constant of the economy lives here instead of as a literal in
//! the systems. `SimConfig::default()` reproduces the stock game balance;
//! partial JSON files only override the fields they name.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::components::BuildingKind;

/// Undelivered stock a producer may hold, measured in delivery batches.
pub const CAP_TO_QUANTUM_RATIO: f64 = 5.0;

/// One value per building kind (costs, construction times, ...)
///
/// Overriding a table in JSON requires all nine entries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerKind<T> {
    pub house: T,
    pub training_center: T,
    pub lumberyard: T,
    pub quarry: T,
    pub farm: T,
    pub farm_field: T,
    pub fisherman_hut: T,
    pub warehouse: T,
    pub tower: T,
}

impl<T: Copy> PerKind<T> {
    pub fn uniform(value: T) -> Self {
        Self {
            house: value,
            training_center: value,
            lumberyard: value,
            quarry: value,
            farm: value,
            farm_field: value,
            fisherman_hut: value,
            warehouse: value,
            tower: value,
        }
    }

    pub fn get(&self, kind: BuildingKind) -> T {
        match kind {
            BuildingKind::House => self.house,
            BuildingKind::TrainingCenter => self.training_center,
            BuildingKind::Lumberyard => self.lumberyard,
            BuildingKind::Quarry => self.quarry,
            BuildingKind::Farm => self.farm,
            BuildingKind::FarmField => self.farm_field,
            BuildingKind::FishermanHut => self.fisherman_hut,
            BuildingKind::Warehouse => self.warehouse,
            BuildingKind::Tower => self.tower,
        }
    }
}

impl Default for PerKind<f64> {
    /// Gold cost of each building
    fn default() -> Self {
        Self {
            house: 10.0,
            training_center: 25.0,
            lumberyard: 30.0,
            quarry: 30.0,
            farm: 30.0,
            farm_field: 0.0,
            fisherman_hut: 30.0,
            warehouse: 40.0,
            tower: 50.0,
        }
    }
}

impl Default for PerKind<u64> {
    /// Construction time in milliseconds; zero means the building is usable
    /// immediately
    fn default() -> Self {
        Self::uniform(0)
    }
}

/// Production and delivery balance shared by all gathering buildings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductionConfig {
    /// Fixed tick interval of a producing building
    pub interval_ms: u64,
    /// Units produced per tick at 100% efficiency
    pub output_per_full_efficiency: f64,
    /// Efficiency percent added by a generic villager
    pub villager_contribution: u32,
    /// Efficiency percent added by a matching specialist
    pub specialist_contribution: u32,
    pub max_efficiency: u32,
    pub max_workers: usize,
    /// Undelivered stock at which production stalls
    pub availability_cap: f64,
    /// Units moved per delivery trip
    pub delivery_quantum: f64,
    pub delivery_transit_ms: u64,
    /// Target tile radius in cells
    pub gather_radius: i32,
    pub fields_per_farm: usize,
}

impl Default for ProductionConfig {
    fn default() -> Self {
        Self {
            interval_ms: 20_000,
            output_per_full_efficiency: 1.0,
            villager_contribution: 15,
            specialist_contribution: 50,
            max_efficiency: 100,
            max_workers: 2,
            availability_cap: 20.0,
            delivery_quantum: 4.0,
            delivery_transit_ms: 4_500,
            gather_radius: 3,
            fields_per_farm: 2,
        }
    }
}

/// Static tower stats (combat lives outside this crate)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TowerConfig {
    pub cooldown_ms: u64,
    pub range: f32,
    pub damage: f32,
}

impl Default for TowerConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 900,
            range: 120.0,
            damage: 25.0,
        }
    }
}

/// Top-level simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub grid_width: i32,
    pub grid_height: i32,
    /// Pixel size of one cell, used by `world_to_cell`
    pub tile_size: f32,
    pub starting_gold: f64,
    pub house_capacity: u32,
    /// Residents (moved in or walking) at which arrivals stop
    pub population_cap: u32,
    pub warehouse_capacity: f64,
    pub villager_arrival_ms: u64,
    /// Time a newcomer spends walking to the house that reserved a bed
    pub villager_walk_ms: u64,
    pub gold_payout_ms: u64,
    pub villager_income: f64,
    pub professional_income: f64,
    pub training_ms: u64,
    pub production: ProductionConfig,
    pub tower: TowerConfig,
    pub costs: PerKind<f64>,
    pub construction_ms: PerKind<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            grid_width: 42,
            grid_height: 42,
            tile_size: 24.0,
            starting_gold: 100.0,
            house_capacity: 4,
            population_cap: 16,
            warehouse_capacity: 100.0,
            villager_arrival_ms: 6_000,
            villager_walk_ms: 2_000,
            gold_payout_ms: 10_000,
            villager_income: 0.4,
            professional_income: 0.6,
            training_ms: 5_000,
            production: ProductionConfig::default(),
            tower: TowerConfig::default(),
            costs: PerKind::<f64>::default(),
            construction_ms: PerKind::<u64>::default(),
        }
    }
}

impl SimConfig {
    /// Parse a (possibly partial) JSON configuration and validate it
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn cost(&self, kind: BuildingKind) -> f64 {
        self.costs.get(kind)
    }

    /// Check the relationships the balance depends on
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.production;
        if self.grid_width <= 0 || self.grid_height <= 0 {
            return Err(ConfigError::Invalid(format!(
                "grid must be non-empty, got {}x{}",
                self.grid_width, self.grid_height
            )));
        }
        if self.tile_size <= 0.0 {
            return Err(ConfigError::Invalid("tile_size must be positive".into()));
        }
        if p.interval_ms == 0 || self.villager_arrival_ms == 0 || self.gold_payout_ms == 0 {
            return Err(ConfigError::Invalid(
                "periodic intervals must be non-zero".into(),
            ));
        }
        if p.max_workers == 0 {
            return Err(ConfigError::Invalid("max_workers must be at least 1".into()));
        }
        if p.delivery_quantum <= 0.0 {
            return Err(ConfigError::Invalid(
                "delivery_quantum must be positive".into(),
            ));
        }
        let ratio = p.availability_cap / p.delivery_quantum;
        if (ratio - CAP_TO_QUANTUM_RATIO).abs() > 1e-9 {
            return Err(ConfigError::Invalid(format!(
                "availability_cap must be {} x delivery_quantum (cap {}, quantum {})",
                CAP_TO_QUANTUM_RATIO, p.availability_cap, p.delivery_quantum
            )));
        }
        if self.warehouse_capacity < p.delivery_quantum {
            return Err(ConfigError::Invalid(
                "warehouse_capacity must hold at least one delivery".into(),
            ));
        }
        if self.house_capacity == 0 {
            return Err(ConfigError::Invalid("house_capacity must be positive".into()));
        }
        Ok(())
    }
}

/// Errors raised while loading a configuration
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Invalid(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Json(e) => write!(f, "Config parse error: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.production.availability_cap,
            config.production.delivery_quantum * CAP_TO_QUANTUM_RATIO
        );
    }

    #[test]
    fn test_partial_json_overrides() {
        let config = SimConfig::from_json_str(
            r#"{ "starting_gold": 500, "production": { "interval_ms": 1000 } }"#,
        )
        .expect("partial config should parse");
        assert_eq!(config.starting_gold, 500.0);
        assert_eq!(config.production.interval_ms, 1000);
        assert_eq!(config.production.delivery_quantum, 4.0);
        assert_eq!(config.cost(BuildingKind::Warehouse), 40.0);
    }

    #[test]
    fn test_broken_ratio_rejected() {
        let result = SimConfig::from_json_str(
            r#"{ "production": { "availability_cap": 30 } }"#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_malformed_json() {
        let result = SimConfig::from_json_str("{ not json");
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }
}
