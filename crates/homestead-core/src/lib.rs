//! Homestead Core - Settlement Economy Simulation Engine
//!
//! A grid-based city-building economy: houses supply villagers, gathering
//! buildings turn worker time into wood, stone, wheat and fish, and batched
//! deliveries move the goods into shared-capacity warehouses.
//!
//! # Architecture
//!
//! Buildings are entities in a `hecs` world; the grid is an arena of cells
//! that reference the entity covering them and the root cell owning its
//! state:
//! - **Components**: pure data (House, Production, Warehouse, ...)
//! - **Systems**: free functions over the `Settlement` context
//! - **Scheduler**: deterministic logical-time event queue for every
//!   periodic tick and delayed completion
//!
//! | Module        | Responsibility                                     |
//! |---------------|----------------------------------------------------|
//! | `components`  | grid, buildings, resources, production state       |
//! | `systems`     | placement, workforce, production, delivery, ...    |
//! | `scheduler`   | timers and simulation events                       |
//! | `engine`      | `SimulationEngine`: clock, dispatch, public API    |
//! | `payload`     | click payload snapshots for the UI                 |
//! | `persistence` | terrain JSON snapshots and binary full saves       |
//! | `config`      | balance constants, JSON loading, validation        |
//! | `generation`  | seeded terrain generation                          |
//!
//! # Example
//!
//! ```rust,no_run
//! use homestead_core::prelude::*;
//!
//! let mut engine = SimulationEngine::default();
//! engine.place_building(BuildingKind::House, CellCoord::new(10, 10));
//!
//! // Run one simulated minute in 100 ms steps
//! for _ in 0..600 {
//!     engine.update(100);
//! }
//! println!("population: {}", engine.population().population);
//! ```

pub mod components;
pub mod config;
pub mod engine;
pub mod generation;
pub mod payload;
pub mod persistence;
pub mod scheduler;
pub mod settlement;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::SimConfig;
    pub use crate::engine::SimulationEngine;
    pub use crate::payload::ClickPayload;
    pub use crate::systems::{PlacementBlocker, PopulationSummary};
}
