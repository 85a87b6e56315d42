//! Component definitions for the settlement simulation.
//!
//! Components are pure data. Building state is attached to ECS entities and
//! referenced from the grid cells the building covers; behaviour lives in
//! systems.

mod buildings;
mod common;
mod production;
mod resources;
mod terrain;

pub use buildings::*;
pub use common::*;
pub use production::*;
pub use resources::*;
pub use terrain::*;
