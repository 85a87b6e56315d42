//! Systems - logic that operates on the settlement
//!
//! Every system is a set of free functions over `&mut Settlement`. Mutators
//! return `bool` (or `Option`) for expected failures and never panic.

pub mod delivery;
pub mod income;
pub mod lifecycle;
pub mod placement;
pub mod population;
pub mod production;
pub mod warehouse;
pub mod workforce;

pub use placement::PlacementBlocker;
pub use population::{Census, PopulationSummary, WorkerTally};
pub use warehouse::WarehouseUsage;
