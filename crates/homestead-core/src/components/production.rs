//! Production state shared by lumberyards, quarries, farms and fisherman huts.

use serde::{Deserialize, Serialize};

use super::common::CellCoord;
use super::resources::WorkerKind;
use crate::scheduler::TimerId;

/// A worker on loan from a house
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRef {
    pub kind: WorkerKind,
    /// Root of the house that supplied the worker
    pub home: CellCoord,
}

/// What a gathering building works on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GatherTarget {
    /// A terrain tile within radius (lumberyard, quarry, fisherman hut)
    Tile(Option<CellCoord>),
    /// Field cells below the farm
    Fields(Vec<CellCoord>),
}

/// Production component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Production {
    /// Stack of assigned workers; the last one is released first
    pub workers: Vec<WorkerRef>,
    pub target: GatherTarget,
    /// Present while the building is producing
    pub timer: Option<TimerId>,
    /// Lifetime output
    pub gathered_total: f64,
    /// Produced but not yet delivered
    pub available_to_deliver: f64,
    pub assigned_warehouse: Option<CellCoord>,
    /// Reserved by deliveries in transit
    pub incoming_delivery: f64,
}

impl Production {
    pub fn with_target_tile() -> Self {
        Self::new(GatherTarget::Tile(None))
    }

    pub fn with_fields() -> Self {
        Self::new(GatherTarget::Fields(Vec::new()))
    }

    fn new(target: GatherTarget) -> Self {
        Self {
            workers: Vec::new(),
            target,
            timer: None,
            gathered_total: 0.0,
            available_to_deliver: 0.0,
            assigned_warehouse: None,
            incoming_delivery: 0.0,
        }
    }

    pub fn target_tile(&self) -> Option<CellCoord> {
        match &self.target {
            GatherTarget::Tile(tile) => *tile,
            GatherTarget::Fields(_) => None,
        }
    }

    pub fn fields(&self) -> &[CellCoord] {
        match &self.target {
            GatherTarget::Fields(fields) => fields,
            GatherTarget::Tile(_) => &[],
        }
    }

    pub fn is_producing(&self) -> bool {
        self.timer.is_some()
    }

    /// Stock not yet claimed by a delivery in transit
    pub fn unreserved(&self) -> f64 {
        (self.available_to_deliver - self.incoming_delivery).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_accessors() {
        let mut lumber = Production::with_target_tile();
        assert_eq!(lumber.target_tile(), None);
        lumber.target = GatherTarget::Tile(Some(CellCoord::new(4, 4)));
        assert_eq!(lumber.target_tile(), Some(CellCoord::new(4, 4)));
        assert!(lumber.fields().is_empty());

        let farm = Production::with_fields();
        assert_eq!(farm.target_tile(), None);
        assert!(farm.fields().is_empty());
    }

    #[test]
    fn test_unreserved() {
        let mut p = Production::with_target_tile();
        p.available_to_deliver = 10.0;
        p.incoming_delivery = 4.0;
        assert_eq!(p.unreserved(), 6.0);
    }
}
