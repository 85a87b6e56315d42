//! Resource kinds, professions and the global ledger.

use serde::{Deserialize, Serialize};

/// Raw resources produced by gathering buildings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Wood,
    Stone,
    Wheat,
    Fish,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Wood,
        ResourceKind::Stone,
        ResourceKind::Wheat,
        ResourceKind::Fish,
    ];
}

/// Amount of each raw resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    pub wood: f64,
    pub stone: f64,
    pub wheat: f64,
    pub fish: f64,
}

impl Stock {
    pub fn get(&self, kind: ResourceKind) -> f64 {
        match kind {
            ResourceKind::Wood => self.wood,
            ResourceKind::Stone => self.stone,
            ResourceKind::Wheat => self.wheat,
            ResourceKind::Fish => self.fish,
        }
    }

    pub fn get_mut(&mut self, kind: ResourceKind) -> &mut f64 {
        match kind {
            ResourceKind::Wood => &mut self.wood,
            ResourceKind::Stone => &mut self.stone,
            ResourceKind::Wheat => &mut self.wheat,
            ResourceKind::Fish => &mut self.fish,
        }
    }

    pub fn total(&self) -> f64 {
        self.wood + self.stone + self.wheat + self.fish
    }

    pub fn add(&mut self, kind: ResourceKind, amount: f64) {
        *self.get_mut(kind) += amount;
    }

    /// Subtract, never going below zero
    pub fn remove_floored(&mut self, kind: ResourceKind, amount: f64) {
        let value = self.get_mut(kind);
        *value = (*value - amount).max(0.0);
    }
}

/// Process-wide gold and raw resource counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceLedger {
    /// May go negative when an outside actor charges more than is held
    pub gold: f64,
    pub resources: Stock,
}

impl ResourceLedger {
    pub fn new(starting_gold: f64) -> Self {
        Self {
            gold: starting_gold,
            resources: Stock::default(),
        }
    }

    pub fn can_afford(&self, cost: f64) -> bool {
        self.gold >= cost
    }

    pub fn amount(&self, kind: ResourceKind) -> f64 {
        self.resources.get(kind)
    }
}

/// Trained specialist professions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profession {
    Farmer,
    Forester,
    Miner,
    Fisherman,
}

impl Profession {
    pub const ALL: [Profession; 4] = [
        Profession::Farmer,
        Profession::Forester,
        Profession::Miner,
        Profession::Fisherman,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Profession::Farmer => "farmer",
            Profession::Forester => "forester",
            Profession::Miner => "miner",
            Profession::Fisherman => "fisherman",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.key() == key)
    }
}

/// Per-profession counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfessionCounts {
    pub farmer: u32,
    pub forester: u32,
    pub miner: u32,
    pub fisherman: u32,
}

impl ProfessionCounts {
    pub fn get(&self, profession: Profession) -> u32 {
        match profession {
            Profession::Farmer => self.farmer,
            Profession::Forester => self.forester,
            Profession::Miner => self.miner,
            Profession::Fisherman => self.fisherman,
        }
    }

    pub fn get_mut(&mut self, profession: Profession) -> &mut u32 {
        match profession {
            Profession::Farmer => &mut self.farmer,
            Profession::Forester => &mut self.forester,
            Profession::Miner => &mut self.miner,
            Profession::Fisherman => &mut self.fisherman,
        }
    }

    pub fn total(&self) -> u32 {
        self.farmer + self.forester + self.miner + self.fisherman
    }
}

/// Kind of worker a production building asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerKind {
    Villager,
    Specialist(Profession),
}

impl WorkerKind {
    pub fn key(&self) -> &'static str {
        match self {
            WorkerKind::Villager => "villager",
            WorkerKind::Specialist(p) => p.key(),
        }
    }

    /// Parse "villager" or a profession key
    pub fn from_key(key: &str) -> Option<Self> {
        if key == "villager" {
            Some(WorkerKind::Villager)
        } else {
            Profession::from_key(key).map(WorkerKind::Specialist)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_floor() {
        let mut stock = Stock::default();
        stock.add(ResourceKind::Wood, 3.0);
        stock.remove_floored(ResourceKind::Wood, 5.0);
        assert_eq!(stock.wood, 0.0);
        assert_eq!(stock.total(), 0.0);
    }

    #[test]
    fn test_worker_kind_keys() {
        assert_eq!(WorkerKind::from_key("villager"), Some(WorkerKind::Villager));
        assert_eq!(
            WorkerKind::from_key("miner"),
            Some(WorkerKind::Specialist(Profession::Miner))
        );
        assert_eq!(WorkerKind::from_key("wizard"), None);
        assert_eq!(WorkerKind::Specialist(Profession::Fisherman).key(), "fisherman");
    }
}
