//! Click payloads - plain snapshots of one building for the UI layer
//!
//! Payloads serialize to JSON objects tagged with a `"type"` key naming the
//! building kind, with camelCase fields.

use serde::Serialize;

use crate::components::*;
use crate::settlement::Settlement;
use crate::systems::{income, population, production, warehouse};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClickPayload {
    House(HousePayload),
    TrainingCenter(TrainingCenterPayload),
    Lumberyard(ProductionPayload),
    Quarry(ProductionPayload),
    Farm(ProductionPayload),
    FishermanHut(ProductionPayload),
    Warehouse(WarehousePayload),
    Tower(TowerPayload),
}

impl ClickPayload {
    pub fn kind(&self) -> BuildingKind {
        match self {
            ClickPayload::House(_) => BuildingKind::House,
            ClickPayload::TrainingCenter(_) => BuildingKind::TrainingCenter,
            ClickPayload::Lumberyard(_) => BuildingKind::Lumberyard,
            ClickPayload::Quarry(_) => BuildingKind::Quarry,
            ClickPayload::Farm(_) => BuildingKind::Farm,
            ClickPayload::FishermanHut(_) => BuildingKind::FishermanHut,
            ClickPayload::Warehouse(_) => BuildingKind::Warehouse,
            ClickPayload::Tower(_) => BuildingKind::Tower,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HousePayload {
    pub occupants: u32,
    pub incoming: u32,
    pub villagers: u32,
    pub capacity: u32,
    pub profession_counts: ProfessionCounts,
    pub employed: Employment,
    pub income_per_interval: f64,
    pub income_interval_ms: u64,
    pub root_x: i32,
    pub root_y: i32,
}

/// A training button offered by a center
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingAction {
    pub key: &'static str,
    pub label: String,
    /// False while this center is already training the profession
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingView {
    pub profession: Profession,
    pub progress_percent: f32,
    pub started_ms: u64,
    pub completes_ms: u64,
    pub home: CellCoord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingCenterPayload {
    pub actions: Vec<TrainingAction>,
    pub available_villagers: u32,
    pub in_training: Vec<TrainingView>,
    pub root_x: i32,
    pub root_y: i32,
}

/// A worker as shown to the UI: `{"type": "villager", "home": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerView {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub home: CellCoord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionPayload {
    pub resource: ResourceKind,
    pub workers: Vec<WorkerView>,
    pub max_workers: usize,
    /// Percent, 0-100
    pub efficiency: u32,
    pub producing: bool,
    pub has_target: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_tile: Option<CellCoord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<CellCoord>>,
    pub gathered_total: f64,
    pub available_to_deliver: f64,
    pub incoming_delivery: f64,
    pub assigned_warehouse: Option<CellCoord>,
    pub root_x: i32,
    pub root_y: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehousePayload {
    pub capacity: f64,
    pub storage: Stock,
    pub used: f64,
    pub root_x: i32,
    pub root_y: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TowerPayload {
    pub last_shot_ms: u64,
    pub cooldown_ms: u64,
    pub range: f32,
    pub damage: f32,
    pub root_x: i32,
    pub root_y: i32,
}

/// Payload of the building covering `at`. None for empty cells, fields and
/// buildings still under construction.
pub fn click_payload(s: &Settlement, at: CellCoord) -> Option<ClickPayload> {
    let (entity, building) = s.building_at(at)?;
    if building.under_construction {
        return None;
    }
    let root = building.root();

    let payload = match building.kind {
        BuildingKind::FarmField => return None,
        BuildingKind::House => {
            let h = s.world.get::<&House>(entity).ok()?;
            ClickPayload::House(HousePayload {
                occupants: h.occupants,
                incoming: h.incoming,
                villagers: h.villagers,
                capacity: h.capacity,
                profession_counts: h.professions,
                employed: h.employed,
                income_per_interval: income::house_income(&h, &s.config),
                income_interval_ms: s.config.gold_payout_ms,
                root_x: root.x,
                root_y: root.y,
            })
        }
        BuildingKind::TrainingCenter => {
            let c = s.world.get::<&TrainingCenter>(entity).ok()?;
            let now = s.now_ms();
            ClickPayload::TrainingCenter(TrainingCenterPayload {
                actions: Profession::ALL
                    .into_iter()
                    .map(|p| TrainingAction {
                        key: p.key(),
                        label: format!("Train {}", capitalize(p.key())),
                        enabled: !c.is_training(p),
                    })
                    .collect(),
                available_villagers: population::available_villagers(s),
                in_training: c
                    .in_training
                    .iter()
                    .map(|t| TrainingView {
                        profession: t.profession,
                        progress_percent: t.progress_percent(now),
                        started_ms: t.started_ms,
                        completes_ms: t.completes_ms,
                        home: t.home.root,
                    })
                    .collect(),
                root_x: root.x,
                root_y: root.y,
            })
        }
        BuildingKind::Warehouse => {
            let w = s.world.get::<&Warehouse>(entity).ok()?;
            ClickPayload::Warehouse(WarehousePayload {
                capacity: w.capacity,
                storage: w.storage,
                used: warehouse::used(&w),
                root_x: root.x,
                root_y: root.y,
            })
        }
        BuildingKind::Tower => {
            let t = s.world.get::<&Tower>(entity).ok()?;
            ClickPayload::Tower(TowerPayload {
                last_shot_ms: t.last_shot_ms,
                cooldown_ms: t.cooldown_ms,
                range: t.range,
                damage: t.damage,
                root_x: root.x,
                root_y: root.y,
            })
        }
        kind => {
            let profile = kind.production_profile()?;
            let p = s.world.get::<&Production>(entity).ok()?;
            let body = ProductionPayload {
                resource: profile.resource,
                workers: p
                    .workers
                    .iter()
                    .map(|w| WorkerView {
                        kind: w.kind.key(),
                        home: w.home,
                    })
                    .collect(),
                max_workers: s.config.production.max_workers,
                efficiency: production::efficiency(&p.workers, &s.config.production),
                producing: p.is_producing(),
                has_target: match &p.target {
                    GatherTarget::Tile(tile) => tile.is_some(),
                    GatherTarget::Fields(f) => f.len() >= s.config.production.fields_per_farm,
                },
                target_tile: p.target_tile(),
                fields: match &p.target {
                    GatherTarget::Fields(f) => Some(f.clone()),
                    GatherTarget::Tile(_) => None,
                },
                gathered_total: p.gathered_total,
                available_to_deliver: p.available_to_deliver,
                incoming_delivery: p.incoming_delivery,
                assigned_warehouse: p.assigned_warehouse,
                root_x: root.x,
                root_y: root.y,
            };
            match kind {
                BuildingKind::Lumberyard => ClickPayload::Lumberyard(body),
                BuildingKind::Quarry => ClickPayload::Quarry(body),
                BuildingKind::Farm => ClickPayload::Farm(body),
                _ => ClickPayload::FishermanHut(body),
            }
        }
    };
    Some(payload)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::systems::lifecycle::place_building;

    #[test]
    fn test_house_payload_json() {
        let mut s = Settlement::new(SimConfig::default());
        assert!(place_building(&mut s, BuildingKind::House, CellCoord::new(2, 3)));

        let payload = click_payload(&s, CellCoord::new(3, 4)).expect("house payload");
        assert_eq!(payload.kind(), BuildingKind::House);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "house");
        assert_eq!(json["capacity"], 4);
        assert_eq!(json["rootX"], 2);
        assert_eq!(json["rootY"], 3);
    }

    #[test]
    fn test_empty_cell_has_no_payload() {
        let s = Settlement::new(SimConfig::default());
        assert!(click_payload(&s, CellCoord::new(0, 0)).is_none());
    }

    #[test]
    fn test_training_actions() {
        let mut s = Settlement::new(SimConfig::default());
        assert!(place_building(&mut s, BuildingKind::TrainingCenter, CellCoord::new(0, 0)));
        let Some(ClickPayload::TrainingCenter(center)) = click_payload(&s, CellCoord::new(0, 0)) else {
            panic!("expected training center payload");
        };
        let labels: Vec<_> = center.actions.iter().map(|a| a.label.as_str()).collect();
        assert_eq!(labels, ["Train Farmer", "Train Forester", "Train Miner", "Train Fisherman"]);
        assert_eq!(center.available_villagers, 0);
    }

    #[test]
    fn test_lumberyard_payload_worker_type_key() {
        let mut s = Settlement::new(SimConfig {
            starting_gold: 1000.0,
            ..Default::default()
        });
        s.grid.set_tile(CellCoord::new(2, 0), TileType::Forest);
        assert!(place_building(&mut s, BuildingKind::House, CellCoord::new(0, 5)));
        assert!(place_building(&mut s, BuildingKind::Lumberyard, CellCoord::new(0, 0)));
        {
            let (e, _) = s.building_at(CellCoord::new(0, 5)).unwrap();
            s.world.get::<&mut House>(e).unwrap().villagers = 1;
        }
        assert!(crate::systems::workforce::assign_worker(
            &mut s,
            CellCoord::new(0, 0),
            WorkerKind::Villager
        ));

        let payload = click_payload(&s, CellCoord::new(0, 0)).unwrap();
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "lumberyard");
        assert_eq!(json["workers"][0]["type"], "villager");
        assert_eq!(json["workers"][0]["home"]["x"], 0);
        assert_eq!(json["workers"][0]["home"]["y"], 5);
        assert_eq!(json["efficiency"], 15);
        assert_eq!(json["hasTarget"], false);
        assert!(json.get("fields").is_none());
    }
}
