//! Warehouse storage - one shared capacity pool for all raw resources

use serde::Serialize;

use crate::components::{BuildingKind, CellCoord, Production, ResourceKind, Warehouse};
use crate::settlement::Settlement;

/// Sum of every resource kind held
pub fn used(warehouse: &Warehouse) -> f64 {
    warehouse.storage.total()
}

pub fn free(warehouse: &Warehouse) -> f64 {
    (warehouse.capacity - used(warehouse)).max(0.0)
}

pub fn can_store(warehouse: &Warehouse, amount: f64) -> bool {
    used(warehouse) + amount <= warehouse.capacity
}

pub fn is_full(warehouse: &Warehouse) -> bool {
    used(warehouse) >= warehouse.capacity
}

/// Insert as much of `amount` as fits. Returns the amount actually stored.
pub fn store(warehouse: &mut Warehouse, kind: ResourceKind, amount: f64) -> f64 {
    if !amount.is_finite() {
        return 0.0;
    }
    let put = free(warehouse).min(amount);
    if put <= 0.0 {
        return 0.0;
    }
    warehouse.storage.add(kind, put);
    put
}

/// Take up to `amount` of `kind` out. Returns the amount removed.
pub fn withdraw(warehouse: &mut Warehouse, kind: ResourceKind, amount: f64) -> f64 {
    let taken = warehouse.storage.get(kind).min(amount.max(0.0));
    warehouse.storage.remove_floored(kind, taken);
    taken
}

/// Store into the warehouse covering `at`; 0 if it is not a usable warehouse
pub fn store_at(s: &mut Settlement, at: CellCoord, kind: ResourceKind, amount: f64) -> f64 {
    let Some((entity, _)) = s.usable_building_at(at, BuildingKind::Warehouse) else {
        return 0.0;
    };
    match s.world.get::<&mut Warehouse>(entity) {
        Ok(mut w) => store(&mut w, kind, amount),
        Err(_) => 0.0,
    }
}

/// Fill level of one warehouse, as polled by win-condition observers
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WarehouseUsage {
    pub root: CellCoord,
    pub used: f64,
    pub capacity: f64,
}

/// Every completed warehouse, scan order
pub fn warehouse_usage(s: &Settlement) -> Vec<WarehouseUsage> {
    s.roots_of_kind(BuildingKind::Warehouse)
        .into_iter()
        .filter(|(root, _)| s.usable_root(*root, BuildingKind::Warehouse).is_some())
        .filter_map(|(root, entity)| {
            let w = s.world.get::<&Warehouse>(entity).ok()?;
            Some(WarehouseUsage {
                root,
                used: used(&w),
                capacity: w.capacity,
            })
        })
        .collect()
}

pub fn full_warehouse_count(s: &Settlement) -> usize {
    warehouse_usage(s)
        .iter()
        .filter(|u| u.used >= u.capacity)
        .count()
}

/// Pay `amount` of `kind` out of storage, drawing from warehouses in scan
/// order. All-or-nothing: nothing is taken unless the whole amount is held.
pub fn pay_tribute(s: &mut Settlement, kind: ResourceKind, amount: f64) -> bool {
    if !amount.is_finite() || amount <= 0.0 {
        return false;
    }
    let sources: Vec<_> = s
        .roots_of_kind(BuildingKind::Warehouse)
        .into_iter()
        .filter(|(root, _)| s.usable_root(*root, BuildingKind::Warehouse).is_some())
        .collect();
    let held: f64 = sources
        .iter()
        .filter_map(|(_, e)| s.world.get::<&Warehouse>(*e).ok().map(|w| w.storage.get(kind)))
        .sum();
    if held < amount {
        return false;
    }

    let mut remaining = amount;
    for (_, entity) in sources {
        if remaining <= 0.0 {
            break;
        }
        if let Ok(mut w) = s.world.get::<&mut Warehouse>(entity) {
            remaining -= withdraw(&mut w, kind, remaining);
        }
    }
    s.ledger.resources.remove_floored(kind, amount);
    log::debug!("Paid tribute of {} {:?}", amount, kind);
    true
}

/// Drop every producer's assignment to the warehouse rooted at `root`
pub fn clear_assignments_to(s: &mut Settlement, root: CellCoord) {
    for (_, production) in s.world.query_mut::<&mut Production>() {
        if production.assigned_warehouse == Some(root) {
            production.assigned_warehouse = None;
        }
    }
}
