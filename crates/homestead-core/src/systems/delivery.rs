//! Delivery protocol - batched transport from producers into warehouses
//!
//! A delivery reserves one quantum of the producer's undelivered stock and
//! completes after a fixed transit time. The warehouse accepts what fits;
//! the producer is debited only by what was stored and the rest is lost.

use hecs::Entity;

use crate::components::{Building, BuildingKind, BuildingRef, CellCoord, Production, ResourceKind, Warehouse};
use crate::scheduler::SimEvent;
use crate::settlement::Settlement;

use super::warehouse;

/// Point the producer covering `at` at the warehouse covering `target`,
/// replacing any earlier assignment
pub fn assign_warehouse(s: &mut Settlement, at: CellCoord, target: CellCoord) -> bool {
    let Some((entity, _)) = s.production_at(at) else {
        return false;
    };
    let Some((_, wh)) = s.usable_building_at(target, BuildingKind::Warehouse) else {
        return false;
    };
    let quantum = s.config.production.delivery_quantum;
    let ready = match s.world.get::<&mut Production>(entity) {
        Ok(mut p) => {
            p.assigned_warehouse = Some(wh.root());
            p.available_to_deliver >= quantum
        }
        Err(_) => return false,
    };
    if ready {
        deliver_from(s, entity);
    }
    true
}

/// Start a delivery from the producer covering `at` if one is possible
pub fn deliver_if_ready(s: &mut Settlement, at: CellCoord) -> bool {
    match s.production_at(at) {
        Some((entity, _)) => deliver_from(s, entity),
        None => false,
    }
}

/// Reserve a quantum and schedule its arrival. Requires an assigned,
/// completed, non-full warehouse and at least one whole quantum of stock
/// not already in transit.
pub fn deliver_from(s: &mut Settlement, entity: Entity) -> bool {
    let Some(building) = s.world.get::<&Building>(entity).ok().map(|b| *b) else {
        return false;
    };
    let Some(profile) = building.kind.production_profile() else {
        return false;
    };
    let Some(target) = s
        .world
        .get::<&Production>(entity)
        .ok()
        .and_then(|p| p.assigned_warehouse)
    else {
        return false;
    };
    let Some((wh_entity, wh)) = s
        .usable_root(target, BuildingKind::Warehouse)
        .and_then(|e| s.building_at(target).map(|(_, b)| (e, b)))
    else {
        return false;
    };
    let full = s
        .world
        .get::<&Warehouse>(wh_entity)
        .map(|w| warehouse::is_full(&w))
        .unwrap_or(true);
    if full {
        return false;
    }

    let quantum = s.config.production.delivery_quantum;
    let amount = {
        let Ok(mut p) = s.world.get::<&mut Production>(entity) else {
            return false;
        };
        let unreserved = p.unreserved();
        if unreserved.floor() < quantum {
            return false;
        }
        let amount = unreserved.min(quantum);
        p.incoming_delivery += amount;
        amount
    };

    s.scheduler.schedule_once(
        s.config.production.delivery_transit_ms,
        SimEvent::DeliveryArrival {
            producer: building.reference(),
            warehouse: wh.reference(),
            resource: profile.resource,
            amount,
        },
    );
    log::trace!(
        "{:?} at {} sent {} {:?} to warehouse at {}",
        building.kind,
        building.root(),
        amount,
        profile.resource,
        wh.root()
    );
    true
}

/// Transit finished: store what fits, debit the producer by what was stored
/// and release the whole reservation. Returns the stored amount.
pub fn complete_delivery(
    s: &mut Settlement,
    producer: BuildingRef,
    warehouse_ref: BuildingRef,
    resource: ResourceKind,
    reserved: f64,
) -> f64 {
    let stored = match s.resolve(warehouse_ref) {
        Some((entity, b)) if b.kind == BuildingKind::Warehouse => s
            .world
            .get::<&mut Warehouse>(entity)
            .map(|mut w| warehouse::store(&mut w, resource, reserved))
            .unwrap_or(0.0),
        _ => 0.0,
    };

    if let Some((entity, _)) = s.resolve(producer) {
        if let Ok(mut p) = s.world.get::<&mut Production>(entity) {
            p.available_to_deliver = (p.available_to_deliver - stored).max(0.0);
            p.incoming_delivery = (p.incoming_delivery - reserved).max(0.0);
        }
    }

    if stored < reserved {
        log::debug!(
            "Delivery to {} lost {} {:?}",
            warehouse_ref.root,
            reserved - stored,
            resource
        );
    }
    stored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::TileType;
    use crate::config::SimConfig;
    use crate::systems::lifecycle::place_building;

    fn setup() -> (Settlement, CellCoord, CellCoord) {
        let mut s = Settlement::new(SimConfig {
            starting_gold: 1000.0,
            ..Default::default()
        });
        s.grid.set_tile(CellCoord::new(4, 2), TileType::Forest);
        let yard = CellCoord::new(2, 2);
        let wh = CellCoord::new(10, 10);
        assert!(place_building(&mut s, BuildingKind::Lumberyard, yard));
        assert!(place_building(&mut s, BuildingKind::Warehouse, wh));
        (s, yard, wh)
    }

    fn production(s: &Settlement, at: CellCoord) -> Production {
        let (e, _) = s.building_at(at).unwrap();
        Production::clone(&s.world.get::<&Production>(e).unwrap())
    }

    #[test]
    fn test_no_warehouse_no_delivery() {
        let (mut s, yard, _) = setup();
        let (e, _) = s.building_at(yard).unwrap();
        s.world.get::<&mut Production>(e).unwrap().available_to_deliver = 10.0;
        assert!(!deliver_if_ready(&mut s, yard));
    }

    #[test]
    fn test_assign_rejects_non_warehouse() {
        let (mut s, yard, _) = setup();
        assert!(!assign_warehouse(&mut s, yard, CellCoord::new(30, 30)));
        assert!(!assign_warehouse(&mut s, yard, yard));
    }

    #[test]
    fn test_reservation_not_doubled() {
        let (mut s, yard, wh) = setup();
        let (e, _) = s.building_at(yard).unwrap();
        s.world.get::<&mut Production>(e).unwrap().available_to_deliver = 6.0;

        // any warehouse cell resolves to its root
        assert!(assign_warehouse(&mut s, yard, wh.offset(2, 2)));
        assert_eq!(production(&s, yard).assigned_warehouse, Some(wh));
        assert_eq!(production(&s, yard).incoming_delivery, 4.0);

        // only 2 unreserved left
        assert!(!deliver_if_ready(&mut s, yard));
    }

    #[test]
    fn test_delivery_to_vanished_warehouse_is_lost() {
        let (mut s, yard, _) = setup();
        let (e, b) = s.building_at(yard).unwrap();
        {
            let mut p = s.world.get::<&mut Production>(e).unwrap();
            p.available_to_deliver = 8.0;
            p.incoming_delivery = 4.0;
        }
        let gone = BuildingRef {
            root: CellCoord::new(30, 30),
            id: crate::components::BuildingId(999),
        };
        let stored = complete_delivery(&mut s, b.reference(), gone, ResourceKind::Wood, 4.0);
        assert_eq!(stored, 0.0);
        let p = production(&s, yard);
        assert_eq!(p.available_to_deliver, 8.0);
        assert_eq!(p.incoming_delivery, 0.0);
    }
}
