//! Gold income from residents

use crate::components::{BuildingKind, House};
use crate::config::SimConfig;
use crate::settlement::Settlement;

/// Gold one house yields per payout interval
pub fn house_income(house: &House, config: &SimConfig) -> f64 {
    house.villagers as f64 * config.villager_income
        + house.professions.total() as f64 * config.professional_income
}

/// Periodic payout over every completed house. Returns the amount paid.
pub fn gold_payout(s: &mut Settlement) -> f64 {
    let income: f64 = s
        .roots_of_kind(BuildingKind::House)
        .into_iter()
        .filter(|(root, _)| s.usable_root(*root, BuildingKind::House).is_some())
        .filter_map(|(_, e)| s.world.get::<&House>(e).ok().map(|h| house_income(&h, &s.config)))
        .sum();
    s.ledger.gold += income;
    if income > 0.0 {
        log::trace!("Paid out {} gold, balance {}", income, s.ledger.gold);
    }
    income
}

/// Outside charge against the treasury (a combat breach, a quest fee).
/// The balance may go negative.
pub fn charge_gold(s: &mut Settlement, amount: f64) {
    s.ledger.gold -= amount;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_house_income() {
        let config = SimConfig::default();
        let mut house = House::new(4);
        assert_eq!(house_income(&house, &config), 0.0);
        house.villagers = 2;
        house.professions.miner = 1;
        let expected = 2.0 * 0.4 + 0.6;
        assert!((house_income(&house, &config) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_charge_can_go_negative() {
        let mut s = Settlement::new(SimConfig::default());
        charge_gold(&mut s, 150.0);
        assert_eq!(s.ledger.gold, -50.0);
        assert_eq!(gold_payout(&mut s), 0.0);
    }
}
