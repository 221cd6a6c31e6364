use spinwheel_core::{AmountResolver, GameConfig, Payout, Prize, PrizeSelector, PrizeTable};
use std::collections::HashMap;

#[test]
fn every_roll_maps_to_one_prize() {
    let table = PrizeTable::default();
    let mut roll = 0.0;
    while roll < 100.0 {
        assert!(table.contains(table.draw(roll)));
        roll += 0.005;
    }
}

#[test]
fn draw_frequencies_match_weights() {
    const DRAWS: usize = 100_000;
    let selector = PrizeSelector::seeded(PrizeTable::default(), 2024);

    let mut counts: HashMap<Prize, usize> = HashMap::new();
    for _ in 0..DRAWS {
        *counts.entry(selector.draw()).or_default() += 1;
    }

    for (prize, percent) in selector.table().probabilities() {
        let p = percent / 100.0;
        let expected = p * DRAWS as f64;
        let sigma = (DRAWS as f64 * p * (1.0 - p)).sqrt();
        let observed = counts.get(prize).copied().unwrap_or(0) as f64;
        // five sigma plus slack for the rare tiers
        assert!(
            (observed - expected).abs() <= 5.0 * sigma + 3.0,
            "{}: observed {} expected {:.1}",
            prize,
            observed,
            expected
        );
    }
}

#[test]
fn every_default_prize_resolves() {
    let config = GameConfig::default();
    config.validate().unwrap();
    let resolver = AmountResolver::new(config.rewards.clone(), 18);

    let mut transfers = 0;
    for prize in config.prizes.labels() {
        match resolver.resolve(prize).unwrap() {
            Payout::Transfer(amount) => {
                assert!(!amount.is_zero());
                transfers += 1;
            }
            Payout::Collectible | Payout::Nothing => {}
        }
    }
    assert_eq!(transfers, 7);
}

#[test]
fn default_packs_are_priced() {
    let config = GameConfig::default();
    let prices: Vec<(u32, u64)> = config.spin_packs.iter().map(|p| (p.spins, p.cost)).collect();
    assert_eq!(prices, vec![(1, 50), (3, 125), (10, 300)]);
}
