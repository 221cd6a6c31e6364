use comfy_table::{presets::UTF8_FULL, Table};
use spinwheel_core::{GameConfig, Prize, PrizeSelector, Result, Reward, SpinwheelError};
use std::collections::HashMap;

fn describe_reward(reward: Option<Reward>, symbol: &str) -> String {
    match reward {
        Some(Reward::Tokens(amount)) => format!("{} {}", amount, symbol),
        Some(Reward::Collectible) => "collectible".to_string(),
        Some(Reward::Nothing) => "-".to_string(),
        None => "MISSING".to_string(),
    }
}

pub fn handle_check_command(config: &GameConfig) -> Result<()> {
    config.validate()?;

    println!("Prize table ({} prizes):", config.prizes.tiers().len() + 1);
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Prize", "Upper bound", "Probability", "Reward"]);

    let probabilities = config.prizes.probabilities();
    let bounds = config
        .prizes
        .tiers()
        .iter()
        .map(|t| t.upper_bound)
        .chain(std::iter::once(100.0));
    for ((prize, probability), bound) in probabilities.iter().zip(bounds) {
        table.add_row(vec![
            prize.to_string(),
            format!("{:.2}", bound),
            format!("{:.2}%", probability),
            describe_reward(config.rewards.get(prize), &config.token_symbol),
        ]);
    }
    println!("{}", table);

    let expected: f64 = probabilities
        .iter()
        .map(|(prize, probability)| match config.rewards.get(prize) {
            Some(Reward::Tokens(amount)) => amount as f64 * probability / 100.0,
            _ => 0.0,
        })
        .sum();
    println!(
        "Expected payout per spin: {:.2} {}",
        expected, config.token_symbol
    );
    println!("Purchase check: {:?}", config.purchase_check);
    println!("Metered spins: {}", config.metered_spins);
    println!("Tables are valid.");
    Ok(())
}

pub fn handle_simulate_command(config: &GameConfig, spins: u64, seed: Option<u64>) -> Result<()> {
    if spins == 0 {
        return Err(SpinwheelError::config("number of spins must be positive"));
    }
    config.validate()?;

    let selector = match seed {
        Some(seed) => PrizeSelector::seeded(config.prizes.clone(), seed),
        None => PrizeSelector::new(config.prizes.clone()),
    };

    let mut counts: HashMap<Prize, u64> = HashMap::new();
    let mut paid: u128 = 0;
    for _ in 0..spins {
        let prize = selector.draw();
        if let Some(Reward::Tokens(amount)) = config.rewards.get(&prize) {
            paid += amount as u128;
        }
        *counts.entry(prize).or_default() += 1;
    }

    println!("Simulated {} spins:", spins);
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Prize", "Count", "Observed", "Configured"]);
    for (prize, probability) in config.prizes.probabilities() {
        let count = counts.get(prize).copied().unwrap_or(0);
        table.add_row(vec![
            prize.to_string(),
            count.to_string(),
            format!("{:.3}%", count as f64 * 100.0 / spins as f64),
            format!("{:.3}%", probability),
        ]);
    }
    println!("{}", table);
    println!(
        "Tokens paid: {} {} ({:.2} per spin)",
        paid,
        config.token_symbol,
        paid as f64 / spins as f64
    );
    Ok(())
}

pub fn handle_quote_command(config: &GameConfig) -> Result<()> {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Spins", "Cost", "Per spin"]);
    for pack in &config.spin_packs {
        table.add_row(vec![
            pack.spins.to_string(),
            format!("{} {}", pack.cost, config.token_symbol),
            format!("{:.2}", pack.cost as f64 / pack.spins as f64),
        ]);
    }
    println!("{}", table);
    Ok(())
}
