use crate::commands::ChainArgs;
use comfy_table::{presets::UTF8_FULL, Table};
use dialoguer::Confirm;
use spinwheel_core::{
    Address, AmountResolver, ChainClient, GameConfig, Payout, Prize, Result, SpinwheelError,
    TransferSubmitter, TxHash,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub async fn handle_tx_command(config: &GameConfig, chain: &ChainArgs, hash: &str) -> Result<()> {
    let hash: TxHash = hash.parse()?;
    let client = chain.connect().await?;

    let tx = client
        .transaction(&hash)
        .await?
        .ok_or_else(|| SpinwheelError::TransactionNotFound(hash.to_string()))?;
    let receipt = client.receipt(&hash).await?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.add_row(vec!["Hash".to_string(), tx.hash.to_string()]);
    table.add_row(vec!["From".to_string(), tx.from.to_string()]);
    table.add_row(vec![
        "To".to_string(),
        tx.to.map(|a| a.to_string()).unwrap_or_else(|| "(contract creation)".to_string()),
    ]);
    table.add_row(vec![
        "Block".to_string(),
        tx.block_number
            .map(|b| b.to_string())
            .unwrap_or_else(|| "pending".to_string()),
    ]);
    let status = match &receipt {
        Some(r) if r.success => format!("success (gas used {})", r.gas_used),
        Some(r) => format!("reverted (gas used {})", r.gas_used),
        None => "not mined".to_string(),
    };
    table.add_row(vec!["Status".to_string(), status]);

    let decimals = client.token_decimals();
    match tx.token_transfer() {
        Some((recipient, amount)) if tx.to == Some(client.token_address()) => {
            table.add_row(vec![
                "Transfer".to_string(),
                format!(
                    "{} {} to {}",
                    amount.format_units(decimals),
                    config.token_symbol,
                    recipient
                ),
            ]);
            if recipient == client.distribution_address() {
                let pack = config
                    .spin_packs
                    .iter()
                    .find(|p| amount.whole_units(decimals) == Some(p.cost));
                let note = match pack {
                    Some(pack) => format!("pays for the {}-spin pack", pack.spins),
                    None => "matches no spin pack".to_string(),
                };
                table.add_row(vec!["Purchase".to_string(), note]);
            }
        }
        Some((recipient, amount)) => {
            table.add_row(vec![
                "Call".to_string(),
                format!(
                    "transfer of {} base units to {} on another contract",
                    amount.base_units(),
                    recipient
                ),
            ]);
        }
        None => {
            table.add_row(vec!["Call".to_string(), format!("{} bytes of input", tx.input.len())]);
        }
    }

    println!("{}", table);
    Ok(())
}

pub async fn handle_account_command(chain: &ChainArgs) -> Result<()> {
    let client = chain.connect().await?;
    let address = client.distribution_address();
    let balance = client.token_balance(&address).await?;
    let head = client.block_number().await?;

    println!("Distribution account: {}", address);
    println!("  Chain ID: {}", client.chain_id());
    println!("  Latest block: {}", head);
    println!("  Token: {}", client.token_address());
    println!(
        "  Token balance: {} ({} decimals)",
        balance.format_units(client.token_decimals()),
        client.token_decimals()
    );
    Ok(())
}

pub async fn handle_send_command(
    config: &GameConfig,
    chain: &ChainArgs,
    address: &str,
    prize: &str,
    yes: bool,
) -> Result<()> {
    let recipient: Address = address.parse()?;
    let prize = Prize::new(prize.trim());

    let client: Arc<dyn ChainClient> = Arc::new(chain.connect().await?);
    let resolver = AmountResolver::new(config.rewards.clone(), client.token_decimals());

    let amount = match resolver.resolve(&prize)? {
        Payout::Transfer(amount) => amount,
        Payout::Collectible => {
            println!("'{}' is a collectible; nothing to send.", prize);
            return Ok(());
        }
        Payout::Nothing => {
            println!("'{}' pays nothing.", prize);
            return Ok(());
        }
    };

    let display = format!(
        "{} {}",
        amount.format_units(client.token_decimals()),
        config.token_symbol
    );
    if !yes {
        let confirm = Confirm::new()
            .with_prompt(format!(
                "Send {} from {} to {}? This cannot be undone.",
                display,
                client.distribution_address(),
                recipient
            ))
            .default(false)
            .interact()
            .map_err(|e| SpinwheelError::dialog(e.to_string()))?;

        if !confirm {
            println!("Transfer cancelled.");
            return Ok(());
        }
    }

    println!("Sending {} to {}...", display, recipient);
    info!(recipient = %recipient, prize = %prize, "manual prize transfer");
    let submitter = TransferSubmitter::new(
        client,
        chain.config().confirmation_timeout,
        Duration::from_secs(2),
    );
    match submitter.submit(recipient, amount).await {
        Ok(result) => {
            println!("Prize transferred successfully!");
            println!("Transaction hash: {}", result.tx_hash);
            println!("Block: {} (gas used {})", result.block_number, result.gas_used);
        }
        Err(e) => {
            warn!(error = %e, "manual prize transfer failed");
            println!("Transfer failed: {}", e);
            return Err(e);
        }
    }
    Ok(())
}
