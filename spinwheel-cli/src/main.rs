mod commands;

use clap::{Parser, Subcommand};
use spinwheel_core::{GameConfig, SpinwheelError};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "spinwheel")]
#[command(about = "spinwheel - operator tools for the spin-to-win prize server")]
#[command(version)]
struct Cli {
    /// JSON file with prize table, rewards and spin packs
    #[arg(short, long, global = true, env = "GAME_TABLES")]
    tables: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the game tables and show prize odds
    Check,

    /// Draw prizes offline and compare with the configured odds
    Simulate {
        /// Number of draws
        #[arg(short, long, default_value_t = 100_000)]
        spins: u64,
        /// Seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,
    },

    /// List spin packs and their prices
    Quote,

    /// Inspect a transaction and decode its token transfer
    Tx {
        /// Transaction hash
        hash: String,
        #[command(flatten)]
        chain: commands::ChainArgs,
    },

    /// Show the distribution account
    Account {
        #[command(flatten)]
        chain: commands::ChainArgs,
    },

    /// Pay a prize by hand
    Send {
        /// Recipient address
        address: String,
        /// Prize label, e.g. "100 GKY"
        prize: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
        #[command(flatten)]
        chain: commands::ChainArgs,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "spinwheel={}",
            log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let result = match load_config(cli.tables.as_ref()) {
        Ok(config) => match cli.command {
            Commands::Check => commands::handle_check_command(&config),
            Commands::Simulate { spins, seed } => {
                commands::handle_simulate_command(&config, spins, seed)
            }
            Commands::Quote => commands::handle_quote_command(&config),
            Commands::Tx { hash, chain } => {
                commands::handle_tx_command(&config, &chain, &hash).await
            }
            Commands::Account { chain } => commands::handle_account_command(&chain).await,
            Commands::Send {
                address,
                prize,
                yes,
                chain,
            } => commands::handle_send_command(&config, &chain, &address, &prize, yes).await,
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        match e {
            SpinwheelError::Config(msg) => {
                eprintln!("Error: Invalid configuration: {}", msg);
                eprintln!("Use 'spinwheel check --tables <FILE>' to validate a tables file");
            }
            SpinwheelError::UnknownPrize(prize) => {
                eprintln!("Error: Unknown prize '{}'", prize);
                eprintln!("Use 'spinwheel check' to list the configured prizes");
            }
            SpinwheelError::InvalidAddress(addr) => {
                eprintln!("Error: Invalid address: {}", addr);
            }
            _ => {
                eprintln!("Error: {}", e);
            }
        }
        std::process::exit(1);
    }

    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> spinwheel_core::Result<GameConfig> {
    match path {
        Some(path) => GameConfig::from_file(path),
        None => Ok(GameConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spinwheel_core::Prize;
    use std::io::Write;

    #[test]
    fn test_load_config_defaults_without_file() {
        let config = load_config(None).unwrap();
        assert_eq!(config.token_symbol, "GKY");
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"token_symbol": "TST", "metered_spins": true}}"#).unwrap();

        let config = load_config(Some(&file.path().to_path_buf())).unwrap();
        assert_eq!(config.token_symbol, "TST");
        assert!(config.metered_spins);
        assert!(config.prizes.contains(&Prize::new("100 GKY")));
    }

    #[test]
    fn test_load_config_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(load_config(Some(&file.path().to_path_buf())).is_err());
    }

    #[test]
    fn test_cli_parses_send() {
        let cli = Cli::try_parse_from([
            "spinwheel",
            "send",
            "0x0000000000000000000000000000000000000001",
            "100 GKY",
            "--yes",
            "--provider-url",
            "http://localhost:8545",
            "--private-key",
            "0x01",
            "--token-address",
            "0x7070707070707070707070707070707070707070",
        ])
        .unwrap();
        match cli.command {
            Commands::Send { prize, yes, .. } => {
                assert_eq!(prize, "100 GKY");
                assert!(yes);
            }
            _ => panic!("expected send"),
        }
    }
}
