use spinwheel_core::{ChainClient, GameConfig, PurchaseDesk, Result, SpinLedger, SpinService};
use std::sync::Arc;
use std::time::Duration;

/// Receipt polling period while waiting for a prize transfer.
pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

pub struct AppState {
    pub game: SpinService,
    pub desk: Arc<PurchaseDesk>,
    pub ledger: Arc<dyn SpinLedger>,
    pub chain: Arc<dyn ChainClient>,
    pub token_symbol: String,
}

impl AppState {
    pub fn new(
        config: &GameConfig,
        chain: Arc<dyn ChainClient>,
        ledger: Arc<dyn SpinLedger>,
        confirmation_timeout: Duration,
    ) -> Result<Self> {
        let game = SpinService::from_config(
            config,
            chain.clone(),
            ledger.clone(),
            confirmation_timeout,
            RECEIPT_POLL_INTERVAL,
        )?;
        let desk = Arc::new(PurchaseDesk::new(
            chain.clone(),
            ledger.clone(),
            config.spin_packs.clone(),
            config.purchase_check,
        ));

        Ok(Self {
            game,
            desk,
            ledger,
            chain,
            token_symbol: config.token_symbol.clone(),
        })
    }
}
