use thiserror::Error;

pub type Result<T> = std::result::Result<T, SpinwheelError>;

#[derive(Error, Debug)]
pub enum SpinwheelError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid transaction hash: {0}")]
    InvalidTxHash(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Unknown prize: {0}")]
    UnknownPrize(String),

    #[error("Prize '{prize}' was not awarded to {wallet}")]
    PrizeNotAwarded { wallet: String, prize: String },

    #[error("No spins left for {0}")]
    NoSpinsLeft(String),

    #[error("Unsupported spin pack: {0} (choose 1, 3 or 10)")]
    InvalidSpinPack(u32),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("Transaction already used for a purchase: {0}")]
    DuplicatePurchase(String),

    #[error("Purchase rejected: {0}")]
    PurchaseRejected(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Network connection error: {0}")]
    NetworkConnection(String),

    #[error("Malformed chain response: {0}")]
    Decode(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Transaction reverted: {0}")]
    Reverted(String),

    #[error("Operation timeout: {0}")]
    Timeout(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dialog error: {0}")]
    Dialog(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SpinwheelError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn dialog(msg: impl Into<String>) -> Self {
        Self::Dialog(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn signing(msg: impl Into<String>) -> Self {
        Self::Signing(msg.into())
    }

    pub fn network_connection(msg: impl Into<String>) -> Self {
        Self::NetworkConnection(msg.into())
    }

    pub fn purchase_rejected(msg: impl Into<String>) -> Self {
        Self::PurchaseRejected(msg.into())
    }

    /// True for failures caused by the caller's input rather than by the
    /// chain or by this process.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidAddress(_)
                | Self::InvalidTxHash(_)
                | Self::InvalidAmount(_)
                | Self::UnknownPrize(_)
                | Self::PrizeNotAwarded { .. }
                | Self::NoSpinsLeft(_)
                | Self::InvalidSpinPack(_)
                | Self::TransactionNotFound(_)
                | Self::DuplicatePurchase(_)
                | Self::PurchaseRejected(_)
        )
    }
}

impl From<reqwest::Error> for SpinwheelError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SpinwheelError::Timeout(err.to_string())
        } else {
            SpinwheelError::NetworkConnection(err.to_string())
        }
    }
}
