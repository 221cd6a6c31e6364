use crate::chain::keccak256;
use crate::error::{Result, SpinwheelError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 20-byte EVM account or contract address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; 20] = bytes.try_into().map_err(|_| {
            SpinwheelError::InvalidAddress(format!("expected 20 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// EIP-55 mixed-case checksum encoding.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = keccak256(lower.as_bytes());

        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl FromStr for Address {
    type Err = SpinwheelError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| SpinwheelError::InvalidAddress(format!("'{}' is missing 0x", s)))?;

        if digits.len() != 40 {
            return Err(SpinwheelError::InvalidAddress(format!(
                "'{}' must have 40 hex digits",
                s
            )));
        }

        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| SpinwheelError::InvalidAddress(format!("'{}': {}", s, e)))?;
        let address = Address(bytes);

        let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
        let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
        if has_upper && has_lower && address.to_checksum()[2..] != *digits {
            return Err(SpinwheelError::InvalidAddress(format!(
                "'{}' has an invalid checksum",
                s
            )));
        }

        Ok(address)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// 32-byte transaction hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash([u8; 32]);

impl TxHash {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl FromStr for TxHash {
    type Err = SpinwheelError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| SpinwheelError::InvalidTxHash(format!("'{}': {}", s, e)))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash(0x{})", hex::encode(self.0))
    }
}

impl Serialize for TxHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Token quantity in the contract's smallest unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct TokenAmount(u128);

impl TokenAmount {
    pub const ZERO: TokenAmount = TokenAmount(0);

    pub fn from_base_units(units: u128) -> Self {
        Self(units)
    }

    /// Whole display units scaled by `10^decimals`.
    pub fn from_units(units: u64, decimals: u8) -> Result<Self> {
        scale(decimals)?
            .checked_mul(units as u128)
            .map(Self)
            .ok_or_else(|| {
                SpinwheelError::InvalidAmount(format!(
                    "{} units with {} decimals overflows",
                    units, decimals
                ))
            })
    }

    pub fn base_units(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Whole display units, if the amount has no fractional part.
    pub fn whole_units(&self, decimals: u8) -> Option<u64> {
        let scale = scale(decimals).ok()?;
        if self.0 % scale != 0 {
            return None;
        }
        u64::try_from(self.0 / scale).ok()
    }

    pub fn format_units(&self, decimals: u8) -> String {
        let Ok(scale) = scale(decimals) else {
            return self.0.to_string();
        };
        let whole = self.0 / scale;
        let frac = self.0 % scale;
        if frac == 0 {
            return whole.to_string();
        }
        let frac = format!("{:0width$}", frac, width = decimals as usize);
        format!("{}.{}", whole, frac.trim_end_matches('0'))
    }
}

fn scale(decimals: u8) -> Result<u128> {
    10u128.checked_pow(decimals as u32).ok_or_else(|| {
        SpinwheelError::InvalidAmount(format!("{} decimals is out of range", decimals))
    })
}

/// One prize payout, consumed by the transfer submitter.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub id: Uuid,
    pub recipient: Address,
    pub amount: TokenAmount,
}

impl TransferRequest {
    pub fn new(recipient: Address, amount: TokenAmount) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipient,
            amount,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferResult {
    pub request_id: Uuid,
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub gas_used: u64,
    pub confirmed_at: DateTime<Utc>,
}

/// Running token totals, in display units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryReport {
    pub total_in: u64,
    pub total_out: u64,
    pub balance: i64,
}

impl TreasuryReport {
    pub fn new(total_in: u64, total_out: u64) -> Self {
        let balance = (total_in as i128 - total_out as i128)
            .clamp(i64::MIN as i128, i64::MAX as i128) as i64;
        Self {
            total_in,
            total_out,
            balance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_checksum() {
        // EIP-55 reference vectors
        for addr in [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
        ] {
            let parsed: Address = addr.parse().unwrap();
            assert_eq!(parsed.to_string(), addr);
        }
    }

    #[test]
    fn test_address_rejects_bad_input() {
        assert!("5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
            .parse::<Address>()
            .is_err());
        assert!("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beae".parse::<Address>().is_err());
        assert!("0xZZaeb6053f3e94c9b9a09f33669435e7ef1beaed"
            .parse::<Address>()
            .is_err());
        // flipped case on one letter breaks the checksum
        assert!("0x5AAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
            .parse::<Address>()
            .is_err());
        // single-case input skips the checksum
        assert!("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"
            .parse::<Address>()
            .is_ok());
    }

    #[test]
    fn test_token_amount_units() {
        let amount = TokenAmount::from_units(50, 18).unwrap();
        assert_eq!(amount.base_units(), 50_000_000_000_000_000_000);
        assert_eq!(amount.whole_units(18), Some(50));
        assert_eq!(amount.format_units(18), "50");

        let half = TokenAmount::from_base_units(1_500_000);
        assert_eq!(half.whole_units(6), None);
        assert_eq!(half.format_units(6), "1.5");

        assert!(TokenAmount::from_units(u64::MAX, 38).is_err());
    }

    #[test]
    fn test_treasury_balance() {
        let report = TreasuryReport::new(175, 300);
        assert_eq!(report.balance, -125);
    }
}
