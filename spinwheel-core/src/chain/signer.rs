use crate::chain::keccak256;
use crate::chain::tx::LegacyTransaction;
use crate::error::{Result, SpinwheelError};
use crate::types::Address;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use std::fmt;

/// secp256k1 key held in process memory for the distribution account.
pub struct LocalSigner {
    key: SigningKey,
    address: Address,
}

impl LocalSigner {
    pub fn from_hex(private_key: &str) -> Result<Self> {
        let trimmed = private_key.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);

        let mut bytes = [0u8; 32];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| SpinwheelError::config(format!("Invalid private key: {}", e)))?;

        let key = SigningKey::from_slice(&bytes)
            .map_err(|e| SpinwheelError::config(format!("Invalid private key: {}", e)))?;
        let address = public_key_to_address(key.verifying_key());

        Ok(Self { key, address })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn sign_hash(&self, hash: &[u8; 32]) -> Result<(Signature, RecoveryId)> {
        self.key
            .sign_prehash_recoverable(hash)
            .map_err(|e| SpinwheelError::signing(format!("Failed to sign: {}", e)))
    }

    /// Sign with EIP-155 replay protection and return the raw encoding.
    pub fn sign_transaction(&self, tx: &LegacyTransaction, chain_id: u64) -> Result<Vec<u8>> {
        let hash = tx.signing_hash(chain_id);
        let (signature, recovery_id) = self.sign_hash(&hash)?;

        let bytes = signature.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);

        Ok(tx.encode_signed(chain_id, recovery_id.to_byte(), &r, &s))
    }
}

impl fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Last 20 bytes of the Keccak-256 of the uncompressed public key.
pub fn public_key_to_address(key: &VerifyingKey) -> Address {
    let point = key.as_affine().to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash[12..]);
    Address::from_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::abi;
    use crate::types::TokenAmount;

    const KEY_ONE: &str = "0x0000000000000000000000000000000000000000000000000000000000000001";

    #[test]
    fn test_address_from_key() {
        let signer = LocalSigner::from_hex(KEY_ONE).unwrap();
        assert_eq!(
            signer.address().to_string(),
            "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"
        );
    }

    #[test]
    fn test_rejects_invalid_keys() {
        assert!(LocalSigner::from_hex("0x1234").is_err());
        assert!(LocalSigner::from_hex(&"00".repeat(32)).is_err());
    }

    #[test]
    fn test_signature_recovers_signer() {
        let signer = LocalSigner::from_hex(&"46".repeat(32)).unwrap();
        let tx = LegacyTransaction {
            nonce: 3,
            gas_price: 30_000_000_000,
            gas_limit: 100_000,
            to: Address::from_bytes([0x37; 20]),
            value: 0,
            data: abi::encode_transfer(
                &Address::from_bytes([0x4e; 20]),
                TokenAmount::from_units(100, 18).unwrap(),
            ),
        };

        let hash = tx.signing_hash(137);
        let (signature, recovery_id) = signer.sign_hash(&hash).unwrap();
        let recovered = VerifyingKey::recover_from_prehash(&hash, &signature, recovery_id).unwrap();
        assert_eq!(public_key_to_address(&recovered), signer.address());

        let raw = signer.sign_transaction(&tx, 137).unwrap();
        assert!(raw.len() > tx.signing_payload(137).len());
    }

    #[test]
    fn test_debug_hides_key() {
        let signer = LocalSigner::from_hex(KEY_ONE).unwrap();
        let debug = format!("{:?}", signer);
        assert!(debug.contains("7E5F4552"));
        assert!(!debug.contains("0000000000000001"));
    }
}
