use crate::chain::keccak256;
use crate::types::Address;
use rlp::RlpStream;

/// Pre-EIP-1559 transaction, signed with EIP-155 replay protection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub to: Address,
    pub value: u128,
    pub data: Vec<u8>,
}

/// Big-endian bytes with leading zeros stripped, as RLP wants integers.
fn be_trimmed(value: u128) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes[first..].to_vec()
}

fn trim_leading_zeros(bytes: &[u8]) -> Vec<u8> {
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes[first..].to_vec()
}

impl LegacyTransaction {
    fn append_fields(&self, stream: &mut RlpStream) {
        stream.append(&be_trimmed(self.nonce as u128));
        stream.append(&be_trimmed(self.gas_price));
        stream.append(&be_trimmed(self.gas_limit as u128));
        stream.append(&self.to.as_bytes().to_vec());
        stream.append(&be_trimmed(self.value));
        stream.append(&self.data);
    }

    /// RLP payload hashed for signing: the six fields plus `chain_id, 0, 0`.
    pub fn signing_payload(&self, chain_id: u64) -> Vec<u8> {
        let mut stream = RlpStream::new_list(9);
        self.append_fields(&mut stream);
        stream.append(&be_trimmed(chain_id as u128));
        stream.append(&Vec::<u8>::new());
        stream.append(&Vec::<u8>::new());
        stream.out().to_vec()
    }

    pub fn signing_hash(&self, chain_id: u64) -> [u8; 32] {
        keccak256(&self.signing_payload(chain_id))
    }

    /// Raw signed transaction ready for `eth_sendRawTransaction`.
    /// `recovery_id` is the 0/1 parity of the signature.
    pub fn encode_signed(&self, chain_id: u64, recovery_id: u8, r: &[u8; 32], s: &[u8; 32]) -> Vec<u8> {
        let v = chain_id as u128 * 2 + 35 + recovery_id as u128;
        let mut stream = RlpStream::new_list(9);
        self.append_fields(&mut stream);
        stream.append(&be_trimmed(v));
        stream.append(&trim_leading_zeros(r));
        stream.append(&trim_leading_zeros(s));
        stream.out().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eip155_example() -> LegacyTransaction {
        LegacyTransaction {
            nonce: 9,
            gas_price: 20_000_000_000,
            gas_limit: 21_000,
            to: Address::from_bytes([0x35; 20]),
            value: 1_000_000_000_000_000_000,
            data: Vec::new(),
        }
    }

    #[test]
    fn test_eip155_signing_payload() {
        // Worked example from the EIP-155 text.
        let payload = eip155_example().signing_payload(1);
        assert_eq!(
            hex::encode(payload),
            "ec098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a764000080018080"
        );
    }

    #[test]
    fn test_signed_encoding_v_value() {
        let tx = eip155_example();
        let raw = tx.encode_signed(137, 1, &[0x11; 32], &[0x22; 32]);
        // 137 * 2 + 36 = 310 = 0x0136
        let needle: [u8; 4] = [0x82, 0x01, 0x36, 0xa0];
        assert!(raw.windows(needle.len()).any(|w| w == &needle[..]));
    }

    #[test]
    fn test_zero_fields_encode_as_empty_strings() {
        let tx = LegacyTransaction {
            nonce: 0,
            gas_price: 0,
            gas_limit: 0,
            to: Address::ZERO,
            value: 0,
            data: Vec::new(),
        };
        let payload = tx.signing_payload(1);
        // list header, three empty ints, 20-byte address, empty value, empty data, chain id 1, two empties
        assert_eq!(&payload[1..4], &[0x80u8, 0x80, 0x80][..]);
        assert_eq!(payload.len(), 1 + 3 + 21 + 2 + 1 + 2);
    }
}
