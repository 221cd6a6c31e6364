//! Minimal ERC-20 ABI encoding: the three calls the service makes and the
//! one it decodes.

use crate::chain::keccak256;
use crate::error::{Result, SpinwheelError};
use crate::types::{Address, TokenAmount};

/// `transfer(address,uint256)`
pub const TRANSFER_SELECTOR: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];
/// `balanceOf(address)`
pub const BALANCE_OF_SELECTOR: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];
/// `decimals()`
pub const DECIMALS_SELECTOR: [u8; 4] = [0x31, 0x3c, 0xe5, 0x67];

const WORD: usize = 32;

pub fn function_selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

fn address_word(address: &Address) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

fn uint_word(value: u128) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

pub fn encode_transfer(to: &Address, amount: TokenAmount) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + 2 * WORD);
    data.extend_from_slice(&TRANSFER_SELECTOR);
    data.extend_from_slice(&address_word(to));
    data.extend_from_slice(&uint_word(amount.base_units()));
    data
}

pub fn encode_balance_of(owner: &Address) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + WORD);
    data.extend_from_slice(&BALANCE_OF_SELECTOR);
    data.extend_from_slice(&address_word(owner));
    data
}

pub fn encode_decimals() -> Vec<u8> {
    DECIMALS_SELECTOR.to_vec()
}

/// Decode the arguments of a `transfer(address,uint256)` call.
pub fn decode_transfer(input: &[u8]) -> Result<(Address, TokenAmount)> {
    if input.len() != 4 + 2 * WORD {
        return Err(SpinwheelError::decode(format!(
            "transfer calldata must be {} bytes, got {}",
            4 + 2 * WORD,
            input.len()
        )));
    }
    if input[..4] != TRANSFER_SELECTOR {
        return Err(SpinwheelError::decode(format!(
            "selector 0x{} is not transfer",
            hex::encode(&input[..4])
        )));
    }

    let to_word = &input[4..4 + WORD];
    if to_word[..12].iter().any(|b| *b != 0) {
        return Err(SpinwheelError::decode("address argument is not left-padded"));
    }
    let to = Address::from_slice(&to_word[12..])?;
    let amount = decode_uint(&input[4 + WORD..])?;

    Ok((to, TokenAmount::from_base_units(amount)))
}

/// Decode a single 32-byte unsigned word that must fit in 128 bits.
pub fn decode_uint(word: &[u8]) -> Result<u128> {
    if word.len() != WORD {
        return Err(SpinwheelError::decode(format!(
            "expected a 32-byte word, got {} bytes",
            word.len()
        )));
    }
    if word[..16].iter().any(|b| *b != 0) {
        return Err(SpinwheelError::decode("uint256 value exceeds 128 bits"));
    }
    let mut low = [0u8; 16];
    low.copy_from_slice(&word[16..]);
    Ok(u128::from_be_bytes(low))
}
