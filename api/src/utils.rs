use crate::consts::MASP_EPOCH_MULTIPLIER;
use crate::error::DecodeError;
use crate::types::MaspEpoch;

/// Maps a chain epoch to the MASP epoch containing it.
pub fn masp_epoch_of(chain_epoch: u64) -> MaspEpoch {
    chain_epoch / MASP_EPOCH_MULTIPLIER
}

/// Decodes an unsigned little-endian integer of arbitrary width.
///
/// Borsh encodes token amounts as 256-bit integers; anything that does not
/// fit in 128 bits is rejected. An empty value decodes to zero.
pub fn decode_amount(bytes: &[u8]) -> Result<u128, DecodeError> {
    let (low, high) = bytes.split_at(bytes.len().min(16));

    if high.iter().any(|b| *b != 0) {
        return Err(DecodeError::AmountOverflow(bytes.len()));
    }

    Ok(low
        .iter()
        .rev()
        .fold(0u128, |acc, byte| (acc << 8) | *byte as u128))
}

/// Decodes a Borsh `Option<u64>`: a tag byte followed by a little-endian u64.
pub fn decode_option_u64(bytes: &[u8]) -> Result<Option<u64>, DecodeError> {
    match bytes.first() {
        None => Err(DecodeError::Empty),
        Some(0) => Ok(None),
        Some(1) => {
            let raw: [u8; 8] = bytes
                .get(1..9)
                .and_then(|b| b.try_into().ok())
                .ok_or(DecodeError::Truncated { expected: 9, actual: bytes.len() })?;
            Ok(Some(u64::from_le_bytes(raw)))
        }
        Some(tag) => Err(DecodeError::InvalidTag(*tag)),
    }
}

/// Extracts `N` from a node message of the form `Cannot query more than N blocks`.
pub fn parse_look_back_limit(message: &str) -> Option<u64> {
    const MARKER: &str = "Cannot query more than ";

    let start = message.find(MARKER)? + MARKER.len();
    let rest = &message[start..];
    let digits: &str = &rest[..rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len())];

    if !rest[digits.len()..].trim_start().starts_with("blocks") {
        return None;
    }

    digits.parse().ok()
}
