//! Minimal contract ABI encoding for the calls the pipeline makes.

use sha3::{Digest, Keccak256};

use crate::error::{LedgerError, LedgerResult};

const WORD: usize = 32;

/// `setTokenURI(uint256,string)`
pub const SET_TOKEN_URI: &str = "setTokenURI(uint256,string)";
/// `videoUrl()`
pub const VIDEO_URL: &str = "videoUrl()";
/// `maxSupply()`
pub const MAX_SUPPLY: &str = "maxSupply()";

/// First four bytes of the Keccak-256 hash of a function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = Keccak256::digest(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

fn uint_word(value: u64) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Calldata for a function without arguments.
pub fn encode_call(signature: &str) -> Vec<u8> {
    selector(signature).to_vec()
}

/// Calldata for `setTokenURI(token_id, uri)`.
pub fn encode_set_token_uri(token_id: u64, uri: &str) -> Vec<u8> {
    let bytes = uri.as_bytes();
    let padded = bytes.len().div_ceil(WORD) * WORD;

    let mut data = Vec::with_capacity(4 + 3 * WORD + padded);
    data.extend_from_slice(&selector(SET_TOKEN_URI));
    data.extend_from_slice(&uint_word(token_id));
    // head: offset of the dynamic string, past the two head words
    data.extend_from_slice(&uint_word(2 * WORD as u64));
    data.extend_from_slice(&uint_word(bytes.len() as u64));
    data.extend_from_slice(bytes);
    data.resize(4 + 3 * WORD + padded, 0);
    data
}

fn word_at(data: &[u8], offset: usize) -> LedgerResult<&[u8]> {
    let end = offset
        .checked_add(WORD)
        .ok_or_else(|| LedgerError::abi(format!("word offset {} overflows", offset)))?;
    data.get(offset..end)
        .ok_or_else(|| LedgerError::abi(format!("word at {} out of range ({} bytes)", offset, data.len())))
}

fn word_as_usize(word: &[u8]) -> LedgerResult<usize> {
    let value = word_as_u64(word)?;
    usize::try_from(value).map_err(|_| LedgerError::abi("offset does not fit in usize"))
}

fn word_as_u64(word: &[u8]) -> LedgerResult<u64> {
    if word[..WORD - 8].iter().any(|b| *b != 0) {
        return Err(LedgerError::abi("uint256 does not fit in u64"));
    }
    let mut tail = [0u8; 8];
    tail.copy_from_slice(&word[WORD - 8..]);
    Ok(u64::from_be_bytes(tail))
}

/// Decode a single `uint256` return value.
pub fn decode_uint(data: &[u8]) -> LedgerResult<u64> {
    word_as_u64(word_at(data, 0)?)
}

/// Decode a single `string` return value.
pub fn decode_string(data: &[u8]) -> LedgerResult<String> {
    let offset = word_as_usize(word_at(data, 0)?)?;
    let len = word_as_usize(word_at(data, offset)?)?;
    let start = offset + WORD;
    let end = start
        .checked_add(len)
        .ok_or_else(|| LedgerError::abi(format!("string length {} overflows", len)))?;
    let bytes = data
        .get(start..end)
        .ok_or_else(|| LedgerError::abi("string body out of range"))?;
    String::from_utf8(bytes.to_vec()).map_err(|e| LedgerError::abi(e.to_string()))
}

/// `0x`-prefixed hex for JSON-RPC data fields.
pub fn to_hex_data(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parse a `0x`-prefixed hex data field.
pub fn from_hex_data(data: &str) -> LedgerResult<Vec<u8>> {
    let digits = data.strip_prefix("0x").unwrap_or(data);
    hex::decode(digits).map_err(|e| LedgerError::invalid_response(format!("bad hex data: {}", e)))
}

/// Parse a JSON-RPC quantity such as `0x1b4`.
pub fn parse_quantity(quantity: &str) -> LedgerResult<u64> {
    let digits = quantity
        .strip_prefix("0x")
        .ok_or_else(|| LedgerError::invalid_response(format!("quantity without 0x: {}", quantity)))?;
    u64::from_str_radix(digits, 16)
        .map_err(|e| LedgerError::invalid_response(format!("bad quantity {}: {}", quantity, e)))
}

/// Check for `0x` followed by 40 hex digits.
pub fn validate_address(address: &str) -> LedgerResult<()> {
    let ok = address
        .strip_prefix("0x")
        .map(|h| h.len() == 40 && h.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false);
    if ok {
        Ok(())
    } else {
        Err(LedgerError::InvalidAddress(address.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selectors() {
        assert_eq!(hex::encode(selector("transfer(address,uint256)")), "a9059cbb");
        assert_eq!(hex::encode(selector(SET_TOKEN_URI)), "162094c4");
        assert_eq!(hex::encode(selector(VIDEO_URL)), "73c9fbe2");
        assert_eq!(hex::encode(selector(MAX_SUPPLY)), "d5abeb01");
    }

    #[test]
    fn test_set_token_uri_layout() {
        let uri = "ipfs://bafkreigh2akiscaildcqabsyg3dfr6chu3fgpregiymsck7e7aqa4s52zy";
        let data = encode_set_token_uri(3, uri);

        assert_eq!(&data[..4], &selector(SET_TOKEN_URI));
        let body = &data[4..];
        assert_eq!(decode_uint(body).unwrap(), 3);
        assert_eq!(word_as_u64(&body[32..64]).unwrap(), 64);
        assert_eq!(word_as_u64(&body[64..96]).unwrap(), uri.len() as u64);
        assert_eq!(&body[96..96 + uri.len()], uri.as_bytes());
        assert_eq!(body.len() % 32, 0);
    }

    #[test]
    fn test_decode_string() {
        // abi.encode("https://youtu.be/x")
        let mut data = Vec::new();
        data.extend_from_slice(&uint_word(32));
        data.extend_from_slice(&uint_word(18));
        let mut text = b"https://youtu.be/x".to_vec();
        text.resize(32, 0);
        data.extend_from_slice(&text);

        assert_eq!(decode_string(&data).unwrap(), "https://youtu.be/x");
        assert!(decode_string(&data[..40]).is_err());
    }

    #[test]
    fn test_decode_string_oversized_head() {
        let err = decode_string(&uint_word(u64::MAX)).unwrap_err();
        assert!(matches!(err, LedgerError::Abi(_)));

        let mut data = Vec::new();
        data.extend_from_slice(&uint_word(32));
        data.extend_from_slice(&uint_word(u64::MAX - 8));
        data.extend_from_slice(&[0u8; 32]);
        let err = decode_string(&data).unwrap_err();
        assert!(matches!(err, LedgerError::Abi(_)));
    }

    #[test]
    fn test_decode_uint_overflow() {
        let mut word = [0u8; 32];
        word[0] = 1;
        assert!(decode_uint(&word).is_err());
        assert_eq!(decode_uint(&uint_word(10_000)).unwrap(), 10_000);
    }

    #[test]
    fn test_hex_helpers() {
        assert_eq!(to_hex_data(&[0x16, 0x20]), "0x1620");
        assert_eq!(from_hex_data("0x1620").unwrap(), vec![0x16, 0x20]);
        assert_eq!(parse_quantity("0x1b4").unwrap(), 436);
        assert!(parse_quantity("436").is_err());
        assert!(validate_address("0x5FbDB2315678afecb367f032d93F642f64180aa3").is_ok());
        assert!(validate_address("0x5FbDB2").is_err());
    }
}
