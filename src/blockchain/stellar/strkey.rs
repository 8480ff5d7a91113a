//! Stellar StrKey encoding for ed25519 account ids (`G...`).
//!
//! Layout: `base32(version_byte || key || crc16_xmodem_le)`, no padding.

use thiserror::Error;

/// Version byte for public account ids (`6 << 3`).
const ACCOUNT_ID_VERSION: u8 = 6 << 3;

/// Encoded length of an account id.
pub const ACCOUNT_ID_LEN: usize = 56;

const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StrKeyError {
    #[error("invalid length: expected {ACCOUNT_ID_LEN} characters, got {0}")]
    Length(usize),

    #[error("invalid base32 character '{0}'")]
    Character(char),

    #[error("unexpected version byte {0:#04x}")]
    Version(u8),

    #[error("checksum mismatch")]
    Checksum,
}

/// Encode a 32-byte ed25519 public key as an account id.
pub fn encode_account_id(key: &[u8; 32]) -> String {
    let mut payload = Vec::with_capacity(35);
    payload.push(ACCOUNT_ID_VERSION);
    payload.extend_from_slice(key);
    let crc = crc16_xmodem(&payload);
    payload.extend_from_slice(&crc.to_le_bytes());
    base32_encode(&payload)
}

/// Decode an account id back to its public key.
pub fn decode_account_id(account_id: &str) -> Result<[u8; 32], StrKeyError> {
    if account_id.len() != ACCOUNT_ID_LEN {
        return Err(StrKeyError::Length(account_id.len()));
    }
    let raw = base32_decode(account_id)?;
    let (body, checksum) = raw.split_at(raw.len() - 2);

    if body[0] != ACCOUNT_ID_VERSION {
        return Err(StrKeyError::Version(body[0]));
    }
    if crc16_xmodem(body).to_le_bytes() != checksum {
        return Err(StrKeyError::Checksum);
    }

    let mut key = [0u8; 32];
    key.copy_from_slice(&body[1..]);
    Ok(key)
}

pub fn is_account_id(s: &str) -> bool {
    decode_account_id(s).is_ok()
}

fn crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}

fn base32_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity((data.len() * 8).div_ceil(5));
    let mut buffer: u32 = 0;
    let mut bits = 0;

    for &byte in data {
        buffer = (buffer << 8) | byte as u32;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }
    out
}

fn base32_decode(s: &str) -> Result<Vec<u8>, StrKeyError> {
    let mut out = Vec::with_capacity(s.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits = 0;

    for c in s.chars() {
        let value = ALPHABET
            .iter()
            .position(|&a| a as char == c)
            .ok_or(StrKeyError::Character(c))?;
        buffer = (buffer << 5) | value as u32;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((buffer >> bits) as u8);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vectors() {
        assert_eq!(
            encode_account_id(&[0u8; 32]),
            "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF"
        );

        let mut key = [0u8; 32];
        for (i, b) in key.iter_mut().enumerate() {
            *b = i as u8;
        }
        assert_eq!(
            encode_account_id(&key),
            "GAAACAQDAQCQMBYIBEFAWDANBYHRAEISCMKBKFQXDAMRUGY4DUPB7JZX"
        );
    }

    #[test]
    fn test_crc16_check_value() {
        assert_eq!(crc16_xmodem(b"123456789"), 0x31c3);
    }

    #[test]
    fn test_decode_recovers_key() {
        let key = [7u8; 32];
        let id = encode_account_id(&key);
        assert_eq!(id.len(), ACCOUNT_ID_LEN);
        assert!(id.starts_with('G'));
        assert_eq!(decode_account_id(&id).unwrap(), key);
    }

    #[test]
    fn test_decode_rejects_corruption() {
        let mut id = encode_account_id(&[7u8; 32]).into_bytes();
        id[20] = if id[20] == b'A' { b'B' } else { b'A' };
        let id = String::from_utf8(id).unwrap();
        assert_eq!(decode_account_id(&id), Err(StrKeyError::Checksum));

        assert_eq!(decode_account_id("GABC"), Err(StrKeyError::Length(4)));
        assert!(!is_account_id(&"g".repeat(56)));
    }
}
