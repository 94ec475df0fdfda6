use std::fmt;
use std::str::FromStr;

use bech32::{FromBase32, ToBase32, Variant};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::AddressError;

/// Longest raw account address accepted, in bytes.
pub const MAX_ADDR_LEN: usize = 255;

/// A bech32 account address (`terra1...`).
///
/// Holds the human-readable prefix and the raw account bytes; the canonical
/// lowercase encoding is computed once at construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address {
    prefix: String,
    bytes: Vec<u8>,
    encoded: String,
}

impl Address {
    /// Build an address from a prefix and raw account bytes.
    pub fn from_bytes(prefix: &str, bytes: &[u8]) -> Result<Self, AddressError> {
        if prefix.is_empty() {
            return Err(AddressError::MissingPrefix);
        }
        if bytes.is_empty() {
            return Err(AddressError::Empty);
        }
        if bytes.len() > MAX_ADDR_LEN {
            return Err(AddressError::TooLong(bytes.len()));
        }
        let prefix = prefix.to_ascii_lowercase();
        let encoded = bech32::encode(&prefix, bytes.to_base32(), Variant::Bech32)
            .map_err(|e| AddressError::Bech32(e.to_string()))?;
        Ok(Self {
            prefix,
            bytes: bytes.to_vec(),
            encoded,
        })
    }

    /// Parse any bech32 account address, whatever its prefix.
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        if s.is_empty() {
            return Err(AddressError::Empty);
        }
        let (hrp, data, variant) =
            bech32::decode(s).map_err(|e| AddressError::Bech32(e.to_string()))?;
        if variant != Variant::Bech32 {
            return Err(AddressError::Bech32("bech32m encoding not accepted".into()));
        }
        let bytes = Vec::<u8>::from_base32(&data).map_err(|e| AddressError::Bech32(e.to_string()))?;
        Self::from_bytes(&hrp, &bytes)
    }

    /// Parse an address and require a specific prefix.
    pub fn parse_with_prefix(s: &str, expected: &str) -> Result<Self, AddressError> {
        let addr = Self::parse(s)?;
        if !addr.prefix.eq_ignore_ascii_case(expected) {
            return Err(AddressError::WrongPrefix {
                expected: expected.to_string(),
                found: addr.prefix,
            });
        }
        Ok(addr)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_str(&self) -> &str {
        &self.encoded
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.encoded.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_then_parse_keeps_bytes() {
        let addr = Address::from_bytes("terra", &[7u8; 20]).unwrap();
        assert!(addr.as_str().starts_with("terra1"));
        let parsed = Address::parse(addr.as_str()).unwrap();
        assert_eq!(parsed, addr);
        assert_eq!(parsed.as_bytes(), &[7u8; 20]);
    }

    #[test]
    fn uppercase_input_is_canonicalized() {
        let addr = Address::from_bytes("terra", &[3u8; 20]).unwrap();
        let upper = addr.as_str().to_ascii_uppercase();
        let parsed = Address::parse(&upper).unwrap();
        assert_eq!(parsed.as_str(), addr.as_str());
    }

    #[test]
    fn rejects_empty_and_garbage() {
        assert_eq!(Address::parse(""), Err(AddressError::Empty));
        assert!(matches!(
            Address::parse("invalid_address"),
            Err(AddressError::Bech32(_))
        ));
        assert!(matches!(
            Address::parse("terra1authorityaddress"),
            Err(AddressError::Bech32(_))
        ));
    }

    #[test]
    fn rejects_corrupted_checksum() {
        let addr = Address::from_bytes("terra", &[9u8; 20]).unwrap();
        let mut s = addr.as_str().to_string();
        let last = s.pop().unwrap();
        s.push(if last == 'q' { 'p' } else { 'q' });
        assert!(Address::parse(&s).is_err());
    }

    #[test]
    fn prefix_mismatch_is_reported() {
        let addr = Address::from_bytes("cosmos", &[1u8; 20]).unwrap();
        let err = Address::parse_with_prefix(addr.as_str(), "terra").unwrap_err();
        assert_eq!(
            err,
            AddressError::WrongPrefix {
                expected: "terra".into(),
                found: "cosmos".into()
            }
        );
    }

    #[test]
    fn length_bounds() {
        assert_eq!(Address::from_bytes("terra", &[]), Err(AddressError::Empty));
        assert_eq!(
            Address::from_bytes("terra", &[0u8; 256]),
            Err(AddressError::TooLong(256))
        );
        assert!(Address::from_bytes("terra", &[0u8; 32]).is_ok());
    }

    #[test]
    fn serde_as_string() {
        let addr = Address::from_bytes("terra", &[5u8; 20]).unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{addr}\""));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
        assert!(serde_json::from_str::<Address>("\"nope\"").is_err());
    }
}
