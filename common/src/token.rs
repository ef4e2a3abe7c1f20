//! Integer parsing for the values providers hand us as strings.
//!
//! Token ids and quantities show up as decimal strings from some providers and
//! as `0x` hex strings from others. Everything is converted to `U256` at the
//! boundary and compared as integers afterwards.

use std::{fmt::Display, str::FromStr};

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Parses a decimal or `0x`-prefixed hex string into a `U256`.
///
/// Returns `None` for empty input, signs, whitespace or digits outside the radix.
fn parse_u256(s: &str) -> Option<U256> {
    let (digits, radix) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (s, 10),
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }

    U256::from_str_radix(digits, radix as u64).ok()
}

/// Parses a provider quantity (balance or transfer amount).
pub fn parse_quantity(s: &str) -> crate::Result<U256> {
    parse_u256(s.trim()).ok_or_else(|| Error::InvalidQuantity(s.to_string()))
}

/// Parses an address, accepting any letter case.
pub fn parse_address(s: &str) -> crate::Result<Address> {
    s.trim()
        .parse::<Address>()
        .map_err(|_| Error::InvalidAddress(s.to_string()))
}

/// Canonical token identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenId(pub U256);

impl TokenId {
    pub fn new(value: U256) -> Self {
        Self(value)
    }
}

impl FromStr for TokenId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_u256(s.trim())
            .map(TokenId)
            .ok_or_else(|| Error::InvalidTokenId(s.to_string()))
    }
}

impl From<U256> for TokenId {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl From<u64> for TokenId {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

// Decimal, which is the form the NFT APIs put in their URL paths.
impl Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for TokenId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Accepts a decimal or hex string, or a plain non-negative integer.
impl<'de> Deserialize<'de> for TokenId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_any(TokenIdVisitor)
    }
}

struct TokenIdVisitor;

impl serde::de::Visitor<'_> for TokenIdVisitor {
    type Value = TokenId;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("a token id as a decimal or 0x-prefixed hex string, or an integer")
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<TokenId, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<TokenId, E> {
        Ok(TokenId::from(v))
    }

    fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<TokenId, E> {
        u64::try_from(v)
            .map(TokenId::from)
            .map_err(|_| E::custom(Error::InvalidTokenId(v.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEPLOYED_TOKEN_ID: &str =
        "233135866589270025735431199023256918527023659760796851524427037696933759150";

    #[test]
    fn test_token_id_decimal_and_hex_agree() {
        let decimal: TokenId = "255".parse().unwrap();
        let hex: TokenId = "0xff".parse().unwrap();
        let padded_hex: TokenId =
            "0x00000000000000000000000000000000000000000000000000000000000000FF"
                .parse()
                .unwrap();

        assert_eq!(decimal, hex);
        assert_eq!(decimal, padded_hex);
        assert_eq!(decimal, TokenId::from(255u64));
    }

    #[test]
    fn test_large_token_id_round_trips_through_display() {
        let token_id: TokenId = DEPLOYED_TOKEN_ID.parse().unwrap();
        assert_eq!(token_id.to_string(), DEPLOYED_TOKEN_ID);

        let as_hex = format!("0x{:x}", token_id.0);
        assert_eq!(as_hex.parse::<TokenId>().unwrap(), token_id);
    }

    #[test]
    fn test_token_id_rejects_garbage() {
        for bad in ["", "0x", "-1", "12a", "0xzz", "1 2"] {
            assert_eq!(
                bad.parse::<TokenId>(),
                Err(Error::InvalidTokenId(bad.to_string())),
                "input {bad:?}"
            );
        }
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("0x1").unwrap(), U256::from(1));
        assert_eq!(parse_quantity("12").unwrap(), U256::from(12));
        assert_eq!(parse_quantity(" 7 ").unwrap(), U256::from(7));
        assert!(parse_quantity("1.5").is_err());
        assert!(parse_quantity("").is_err());
    }

    #[test]
    fn test_parse_address_any_case() {
        let lower = parse_address("0xc1374b803dfb1a9c87eab9e76929222dba3a8c39").unwrap();
        let checksum = parse_address("0xc1374b803DFb1A9c87eaB9e76929222DBa3a8C39").unwrap();
        assert_eq!(lower, checksum);
        assert!(parse_address("0x1234").is_err());
    }

    #[test]
    fn test_token_id_serde_accepts_hex_and_writes_decimal() {
        let token_id: TokenId = serde_json::from_str("\"0x10\"").unwrap();
        assert_eq!(token_id, TokenId::from(16u64));
        assert_eq!(serde_json::to_string(&token_id).unwrap(), "\"16\"");
    }

    #[test]
    fn test_token_id_deserializes_from_integers() {
        let token_id: TokenId = serde_json::from_str("42").unwrap();
        assert_eq!(token_id, TokenId::from(42u64));

        assert!(serde_json::from_str::<TokenId>("-1").is_err());
        assert!(serde_json::from_str::<TokenId>("1.5").is_err());
    }
}
