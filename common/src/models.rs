use alloy::{
    hex,
    primitives::{Address, U256},
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::{token::TokenId, Error};

/// Lower-case `0x` form used for every address we publish.
pub fn address_key(address: &Address) -> String {
    hex::encode_prefixed(address)
}

/// One movement of `amount` units of `token_id` from `from` to `to`.
///
/// `from == Address::ZERO` is a mint, `to == Address::ZERO` is a burn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferEvent {
    pub token_id: TokenId,
    pub from: Address,
    pub to: Address,
    pub amount: U256,
}

impl TransferEvent {
    pub fn is_mint(&self) -> bool {
        self.from == Address::ZERO
    }

    pub fn is_burn(&self) -> bool {
        self.to == Address::ZERO
    }
}

/// Current balance of one owner as reported by an ownership API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnerBalance {
    pub owner: Address,
    pub balance: U256,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub address: String,
    pub count: u64,
}

impl LeaderboardEntry {
    /// Builds an entry, failing if the count does not fit the published integer.
    pub fn new(address: &Address, count: U256) -> crate::Result<Self> {
        let address = address_key(address);
        let count = u64::try_from(count).map_err(|_| Error::CountOverflow {
            address: address.clone(),
            count: count.to_string(),
        })?;
        Ok(Self { address, count })
    }
}

/// Sorts by count, highest first. Equal counts keep their relative order.
pub fn rank(entries: &mut [LeaderboardEntry]) {
    entries.sort_by(|a, b| b.count.cmp(&a.count));
}

/// The published document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(with = "rfc3339_offset")]
    pub last_updated: DateTime<Utc>,
    pub leaderboard: Vec<LeaderboardEntry>,
}

impl Snapshot {
    /// Ranks the entries and stamps them with the current time.
    pub fn new(mut leaderboard: Vec<LeaderboardEntry>) -> Self {
        rank(&mut leaderboard);
        Self {
            last_updated: Utc::now(),
            leaderboard,
        }
    }

    pub fn last_updated_string(&self) -> String {
        self.last_updated.to_rfc3339_opts(SecondsFormat::Micros, false)
    }
}

/// `2024-05-01T12:00:00.000000+00:00`, an explicit offset rather than `Z`.
mod rfc3339_offset {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Micros, false))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    fn entry(address: &str, count: u64) -> LeaderboardEntry {
        LeaderboardEntry {
            address: address.to_string(),
            count,
        }
    }

    #[test]
    fn test_address_key_is_lowercase() {
        let addr = address!("0xc1374b803DFb1A9c87eaB9e76929222DBa3a8C39");
        assert_eq!(
            address_key(&addr),
            "0xc1374b803dfb1a9c87eab9e76929222dba3a8c39"
        );
    }

    #[test]
    fn test_rank_is_descending_and_stable() {
        let mut entries = vec![
            entry("0x01", 1),
            entry("0x02", 5),
            entry("0x03", 2),
            entry("0x04", 5),
            entry("0x05", 2),
        ];

        rank(&mut entries);

        let order: Vec<&str> = entries.iter().map(|e| e.address.as_str()).collect();
        assert_eq!(order, ["0x02", "0x04", "0x03", "0x05", "0x01"]);
    }

    #[test]
    fn test_entry_rejects_count_above_u64() {
        let result = LeaderboardEntry::new(&Address::ZERO, U256::from(u64::MAX) + U256::from(1));
        assert!(matches!(result, Err(Error::CountOverflow { .. })));
    }

    #[test]
    fn test_snapshot_json_shape() {
        let snapshot = Snapshot::new(vec![entry("0xaa", 1), entry("0xbb", 3)]);
        let value = serde_json::to_value(&snapshot).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 2);
        assert!(object["last_updated"].as_str().unwrap().ends_with("+00:00"));
        assert_eq!(object["leaderboard"][0]["address"], "0xbb");
        assert_eq!(object["leaderboard"][0]["count"], 3);

        let parsed: Snapshot = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.leaderboard, snapshot.leaderboard);
        assert_eq!(parsed.last_updated_string(), snapshot.last_updated_string());
    }

    #[test]
    fn test_mint_and_burn_flags() {
        let holder = address!("0x00000000000000000000000000000000000000aa");
        let mint = TransferEvent {
            token_id: TokenId::from(1u64),
            from: Address::ZERO,
            to: holder,
            amount: U256::from(1),
        };
        assert!(mint.is_mint());
        assert!(!mint.is_burn());
    }
}
