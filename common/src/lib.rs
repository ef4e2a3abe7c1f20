pub mod error;
pub mod models;
pub mod token;

pub use error::Error;
pub use models::{address_key, rank, LeaderboardEntry, OwnerBalance, Snapshot, TransferEvent};
pub use token::{parse_address, parse_quantity, TokenId};

pub type Result<T> = std::result::Result<T, Error>;
