pub mod alchemy;
pub mod config;
pub mod credentials;
pub mod disk_storage;
pub mod error;
pub mod etherscan;
pub mod infura;
pub mod log;
pub mod moralis;
pub mod network;
pub mod pagination;
pub mod pipeline;
pub mod reconcile;
pub mod reqwest;
pub mod serde;
pub mod snapshot;

pub use error::{Result, UtilsError as Error};

pub use reqwest::Reqwest;
