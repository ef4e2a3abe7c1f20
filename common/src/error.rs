use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("Token id '{0}' is not a decimal or 0x-prefixed hex integer.")]
    InvalidTokenId(String),

    #[error("Quantity '{0}' is not a non-negative decimal or 0x-prefixed hex integer.")]
    InvalidQuantity(String),

    #[error("Address '{0}' is not a valid Ethereum address.")]
    InvalidAddress(String),

    #[error("Holder {address} has a count of {count} which does not fit in 64 bits.")]
    CountOverflow { address: String, count: String },
}
