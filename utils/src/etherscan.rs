use std::time::Duration;

use alloy::primitives::Address;
use holdboard_common::{address_key, parse_address, parse_quantity, TransferEvent};
use serde::Deserialize;

use crate::{
    config::Config,
    credentials::ApiKey,
    pagination::{Cursor, Page, PagedSource},
    Reqwest,
};

const PROVIDER: &str = "etherscan";
const BASE_URL: &str = "https://api.etherscan.io/v2/api";
const DEFAULT_OFFSET: u32 = 1000;
/// Etherscan serves at most this many records of one query, whatever the page size.
const MAX_RESULT_WINDOW: u64 = 10_000;
const NO_TRANSACTIONS: &str = "No transactions found";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransfer {
    pub block_number: String,
    pub from: String,
    pub to: String,
    #[serde(rename = "tokenID")]
    pub token_id: String,
    pub token_value: String,
}

impl TokenTransfer {
    fn block(&self) -> crate::Result<u64> {
        self.block_number
            .parse()
            .map_err(|_| crate::Error::MalformedRecord {
                provider: PROVIDER,
                reason: format!("block number '{}' is not a number", self.block_number),
            })
    }

    fn into_event(self) -> crate::Result<TransferEvent> {
        Ok(TransferEvent {
            token_id: self.token_id.parse()?,
            from: parse_address(&self.from)?,
            to: parse_address(&self.to)?,
            amount: parse_quantity(&self.token_value)?,
        })
    }
}

/// `result` is a list on success and an explanation string otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TransfersResult {
    Transfers(Vec<TokenTransfer>),
    Message(String),
}

#[derive(Debug, Deserialize)]
pub struct TransfersResponse {
    pub status: String,
    pub message: String,
    pub result: TransfersResult,
}

/// Where the next request starts.
///
/// A window is one query from `start_block` onwards, walked page by page.
/// When a window is used up the next one starts at the block of its last
/// record, so the records of that block seen already are skipped.
/// Encoded in the cursor as `start_block:page:skip:tail_block:tail_len`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Position {
    start_block: u64,
    page: u32,
    /// Records at the head of the window returned by the previous window.
    skip: u64,
    /// Block of the last record seen in this window.
    tail_block: u64,
    /// How many records of this window sit in `tail_block`.
    tail_len: u64,
}

impl Position {
    const FIRST: Position = Position {
        start_block: 0,
        page: 1,
        skip: 0,
        tail_block: 0,
        tail_len: 0,
    };

    fn from_cursor(cursor: Option<&Cursor>) -> crate::Result<Self> {
        let Some(cursor) = cursor else {
            return Ok(Self::FIRST);
        };
        let malformed = || crate::Error::MalformedRecord {
            provider: PROVIDER,
            reason: format!("page cursor '{}' is not a block position", cursor.as_str()),
        };

        let fields = cursor
            .as_str()
            .split(':')
            .map(|field| field.parse::<u64>().map_err(|_| malformed()))
            .collect::<crate::Result<Vec<_>>>()?;
        let [start_block, page, skip, tail_block, tail_len] = fields[..] else {
            return Err(malformed());
        };
        let page = u32::try_from(page)
            .ok()
            .filter(|page| *page > 0)
            .ok_or_else(malformed)?;

        Ok(Self {
            start_block,
            page,
            skip,
            tail_block,
            tail_len,
        })
    }

    fn cursor(&self) -> Option<Cursor> {
        Cursor::new(format!(
            "{}:{}:{}:{}:{}",
            self.start_block, self.page, self.skip, self.tail_block, self.tail_len
        ))
    }

    fn see_block(&mut self, block: u64) {
        if self.tail_len > 0 && self.tail_block == block {
            self.tail_len += 1;
        } else {
            self.tail_block = block;
            self.tail_len = 1;
        }
    }
}

/// Etherscan v2 `token1155tx`, paged by page number inside block windows.
// docs: https://docs.etherscan.io/etherscan-v2/api-endpoints/accounts#get-a-list-of-erc1155-token-transfer-events-by-address
pub struct Etherscan {
    chain_id: u64,
    contract: Address,
    offset: u32,
    window: u64,
    api_key: ApiKey,
    timeout: Option<Duration>,
}

impl Etherscan {
    pub fn new(config: &Config, api_key: ApiKey) -> Self {
        Self {
            chain_id: config.chain_id,
            contract: config.contract_address,
            offset: config.page_size.unwrap_or(DEFAULT_OFFSET),
            window: MAX_RESULT_WINDOW,
            api_key,
            timeout: config.request_timeout(),
        }
    }

    fn query(&self, position: &Position) -> Vec<(&'static str, String)> {
        vec![
            ("chainid", self.chain_id.to_string()),
            ("module", "account".to_string()),
            ("action", "token1155tx".to_string()),
            ("contractaddress", address_key(&self.contract)),
            ("startblock", position.start_block.to_string()),
            ("sort", "asc".to_string()),
            ("page", position.page.to_string()),
            ("offset", self.offset.to_string()),
            ("apikey", self.api_key.as_str().to_string()),
        ]
    }

    fn pages_per_window(&self) -> u64 {
        self.window
            .checked_div(u64::from(self.offset))
            .unwrap_or(1)
            .max(1)
    }

    /// Position after a full page: the next page of this window, or the
    /// first page of a window starting at the last block seen.
    fn next_position(&self, seen: Position) -> crate::Result<Position> {
        if u64::from(seen.page) < self.pages_per_window() {
            return Ok(Position {
                page: seen.page + 1,
                ..seen
            });
        }
        if seen.tail_block == seen.start_block {
            return Err(crate::Error::ProviderRejected {
                provider: PROVIDER,
                message: format!(
                    "block {} holds more than {} transfers, paging cannot move past it",
                    seen.start_block, self.window
                ),
            });
        }
        Ok(Position {
            start_block: seen.tail_block,
            page: 1,
            skip: seen.tail_len,
            tail_block: 0,
            tail_len: 0,
        })
    }

    /// A full page may be followed by another one, a short page is the last.
    fn page_from_response(
        &self,
        position: Position,
        response: TransfersResponse,
    ) -> crate::Result<Page<TransferEvent>> {
        let transfers = match response.result {
            TransfersResult::Transfers(transfers) => transfers,
            TransfersResult::Message(message) => {
                return Err(crate::Error::ProviderRejected {
                    provider: PROVIDER,
                    message: format!("{} ({message})", response.message),
                })
            }
        };

        if response.status != "1" {
            if response.message.starts_with(NO_TRANSACTIONS) {
                return Ok(Page::new(Vec::new(), None));
            }
            return Err(crate::Error::ProviderRejected {
                provider: PROVIDER,
                message: response.message,
            });
        }

        let full = transfers.len() as u64 >= u64::from(self.offset);
        let first_index = u64::from(position.page - 1) * u64::from(self.offset);
        let mut seen = position;
        let mut records = Vec::with_capacity(transfers.len());
        for (index, transfer) in (first_index..).zip(transfers) {
            seen.see_block(transfer.block()?);
            if index >= position.skip {
                records.push(transfer.into_event()?);
            }
        }

        let next = if full {
            self.next_position(seen)?.cursor()
        } else {
            None
        };
        Ok(Page::new(records, next))
    }
}

impl PagedSource for Etherscan {
    type Record = TransferEvent;
    const NAME: &'static str = PROVIDER;

    async fn fetch_page(&self, cursor: Option<&Cursor>) -> crate::Result<Page<TransferEvent>> {
        let position = Position::from_cursor(cursor)?;

        let response = Reqwest::get(BASE_URL)?
            .secret(self.api_key.as_str())
            .query(&self.query(&position))
            .timeout(self.timeout)
            .receive_json::<TransfersResponse>()
            .await?;

        self.page_from_response(position, response)
    }
}
