use std::time::Duration;

use alloy::primitives::Address;
use holdboard_common::{address_key, parse_address, parse_quantity, OwnerBalance, TokenId};
use serde::Deserialize;

use crate::{
    config::Config,
    credentials::ApiKey,
    network::Network,
    pagination::{Cursor, Page, PagedSource},
    Reqwest,
};

const BASE_URL: &str = "https://deep-index.moralis.io/api/v2.2";

#[derive(Debug, Deserialize)]
pub struct MoralisOwner {
    pub owner_of: String,
    pub amount: String,
}

#[derive(Debug, Deserialize)]
pub struct OwnersResponse {
    pub result: Vec<MoralisOwner>,
    pub cursor: Option<String>,
}

impl OwnersResponse {
    fn into_page(self) -> crate::Result<Page<OwnerBalance>> {
        let records = self
            .result
            .into_iter()
            .map(|owner| -> crate::Result<OwnerBalance> {
                Ok(OwnerBalance {
                    owner: parse_address(&owner.owner_of)?,
                    balance: parse_quantity(&owner.amount)?,
                })
            })
            .collect::<crate::Result<Vec<_>>>()?;

        Ok(Page::new(records, Cursor::from_optional(self.cursor)))
    }
}

/// Moralis NFT API, owners of a single token. The key travels in `X-API-Key`.
// docs: https://docs.moralis.com/web3-data-api/evm/reference/get-nft-token-id-owners
pub struct Moralis {
    chain: String,
    contract: Address,
    token_id: TokenId,
    page_size: Option<u32>,
    api_key: ApiKey,
    timeout: Option<Duration>,
}

impl Moralis {
    pub fn new(config: &Config, api_key: ApiKey) -> Self {
        Self {
            chain: Network::moralis_chain(config.chain_id),
            contract: config.contract_address,
            token_id: config.token_id,
            page_size: config.page_size,
            api_key,
            timeout: config.request_timeout(),
        }
    }

    pub fn owners_url(&self) -> String {
        format!(
            "{BASE_URL}/nft/{}/{}/owners",
            address_key(&self.contract),
            self.token_id
        )
    }

    pub fn query(&self, cursor: Option<&Cursor>) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("chain", self.chain.clone()),
            ("format", "decimal".to_string()),
        ];
        if let Some(limit) = self.page_size {
            query.push(("limit", limit.to_string()));
        }
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor.as_str().to_string()));
        }
        query
    }
}

impl PagedSource for Moralis {
    type Record = OwnerBalance;
    const NAME: &'static str = "moralis";

    async fn fetch_page(&self, cursor: Option<&Cursor>) -> crate::Result<Page<OwnerBalance>> {
        Reqwest::get(self.owners_url())?
            .header("X-API-Key", self.api_key.as_str())
            .secret(self.api_key.as_str())
            .query(&self.query(cursor))
            .timeout(self.timeout)
            .receive_json::<OwnersResponse>()
            .await?
            .into_page()
    }
}
