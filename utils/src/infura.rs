use std::time::Duration;

use alloy::primitives::Address;
use holdboard_common::{address_key, parse_address, parse_quantity, OwnerBalance, TokenId};
use serde::Deserialize;

use crate::{
    config::Config,
    credentials::InfuraCredentials,
    pagination::{Cursor, Page, PagedSource},
    Reqwest,
};

const BASE_URL: &str = "https://nft-api.infura.io";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfuraOwner {
    pub owner_of: String,
    pub amount: String,
}

#[derive(Debug, Deserialize)]
pub struct OwnersResponse {
    #[serde(default)]
    pub owners: Vec<InfuraOwner>,
    pub cursor: Option<String>,
}

impl OwnersResponse {
    fn into_page(self) -> crate::Result<Page<OwnerBalance>> {
        let records = self
            .owners
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

/// Infura NFT API, `owners` of a single token. Authenticated with basic auth.
// docs: https://docs.infura.io/api/infura-expansion-apis/nft-api/rest-apis/api-reference/get-owners-of-a-specific-token
pub struct Infura {
    chain_id: u64,
    contract: Address,
    token_id: TokenId,
    credentials: InfuraCredentials,
    timeout: Option<Duration>,
}

impl Infura {
    pub fn new(config: &Config, credentials: InfuraCredentials) -> Self {
        Self {
            chain_id: config.chain_id,
            contract: config.contract_address,
            token_id: config.token_id,
            credentials,
            timeout: config.request_timeout(),
        }
    }

    pub fn owners_url(&self) -> String {
        format!(
            "{BASE_URL}/networks/{}/nfts/{}/tokens/{}/owners",
            self.chain_id,
            address_key(&self.contract),
            self.token_id
        )
    }
}

impl PagedSource for Infura {
    type Record = OwnerBalance;
    const NAME: &'static str = "infura";

    async fn fetch_page(&self, cursor: Option<&Cursor>) -> crate::Result<Page<OwnerBalance>> {
        let mut request = Reqwest::get(self.owners_url())?
            .basic_auth(&self.credentials.project_id, &self.credentials.project_secret)
            .timeout(self.timeout);

        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor.as_str())]);
        }

        request.receive_json::<OwnersResponse>().await?.into_page()
    }
}
