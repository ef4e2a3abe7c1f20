use std::time::Duration;

use alloy::primitives::{Address, U256};
use holdboard_common::{address_key, parse_address, parse_quantity, TokenId, TransferEvent};
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    credentials::ApiKey,
    network::Network,
    pagination::{Cursor, Page, PagedSource},
    Reqwest,
};

const PROVIDER: &str = "alchemy";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferCategory {
    Erc1155,
    Erc721,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTransfersParams {
    pub from_block: &'static str,
    pub to_block: &'static str,
    pub contract_addresses: Vec<String>,
    pub category: Vec<TransferCategory>,
    pub order: &'static str,
    pub with_metadata: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_count: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<P> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'static str,
    pub params: [P; 1],
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse<T> {
    pub result: Option<T>,
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Erc1155Metadata {
    pub token_id: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTransfer {
    pub from: String,
    pub to: Option<String>,
    pub erc1155_metadata: Option<Vec<Erc1155Metadata>>,
    pub erc721_token_id: Option<String>,
    pub token_id: Option<String>,
}

impl AssetTransfer {
    /// A batch transfer carries several (token, value) pairs and becomes one event per pair.
    fn into_events(self) -> crate::Result<Vec<TransferEvent>> {
        let from = parse_address(&self.from)?;
        let to = match self.to.as_deref() {
            Some(to) => parse_address(to)?,
            None => {
                return Err(crate::Error::MalformedRecord {
                    provider: PROVIDER,
                    reason: format!("transfer from {} has no recipient", address_key(&from)),
                })
            }
        };

        if let Some(metadata) = self.erc1155_metadata {
            return metadata
                .into_iter()
                .map(|entry| -> crate::Result<TransferEvent> {
                    Ok(TransferEvent {
                        token_id: entry.token_id.parse()?,
                        from,
                        to,
                        amount: parse_quantity(&entry.value)?,
                    })
                })
                .collect();
        }

        // ERC-721 transfers move exactly one unit.
        let token_id: TokenId = self
            .erc721_token_id
            .or(self.token_id)
            .ok_or_else(|| crate::Error::MalformedRecord {
                provider: PROVIDER,
                reason: format!(
                    "transfer from {} to {} has no token id",
                    address_key(&from),
                    address_key(&to)
                ),
            })?
            .parse()?;

        Ok(vec![TransferEvent {
            token_id,
            from,
            to,
            amount: U256::from(1),
        }])
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTransfersResult {
    pub transfers: Vec<AssetTransfer>,
    pub page_key: Option<String>,
}

impl AssetTransfersResult {
    fn into_page(self) -> crate::Result<Page<TransferEvent>> {
        let mut records = Vec::with_capacity(self.transfers.len());
        for transfer in self.transfers {
            records.extend(transfer.into_events()?);
        }
        Ok(Page::new(records, Cursor::from_optional(self.page_key)))
    }
}

/// Alchemy Transfers API. The key is part of the URL path.
// docs: https://docs.alchemy.com/reference/alchemy-getassettransfers
pub struct Alchemy {
    network: String,
    contract: Address,
    categories: Vec<TransferCategory>,
    page_size: Option<u32>,
    api_key: ApiKey,
    timeout: Option<Duration>,
}

impl Alchemy {
    pub fn new(config: &Config, api_key: ApiKey) -> crate::Result<Self> {
        Ok(Self {
            network: Network::alchemy_name(config.chain_id, config.alchemy_network.as_deref())?,
            contract: config.contract_address,
            categories: config.alchemy_categories.clone(),
            page_size: config.page_size,
            api_key,
            timeout: config.request_timeout(),
        })
    }

    pub fn url(&self) -> String {
        format!(
            "https://{}.g.alchemy.com/v2/{}",
            self.network,
            self.api_key.as_str()
        )
    }

    pub fn request(&self, cursor: Option<&Cursor>) -> JsonRpcRequest<AssetTransfersParams> {
        JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "alchemy_getAssetTransfers",
            params: [AssetTransfersParams {
                from_block: "0x0",
                to_block: "latest",
                contract_addresses: vec![address_key(&self.contract)],
                category: self.categories.clone(),
                order: "asc",
                with_metadata: false,
                max_count: self.page_size.map(|size| format!("0x{size:x}")),
                page_key: cursor.map(|cursor| cursor.as_str().to_string()),
            }],
        }
    }
}

fn into_result<T>(response: JsonRpcResponse<T>) -> crate::Result<T> {
    if let Some(error) = response.error {
        return Err(crate::Error::ProviderRejected {
            provider: PROVIDER,
            message: format!("{} (code {})", error.message, error.code),
        });
    }
    response.result.ok_or_else(|| crate::Error::ProviderRejected {
        provider: PROVIDER,
        message: "response has neither result nor error".to_string(),
    })
}

impl PagedSource for Alchemy {
    type Record = TransferEvent;
    const NAME: &'static str = PROVIDER;

    async fn fetch_page(&self, cursor: Option<&Cursor>) -> crate::Result<Page<TransferEvent>> {
        let response = Reqwest::post(self.url())?
            .secret(self.api_key.as_str())
            .json_body(&self.request(cursor))
            .timeout(self.timeout)
            .receive_json::<JsonRpcResponse<AssetTransfersResult>>()
            .await?;

        into_result(response)?.into_page()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serde::parse_with_path;
    use alloy::primitives::address;

    const FIXTURE: &str = r#"{
        "jsonrpc": "2.0",
        "id": 1,
        "result": {
            "transfers": [
                {
                    "blockNum": "0x1046c5d",
                    "uniqueId": "0xabc:log:0",
                    "hash": "0xabc",
                    "from": "0x0000000000000000000000000000000000000000",
                    "to": "0x00000000000000000000000000000000000000aa",
                    "value": null,
                    "erc721TokenId": null,
                    "erc1155Metadata": [
                        { "tokenId": "0x2a", "value": "0x5" },
                        { "tokenId": "0x2b", "value": "0x1" }
                    ],
                    "tokenId": null,
                    "asset": null,
                    "category": "erc1155",
                    "rawContract": {
                        "value": null,
                        "address": "0xc1374b803dfb1a9c87eab9e76929222dba3a8c39",
                        "decimal": null
                    }
                },
                {
                    "blockNum": "0x1046c60",
                    "from": "0x00000000000000000000000000000000000000aa",
                    "to": "0x00000000000000000000000000000000000000bb",
                    "erc721TokenId": "0x000000000000000000000000000000000000000000000000000000000000002a",
                    "erc1155Metadata": null,
                    "category": "erc721"
                }
            ],
            "pageKey": "e8f1b6a3-4d2c-4c8e-9d3b-1f0e2a7c5b94"
        }
    }"#;

    const A: Address = address!("0x00000000000000000000000000000000000000aa");
    const B: Address = address!("0x00000000000000000000000000000000000000bb");

    fn alchemy(page_size: Option<u32>) -> Alchemy {
        let config = Config {
            page_size,
            ..Config::default()
        };
        Alchemy::new(&config, ApiKey("topsecret".to_string())).unwrap()
    }

    #[test]
    fn test_request_body() {
        let cursor = Cursor::new("next-key").unwrap();
        let body = serde_json::to_value(alchemy(Some(1000)).request(Some(&cursor))).unwrap();

        assert_eq!(body["method"], "alchemy_getAssetTransfers");
        let params = &body["params"][0];
        assert_eq!(params["fromBlock"], "0x0");
        assert_eq!(params["toBlock"], "latest");
        assert_eq!(
            params["contractAddresses"][0],
            "0xc1374b803dfb1a9c87eab9e76929222dba3a8c39"
        );
        assert_eq!(params["category"], serde_json::json!(["erc1155"]));
        assert_eq!(params["order"], "asc");
        assert_eq!(params["withMetadata"], false);
        assert_eq!(params["maxCount"], "0x3e8");
        assert_eq!(params["pageKey"], "next-key");
    }

    #[test]
    fn test_first_request_has_no_page_key() {
        let body = serde_json::to_value(alchemy(None).request(None)).unwrap();
        let params = body["params"][0].as_object().unwrap();
        assert!(!params.contains_key("pageKey"));
        assert!(!params.contains_key("maxCount"));
    }

    #[test]
    fn test_url_uses_network_name() {
        assert_eq!(
            alchemy(None).url(),
            "https://base-mainnet.g.alchemy.com/v2/topsecret"
        );
    }

    #[test]
    fn test_batch_transfers_are_flattened() {
        let response: JsonRpcResponse<AssetTransfersResult> = parse_with_path(FIXTURE).unwrap();
        let page = into_result(response).unwrap().into_page().unwrap();

        assert_eq!(
            page.next.unwrap().as_str(),
            "e8f1b6a3-4d2c-4c8e-9d3b-1f0e2a7c5b94"
        );
        assert_eq!(
            page.records,
            [
                TransferEvent {
                    token_id: TokenId::from(42u64),
                    from: Address::ZERO,
                    to: A,
                    amount: U256::from(5),
                },
                TransferEvent {
                    token_id: TokenId::from(43u64),
                    from: Address::ZERO,
                    to: A,
                    amount: U256::from(1),
                },
                TransferEvent {
                    token_id: TokenId::from(42u64),
                    from: A,
                    to: B,
                    amount: U256::from(1),
                },
            ]
        );
    }

    #[test]
    fn test_json_rpc_error_is_a_rejection() {
        let response: JsonRpcResponse<AssetTransfersResult> = parse_with_path(
            r#"{
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": -32600, "message": "Must be authenticated!" }
            }"#,
        )
        .unwrap();

        let err = into_result(response).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::ProviderRejected { ref message, .. } if message.contains("authenticated")
        ));
    }

    #[test]
    fn test_transfer_without_token_id_is_malformed() {
        let transfer = AssetTransfer {
            from: "0x00000000000000000000000000000000000000aa".to_string(),
            to: Some("0x00000000000000000000000000000000000000bb".to_string()),
            erc1155_metadata: None,
            erc721_token_id: None,
            token_id: None,
        };
        assert!(matches!(
            transfer.into_events(),
            Err(crate::Error::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_unknown_chain_needs_network_override() {
        let config = Config {
            chain_id: 999_999,
            ..Config::default()
        };
        let err = Alchemy::new(&config, ApiKey("k".to_string())).err().unwrap();
        assert!(err.is_config());

        let config = Config {
            chain_id: 999_999,
            alchemy_network: Some("zora-mainnet".to_string()),
            ..Config::default()
        };
        assert_eq!(
            Alchemy::new(&config, ApiKey("k".to_string())).unwrap().url(),
            "https://zora-mainnet.g.alchemy.com/v2/k"
        );
    }
}
