use std::fmt::Display;

/// Chains we know the provider-specific names for.
#[derive(Clone, Debug, PartialEq)]
pub struct Network {
    pub name: &'static str,
    pub chain_id: u64,
    pub name_alchemy: &'static str,
}

impl Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (chain_id: {})", self.name, self.chain_id)
    }
}

const NETWORKS: &[Network] = &[
    Network {
        name: "Ethereum",
        chain_id: 1,
        name_alchemy: "eth-mainnet",
    },
    Network {
        name: "OP Mainnet",
        chain_id: 10,
        name_alchemy: "opt-mainnet",
    },
    Network {
        name: "Polygon",
        chain_id: 137,
        name_alchemy: "polygon-mainnet",
    },
    Network {
        name: "Base",
        chain_id: 8453,
        name_alchemy: "base-mainnet",
    },
    Network {
        name: "Arbitrum One",
        chain_id: 42161,
        name_alchemy: "arb-mainnet",
    },
    Network {
        name: "Base Sepolia",
        chain_id: 84532,
        name_alchemy: "base-sepolia",
    },
    Network {
        name: "Sepolia",
        chain_id: 11155111,
        name_alchemy: "eth-sepolia",
    },
];

impl Network {
    pub fn from_chain_id(chain_id: u64) -> Option<&'static Network> {
        NETWORKS.iter().find(|network| network.chain_id == chain_id)
    }

    /// Alchemy subdomain for a chain, an explicit override wins.
    pub fn alchemy_name(chain_id: u64, name_override: Option<&str>) -> crate::Result<String> {
        if let Some(name) = name_override {
            return Ok(name.to_string());
        }

        Self::from_chain_id(chain_id)
            .map(|network| network.name_alchemy.to_string())
            .ok_or(crate::Error::UnsupportedChain {
                provider: "alchemy",
                chain_id,
            })
    }

    /// Moralis takes the chain id as a hex string, so every chain works.
    pub fn moralis_chain(chain_id: u64) -> String {
        format!("0x{chain_id:x}")
    }
}
