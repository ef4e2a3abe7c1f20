//! One run: fetch everything from the configured provider, reconcile it and
//! publish the snapshot.

use holdboard_common::{address_key, Snapshot};
use tracing::info;

use crate::{
    alchemy::Alchemy,
    config::{Config, ProviderKind},
    credentials::{env_lookup, ApiKey, InfuraCredentials},
    disk_storage::DiskStorageInterface,
    etherscan::Etherscan,
    infura::Infura,
    moralis::Moralis,
    network::Network,
    pagination::{collect_all, PagedSource, RetryPolicy},
    reconcile::{Reconcile, ReconcileRules},
    snapshot,
};

pub async fn run(config: &Config) -> crate::Result<Snapshot> {
    run_with_env(config, &env_lookup).await
}

/// Like [`run`], with credentials read through `lookup`. Credentials and the
/// chain are checked before the first request goes out.
pub async fn run_with_env<F>(config: &Config, lookup: &F) -> crate::Result<Snapshot>
where
    F: Fn(&str) -> Option<String>,
{
    config.validate()?;

    let chain = Network::from_chain_id(config.chain_id)
        .map(|network| network.to_string())
        .unwrap_or_else(|| format!("chain_id: {}", config.chain_id));
    info!(
        provider = %config.provider,
        %chain,
        contract = %address_key(&config.contract_address),
        token_id = %config.token_id,
        "Building leaderboard."
    );

    match config.provider {
        ProviderKind::Infura => {
            let source = Infura::new(config, InfuraCredentials::lookup(lookup)?);
            publish(&source, config).await
        }
        ProviderKind::Moralis => {
            let api_key = ApiKey::lookup(lookup, ApiKey::MORALIS_VAR, "moralis")?;
            publish(&Moralis::new(config, api_key), config).await
        }
        ProviderKind::Alchemy => {
            let api_key = ApiKey::lookup(lookup, ApiKey::ALCHEMY_VAR, "alchemy")?;
            publish(&Alchemy::new(config, api_key)?, config).await
        }
        ProviderKind::Etherscan => {
            let api_key = ApiKey::lookup(lookup, ApiKey::ETHERSCAN_VAR, "etherscan")?;
            publish(&Etherscan::new(config, api_key), config).await
        }
    }
}

/// Collects every page of `source`, turns the records into a ranked
/// leaderboard and writes it to `config.output`.
pub async fn publish<S>(source: &S, config: &Config) -> crate::Result<Snapshot>
where
    S: PagedSource + Sync,
    S::Record: Reconcile,
{
    let records = collect_all(source, &RetryPolicy::new(config.retry_attempts)).await?;
    let entries = <S::Record as Reconcile>::reconcile(records, &ReconcileRules::from(config))?;
    let snapshot = Snapshot::new(entries);

    snapshot::write(&snapshot, &config.output)?;
    info!(
        last_updated = %snapshot.last_updated_string(),
        "Successfully wrote {} entries to {}",
        snapshot.leaderboard.len(),
        config.output.display()
    );

    Ok(snapshot)
}
