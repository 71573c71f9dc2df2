//! Balance Resolver
//!
//! Fetches each identity's peer reports and asset balances and reduces the
//! reports to a single balance status.

use futures::future::join_all;
use tracing::debug;

use wallet_core::{BalanceStatus, Identity, IdentitySummary, QuorumPolicy, WalletResult};
use wallet_node::NodeApi;

/// Resolve one identity; reports and asset balances are fetched concurrently
pub async fn resolve_identity<N>(
    node: &N,
    identity: Identity,
    policy: &QuorumPolicy,
) -> WalletResult<IdentitySummary>
where
    N: NodeApi + ?Sized,
{
    let (reports, assets) = futures::join!(
        node.balance_reports(&identity.address),
        node.asset_balances(&identity.address)
    );

    let reports = reports?;
    let balance = BalanceStatus::resolve(&reports, policy);
    debug!(
        "Resolved {} from {} peer reports: {}",
        identity.address,
        reports.len(),
        balance.label()
    );

    Ok(IdentitySummary {
        identity,
        balance,
        assets: assets?,
    })
}

/// Resolve every identity concurrently, keeping input order
pub async fn resolve_identities<N>(
    node: &N,
    identities: Vec<Identity>,
    policy: &QuorumPolicy,
) -> Vec<(Identity, WalletResult<IdentitySummary>)>
where
    N: NodeApi + ?Sized,
{
    let futures = identities.into_iter().map(move |identity| async move {
        let result = resolve_identity(node, identity.clone(), policy).await;
        (identity, result)
    });
    join_all(futures).await
}
