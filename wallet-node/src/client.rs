//! Node API client
//!
//! Provides methods for reading wallet state from the node's HTTP API and for
//! submitting write requests (transfers, identities, peers, wallet security).

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;
use wallet_core::{
    AssetBalance, Identity, IssuedAsset, OrderLevel, OrderSide, Peer, PeerLimits, PeerReport,
    Transfer, WalletError, WalletResult,
};

use crate::api::{HistoryPage, NodeApi};
use crate::types::{
    classify_reply, parse_body, parse_bool_body, parse_encrypted_body, parse_integer_body,
    AssetTransferRequest, NodeReply, PeerLimitsResponse, QxOrderRequest, TransferRequest,
    NO_PASSWORD,
};
use crate::validate::{validate_amount, validate_asset_name, validate_identity, validate_seed};

/// Default address of a locally running node
pub const DEFAULT_NODE_URL: &str = "http://127.0.0.1:8080";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Node API client
#[derive(Clone)]
pub struct NodeClient {
    client: Client,
    base_url: Url,
}

impl NodeClient {
    /// Create a client for the node at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> WalletResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| WalletError::config(format!("Invalid node URL '{}': {}", base_url, e)))?;

        if base_url.cannot_be_a_base() {
            return Err(WalletError::config(format!(
                "Node URL cannot carry a path: {}",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WalletError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// Create a client for the default local node
    pub fn local() -> WalletResult<Self> {
        Self::new(DEFAULT_NODE_URL, Duration::from_millis(DEFAULT_TIMEOUT_MS))
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Build an endpoint URL; each segment is percent-encoded on its own
    fn endpoint(&self, segments: &[&str]) -> WalletResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| WalletError::config(format!("Node URL cannot carry a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET an endpoint and return the body text.
    ///
    /// `label` names the endpoint in logs and errors; segments may hold
    /// passwords and are never logged.
    async fn get_text(&self, label: &str, segments: &[&str]) -> WalletResult<String> {
        let url = self.endpoint(segments)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| WalletError::network(format!("Failed to reach node ({}): {}", label, e)))?;

        let status = response.status();

        if status.as_u16() == 429 {
            return Err(WalletError::rate_limited(format!("Too many requests ({})", label)));
        }

        if status.as_u16() == 404 {
            return Err(WalletError::not_found(format!("Node endpoint not found: {}", label)));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WalletError::api(format!(
                "Node API error ({}) on {}: {}",
                status, label, body
            )));
        }

        response
            .text()
            .await
            .map_err(|e| WalletError::network(format!("Failed to read {} response: {}", label, e)))
    }

    async fn get_json<T: DeserializeOwned>(&self, label: &str, segments: &[&str]) -> WalletResult<T> {
        let body = self.get_text(label, segments).await?;
        parse_body(label, &body)
    }

    async fn submit(&self, label: &str, segments: &[&str]) -> WalletResult<NodeReply> {
        let body = self.get_text(label, segments).await?;
        let reply = classify_reply(label, &body)?;
        info!("Node accepted {}: {}", label, reply.message);
        Ok(reply)
    }

    // ========================================================================
    // Chain State
    // ========================================================================

    /// Get the latest tick
    #[instrument(skip(self))]
    pub async fn latest_tick(&self) -> WalletResult<u64> {
        let body = self.get_text("tick", &["tick"]).await?;
        parse_integer_body("tick", &body)
    }

    /// Get the connected peers
    #[instrument(skip(self))]
    pub async fn peers(&self) -> WalletResult<Vec<Peer>> {
        let rows: Vec<Vec<String>> = self.get_json("peers", &["peers"]).await?;
        debug!("Node reports {} connected peers", rows.len());
        rows.iter().map(|row| Peer::from_row(row)).collect()
    }

    /// Get the peer connection limits
    #[instrument(skip(self))]
    pub async fn peer_limits(&self) -> WalletResult<PeerLimits> {
        let limits: PeerLimitsResponse = self.get_json("peers/limit", &["peers", "limit"]).await?;
        Ok(limits.to_peer_limits())
    }

    // ========================================================================
    // Identities & Balances
    // ========================================================================

    /// List wallet identities
    #[instrument(skip(self))]
    pub async fn identities(&self) -> WalletResult<Vec<Identity>> {
        let flat: Vec<String> = self.get_json("identities", &["identities"]).await?;
        Ok(Identity::from_flat(&flat))
    }

    /// Get the per-peer balance reports for an identity
    #[instrument(skip(self))]
    pub async fn balance_reports(&self, address: &str) -> WalletResult<Vec<PeerReport>> {
        let flat: Vec<String> = self.get_json("balance", &["balance", address]).await?;
        PeerReport::from_flat(&flat)
    }

    /// Get the asset balances held by an identity
    #[instrument(skip(self))]
    pub async fn asset_balances(&self, address: &str) -> WalletResult<Vec<AssetBalance>> {
        self.get_json("asset/balance", &["asset", "balance", address])
            .await
    }

    /// List issued assets with their issuers
    #[instrument(skip(self))]
    pub async fn issued_assets(&self) -> WalletResult<Vec<IssuedAsset>> {
        let flat: Vec<String> = self.get_json("asset/issued", &["asset", "issued"]).await?;
        Ok(IssuedAsset::from_flat(&flat))
    }

    /// Derive the public identity for a seed without storing it
    #[instrument(skip_all)]
    pub async fn identity_from_seed(&self, seed: &str) -> WalletResult<String> {
        validate_seed(seed)?;
        let body = self
            .get_text("identity/from_seed", &["identity", "from_seed", seed])
            .await?;
        let identity = body.trim().trim_matches('"').to_string();
        validate_identity(&identity)
            .map_err(|_| WalletError::api(format!("Unexpected identity from node: {}", identity)))?;
        Ok(identity)
    }

    // ========================================================================
    // History
    // ========================================================================

    /// List native transfers
    #[instrument(skip(self))]
    pub async fn transfers(&self, page: HistoryPage) -> WalletResult<Vec<Transfer>> {
        let [asc, limit, offset] = page.segments();
        self.get_json("transfer", &["transfer", &asc, &limit, &offset])
            .await
    }

    /// List asset transfers
    #[instrument(skip(self))]
    pub async fn asset_transfers(&self, page: HistoryPage) -> WalletResult<Vec<Transfer>> {
        let [asc, limit, offset] = page.segments();
        self.get_json("asset/transfer", &["asset", "transfer", &asc, &limit, &offset])
            .await
    }

    /// List QX orders placed by this wallet
    #[instrument(skip(self))]
    pub async fn qx_orders(&self, page: HistoryPage) -> WalletResult<Vec<Transfer>> {
        let [asc, limit, offset] = page.segments();
        self.get_json("qx/orders", &["qx", "orders", &asc, &limit, &offset])
            .await
    }

    // ========================================================================
    // Order Book
    // ========================================================================

    /// Get one side of an asset's order book
    #[instrument(skip(self))]
    pub async fn orderbook_side(
        &self,
        asset: &str,
        side: OrderSide,
        limit: u32,
        offset: u32,
    ) -> WalletResult<Vec<OrderLevel>> {
        validate_asset_name(asset)?;
        let limit = limit.to_string();
        let offset = offset.to_string();
        self.get_json(
            "qx/orderbook",
            &["qx", "orderbook", asset, side.as_path(), &limit, &offset],
        )
        .await
    }

    // ========================================================================
    // Wallet Security
    // ========================================================================

    /// Whether a master password has been set
    #[instrument(skip(self))]
    pub async fn wallet_is_encrypted(&self) -> WalletResult<bool> {
        let body = self
            .get_text("wallet/is_encrypted", &["wallet", "is_encrypted"])
            .await?;
        Ok(parse_encrypted_body(&body))
    }

    /// Whether the wallet is currently unlocked for signing
    #[instrument(skip(self))]
    pub async fn wallet_unlocked(&self) -> WalletResult<bool> {
        let body = self
            .get_text("wallet/unlocked", &["wallet", "unlocked"])
            .await?;
        parse_bool_body("wallet/unlocked", &body)
    }

    /// Set the master password (only allowed once)
    #[instrument(skip_all)]
    pub async fn set_master_password(&self, password: &str) -> WalletResult<NodeReply> {
        self.submit(
            "wallet/set_master_password",
            &["wallet", "set_master_password", password],
        )
        .await
    }

    /// Encrypt every stored seed under the master password
    #[instrument(skip_all)]
    pub async fn encrypt_wallet(&self, password: &str) -> WalletResult<NodeReply> {
        self.submit("wallet/encrypt", &["wallet", "encrypt", password])
            .await
    }

    /// Unlock the wallet for a limited time
    #[instrument(skip(self, password))]
    pub async fn unlock_wallet(&self, password: &str, duration: Duration) -> WalletResult<NodeReply> {
        let millis = duration.as_millis().to_string();
        self.submit("wallet/unlock", &["wallet", "unlock", password, &millis])
            .await
    }

    // ========================================================================
    // Identity Management
    // ========================================================================

    /// Create a random identity, encrypted when a password is given
    #[instrument(skip_all)]
    pub async fn create_identity(&self, password: Option<&str>) -> WalletResult<NodeReply> {
        let password = password.unwrap_or(NO_PASSWORD);
        self.submit("identity/new", &["identity", "new", password])
            .await
    }

    /// Import an identity from its seed
    #[instrument(skip_all)]
    pub async fn add_identity(&self, seed: &str, password: Option<&str>) -> WalletResult<NodeReply> {
        validate_seed(seed)?;
        match password {
            Some(password) => {
                self.submit("identity/add", &["identity", "add", seed, password])
                    .await
            }
            None => self.submit("identity/add", &["identity", "add", seed]).await,
        }
    }

    /// Remove an identity from the wallet
    #[instrument(skip(self, password))]
    pub async fn delete_identity(&self, identity: &str, password: Option<&str>) -> WalletResult<NodeReply> {
        validate_identity(identity)?;
        match password {
            Some(password) => {
                self.submit("identity/delete", &["identity", "delete", identity, password])
                    .await
            }
            None => {
                self.submit("identity/delete", &["identity", "delete", identity])
                    .await
            }
        }
    }

    // ========================================================================
    // Peer Management
    // ========================================================================

    /// Ask the node to connect to a peer (`ip:port`)
    #[instrument(skip(self))]
    pub async fn add_peer(&self, address: &str) -> WalletResult<NodeReply> {
        if address.trim().is_empty() {
            return Err(WalletError::validation("Peer address is required"));
        }
        self.submit("peers/add", &["peers", "add", address]).await
    }

    /// Disconnect and forget a peer
    #[instrument(skip(self))]
    pub async fn delete_peer(&self, peer_id: &str) -> WalletResult<NodeReply> {
        self.submit("peers/delete", &["peers", "delete", peer_id])
            .await
    }

    /// Update both peer limits
    #[instrument(skip(self))]
    pub async fn set_peer_limits(&self, limits: PeerLimits) -> WalletResult<()> {
        let limits = PeerLimits::new(limits.min, limits.max)?;
        let min = limits.min.to_string();
        let max = limits.max.to_string();
        self.submit("peers/limit/min", &["peers", "limit", "min", &min])
            .await?;
        self.submit("peers/limit/max", &["peers", "limit", "max", &max])
            .await?;
        Ok(())
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Sign and queue a native transfer; the reply carries the txid
    #[instrument(skip_all, fields(amount = request.amount, expiration = request.expiration_tick))]
    pub async fn transfer(&self, request: &TransferRequest) -> WalletResult<NodeReply> {
        validate_identity(&request.source)?;
        validate_identity(&request.destination)?;
        validate_amount(request.amount)?;

        let amount = request.amount.to_string();
        let expiration = request.expiration_tick.to_string();
        let password = request.password.as_deref().unwrap_or(NO_PASSWORD);

        self.submit(
            "transfer",
            &[
                "transfer",
                &request.source,
                &request.destination,
                &amount,
                &expiration,
                password,
            ],
        )
        .await
    }

    /// Sign and queue an asset transfer; the reply carries the txid
    #[instrument(skip_all, fields(asset = %request.asset, amount = request.amount))]
    pub async fn transfer_asset(&self, request: &AssetTransferRequest) -> WalletResult<NodeReply> {
        validate_asset_name(&request.asset)?;
        validate_identity(&request.issuer)?;
        validate_identity(&request.source)?;
        validate_identity(&request.destination)?;
        validate_amount(request.amount)?;

        let amount = request.amount.to_string();
        let expiration = request.expiration_tick.to_string();
        let password = request.password.as_deref().unwrap_or(NO_PASSWORD);

        self.submit(
            "asset/transfer",
            &[
                "asset",
                "transfer",
                &request.asset,
                &request.issuer,
                &request.source,
                &request.destination,
                &amount,
                &expiration,
                password,
            ],
        )
        .await
    }

    /// Sign and queue a QX order; the reply carries the txid
    #[instrument(skip_all, fields(asset = %request.asset, action = request.action.as_path()))]
    pub async fn place_order(&self, request: &QxOrderRequest) -> WalletResult<NodeReply> {
        validate_identity(&request.address)?;
        validate_identity(&request.issuer)?;
        validate_asset_name(&request.asset)?;
        validate_amount(request.amount)?;
        if request.price <= 0 {
            return Err(WalletError::validation("Order price must be positive"));
        }

        let tick = request.tick.to_string();
        let price = request.price.to_string();
        let amount = request.amount.to_string();
        let password = request.password.as_deref().unwrap_or(NO_PASSWORD);

        self.submit(
            "qx/order",
            &[
                "qx",
                "order",
                &tick,
                &request.issuer,
                &request.asset,
                request.action.as_path(),
                &request.address,
                &price,
                &amount,
                password,
            ],
        )
        .await
    }
}

#[async_trait]
impl NodeApi for NodeClient {
    async fn latest_tick(&self) -> WalletResult<u64> {
        NodeClient::latest_tick(self).await
    }

    async fn peers(&self) -> WalletResult<Vec<Peer>> {
        NodeClient::peers(self).await
    }

    async fn identities(&self) -> WalletResult<Vec<Identity>> {
        NodeClient::identities(self).await
    }

    async fn balance_reports(&self, address: &str) -> WalletResult<Vec<PeerReport>> {
        NodeClient::balance_reports(self, address).await
    }

    async fn asset_balances(&self, address: &str) -> WalletResult<Vec<AssetBalance>> {
        NodeClient::asset_balances(self, address).await
    }

    async fn issued_assets(&self) -> WalletResult<Vec<IssuedAsset>> {
        NodeClient::issued_assets(self).await
    }

    async fn transfers(&self, page: HistoryPage) -> WalletResult<Vec<Transfer>> {
        NodeClient::transfers(self, page).await
    }

    async fn asset_transfers(&self, page: HistoryPage) -> WalletResult<Vec<Transfer>> {
        NodeClient::asset_transfers(self, page).await
    }

    async fn qx_orders(&self, page: HistoryPage) -> WalletResult<Vec<Transfer>> {
        NodeClient::qx_orders(self, page).await
    }

    async fn orderbook_side(
        &self,
        asset: &str,
        side: OrderSide,
        limit: u32,
        offset: u32,
    ) -> WalletResult<Vec<OrderLevel>> {
        NodeClient::orderbook_side(self, asset, side, limit, offset).await
    }
}

impl std::fmt::Debug for NodeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> NodeClient {
        NodeClient::new(base, Duration::from_millis(500)).unwrap()
    }

    #[test]
    fn test_endpoint_building() {
        let c = client("http://127.0.0.1:8080");
        let url = c.endpoint(&["balance", "ABC"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/balance/ABC");

        let url = c.endpoint(&["peers", "add", "10.0.0.1:21841"]).unwrap();
        assert_eq!(url.path(), "/peers/add/10.0.0.1:21841");
    }

    #[test]
    fn test_endpoint_keeps_base_path_and_encodes_segments() {
        let c = client("http://node.local/api/");
        let url = c.endpoint(&["wallet", "encrypt", "p@ss/word"]).unwrap();
        assert_eq!(url.path(), "/api/wallet/encrypt/p@ss%2Fword");
    }

    #[test]
    fn test_order_side_segments() {
        let c = client("http://127.0.0.1:8080");
        let url = c
            .endpoint(&["qx", "orderbook", "QX", OrderSide::Bid.as_path(), "1000", "0"])
            .unwrap();
        assert_eq!(url.path(), "/qx/orderbook/QX/BID/1000/0");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            NodeClient::new("not a url", Duration::from_secs(1)),
            Err(WalletError::Config(_))
        ));
        assert!(matches!(
            NodeClient::new("mailto:someone@example.com", Duration::from_secs(1)),
            Err(WalletError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_writes_validate_before_sending() {
        // port 9 is never contacted: validation fails first
        let c = client("http://127.0.0.1:9");

        let err = c.add_identity("short", None).await.unwrap_err();
        assert!(matches!(err, WalletError::Validation(_)));

        let request = TransferRequest {
            source: "A".repeat(60),
            destination: "B".repeat(60),
            amount: 0,
            expiration_tick: 10,
            password: None,
        };
        let err = c.transfer(&request).await.unwrap_err();
        assert!(matches!(err, WalletError::Validation(_)));

        let err = c.set_peer_limits(PeerLimits { min: 5, max: 1 }).await.unwrap_err();
        assert!(matches!(err, WalletError::Validation(_)));

        let err = c.identity_from_seed("NOTASEED").await.unwrap_err();
        assert!(matches!(err, WalletError::Validation(_)));
    }

    #[tokio::test]
    async fn test_asset_transfer_validates_before_sending() {
        let c = client("http://127.0.0.1:9");
        let valid = AssetTransferRequest {
            asset: "QX".to_string(),
            issuer: "A".repeat(60),
            source: "B".repeat(60),
            destination: "C".repeat(60),
            amount: 3,
            expiration_tick: 110,
            password: None,
        };

        let too_long = AssetTransferRequest {
            asset: "NINECHARS".to_string(),
            ..valid.clone()
        };
        let err = c.transfer_asset(&too_long).await.unwrap_err();
        assert!(matches!(err, WalletError::Validation(_)));

        let bad_destination = AssetTransferRequest {
            destination: "short".to_string(),
            ..valid.clone()
        };
        let err = c.transfer_asset(&bad_destination).await.unwrap_err();
        assert!(matches!(err, WalletError::Validation(_)));

        let no_shares = AssetTransferRequest { amount: 0, ..valid.clone() };
        let err = c.transfer_asset(&no_shares).await.unwrap_err();
        assert!(matches!(err, WalletError::Validation(_)));

        // a well-formed request reaches the (absent) node
        let err = c.transfer_asset(&valid).await.unwrap_err();
        assert!(err.is_connectivity());
    }

    #[tokio::test]
    async fn test_unreachable_node_is_network_error() {
        let c = client("http://127.0.0.1:9");
        let err = c.latest_tick().await.unwrap_err();
        assert!(err.is_connectivity());
    }
}
