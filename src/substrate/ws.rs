//! Client Substrate qua JSON-RPC trên WebSocket
//!
//! Dùng transport `Ws` của ethers cho lời gọi request/response. Không dùng
//! subscription; số block được lấy bằng polling.

use std::sync::Arc;

use async_trait::async_trait;
use ethers::providers::{JsonRpcClient, Ws};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use sp_core::crypto::AccountId32;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::client::{SubmittedExtrinsic, SubstrateClient, SubstrateConnector};
use super::extension::{ExtrinsicSigner, SigningPayload};
use super::storage::{
    account_currency_key, decode_or_default, from_hex, system_account_key, to_hex, total_issuance_key,
    AccountInfo, StakingRewards, TokenAccountData,
};
use crate::config::BifrostConfig;
use crate::error::{Result, WalletError};

/// Tên pallet/item của các storage theo runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    pub tokens_pallet: String,
    pub rewards_pallet: String,
    pub rewards_item: String,
}

impl Default for StorageLayout {
    fn default() -> Self {
        Self::from(&BifrostConfig::default())
    }
}

impl From<&BifrostConfig> for StorageLayout {
    fn from(config: &BifrostConfig) -> Self {
        Self {
            tokens_pallet: config.tokens_pallet.clone(),
            rewards_pallet: config.rewards_pallet.clone(),
            rewards_item: config.rewards_item.clone(),
        }
    }
}

/// Connector mở kết nối WebSocket
#[derive(Debug, Clone, Default)]
pub struct WsConnector {
    layout: StorageLayout,
}

impl WsConnector {
    pub fn new(layout: StorageLayout) -> Self {
        Self { layout }
    }
}

#[async_trait]
impl SubstrateConnector for WsConnector {
    async fn connect(&self, endpoint: &str) -> Result<Arc<dyn SubstrateClient>> {
        debug!(endpoint, "Đang mở WebSocket");
        let ws = Ws::connect(endpoint).await.map_err(|e| WalletError::EndpointUnreachable {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        let client = WsSubstrateClient {
            endpoint: endpoint.to_string(),
            ws: RwLock::new(Some(ws)),
            layout: self.layout.clone(),
        };
        // Xác nhận node trả lời trước khi coi là kết nối thành công
        client.best_block_number().await.map_err(|e| WalletError::EndpointUnreachable {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        info!(endpoint, "Đã kết nối node Substrate");
        Ok(Arc::new(client))
    }
}

#[derive(Debug, Deserialize)]
struct Header {
    number: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RuntimeVersion {
    spec_version: u32,
    transaction_version: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeeInfo {
    partial_fee: Value,
}

/// Client sống tới một node Substrate
pub struct WsSubstrateClient {
    endpoint: String,
    ws: RwLock<Option<Ws>>,
    layout: StorageLayout,
}

impl WsSubstrateClient {
    async fn call<R: DeserializeOwned + Send>(&self, method: &str, params: Value) -> Result<R> {
        let ws = self
            .ws
            .read()
            .await
            .clone()
            .ok_or_else(|| WalletError::QueryFailed(format!("{} is disconnected", self.endpoint)))?;
        ws.request(method, params)
            .await
            .map_err(|e| WalletError::QueryFailed(format!("{}: {}", method, e)))
    }

    async fn storage(&self, key: Vec<u8>) -> Result<Option<String>> {
        self.call("state_getStorage", json!([to_hex(&key)])).await
    }

    async fn signing_payload(&self, address: &str, call: Vec<u8>) -> Result<SigningPayload> {
        let nonce: u64 = self.call("system_accountNextIndex", json!([address])).await?;
        let genesis: String = self.call("chain_getBlockHash", json!([0])).await?;
        let runtime: RuntimeVersion = self.call("state_getRuntimeVersion", json!([])).await?;
        let genesis_bytes = from_hex(&genesis)?;
        let genesis_hash: [u8; 32] = genesis_bytes
            .as_slice()
            .try_into()
            .map_err(|_| WalletError::QueryFailed(format!("invalid genesis hash {}", genesis)))?;
        Ok(SigningPayload {
            address: address.to_string(),
            call,
            nonce,
            genesis_hash,
            spec_version: runtime.spec_version,
            transaction_version: runtime.transaction_version,
        })
    }
}

fn parse_fee(raw: &Value) -> Option<u128> {
    match raw {
        Value::String(s) if s.starts_with("0x") => u128::from_str_radix(s.trim_start_matches("0x"), 16).ok(),
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64().map(u128::from),
        _ => None,
    }
}

#[async_trait]
impl SubstrateClient for WsSubstrateClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn free_balance(&self, account: &AccountId32) -> Result<u128> {
        let raw = self.storage(system_account_key(account)).await?;
        let info: AccountInfo = decode_or_default(raw.as_deref())?;
        Ok(info.data.free)
    }

    async fn token_balance(&self, account: &AccountId32, currency_id: &[u8]) -> Result<u128> {
        let key = account_currency_key(&self.layout.tokens_pallet, "Accounts", account, currency_id);
        let raw = self.storage(key).await?;
        let data: TokenAccountData = decode_or_default(raw.as_deref())?;
        Ok(data.free)
    }

    async fn staking_rewards(&self, account: &AccountId32, currency_id: &[u8]) -> Result<u128> {
        let key = account_currency_key(&self.layout.rewards_pallet, &self.layout.rewards_item, account, currency_id);
        let raw = self.storage(key).await?;
        let rewards: StakingRewards = decode_or_default(raw.as_deref())?;
        Ok(rewards.total_rewards)
    }

    async fn best_block_number(&self) -> Result<u64> {
        let header: Header = self.call("chain_getHeader", json!([])).await?;
        u64::from_str_radix(header.number.trim_start_matches("0x"), 16)
            .map_err(|e| WalletError::QueryFailed(format!("invalid block number {}: {}", header.number, e)))
    }

    async fn total_issuance(&self) -> Result<u128> {
        let raw = self.storage(total_issuance_key()).await?;
        decode_or_default(raw.as_deref())
    }

    async fn submit_call(
        &self,
        signer: &dyn ExtrinsicSigner,
        address: &str,
        call: Vec<u8>,
    ) -> Result<SubmittedExtrinsic> {
        let payload = self
            .signing_payload(address, call)
            .await
            .map_err(|e| WalletError::TransactionFailed(e.to_string()))?;
        let extrinsic = to_hex(&signer.sign(&payload).await?);

        let estimated_fee = match self.call::<FeeInfo>("payment_queryInfo", json!([extrinsic])).await {
            Ok(info) => parse_fee(&info.partial_fee),
            Err(e) => {
                warn!("Không ước tính được phí: {}", e);
                None
            }
        };
        if let Some(fee) = estimated_fee {
            info!(fee, "Phí ước tính");
        }

        let hash: String = self
            .call("author_submitExtrinsic", json!([extrinsic]))
            .await
            .map_err(|e| WalletError::TransactionFailed(e.to_string()))?;
        info!(%hash, "Đã gửi extrinsic");
        Ok(SubmittedExtrinsic { hash, estimated_fee })
    }

    async fn disconnect(&self) {
        if self.ws.write().await.take().is_some() {
            info!(endpoint = %self.endpoint, "Đã ngắt kết nối node Substrate");
        }
    }
}
