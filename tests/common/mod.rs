//! Đồ giả dùng chung cho integration tests

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ethers::providers::JsonRpcError;
use mockall::mock;
use serde_json::Value;
use sp_core::crypto::AccountId32;

use lstfi_hub::config::{EvmConfig, SubstrateConfig};
use lstfi_hub::evm::InjectedProvider;
use lstfi_hub::session::{ConnectionManager, MemoryStore, SessionStore};
use lstfi_hub::substrate::{
    ExtrinsicSigner, InjectedAccount, SigningPayload, SubmittedExtrinsic, SubstrateClient, SubstrateConnector,
    SubstrateExtension,
};
use lstfi_hub::{Result, WalletError};

pub const EVM_ADDRESS: &str = "0x1111111111111111111111111111111111111111";
/// Alice
pub const SS58_ADDRESS: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";

mock! {
    pub Wallet {}

    #[async_trait]
    impl InjectedProvider for Wallet {
        async fn request(&self, method: &str, params: Value) -> std::result::Result<Value, JsonRpcError>;
    }
}

pub fn rpc_error(code: i64) -> JsonRpcError {
    lstfi_hub::evm::injected::rpc_error(code, format!("error {}", code))
}

/// Client Substrate giả: số dư theo currency id, currency nằm trong `failing` thì lỗi
#[derive(Default)]
pub struct FakeClient {
    pub endpoint: String,
    pub free: Option<u128>,
    pub tokens: HashMap<Vec<u8>, u128>,
    pub rewards: HashMap<Vec<u8>, u128>,
    pub failing: Vec<Vec<u8>>,
    pub submitted: Mutex<Vec<Vec<u8>>>,
    /// Extrinsic đã ký mà bộ ký trả về
    pub extrinsics: Mutex<Vec<Vec<u8>>>,
    pub disconnects: AtomicUsize,
    /// Độ trễ cho từng lần đọc System.Account, lấy theo thứ tự
    pub delays: Mutex<VecDeque<Duration>>,
}

impl FakeClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            ..Default::default()
        }
    }

    fn read(&self, table: &HashMap<Vec<u8>, u128>, currency_id: &[u8]) -> Result<u128> {
        if self.failing.iter().any(|id| id.as_slice() == currency_id) {
            return Err(WalletError::QueryFailed("storage read failed".to_string()));
        }
        Ok(table.get(currency_id).copied().unwrap_or(0))
    }
}

#[async_trait]
impl SubstrateClient for FakeClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn free_balance(&self, _account: &AccountId32) -> Result<u128> {
        let delay = self.delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.free
            .ok_or_else(|| WalletError::QueryFailed("System.Account unavailable".to_string()))
    }

    async fn token_balance(&self, _account: &AccountId32, currency_id: &[u8]) -> Result<u128> {
        self.read(&self.tokens, currency_id)
    }

    async fn staking_rewards(&self, _account: &AccountId32, currency_id: &[u8]) -> Result<u128> {
        self.read(&self.rewards, currency_id)
    }

    async fn best_block_number(&self) -> Result<u64> {
        Ok(1)
    }

    async fn total_issuance(&self) -> Result<u128> {
        Ok(0)
    }

    async fn submit_call(
        &self,
        signer: &dyn ExtrinsicSigner,
        address: &str,
        call: Vec<u8>,
    ) -> Result<SubmittedExtrinsic> {
        let payload = SigningPayload {
            address: address.to_string(),
            call: call.clone(),
            nonce: 0,
            genesis_hash: [0u8; 32],
            spec_version: 1,
            transaction_version: 1,
        };
        let extrinsic = signer.sign(&payload).await?;
        self.extrinsics.lock().unwrap().push(extrinsic);
        self.submitted.lock().unwrap().push(call);
        Ok(SubmittedExtrinsic {
            hash: "0xabc".to_string(),
            estimated_fee: None,
        })
    }

    async fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

/// Hành vi của một endpoint giả
#[derive(Clone)]
pub enum Endpoint {
    Up(Arc<FakeClient>),
    /// Mỗi lần kết nối mở một client mới
    Fresh,
    Down,
    Hang,
}

/// Connector ghi lại thứ tự endpoint được thử
#[derive(Default)]
pub struct ScriptedConnector {
    pub script: HashMap<String, Endpoint>,
    pub attempts: Mutex<Vec<String>>,
    /// Các client do `Endpoint::Fresh` mở ra
    pub opened: Mutex<Vec<Arc<FakeClient>>>,
}

impl ScriptedConnector {
    pub fn new(script: Vec<(&str, Endpoint)>) -> Self {
        Self {
            script: script.into_iter().map(|(url, e)| (url.to_string(), e)).collect(),
            attempts: Mutex::new(Vec::new()),
            opened: Mutex::new(Vec::new()),
        }
    }

    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn opened(&self) -> Vec<Arc<FakeClient>> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubstrateConnector for ScriptedConnector {
    async fn connect(&self, endpoint: &str) -> Result<Arc<dyn SubstrateClient>> {
        self.attempts.lock().unwrap().push(endpoint.to_string());
        match self.script.get(endpoint).cloned().unwrap_or(Endpoint::Down) {
            Endpoint::Up(client) => Ok(client),
            Endpoint::Fresh => {
                let client = Arc::new(FakeClient::new(endpoint));
                self.opened.lock().unwrap().push(client.clone());
                Ok(client)
            }
            Endpoint::Down => Err(WalletError::EndpointUnreachable {
                endpoint: endpoint.to_string(),
                reason: "connection refused".to_string(),
            }),
            Endpoint::Hang => std::future::pending().await,
        }
    }
}

/// Bộ ký giả, chỉ đếm số lần ký
#[derive(Default)]
pub struct CountingSigner {
    pub signed: AtomicUsize,
}

#[async_trait]
impl ExtrinsicSigner for CountingSigner {
    async fn sign(&self, payload: &SigningPayload) -> Result<Vec<u8>> {
        self.signed.fetch_add(1, Ordering::SeqCst);
        Ok(payload.call.clone())
    }
}

/// Extension có bộ ký
pub struct SigningExtension {
    pub address: String,
    pub signer: Arc<CountingSigner>,
}

impl SigningExtension {
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            signer: Arc::new(CountingSigner::default()),
        }
    }
}

#[async_trait]
impl SubstrateExtension for SigningExtension {
    async fn enable(&self, _app_name: &str) -> Result<usize> {
        Ok(1)
    }

    async fn accounts(&self) -> Result<Vec<InjectedAccount>> {
        Ok(vec![InjectedAccount {
            address: self.address.clone(),
            name: Some("test".to_string()),
        }])
    }

    fn signer(&self) -> Option<Arc<dyn ExtrinsicSigner>> {
        Some(self.signer.clone())
    }
}

/// Extension chỉ cấp tài khoản ở lần gọi đầu tiên
#[derive(Default)]
pub struct FlakyExtension {
    pub calls: AtomicUsize,
}

#[async_trait]
impl SubstrateExtension for FlakyExtension {
    async fn enable(&self, _app_name: &str) -> Result<usize> {
        Ok(1)
    }

    async fn accounts(&self) -> Result<Vec<InjectedAccount>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) > 0 {
            return Ok(Vec::new());
        }
        Ok(vec![InjectedAccount {
            address: SS58_ADDRESS.to_string(),
            name: None,
        }])
    }

    fn signer(&self) -> Option<Arc<dyn ExtrinsicSigner>> {
        None
    }
}

/// Ví trả lời các yêu cầu kết nối cơ bản
pub fn connected_wallet(chain_id: u64) -> MockWallet {
    let mut wallet = MockWallet::new();
    wallet.expect_request().returning(move |method, _params| match method {
        "eth_accounts" => Ok(serde_json::json!([EVM_ADDRESS])),
        "eth_chainId" => Ok(Value::String(format!("{:#x}", chain_id))),
        // 1 ETH
        "eth_getBalance" => Ok(Value::String("0xde0b6b3a7640000".to_string())),
        _ => Err(rpc_error(lstfi_hub::evm::injected::UNSUPPORTED_METHOD)),
    });
    wallet
}

pub fn substrate_config(endpoints: &[&str]) -> SubstrateConfig {
    SubstrateConfig {
        endpoints: endpoints.iter().map(|e| e.to_string()).collect(),
        ..SubstrateConfig::default()
    }
}

pub fn manager(
    connector: Arc<ScriptedConnector>,
    endpoints: &[&str],
    store: Arc<dyn SessionStore>,
) -> ConnectionManager {
    ConnectionManager::new(EvmConfig::default(), substrate_config(endpoints), connector, store)
}

pub fn memory_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}
