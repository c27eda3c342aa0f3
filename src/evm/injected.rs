//! Giao diện provider được ví "tiêm" vào (EIP-1193)
//!
//! `InjectedProvider` là điểm nối duy nhất với ví EVM: mọi yêu cầu đều đi qua
//! `request(method, params)`. `LocalWalletProvider` là cài đặt dùng cho CLI,
//! chuyển tiếp lời gọi đọc tới node qua HTTP và tự ký giao dịch bằng khóa cục bộ.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, HttpClientError, JsonRpcClient, JsonRpcError, Middleware, Provider, RpcError};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::{Result, WalletError};

/// Người dùng từ chối yêu cầu
pub const USER_REJECTED: i64 = 4001;
/// Phương thức không được hỗ trợ
pub const UNSUPPORTED_METHOD: i64 = 4200;
/// Ví chưa biết chain được yêu cầu
pub const UNRECOGNIZED_CHAIN: i64 = 4902;

/// Provider EIP-1193
#[async_trait]
pub trait InjectedProvider: Send + Sync {
    async fn request(&self, method: &str, params: Value) -> std::result::Result<Value, JsonRpcError>;
}

/// Tạo lỗi RPC theo mã EIP-1193
pub fn rpc_error(code: i64, message: impl Into<String>) -> JsonRpcError {
    JsonRpcError {
        code,
        message: message.into(),
        data: None,
    }
}

/// Ví cục bộ đóng vai ví trình duyệt
pub struct LocalWalletProvider {
    http: Provider<Http>,
    signer: SignerMiddleware<Provider<Http>, LocalWallet>,
    chain_id: u64,
}

impl fmt::Debug for LocalWalletProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalWalletProvider")
            .field("address", &self.signer.address())
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

impl LocalWalletProvider {
    /// Tạo ví cục bộ từ RPC url và khóa riêng dạng hex
    pub fn new(rpc_url: &str, private_key: &str, chain_id: u64) -> Result<Self> {
        let http = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| WalletError::Config(format!("invalid RPC url {}: {}", rpc_url, e)))?;
        let wallet = LocalWallet::from_str(private_key.trim_start_matches("0x"))
            .map_err(|e| WalletError::Config(format!("invalid private key: {}", e)))?
            .with_chain_id(chain_id);
        info!("Tạo ví cục bộ {:?} trên chain {}", wallet.address(), chain_id);
        let signer = SignerMiddleware::new(http.clone(), wallet);
        Ok(Self { http, signer, chain_id })
    }

    pub fn into_shared(self) -> Arc<dyn InjectedProvider> {
        Arc::new(self)
    }

    async fn forward(&self, method: &str, params: Value) -> std::result::Result<Value, JsonRpcError> {
        let result = if params.is_null() {
            self.http.as_ref().request::<_, Value>(method, ()).await
        } else {
            self.http.as_ref().request::<_, Value>(method, params).await
        };
        result.map_err(|e| http_error(method, e))
    }

    async fn send_transaction(&self, params: Value) -> std::result::Result<Value, JsonRpcError> {
        let raw = params
            .get(0)
            .cloned()
            .ok_or_else(|| rpc_error(-32602, "missing transaction object"))?;
        let tx: TypedTransaction = serde_json::from_value(raw)
            .map_err(|e| rpc_error(-32602, format!("invalid transaction object: {}", e)))?;
        let pending = self
            .signer
            .send_transaction(tx, None)
            .await
            .map_err(|e| rpc_error(-32000, e.to_string()))?;
        let hash = pending.tx_hash();
        info!("Đã gửi giao dịch {:?}", hash);
        Ok(json!(hash))
    }
}

fn http_error(method: &str, err: HttpClientError) -> JsonRpcError {
    match err.as_error_response() {
        Some(response) => response.clone(),
        None => {
            warn!("Lỗi chuyển tiếp {}: {}", method, err);
            rpc_error(-32603, err.to_string())
        }
    }
}

#[async_trait]
impl InjectedProvider for LocalWalletProvider {
    async fn request(&self, method: &str, params: Value) -> std::result::Result<Value, JsonRpcError> {
        debug!(method, "Yêu cầu tới ví cục bộ");
        match method {
            "eth_accounts" | "eth_requestAccounts" => Ok(json!([self.signer.address()])),
            "eth_chainId" => Ok(json!(format!("{:#x}", self.chain_id))),
            "eth_sendTransaction" => self.send_transaction(params).await,
            "wallet_switchEthereumChain" => {
                let requested = params
                    .get(0)
                    .and_then(|p| p.get("chainId"))
                    .and_then(Value::as_str)
                    .and_then(|hex| u64::from_str_radix(hex.trim_start_matches("0x"), 16).ok());
                match requested {
                    Some(id) if id == self.chain_id => Ok(Value::Null),
                    _ => Err(rpc_error(UNRECOGNIZED_CHAIN, "Unrecognized chain ID")),
                }
            }
            "wallet_addEthereumChain" => Err(rpc_error(
                UNSUPPORTED_METHOD,
                "Local wallet is bound to a single RPC url",
            )),
            _ => self.forward(method, params).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    #[tokio::test]
    async fn test_local_wallet_accounts_and_chain() {
        let provider = LocalWalletProvider::new("http://127.0.0.1:8545", TEST_KEY, 11_155_111).unwrap();
        let accounts = provider.request("eth_requestAccounts", Value::Null).await.unwrap();
        assert_eq!(accounts.as_array().map(|a| a.len()), Some(1));
        let chain = provider.request("eth_chainId", Value::Null).await.unwrap();
        assert_eq!(chain, json!("0xaa36a7"));
    }

    #[tokio::test]
    async fn test_local_wallet_switch_chain() {
        let provider = LocalWalletProvider::new("http://127.0.0.1:8545", TEST_KEY, 11_155_111).unwrap();
        assert!(provider
            .request("wallet_switchEthereumChain", json!([{"chainId": "0xaa36a7"}]))
            .await
            .is_ok());
        let err = provider
            .request("wallet_switchEthereumChain", json!([{"chainId": "0x507"}]))
            .await
            .unwrap_err();
        assert_eq!(err.code, UNRECOGNIZED_CHAIN);
    }

    #[test]
    fn test_invalid_key_is_config_error() {
        let result = LocalWalletProvider::new("http://127.0.0.1:8545", "not-a-key", 1);
        assert!(matches!(result, Err(WalletError::Config(_))));
    }
}
