//! Đọc và chuyển mạng của ví EVM

use ethers::providers::JsonRpcError;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::injected::{InjectedProvider, UNRECOGNIZED_CHAIN, USER_REJECTED};
use crate::config::EvmConfig;
use crate::error::{Result, WalletError};

/// Đề xuất chuyển mạng khi ví đang ở chain khác chain mong đợi
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkSwitchOffer {
    pub current_chain_id: u64,
    pub expected_chain_id: u64,
}

/// Chuyển lỗi của ví sang lỗi của hub
pub fn wallet_error(err: JsonRpcError) -> WalletError {
    if err.code == USER_REJECTED {
        WalletError::UserRejected(err.message)
    } else {
        WalletError::Provider(format!("{} (code {})", err.message, err.code))
    }
}

/// Chain id hiện tại của ví
pub async fn read_chain_id(provider: &dyn InjectedProvider) -> Result<u64> {
    let raw = provider.request("eth_chainId", Value::Null).await.map_err(wallet_error)?;
    parse_chain_id(&raw)
}

fn parse_chain_id(raw: &Value) -> Result<u64> {
    match raw {
        Value::String(hex) => u64::from_str_radix(hex.trim_start_matches("0x"), 16)
            .map_err(|e| WalletError::Provider(format!("invalid chain id {}: {}", hex, e))),
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| WalletError::Provider(format!("invalid chain id {}", n))),
        other => Err(WalletError::Provider(format!("invalid chain id {}", other))),
    }
}

/// So sánh chain hiện tại với chain mong đợi
pub fn switch_offer(current_chain_id: u64, expected_chain_id: u64) -> Option<NetworkSwitchOffer> {
    (current_chain_id != expected_chain_id).then_some(NetworkSwitchOffer {
        current_chain_id,
        expected_chain_id,
    })
}

/// Yêu cầu ví chuyển sang chain trong cấu hình
///
/// Ví chưa biết chain (4902) thì thêm chain bằng đầy đủ tham số mạng.
pub async fn switch_network(provider: &dyn InjectedProvider, config: &EvmConfig) -> Result<()> {
    let params = json!([{ "chainId": config.chain_id_hex() }]);
    match provider.request("wallet_switchEthereumChain", params).await {
        Ok(_) => {
            info!("Đã chuyển ví sang {} ({})", config.chain_name, config.chain_id);
            Ok(())
        }
        Err(err) if err.code == UNRECOGNIZED_CHAIN => {
            warn!("Ví chưa biết chain {}, đang thêm chain", config.chain_id);
            provider
                .request("wallet_addEthereumChain", config.add_chain_params())
                .await
                .map_err(wallet_error)?;
            info!("Đã thêm {} vào ví", config.chain_name);
            Ok(())
        }
        Err(err) => Err(wallet_error(err)),
    }
}
