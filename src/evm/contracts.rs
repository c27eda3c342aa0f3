//! Contract ERC20 và xcvToken
//!
//! Dùng `Contract` động của ethers với ABI JSON tối giản.

use std::sync::Arc;

use ethers::abi::Abi;
use ethers::contract::Contract;
use ethers::providers::Middleware;
use ethers::types::{Address, TransactionReceipt, U256};
use tracing::{debug, info};

use crate::error::{Result, WalletError};

/// ABI ERC20 chỉ gồm các hàm đọc cần cho tổng hợp số dư
const ERC20_ABI: &str = r#"[
  {"constant":true,"inputs":[],"name":"name","outputs":[{"name":"","type":"string"}],"stateMutability":"view","type":"function"},
  {"constant":true,"inputs":[],"name":"symbol","outputs":[{"name":"","type":"string"}],"stateMutability":"view","type":"function"},
  {"constant":true,"inputs":[],"name":"decimals","outputs":[{"name":"","type":"uint8"}],"stateMutability":"view","type":"function"},
  {"constant":true,"inputs":[{"name":"owner","type":"address"}],"name":"balanceOf","outputs":[{"name":"","type":"uint256"}],"stateMutability":"view","type":"function"}
]"#;

/// ABI xcvToken trên Moonbase: ERC20 cộng mint/redeem
const XC_VTOKEN_ABI: &str = r#"[
  {"constant":true,"inputs":[],"name":"name","outputs":[{"name":"","type":"string"}],"stateMutability":"view","type":"function"},
  {"constant":true,"inputs":[],"name":"decimals","outputs":[{"name":"","type":"uint8"}],"stateMutability":"view","type":"function"},
  {"constant":true,"inputs":[{"name":"owner","type":"address"}],"name":"balanceOf","outputs":[{"name":"","type":"uint256"}],"stateMutability":"view","type":"function"},
  {"inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],"name":"mint","outputs":[],"stateMutability":"nonpayable","type":"function"},
  {"inputs":[{"name":"amount","type":"uint256"}],"name":"redeem","outputs":[],"stateMutability":"nonpayable","type":"function"}
]"#;

fn parse_abi(raw: &str) -> Result<Abi> {
    serde_json::from_str(raw).map_err(|e| WalletError::Provider(format!("Failed to parse ABI: {}", e)))
}

/// Token ERC20 chỉ đọc
pub struct Erc20Token<M> {
    contract: Contract<M>,
}

impl<M: Middleware + 'static> Erc20Token<M> {
    pub fn new(address: Address, client: Arc<M>) -> Result<Self> {
        let contract = Contract::new(address, parse_abi(ERC20_ABI)?, client);
        Ok(Self { contract })
    }

    pub fn address(&self) -> Address {
        self.contract.address()
    }

    pub async fn balance_of(&self, owner: Address) -> Result<U256> {
        debug!("Lấy số dư {:?} của {:?}", self.address(), owner);
        self.contract
            .method::<_, U256>("balanceOf", owner)
            .map_err(|e| WalletError::QueryFailed(format!("Failed to prepare balanceOf: {}", e)))?
            .call()
            .await
            .map_err(|e| WalletError::QueryFailed(format!("balanceOf failed: {}", e)))
    }

    pub async fn decimals(&self) -> Result<u8> {
        self.contract
            .method::<_, u8>("decimals", ())
            .map_err(|e| WalletError::QueryFailed(format!("Failed to prepare decimals: {}", e)))?
            .call()
            .await
            .map_err(|e| WalletError::QueryFailed(format!("decimals failed: {}", e)))
    }

    pub async fn name(&self) -> Result<String> {
        self.contract
            .method::<_, String>("name", ())
            .map_err(|e| WalletError::QueryFailed(format!("Failed to prepare name: {}", e)))?
            .call()
            .await
            .map_err(|e| WalletError::QueryFailed(format!("name failed: {}", e)))
    }
}

/// Contract xcvToken cho phép mint/redeem
pub struct XcVToken<M> {
    inner: Erc20Token<M>,
}

impl<M: Middleware + 'static> XcVToken<M> {
    pub fn new(address: Address, client: Arc<M>) -> Result<Self> {
        let contract = Contract::new(address, parse_abi(XC_VTOKEN_ABI)?, client);
        Ok(Self {
            inner: Erc20Token { contract },
        })
    }

    /// Mint `amount` cho `to`, chờ receipt
    pub async fn mint(&self, to: Address, amount: U256) -> Result<TransactionReceipt> {
        info!("Mint {} tại {:?} cho {:?}", amount, self.inner.address(), to);
        self.send("mint", (to, amount)).await
    }

    /// Redeem `amount`, chờ receipt
    pub async fn redeem(&self, amount: U256) -> Result<TransactionReceipt> {
        info!("Redeem {} tại {:?}", amount, self.inner.address());
        self.send("redeem", amount).await
    }

    async fn send<T: ethers::abi::Tokenize>(&self, function: &str, args: T) -> Result<TransactionReceipt> {
        let call = self
            .inner
            .contract
            .method::<_, ()>(function, args)
            .map_err(|e| WalletError::TransactionFailed(format!("Failed to prepare {}: {}", function, e)))?;
        let pending = call
            .send()
            .await
            .map_err(|e| WalletError::TransactionFailed(e.to_string()))?;
        pending
            .await
            .map_err(|e| WalletError::TransactionFailed(e.to_string()))?
            .ok_or_else(|| WalletError::TransactionFailed(format!("{} dropped from mempool", function)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abis_parse() {
        let erc20 = parse_abi(ERC20_ABI).unwrap();
        assert!(erc20.function("balanceOf").is_ok());
        let xc = parse_abi(XC_VTOKEN_ABI).unwrap();
        assert!(xc.function("mint").is_ok());
        assert!(xc.function("redeem").is_ok());
    }
}
