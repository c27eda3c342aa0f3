//! Bọc `InjectedProvider` thành `JsonRpcClient` của ethers
//!
//! Nhờ đó toàn bộ `Middleware` và `Contract` của ethers dùng được trên ví tiêm.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use ethers::providers::{JsonRpcClient, JsonRpcError, ProviderError, RpcError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use super::injected::InjectedProvider;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error(transparent)]
    Rpc(#[from] JsonRpcError),
    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl RpcError for TransportError {
    fn as_error_response(&self) -> Option<&JsonRpcError> {
        match self {
            TransportError::Rpc(err) => Some(err),
            _ => None,
        }
    }

    fn as_serde_error(&self) -> Option<&serde_json::Error> {
        match self {
            TransportError::Serde(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TransportError> for ProviderError {
    fn from(err: TransportError) -> Self {
        ProviderError::JsonRpcClientError(Box::new(err))
    }
}

/// Transport ethers chạy trên một `InjectedProvider`
#[derive(Clone)]
pub struct InjectedTransport {
    inner: Arc<dyn InjectedProvider>,
}

impl InjectedTransport {
    pub fn new(inner: Arc<dyn InjectedProvider>) -> Self {
        Self { inner }
    }
}

impl fmt::Debug for InjectedTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("InjectedTransport")
    }
}

#[async_trait]
impl JsonRpcClient for InjectedTransport {
    type Error = TransportError;

    async fn request<T, R>(&self, method: &str, params: T) -> Result<R, Self::Error>
    where
        T: fmt::Debug + Serialize + Send + Sync,
        R: DeserializeOwned + Send,
    {
        let params = serde_json::to_value(params)?;
        let result = self.inner.request(method, params).await?;
        Ok(serde_json::from_value(result)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evm::injected::{rpc_error, USER_REJECTED};
    use ethers::providers::{Middleware, Provider};
    use serde_json::{json, Value};

    struct FixedProvider;

    #[async_trait]
    impl InjectedProvider for FixedProvider {
        async fn request(&self, method: &str, _params: Value) -> Result<Value, JsonRpcError> {
            match method {
                "eth_blockNumber" => Ok(json!("0x10")),
                "eth_gasPrice" => Err(rpc_error(USER_REJECTED, "User rejected the request.")),
                _ => Err(rpc_error(-32601, "method not found")),
            }
        }
    }

    #[tokio::test]
    async fn test_middleware_over_injected_provider() {
        let provider = Provider::new(InjectedTransport::new(Arc::new(FixedProvider)));
        let block = provider.get_block_number().await.unwrap();
        assert_eq!(block.as_u64(), 16);

        let err = provider.get_gas_price().await.unwrap_err();
        assert_eq!(err.as_error_response().map(|e| e.code), Some(USER_REJECTED));
    }
}
