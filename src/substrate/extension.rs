//! Giao diện extension ví Substrate
//!
//! Extension cung cấp danh sách tài khoản và (tùy chọn) bộ ký extrinsic.
//! `WatchOnlyExtension` chỉ đọc địa chỉ từ cấu hình và không ký được.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Tài khoản do extension cung cấp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectedAccount {
    pub address: String,
    pub name: Option<String>,
}

/// Dữ liệu cần ký cho một extrinsic bất tử (immortal era)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningPayload {
    pub address: String,
    /// Call đã mã hóa SCALE
    pub call: Vec<u8>,
    pub nonce: u64,
    pub genesis_hash: [u8; 32],
    pub spec_version: u32,
    pub transaction_version: u32,
}

/// Bộ ký extrinsic của extension
///
/// Trả về extrinsic đã ký, mã hóa SCALE đầy đủ, sẵn sàng gửi lên node.
#[async_trait]
pub trait ExtrinsicSigner: Send + Sync {
    async fn sign(&self, payload: &SigningPayload) -> Result<Vec<u8>>;
}

/// Extension ví Substrate
#[async_trait]
pub trait SubstrateExtension: Send + Sync {
    /// Bật extension cho ứng dụng, trả về số extension đã bật
    async fn enable(&self, app_name: &str) -> Result<usize>;

    async fn accounts(&self) -> Result<Vec<InjectedAccount>>;

    fn signer(&self) -> Option<Arc<dyn ExtrinsicSigner>>;
}

/// Extension chỉ-xem với địa chỉ cấu hình sẵn
#[derive(Debug, Clone, Default)]
pub struct WatchOnlyExtension {
    accounts: Vec<InjectedAccount>,
}

impl WatchOnlyExtension {
    pub fn new<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let accounts = addresses
            .into_iter()
            .map(|address| InjectedAccount {
                address: address.into(),
                name: Some("watch-only".to_string()),
            })
            .collect();
        Self { accounts }
    }
}

#[async_trait]
impl SubstrateExtension for WatchOnlyExtension {
    async fn enable(&self, app_name: &str) -> Result<usize> {
        debug!("Bật extension chỉ-xem cho {}", app_name);
        Ok(1)
    }

    async fn accounts(&self) -> Result<Vec<InjectedAccount>> {
        Ok(self.accounts.clone())
    }

    fn signer(&self) -> Option<Arc<dyn ExtrinsicSigner>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_watch_only_has_no_signer() {
        let extension = WatchOnlyExtension::new(["5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY"]);
        assert_eq!(extension.enable("test").await.unwrap(), 1);
        assert_eq!(extension.accounts().await.unwrap().len(), 1);
        assert!(extension.signer().is_none());
    }
}
