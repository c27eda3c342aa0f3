//! Client và connector cho chain Substrate

use std::sync::Arc;

use async_trait::async_trait;
use sp_core::crypto::AccountId32;

use super::extension::ExtrinsicSigner;
use crate::error::Result;

/// Kết quả gửi extrinsic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedExtrinsic {
    pub hash: String,
    /// Phí ước tính, `None` nếu node không trả lời được
    pub estimated_fee: Option<u128>,
}

/// Client sống tới một node Substrate
#[async_trait]
pub trait SubstrateClient: Send + Sync {
    fn endpoint(&self) -> &str;

    /// Số dư free của System.Account
    async fn free_balance(&self, account: &AccountId32) -> Result<u128>;

    /// Số dư free của một currency trong pallet Tokens
    async fn token_balance(&self, account: &AccountId32, currency_id: &[u8]) -> Result<u128>;

    /// Tổng phần thưởng staking của một currency
    async fn staking_rewards(&self, account: &AccountId32, currency_id: &[u8]) -> Result<u128>;

    async fn best_block_number(&self) -> Result<u64>;

    /// Tổng phát hành của token gốc
    async fn total_issuance(&self) -> Result<u128>;

    /// Ký (qua `signer`) và gửi một call đã mã hóa
    async fn submit_call(
        &self,
        signer: &dyn ExtrinsicSigner,
        address: &str,
        call: Vec<u8>,
    ) -> Result<SubmittedExtrinsic>;

    async fn disconnect(&self);
}

/// Tạo client tới một endpoint
#[async_trait]
pub trait SubstrateConnector: Send + Sync {
    async fn connect(&self, endpoint: &str) -> Result<Arc<dyn SubstrateClient>>;
}
