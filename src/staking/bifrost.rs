//! Mint / redeem vToken trên Bifrost
//!
//! Call được dựng thủ công theo vị trí pallet/call trong cấu hình rồi ký qua
//! bộ ký của extension. Không quản lý nonce, không thử lại.

use std::sync::Arc;

use codec::Encode;
use tracing::{error, info};

use crate::config::MintingCalls;
use crate::error::{Result, WalletError};
use crate::substrate::{SubmittedExtrinsic, SubstrateClient, SubstrateSession};
use crate::tokens::{parse_amount_u128, TokenKind, TokenSymbol};

/// Loại thao tác trên vToken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MintingAction {
    Mint,
    Redeem,
    QuickRedeem,
}

impl std::fmt::Display for MintingAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MintingAction::Mint => write!(f, "mint"),
            MintingAction::Redeem => write!(f, "redeem"),
            MintingAction::QuickRedeem => write!(f, "quick_redeem"),
        }
    }
}

/// Thao tác vToken trên một client Bifrost
pub struct BifrostStaking {
    client: Option<Arc<dyn SubstrateClient>>,
    calls: MintingCalls,
}

impl BifrostStaking {
    pub fn new(client: Option<Arc<dyn SubstrateClient>>, calls: MintingCalls) -> Self {
        Self { client, calls }
    }

    /// Dựng call đã mã hóa SCALE
    ///
    /// Mint dùng currency của token gốc; redeem dùng currency của vToken.
    pub fn encode_call(&self, action: MintingAction, symbol: TokenSymbol, amount: u128) -> Result<Vec<u8>> {
        let (currency_id, underlying_id) = match symbol.record().kind {
            TokenKind::BifrostVToken {
                currency_id,
                underlying_id,
            } => (currency_id, underlying_id),
            _ => return Err(WalletError::UnknownToken(format!("{} is not a Bifrost vToken", symbol))),
        };
        let (call_index, currency) = match action {
            MintingAction::Mint => (self.calls.mint, underlying_id),
            MintingAction::Redeem => (self.calls.redeem, currency_id),
            MintingAction::QuickRedeem => (self.calls.quick_redeem, currency_id),
        };

        let mut call = vec![self.calls.pallet_index, call_index];
        call.extend_from_slice(currency);
        call.extend(amount.encode());
        Ok(call)
    }

    pub async fn mint(&self, session: &SubstrateSession, symbol: TokenSymbol, amount: &str) -> Result<SubmittedExtrinsic> {
        self.submit(session, MintingAction::Mint, symbol, amount).await
    }

    pub async fn redeem(&self, session: &SubstrateSession, symbol: TokenSymbol, amount: &str) -> Result<SubmittedExtrinsic> {
        self.submit(session, MintingAction::Redeem, symbol, amount).await
    }

    pub async fn quick_redeem(
        &self,
        session: &SubstrateSession,
        symbol: TokenSymbol,
        amount: &str,
    ) -> Result<SubmittedExtrinsic> {
        self.submit(session, MintingAction::QuickRedeem, symbol, amount).await
    }

    async fn submit(
        &self,
        session: &SubstrateSession,
        action: MintingAction,
        symbol: TokenSymbol,
        amount: &str,
    ) -> Result<SubmittedExtrinsic> {
        let client = self.client.as_ref().ok_or(WalletError::ClientUnavailable)?;
        let signer = session
            .signer()
            .ok_or_else(|| WalletError::TransactionFailed("wallet extension cannot sign transactions".to_string()))?;
        let raw_amount = parse_amount_u128(amount, symbol.record().decimals)?;
        let call = self.encode_call(action, symbol, raw_amount)?;

        info!(%action, %symbol, amount, "Đang gửi giao dịch vToken");
        match client.submit_call(signer.as_ref(), &session.address, call).await {
            Ok(submitted) => {
                info!(%action, %symbol, hash = %submitted.hash, "Giao dịch vToken đã gửi");
                Ok(submitted)
            }
            Err(e) => {
                error!(%action, %symbol, "Giao dịch vToken thất bại: {}", e);
                Err(match e {
                    WalletError::TransactionFailed(_) | WalletError::UserRejected(_) => e,
                    other => WalletError::TransactionFailed(other.to_string()),
                })
            }
        }
    }
}
