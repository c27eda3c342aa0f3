//! Tổng hợp số dư tài sản trên cả hai phiên
//!
//! Lỗi đọc riêng lẻ được ghi log và bản ghi bị bỏ qua. Kết quả luôn theo thứ tự
//! `ASSET_CATALOG`, không trùng ký hiệu; ký hiệu ngoài danh mục bị loại.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ethers::providers::Middleware;
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Result, WalletError};
use crate::evm::{Erc20Token, EvmSession};
use crate::session::ConnectionManager;
use crate::substrate::SubstrateSession;
use crate::tokens::{
    to_display_amount, u256_to_display_amount, ChainFamily, PriceSource, TokenKind, TokenSymbol, ASSET_CATALOG,
};

/// Một dòng số dư
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceEntry {
    pub symbol: TokenSymbol,
    pub chain: ChainFamily,
    pub balance: f64,
    pub value: f64,
}

/// Ảnh chụp tài sản tại một thời điểm
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetSnapshot {
    pub request_id: u64,
    pub taken_at: DateTime<Utc>,
    pub entries: Vec<BalanceEntry>,
}

impl AssetSnapshot {
    pub fn total_value(&self) -> f64 {
        self.entries.iter().map(|entry| entry.value).sum()
    }
}

/// Bộ tổng hợp số dư
pub struct BalanceAggregator {
    prices: Arc<dyn PriceSource>,
    erc20_tokens: Vec<TokenSymbol>,
}

impl BalanceAggregator {
    pub fn new(prices: Arc<dyn PriceSource>, erc20_tokens: Vec<TokenSymbol>) -> Self {
        Self { prices, erc20_tokens }
    }

    /// Tổng hợp từ các phiên hiện tại của manager
    pub async fn fetch_from(&self, manager: &ConnectionManager) -> Vec<BalanceEntry> {
        let evm = manager.evm_session().await;
        let substrate = manager.substrate_session().await;
        self.fetch_all_assets(evm.as_deref(), substrate.as_deref()).await
    }

    /// Đọc song song trên từng chain rồi ghép lại
    ///
    /// Phiên vắng mặt hoặc suy giảm không đóng góp gì.
    pub async fn fetch_all_assets(
        &self,
        evm: Option<&EvmSession>,
        substrate: Option<&SubstrateSession>,
    ) -> Vec<BalanceEntry> {
        let (evm_entries, substrate_entries) = tokio::join!(
            async {
                match evm {
                    Some(session) => self.fetch_evm(session).await,
                    None => Vec::new(),
                }
            },
            async {
                match substrate {
                    Some(session) => self.fetch_substrate(session).await.into_iter().collect(),
                    None => Vec::new(),
                }
            }
        );

        let mut by_symbol: HashMap<TokenSymbol, (f64, ChainFamily)> = HashMap::new();
        for (symbol, balance) in evm_entries.into_iter().chain(substrate_entries) {
            by_symbol.entry(symbol).or_insert((balance, symbol.record().chain));
        }

        let mut entries = Vec::with_capacity(by_symbol.len());
        for symbol in ASSET_CATALOG {
            if let Some((balance, chain)) = by_symbol.remove(&symbol) {
                let price = self.prices.price(symbol).await;
                entries.push(BalanceEntry {
                    symbol,
                    chain,
                    balance,
                    value: balance * price,
                });
            }
        }
        debug!("Tổng hợp được {} tài sản", entries.len());
        entries
    }

    async fn fetch_evm(&self, session: &EvmSession) -> Vec<(TokenSymbol, f64)> {
        let native = async {
            match session.client.get_balance(session.address, None).await {
                Ok(balance) => Some((TokenSymbol::Eth, u256_to_display_amount(balance, 18))),
                Err(e) => {
                    warn!(symbol = "ETH", "Không đọc được số dư: {}", e);
                    None
                }
            }
        };
        let tokens = join_all(self.erc20_tokens.iter().map(|symbol| self.fetch_erc20(session, *symbol)));

        let (native, tokens) = tokio::join!(native, tokens);
        native.into_iter().chain(tokens.into_iter().flatten()).collect()
    }

    async fn fetch_erc20(&self, session: &EvmSession, symbol: TokenSymbol) -> Option<(TokenSymbol, f64)> {
        match read_erc20(session, symbol).await {
            // Số dư 0 bị bỏ qua
            Ok(balance) if balance > 0.0 => Some((symbol, balance)),
            Ok(_) => None,
            Err(e) => {
                warn!(%symbol, "Không đọc được số dư: {}", e);
                None
            }
        }
    }

    async fn fetch_substrate(&self, session: &SubstrateSession) -> Option<(TokenSymbol, f64)> {
        let client = session.client.as_ref()?;
        match client.free_balance(&session.account).await {
            Ok(free) => Some((TokenSymbol::Dot, to_display_amount(free, TokenSymbol::Dot.record().decimals))),
            Err(e) => {
                warn!(symbol = "DOT", endpoint = client.endpoint(), "Không đọc được số dư: {}", e);
                None
            }
        }
    }
}

async fn read_erc20(session: &EvmSession, symbol: TokenSymbol) -> Result<f64> {
    let address = match symbol.record().kind {
        TokenKind::Erc20 { address } => address
            .parse()
            .map_err(|e| WalletError::InvalidAddress(format!("{}: {}", address, e)))?,
        _ => return Err(WalletError::UnknownToken(format!("{} is not an ERC20 token", symbol))),
    };
    let token = Erc20Token::new(address, session.client.clone())?;
    let (balance, decimals) = tokio::join!(token.balance_of(session.address), token.decimals());
    Ok(u256_to_display_amount(balance?, decimals?))
}
