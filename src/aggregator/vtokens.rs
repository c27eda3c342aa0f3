//! Số dư vToken trên Bifrost
//!
//! Khác với tổng hợp tài sản, mỗi lần đọc con thất bại đều thành 0 và token
//! không bao giờ bị bỏ khỏi kết quả.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use sp_core::crypto::AccountId32;
use tracing::{debug, warn};

use crate::substrate::SubstrateClient;
use crate::tokens::{
    to_display_amount, ChainFamily, MarketDataSource, PriceSource, TokenKind, TokenSymbol, VTOKEN_CATALOG,
};

/// Số dư một vToken
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VTokenBalance {
    pub symbol: TokenSymbol,
    pub underlying: &'static str,
    pub chain: ChainFamily,
    /// Số dư khả dụng, đơn vị hiển thị
    pub available: f64,
    /// Phần thưởng staking, đơn vị hiển thị
    pub rewards: f64,
    pub apy: f64,
    pub price: f64,
    pub value: f64,
    pub color: &'static str,
}

impl VTokenBalance {
    pub fn total(&self) -> f64 {
        self.available + self.rewards
    }
}

/// Đọc số dư vToken trên một client Bifrost
pub struct VTokenReader {
    prices: Arc<dyn PriceSource>,
    market: Arc<dyn MarketDataSource>,
}

impl VTokenReader {
    pub fn new(prices: Arc<dyn PriceSource>, market: Arc<dyn MarketDataSource>) -> Self {
        Self { prices, market }
    }

    /// Mỗi vToken trong danh mục đúng một bản ghi, theo thứ tự danh mục
    pub async fn fetch_vtoken_balances(
        &self,
        client: &dyn SubstrateClient,
        account: &AccountId32,
    ) -> Vec<VTokenBalance> {
        debug!(endpoint = client.endpoint(), "Đang đọc số dư vToken");
        join_all(VTOKEN_CATALOG.iter().map(|symbol| self.fetch_one(client, account, *symbol))).await
    }

    async fn fetch_one(&self, client: &dyn SubstrateClient, account: &AccountId32, symbol: TokenSymbol) -> VTokenBalance {
        let record = symbol.record();
        let currency_id: &[u8] = match record.kind {
            TokenKind::BifrostVToken { currency_id, .. } => currency_id,
            _ => &[],
        };

        let (available, rewards, price) = tokio::join!(
            client.token_balance(account, currency_id),
            client.staking_rewards(account, currency_id),
            self.prices.price(symbol),
        );
        let available = available.unwrap_or_else(|e| {
            warn!(%symbol, "Không đọc được số dư, dùng 0: {}", e);
            0
        });
        let rewards = rewards.unwrap_or_else(|e| {
            warn!(%symbol, "Không đọc được phần thưởng, dùng 0: {}", e);
            0
        });

        let total = to_display_amount(available.saturating_add(rewards), record.decimals);
        VTokenBalance {
            symbol,
            underlying: record.underlying,
            chain: record.chain,
            available: to_display_amount(available, record.decimals),
            rewards: to_display_amount(rewards, record.decimals),
            apy: self.market.market_data(symbol).map(|data| data.apy).unwrap_or(0.0),
            price,
            value: total * price,
            color: record.color,
        }
    }
}
