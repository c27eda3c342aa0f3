//! Số dư xcvToken trên Moonbase Alpha

use std::sync::Arc;

use ethers::types::Address;
use futures::future::join_all;
use serde::Serialize;
use tracing::warn;

use crate::config::MoonbaseConfig;
use crate::error::Result;
use crate::evm::{Erc20Token, EvmSession};
use crate::tokens::{u256_to_display_amount, PriceSource, TokenSymbol, MOONBASE_CATALOG};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XcTokenBalance {
    pub symbol: TokenSymbol,
    pub name: String,
    pub contract: Option<Address>,
    pub decimals: u8,
    pub balance: f64,
    pub price: f64,
    pub value: f64,
}

impl XcTokenBalance {
    fn zero(symbol: TokenSymbol, contract: Option<Address>, price: f64) -> Self {
        let record = symbol.record();
        Self {
            symbol,
            name: record.name.to_string(),
            contract,
            decimals: record.decimals,
            balance: 0.0,
            price,
            value: 0.0,
        }
    }
}

/// Đọc số dư từng xcvToken; lỗi hoặc contract chưa cấu hình cho ra bản ghi 0
pub async fn fetch_moonbase_balances(
    session: &EvmSession,
    config: &MoonbaseConfig,
    prices: &Arc<dyn PriceSource>,
) -> Vec<XcTokenBalance> {
    join_all(MOONBASE_CATALOG.iter().map(|symbol| async move {
        let symbol = *symbol;
        let price = prices.price(symbol).await;
        let contract = config.contract(symbol);
        let Some(address) = contract else {
            return XcTokenBalance::zero(symbol, None, price);
        };
        match read_xc_token(session, address).await {
            Ok((name, decimals, balance)) => XcTokenBalance {
                symbol,
                name,
                contract,
                decimals,
                balance,
                price,
                value: balance * price,
            },
            Err(e) => {
                warn!(%symbol, "Không đọc được số dư xcvToken, dùng 0: {}", e);
                XcTokenBalance::zero(symbol, contract, price)
            }
        }
    }))
    .await
}

async fn read_xc_token(session: &EvmSession, address: Address) -> Result<(String, u8, f64)> {
    let token = Erc20Token::new(address, session.client.clone())?;
    let (balance, decimals, name) = tokio::join!(token.balance_of(session.address), token.decimals(), token.name());
    let decimals = decimals?;
    Ok((name?, decimals, u256_to_display_amount(balance?, decimals)))
}
