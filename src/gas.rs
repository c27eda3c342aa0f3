//! Giá gas của phiên EVM

use ethers::providers::Middleware;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Result, WalletError};
use crate::evm::EvmSession;
use crate::tokens::u256_to_display_amount;

pub const STANDARD_RATIO: f64 = 0.8;
pub const SLOW_RATIO: f64 = 0.6;

/// Các mức giá gas, đơn vị gwei
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GasPrices {
    pub current: f64,
    pub fast: f64,
    pub standard: f64,
    pub slow: f64,
}

impl GasPrices {
    /// Dựng các mức từ giá hiện tại và max fee EIP-1559 (nếu có)
    pub fn from_fees(current: f64, max_fee: Option<f64>) -> Self {
        let fast = max_fee.unwrap_or(current);
        Self {
            current,
            fast,
            standard: fast * STANDARD_RATIO,
            slow: fast * SLOW_RATIO,
        }
    }
}

pub async fn fetch_gas_prices(session: &EvmSession) -> Result<GasPrices> {
    let (gas_price, fees) = tokio::join!(
        session.client.get_gas_price(),
        session.client.estimate_eip1559_fees(None)
    );
    let current = gas_price.map_err(|e| WalletError::QueryFailed(format!("eth_gasPrice: {}", e)))?;
    let max_fee = match fees {
        Ok((max_fee, _priority)) => Some(u256_to_display_amount(max_fee, 9)),
        Err(e) => {
            warn!("Chain không hỗ trợ EIP-1559, dùng giá gas hiện tại: {}", e);
            None
        }
    };
    let prices = GasPrices::from_fees(u256_to_display_amount(current, 9), max_fee);
    debug!(?prices, "Giá gas");
    Ok(prices)
}
