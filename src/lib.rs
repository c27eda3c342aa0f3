//! LSTfi Hub - lõi dashboard staking thanh khoản vToken
//!
//! Quản lý hai phiên ví độc lập (EVM và Substrate), tổng hợp số dư tài sản và
//! vToken, gửi giao dịch mint/redeem và gợi ý vToken theo hồ sơ người dùng.

// Re-export API công khai
pub use crate::aggregator::{AssetRefresher, AssetSnapshot, BalanceAggregator, BalanceEntry, VTokenReader};
pub use crate::config::{ConfigLoader, DashboardConfig};
pub use crate::error::{Result, SessionKind, WalletError};
pub use crate::recommend::{recommend, Recommendation, UserProfile};
pub use crate::session::{ConnectionManager, SessionState};
pub use crate::tokens::{StaticMarketTable, TokenSymbol};

pub mod aggregator;
pub mod config;
pub mod error;
pub mod evm;
pub mod gas;
pub mod monitor;
pub mod recommend;
pub mod session;
pub mod staking;
pub mod substrate;
pub mod tokens;

pub const APP_NAME: &str = "Bifrost LSTfi Hub";

/// Khởi tạo logging; `RUST_LOG` được ưu tiên hơn mức log trong cấu hình
pub fn init_logging(log_level: &str) -> anyhow::Result<()> {
    use anyhow::Context;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to set global default subscriber")?;
    tracing::debug!("Logging initialized at {} level", log_level);
    Ok(())
}
