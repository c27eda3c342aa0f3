//! Các error type của hub
//!
//! Chỉ lỗi khi thiết lập phiên và lỗi giao dịch là thực sự ngoại lệ với người dùng.
//! Lỗi trên đường đọc dữ liệu được xử lý tại chỗ (trả về 0 hoặc bỏ qua bản ghi).

use std::time::Duration;
use thiserror::Error;

use crate::tokens::TokenSymbol;

/// Họ chain mà một phiên ví thuộc về
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKind {
    Evm,
    Substrate,
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Evm => write!(f, "EVM"),
            Self::Substrate => write!(f, "Substrate"),
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum WalletError {
    #[error("No injected EVM wallet provider found, install one from {0}")]
    ProviderMissing(String),
    #[error("No Substrate wallet extension found, install one from {0}")]
    ExtensionMissing(String),
    #[error("Request rejected by user: {0}")]
    UserRejected(String),
    #[error("Wallet extension exposes no accounts")]
    NoAccounts,
    #[error("Endpoint {endpoint} unreachable: {reason}")]
    EndpointUnreachable { endpoint: String, reason: String },
    #[error("Endpoint {endpoint} timed out after {timeout:?}")]
    EndpointTimeout { endpoint: String, timeout: Duration },
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),
    #[error("{0} session is not connected")]
    NotConnected(SessionKind),
    #[error("Substrate session has no live client (degraded connection)")]
    ClientUnavailable,
    #[error("Unknown token symbol: {0}")]
    UnknownToken(String),
    #[error("Contract address for {0} is not configured")]
    ContractNotConfigured(TokenSymbol),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Provider error: {0}")]
    Provider(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Config error: {0}")]
    Config(String),
}

impl WalletError {
    /// Lỗi có thể do người dùng thử lại thủ công hay không
    pub fn is_user_retryable(&self) -> bool {
        matches!(
            self,
            WalletError::UserRejected(_)
                | WalletError::TransactionFailed(_)
                | WalletError::EndpointUnreachable { .. }
                | WalletError::EndpointTimeout { .. }
        )
    }

    /// Lỗi thiếu phần mềm ví, không thể khắc phục trong ứng dụng
    pub fn is_missing_wallet(&self) -> bool {
        matches!(self, WalletError::ProviderMissing(_) | WalletError::ExtensionMissing(_))
    }
}

impl From<anyhow::Error> for WalletError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(wallet_err) = err.downcast_ref::<WalletError>() {
            return wallet_err.clone();
        }
        WalletError::Provider(format!("{:#}", err))
    }
}

pub type Result<T> = std::result::Result<T, WalletError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anyhow_roundtrip_keeps_variant() {
        let err = anyhow::Error::new(WalletError::NoAccounts);
        assert!(matches!(WalletError::from(err), WalletError::NoAccounts));

        let other = anyhow::anyhow!("socket closed");
        match WalletError::from(other) {
            WalletError::Provider(msg) => assert!(msg.contains("socket closed")),
            e => panic!("Sai loại lỗi: {:?}", e),
        }
    }

    #[test]
    fn test_error_classification() {
        assert!(WalletError::UserRejected("4001".into()).is_user_retryable());
        assert!(!WalletError::NoAccounts.is_user_retryable());
        assert!(WalletError::ProviderMissing("https://metamask.io".into()).is_missing_wallet());
    }
}
