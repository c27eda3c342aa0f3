//! Mint / redeem xcvToken trên Moonbase Alpha

use ethers::types::TxHash;
use tracing::{error, info};

use crate::config::MoonbaseConfig;
use crate::error::{Result, WalletError};
use crate::evm::{EvmClient, EvmSession, XcVToken};
use crate::tokens::{parse_amount, TokenSymbol, MOONBASE_CATALOG};

fn contract_for(session: &EvmSession, config: &MoonbaseConfig, symbol: TokenSymbol) -> Result<XcVToken<EvmClient>> {
    if !MOONBASE_CATALOG.contains(&symbol) {
        return Err(WalletError::UnknownToken(format!("{} is not a Moonbase token", symbol)));
    }
    if session.chain_id != config.chain_id {
        return Err(WalletError::TransactionFailed(format!(
            "wallet is on chain {}, Moonbase Alpha is {}",
            session.chain_id, config.chain_id
        )));
    }
    let address = config.contract(symbol).ok_or(WalletError::ContractNotConfigured(symbol))?;
    XcVToken::new(address, session.client.clone())
}

/// Mint xcvToken cho chính địa chỉ của phiên
pub async fn mint_xc_token(
    session: &EvmSession,
    config: &MoonbaseConfig,
    symbol: TokenSymbol,
    amount: &str,
) -> Result<TxHash> {
    let contract = contract_for(session, config, symbol)?;
    let value = parse_amount(amount, symbol.record().decimals)?;
    info!(%symbol, amount, "Đang mint xcvToken");
    let receipt = contract.mint(session.address, value).await.map_err(|e| {
        error!(%symbol, "Mint xcvToken thất bại: {}", e);
        e
    })?;
    Ok(receipt.transaction_hash)
}

/// Redeem xcvToken
pub async fn redeem_xc_token(
    session: &EvmSession,
    config: &MoonbaseConfig,
    symbol: TokenSymbol,
    amount: &str,
) -> Result<TxHash> {
    let contract = contract_for(session, config, symbol)?;
    let value = parse_amount(amount, symbol.record().decimals)?;
    info!(%symbol, amount, "Đang redeem xcvToken");
    let receipt = contract.redeem(value).await.map_err(|e| {
        error!(%symbol, "Redeem xcvToken thất bại: {}", e);
        e
    })?;
    Ok(receipt.transaction_hash)
}
