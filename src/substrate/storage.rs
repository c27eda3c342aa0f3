//! Khóa storage và giải mã giá trị SCALE

use codec::{Decode, Encode};
use sp_core::crypto::{AccountId32, Ss58Codec};
use sp_crypto_hashing::{blake2_128, twox_128, twox_64};

use crate::error::{Result, WalletError};

/// Dữ liệu số dư của System.Account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Encode, Decode)]
pub struct AccountData {
    pub free: u128,
    pub reserved: u128,
    pub frozen: u128,
    pub flags: u128,
}

/// Giá trị của System.Account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Encode, Decode)]
pub struct AccountInfo {
    pub nonce: u32,
    pub consumers: u32,
    pub providers: u32,
    pub sufficients: u32,
    pub data: AccountData,
}

/// Giá trị của Tokens.Accounts (orml)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Encode, Decode)]
pub struct TokenAccountData {
    pub free: u128,
    pub reserved: u128,
    pub frozen: u128,
}

/// Phần thưởng staking theo tài khoản và currency
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Encode, Decode)]
pub struct StakingRewards {
    pub total_rewards: u128,
    pub claimed_rewards: u128,
}

/// Phân tích địa chỉ SS58
pub fn parse_account(address: &str) -> Result<AccountId32> {
    AccountId32::from_ss58check(address.trim())
        .map_err(|e| WalletError::InvalidAddress(format!("{}: {:?}", address, e)))
}

/// Tiền tố của một storage item
pub fn storage_prefix(pallet: &str, item: &str) -> Vec<u8> {
    let mut key = twox_128(pallet.as_bytes()).to_vec();
    key.extend_from_slice(&twox_128(item.as_bytes()));
    key
}

fn blake2_128_concat(data: &[u8]) -> Vec<u8> {
    let mut out = blake2_128(data).to_vec();
    out.extend_from_slice(data);
    out
}

fn twox_64_concat(data: &[u8]) -> Vec<u8> {
    let mut out = twox_64(data).to_vec();
    out.extend_from_slice(data);
    out
}

/// Khóa System.Account(account)
pub fn system_account_key(account: &AccountId32) -> Vec<u8> {
    let mut key = storage_prefix("System", "Account");
    key.extend(blake2_128_concat(account.as_ref()));
    key
}

/// Khóa của một double map (Blake2_128Concat account, Twox64Concat currency)
pub fn account_currency_key(pallet: &str, item: &str, account: &AccountId32, currency_id: &[u8]) -> Vec<u8> {
    let mut key = storage_prefix(pallet, item);
    key.extend(blake2_128_concat(account.as_ref()));
    key.extend(twox_64_concat(currency_id));
    key
}

/// Khóa Balances.TotalIssuance
pub fn total_issuance_key() -> Vec<u8> {
    storage_prefix("Balances", "TotalIssuance")
}

pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

pub fn from_hex(raw: &str) -> Result<Vec<u8>> {
    hex::decode(raw.trim_start_matches("0x"))
        .map_err(|e| WalletError::QueryFailed(format!("invalid hex {}: {}", raw, e)))
}

/// Giải mã giá trị storage; không có giá trị thì trả về mặc định
pub fn decode_or_default<T: Decode + Default>(raw: Option<&str>) -> Result<T> {
    match raw {
        None => Ok(T::default()),
        Some(hex) => {
            let bytes = from_hex(hex)?;
            T::decode(&mut bytes.as_slice())
                .map_err(|e| WalletError::QueryFailed(format!("SCALE decode failed: {}", e)))
        }
    }
}
