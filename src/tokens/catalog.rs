//! Danh mục token tĩnh
//!
//! Tập ký hiệu là đóng: mọi ký hiệu lạ bị từ chối ngay tại biên
//! (`FromStr`, khi đọc cấu hình), không lan vào các module khác.

use std::fmt;
use std::str::FromStr;

use ethers::types::U256;
use ethers::utils::{format_units, parse_units};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WalletError};

/// Họ chain gốc của một token, dùng cho sở thích chain của người dùng
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainFamily {
    Ethereum,
    Polkadot,
    Kusama,
    Moonbeam,
}

impl fmt::Display for ChainFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ethereum => write!(f, "ethereum"),
            Self::Polkadot => write!(f, "polkadot"),
            Self::Kusama => write!(f, "kusama"),
            Self::Moonbeam => write!(f, "moonbeam"),
        }
    }
}

impl FromStr for ChainFamily {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ethereum" => Ok(Self::Ethereum),
            "polkadot" => Ok(Self::Polkadot),
            "kusama" => Ok(Self::Kusama),
            "moonbeam" => Ok(Self::Moonbeam),
            other => Err(WalletError::Config(format!("unknown chain family: {}", other))),
        }
    }
}

/// Mọi ký hiệu token mà hub biết
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TokenSymbol {
    #[serde(rename = "ETH")]
    Eth,
    #[serde(rename = "USDC")]
    Usdc,
    #[serde(rename = "DOT")]
    Dot,
    #[serde(rename = "vDOT")]
    VDot,
    #[serde(rename = "vKSM")]
    VKsm,
    #[serde(rename = "vGLMR")]
    VGlmr,
    #[serde(rename = "vASTR")]
    VAstr,
    #[serde(rename = "vFIL")]
    VFil,
    #[serde(rename = "xcvASTR")]
    XcvAstr,
    #[serde(rename = "xcvKSM")]
    XcvKsm,
    #[serde(rename = "xcvDOT")]
    XcvDot,
}

impl TokenSymbol {
    pub const ALL: [TokenSymbol; 11] = [
        TokenSymbol::Eth,
        TokenSymbol::Usdc,
        TokenSymbol::Dot,
        TokenSymbol::VDot,
        TokenSymbol::VKsm,
        TokenSymbol::VGlmr,
        TokenSymbol::VAstr,
        TokenSymbol::VFil,
        TokenSymbol::XcvAstr,
        TokenSymbol::XcvKsm,
        TokenSymbol::XcvDot,
    ];

    pub fn as_str(&self) -> &'static str {
        self.record().symbol
    }

    /// Bản ghi tĩnh tương ứng
    pub fn record(&self) -> &'static TokenRecord {
        match self {
            Self::Eth => &ETH,
            Self::Usdc => &USDC,
            Self::Dot => &DOT,
            Self::VDot => &VDOT,
            Self::VKsm => &VKSM,
            Self::VGlmr => &VGLMR,
            Self::VAstr => &VASTR,
            Self::VFil => &VFIL,
            Self::XcvAstr => &XCVASTR,
            Self::XcvKsm => &XCVKSM,
            Self::XcvDot => &XCVDOT,
        }
    }
}

impl fmt::Display for TokenSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenSymbol {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        TokenSymbol::ALL
            .iter()
            .copied()
            .find(|symbol| symbol.as_str() == trimmed)
            .ok_or_else(|| WalletError::UnknownToken(trimmed.to_string()))
    }
}

/// Cách đọc số dư của token trên chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Coin gốc của mạng EVM
    EvmNative,
    /// ERC20 với địa chỉ contract cố định
    Erc20 { address: &'static str },
    /// Coin gốc của chain Substrate (System.Account)
    SubstrateNative,
    /// vToken trên Bifrost; cả hai id đã mã hóa SCALE, `underlying_id` là token gốc dùng khi mint
    BifrostVToken {
        currency_id: &'static [u8],
        underlying_id: &'static [u8],
    },
    /// vToken xuyên chain trên Moonbase, địa chỉ lấy từ cấu hình
    MoonbaseXc,
}

/// Thông tin tĩnh của một token
#[derive(Debug, Clone, PartialEq)]
pub struct TokenRecord {
    pub symbol: &'static str,
    pub name: &'static str,
    pub underlying: &'static str,
    pub chain: ChainFamily,
    pub decimals: u8,
    pub color: &'static str,
    pub description: &'static str,
    pub kind: TokenKind,
}

static ETH: TokenRecord = TokenRecord {
    symbol: "ETH",
    name: "Sepolia Ether",
    underlying: "ETH",
    chain: ChainFamily::Ethereum,
    decimals: 18,
    color: "#627EEA",
    description: "Native Sepolia test ether",
    kind: TokenKind::EvmNative,
};

static USDC: TokenRecord = TokenRecord {
    symbol: "USDC",
    name: "USD Coin (Sepolia)",
    underlying: "USDC",
    chain: ChainFamily::Ethereum,
    decimals: 6,
    color: "#2775CA",
    description: "USD Coin on Sepolia",
    kind: TokenKind::Erc20 { address: "0x94b008aA00579c1307B0EF2c499aD98a8ce58e58" },
};

static DOT: TokenRecord = TokenRecord {
    symbol: "DOT",
    name: "Westend",
    underlying: "DOT",
    chain: ChainFamily::Polkadot,
    decimals: 12,
    color: "#E6007A",
    description: "Native balance of the relay test network",
    kind: TokenKind::SubstrateNative,
};

static VDOT: TokenRecord = TokenRecord {
    symbol: "vDOT",
    name: "Voucher DOT",
    underlying: "DOT",
    chain: ChainFamily::Polkadot,
    decimals: 12,
    color: "#E6007A",
    description: "DOT liquid staking token",
    kind: TokenKind::BifrostVToken {
        currency_id: &[0x09, 0x00],
        underlying_id: &[0x08, 0x00],
    },
};

static VKSM: TokenRecord = TokenRecord {
    symbol: "vKSM",
    name: "Voucher KSM",
    underlying: "KSM",
    chain: ChainFamily::Kusama,
    decimals: 12,
    color: "#B32D9E",
    description: "KSM liquid staking token",
    kind: TokenKind::BifrostVToken {
        currency_id: &[0x01, 0x04],
        underlying_id: &[0x00, 0x04],
    },
};

static VGLMR: TokenRecord = TokenRecord {
    symbol: "vGLMR",
    name: "Voucher GLMR",
    underlying: "GLMR",
    chain: ChainFamily::Polkadot,
    decimals: 12,
    color: "#53FFE9",
    description: "GLMR liquid staking token",
    kind: TokenKind::BifrostVToken {
        currency_id: &[0x09, 0x01],
        underlying_id: &[0x08, 0x01],
    },
};

static VASTR: TokenRecord = TokenRecord {
    symbol: "vASTR",
    name: "Voucher ASTR",
    underlying: "ASTR",
    chain: ChainFamily::Polkadot,
    decimals: 12,
    color: "#0C1446",
    description: "ASTR liquid staking token",
    kind: TokenKind::BifrostVToken {
        currency_id: &[0x09, 0x03],
        underlying_id: &[0x08, 0x03],
    },
};

static VFIL: TokenRecord = TokenRecord {
    symbol: "vFIL",
    name: "Voucher FIL",
    underlying: "FIL",
    chain: ChainFamily::Polkadot,
    decimals: 12,
    color: "#0090FF",
    description: "FIL liquid staking token",
    kind: TokenKind::BifrostVToken {
        currency_id: &[0x09, 0x04],
        underlying_id: &[0x08, 0x04],
    },
};

static XCVASTR: TokenRecord = TokenRecord {
    symbol: "xcvASTR",
    name: "Bifrost xcvASTR",
    underlying: "ASTR",
    chain: ChainFamily::Moonbeam,
    decimals: 18,
    color: "#0C1446",
    description: "Cross-chain vASTR on Moonbase Alpha",
    kind: TokenKind::MoonbaseXc,
};

static XCVKSM: TokenRecord = TokenRecord {
    symbol: "xcvKSM",
    name: "Bifrost xcvKSM",
    underlying: "KSM",
    chain: ChainFamily::Moonbeam,
    decimals: 18,
    color: "#B32D9E",
    description: "Cross-chain vKSM on Moonbase Alpha",
    kind: TokenKind::MoonbaseXc,
};

static XCVDOT: TokenRecord = TokenRecord {
    symbol: "xcvDOT",
    name: "Bifrost xcvDOT",
    underlying: "DOT",
    chain: ChainFamily::Moonbeam,
    decimals: 18,
    color: "#E6007A",
    description: "Cross-chain vDOT on Moonbase Alpha",
    kind: TokenKind::MoonbaseXc,
};

/// Các tài sản mà dashboard tổng hợp, theo thứ tự hiển thị
pub const ASSET_CATALOG: [TokenSymbol; 3] = [TokenSymbol::Eth, TokenSymbol::Usdc, TokenSymbol::Dot];

/// Các vToken trên Bifrost, cũng là danh mục cho bộ gợi ý
pub const VTOKEN_CATALOG: [TokenSymbol; 5] = [
    TokenSymbol::VDot,
    TokenSymbol::VKsm,
    TokenSymbol::VGlmr,
    TokenSymbol::VAstr,
    TokenSymbol::VFil,
];

/// vToken xuyên chain trên Moonbase Alpha
pub const MOONBASE_CATALOG: [TokenSymbol; 3] =
    [TokenSymbol::XcvAstr, TokenSymbol::XcvKsm, TokenSymbol::XcvDot];

/// Chuyển số nguyên thô sang số thập phân để hiển thị
pub fn to_display_amount(raw: u128, decimals: u8) -> f64 {
    raw as f64 / 10f64.powi(decimals as i32)
}

/// Chuyển U256 sang số thập phân, dùng chuỗi để không mất phần nguyên lớn
pub fn u256_to_display_amount(raw: U256, decimals: u8) -> f64 {
    format_units(raw, decimals as u32)
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Phân tích chuỗi số lượng người dùng nhập thành đơn vị nhỏ nhất
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(WalletError::InvalidAmount("empty amount".to_string()));
    }
    let value: U256 = parse_units(trimmed, decimals as u32)
        .map_err(|e| WalletError::InvalidAmount(format!("{}: {}", trimmed, e)))?
        .into();
    if value.is_zero() {
        return Err(WalletError::InvalidAmount(format!("{} must be positive", trimmed)));
    }
    Ok(value)
}

/// Như `parse_amount` nhưng trả về u128 cho các chain Substrate
pub fn parse_amount_u128(amount: &str, decimals: u8) -> Result<u128> {
    let value = parse_amount(amount, decimals)?;
    if value > U256::from(u128::MAX) {
        return Err(WalletError::InvalidAmount(format!("{} overflows u128", amount)));
    }
    Ok(value.as_u128())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_parse_rejects_unknown() {
        assert_eq!("vDOT".parse::<TokenSymbol>().unwrap(), TokenSymbol::VDot);
        assert_eq!(" xcvKSM ".parse::<TokenSymbol>().unwrap(), TokenSymbol::XcvKsm);
        assert!(matches!("vdot".parse::<TokenSymbol>(), Err(WalletError::UnknownToken(_))));
        assert!("BTC".parse::<TokenSymbol>().is_err());
    }

    #[test]
    fn test_records_match_symbols() {
        for symbol in TokenSymbol::ALL {
            assert_eq!(symbol.record().symbol, symbol.as_str());
            assert_eq!(symbol.to_string().parse::<TokenSymbol>().unwrap(), symbol);
        }
    }

    #[test]
    fn test_vtoken_catalog_kinds() {
        for symbol in VTOKEN_CATALOG {
            assert!(matches!(symbol.record().kind, TokenKind::BifrostVToken { .. }));
            assert_eq!(symbol.record().decimals, 12);
        }
        assert_eq!(TokenSymbol::VKsm.record().chain, ChainFamily::Kusama);
    }

    #[test]
    fn test_serde_uses_display_symbol() {
        let json = serde_json::to_string(&TokenSymbol::VGlmr).unwrap();
        assert_eq!(json, "\"vGLMR\"");
        let back: TokenSymbol = serde_json::from_str("\"xcvDOT\"").unwrap();
        assert_eq!(back, TokenSymbol::XcvDot);
    }

    #[test]
    fn test_amount_parsing() {
        assert_eq!(parse_amount("1.5", 6).unwrap(), U256::from(1_500_000u64));
        assert_eq!(parse_amount_u128("2", 12).unwrap(), 2_000_000_000_000u128);
        assert!(parse_amount("0", 18).is_err());
        assert!(parse_amount("", 18).is_err());
        assert!(parse_amount("abc", 18).is_err());
        assert!((to_display_amount(2_500_000_000_000, 12) - 2.5).abs() < 1e-9);
        assert!((u256_to_display_amount(U256::from(1_250_000u64), 6) - 1.25).abs() < 1e-9);
    }
}
