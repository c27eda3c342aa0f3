//! Cấu hình của hub
//!
//! Nạp từ file TOML/JSON (theo phần mở rộng), sau đó ghi đè bằng biến môi trường
//! có tiền tố `LSTFI_` (đã nạp `.env` nếu có), cuối cùng kiểm tra hợp lệ.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::{Result, WalletError};
use crate::substrate::parse_account;
use crate::tokens::{TokenKind, TokenSymbol, ASSET_CATALOG, MOONBASE_CATALOG};

pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;
pub const MOONBASE_ALPHA_CHAIN_ID: u64 = 1287;
pub const DEFAULT_ENDPOINT_TIMEOUT_SECS: u64 = 15;

/// Coin gốc của mạng EVM, theo định dạng EIP-3085
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Cấu hình phiên EVM
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvmConfig {
    /// RPC của node mà ví cục bộ dùng để gửi yêu cầu
    pub rpc_url: String,
    /// Chain id mong đợi; lệch thì đề xuất chuyển mạng
    pub chain_id: u64,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
    /// Trang cài đặt ví, được log khi không có provider
    pub install_url: String,
    /// Danh sách ERC20 cố định được tổng hợp số dư
    pub erc20_tokens: Vec<TokenSymbol>,
    /// Khóa riêng cho ví cục bộ, chỉ nên đặt qua biến môi trường
    #[serde(skip_serializing)]
    pub private_key: Option<String>,
}

impl Default for EvmConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://sepolia.drpc.org".to_string(),
            chain_id: SEPOLIA_CHAIN_ID,
            chain_name: "Sepolia test network".to_string(),
            native_currency: NativeCurrency {
                name: "Sepolia Ether".to_string(),
                symbol: "ETH".to_string(),
                decimals: 18,
            },
            rpc_urls: vec![
                "https://sepolia.drpc.org".to_string(),
                "https://rpc.sepolia.org".to_string(),
                "https://sepolia.gateway.tenderly.co".to_string(),
            ],
            block_explorer_urls: vec!["https://sepolia.etherscan.io/".to_string()],
            install_url: "https://metamask.io/download/".to_string(),
            erc20_tokens: vec![TokenSymbol::Usdc],
            private_key: None,
        }
    }
}

impl EvmConfig {
    /// Cấu hình phiên EVM trỏ tới Moonbase Alpha
    pub fn moonbase_alpha(moonbase: &MoonbaseConfig, base: &EvmConfig) -> Self {
        Self {
            rpc_url: moonbase.rpc_url.clone(),
            chain_id: moonbase.chain_id,
            chain_name: "Moonbase Alpha".to_string(),
            native_currency: NativeCurrency {
                name: "DEV".to_string(),
                symbol: "DEV".to_string(),
                decimals: 18,
            },
            rpc_urls: vec![moonbase.rpc_url.clone()],
            block_explorer_urls: vec!["https://moonbase.moonscan.io/".to_string()],
            install_url: base.install_url.clone(),
            erc20_tokens: Vec::new(),
            private_key: base.private_key.clone(),
        }
    }

    /// Chain id ở dạng hex như ví trả về, ví dụ `0xaa36a7`
    pub fn chain_id_hex(&self) -> String {
        format!("{:#x}", self.chain_id)
    }

    /// Tham số cho `wallet_addEthereumChain`
    pub fn add_chain_params(&self) -> Value {
        json!([{
            "chainId": self.chain_id_hex(),
            "chainName": self.chain_name,
            "nativeCurrency": self.native_currency,
            "rpcUrls": self.rpc_urls,
            "blockExplorerUrls": self.block_explorer_urls,
        }])
    }
}

/// Cấu hình phiên Substrate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubstrateConfig {
    /// Thử lần lượt, dừng ở endpoint đầu tiên kết nối được
    pub endpoints: Vec<String>,
    pub endpoint_timeout_secs: u64,
    /// Tên ứng dụng gửi cho extension khi enable
    pub app_name: String,
    pub install_url: String,
    /// Địa chỉ SS58 mà extension chỉ-xem cung cấp
    pub accounts: Vec<String>,
    /// SURI của khóa sr25519 dùng để ký, chỉ nên đặt qua biến môi trường
    #[serde(skip_serializing)]
    pub suri: Option<String>,
}

impl Default for SubstrateConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![
                "wss://westend-rpc.polkadot.io".to_string(),
                "wss://westend.api.onfinality.io/public-ws".to_string(),
                "wss://westend.dwellir.com".to_string(),
            ],
            endpoint_timeout_secs: DEFAULT_ENDPOINT_TIMEOUT_SECS,
            app_name: crate::APP_NAME.to_string(),
            install_url: "https://polkadot.js.org/extension/".to_string(),
            accounts: Vec::new(),
            suri: None,
        }
    }
}

impl SubstrateConfig {
    pub fn endpoint_timeout(&self) -> Duration {
        Duration::from_secs(self.endpoint_timeout_secs)
    }
}

/// Vị trí call trong runtime Bifrost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MintingCalls {
    pub pallet_index: u8,
    pub mint: u8,
    pub redeem: u8,
    pub quick_redeem: u8,
}

impl Default for MintingCalls {
    fn default() -> Self {
        Self {
            pallet_index: 115,
            mint: 0,
            redeem: 1,
            quick_redeem: 2,
        }
    }
}

/// Cấu hình parachain Bifrost
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BifrostConfig {
    pub endpoints: Vec<String>,
    pub tokens_pallet: String,
    pub rewards_pallet: String,
    pub rewards_item: String,
    pub calls: MintingCalls,
}

impl Default for BifrostConfig {
    fn default() -> Self {
        Self {
            endpoints: vec!["wss://api-bifrost-polkadot.n.dwellir.com".to_string()],
            tokens_pallet: "Tokens".to_string(),
            rewards_pallet: "StakingRewards".to_string(),
            rewards_item: "Rewards".to_string(),
            calls: MintingCalls::default(),
        }
    }
}

/// Cấu hình Moonbase Alpha và các contract xcvToken
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MoonbaseConfig {
    pub rpc_url: String,
    pub chain_id: u64,
    /// Địa chỉ contract theo ký hiệu; địa chỉ 0 nghĩa là chưa cấu hình
    pub contracts: HashMap<String, String>,
}

impl Default for MoonbaseConfig {
    fn default() -> Self {
        let contracts = MOONBASE_CATALOG
            .iter()
            .map(|symbol| (symbol.to_string(), format!("{:#x}", Address::zero())))
            .collect();
        Self {
            rpc_url: "https://rpc.api.moonbase.moonbeam.network".to_string(),
            chain_id: MOONBASE_ALPHA_CHAIN_ID,
            contracts,
        }
    }
}

impl MoonbaseConfig {
    /// Địa chỉ contract đã cấu hình, `None` nếu thiếu hoặc là địa chỉ 0
    pub fn contract(&self, symbol: TokenSymbol) -> Option<Address> {
        self.contracts
            .get(symbol.as_str())
            .and_then(|raw| raw.parse::<Address>().ok())
            .filter(|address| !address.is_zero())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub interval_secs: u64,
    pub monitor_interval_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            monitor_interval_secs: 6,
        }
    }
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_secs(self.monitor_interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".lstfi-hub/session.json"),
        }
    }
}

/// Cấu hình tổng của hub
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub evm: EvmConfig,
    pub substrate: SubstrateConfig,
    pub bifrost: BifrostConfig,
    pub moonbase: MoonbaseConfig,
    pub refresh: RefreshConfig,
    pub store: StoreConfig,
    /// Ghi đè giá USD theo ký hiệu
    pub prices: HashMap<String, f64>,
    pub log_level: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            evm: EvmConfig::default(),
            substrate: SubstrateConfig::default(),
            bifrost: BifrostConfig::default(),
            moonbase: MoonbaseConfig::default(),
            refresh: RefreshConfig::default(),
            store: StoreConfig::default(),
            prices: HashMap::new(),
            log_level: "info".to_string(),
        }
    }
}

impl DashboardConfig {
    /// Kiểm tra cấu hình, mọi ký hiệu phải thuộc danh mục
    pub fn validate(&self) -> Result<()> {
        if self.substrate.endpoints.is_empty() {
            return Err(WalletError::Config("substrate.endpoints must not be empty".to_string()));
        }
        if self.substrate.endpoint_timeout_secs == 0 {
            return Err(WalletError::Config("substrate.endpoint_timeout_secs must be positive".to_string()));
        }
        for symbol in &self.evm.erc20_tokens {
            if !ASSET_CATALOG.contains(symbol) || !matches!(symbol.record().kind, TokenKind::Erc20 { .. }) {
                return Err(WalletError::Config(format!("evm.erc20_tokens: {} is not a tracked ERC20 asset", symbol)));
            }
        }
        for address in &self.substrate.accounts {
            parse_account(address)
                .map_err(|_| WalletError::Config(format!("substrate.accounts: invalid SS58 address {}", address)))?;
        }
        if self.bifrost.endpoints.is_empty() {
            return Err(WalletError::Config("bifrost.endpoints must not be empty".to_string()));
        }
        if self.refresh.interval_secs == 0 || self.refresh.monitor_interval_secs == 0 {
            return Err(WalletError::Config("refresh intervals must be positive".to_string()));
        }
        for (raw, address) in &self.moonbase.contracts {
            let symbol: TokenSymbol = raw.parse()?;
            if !MOONBASE_CATALOG.contains(&symbol) {
                return Err(WalletError::Config(format!("{} is not a Moonbase token", symbol)));
            }
            address
                .parse::<Address>()
                .map_err(|e| WalletError::Config(format!("moonbase.contracts.{}: {}", raw, e)))?;
        }
        for raw in self.prices.keys() {
            raw.parse::<TokenSymbol>()?;
        }
        Ok(())
    }

    /// Các ghi đè giá đã kiểm tra ký hiệu
    pub fn price_overrides(&self) -> Vec<(TokenSymbol, f64)> {
        self.prices
            .iter()
            .filter_map(|(raw, price)| raw.parse::<TokenSymbol>().ok().map(|symbol| (symbol, *price)))
            .collect()
    }
}

/// Các định dạng file cấu hình được hỗ trợ
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Nhận dạng theo phần mở rộng, mặc định TOML
    pub fn from_path(path: &Path) -> ConfigFormat {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }
}

/// Tùy chọn cho ConfigLoader
#[derive(Debug, Clone)]
pub struct ConfigLoaderOptions {
    pub load_env: bool,
    pub load_dotenv: bool,
    pub env_prefix: String,
}

impl Default for ConfigLoaderOptions {
    fn default() -> Self {
        Self {
            load_env: true,
            load_dotenv: true,
            env_prefix: "LSTFI_".to_string(),
        }
    }
}

/// ConfigLoader tải cấu hình từ file và biến môi trường
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    /// Tải cấu hình; không có file thì dùng mặc định
    pub fn load(&self, path: Option<&Path>) -> Result<DashboardConfig> {
        if self.options.load_dotenv {
            if let Ok(dotenv_path) = dotenv::dotenv() {
                debug!("Đã nạp biến môi trường từ {:?}", dotenv_path);
            }
        }

        let mut config = match path {
            Some(path) if path.exists() => self.load_from_file(path)?,
            Some(path) => {
                warn!("Không tìm thấy file cấu hình {:?}, dùng cấu hình mặc định", path);
                DashboardConfig::default()
            }
            None => DashboardConfig::default(),
        };

        if self.options.load_env {
            self.apply_overrides(&mut config, |key| env::var(key).ok())?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Đọc và phân tích một file cấu hình
    pub fn load_from_file(&self, path: &Path) -> Result<DashboardConfig> {
        debug!("Đang tải cấu hình từ {:?}", path);
        let config = Self::read_file(path).map_err(|e| WalletError::Config(format!("{:#}", e)))?;
        info!("Đã tải cấu hình từ {:?}", path);
        Ok(config)
    }

    fn read_file(path: &Path) -> anyhow::Result<DashboardConfig> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        Self::parse_content(&content, ConfigFormat::from_path(path))
    }

    /// Phân tích nội dung theo định dạng
    pub fn parse_content(content: &str, format: ConfigFormat) -> anyhow::Result<DashboardConfig> {
        let config = match format {
            ConfigFormat::Json => serde_json::from_str(content).context("JSON parse error")?,
            ConfigFormat::Toml => toml::from_str(content).context("TOML parse error")?,
        };
        Ok(config)
    }

    /// Ghi đè cấu hình từ nguồn biến (biến môi trường khi chạy thật)
    pub fn apply_overrides<F>(&self, config: &mut DashboardConfig, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = &self.options.env_prefix;
        let var = |name: &str| lookup(&format!("{}{}", prefix, name));
        let list = |raw: String| -> Vec<String> {
            raw.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
        };

        if let Some(rpc_url) = var("EVM_RPC_URL") {
            config.evm.rpc_url = rpc_url;
        }
        if let Some(chain_id) = var("EVM_CHAIN_ID") {
            config.evm.chain_id = parse_number(&chain_id, "EVM_CHAIN_ID")?;
        }
        if let Some(private_key) = var("EVM_PRIVATE_KEY") {
            config.evm.private_key = Some(private_key);
        }
        if let Some(endpoints) = var("SUBSTRATE_ENDPOINTS") {
            config.substrate.endpoints = list(endpoints);
        }
        if let Some(timeout) = var("SUBSTRATE_TIMEOUT_SECS") {
            config.substrate.endpoint_timeout_secs = parse_number(&timeout, "SUBSTRATE_TIMEOUT_SECS")?;
        }
        if let Some(accounts) = var("SUBSTRATE_ACCOUNTS") {
            config.substrate.accounts = list(accounts);
        }
        if let Some(suri) = var("SUBSTRATE_SURI") {
            config.substrate.suri = Some(suri);
        }
        if let Some(endpoints) = var("BIFROST_ENDPOINTS") {
            config.bifrost.endpoints = list(endpoints);
        }
        if let Some(rpc_url) = var("MOONBASE_RPC_URL") {
            config.moonbase.rpc_url = rpc_url;
        }
        for symbol in MOONBASE_CATALOG {
            let key = format!("MOONBASE_{}", symbol.as_str().to_ascii_uppercase());
            if let Some(address) = var(&key) {
                config.moonbase.contracts.insert(symbol.to_string(), address);
            }
        }
        if let Some(interval) = var("REFRESH_INTERVAL_SECS") {
            config.refresh.interval_secs = parse_number(&interval, "REFRESH_INTERVAL_SECS")?;
        }
        if let Some(path) = var("STORE_PATH") {
            config.store.path = PathBuf::from(path);
        }
        if let Some(level) = var("LOG_LEVEL") {
            config.log_level = level;
        }
        Ok(())
    }
}

fn parse_number(value: &str, name: &str) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| WalletError::Config(format!("{}: {}", name, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DashboardConfig::default();
        assert_eq!(config.evm.chain_id, SEPOLIA_CHAIN_ID);
        assert_eq!(config.evm.chain_id_hex(), "0xaa36a7");
        assert_eq!(config.substrate.endpoints.len(), 3);
        assert_eq!(config.substrate.endpoint_timeout(), Duration::from_secs(15));
        assert!(config.validate().is_ok());
        assert!(config.moonbase.contract(TokenSymbol::XcvDot).is_none());
    }

    #[test]
    fn test_parse_partial_toml() {
        let content = r#"
            log_level = "debug"

            [substrate]
            endpoints = ["wss://a.example", "wss://b.example"]
            endpoint_timeout_secs = 5

            [moonbase.contracts]
            xcvDOT = "0x0000000000000000000000000000000000000801"

            [prices]
            ETH = 2400.0
        "#;
        let config = ConfigLoader::parse_content(content, ConfigFormat::Toml).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.substrate.endpoints, vec!["wss://a.example", "wss://b.example"]);
        assert_eq!(config.substrate.app_name, "Bifrost LSTfi Hub");
        assert!(config.moonbase.contract(TokenSymbol::XcvDot).is_some());
        assert_eq!(config.price_overrides(), vec![(TokenSymbol::Eth, 2400.0)]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_symbols() {
        let mut config = DashboardConfig::default();
        config.prices.insert("DOGE".to_string(), 0.1);
        assert!(matches!(config.validate(), Err(WalletError::UnknownToken(_))));

        let mut config = DashboardConfig::default();
        config.moonbase.contracts.insert("vDOT".to_string(), "0x0".to_string());
        assert!(matches!(config.validate(), Err(WalletError::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        let loader = ConfigLoader::new();
        let mut config = DashboardConfig::default();
        let vars: HashMap<&str, &str> = [
            ("LSTFI_SUBSTRATE_ENDPOINTS", "wss://x.example, wss://y.example"),
            ("LSTFI_SUBSTRATE_TIMEOUT_SECS", "3"),
            ("LSTFI_MOONBASE_XCVKSM", "0x0000000000000000000000000000000000000802"),
        ]
        .into_iter()
        .collect();
        loader
            .apply_overrides(&mut config, |key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.substrate.endpoints, vec!["wss://x.example", "wss://y.example"]);
        assert_eq!(config.substrate.endpoint_timeout_secs, 3);
        assert!(config.moonbase.contract(TokenSymbol::XcvKsm).is_some());

        let bad: HashMap<&str, &str> = [("LSTFI_EVM_CHAIN_ID", "sepolia")].into_iter().collect();
        let result = loader.apply_overrides(&mut config, |key| bad.get(key).map(|v| v.to_string()));
        assert!(matches!(result, Err(WalletError::Config(_))));
    }

    #[test]
    fn test_validate_substrate_accounts() {
        let mut config = DashboardConfig::default();
        config.substrate.accounts = vec!["5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY".to_string()];
        assert!(config.validate().is_ok());

        config.substrate.accounts.push("not-an-address".to_string());
        assert!(matches!(config.validate(), Err(WalletError::Config(_))));
    }

    #[test]
    fn test_validate_erc20_tokens_within_asset_catalog() {
        let mut config = DashboardConfig::default();
        config.evm.erc20_tokens = vec![TokenSymbol::VDot];
        assert!(matches!(config.validate(), Err(WalletError::Config(_))));

        config.evm.erc20_tokens = vec![TokenSymbol::Eth];
        assert!(matches!(config.validate(), Err(WalletError::Config(_))));
    }

    #[test]
    fn test_substrate_suri_from_env_only() {
        let loader = ConfigLoader::new();
        let mut config = DashboardConfig::default();
        let vars: HashMap<&str, &str> = [("LSTFI_SUBSTRATE_SURI", "//Alice")].into_iter().collect();
        loader
            .apply_overrides(&mut config, |key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.substrate.suri.as_deref(), Some("//Alice"));

        let dumped = serde_json::to_string(&config.substrate).unwrap();
        assert!(!dumped.contains("suri"));
    }

    #[test]
    fn test_add_chain_params() {
        let params = EvmConfig::default().add_chain_params();
        assert_eq!(params[0]["chainId"], "0xaa36a7");
        assert_eq!(params[0]["nativeCurrency"]["decimals"], 18);
    }
}
