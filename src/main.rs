/// LSTfi Hub - CLI
///
/// Lớp hiển thị dạng dòng lệnh cho thư viện `lstfi_hub`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use lstfi_hub::aggregator::{fetch_moonbase_balances, AssetRefresher, AutoRefresh, BalanceAggregator, VTokenReader};
use lstfi_hub::config::{DashboardConfig, EvmConfig};
use lstfi_hub::evm::{EvmSession, LocalWalletProvider};
use lstfi_hub::monitor::{evm_network_stats, substrate_network_stats, NetworkMonitor};
use lstfi_hub::recommend::{recommend, Experience, RiskTolerance, UserProfile, DEFAULT_TOP_N};
use lstfi_hub::session::{connect_first_reachable, ConnectionManager, FileStore, MemoryStore, SessionStore};
use lstfi_hub::staking::{mint_xc_token, redeem_xc_token, BifrostStaking};
use lstfi_hub::substrate::{
    parse_account, KeypairExtension, StorageLayout, SubstrateClient, SubstrateSession, WatchOnlyExtension,
    WsConnector,
};
use lstfi_hub::tokens::{ChainFamily, PriceSource, TokenSymbol, MOONBASE_CATALOG, VTOKEN_CATALOG};
use lstfi_hub::{gas, init_logging, ConfigLoader, SessionKind, StaticMarketTable, WalletError};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file path (TOML or JSON)
    #[arg(short, long, default_value = "config/lstfi-hub.toml")]
    config: PathBuf,

    /// Log level, overrides the config file
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect both wallet sessions and remember them
    Connect,
    /// Forget both wallet sessions
    Disconnect,
    /// Restore remembered sessions and print their state
    Status,
    /// Ask the EVM wallet to switch to the configured network
    SwitchNetwork,
    /// Aggregate asset balances across sessions
    Assets,
    /// Refresh assets periodically until interrupted
    Watch,
    /// vToken balances on Bifrost
    Vtokens {
        /// SS58 address, defaults to the Substrate session address
        #[arg(short, long)]
        address: Option<String>,
    },
    /// xcvToken balances on Moonbase Alpha
    Xctokens,
    /// Rank vTokens for a profile
    Recommend {
        #[arg(long, default_value = "balanced")]
        risk: RiskTolerance,
        #[arg(long, default_value_t = 1000.0)]
        amount: f64,
        #[arg(long, value_delimiter = ',', default_value = "polkadot")]
        chains: Vec<ChainFamily>,
        #[arg(long, default_value = "intermediate")]
        experience: Experience,
        #[arg(long, default_value_t = DEFAULT_TOP_N)]
        top: usize,
    },
    /// Mint a vToken (Bifrost) or xcvToken (Moonbase)
    Mint {
        #[arg(short, long)]
        token: TokenSymbol,
        #[arg(short, long)]
        amount: String,
    },
    /// Redeem a vToken (Bifrost) or xcvToken (Moonbase)
    Redeem {
        #[arg(short, long)]
        token: TokenSymbol,
        #[arg(short, long)]
        amount: String,
        /// Use the fast redeem path (Bifrost only)
        #[arg(long)]
        quick: bool,
    },
    /// Current gas price tiers on the EVM session
    Gas,
    /// Block height and issuance of the connected networks
    Network,
}

struct App {
    config: DashboardConfig,
    market: Arc<StaticMarketTable>,
}

impl App {
    fn new(config: DashboardConfig) -> Self {
        let market = Arc::new(StaticMarketTable::new().with_prices(config.price_overrides()));
        Self { config, market }
    }

    /// Manager của dashboard, cờ kết nối được lưu ra file
    fn manager(&self) -> Result<Arc<ConnectionManager>> {
        let store = Arc::new(FileStore::open(&self.config.store.path));
        self.manager_for(self.config.evm.clone(), store)
    }

    /// Manager tạm trỏ tới Moonbase Alpha; cờ của nó không ghi đè phiên dashboard
    fn moonbase_manager(&self) -> Result<Arc<ConnectionManager>> {
        let evm_config = EvmConfig::moonbase_alpha(&self.config.moonbase, &self.config.evm);
        self.manager_for(evm_config, Arc::new(MemoryStore::new()))
    }

    fn manager_for(&self, evm_config: EvmConfig, store: Arc<dyn SessionStore>) -> Result<Arc<ConnectionManager>> {
        let connector = Arc::new(WsConnector::default());
        let mut manager = ConnectionManager::new(evm_config.clone(), self.config.substrate.clone(), connector, store);

        if let Some(key) = &evm_config.private_key {
            let provider = LocalWalletProvider::new(&evm_config.rpc_url, key, evm_config.chain_id)?;
            manager = manager.with_injected_provider(provider.into_shared());
        }
        if let Some(suri) = &self.config.substrate.suri {
            manager = manager.with_extension(Arc::new(KeypairExtension::from_suri(suri)?));
        } else if !self.config.substrate.accounts.is_empty() {
            let extension = WatchOnlyExtension::new(self.config.substrate.accounts.clone());
            manager = manager.with_extension(Arc::new(extension));
        }
        Ok(Arc::new(manager))
    }

    async fn bifrost_client(&self) -> Result<Arc<dyn SubstrateClient>> {
        let connector = WsConnector::new(StorageLayout::from(&self.config.bifrost));
        let (endpoint, client) = connect_first_reachable(
            &connector,
            &self.config.bifrost.endpoints,
            self.config.substrate.endpoint_timeout(),
        )
        .await?;
        info!(%endpoint, "Đã kết nối Bifrost");
        Ok(client)
    }

    fn aggregator(&self) -> BalanceAggregator {
        BalanceAggregator::new(self.market.clone(), self.config.evm.erc20_tokens.clone())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn connect_all(manager: &ConnectionManager) {
    match manager.connect_evm().await {
        Ok(connection) => {
            println!("EVM: {:#x} on chain {}", connection.address, connection.chain_id);
            if let Some(offer) = connection.switch_offer {
                println!(
                    "  wallet is on chain {}, run `switch-network` to move to {}",
                    offer.current_chain_id, offer.expected_chain_id
                );
            }
        }
        Err(e) => println!("EVM: {}", e),
    }
    match manager.connect_substrate().await {
        Ok(connection) => println!(
            "Substrate: {} via {} ({})",
            connection.address,
            connection.endpoint.as_deref().unwrap_or("no endpoint"),
            connection.state
        ),
        Err(e) => println!("Substrate: {}", e),
    }
}

/// Khôi phục các phiên đã nhớ rồi in kết quả; phiên chưa nhớ thì không kết nối
async fn restore(manager: &ConnectionManager) {
    let report = manager.auto_reconnect().await;
    match &report.evm {
        Some(Ok(connection)) => println!("EVM: {:#x} on chain {}", connection.address, connection.chain_id),
        Some(Err(e)) => println!("EVM: {}", e),
        None => println!("EVM: not connected, run `connect` first"),
    }
    match &report.substrate {
        Some(Ok(connection)) => println!("Substrate: {} ({})", connection.address, connection.state),
        Some(Err(e)) => println!("Substrate: {}", e),
        None => println!("Substrate: not connected, run `connect` first"),
    }
}

/// Phiên EVM đã nhớ từ lần `connect` trước
async fn remembered_evm(manager: &ConnectionManager) -> Result<Arc<EvmSession>> {
    if let Some(Err(e)) = manager.auto_reconnect().await.evm {
        return Err(e.into());
    }
    match manager.evm_session().await {
        Some(session) => Ok(session),
        None => bail!("{}, run `connect` first", WalletError::NotConnected(SessionKind::Evm)),
    }
}

/// Phiên Substrate đã nhớ từ lần `connect` trước
async fn remembered_substrate(manager: &ConnectionManager) -> Result<Arc<SubstrateSession>> {
    if let Some(Err(e)) = manager.auto_reconnect().await.substrate {
        return Err(e.into());
    }
    match manager.substrate_session().await {
        Some(session) => Ok(session),
        None => bail!("{}, run `connect` first", WalletError::NotConnected(SessionKind::Substrate)),
    }
}

async fn run(app: App, command: Commands) -> Result<()> {
    match command {
        Commands::Connect => {
            let manager = app.manager()?;
            connect_all(&manager).await;
        }
        Commands::Disconnect => {
            let manager = app.manager()?;
            manager.disconnect_evm().await;
            manager.disconnect_substrate().await;
            println!("Both sessions forgotten");
        }
        Commands::Status => {
            let manager = app.manager()?;
            let report = manager.auto_reconnect().await;
            if report.evm.is_none() && report.substrate.is_none() {
                println!("No remembered sessions");
            }
            for (name, state) in [
                ("EVM", manager.evm_state().await),
                ("Substrate", manager.substrate_state().await),
            ] {
                let marker = if state.is_connected() { "+" } else { "-" };
                println!("[{}] {}: {}", marker, name, state);
            }
        }
        Commands::SwitchNetwork => {
            let manager = app.manager()?;
            remembered_evm(&manager).await?;
            let chain_id = manager.switch_evm_network().await?;
            println!("Wallet now on chain {}", chain_id);
        }
        Commands::Assets => {
            let manager = app.manager()?;
            restore(&manager).await;
            let refresher = AssetRefresher::new(app.aggregator(), manager);
            if let Some(snapshot) = refresher.refresh().await {
                print_json(&snapshot)?;
            }
        }
        Commands::Watch => {
            let manager = app.manager()?;
            restore(&manager).await;
            let refresher = Arc::new(AssetRefresher::new(app.aggregator(), manager));
            let task_refresher = refresher.clone();
            let auto = AutoRefresh::start(app.config.refresh.interval(), move || {
                let refresher = task_refresher.clone();
                async move {
                    if let Some(snapshot) = refresher.refresh().await {
                        println!("[#{}] total value {:.2} USD", snapshot.request_id, snapshot.total_value());
                    }
                }
            });
            tokio::signal::ctrl_c().await.context("Failed to listen for shutdown signal")?;
            auto.shutdown().await;
        }
        Commands::Vtokens { address } => {
            let address = match address {
                Some(address) => address,
                None => {
                    let manager = app.manager()?;
                    remembered_substrate(&manager).await?.address.clone()
                }
            };
            let account = parse_account(&address)?;
            let client = app.bifrost_client().await?;
            let reader = VTokenReader::new(app.market.clone(), app.market.clone());
            let balances = reader.fetch_vtoken_balances(client.as_ref(), &account).await;
            client.disconnect().await;
            print_json(&balances)?;
        }
        Commands::Xctokens => {
            let manager = app.moonbase_manager()?;
            manager.connect_evm().await?;
            let session = manager.evm_session().await.ok_or(WalletError::NoAccounts)?;
            let prices: Arc<dyn PriceSource> = app.market.clone();
            let balances = fetch_moonbase_balances(&session, &app.config.moonbase, &prices).await;
            print_json(&balances)?;
        }
        Commands::Recommend {
            risk,
            amount,
            chains,
            experience,
            top,
        } => {
            let profile = UserProfile {
                risk_tolerance: risk,
                investment_amount: amount,
                preferred_chains: chains,
                experience,
            };
            print_json(&recommend(&profile, app.market.as_ref(), top))?;
        }
        Commands::Mint { token, amount } => submit(&app, token, &amount, false, true).await?,
        Commands::Redeem { token, amount, quick } => submit(&app, token, &amount, quick, false).await?,
        Commands::Gas => {
            let manager = app.manager()?;
            let session = remembered_evm(&manager).await?;
            print_json(&gas::fetch_gas_prices(&session).await?)?;
        }
        Commands::Network => {
            let manager = app.manager()?;
            restore(&manager).await;
            if let Some(session) = manager.evm_session().await {
                print_json(&evm_network_stats(&session).await?)?;
            }
            if let Some(client) = manager.substrate_session().await.and_then(|s| s.client.clone()) {
                print_json(&substrate_network_stats(client.as_ref()).await?)?;
                let monitor = NetworkMonitor::start(Some(client), app.config.refresh.monitor_interval());
                tokio::time::sleep(app.config.refresh.monitor_interval()).await;
                print_json(&monitor.status())?;
                monitor.stop().await;
            }
        }
    }
    Ok(())
}

async fn submit(app: &App, token: TokenSymbol, amount: &str, quick: bool, mint: bool) -> Result<()> {
    if VTOKEN_CATALOG.contains(&token) {
        let manager = app.manager()?;
        let session = remembered_substrate(&manager).await?;
        let client = match app.bifrost_client().await {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("Không kết nối được Bifrost: {}", e);
                None
            }
        };
        let staking = BifrostStaking::new(client, app.config.bifrost.calls);
        let submitted = match (mint, quick) {
            (true, _) => staking.mint(&session, token, amount).await?,
            (false, true) => staking.quick_redeem(&session, token, amount).await?,
            (false, false) => staking.redeem(&session, token, amount).await?,
        };
        println!("Extrinsic {} submitted", submitted.hash);
        if let Some(fee) = submitted.estimated_fee {
            println!("Estimated fee: {}", fee);
        }
    } else if MOONBASE_CATALOG.contains(&token) {
        if quick {
            bail!("quick redeem is only available for Bifrost vTokens");
        }
        let manager = app.moonbase_manager()?;
        manager.connect_evm().await?;
        let session = manager.evm_session().await.ok_or(WalletError::NoAccounts)?;
        let hash = if mint {
            mint_xc_token(&session, &app.config.moonbase, token, amount).await?
        } else {
            redeem_xc_token(&session, &app.config.moonbase, token, amount).await?
        };
        println!("Transaction {:#x} confirmed", hash);
    } else {
        bail!("{} cannot be minted or redeemed", token);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::new()
        .load(Some(cli.config.as_path()))
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    let log_level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    init_logging(&log_level)?;

    info!("{} v{}", lstfi_hub::APP_NAME, env!("CARGO_PKG_VERSION"));
    run(App::new(config), cli.command).await
}
