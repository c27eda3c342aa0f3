//! Integration tests cho tổng hợp số dư
//!
//! Bao gồm:
//! - Tài sản từ phiên EVM và Substrate
//! - Số dư vToken với lần đọc lỗi
//! - Làm mới qua ConnectionManager

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use common::*;
use lstfi_hub::aggregator::{fetch_moonbase_balances, AssetRefresher, BalanceAggregator, VTokenReader};
use lstfi_hub::config::{MoonbaseConfig, SEPOLIA_CHAIN_ID};
use lstfi_hub::evm::EvmSession;
use lstfi_hub::substrate::{parse_account, SubstrateSession, WatchOnlyExtension};
use lstfi_hub::tokens::{ChainFamily, PriceSource, TokenSymbol, ASSET_CATALOG, MOONBASE_CATALOG, VTOKEN_CATALOG};
use lstfi_hub::StaticMarketTable;

fn market() -> Arc<StaticMarketTable> {
    Arc::new(StaticMarketTable::new().with_prices(vec![(TokenSymbol::Eth, 2000.0), (TokenSymbol::Dot, 5.0)]))
}

fn evm_session() -> EvmSession {
    EvmSession::new(
        Arc::new(connected_wallet(SEPOLIA_CHAIN_ID)),
        EVM_ADDRESS.parse().unwrap(),
        SEPOLIA_CHAIN_ID,
    )
}

fn substrate_session(client: Option<Arc<FakeClient>>) -> SubstrateSession {
    SubstrateSession {
        address: SS58_ADDRESS.to_string(),
        account: parse_account(SS58_ADDRESS).unwrap(),
        endpoint: client.as_ref().map(|c| c.endpoint.clone()),
        client: client.map(|c| c as Arc<dyn lstfi_hub::substrate::SubstrateClient>),
        extension: Arc::new(WatchOnlyExtension::new([SS58_ADDRESS])),
    }
}

#[tokio::test]
async fn test_assets_from_both_sessions() {
    let mut client = FakeClient::new("wss://a");
    client.free = Some(25_000_000_000);
    let aggregator = BalanceAggregator::new(market(), vec![TokenSymbol::Usdc]);

    let evm = evm_session();
    let substrate = substrate_session(Some(Arc::new(client)));
    let entries = aggregator.fetch_all_assets(Some(&evm), Some(&substrate)).await;

    // USDC lỗi khi đọc nên bị bỏ qua
    let symbols: Vec<TokenSymbol> = entries.iter().map(|e| e.symbol).collect();
    assert_eq!(symbols, vec![TokenSymbol::Eth, TokenSymbol::Dot]);

    let eth = &entries[0];
    assert_eq!(eth.chain, ChainFamily::Ethereum);
    assert!((eth.balance - 1.0).abs() < 1e-9);
    assert!((eth.value - 2000.0).abs() < 1e-6);

    let dot = &entries[1];
    assert_eq!(dot.chain, ChainFamily::Polkadot);
    assert!((dot.balance - 2.5).abs() < 1e-9);
    assert!((dot.value - 12.5).abs() < 1e-9);
}

#[tokio::test]
async fn test_assets_are_subset_without_duplicates() {
    let mut client = FakeClient::new("wss://a");
    client.free = Some(1);
    let aggregator = BalanceAggregator::new(market(), vec![TokenSymbol::Usdc, TokenSymbol::Usdc]);

    let evm = evm_session();
    let substrate = substrate_session(Some(Arc::new(client)));
    let entries = aggregator.fetch_all_assets(Some(&evm), Some(&substrate)).await;

    let unique: HashSet<TokenSymbol> = entries.iter().map(|e| e.symbol).collect();
    assert_eq!(unique.len(), entries.len(), "Mỗi token xuất hiện tối đa một lần");
    assert!(entries.iter().all(|e| ASSET_CATALOG.contains(&e.symbol)));
}

#[tokio::test]
async fn test_degraded_or_missing_sessions_contribute_nothing() {
    let aggregator = BalanceAggregator::new(market(), vec![TokenSymbol::Usdc]);

    assert!(aggregator.fetch_all_assets(None, None).await.is_empty());

    let degraded = substrate_session(None);
    assert!(aggregator.fetch_all_assets(None, Some(&degraded)).await.is_empty());
}

#[tokio::test]
async fn test_failed_substrate_read_is_omitted() {
    // free = None: đọc System.Account lỗi
    let client = FakeClient::new("wss://a");
    let aggregator = BalanceAggregator::new(market(), Vec::new());

    let evm = evm_session();
    let substrate = substrate_session(Some(Arc::new(client)));
    let entries = aggregator.fetch_all_assets(Some(&evm), Some(&substrate)).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].symbol, TokenSymbol::Eth);
}

#[tokio::test]
async fn test_vtoken_balances_zero_fill_failures() {
    let mut client = FakeClient::new("wss://bifrost");
    client.tokens.insert(vec![0x09, 0x00], 2_000_000_000_000);
    client.rewards.insert(vec![0x09, 0x00], 500_000_000_000);
    client.failing.push(vec![0x01, 0x04]);

    let market = market();
    let reader = VTokenReader::new(market.clone(), market);
    let account = parse_account(SS58_ADDRESS).unwrap();
    let balances = reader.fetch_vtoken_balances(&client, &account).await;

    let symbols: Vec<TokenSymbol> = balances.iter().map(|b| b.symbol).collect();
    assert_eq!(symbols, VTOKEN_CATALOG.to_vec(), "Mỗi vToken đúng một bản ghi theo thứ tự danh mục");

    let vdot = &balances[0];
    assert!((vdot.available - 2.0).abs() < 1e-9);
    assert!((vdot.rewards - 0.5).abs() < 1e-9);
    assert!((vdot.total() - 2.5).abs() < 1e-9);
    assert!((vdot.value - 2.5 * vdot.price).abs() < 1e-9);
    assert_eq!(vdot.underlying, "DOT");

    let vksm = &balances[1];
    assert_eq!(vksm.symbol, TokenSymbol::VKsm);
    assert_eq!(vksm.available, 0.0, "Lần đọc lỗi phải cho ra 0");
    assert_eq!(vksm.rewards, 0.0);
    assert_eq!(vksm.value, 0.0);
    assert!(vksm.apy > 0.0);
}

#[tokio::test]
async fn test_moonbase_balances_without_contracts() {
    let prices: Arc<dyn PriceSource> = market();
    let balances = fetch_moonbase_balances(&evm_session(), &MoonbaseConfig::default(), &prices).await;

    assert_eq!(balances.len(), MOONBASE_CATALOG.len());
    for balance in &balances {
        assert!(balance.contract.is_none());
        assert_eq!(balance.balance, 0.0);
    }
}

#[tokio::test]
async fn test_refresher_numbers_snapshots() {
    let mut client = FakeClient::new("wss://a");
    client.free = Some(10_000_000_000);
    let connector = Arc::new(ScriptedConnector::new(vec![("wss://a", Endpoint::Up(Arc::new(client)))]));
    let manager = Arc::new(
        manager(connector, &["wss://a"], memory_store())
            .with_extension(Arc::new(WatchOnlyExtension::new([SS58_ADDRESS]))),
    );
    manager.connect_substrate().await.unwrap();

    let refresher = AssetRefresher::new(BalanceAggregator::new(market(), Vec::new()), manager.clone());
    assert!(refresher.snapshot().is_none());

    let first = refresher.refresh().await.unwrap();
    assert_eq!(first.request_id, 1);
    assert_eq!(first.entries.len(), 1);
    assert!((first.total_value() - 5.0).abs() < 1e-9);

    manager.disconnect_substrate().await;
    let second = refresher.refresh().await.unwrap();
    assert_eq!(second.request_id, 2);
    assert!(second.entries.is_empty(), "Ngắt phiên thì không còn tài sản");
    assert_eq!(refresher.snapshot().unwrap().request_id, 2);
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_refresh_keeps_newest_snapshot() {
    let mut client = FakeClient::new("wss://a");
    client.free = Some(10_000_000_000);
    // Lần đọc đầu về muộn hơn lần đọc thứ hai
    client.delays = std::sync::Mutex::new(
        [std::time::Duration::from_secs(10), std::time::Duration::from_secs(1)].into_iter().collect(),
    );
    let connector = Arc::new(ScriptedConnector::new(vec![("wss://a", Endpoint::Up(Arc::new(client)))]));
    let manager = Arc::new(
        manager(connector, &["wss://a"], memory_store())
            .with_extension(Arc::new(WatchOnlyExtension::new([SS58_ADDRESS]))),
    );
    manager.connect_substrate().await.unwrap();

    let refresher = AssetRefresher::new(BalanceAggregator::new(market(), Vec::new()), manager);
    let (slow, fast) = tokio::join!(refresher.refresh(), refresher.refresh());

    assert!(slow.is_none(), "Phản hồi của lần làm mới cũ phải bị bỏ");
    assert_eq!(fast.map(|snapshot| snapshot.request_id), Some(2));
    let shown = refresher.snapshot().unwrap();
    assert_eq!(shown.request_id, 2);
    assert_eq!(shown.entries.len(), 1);
}
