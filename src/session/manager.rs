//! Quản lý hai phiên ví độc lập: EVM và Substrate
//!
//! Mỗi phiên nằm trong một `RwLock` riêng; khóa chỉ được giữ trong các đoạn
//! đọc/ghi ngắn, không giữ qua `await`. Người dùng khác nhận bản chụp `Arc`.

use std::sync::Arc;
use std::time::Duration;

use ethers::types::Address;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::state::{SessionSlot, SessionState};
use super::store::{SessionStore, ETH_ADDRESS, ETH_CONNECTED, POLKADOT_ADDRESS, POLKADOT_CONNECTED};
use crate::config::{EvmConfig, SubstrateConfig};
use crate::error::{Result, SessionKind, WalletError};
use crate::evm::network::{read_chain_id, switch_network, switch_offer, wallet_error};
use crate::evm::{EvmSession, InjectedProvider, NetworkSwitchOffer};
use crate::substrate::{parse_account, SubstrateClient, SubstrateConnector, SubstrateExtension, SubstrateSession};

/// Kết quả kết nối EVM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmConnection {
    pub address: Address,
    pub chain_id: u64,
    /// Có giá trị khi ví ở chain khác chain mong đợi; không tự chuyển
    pub switch_offer: Option<NetworkSwitchOffer>,
}

/// Kết quả kết nối Substrate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstrateConnection {
    pub address: String,
    pub endpoint: Option<String>,
    pub state: SessionState,
}

/// Kết quả tự kết nối lại; `None` khi không có cờ đã lưu
#[derive(Debug, Default)]
pub struct AutoReconnectReport {
    pub evm: Option<Result<EvmConnection>>,
    pub substrate: Option<Result<SubstrateConnection>>,
}

/// Thử lần lượt từng endpoint, dừng ở endpoint đầu tiên thành công
///
/// Mỗi endpoint có thời hạn riêng `per_endpoint`. Trả về lỗi của endpoint cuối.
pub async fn connect_first_reachable(
    connector: &dyn SubstrateConnector,
    endpoints: &[String],
    per_endpoint: Duration,
) -> Result<(String, Arc<dyn SubstrateClient>)> {
    let mut last_error = WalletError::EndpointUnreachable {
        endpoint: String::new(),
        reason: "no endpoints configured".to_string(),
    };

    for endpoint in endpoints {
        info!(%endpoint, "Đang thử kết nối endpoint");
        match tokio::time::timeout(per_endpoint, connector.connect(endpoint)).await {
            Ok(Ok(client)) => {
                info!(%endpoint, "Kết nối endpoint thành công");
                return Ok((endpoint.clone(), client));
            }
            Ok(Err(e)) => {
                warn!(%endpoint, "Không kết nối được: {}", e);
                last_error = e;
            }
            Err(_) => {
                warn!(%endpoint, "Hết thời gian chờ sau {:?}", per_endpoint);
                last_error = WalletError::EndpointTimeout {
                    endpoint: endpoint.clone(),
                    timeout: per_endpoint,
                };
            }
        }
    }

    Err(last_error)
}

/// Quản lý kết nối cho cả hai họ chain
pub struct ConnectionManager {
    evm_config: EvmConfig,
    substrate_config: SubstrateConfig,
    injected: Option<Arc<dyn InjectedProvider>>,
    extension: Option<Arc<dyn SubstrateExtension>>,
    connector: Arc<dyn SubstrateConnector>,
    store: Arc<dyn SessionStore>,
    evm: RwLock<SessionSlot<EvmSession>>,
    substrate: RwLock<SessionSlot<SubstrateSession>>,
}

impl ConnectionManager {
    /// Tạo manager chưa có ví; thêm ví bằng `with_injected_provider`/`with_extension`
    pub fn new(
        evm_config: EvmConfig,
        substrate_config: SubstrateConfig,
        connector: Arc<dyn SubstrateConnector>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            evm_config,
            substrate_config,
            injected: None,
            extension: None,
            connector,
            store,
            evm: RwLock::new(SessionSlot::default()),
            substrate: RwLock::new(SessionSlot::default()),
        }
    }

    pub fn with_injected_provider(mut self, provider: Arc<dyn InjectedProvider>) -> Self {
        self.injected = Some(provider);
        self
    }

    pub fn with_extension(mut self, extension: Arc<dyn SubstrateExtension>) -> Self {
        self.extension = Some(extension);
        self
    }

    pub async fn evm_state(&self) -> SessionState {
        self.evm.read().await.state
    }

    pub async fn substrate_state(&self) -> SessionState {
        self.substrate.read().await.state
    }

    pub async fn evm_session(&self) -> Option<Arc<EvmSession>> {
        self.evm.read().await.session.clone()
    }

    pub async fn substrate_session(&self) -> Option<Arc<SubstrateSession>> {
        self.substrate.read().await.session.clone()
    }

    /// Có phiên nào đang kết nối dở hay không
    pub async fn is_connecting(&self) -> bool {
        self.evm_state().await == SessionState::Connecting
            || self.substrate_state().await == SessionState::Connecting
    }

    fn persist(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            warn!("Không lưu được {}: {}", key, e);
        }
    }

    fn forget(&self, keys: &[&str]) {
        for key in keys {
            if let Err(e) = self.store.remove(key) {
                warn!("Không xóa được {}: {}", key, e);
            }
        }
    }

    /// Kết nối ví EVM
    pub async fn connect_evm(&self) -> Result<EvmConnection> {
        let provider = match &self.injected {
            Some(provider) => provider.clone(),
            None => {
                error!("Không tìm thấy ví EVM, hãy cài đặt tại {}", self.evm_config.install_url);
                return Err(WalletError::ProviderMissing(self.evm_config.install_url.clone()));
            }
        };

        self.evm.write().await.state = SessionState::Connecting;
        match self.establish_evm(provider).await {
            Ok((session, connection)) => {
                self.evm.write().await.set(SessionState::Connected, Arc::new(session));
                self.persist(ETH_CONNECTED, "true");
                self.persist(ETH_ADDRESS, &format!("{:#x}", connection.address));
                match &connection.switch_offer {
                    Some(offer) => warn!(
                        "Ví đang ở chain {}, cần chain {}",
                        offer.current_chain_id, offer.expected_chain_id
                    ),
                    None => info!("Đã kết nối ví EVM {:#x}", connection.address),
                }
                Ok(connection)
            }
            Err(e) => {
                self.evm.write().await.clear();
                error!("Kết nối ví EVM thất bại: {}", e);
                Err(e)
            }
        }
    }

    async fn establish_evm(&self, provider: Arc<dyn InjectedProvider>) -> Result<(EvmSession, EvmConnection)> {
        let mut accounts = request_accounts(provider.as_ref(), "eth_accounts").await?;
        if accounts.is_empty() {
            debug!("Chưa có tài khoản được cấp quyền, yêu cầu người dùng");
            accounts = request_accounts(provider.as_ref(), "eth_requestAccounts").await?;
        }
        let address = accounts.into_iter().next().ok_or(WalletError::NoAccounts)?;
        let chain_id = read_chain_id(provider.as_ref()).await?;

        let session = EvmSession::new(provider, address, chain_id);
        let connection = EvmConnection {
            address,
            chain_id,
            switch_offer: switch_offer(chain_id, self.evm_config.chain_id),
        };
        Ok((session, connection))
    }

    /// Chuyển ví sang chain trong cấu hình, trả về chain id mới
    pub async fn switch_evm_network(&self) -> Result<u64> {
        let session = self
            .evm_session()
            .await
            .ok_or(WalletError::NotConnected(SessionKind::Evm))?;
        switch_network(session.provider().as_ref(), &self.evm_config).await?;

        let chain_id = read_chain_id(session.provider().as_ref()).await?;
        let refreshed = EvmSession::new(session.provider().clone(), session.address, chain_id);
        self.evm.write().await.set(SessionState::Connected, Arc::new(refreshed));
        Ok(chain_id)
    }

    /// Ngắt phiên EVM và xóa cờ đã lưu
    pub async fn disconnect_evm(&self) {
        if self.evm.write().await.clear().is_some() {
            info!("Đã ngắt kết nối ví EVM");
        }
        self.forget(&[ETH_CONNECTED, ETH_ADDRESS]);
    }

    /// Kết nối ví Substrate
    ///
    /// Không endpoint nào kết nối được thì phiên vẫn được giữ ở trạng thái suy giảm.
    pub async fn connect_substrate(&self) -> Result<SubstrateConnection> {
        let extension = match &self.extension {
            Some(extension) => extension.clone(),
            None => return Err(self.extension_missing()),
        };

        self.substrate.write().await.state = SessionState::Connecting;
        match self.establish_substrate(extension).await {
            Ok(session) => {
                let state = if session.client.is_some() {
                    SessionState::Connected
                } else {
                    SessionState::ConnectedDegraded
                };
                let connection = SubstrateConnection {
                    address: session.address.clone(),
                    endpoint: session.endpoint.clone(),
                    state,
                };
                let current = session.client.clone();
                let previous = self.substrate.write().await.set(state, Arc::new(session));
                release_client(previous, current.as_ref()).await;
                self.persist(POLKADOT_CONNECTED, "true");
                self.persist(POLKADOT_ADDRESS, &connection.address);
                info!("Đã kết nối ví Substrate {} ({})", connection.address, state);
                Ok(connection)
            }
            Err(e) => {
                let previous = self.substrate.write().await.clear();
                release_client(previous, None).await;
                error!("Kết nối ví Substrate thất bại: {}", e);
                Err(e)
            }
        }
    }

    fn extension_missing(&self) -> WalletError {
        error!(
            "Không tìm thấy extension ví Substrate, hãy cài đặt tại {}",
            self.substrate_config.install_url
        );
        WalletError::ExtensionMissing(self.substrate_config.install_url.clone())
    }

    async fn establish_substrate(&self, extension: Arc<dyn SubstrateExtension>) -> Result<SubstrateSession> {
        let enabled = extension.enable(&self.substrate_config.app_name).await?;
        if enabled == 0 {
            return Err(self.extension_missing());
        }

        let accounts = extension.accounts().await?;
        let first = accounts.into_iter().next().ok_or(WalletError::NoAccounts)?;
        let account = parse_account(&first.address)?;

        let (endpoint, client) = match connect_first_reachable(
            self.connector.as_ref(),
            &self.substrate_config.endpoints,
            self.substrate_config.endpoint_timeout(),
        )
        .await
        {
            Ok((endpoint, client)) => (Some(endpoint), Some(client)),
            Err(e) => {
                warn!("Mọi endpoint đều không kết nối được ({}), chỉ giữ địa chỉ", e);
                (None, None)
            }
        };

        Ok(SubstrateSession {
            address: first.address,
            account,
            client,
            endpoint,
            extension,
        })
    }

    /// Ngắt phiên Substrate, giải phóng client và xóa cờ đã lưu
    pub async fn disconnect_substrate(&self) {
        let previous = self.substrate.write().await.clear();
        let had_session = previous.is_some();
        release_client(previous, None).await;
        if had_session {
            info!("Đã ngắt kết nối ví Substrate");
        }
        self.forget(&[POLKADOT_CONNECTED, POLKADOT_ADDRESS]);
    }

    /// Khôi phục các phiên đã lưu, EVM trước rồi Substrate
    ///
    /// Cờ được đọc một lần lúc bắt đầu; lỗi chỉ được ghi log và báo lại.
    pub async fn auto_reconnect(&self) -> AutoReconnectReport {
        let evm_flag = self.store.flag(ETH_CONNECTED);
        let substrate_flag = self.store.flag(POLKADOT_CONNECTED);
        let mut report = AutoReconnectReport::default();

        if evm_flag {
            info!("Tự kết nối lại ví EVM");
            let result = self.connect_evm().await;
            if let Err(e) = &result {
                warn!("Tự kết nối lại ví EVM thất bại: {}", e);
            }
            report.evm = Some(result);
        }

        if substrate_flag {
            info!("Tự kết nối lại ví Substrate");
            let result = self.connect_substrate().await;
            if let Err(e) = &result {
                warn!("Tự kết nối lại ví Substrate thất bại: {}", e);
            }
            report.substrate = Some(result);
        }

        report
    }
}

/// Giải phóng client của phiên cũ, trừ khi phiên mới vẫn dùng chính client đó
async fn release_client(previous: Option<Arc<SubstrateSession>>, current: Option<&Arc<dyn SubstrateClient>>) {
    let Some(client) = previous.and_then(|session| session.client.clone()) else {
        return;
    };
    if current.map_or(false, |current| Arc::ptr_eq(current, &client)) {
        return;
    }
    debug!(endpoint = client.endpoint(), "Giải phóng client cũ");
    client.disconnect().await;
}

async fn request_accounts(provider: &dyn InjectedProvider, method: &str) -> Result<Vec<Address>> {
    let raw = provider.request(method, Value::Null).await.map_err(wallet_error)?;
    let accounts: Vec<String> = serde_json::from_value(raw)
        .map_err(|e| WalletError::Provider(format!("{} returned unexpected payload: {}", method, e)))?;
    accounts
        .iter()
        .map(|account| {
            account
                .parse::<Address>()
                .map_err(|e| WalletError::InvalidAddress(format!("{}: {}", account, e)))
        })
        .collect()
}
