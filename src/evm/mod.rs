//! Phiên EVM: provider tiêm, transport ethers, contract và chuyển mạng

pub mod contracts;
pub mod injected;
pub mod network;
pub mod transport;

use std::fmt;
use std::sync::Arc;

use ethers::providers::Provider;
use ethers::types::Address;

pub use contracts::{Erc20Token, XcVToken};
pub use injected::{InjectedProvider, LocalWalletProvider};
pub use network::NetworkSwitchOffer;
pub use transport::InjectedTransport;

/// Client ethers với người ký là ví tiêm
pub type EvmClient = Provider<InjectedTransport>;

/// Phiên EVM đã kết nối
#[derive(Clone)]
pub struct EvmSession {
    pub address: Address,
    pub chain_id: u64,
    pub client: Arc<EvmClient>,
    provider: Arc<dyn InjectedProvider>,
}

impl fmt::Debug for EvmSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvmSession")
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

impl EvmSession {
    pub fn new(provider: Arc<dyn InjectedProvider>, address: Address, chain_id: u64) -> Self {
        let client = Provider::new(InjectedTransport::new(provider.clone())).with_sender(address);
        Self {
            address,
            chain_id,
            client: Arc::new(client),
            provider,
        }
    }

    pub fn provider(&self) -> &Arc<dyn InjectedProvider> {
        &self.provider
    }
}
