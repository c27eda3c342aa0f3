//! Phiên Substrate: extension, client RPC và storage

pub mod client;
pub mod extension;
pub mod keypair;
pub mod storage;
pub mod ws;

use std::fmt;
use std::sync::Arc;

use sp_core::crypto::AccountId32;

pub use client::{SubmittedExtrinsic, SubstrateClient, SubstrateConnector};
pub use extension::{ExtrinsicSigner, InjectedAccount, SigningPayload, SubstrateExtension, WatchOnlyExtension};
pub use keypair::{KeypairExtension, Sr25519Signer};
pub use storage::parse_account;
pub use ws::{StorageLayout, WsConnector, WsSubstrateClient};

/// Phiên Substrate đã kết nối (có thể không có client khi suy giảm)
#[derive(Clone)]
pub struct SubstrateSession {
    pub address: String,
    pub account: AccountId32,
    pub client: Option<Arc<dyn SubstrateClient>>,
    pub endpoint: Option<String>,
    pub extension: Arc<dyn SubstrateExtension>,
}

impl SubstrateSession {
    pub fn signer(&self) -> Option<Arc<dyn ExtrinsicSigner>> {
        self.extension.signer()
    }
}

impl fmt::Debug for SubstrateSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubstrateSession")
            .field("address", &self.address)
            .field("endpoint", &self.endpoint)
            .field("has_client", &self.client.is_some())
            .finish()
    }
}
