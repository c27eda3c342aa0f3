//! Extension ký bằng khóa sr25519 cục bộ
//!
//! Khóa được dựng từ SURI (mnemonic, seed hex hoặc `//Alice`). Bộ ký tạo
//! extrinsic v4 đã ký: địa chỉ `MultiAddress::Id`, chữ ký `MultiSignature::Sr25519`,
//! era bất tử, nonce và tip dạng compact.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use codec::{Compact, Encode};
use sp_core::crypto::{AccountId32, Ss58Codec};
use sp_core::{sr25519, Pair};
use sp_crypto_hashing::blake2_256;
use tracing::{debug, info};

use super::extension::{ExtrinsicSigner, InjectedAccount, SigningPayload, SubstrateExtension};
use crate::error::{Result, WalletError};

/// Phiên bản extrinsic 4, bit cao đánh dấu có chữ ký
const SIGNED_EXTRINSIC_V4: u8 = 0x84;
const MULTI_ADDRESS_ID: u8 = 0x00;
const MULTI_SIGNATURE_SR25519: u8 = 0x01;
const IMMORTAL_ERA: u8 = 0x00;
/// Payload dài hơn ngưỡng này được ký qua blake2_256
const MAX_RAW_PAYLOAD: usize = 256;

/// Dữ liệu được ký cho một extrinsic bất tử với tip 0
///
/// Khối tham chiếu của era bất tử là khối genesis.
pub fn signed_payload(payload: &SigningPayload) -> Vec<u8> {
    let mut out = payload.call.clone();
    out.push(IMMORTAL_ERA);
    Compact(payload.nonce).encode_to(&mut out);
    Compact(0u128).encode_to(&mut out);
    payload.spec_version.encode_to(&mut out);
    payload.transaction_version.encode_to(&mut out);
    out.extend_from_slice(&payload.genesis_hash);
    out.extend_from_slice(&payload.genesis_hash);
    out
}

/// Bộ ký sr25519
#[derive(Clone)]
pub struct Sr25519Signer {
    pair: sr25519::Pair,
}

impl Sr25519Signer {
    pub fn from_suri(suri: &str) -> Result<Self> {
        let pair = sr25519::Pair::from_string(suri.trim(), None)
            .map_err(|e| WalletError::Config(format!("invalid substrate SURI: {:?}", e)))?;
        Ok(Self { pair })
    }

    pub fn account(&self) -> AccountId32 {
        AccountId32::from(self.pair.public())
    }

    pub fn address(&self) -> String {
        self.pair.public().to_ss58check()
    }
}

impl fmt::Debug for Sr25519Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sr25519Signer").field("address", &self.address()).finish()
    }
}

#[async_trait]
impl ExtrinsicSigner for Sr25519Signer {
    async fn sign(&self, payload: &SigningPayload) -> Result<Vec<u8>> {
        let signer = self.address();
        if payload.address != signer {
            return Err(WalletError::TransactionFailed(format!(
                "payload is for {}, key belongs to {}",
                payload.address, signer
            )));
        }

        let raw = signed_payload(payload);
        let signature = if raw.len() > MAX_RAW_PAYLOAD {
            self.pair.sign(&blake2_256(&raw))
        } else {
            self.pair.sign(&raw)
        };

        let account = self.account();
        let mut body = vec![SIGNED_EXTRINSIC_V4, MULTI_ADDRESS_ID];
        body.extend_from_slice(account.as_ref());
        body.push(MULTI_SIGNATURE_SR25519);
        body.extend_from_slice(signature.as_ref());
        body.push(IMMORTAL_ERA);
        Compact(payload.nonce).encode_to(&mut body);
        Compact(0u128).encode_to(&mut body);
        body.extend_from_slice(&payload.call);

        debug!(nonce = payload.nonce, len = body.len(), "Đã ký extrinsic");
        // Extrinsic được mã hóa như Vec<u8>: tiền tố độ dài compact
        Ok(body.encode())
    }
}

/// Extension có một tài khoản duy nhất, ký bằng khóa cục bộ
#[derive(Debug, Clone)]
pub struct KeypairExtension {
    signer: Arc<Sr25519Signer>,
}

impl KeypairExtension {
    pub fn from_suri(suri: &str) -> Result<Self> {
        let signer = Sr25519Signer::from_suri(suri)?;
        info!("Tạo extension khóa cục bộ cho {}", signer.address());
        Ok(Self {
            signer: Arc::new(signer),
        })
    }

    pub fn address(&self) -> String {
        self.signer.address()
    }
}

#[async_trait]
impl SubstrateExtension for KeypairExtension {
    async fn enable(&self, app_name: &str) -> Result<usize> {
        debug!("Bật extension khóa cục bộ cho {}", app_name);
        Ok(1)
    }

    async fn accounts(&self) -> Result<Vec<InjectedAccount>> {
        Ok(vec![InjectedAccount {
            address: self.signer.address(),
            name: Some("local-key".to_string()),
        }])
    }

    fn signer(&self) -> Option<Arc<dyn ExtrinsicSigner>> {
        Some(self.signer.clone())
    }
}
