//! Giám sát mạng Substrate và thống kê mạng
//!
//! Monitor hỏi số block mới nhất theo chu kỳ và phát trạng thái qua kênh `watch`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use ethers::providers::Middleware;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{Result, WalletError};
use crate::evm::EvmSession;
use crate::substrate::SubstrateClient;
use crate::tokens::u256_to_display_amount;

/// Số lần hỏi liên tiếp không có block mới trước khi coi là suy giảm
pub const STALL_THRESHOLD: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkHealth {
    Healthy,
    Degraded,
    Error,
}

/// Trạng thái mạng
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkStatus {
    pub is_connected: bool,
    pub block_number: u64,
    pub last_update: Option<DateTime<Utc>>,
    pub health: NetworkHealth,
}

impl Default for NetworkStatus {
    fn default() -> Self {
        Self {
            is_connected: false,
            block_number: 0,
            last_update: None,
            health: NetworkHealth::Error,
        }
    }
}

/// Tính trạng thái kế tiếp từ kết quả một lần hỏi
fn next_status(previous: &NetworkStatus, stalled_polls: &mut u32, poll: Result<u64>) -> NetworkStatus {
    match poll {
        Ok(block_number) => {
            if block_number > previous.block_number {
                *stalled_polls = 0;
            } else {
                *stalled_polls += 1;
            }
            let health = if *stalled_polls >= STALL_THRESHOLD {
                NetworkHealth::Degraded
            } else {
                NetworkHealth::Healthy
            };
            NetworkStatus {
                is_connected: true,
                block_number: block_number.max(previous.block_number),
                last_update: Some(Utc::now()),
                health,
            }
        }
        Err(e) => {
            warn!("Không đọc được block mới nhất: {}", e);
            NetworkStatus {
                is_connected: false,
                health: NetworkHealth::Error,
                ..previous.clone()
            }
        }
    }
}

/// Monitor mạng Substrate
pub struct NetworkMonitor {
    status: watch::Receiver<NetworkStatus>,
    stop_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl NetworkMonitor {
    /// Khởi động monitor; không có client thì trạng thái luôn là lỗi
    pub fn start(client: Option<Arc<dyn SubstrateClient>>, interval: Duration) -> Self {
        let (status_tx, status) = watch::channel(NetworkStatus::default());
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let Some(client) = client else {
            warn!("Không có client Substrate, monitor không chạy");
            return Self {
                status,
                stop_tx,
                handle: None,
            };
        };

        let handle = tokio::spawn(async move {
            info!(endpoint = client.endpoint(), "Bắt đầu giám sát mạng");
            let mut ticker = tokio::time::interval(interval);
            let mut stalled_polls = 0u32;
            loop {
                tokio::select! {
                    biased;
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        let poll = client.best_block_number().await;
                        let next = next_status(&status_tx.borrow(), &mut stalled_polls, poll);
                        debug!(block = next.block_number, health = ?next.health, "Cập nhật trạng thái mạng");
                        status_tx.send_replace(next);
                    }
                }
            }
            info!("Dừng giám sát mạng");
        });

        Self {
            status,
            stop_tx,
            handle: Some(handle),
        }
    }

    pub fn status(&self) -> NetworkStatus {
        self.status.borrow().clone()
    }

    pub async fn stop(mut self) {
        let _ = self.stop_tx.send(true);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

/// Thống kê chain Substrate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubstrateStats {
    pub block_number: u64,
    pub total_issuance: u128,
    pub timestamp: DateTime<Utc>,
}

/// Thống kê chain EVM
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvmStats {
    pub block_number: u64,
    pub gas_price_gwei: f64,
    pub timestamp: DateTime<Utc>,
}

pub async fn substrate_network_stats(client: &dyn SubstrateClient) -> Result<SubstrateStats> {
    let (block_number, total_issuance) = tokio::join!(client.best_block_number(), client.total_issuance());
    Ok(SubstrateStats {
        block_number: block_number?,
        total_issuance: total_issuance?,
        timestamp: Utc::now(),
    })
}

pub async fn evm_network_stats(session: &EvmSession) -> Result<EvmStats> {
    let (block_number, gas_price) = tokio::join!(session.client.get_block_number(), session.client.get_gas_price());
    let block_number = block_number.map_err(|e| WalletError::QueryFailed(format!("eth_blockNumber: {}", e)))?;
    let gas_price = gas_price.map_err(|e| WalletError::QueryFailed(format!("eth_gasPrice: {}", e)))?;
    Ok(EvmStats {
        block_number: block_number.as_u64(),
        gas_price_gwei: u256_to_display_amount(gas_price, 9),
        timestamp: Utc::now(),
    })
}
