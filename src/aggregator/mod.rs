//! Tổng hợp số dư và điều phối làm mới

pub mod assets;
pub mod moonbase;
pub mod refresh;
pub mod vtokens;

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

pub use assets::{AssetSnapshot, BalanceAggregator, BalanceEntry};
pub use moonbase::{fetch_moonbase_balances, XcTokenBalance};
pub use refresh::{AutoRefresh, LatestRequest, RequestTicket};
pub use vtokens::{VTokenBalance, VTokenReader};

use crate::session::ConnectionManager;

/// Làm mới ảnh chụp tài sản, chỉ giữ kết quả của lần gọi mới nhất
pub struct AssetRefresher {
    aggregator: BalanceAggregator,
    manager: Arc<ConnectionManager>,
    latest: LatestRequest<AssetSnapshot>,
}

impl AssetRefresher {
    pub fn new(aggregator: BalanceAggregator, manager: Arc<ConnectionManager>) -> Self {
        Self {
            aggregator,
            manager,
            latest: LatestRequest::new(),
        }
    }

    /// Chạy một lần làm mới; trả về ảnh chụp nếu nó được áp dụng
    pub async fn refresh(&self) -> Option<AssetSnapshot> {
        let ticket = self.latest.begin();
        let entries = self.aggregator.fetch_from(&self.manager).await;
        let snapshot = AssetSnapshot {
            request_id: ticket.id(),
            taken_at: Utc::now(),
            entries,
        };
        if self.latest.complete(ticket, snapshot.clone()) {
            info!(request_id = ticket.id(), total = snapshot.total_value(), "Đã cập nhật tài sản");
            Some(snapshot)
        } else {
            None
        }
    }

    /// Ảnh chụp đang hiển thị
    pub fn snapshot(&self) -> Option<AssetSnapshot> {
        self.latest.current().map(|(_, snapshot)| snapshot)
    }
}
