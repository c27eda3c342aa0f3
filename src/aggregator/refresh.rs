//! Điều phối làm mới dữ liệu
//!
//! Mỗi lần làm mới nhận một vé có số thứ tự tăng dần. Chỉ phản hồi của vé mới
//! nhất được áp dụng; phản hồi cũ về muộn bị bỏ.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Vé của một lần làm mới
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

struct Applied<T> {
    ticket: u64,
    value: T,
}

/// Giữ giá trị của lần làm mới mới nhất
pub struct LatestRequest<T> {
    issued: AtomicU64,
    current: Mutex<Option<Applied<T>>>,
}

impl<T> Default for LatestRequest<T> {
    fn default() -> Self {
        Self {
            issued: AtomicU64::new(0),
            current: Mutex::new(None),
        }
    }
}

impl<T: Clone> LatestRequest<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cấp vé mới, mọi vé cấp trước đó trở thành cũ
    pub fn begin(&self) -> RequestTicket {
        RequestTicket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Áp dụng kết quả nếu vé là vé mới nhất đã cấp, trả về `true` khi được áp dụng
    pub fn complete(&self, ticket: RequestTicket, value: T) -> bool {
        let mut current = self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let latest = self.issued.load(Ordering::SeqCst);
        let newer_applied = current.as_ref().map_or(false, |applied| applied.ticket >= ticket.0);
        if ticket.0 != latest || newer_applied {
            debug!(ticket = ticket.0, latest, "Bỏ phản hồi cũ");
            return false;
        }
        *current = Some(Applied {
            ticket: ticket.0,
            value,
        });
        true
    }

    /// Giá trị đang áp dụng cùng số vé của nó
    pub fn current(&self) -> Option<(u64, T)> {
        let current = self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        current.as_ref().map(|applied| (applied.ticket, applied.value.clone()))
    }
}

/// Tác vụ làm mới định kỳ
pub struct AutoRefresh {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl AutoRefresh {
    /// Chạy `refresh` mỗi `period`, lần đầu ngay lập tức
    pub fn start<F, Fut>(period: Duration, refresh: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        // Lần làm mới đang chạy luôn được chạy xong
                        refresh().await;
                    }
                }
            }
            info!("Đã dừng làm mới định kỳ");
        });
        Self { stop_tx, handle }
    }

    /// Dừng các lần làm mới tiếp theo
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Dừng và chờ tác vụ kết thúc
    pub async fn shutdown(self) {
        self.stop();
        let _ = self.handle.await;
    }
}
