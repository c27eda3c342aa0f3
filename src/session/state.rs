//! Trạng thái của một phiên

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Máy trạng thái của mỗi phiên
///
/// `Disconnected -> Connecting -> {Connected | ConnectedDegraded | Disconnected}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    /// Có địa chỉ nhưng không có client sống
    ConnectedDegraded,
}

impl SessionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, SessionState::Connected | SessionState::ConnectedDegraded)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Disconnected => write!(f, "disconnected"),
            SessionState::Connecting => write!(f, "connecting"),
            SessionState::Connected => write!(f, "connected"),
            SessionState::ConnectedDegraded => write!(f, "connected (degraded)"),
        }
    }
}

/// Ô chứa một phiên cùng trạng thái của nó
#[derive(Debug)]
pub struct SessionSlot<T> {
    pub state: SessionState,
    pub session: Option<Arc<T>>,
}

impl<T> Default for SessionSlot<T> {
    fn default() -> Self {
        Self {
            state: SessionState::Disconnected,
            session: None,
        }
    }
}

impl<T> SessionSlot<T> {
    /// Đặt phiên mới, trả về phiên cũ nếu có
    pub fn set(&mut self, state: SessionState, session: Arc<T>) -> Option<Arc<T>> {
        self.state = state;
        self.session.replace(session)
    }

    pub fn clear(&mut self) -> Option<Arc<T>> {
        self.state = SessionState::Disconnected;
        self.session.take()
    }
}
