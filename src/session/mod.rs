//! Phiên ví và lưu trữ cờ kết nối

pub mod manager;
pub mod state;
pub mod store;

pub use manager::{
    connect_first_reachable, AutoReconnectReport, ConnectionManager, EvmConnection, SubstrateConnection,
};
pub use state::{SessionSlot, SessionState};
pub use store::{FileStore, MemoryStore, SessionStore};
