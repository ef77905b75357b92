use async_trait::async_trait;
use domain::{RelayEvent, RoomName};
use thiserror::Error;

/// 发往某个房间的一条事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomBroadcast {
    pub room: RoomName,
    pub event: RelayEvent,
}

impl RoomBroadcast {
    pub fn new(room: RoomName, event: RelayEvent) -> Self {
        Self { room, event }
    }
}

#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("broadcast failed: {0}")]
    Failed(String),
}

impl BroadcastError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// 投递能力由传输层注入，核心只决定发什么、发到哪个房间。
#[async_trait]
pub trait RoomBroadcaster: Send + Sync {
    async fn publish(&self, payload: RoomBroadcast) -> Result<(), BroadcastError>;
}
