// 进程内广播器实现
use std::{collections::HashSet, sync::Arc};

use crate::broadcaster::{BroadcastError, RoomBroadcast, RoomBroadcaster};
use async_trait::async_trait;
use domain::RoomName;
use tokio::sync::{broadcast, RwLock};

#[derive(Clone)]
pub struct LocalRoomBroadcaster {
    sender: broadcast::Sender<RoomBroadcast>,
}

impl LocalRoomBroadcaster {
    pub fn new() -> Self {
        Self::with_capacity(1000)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// 新订阅不属于任何房间，需要通过 `RoomSet` 加入
    pub fn subscribe(&self) -> RoomSubscription {
        RoomSubscription::new(self.sender.subscribe())
    }
}

impl Default for LocalRoomBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomBroadcaster for LocalRoomBroadcaster {
    async fn publish(&self, payload: RoomBroadcast) -> Result<(), BroadcastError> {
        let room = payload.room.clone();
        // 没有任何订阅者时 send 会返回错误，这不算投递失败
        if self.sender.receiver_count() == 0 {
            tracing::debug!(room = %room, event = payload.event.name(), "房间没有订阅者，事件被丢弃");
            return Ok(());
        }
        match self.sender.send(payload) {
            Ok(_) => Ok(()),
            Err(err) => {
                tracing::debug!(room = %room, error = %err, "订阅者在发送前全部断开");
                Ok(())
            }
        }
    }
}

/// 一个连接当前加入的房间集合，可在接收循环之外修改
#[derive(Clone, Default)]
pub struct RoomSet {
    rooms: Arc<RwLock<HashSet<RoomName>>>,
}

impl RoomSet {
    pub async fn insert(&self, room: RoomName) -> bool {
        self.rooms.write().await.insert(room)
    }

    pub async fn remove(&self, room: &RoomName) -> bool {
        self.rooms.write().await.remove(room)
    }

    pub async fn contains(&self, room: &RoomName) -> bool {
        self.rooms.read().await.contains(room)
    }
}

// 按房间过滤的事件流
pub struct RoomSubscription {
    receiver: broadcast::Receiver<RoomBroadcast>,
    rooms: RoomSet,
    /// 已从通道取出、尚未完成房间过滤的事件
    pending: Option<RoomBroadcast>,
}

impl RoomSubscription {
    pub fn new(receiver: broadcast::Receiver<RoomBroadcast>) -> Self {
        Self {
            receiver,
            rooms: RoomSet::default(),
            pending: None,
        }
    }

    pub fn rooms(&self) -> RoomSet {
        self.rooms.clone()
    }

    /// 可以放在 `tokio::select!` 中使用：在等待房间集合读锁时被取消，
    /// 取出的事件留在 `pending` 里，下次调用继续过滤。
    pub async fn recv(&mut self) -> Option<RoomBroadcast> {
        loop {
            if self.pending.is_none() {
                match self.receiver.recv().await {
                    Ok(broadcast) => self.pending = Some(broadcast),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "订阅者消费过慢，部分事件被跳过");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }

            // 过滤只属于已加入房间的事件
            if let Some(broadcast) = &self.pending {
                if self.rooms.contains(&broadcast.room).await {
                    return self.pending.take();
                }
            }
            self.pending = None;
        }
    }
}
