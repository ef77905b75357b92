//! 房间聊天记录
//!
//! 每个房间一份只追加的文本行列表，首次发送时才创建，进程退出前不会截断。

use std::{collections::HashMap, sync::Arc};

use domain::RoomName;
use tokio::sync::RwLock;

#[derive(Default)]
struct Transcript {
    lines: RwLock<Vec<String>>,
}

#[derive(Default)]
pub struct MessageLog {
    rooms: RwLock<HashMap<RoomName, Arc<Transcript>>>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一行，返回追加后的条数
    pub async fn append(&self, room: &RoomName, line: String) -> usize {
        let transcript = self.transcript_or_create(room).await;
        let mut lines = transcript.lines.write().await;
        lines.push(line);
        lines.len()
    }

    /// 从未发送过消息的房间返回空列表
    pub async fn history(&self, room: &RoomName) -> Vec<String> {
        let transcript = self.rooms.read().await.get(room).cloned();
        let Some(transcript) = transcript else {
            return Vec::new();
        };
        let lines = transcript.lines.read().await.clone();
        lines
    }

    pub async fn has_history(&self, room: &RoomName) -> bool {
        self.rooms.read().await.contains_key(room)
    }

    async fn transcript_or_create(&self, room: &RoomName) -> Arc<Transcript> {
        if let Some(existing) = self.rooms.read().await.get(room).cloned() {
            return existing;
        }
        self.rooms
            .write()
            .await
            .entry(room.clone())
            .or_default()
            .clone()
    }
}
