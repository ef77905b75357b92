use std::{collections::HashMap, sync::Arc};

use domain::RoomName;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// 房间内事件排序器
///
/// 每个房间一把互斥锁，持有期间完成「修改状态 + 发布事件」，
/// 因此同一房间的事件按提交顺序到达订阅者；不同房间互不影响。
///
/// 新建锁时顺带清理空闲的锁（只剩映射表自己持有），
/// 表的大小受同时活跃的房间数约束，而不是历史上出现过的房间名数。
#[derive(Default)]
pub struct RoomSequencer {
    gates: RwLock<HashMap<RoomName, Arc<Mutex<()>>>>,
}

impl RoomSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn enter(&self, room: &RoomName) -> OwnedMutexGuard<()> {
        let existing = self.gates.read().await.get(room).cloned();
        let gate = match existing {
            Some(gate) => gate,
            None => {
                let mut gates = self.gates.write().await;
                // 写锁内没有人能再克隆出新的引用，计数为 1 的锁无人持有也无人等待
                gates.retain(|name, gate| name == room || Arc::strong_count(gate) > 1);
                gates
                    .entry(room.clone())
                    .or_insert_with(|| Arc::new(Mutex::new(())))
                    .clone()
            }
        };
        gate.lock_owned().await
    }

    #[cfg(test)]
    async fn gate_count(&self) -> usize {
        self.gates.read().await.len()
    }
}
