//! 服务测试共用的替身实现

use std::sync::Arc;

use async_trait::async_trait;
use domain::{ParticipantId, Timestamp};
use tokio::sync::Mutex;

use crate::{
    approved_registry::ApprovedRegistry,
    broadcaster::{BroadcastError, RoomBroadcast, RoomBroadcaster},
    clock::FixedClock,
    message_log::MessageLog,
    presence::ActivePresenceSet,
    request_queue::RequestQueue,
    sequencer::RoomSequencer,
    services::{
        AdmissionService, AdmissionServiceDependencies, RelayService, RelayServiceDependencies,
    },
};

pub const NOW: &str = "2024-06-01 12:30:00";

/// 记录所有发布的事件
#[derive(Default)]
pub struct RecordingBroadcaster {
    published: Mutex<Vec<RoomBroadcast>>,
}

impl RecordingBroadcaster {
    pub async fn published(&self) -> Vec<RoomBroadcast> {
        self.published.lock().await.clone()
    }
}

#[async_trait]
impl RoomBroadcaster for RecordingBroadcaster {
    async fn publish(&self, payload: RoomBroadcast) -> Result<(), BroadcastError> {
        self.published.lock().await.push(payload);
        Ok(())
    }
}

/// 总是失败的广播器
pub struct FailingBroadcaster;

#[async_trait]
impl RoomBroadcaster for FailingBroadcaster {
    async fn publish(&self, _payload: RoomBroadcast) -> Result<(), BroadcastError> {
        Err(BroadcastError::failed("transport down"))
    }
}

pub struct Harness {
    pub admission: AdmissionService,
    pub relay: RelayService,
    pub queue: Arc<RequestQueue>,
    pub registry: Arc<ApprovedRegistry>,
    pub presence: Arc<ActivePresenceSet>,
    pub broadcaster: Arc<RecordingBroadcaster>,
}

pub fn harness() -> Harness {
    harness_with(None)
}

pub fn harness_with(broadcaster_override: Option<Arc<dyn RoomBroadcaster>>) -> Harness {
    let queue = Arc::new(RequestQueue::new());
    let registry = Arc::new(ApprovedRegistry::new());
    let presence = Arc::new(ActivePresenceSet::new());
    let recording = Arc::new(RecordingBroadcaster::default());
    let broadcaster: Arc<dyn RoomBroadcaster> =
        broadcaster_override.unwrap_or_else(|| recording.clone() as Arc<dyn RoomBroadcaster>);
    let clock = Arc::new(FixedClock(Timestamp::parse(NOW).unwrap()));
    let agent = ParticipantId::parse("liveagent").unwrap();

    let admission = AdmissionService::new(AdmissionServiceDependencies {
        request_queue: queue.clone(),
        approved_registry: registry.clone(),
        presence: presence.clone(),
        clock: clock.clone(),
        broadcaster: broadcaster.clone(),
        agent_identifier: agent.clone(),
    });
    let relay = RelayService::new(RelayServiceDependencies {
        message_log: Arc::new(MessageLog::new()),
        sequencer: Arc::new(RoomSequencer::new()),
        presence: presence.clone(),
        clock,
        broadcaster,
        system_label: "System".to_string(),
        agent_identifier: agent,
    });

    Harness {
        admission,
        relay,
        queue,
        registry,
        presence,
        broadcaster: recording,
    }
}
