use std::sync::Arc;

use application::{
    ActivePresenceSet, AdmissionService, AdmissionServiceDependencies, ApprovedRegistry, Clock,
    LocalRoomBroadcaster, MessageLog, RelayService, RelayServiceDependencies, RequestQueue,
    RoomBroadcaster, RoomSequencer, SystemClock,
};
use config::AppConfig;
use domain::{DomainError, ParticipantId};

#[derive(Clone)]
pub struct AppState {
    pub admission: Arc<AdmissionService>,
    pub relay: Arc<RelayService>,
    pub broadcaster: Arc<LocalRoomBroadcaster>,
    pub cors_origins: Arc<Vec<String>>,
}

impl AppState {
    pub fn new(
        admission: Arc<AdmissionService>,
        relay: Arc<RelayService>,
        broadcaster: Arc<LocalRoomBroadcaster>,
        cors_origins: Vec<String>,
    ) -> Self {
        Self {
            admission,
            relay,
            broadcaster,
            cors_origins: Arc::new(cors_origins),
        }
    }

    /// 用内存存储和进程内广播器组装全部服务
    pub fn from_config(config: &AppConfig) -> Result<Self, DomainError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &AppConfig, clock: Arc<dyn Clock>) -> Result<Self, DomainError> {
        let agent_identifier = ParticipantId::parse(config.agent.identifier.as_str())?;
        let broadcaster = Arc::new(LocalRoomBroadcaster::with_capacity(
            config.broadcast.capacity,
        ));
        let publisher: Arc<dyn RoomBroadcaster> = broadcaster.clone();
        let presence = Arc::new(ActivePresenceSet::new());

        let admission = AdmissionService::new(AdmissionServiceDependencies {
            request_queue: Arc::new(RequestQueue::new()),
            approved_registry: Arc::new(ApprovedRegistry::new()),
            presence: presence.clone(),
            clock: clock.clone(),
            broadcaster: publisher.clone(),
            agent_identifier: agent_identifier.clone(),
        });

        let relay = RelayService::new(RelayServiceDependencies {
            message_log: Arc::new(MessageLog::new()),
            sequencer: Arc::new(RoomSequencer::new()),
            presence,
            clock,
            broadcaster: publisher,
            system_label: config.relay.system_label.clone(),
            agent_identifier,
        });

        Ok(Self::new(
            Arc::new(admission),
            Arc::new(relay),
            broadcaster,
            config.server.cors_origins.clone(),
        ))
    }
}
