//! 应用层实现。
//!
//! 这里维护等待队列、已批准名单、在线集合与房间聊天记录这几份共享状态，
//! 并提供围绕它们的用例服务。消息投递通过 `RoomBroadcaster` 抽象交给外部传输层。

pub mod approved_registry;
pub mod broadcaster;
pub mod clock;
pub mod error;
pub mod local_broadcast;
pub mod message_log;
pub mod presence;
pub mod request_queue;
pub mod sequencer;
pub mod services;

pub use approved_registry::ApprovedRegistry;
pub use broadcaster::{BroadcastError, RoomBroadcast, RoomBroadcaster};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ApplicationError, ApplicationResult};
pub use local_broadcast::{LocalRoomBroadcaster, RoomSet, RoomSubscription};
pub use message_log::MessageLog;
pub use presence::ActivePresenceSet;
pub use request_queue::{EnqueueOutcome, RequestQueue};
pub use sequencer::RoomSequencer;
pub use services::{
    AdmissionService, AdmissionServiceDependencies, RelayService, RelayServiceDependencies,
};
