use std::sync::Arc;

use domain::{
    DisplayName, ParticipantId, ParticipantRecord, RelayEvent, Role, RoomName, Timestamp,
};

use crate::{
    approved_registry::ApprovedRegistry,
    broadcaster::{RoomBroadcast, RoomBroadcaster},
    clock::Clock,
    error::ApplicationError,
    presence::ActivePresenceSet,
    request_queue::{EnqueueOutcome, RequestQueue},
};

#[derive(Debug, Clone, Default)]
pub struct SubmitRequest {
    pub identifier: String,
    pub display_name: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// 客服不排队，直接进入控制台
    AgentDashboard {
        identifier: ParticipantId,
        display_name: DisplayName,
    },
    /// 用户进入等待页
    Waiting {
        identifier: ParticipantId,
        display_name: DisplayName,
    },
    /// 用户此前已被批准
    AlreadyApproved {
        identifier: ParticipantId,
        display_name: DisplayName,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalReceipt {
    pub identifier: ParticipantId,
    pub display_name: DisplayName,
    pub approved_at: Timestamp,
}

/// 已批准状态查询结果，`checked_at` 为查询时刻
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovedStatus {
    pub record: ParticipantRecord,
    pub checked_at: Timestamp,
}

/// 在线且已批准的用户
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveUsers {
    pub users: Vec<ParticipantId>,
    pub timestamp: Timestamp,
}

pub struct AdmissionServiceDependencies {
    pub request_queue: Arc<RequestQueue>,
    pub approved_registry: Arc<ApprovedRegistry>,
    pub presence: Arc<ActivePresenceSet>,
    pub clock: Arc<dyn Clock>,
    pub broadcaster: Arc<dyn RoomBroadcaster>,
    pub agent_identifier: ParticipantId,
}

pub struct AdmissionService {
    deps: AdmissionServiceDependencies,
}

impl AdmissionService {
    pub fn new(deps: AdmissionServiceDependencies) -> Self {
        Self { deps }
    }

    /// 登录提交。所有校验在修改状态之前完成。
    pub async fn submit(&self, request: SubmitRequest) -> Result<SubmitOutcome, ApplicationError> {
        let identifier = ParticipantId::parse(request.identifier)?;
        let display_name = DisplayName::parse(request.display_name)?;
        let role: Role = request.role.parse()?;

        if role.is_agent() {
            tracing::info!(identifier = %identifier, "客服登录，跳转到控制台");
            return Ok(SubmitOutcome::AgentDashboard {
                identifier,
                display_name,
            });
        }

        let record = ParticipantRecord::new(identifier, display_name, role, self.deps.clock.now());
        match self
            .deps
            .request_queue
            .enqueue(record, &self.deps.approved_registry)
            .await
        {
            EnqueueOutcome::Queued(record) => {
                tracing::info!(
                    identifier = %record.identifier,
                    display_name = %record.display_name,
                    "用户进入等待队列"
                );
                Ok(SubmitOutcome::Waiting {
                    identifier: record.identifier,
                    display_name: record.display_name,
                })
            }
            EnqueueOutcome::AlreadyApproved(record) => {
                tracing::info!(identifier = %record.identifier, "用户已被批准，不再排队");
                Ok(SubmitOutcome::AlreadyApproved {
                    identifier: record.identifier,
                    display_name: record.display_name,
                })
            }
        }
    }

    pub async fn list_pending(&self) -> Vec<ParticipantRecord> {
        self.deps.request_queue.list().await
    }

    /// 批准等待中的用户，并通过一对一通道通知对方。
    pub async fn approve(&self, identifier: &str) -> Result<ApprovalReceipt, ApplicationError> {
        let identifier = ParticipantId::parse(identifier)?;

        let record = match self
            .deps
            .request_queue
            .approve_into(&identifier, &self.deps.approved_registry)
            .await
        {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(identifier = %identifier, "批准失败，等待队列中没有该用户");
                return Err(err.into());
            }
        };

        let approved_at = self.deps.clock.now();
        tracing::info!(identifier = %identifier, "用户已批准并移入已批准名单");

        // 状态已提交，通知失败只记录日志
        let notice = RoomBroadcast::new(
            RoomName::direct(&identifier),
            RelayEvent::request_approved(identifier.clone(), approved_at),
        );
        if let Err(err) = self.deps.broadcaster.publish(notice).await {
            tracing::error!(identifier = %identifier, error = %err, "批准通知发送失败");
        }

        Ok(ApprovalReceipt {
            identifier,
            display_name: record.display_name,
            approved_at,
        })
    }

    /// 按展示名称判断是否仍在等待
    pub async fn is_waiting(&self, display_name: &str) -> bool {
        self.deps.request_queue.is_waiting(display_name).await
    }

    pub async fn lookup_approved(
        &self,
        identifier: &str,
    ) -> Result<ApprovedStatus, ApplicationError> {
        let identifier = ParticipantId::parse(identifier)?;
        let record = self.deps.approved_registry.lookup(&identifier).await?;
        Ok(ApprovedStatus {
            record,
            checked_at: self.deps.clock.now(),
        })
    }

    pub async fn list_approved(&self) -> Vec<ParticipantRecord> {
        self.deps.approved_registry.list().await
    }

    /// 已批准且当前在线的用户，排除客服自身
    pub async fn active_users(&self) -> ActiveUsers {
        let mut users = Vec::new();
        for identifier in self.deps.presence.snapshot().await {
            if identifier == self.deps.agent_identifier {
                continue;
            }
            if self.deps.approved_registry.contains(&identifier).await {
                users.push(identifier);
            }
        }
        ActiveUsers {
            users,
            timestamp: self.deps.clock.now(),
        }
    }
}
