mod admission_service;
mod relay_service;

pub use admission_service::{
    ActiveUsers, AdmissionService, AdmissionServiceDependencies, ApprovalReceipt, ApprovedStatus,
    SubmitOutcome, SubmitRequest,
};
pub use relay_service::{
    ChatView, ChatViewRequest, JoinRequest, LeaveRequest, RelayService,
    RelayServiceDependencies, SendMessageRequest,
};

#[cfg(test)]
pub(crate) mod test_support;
