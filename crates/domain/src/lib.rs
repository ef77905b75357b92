//! 在线客服中转系统核心领域模型
//!
//! 包含参与者、角色、房间命名规则、聊天记录格式以及对外推送的事件定义。

pub mod errors;
pub mod events;
pub mod message;
pub mod participant;
pub mod room;
pub mod value_objects;

// 重新导出常用类型
pub use errors::*;
pub use events::*;
pub use message::*;
pub use participant::*;
pub use room::*;
pub use value_objects::*;
