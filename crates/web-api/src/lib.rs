//! Web API 层。
//!
//! 提供 Axum 路由与 WebSocket 事件入口，把请求委托给应用层的准入服务与中转服务。

mod error;
mod routes;
mod state;
mod ws_connection;

pub use error::{ApiError, ErrorBody};
pub use routes::router;
pub use state::AppState;
