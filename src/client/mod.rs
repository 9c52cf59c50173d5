use async_trait::async_trait;

use crate::{connection::GatewayError, model::param::ChatRequest};

pub mod admin_client;
pub mod chat_client;
pub mod dashboard_client;

pub use admin_client::AdminClient;
pub use chat_client::HttpChatGateway;
pub use dashboard_client::{DashboardClient, SidebarData};

/// 远端对话服务
///
/// 每次调用对应一轮用户提问，返回完整的回复文本（markdown）
#[async_trait]
pub trait ChatGateway: Send + Sync {
    async fn chat(&self, request: &ChatRequest) -> Result<String, GatewayError>;
}
