use thiserror::Error;

pub mod common;

pub use common::DirectConnection;

/// 后端请求错误
///
/// 对会话控制器而言请求错误等价，都会降级为兜底回复。
/// InvalidUrl 只在创建连接时出现
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("无效的后端地址 {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("网络请求失败: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("服务端返回错误状态 {status}: {body}")]
    Status { status: u16, body: String },

    #[error("响应格式错误: {0}")]
    Protocol(String),
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        GatewayError::Protocol(e.to_string())
    }
}
