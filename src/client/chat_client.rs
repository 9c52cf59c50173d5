use async_trait::async_trait;
use log::info;

use crate::{
    client::ChatGateway,
    connection::{DirectConnection, GatewayError},
    model::param::{ChatRequest, ChatResponse},
};

const CHAT_PATH: &str = "/dashboard/chat";

/// 通过 HTTP 访问后端 `/dashboard/chat` 的对话服务
#[derive(Clone)]
pub struct HttpChatGateway {
    connection: DirectConnection,
}

impl HttpChatGateway {
    pub fn new(connection: DirectConnection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl ChatGateway for HttpChatGateway {
    async fn chat(&self, request: &ChatRequest) -> Result<String, GatewayError> {
        info!(
            "chat 请求 district={} 历史消息数量={}",
            request.district,
            request.history.len()
        );
        let resp: ChatResponse = self.connection.post_json(CHAT_PATH, request).await?;
        Ok(resp.response)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{connection::common::testserver, model::Turn};

    #[tokio::test]
    async fn test_chat_posts_contract_body() {
        let (url, rx) = testserver::serve_once("200 OK", r#"{"response":"Use mulch.","context_used":"x"}"#).await;
        let gateway = HttpChatGateway::new(DirectConnection::new(&url, Duration::from_secs(5)).unwrap());
        let history = vec![Turn::assistant("greeting")];
        let answer = gateway
            .chat(&ChatRequest::new("Soybean drought help", "Beed", &history))
            .await
            .unwrap();
        assert_eq!(answer, "Use mulch.");

        let raw = rx.await.unwrap();
        assert!(raw.starts_with("POST /dashboard/chat "));
        let body = &raw[raw.find("\r\n\r\n").unwrap() + 4..];
        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(json["message"], "Soybean drought help");
        assert_eq!(json["district"], "Beed");
        assert_eq!(json["history"][0]["role"], "ai");
    }

    #[tokio::test]
    async fn test_missing_response_field_is_error() {
        let (url, _rx) = testserver::serve_once("200 OK", r#"{"answer":"wrong key"}"#).await;
        let gateway = HttpChatGateway::new(DirectConnection::new(&url, Duration::from_secs(5)).unwrap());
        let res = gateway.chat(&ChatRequest::new("q", "Beed", &[])).await;
        assert!(matches!(res, Err(GatewayError::Protocol(_))));
    }
}
