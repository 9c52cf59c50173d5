use std::time::Duration;

use log::{debug, error, info};
use reqwest::{RequestBuilder, multipart::Form};
use serde::{Serialize, de::DeserializeOwned};

use crate::connection::GatewayError;

/// 直连后端的 HTTP 连接，所有客户端共享同一套状态码和报文处理
#[derive(Clone, Debug)]
pub struct DirectConnection {
    client: reqwest::Client,
    base_url: String,
}

impl DirectConnection {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let parsed = reqwest::Url::parse(base_url).map_err(|e| GatewayError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(GatewayError::InvalidUrl {
                url: base_url.to_string(),
                reason: format!("unsupported scheme {}", parsed.scheme()),
            });
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, GatewayError> {
        let request = self.client.get(self.url(path)).query(query);
        let text = Self::request(request).await?;
        Self::decode(&text)
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        let request = self.client.post(self.url(path)).json(body);
        let text = Self::request(request).await?;
        Self::decode(&text)
    }

    /// 提交表单，返回原始响应文本
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Result<String, GatewayError> {
        let request = self.client.post(self.url(path)).form(form);
        Self::request(request).await
    }

    pub async fn post_multipart(&self, path: &str, form: Form) -> Result<String, GatewayError> {
        let request = self.client.post(self.url(path)).multipart(form);
        Self::request(request).await
    }

    async fn request(request: RequestBuilder) -> Result<String, GatewayError> {
        let response = request.send().await?;
        let status = response.status();
        info!("请求 {} 返回 {}", response.url(), status);
        let body = response.text().await?;
        if !status.is_success() {
            error!("{:?}", body);
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T, GatewayError> {
        serde_json::from_str(text).map_err(|e| {
            debug!("无法解析响应: {}", text);
            GatewayError::from(e)
        })
    }
}
