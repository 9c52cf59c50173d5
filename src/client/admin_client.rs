use std::path::Path;

use log::info;
use reqwest::multipart::{Form, Part};

use crate::{
    connection::{DirectConnection, GatewayError},
    model::param::AdminStatus,
};

/// 管理后台接口，每个调用都是一次性的请求
#[derive(Clone)]
pub struct AdminClient {
    connection: DirectConnection,
}

/// 新增补贴方案的表单字段
#[derive(Debug, Clone)]
pub struct NewScheme {
    pub category: String,
    pub name: String,
    pub benefit: String,
    pub kind: String,
}

impl AdminClient {
    pub fn new(connection: DirectConnection) -> Self {
        Self { connection }
    }

    /// 登录，凭据错误时后端返回 401
    pub async fn login(&self, username: &str, password: &str) -> Result<AdminStatus, GatewayError> {
        let body = self
            .connection
            .post_form("/admin/login", &[("username", username), ("password", password)])
            .await?;
        DirectConnection::decode(&body)
    }

    /// 新增补贴方案；后端成功后重定向到管理首页，不返回 JSON
    pub async fn add_scheme(&self, scheme: &NewScheme) -> Result<(), GatewayError> {
        self.connection
            .post_form(
                "/admin/add_scheme",
                &[
                    ("category", scheme.category.as_str()),
                    ("name", scheme.name.as_str()),
                    ("benefit", scheme.benefit.as_str()),
                    ("type", scheme.kind.as_str()),
                ],
            )
            .await?;
        info!("已新增补贴方案 {}", scheme.name);
        Ok(())
    }

    pub async fn upload_district_data(&self, path: &Path) -> Result<AdminStatus, GatewayError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| GatewayError::Protocol(format!("无法读取文件 {}: {}", path.display(), e)))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "district_data".to_string());
        let form = Form::new().part("file", Part::bytes(bytes).file_name(filename));
        let body = self
            .connection
            .post_multipart("/admin/upload_district_data", form)
            .await?;
        DirectConnection::decode(&body)
    }

    pub async fn update_context(&self, context_text: &str) -> Result<AdminStatus, GatewayError> {
        let body = self
            .connection
            .post_form("/admin/update_context", &[("context_text", context_text)])
            .await?;
        DirectConnection::decode(&body)
    }
}
