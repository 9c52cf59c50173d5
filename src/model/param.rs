use serde::{Deserialize, Serialize};

use crate::model::{Role, Turn};

/// 历史消息，只保留角色和内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

impl From<&Turn> for HistoryEntry {
    fn from(turn: &Turn) -> Self {
        Self {
            role: turn.role(),
            content: turn.content().to_string(),
        }
    }
}

/// `POST /chat` 请求体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub district: String,
    pub history: Vec<HistoryEntry>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, district: impl Into<String>, history: &[Turn]) -> Self {
        Self {
            message: message.into(),
            district: district.into(),
            history: history.iter().map(HistoryEntry::from).collect(),
        }
    }
}

/// `POST /chat` 响应体，其它字段（如 context_used）忽略
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub weather: String,
    pub temp: f64,
    #[serde(default)]
    pub city: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub commodity: String,
    pub price: f64,
    #[serde(default)]
    pub change: String,
}

/// 补贴方案
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scheme {
    pub name: String,
    #[serde(default)]
    pub benefit: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub category: Option<String>,
}

/// 管理接口的统一返回
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminStatus {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

impl AdminStatus {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}
