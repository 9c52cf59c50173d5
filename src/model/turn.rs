use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// 消息的发出方
///
/// 后端协议里助手一方使用 `ai` 作为角色名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "ai")]
    Assistant,
}

impl Role {
    /// 界面上显示的标题
    pub fn title(&self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Assistant => "AI Krishi Sahayak",
        }
    }
}

/// 会话中的一条消息，创建后不可修改
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    role: Role,
    content: String,
    created_at: DateTime<Local>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Local::now(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"ai\"");
        let role: Role = serde_json::from_str("\"ai\"").unwrap();
        assert_eq!(role, Role::Assistant);
    }

    #[test]
    fn test_turn_constructors() {
        let turn = Turn::user("Tur irrigation");
        assert_eq!(turn.role(), Role::User);
        assert_eq!(turn.content(), "Tur irrigation");
        assert_eq!(Turn::assistant("ok").role(), Role::Assistant);
    }
}
