use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::prompt::{self, ChatTexts, DISTRICT_PLACEHOLDER};

/// 环境变量，覆盖配置文件里的后端地址
pub const API_URL_ENV: &str = "KRISHI_API_URL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("读取配置文件失败 {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("JSON 配置解析错误: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML 配置解析错误: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("配置无效: {0}")]
    Invalid(String),
}

fn base_url_default() -> String {
    "http://localhost:8000".into()
}
fn districts_default() -> Vec<String> {
    ["Beed", "Latur", "Nashik", "Pune", "Nagpur"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_district_default() -> String {
    "Beed".into()
}
fn request_timeout_secs_default() -> u64 {
    60
}
fn greeting_template_default() -> String {
    prompt::DEFAULT_GREETING_TEMPLATE.into()
}
fn fallback_message_default() -> String {
    prompt::DEFAULT_FALLBACK_MESSAGE.into()
}
fn subsidy_tip_default() -> String {
    prompt::DEFAULT_SUBSIDY_TIP.into()
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Config {
    #[serde(default = "base_url_default")]
    pub base_url: String,
    #[serde(default = "districts_default")]
    pub districts: Vec<String>,
    #[serde(default = "default_district_default")]
    pub default_district: String,
    #[serde(default = "request_timeout_secs_default")]
    pub request_timeout_secs: u64,
    #[serde(default = "greeting_template_default")]
    pub greeting_template: String,
    #[serde(default = "fallback_message_default")]
    pub fallback_message: String,
    /// 拉取不到补贴方案时侧边栏显示的提示
    #[serde(default = "subsidy_tip_default")]
    pub subsidy_tip: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: base_url_default(),
            districts: districts_default(),
            default_district: default_district_default(),
            request_timeout_secs: request_timeout_secs_default(),
            greeting_template: greeting_template_default(),
            fallback_message: fallback_message_default(),
            subsidy_tip: subsidy_tip_default(),
        }
    }
}

impl Config {
    /// 读取默认位置的配置，不存在时使用默认配置
    pub fn local() -> Result<Self, ConfigError> {
        Self::load(&Self::default_path())
    }

    /// 当前目录的 config.json 优先，其次是用户配置目录下的 krishi-cli/config.json
    pub fn default_path() -> PathBuf {
        let local = PathBuf::from("config.json");
        if local.exists() {
            return local;
        }
        dirs::config_dir()
            .map(|dir| dir.join("krishi-cli").join("config.json"))
            .filter(|path| path.exists())
            .unwrap_or(local)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            Self::from_path(path)?
        } else {
            warn!("找不到配置文件 {}，使用默认配置", path.display());
            Self::default()
        };
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                config.base_url = url;
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// 按扩展名解析，.toml 走 toml，其它按 JSON
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config = if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };
        info!("已加载配置文件 {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.districts.is_empty() {
            return Err(ConfigError::Invalid("districts 不能为空".into()));
        }
        if !self.has_district(&self.default_district) {
            return Err(ConfigError::Invalid(format!(
                "default_district {} 不在 districts 中",
                self.default_district
            )));
        }
        if !self.greeting_template.contains(DISTRICT_PLACEHOLDER) {
            return Err(ConfigError::Invalid(format!(
                "greeting_template 必须包含 {}",
                DISTRICT_PLACEHOLDER
            )));
        }
        if self.fallback_message.trim().is_empty() {
            return Err(ConfigError::Invalid("fallback_message 不能为空".into()));
        }
        Ok(())
    }

    /// 不区分大小写查找区县，返回配置中的写法
    pub fn find_district(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        self.districts
            .iter()
            .find(|d| d.eq_ignore_ascii_case(name))
            .map(|d| d.as_str())
    }

    pub fn has_district(&self, name: &str) -> bool {
        self.find_district(name).is_some()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn chat_texts(&self) -> ChatTexts {
        ChatTexts {
            greeting_template: self.greeting_template.clone(),
            fallback_message: self.fallback_message.clone(),
        }
    }
}
