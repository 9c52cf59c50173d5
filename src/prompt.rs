//! 会话中固定出现的文本：区县问候语和失败兜底回复

/// 问候语模板中区县名的占位符
pub const DISTRICT_PLACEHOLDER: &str = "{district}";

pub const DEFAULT_GREETING_TEMPLATE: &str = "नमस्कार! मी आपला शेती मित्र आहे. मी तुम्हाला {district} जिल्ह्यासाठी कशी मदत करू शकतो? (Hello! I am your farming friend. How can I help you with {district} district?)";

pub const DEFAULT_FALLBACK_MESSAGE: &str =
    "क्षमस्व, काहीतरी चूक झाली. कृपया पुन्हा प्रयत्न करा. (Sorry, something went wrong. Please try again.)";

pub const DEFAULT_SUBSIDY_TIP: &str =
    "PMKSY Drip Irrigation Scheme: get up to 55% subsidy for installing drip irrigation systems.";

/// 首页的快捷提问
pub const QUICK_QUESTIONS: [&str; 3] = ["Soybean drought help", "Cotton pest control", "Tur irrigation"];

/// 会话文本配置
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTexts {
    pub greeting_template: String,
    pub fallback_message: String,
}

impl Default for ChatTexts {
    fn default() -> Self {
        Self {
            greeting_template: DEFAULT_GREETING_TEMPLATE.to_string(),
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
        }
    }
}

impl ChatTexts {
    /// 生成区县问候语，结果一定包含区县名
    pub fn greeting(&self, district: &str) -> String {
        if self.greeting_template.contains(DISTRICT_PLACEHOLDER) {
            self.greeting_template.replace(DISTRICT_PLACEHOLDER, district)
        } else {
            format!("{} ({})", self.greeting_template, district)
        }
    }
}
