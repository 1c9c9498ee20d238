//! OpenAI 兼容的聊天补全翻译服务

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{excerpt, Translator};
use crate::translation::config::{constants, AiSettings};
use crate::translation::error::{TranslationError, TranslationResult};

/// 聊天消息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// AI 翻译服务
pub struct AiTranslator {
    api_url: String,
    api_key: String,
    model: String,
    client: Client,
}

impl AiTranslator {
    /// 端点、密钥或模型缺失时返回配置错误
    pub fn new(settings: &AiSettings, timeout: Duration) -> TranslationResult<Self> {
        let api_key = settings
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| TranslationError::ConfigError("AI 服务缺少 API 密钥".to_string()))?;

        if settings.api_url.trim().is_empty() {
            return Err(TranslationError::ConfigError("AI 服务缺少端点地址".to_string()));
        }
        if settings.model.trim().is_empty() {
            return Err(TranslationError::ConfigError("AI 服务缺少模型名称".to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TranslationError::ConfigError(format!("无法创建 HTTP 客户端: {}", e)))?;

        Ok(Self {
            api_url: settings.api_url.trim().to_string(),
            api_key: api_key.to_string(),
            model: settings.model.trim().to_string(),
            client,
        })
    }

    fn build_messages(text: &str, target_lang: &str) -> Vec<ChatMessage> {
        let system = format!(
            "You are a professional translator. Translate the user's content into {}. \
             The content may contain HTML: keep every tag and attribute exactly as it is and \
             translate only the human-readable text. Reply with the translation only.",
            language_name(target_lang)
        );

        vec![
            ChatMessage {
                role: "system".to_string(),
                content: system,
            },
            ChatMessage {
                role: "user".to_string(),
                content: text.to_string(),
            },
        ]
    }
}

#[async_trait]
impl Translator for AiTranslator {
    fn name(&self) -> &str {
        "ai"
    }

    async fn translate(&self, text: &str, target_lang: &str) -> TranslationResult<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: Self::build_messages(text, target_lang),
            max_tokens: constants::AI_MAX_TOKENS,
            temperature: constants::AI_TEMPERATURE,
        };

        tracing::debug!("AI 翻译请求: {} 个字符 -> {}", text.chars().count(), target_lang);

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(TranslationError::ProviderError(format!(
                "AI 服务返回 HTTP {}: {}",
                status,
                excerpt(&body)
            )));
        }

        parse_chat_response(&body)
    }
}

/// 取第一条回复的内容，去掉可能包裹的代码块围栏
pub(crate) fn parse_chat_response(body: &str) -> TranslationResult<String> {
    let response: ChatResponse = serde_json::from_str(body).map_err(|e| {
        TranslationError::ProviderError(format!("AI 响应格式无效: {} ({})", e, excerpt(body)))
    })?;

    let content = response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| TranslationError::ProviderError("AI 响应没有候选结果".to_string()))?;

    Ok(strip_code_fence(content.trim()).to_string())
}

fn strip_code_fence(content: &str) -> &str {
    let Some(rest) = content.strip_prefix("```") else {
        return content;
    };
    let Some(inner) = rest.strip_suffix("```") else {
        return content;
    };

    // 去掉围栏后的语言标记，例如 ```html
    match inner.split_once('\n') {
        Some((lang, body)) if !lang.contains(' ') => body.trim(),
        _ => inner.trim(),
    }
}

/// 常见语言代码对应的英文名称，模型对名称的理解比代码更稳定
fn language_name(code: &str) -> &str {
    match code.to_lowercase().as_str() {
        "zh" | "zh-cn" | "zh-hans" => "Simplified Chinese",
        "zh-tw" | "zh-hk" | "zh-hant" => "Traditional Chinese",
        "en" => "English",
        "ja" => "Japanese",
        "ko" => "Korean",
        "fr" => "French",
        "de" => "German",
        "es" => "Spanish",
        "ru" => "Russian",
        "pt" => "Portuguese",
        "it" => "Italian",
        _ => code,
    }
}
