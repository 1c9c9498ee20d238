//! Google 翻译兼容接口
//!
//! 使用无需密钥的 `translate_a/single` 接口：GET 请求，响应为嵌套数组，
//! `[0][i][0]` 是第 i 个译文片段。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::{excerpt, Translator};
use crate::translation::config::GoogleSettings;
use crate::translation::error::{TranslationError, TranslationResult};

pub struct GoogleTranslator {
    api_url: String,
    client: Client,
}

impl GoogleTranslator {
    pub fn new(settings: &GoogleSettings, timeout: Duration) -> TranslationResult<Self> {
        if settings.api_url.trim().is_empty() {
            return Err(TranslationError::ConfigError("Google 翻译端点为空".to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TranslationError::ConfigError(format!("无法创建 HTTP 客户端: {}", e)))?;

        Ok(Self {
            api_url: settings.api_url.trim().to_string(),
            client,
        })
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    fn name(&self) -> &str {
        "google"
    }

    async fn translate(&self, text: &str, target_lang: &str) -> TranslationResult<String> {
        let target = google_language_code(target_lang);
        tracing::debug!("Google 翻译请求: {} 个字符 -> {}", text.chars().count(), target);

        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(TranslationError::ProviderError(format!(
                "Google 翻译返回 HTTP {}: {}",
                status,
                excerpt(&body)
            )));
        }

        parse_google_response(&body)
    }
}

/// 拼接 `[0][i][0]` 中的全部译文片段
pub(crate) fn parse_google_response(body: &str) -> TranslationResult<String> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        TranslationError::ProviderError(format!("Google 响应格式无效: {} ({})", e, excerpt(body)))
    })?;

    let segments = value
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| TranslationError::ProviderError(format!("Google 响应缺少译文: {}", excerpt(body))))?;

    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    Ok(translated)
}

/// Google 区分简体和繁体中文
fn google_language_code(code: &str) -> &str {
    match code.to_lowercase().as_str() {
        "zh" | "zh-cn" | "zh-hans" => "zh-CN",
        "zh-tw" | "zh-hk" | "zh-hant" => "zh-TW",
        _ => code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_segments() {
        let body = r#"[[["你好，","Hello, ",null,null,10],["世界。","world.",null,null,10]],null,"en"]"#;
        assert_eq!(parse_google_response(body).unwrap(), "你好，世界。");
    }

    #[test]
    fn malformed_response_is_provider_error() {
        assert!(matches!(
            parse_google_response("{\"error\":\"quota\"}"),
            Err(TranslationError::ProviderError(_))
        ));
        assert!(matches!(
            parse_google_response("not json"),
            Err(TranslationError::ProviderError(_))
        ));
    }

    #[test]
    fn chinese_codes_are_mapped() {
        assert_eq!(google_language_code("zh"), "zh-CN");
        assert_eq!(google_language_code("zh-TW"), "zh-TW");
        assert_eq!(google_language_code("ja"), "ja");
    }

    #[test]
    fn empty_endpoint_is_config_error() {
        let settings = GoogleSettings { api_url: "  ".to_string() };
        assert!(matches!(
            GoogleTranslator::new(&settings, Duration::from_secs(5)),
            Err(TranslationError::ConfigError(_))
        ));
    }
}
