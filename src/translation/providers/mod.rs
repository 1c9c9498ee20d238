//! 翻译服务适配器
//!
//! - `ai`: OpenAI 兼容的聊天补全接口
//! - `google`: Google 翻译兼容的公开接口
//!
//! 两者都实现 [`Translator`]，管道只依赖这个特性。

use std::sync::Arc;

use async_trait::async_trait;

use crate::translation::config::{ServiceKind, TranslationConfig};
use crate::translation::error::{TranslationError, TranslationResult};

pub mod ai;
pub mod google;

pub use ai::AiTranslator;
pub use google::GoogleTranslator;

/// 翻译服务的统一接口
///
/// `text` 可能包含内联 HTML 标记，实现需要尽量保留这些标记。
#[async_trait]
pub trait Translator: Send + Sync {
    /// 服务名称，用于日志
    fn name(&self) -> &str;

    /// 把 `text` 翻译为 `target_lang`
    async fn translate(&self, text: &str, target_lang: &str) -> TranslationResult<String>;
}

/// 服务是否具备必需的配置
pub fn is_available(kind: ServiceKind, config: &TranslationConfig) -> bool {
    match kind {
        ServiceKind::Ai => config.ai.is_configured(),
        ServiceKind::Google => config.google.is_configured(),
    }
}

/// 按优先级选择翻译服务
///
/// 优先使用配置的默认服务；它缺少必需配置时回退到另一种服务；都不可用时返回配置错误。
pub fn select_translator(config: &TranslationConfig) -> TranslationResult<Arc<dyn Translator>> {
    let preferred = config.default_service;

    let kind = if is_available(preferred, config) {
        preferred
    } else if is_available(preferred.other(), config) {
        tracing::warn!("首选翻译服务 {} 未配置，回退到 {}", preferred, preferred.other());
        preferred.other()
    } else {
        return Err(TranslationError::ConfigError(
            "没有可用的翻译服务：AI 服务缺少端点或密钥，Google 服务端点为空".to_string(),
        ));
    };

    build_translator(kind, config)
}

fn build_translator(kind: ServiceKind, config: &TranslationConfig) -> TranslationResult<Arc<dyn Translator>> {
    let translator: Arc<dyn Translator> = match kind {
        ServiceKind::Ai => Arc::new(AiTranslator::new(&config.ai, config.request_timeout())?),
        ServiceKind::Google => Arc::new(GoogleTranslator::new(&config.google, config.request_timeout())?),
    };

    tracing::info!("使用翻译服务: {}", translator.name());
    Ok(translator)
}

/// 截断过长的响应内容，避免日志和错误信息过大
pub(crate) fn excerpt(body: &str) -> String {
    const LIMIT: usize = 200;
    if body.chars().count() <= LIMIT {
        body.to_string()
    } else {
        format!("{}...", body.chars().take(LIMIT).collect::<String>())
    }
}
