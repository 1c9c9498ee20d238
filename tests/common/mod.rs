// 集成测试公共模块
//
// 提供模拟翻译服务和测试辅助工具

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use feedtrans::translation::{
    DisplayMode, TranslateRequest, TranslationConfig, TranslationError, TranslationResult,
    TranslationService, Translator,
};

/// 返回 `[原文]` 并记录每次请求的文本
#[derive(Default)]
pub struct BracketTranslator {
    calls: Mutex<Vec<String>>,
}

impl BracketTranslator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Translator for BracketTranslator {
    fn name(&self) -> &str {
        "bracket"
    }

    async fn translate(&self, text: &str, _target_lang: &str) -> TranslationResult<String> {
        self.calls.lock().unwrap().push(text.to_string());
        Ok(format!("[{}]", text))
    }
}

/// 文本包含指定片段时返回给定错误，否则返回 `[原文]`
pub struct FailingTranslator {
    needle: String,
    error: TranslationError,
}

impl FailingTranslator {
    pub fn network_error_on(needle: &str) -> Arc<Self> {
        Arc::new(Self {
            needle: needle.to_string(),
            error: TranslationError::NetworkError("simulated connection reset".to_string()),
        })
    }

    pub fn with_error(needle: &str, error: TranslationError) -> Arc<Self> {
        Arc::new(Self {
            needle: needle.to_string(),
            error,
        })
    }
}

#[async_trait]
impl Translator for FailingTranslator {
    fn name(&self) -> &str {
        "failing"
    }

    async fn translate(&self, text: &str, _target_lang: &str) -> TranslationResult<String> {
        if text.contains(&self.needle) {
            Err(self.error.clone())
        } else {
            Ok(format!("[{}]", text))
        }
    }
}

/// 按文本设置延迟，记录完成顺序和同时在途的最大请求数
pub struct DelayedTranslator {
    delays: HashMap<String, Duration>,
    default_delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    completed: Mutex<Vec<String>>,
}

impl DelayedTranslator {
    pub fn new(delays: &[(&str, u64)], default_delay_ms: u64) -> Arc<Self> {
        Arc::new(Self {
            delays: delays
                .iter()
                .map(|(text, ms)| (text.to_string(), Duration::from_millis(*ms)))
                .collect(),
            default_delay: Duration::from_millis(default_delay_ms),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            completed: Mutex::new(Vec::new()),
        })
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn completion_order(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Translator for DelayedTranslator {
    fn name(&self) -> &str {
        "delayed"
    }

    async fn translate(&self, text: &str, _target_lang: &str) -> TranslationResult<String> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let delay = self.delays.get(text).copied().unwrap_or(self.default_delay);
        tokio::time::sleep(delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.lock().unwrap().push(text.to_string());
        Ok(format!("[{}]", text))
    }
}

/// 使用默认配置和给定适配器创建服务
pub fn service_with(translator: Arc<dyn Translator>) -> TranslationService {
    TranslationService::with_translator(translator, TranslationConfig::default())
}

pub fn request(mode: DisplayMode) -> TranslateRequest {
    TranslateRequest::new("zh").with_mode(mode)
}

/// 没有任何可用服务的配置
pub fn unavailable_config() -> TranslationConfig {
    let mut config = TranslationConfig::default_with_lang("zh");
    config.ai.api_key = None;
    config.google.api_url = String::new();
    config
}

/// 生成若干段落的 HTML
pub fn paragraphs(texts: &[&str]) -> String {
    texts.iter().map(|t| format!("<p>{}</p>", t)).collect()
}
