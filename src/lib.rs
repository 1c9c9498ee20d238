//! # feedtrans
//!
//! 面向订阅阅读器的 HTML 感知翻译管道：把文章切分成翻译单元，按长度上限切块，
//! 以固定窗口并发请求翻译服务，再以双语或译文模式写回 HTML。
//!
//! ## 模块组织
//!
//! - `env` - 类型安全的环境变量
//! - `parsers` - HTML 解析与序列化
//! - `translation` - 翻译管道、服务适配器与配置

pub mod env;
pub mod parsers;
pub mod translation;

// Re-export commonly used items for convenience
pub use parsers::Document;
pub use translation::{
    DisplayMode, TranslateRequest, TranslationConfig, TranslationError, TranslationOutcome,
    TranslationResult, TranslationService, Translator,
};
