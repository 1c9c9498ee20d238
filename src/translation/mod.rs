//! 翻译模块
//!
//! 提供面向订阅内容的 HTML 感知翻译管道：
//! - **core**: 对外的翻译服务入口
//! - **pipeline**: 边界检测、单元抽取、切分、批次调度、译文重组
//! - **providers**: AI 与 Google 翻译服务适配器
//! - **config**: 配置管理
//! - **error**: 错误处理
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use feedtrans::translation::{DisplayMode, TranslateRequest, TranslationService};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = feedtrans::translation::load_translation_config("zh");
//! let service = TranslationService::new(config)?;
//!
//! let request = TranslateRequest::new("zh").with_mode(DisplayMode::Bilingual);
//! let outcome = service.translate_html("<p>Hello</p>", &request).await;
//! println!("{}", outcome.html);
//! # Ok(())
//! # }
//! ```

// ============================================================================
// 子模块声明
// ============================================================================

/// 配置管理模块 - 服务端点、并发窗口、切分上限等
pub mod config;

/// 核心模块 - 翻译服务与统计信息
pub mod core;

/// 错误处理模块 - 统一的错误类型和处理机制
pub mod error;

/// 翻译管道模块 - 从原始内容到译文 HTML 的各个阶段
pub mod pipeline;

/// 翻译服务适配器模块
pub mod providers;

// ============================================================================
// 核心API导出
// ============================================================================

pub use core::{
    AutoTranslation, ServiceStats, ServiceStatsSnapshot, TranslateRequest, TranslationOutcome,
    TranslationService,
};

pub use config::{constants, ConfigManager, DisplayMode, ServiceKind, TranslationConfig};

pub use error::{ErrorCategory, ErrorSeverity, TranslationError, TranslationResult};

pub use providers::{select_translator, Translator};

// ============================================================================
// 便利函数导出
// ============================================================================

/// 使用给定配置翻译 HTML，出错时返回原始内容和错误信息
pub async fn translate_html(
    content: &str,
    request: &TranslateRequest,
    config: TranslationConfig,
) -> TranslationOutcome {
    core::translate_html(content, request, config).await
}

/// 检查翻译配置文件是否存在
pub fn config_file_exists() -> bool {
    config::config_file_exists()
}

/// 加载翻译配置（配置文件 + 环境变量），失败时使用默认值
pub fn load_translation_config(target_lang: &str) -> TranslationConfig {
    config::load_translation_config(target_lang)
}

/// 生成示例配置文件
pub fn generate_example_config(path: &str) -> TranslationResult<()> {
    ConfigManager::generate_example_config(path)?;
    tracing::info!("已生成示例配置文件: {}", path);
    Ok(())
}
