//! 翻译系统核心模块
//!
//! 对外入口：[`TranslationService`] 以及便捷函数 [`translate_html`]。
//!
//! ## 模块依赖关系
//!
//! ```text
//! TranslationService (service.rs)
//!     ├── select_translator (providers/mod.rs)
//!     ├── extract (pipeline/extractor.rs)
//!     │       └── chunk / slice (pipeline/chunker.rs)
//!     ├── run_batched (pipeline/batch.rs)
//!     └── apply (pipeline/reassembler.rs)
//! ```

pub mod service;

pub use service::{
    translate_html, AutoTranslation, ServiceStats, ServiceStatsSnapshot, TranslateRequest,
    TranslationOutcome, TranslationService,
};
