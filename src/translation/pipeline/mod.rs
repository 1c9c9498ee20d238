//! 翻译管道模块
//!
//! 提供从原始内容到译文 HTML 的各个阶段：边界检测、Markdown 格式化、单元抽取、
//! 超长切分、批次调度和译文重组

pub mod batch;
pub mod chunker;
pub mod detector;
pub mod extractor;
pub mod markdown;
pub mod reassembler;

// 重新导出主要类型
pub use batch::{run_batched, BatchSummary, UnitResult};
pub use chunker::{chunk, slice};
pub use detector::{is_english_article, is_english_text, is_html};
pub use extractor::{extract, ExtractOptions, SplitStrategy, TranslatableUnit, UnitTarget};
pub use markdown::format_markdown;
pub use reassembler::apply;
