//! # 解析器模块
//!
//! 翻译管道使用的 HTML 解析、DOM 操作与序列化。
//!
//! # 模块组织
//!
//! - `html` - HTML文档解析、DOM操作、序列化

pub mod html;

pub use html::{decode_bytes, parse_html, Document};
