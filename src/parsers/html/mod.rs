//! HTML解析和处理模块
//!
//! - `dom`: 基础DOM操作以及单次调用独占的 `Document`
//! - `serializer`: 序列化功能

pub mod dom;
pub mod serializer;

pub use dom::{
    decode_bytes, get_child_node_by_name, get_node_attr, get_node_name, get_parent_node,
    parse_html, Document,
};
pub use serializer::{serialize_children, serialize_nodes};
