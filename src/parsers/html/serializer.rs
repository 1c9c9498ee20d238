use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use markup5ever_rcdom::{Handle, SerializableHandle};

use crate::translation::error::{TranslationError, TranslationResult};

/// 序列化节点的内部标记（不含节点自身）
pub fn serialize_children(node: &Handle) -> TranslationResult<String> {
    let mut buf: Vec<u8> = Vec::new();
    write_node(&mut buf, node, TraversalScope::ChildrenOnly(None))?;
    into_string(buf)
}

/// 依次序列化一组节点（含节点自身），文本节点按转义后的文本输出
pub fn serialize_nodes(nodes: &[Handle]) -> TranslationResult<String> {
    let mut buf: Vec<u8> = Vec::new();
    for node in nodes {
        write_node(&mut buf, node, TraversalScope::IncludeNode)?;
    }
    into_string(buf)
}

fn write_node(buf: &mut Vec<u8>, node: &Handle, traversal_scope: TraversalScope) -> TranslationResult<()> {
    let serializable: SerializableHandle = node.clone().into();

    serialize(
        buf,
        &serializable,
        SerializeOpts {
            traversal_scope,
            ..Default::default()
        },
    )
    .map_err(|e| TranslationError::SerializationError(format!("无法序列化DOM: {}", e)))
}

fn into_string(buf: Vec<u8>) -> TranslationResult<String> {
    String::from_utf8(buf)
        .map_err(|e| TranslationError::SerializationError(format!("序列化结果不是有效的UTF-8: {}", e)))
}
