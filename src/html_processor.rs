//! HTML处理模块
//!
//! 提供HTML解析、元素查询、属性读写、文本提取/回填和序列化功能

// 第三方crate导入
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use html5ever::{ns, Attribute, LocalName, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

// 本地模块导入
use crate::error::Result;
use crate::mirror_error;

/// 不参与文本提取的元素（内容不是可渲染文本）
const NON_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// 解析嵌套标记时由解析器自动补全的外层元素
const IMPLIED_ELEMENTS: &[&str] = &["html", "head", "body"];

/// 一段待翻译的叶子文本
///
/// `index` 为提取顺序中的位置（0..N-1），`node` 直接指向原文本节点，
/// 回填时按 `index` 对应的译文写回，不依赖第二次遍历。
#[derive(Debug, Clone)]
pub struct TextSpan {
    /// 提取顺序中的位置
    pub index: usize,
    /// 去掉首尾空白后的待翻译文本
    pub text: String,
    /// 原始文本节点
    pub node: Handle,
}

/// 解析HTML字符串为DOM
pub fn parse_html(html: &str) -> Result<RcDom> {
    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .map_err(|e| mirror_error!(html_parse, format!("{:?}", e)))
}

/// 序列化DOM为HTML字符串
pub fn serialize_dom_to_html(dom: &RcDom) -> Result<String> {
    use html5ever::serialize::{serialize, SerializeOpts};
    use markup5ever_rcdom::SerializableHandle;

    let mut buffer = Vec::new();

    serialize(
        &mut buffer,
        &SerializableHandle::from(dom.document.clone()),
        SerializeOpts::default(),
    )
    .map_err(|e| mirror_error!(html_parse, format!("HTML序列化失败: {:?}", e)))?;

    String::from_utf8(buffer).map_err(|e| mirror_error!(html_parse, format!("UTF-8转换失败: {}", e)))
}

/// 获取元素标签名
pub fn get_node_name(node: &Handle) -> Option<&str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// 读取元素属性值
pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| attr.name.local.as_ref() == attr_name)
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

/// 判断元素是否声明了某个属性
pub fn has_node_attr(node: &Handle, attr_name: &str) -> bool {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .any(|attr| attr.name.local.as_ref() == attr_name),
        _ => false,
    }
}

/// 写入元素属性，属性不存在时追加
pub fn set_node_attr(node: &Handle, attr_name: &str, attr_value: &str) {
    if let NodeData::Element { attrs, .. } = &node.data {
        let mut attrs = attrs.borrow_mut();

        if let Some(attr) = attrs
            .iter_mut()
            .find(|attr| attr.name.local.as_ref() == attr_name)
        {
            attr.value.clear();
            attr.value.push_slice(attr_value);
            return;
        }

        attrs.push(Attribute {
            name: QualName::new(None, ns!(), LocalName::from(attr_name)),
            value: attr_value.to_string().into(),
        });
    }
}

/// 按文档顺序查找指定标签的所有元素
pub fn find_elements(root: &Handle, tag_name: &str) -> Vec<Handle> {
    let mut found = Vec::new();
    let mut stack = vec![root.clone()];

    while let Some(node) = stack.pop() {
        if get_node_name(&node) == Some(tag_name) {
            found.push(node.clone());
        }

        // 子节点逆序入栈，保证先序（文档）顺序
        for child in node.children.borrow().iter().rev() {
            stack.push(child.clone());
        }
    }

    found
}

/// 拼接节点下所有后代文本
pub fn text_content(node: &Handle) -> String {
    let mut text = String::new();
    let mut stack = vec![node.clone()];

    while let Some(current) = stack.pop() {
        if let NodeData::Text { contents } = &current.data {
            text.push_str(&contents.borrow());
        }
        for child in current.children.borrow().iter().rev() {
            stack.push(child.clone());
        }
    }

    text
}

/// 文本本身包含标记时，只取最后一个嵌套元素的文本
///
/// 不含任何元素时原样返回；最后一个元素没有文本时返回 `None`。
fn innermost_text(text: &str) -> Option<String> {
    if !text.contains('<') {
        return Some(text.to_string());
    }

    let dom = match parse_html(text) {
        Ok(dom) => dom,
        Err(_) => return Some(text.to_string()),
    };

    let mut last_element = None;
    let mut stack = vec![dom.document.clone()];
    while let Some(node) = stack.pop() {
        if let Some(name) = get_node_name(&node) {
            if !IMPLIED_ELEMENTS.contains(&name) {
                last_element = Some(node.clone());
            }
        }
        for child in node.children.borrow().iter().rev() {
            stack.push(child.clone());
        }
    }

    match last_element {
        None => Some(text.to_string()),
        Some(element) => {
            let inner = text_content(&element).trim().to_string();
            if inner.is_empty() {
                None
            } else {
                Some(inner)
            }
        }
    }
}

/// 按文档顺序提取所有非空叶子文本
///
/// 跳过 `<script>`/`<style>` 内容和注释，文本去掉首尾空白后为空的节点不计入序号。
pub fn extract_text_spans(dom: &RcDom) -> Vec<TextSpan> {
    let mut spans = Vec::new();
    let mut stack = vec![dom.document.clone()];

    while let Some(node) = stack.pop() {
        match &node.data {
            NodeData::Text { contents } => {
                let raw = contents.borrow().to_string();
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    continue;
                }

                if let Some(text) = innermost_text(trimmed) {
                    spans.push(TextSpan {
                        index: spans.len(),
                        text,
                        node: node.clone(),
                    });
                }
            }
            NodeData::Element { name, .. } => {
                if NON_TEXT_ELEMENTS.contains(&name.local.as_ref()) {
                    continue;
                }
            }
            _ => {}
        }

        for child in node.children.borrow().iter().rev() {
            stack.push(child.clone());
        }
    }

    spans
}

/// 将译文按序号写回对应的文本节点
///
/// 保留原节点的首尾空白，返回写回的节点数。
pub fn apply_translations(spans: &[TextSpan], translations: &[String]) -> Result<usize> {
    if spans.len() != translations.len() {
        return Err(mirror_error!(
            input_validation,
            format!("{} spans / {} translations", spans.len(), translations.len()),
            "译文数量与提取的文本数量不一致"
        ));
    }

    let mut applied = 0;
    for span in spans {
        let translated = translations.get(span.index).ok_or_else(|| {
            mirror_error!(input_validation, span.index, "文本序号超出译文范围")
        })?;
        if let NodeData::Text { contents } = &span.node.data {
            let original = contents.borrow().to_string();
            let leading = &original[..original.len() - original.trim_start().len()];
            let trailing = &original[original.trim_end().len()..];
            let replacement = format!("{}{}{}", leading, translated, trailing);

            let mut content_ref = contents.borrow_mut();
            content_ref.clear();
            content_ref.push_slice(&replacement);
            applied += 1;
        }
    }

    Ok(applied)
}
