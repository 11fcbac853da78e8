//! DOM 基础操作
//!
//! 基于 `markup5ever_rcdom` 的节点工具：属性读写、祖先谓词、
//! 整页扫描的文本节点枚举，以及译文包裹元素的注入。
//!
//! 包裹元素带有 [`WRAPPER_CLASS`] 标记类，扫描排除谓词据此拒绝
//! 已经产出过译文的内容，保证重复扫描幂等。

use html5ever::interface::{Attribute, QualName};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{namespace_url, ns, parse_document, LocalName};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom};
use std::cell::RefCell;
use std::rc::Rc;

use crate::core::normalize::ResolutionResult;

/// 译文包裹元素的标记类
pub const WRAPPER_CLASS: &str = "wt-translated";

/// 包裹元素内译文子节点的标记类
pub const WRAPPER_INNER_CLASS: &str = "wt-translation";

/// 整页扫描跳过的元素标签
pub const SWEEP_SKIP_ELEMENTS: &[&str] = &["script", "style", "noscript", "iframe"];

/// 交互式输入表面的标签（悬停提取永不触碰）
const INTERACTIVE_ELEMENTS: &[&str] = &["input", "textarea", "select"];

/// 将 UTF-8 HTML 字符串解析为 DOM
pub fn html_to_dom(html: &str) -> RcDom {
    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .unwrap_or_else(|_| RcDom::default())
}

/// 获取节点属性值
pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| &*attr.name.local == attr_name)
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

/// 获取节点名称
pub fn get_node_name(node: &Handle) -> Option<&'_ str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// 获取父节点
///
/// `parent` 字段是 `Cell<Option<Weak>>`，取出后必须放回，
/// 否则节点会与其祖先断开。
pub fn get_parent_node(child: &Handle) -> Option<Handle> {
    let weak = child.parent.take();
    let parent = weak.as_ref().and_then(|w| w.upgrade());
    child.parent.set(weak);
    parent
}

/// 获取文本节点的内容
pub fn text_of(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Text { contents } => Some(contents.borrow().to_string()),
        _ => None,
    }
}

/// 判断节点是否位于交互式输入表面内
///
/// 文本输入框和可编辑区域不参与划词提取。
pub fn is_interactive_surface(node: &Handle) -> bool {
    let mut current = Some(node.clone());
    while let Some(n) = current {
        if let Some(tag) = get_node_name(&n) {
            if INTERACTIVE_ELEMENTS.contains(&tag) {
                return true;
            }
            if let Some(editable) = get_node_attr(&n, "contenteditable") {
                if editable != "false" {
                    return true;
                }
            }
        }
        current = get_parent_node(&n);
    }
    false
}

/// 判断节点是否被整页扫描排除
///
/// 排除 script/style/noscript/iframe 子树，以及先前扫描注入的
/// 译文包裹元素内部的内容。
pub fn is_excluded_for_sweep(node: &Handle) -> bool {
    let mut current = Some(node.clone());
    while let Some(n) = current {
        if let Some(tag) = get_node_name(&n) {
            if SWEEP_SKIP_ELEMENTS.contains(&tag) {
                return true;
            }
        }
        if is_wrapper(&n) {
            return true;
        }
        current = get_parent_node(&n);
    }
    false
}

/// 判断节点是否为译文包裹元素
fn is_wrapper(node: &Handle) -> bool {
    get_node_attr(node, "class")
        .map(|class| class.split_whitespace().any(|c| c == WRAPPER_CLASS))
        .unwrap_or(false)
}

/// 按文档顺序枚举整页扫描的候选文本节点
///
/// 排除规则在下降过程中应用，被排除的子树整体跳过。
pub fn collect_sweep_text_nodes(root: &Handle) -> Vec<Handle> {
    let mut nodes = Vec::new();
    collect_recursive(root, &mut nodes);
    nodes
}

fn collect_recursive(node: &Handle, nodes: &mut Vec<Handle>) {
    match &node.data {
        NodeData::Text { .. } => {
            nodes.push(node.clone());
        }
        NodeData::Element { name, .. } => {
            let tag = name.local.as_ref();
            if SWEEP_SKIP_ELEMENTS.contains(&tag) || is_wrapper(node) {
                return;
            }
            for child in node.children.borrow().iter() {
                collect_recursive(child, nodes);
            }
        }
        _ => {
            for child in node.children.borrow().iter() {
                collect_recursive(child, nodes);
            }
        }
    }
}

/// 创建带 class 的 span 元素
fn create_span(class: &str) -> Handle {
    Node::new(NodeData::Element {
        name: QualName::new(None, ns!(html), LocalName::from("span")),
        attrs: RefCell::new(vec![Attribute {
            name: QualName::new(None, ns!(), LocalName::from("class")),
            value: StrTendril::from(class),
        }]),
        template_contents: RefCell::new(None),
        mathml_annotation_xml_integration_point: false,
    })
}

/// 创建文本节点
fn create_text(text: &str) -> Handle {
    Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from(text)),
    })
}

/// 将译文包裹到文本节点上
///
/// 原文本节点被替换为 `<span class="wt-translated">原文<span
/// class="wt-translation">译文</span></span>`。原文移入包裹元素内，
/// 因此后续扫描对该内容整体跳过。
///
/// 节点没有父元素（游离节点）时不做任何修改，返回 `false`。
pub fn wrap_translation(node: &Handle, result: &ResolutionResult) -> bool {
    let Some(parent) = get_parent_node(node) else {
        return false;
    };

    let wrapper = create_span(WRAPPER_CLASS);
    let inner = create_span(WRAPPER_INNER_CLASS);

    let rendered = if result.phonetic.is_empty() {
        result.translation.clone()
    } else {
        format!("[{}] {}", result.phonetic, result.translation)
    };
    inner
        .children
        .borrow_mut()
        .push(create_text(&rendered));
    for child in inner.children.borrow().iter() {
        child.parent.set(Some(Rc::downgrade(&inner)));
    }

    // 在父元素中用包裹元素替换原文本节点
    let mut siblings = parent.children.borrow_mut();
    let Some(index) = siblings.iter().position(|c| Rc::ptr_eq(c, node)) else {
        return false;
    };
    siblings[index] = wrapper.clone();
    drop(siblings);

    node.parent.set(Some(Rc::downgrade(&wrapper)));
    inner.parent.set(Some(Rc::downgrade(&wrapper)));
    wrapper
        .children
        .borrow_mut()
        .extend([node.clone(), inner]);
    wrapper.parent.set(Some(Rc::downgrade(&parent)));

    true
}
