//! 文本单元提取器
//!
//! 从坐标或文本节点中取出最小的可翻译单元（一个词或短语）。
//! 坐标到节点的命中测试依赖宿主环境的布局信息，通过 [`HitTest`]
//! 特征注入；提取器本身只负责边界扩展、过滤与分类。

use markup5ever_rcdom::Handle;

use crate::dom;
use crate::error::{TranslateError, TranslateResult};

/// 文本单元的最大字符数
pub const MAX_UNIT_CHARS: usize = 50;

/// 文本单元的语言分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitClass {
    English,
    Chinese,
    Other,
}

/// 可翻译的文本单元
///
/// 非空、不超过 [`MAX_UNIT_CHARS`] 个字符，构造时完成分类，
/// 之后不可变。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextUnit {
    text: String,
    class: UnitClass,
}

impl TextUnit {
    /// 从原始文本构造单元
    ///
    /// 文本先裁剪首尾空白；空白或超长时返回 `None`。
    pub fn new(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.chars().count() > MAX_UNIT_CHARS {
            return None;
        }
        Some(Self {
            text: trimmed.to_string(),
            class: classify(trimmed),
        })
    }

    /// 构造单元，失败时返回 `InvalidUnit` 错误（中继入口使用）
    pub fn try_new(text: &str) -> TranslateResult<Self> {
        Self::new(text).ok_or_else(|| {
            TranslateError::InvalidUnit(format!(
                "文本为空或超过 {} 字符: {:?}",
                MAX_UNIT_CHARS,
                text.chars().take(60).collect::<String>()
            ))
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn class(&self) -> UnitClass {
        self.class
    }
}

/// 对文本做纯函数式语言分类
///
/// 基于 Unicode 区段判定，对同一字符串的结果稳定：
/// 含 CJK 统一表意文字即为中文；否则满足英文谓词为英文；其余为其他。
pub fn classify(text: &str) -> UnitClass {
    if text.chars().any(is_cjk) {
        return UnitClass::Chinese;
    }
    if is_english_text(text) {
        return UnitClass::English;
    }
    UnitClass::Other
}

/// 英文谓词：去掉所有非字母字符后，剩余部分非空且全部是 ASCII 字母
pub fn is_english_text(text: &str) -> bool {
    let mut seen_letter = false;
    for c in text.chars().filter(|c| c.is_alphabetic()) {
        if !c.is_ascii_alphabetic() {
            return false;
        }
        seen_letter = true;
    }
    seen_letter
}

fn is_cjk(c: char) -> bool {
    matches!(c, '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}')
}

/// 单词边界分隔符：空白、ASCII 标点及 CJK 标点
fn is_delimiter(c: char) -> bool {
    c.is_whitespace()
        || c.is_ascii_punctuation()
        || matches!(c, '\u{3000}'..='\u{303F}' | '\u{FF00}'..='\u{FFEF}')
}

/// 视口坐标
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// 欧氏距离
    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// 命中测试结果：坐标下的文本节点及字节偏移
#[derive(Clone)]
pub struct HitTarget {
    pub node: Handle,
    pub offset: usize,
}

/// 坐标到文档节点的命中测试，由宿主环境（布局引擎）提供
pub trait HitTest {
    fn hit(&self, point: Point) -> Option<HitTarget>;
}

/// 文本单元提取器
#[derive(Debug, Default)]
pub struct UnitExtractor;

impl UnitExtractor {
    pub fn new() -> Self {
        Self
    }

    /// 从坐标提取文本单元
    ///
    /// 命中交互式输入表面时永不提取；命中处扩展到单词边界，
    /// 边界内没有非空白内容或超长时返回 `None`。
    pub fn extract_at_point(&self, hit_test: &dyn HitTest, point: Point) -> Option<TextUnit> {
        let target = hit_test.hit(point)?;
        if dom::is_interactive_surface(&target.node) {
            return None;
        }
        let text = dom::text_of(&target.node)?;
        let word = expand_word_at(&text, target.offset)?;
        TextUnit::new(word)
    }

    /// 从文本节点提取单元（整页扫描路径）
    ///
    /// 节点内容裁剪后必须满足英文谓词，否则在整页模式下跳过。
    pub fn extract_from_node(&self, node: &Handle) -> Option<TextUnit> {
        let text = dom::text_of(node)?;
        let unit = TextUnit::new(&text)?;
        match unit.class() {
            UnitClass::English => Some(unit),
            _ => None,
        }
    }
}

/// 把字节偏移处的命中位置扩展到完整单词
///
/// 以空白/标点为分隔符向两侧扫描；命中处本身是分隔符时没有
/// 可扩展的单词，返回 `None`。
fn expand_word_at(text: &str, offset: usize) -> Option<&str> {
    if text.is_empty() {
        return None;
    }

    // 偏移落到字符边界上，越界时取最后一个字符
    let mut anchor = offset.min(text.len().saturating_sub(1));
    while anchor > 0 && !text.is_char_boundary(anchor) {
        anchor -= 1;
    }

    let anchor_char = text[anchor..].chars().next()?;
    if is_delimiter(anchor_char) {
        return None;
    }

    let start = text[..anchor]
        .char_indices()
        .rev()
        .find(|(_, c)| is_delimiter(*c))
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let end = text[anchor..]
        .char_indices()
        .find(|(_, c)| is_delimiter(*c))
        .map(|(i, _)| anchor + i)
        .unwrap_or(text.len());

    let word = text[start..end].trim();
    if word.is_empty() {
        None
    } else {
        Some(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_is_stable_and_total() {
        for text in ["hello", "你好", "42", "", "  ", "naïve", "hello 你好"] {
            assert_eq!(classify(text), classify(text));
        }
        assert_eq!(classify("hello"), UnitClass::English);
        assert_eq!(classify("hello world"), UnitClass::English);
        assert_eq!(classify("你好"), UnitClass::Chinese);
        assert_eq!(classify("hello 你好"), UnitClass::Chinese);
        assert_eq!(classify("42"), UnitClass::Other);
        assert_eq!(classify("naïve"), UnitClass::Other);
    }

    #[test]
    fn test_unit_rejects_empty_and_oversized() {
        assert!(TextUnit::new("").is_none());
        assert!(TextUnit::new("   ").is_none());
        assert!(TextUnit::new(&"a".repeat(51)).is_none());
        assert!(TextUnit::new(&"a".repeat(50)).is_some());
        assert!(TextUnit::try_new("").is_err());
    }

    #[test]
    fn test_unit_trims_whitespace() {
        let unit = TextUnit::new("  hello  ").unwrap();
        assert_eq!(unit.text(), "hello");
        assert_eq!(unit.class(), UnitClass::English);
    }

    #[test]
    fn test_expand_word_at_middle() {
        let text = "the quick brown fox";
        assert_eq!(expand_word_at(text, 5), Some("quick"));
        assert_eq!(expand_word_at(text, 0), Some("the"));
        assert_eq!(expand_word_at(text, 18), Some("fox"));
    }

    #[test]
    fn test_expand_word_at_delimiter_returns_none() {
        let text = "the quick";
        // 偏移 3 落在空格上
        assert_eq!(expand_word_at(text, 3), None);
        assert_eq!(expand_word_at("...", 1), None);
    }

    #[test]
    fn test_expand_word_with_punctuation_boundary() {
        let text = "hello, world!";
        assert_eq!(expand_word_at(text, 1), Some("hello"));
        assert_eq!(expand_word_at(text, 8), Some("world"));
    }

    #[test]
    fn test_expand_word_unicode() {
        let text = "中文 word 混排";
        assert_eq!(expand_word_at(text, 7), Some("word"));
        assert_eq!(expand_word_at(text, 0), Some("中文"));
    }

    #[test]
    fn test_extract_from_node_requires_english() {
        let dom = crate::dom::html_to_dom(
            "<html><body><p>hello world</p><p>你好世界</p><p>1234</p></body></html>",
        );
        let extractor = UnitExtractor::new();
        let nodes = crate::dom::collect_sweep_text_nodes(&dom.document);
        let units: Vec<TextUnit> = nodes
            .iter()
            .filter_map(|n| extractor.extract_from_node(n))
            .collect();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].text(), "hello world");
    }
}
