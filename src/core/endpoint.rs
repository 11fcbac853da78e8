//! 端点描述符
//!
//! 端点是固定的有序列表（顺序即优先级），不支持动态注册。
//! 每个端点由 URL 模板和响应形状组成，形状作为枚举分发表驱动
//! 归一化逻辑，保证编译期穷尽检查。

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

/// 端点响应形状
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseShape {
    /// `[[["译文", ...], ...], ...]` 嵌套数组
    NestedArray,
    /// `{"sentences": [{"trans": "..."}]}` 句子列表
    SentenceList,
    /// 载荷本身即译文字符串
    RawString,
    /// 词典条目数组（释义 + 音标）
    StructuredDictionary,
}

impl ResponseShape {
    /// 响应体是否需要按 JSON 解析
    ///
    /// `RawString` 端点直接返回纯文本，不经过 JSON 解析。
    pub fn expects_json(&self) -> bool {
        !matches!(self, ResponseShape::RawString)
    }
}

/// 翻译/词典端点描述符
///
/// URL 模板中 `{q}` 替换为百分号编码后的查询文本，`{tl}` 替换为
/// 目标语言代码。
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// 端点名称（用于日志）
    pub name: &'static str,
    /// URL 模板
    pub url_template: String,
    /// 响应形状
    pub shape: ResponseShape,
}

impl Endpoint {
    pub fn new(name: &'static str, url_template: impl Into<String>, shape: ResponseShape) -> Self {
        Self {
            name,
            url_template: url_template.into(),
            shape,
        }
    }

    /// 构造请求 URL
    pub fn build_url(&self, query: &str, target_lang: &str) -> String {
        let encoded = utf8_percent_encode(query, NON_ALPHANUMERIC).to_string();
        self.url_template
            .replace("{q}", &encoded)
            .replace("{tl}", target_lang)
    }
}

/// 默认的通用翻译端点列表（按优先级排序）
pub fn default_endpoints() -> Vec<Endpoint> {
    vec![
        Endpoint::new(
            "google-gtx",
            "https://translate.googleapis.com/translate_a/single?client=gtx&sl=auto&tl={tl}&dt=t&q={q}",
            ResponseShape::NestedArray,
        ),
        Endpoint::new(
            "google-dict-chrome",
            "https://clients5.google.com/translate_a/t?client=dict-chrome-ex&sl=auto&tl={tl}&q={q}",
            ResponseShape::SentenceList,
        ),
        Endpoint::new(
            "plain-text",
            "https://translate.mentality.rip/get?tl={tl}&text={q}",
            ResponseShape::RawString,
        ),
    ]
}

/// 英语词典端点（词义优先策略使用）
pub fn dictionary_endpoint() -> Endpoint {
    Endpoint::new(
        "dictionaryapi",
        "https://api.dictionaryapi.dev/api/v2/entries/en/{q}",
        ResponseShape::StructuredDictionary,
    )
}
