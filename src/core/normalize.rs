//! 响应归一化
//!
//! 各翻译/词典端点返回的载荷形状互不相同，本模块把它们统一抽取为
//! 规范的 [`ResolutionResult`]。任何偏离预期嵌套结构、或抽取出
//! 空译文的载荷都按 `MalformedResponse` 处理，由解析引擎落到下一个
//! 端点继续尝试。

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::endpoint::ResponseShape;
use crate::error::{TranslateError, TranslateResult};

/// 归一化后的解析结果
///
/// `phonetic` 仅词典形状会填充，其余形状为空字符串。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    /// 译文
    pub translation: String,
    /// 音标（可为空）
    #[serde(default)]
    pub phonetic: String,
}

impl ResolutionResult {
    /// 创建只有译文的结果
    pub fn plain(translation: impl Into<String>) -> Self {
        Self {
            translation: translation.into(),
            phonetic: String::new(),
        }
    }

    /// 创建带音标的结果
    pub fn with_phonetic(translation: impl Into<String>, phonetic: impl Into<String>) -> Self {
        Self {
            translation: translation.into(),
            phonetic: phonetic.into(),
        }
    }
}

/// 按端点形状归一化原始载荷
pub fn normalize(payload: &Value, shape: ResponseShape) -> TranslateResult<ResolutionResult> {
    let result = match shape {
        ResponseShape::NestedArray => normalize_nested_array(payload)?,
        ResponseShape::SentenceList => normalize_sentence_list(payload)?,
        ResponseShape::RawString => normalize_raw_string(payload)?,
        ResponseShape::StructuredDictionary => normalize_structured_dictionary(payload)?,
    };

    // 空译文不是有效的成功
    if result.translation.trim().is_empty() {
        return Err(malformed("译文为空"));
    }
    Ok(result)
}

fn malformed(msg: impl std::fmt::Display) -> TranslateError {
    TranslateError::MalformedResponse(msg.to_string())
}

/// `nestedArray` 形状: `[[["译文", ...], ...], ...]`
///
/// 第一层、第二层、第三层都必须是数组/字符串的精确嵌套，
/// 任何类型偏差都视为畸形响应。
fn normalize_nested_array(payload: &Value) -> TranslateResult<ResolutionResult> {
    let translation = payload
        .as_array()
        .and_then(|outer| outer.first())
        .and_then(|mid| mid.as_array())
        .and_then(|mid| mid.first())
        .and_then(|inner| inner.as_array())
        .and_then(|inner| inner.first())
        .and_then(|v| v.as_str())
        .ok_or_else(|| malformed("nestedArray 嵌套结构不符合预期"))?;
    Ok(ResolutionResult::plain(translation))
}

/// `sentenceList` 形状: `{"sentences": [{"trans": "..."}, ...]}`
///
/// 译文为所有 `trans` 字段按原顺序以空格连接的结果。
fn normalize_sentence_list(payload: &Value) -> TranslateResult<ResolutionResult> {
    let sentences = payload
        .get("sentences")
        .and_then(|v| v.as_array())
        .ok_or_else(|| malformed("sentenceList 缺少 sentences 数组"))?;

    let mut parts = Vec::with_capacity(sentences.len());
    for sentence in sentences {
        let trans = sentence
            .get("trans")
            .and_then(|v| v.as_str())
            .ok_or_else(|| malformed("sentences 条目缺少 trans 字段"))?;
        parts.push(trans);
    }
    Ok(ResolutionResult::plain(parts.join(" ")))
}

/// `rawString` 形状: 载荷本身即译文
fn normalize_raw_string(payload: &Value) -> TranslateResult<ResolutionResult> {
    let translation = payload
        .as_str()
        .ok_or_else(|| malformed("rawString 载荷不是字符串"))?;
    Ok(ResolutionResult::plain(translation))
}

/// `structuredDictionary` 形状: 词典条目数组
///
/// 取第一个条目的第一个词义的第一条释义作为译文；音标取条目的
/// `phonetic` 字段，缺失时回退到 `phonetics[0].text`，再缺失为空。
fn normalize_structured_dictionary(payload: &Value) -> TranslateResult<ResolutionResult> {
    let entry = payload
        .as_array()
        .and_then(|entries| entries.first())
        .ok_or_else(|| malformed("structuredDictionary 载荷不是条目数组"))?;

    let definition = entry
        .get("meanings")
        .and_then(|v| v.as_array())
        .and_then(|meanings| meanings.first())
        .and_then(|meaning| meaning.get("definitions"))
        .and_then(|v| v.as_array())
        .and_then(|definitions| definitions.first())
        .and_then(|def| def.get("definition"))
        .and_then(|v| v.as_str())
        .ok_or_else(|| malformed("词典条目缺少释义"))?;

    let phonetic = entry
        .get("phonetic")
        .and_then(|v| v.as_str())
        .or_else(|| {
            entry
                .get("phonetics")
                .and_then(|v| v.as_array())
                .and_then(|list| list.first())
                .and_then(|p| p.get("text"))
                .and_then(|v| v.as_str())
        })
        .unwrap_or("");

    Ok(ResolutionResult::with_phonetic(definition, phonetic))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_array_shape() {
        let payload = json!([[["你好", "hello"]]]);
        let result = normalize(&payload, ResponseShape::NestedArray).unwrap();
        assert_eq!(result.translation, "你好");
        assert_eq!(result.phonetic, "");
    }

    #[test]
    fn test_nested_array_wrong_nesting_fails() {
        // 第三层不是数组
        let payload = json!([["你好"]]);
        assert!(matches!(
            normalize(&payload, ResponseShape::NestedArray),
            Err(TranslateError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_sentence_list_joins_in_order() {
        let payload = json!({"sentences": [{"trans": "A"}, {"trans": "B"}]});
        let result = normalize(&payload, ResponseShape::SentenceList).unwrap();
        assert_eq!(result.translation, "A B");
        assert_eq!(result.phonetic, "");
    }

    #[test]
    fn test_raw_string_shape() {
        let payload = json!("直接译文");
        let result = normalize(&payload, ResponseShape::RawString).unwrap();
        assert_eq!(result.translation, "直接译文");
    }

    #[test]
    fn test_structured_dictionary_with_phonetic_field() {
        let payload = json!([{
            "word": "hello",
            "phonetic": "/həˈləʊ/",
            "meanings": [{
                "partOfSpeech": "exclamation",
                "definitions": [{"definition": "used as a greeting"}]
            }]
        }]);
        let result = normalize(&payload, ResponseShape::StructuredDictionary).unwrap();
        assert_eq!(result.translation, "used as a greeting");
        assert_eq!(result.phonetic, "/həˈləʊ/");
    }

    #[test]
    fn test_structured_dictionary_phonetics_fallback() {
        let payload = json!([{
            "word": "hello",
            "phonetics": [{"text": "/hɛˈloʊ/"}],
            "meanings": [{
                "definitions": [{"definition": "greeting"}]
            }]
        }]);
        let result = normalize(&payload, ResponseShape::StructuredDictionary).unwrap();
        assert_eq!(result.phonetic, "/hɛˈloʊ/");
    }

    #[test]
    fn test_structured_dictionary_no_phonetic_is_empty() {
        let payload = json!([{
            "meanings": [{"definitions": [{"definition": "greeting"}]}]
        }]);
        let result = normalize(&payload, ResponseShape::StructuredDictionary).unwrap();
        assert_eq!(result.phonetic, "");
    }

    #[test]
    fn test_non_string_non_array_fails_all_shapes() {
        let payload = json!(42);
        for shape in [
            ResponseShape::NestedArray,
            ResponseShape::SentenceList,
            ResponseShape::RawString,
            ResponseShape::StructuredDictionary,
        ] {
            assert!(
                matches!(
                    normalize(&payload, shape),
                    Err(TranslateError::MalformedResponse(_))
                ),
                "shape {:?} should reject numeric payload",
                shape
            );
        }
    }

    #[test]
    fn test_empty_translation_is_failure() {
        let payload = json!([[["  "]]]);
        assert!(matches!(
            normalize(&payload, ResponseShape::NestedArray),
            Err(TranslateError::MalformedResponse(_))
        ));
        let payload = json!({"sentences": []});
        assert!(matches!(
            normalize(&payload, ResponseShape::SentenceList),
            Err(TranslateError::MalformedResponse(_))
        ));
    }
}
