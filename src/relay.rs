//! 消息中继
//!
//! 宿主各协作方（展示层、命令入口）与解析核心之间以序列化消息
//! 通信。请求带文本单元与目标语言，响应把成功与失败都编码在
//! 载荷里：中继层面的失败不抛出，而是作为 `success = false` 的
//! 正常响应传回，调用方据此清除或保留展示。

use serde::{Deserialize, Serialize};

use crate::core::engine::ResolutionEngine;
use crate::core::normalize::ResolutionResult;
use crate::pipeline::extractor::TextUnit;

/// 解析请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveRequest {
    /// 待解析文本
    pub unit: String,
    /// 目标语言代码
    pub target_language: String,
}

/// 解析响应
///
/// `success` 为真时 `result` 存在；为假时 `error` 携带可展示的
/// 失败描述。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ResolutionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResolveResponse {
    fn ok(result: ResolutionResult) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(message),
        }
    }
}

/// 中继命令
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum RelayCommand {
    /// 解析单个文本单元
    Resolve(ResolveRequest),
    /// 对当前页面发起整页翻译
    TranslatePage,
}

/// 处理一条解析请求
///
/// 非法单元（空、超长）与解析失败都折叠为失败响应，中继不向
/// 调用方传播错误类型。
pub async fn handle_resolve(engine: &ResolutionEngine, request: &ResolveRequest) -> ResolveResponse {
    let unit = match TextUnit::try_new(&request.unit) {
        Ok(unit) => unit,
        Err(e) => {
            tracing::debug!(error = %e, "拒绝非法解析请求");
            return ResolveResponse::err(e.to_string());
        }
    };

    match engine.resolve(&unit, &request.target_language).await {
        Ok(result) => ResolveResponse::ok(result),
        Err(e) => {
            tracing::warn!(unit = unit.text(), error = %e, "中继解析失败");
            ResolveResponse::err(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_wire_format() {
        let command: RelayCommand =
            serde_json::from_str(r#"{"command":"translate_page"}"#).unwrap();
        assert!(matches!(command, RelayCommand::TranslatePage));

        let command: RelayCommand = serde_json::from_str(
            r#"{"command":"resolve","unit":"hello","target_language":"zh"}"#,
        )
        .unwrap();
        match command {
            RelayCommand::Resolve(req) => {
                assert_eq!(req.unit, "hello");
                assert_eq!(req.target_language, "zh");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_response_omits_absent_fields() {
        let response = ResolveResponse::ok(ResolutionResult::plain("你好"));
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("error"));

        let response = ResolveResponse::err("boom".into());
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("result"));
        assert!(json.contains("boom"));
    }
}
