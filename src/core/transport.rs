//! 网络传输抽象
//!
//! 解析引擎只依赖 [`Transport`] 特征，任何非 2xx 状态和传输层
//! 失败在引擎侧同等处理。测试中用脚本化实现替换真实网络。

use async_trait::async_trait;

use crate::error::{TranslateError, TranslateResult};

/// 传输层响应
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP 状态码
    pub status: u16,
    /// 响应体
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 是否为 2xx 成功状态
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 网络调用特征
#[async_trait]
pub trait Transport: Send + Sync {
    /// 发起一次 GET 请求
    ///
    /// 传输层自身的失败（连接、DNS 等）返回 `TransportFailure`；
    /// 状态码的判定留给调用方。
    async fn call(&self, url: &str) -> TranslateResult<TransportResponse>;
}

/// 基于 reqwest 的真实传输实现
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(&self, url: &str) -> TranslateResult<TransportResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TranslateError::TransportFailure(format!("请求失败: {}", e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TranslateError::TransportFailure(format!("读取响应体失败: {}", e)))?;

        Ok(TransportResponse::new(status, body))
    }
}
