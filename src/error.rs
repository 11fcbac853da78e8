//! 翻译核心统一错误处理
//!
//! 错误分类遵循解析流程的恢复语义：传输失败与畸形响应都是可恢复的
//! （落到下一个端点/下一轮），`ResolutionFailure` 是单次调用的终态。
//! 提取失败（光标下没有可翻译内容）不是错误，用 `Option::None` 表达。

use thiserror::Error;

/// 翻译错误类型
///
/// 所有变体都实现 `Clone`，使得同键并发请求可以通过广播通道
/// 共享同一次解析的失败结果。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    /// 网络/状态码错误（可恢复，落到下一个端点）
    #[error("传输失败: {0}")]
    TransportFailure(String),

    /// 端点返回无法解析的载荷（可恢复，与传输失败同等处理）
    #[error("响应格式错误: {0}")]
    MalformedResponse(String),

    /// 所有端点、所有轮次均已耗尽（终态，缓存保持不变）
    #[error("翻译解析失败: 单元 \"{unit}\" 在 {rounds} 轮尝试后仍未成功")]
    ResolutionFailure { unit: String, rounds: usize },

    /// 输入的文本单元不合法（空、超长）
    #[error("文本单元无效: {0}")]
    InvalidUnit(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 同键的在途解析被异常放弃（持有者未发布结果）
    #[error("在途解析已中断: {0}")]
    FlightAbandoned(String),
}

impl TranslateError {
    /// 检查错误是否可恢复（是否应继续尝试后续端点/轮次）
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslateError::TransportFailure(_) => true,
            TranslateError::MalformedResponse(_) => true,
            TranslateError::ResolutionFailure { .. } => false,
            TranslateError::InvalidUnit(_) => false,
            TranslateError::ConfigError(_) => false,
            TranslateError::FlightAbandoned(_) => false,
        }
    }
}

impl From<toml::de::Error> for TranslateError {
    fn from(error: toml::de::Error) -> Self {
        TranslateError::ConfigError(format!("TOML解析错误: {}", error))
    }
}

impl From<std::io::Error> for TranslateError {
    fn from(error: std::io::Error) -> Self {
        TranslateError::ConfigError(format!("IO错误: {}", error))
    }
}

/// 错误结果类型别名
pub type TranslateResult<T> = Result<T, TranslateError>;
