//! # Word Translator
//!
//! 划词/整页翻译核心库：把网页上的文本单元解析为目标语言的译文。
//!
//! ## 模块组织
//!
//! - `core` - 端点目录、传输抽象、响应归一化与解析引擎
//! - `pipeline` - 文本单元提取、悬停触发合并与整页扫描
//! - `storage` - 会话级翻译缓存与在途合流
//! - `dom` - DOM 解析与译文注入
//! - `relay` - 宿主协作方之间的消息中继
//! - `config` - 偏好快照与可调参数
//! - `error` - 统一错误类型

pub mod config;
pub mod core;
pub mod dom;
pub mod error;
pub mod pipeline;
pub mod relay;
pub mod storage;

// Re-export commonly used items for convenience
pub use crate::core::{HttpTransport, ResolutionEngine, ResolutionResult, Transport};
pub use config::{settings_channel, Mode, Settings, SettingsHandle, TranslatorConfig};
pub use error::{TranslateError, TranslateResult};
pub use pipeline::{HoverCoalescer, HoverEvent, PageSweeper, PointerInput, TextUnit};
pub use storage::TranslationCache;
