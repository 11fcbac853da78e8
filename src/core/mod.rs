//! 解析核心
//!
//! 端点目录、传输抽象、响应归一化与重试引擎。

pub mod endpoint;
pub mod engine;
pub mod normalize;
pub mod transport;

pub use endpoint::{default_endpoints, dictionary_endpoint, Endpoint, ResponseShape};
pub use engine::{EngineConfig, EngineStatsSnapshot, ResolutionEngine};
pub use normalize::{normalize, ResolutionResult};
pub use transport::{HttpTransport, Transport, TransportResponse};
