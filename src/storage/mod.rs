//! 存储层
//!
//! 会话级翻译缓存与同键在途合流。

pub mod cache;

pub use cache::{CacheKey, CacheStats, Flight, TranslationCache};
