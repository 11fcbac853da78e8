//! 翻译缓存与在途登记
//!
//! 进程生命周期的内存缓存，键为（原文, 目标语言）。条目不过期、
//! 不淘汰：单页的文本单元数量有界，增长可以接受。
//!
//! 在途登记保证同键并发解析的「至多一个在途」不变量：第一个调用者
//! 成为持有者并实际走网络，后续调用者订阅同一广播通道等待同一结果，
//! 而不是发起重复的网络序列。登记项在结果发布后即清除，不用布尔
//! 标志做状态记账。

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use crate::core::normalize::ResolutionResult;
use crate::error::TranslateError;

/// 缓存键：原文 + 目标语言
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub text: String,
    pub target_lang: String,
}

impl CacheKey {
    pub fn new(text: impl Into<String>, target_lang: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            target_lang: target_lang.into(),
        }
    }
}

/// 单次解析的共享结果
pub type FlightOutcome = Result<ResolutionResult, TranslateError>;

/// 缓存统计信息
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub flights_joined: u64,
    pub entries: usize,
}

impl CacheStats {
    /// 缓存命中率
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// 在途解析的参与方式
pub enum Flight {
    /// 缓存命中，直接返回
    Cached(ResolutionResult),
    /// 本调用者是持有者，负责实际解析并发布结果
    Leader(FlightGuard),
    /// 已有同键解析在途，等待其结果
    Follower(broadcast::Receiver<FlightOutcome>),
}

/// 持有者凭据
///
/// 解析完成后必须交还给 [`TranslationCache::complete`]，由缓存
/// 发布结果并清除登记项。凭据在未发布时被丢弃（上层超时、任务
/// 取消）会自行清除登记并广播中断，该键的后续调用重新成为持有者，
/// 而不是永远等待一个不会发布的通道。
pub struct FlightGuard {
    key: CacheKey,
    tx: broadcast::Sender<FlightOutcome>,
    inner: Arc<Mutex<Inner>>,
    published: bool,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        if self.published {
            return;
        }
        if let Ok(mut inner) = self.inner.lock() {
            inner.in_flight.remove(&self.key);
        }
        let _ = self.tx.send(Err(TranslateError::FlightAbandoned(format!(
            "键 {:?} 的持有者未发布结果",
            self.key.text
        ))));
        tracing::debug!(key = %self.key.text, "在途解析被放弃，登记已清除");
    }
}

struct Inner {
    entries: HashMap<CacheKey, ResolutionResult>,
    in_flight: HashMap<CacheKey, broadcast::Sender<FlightOutcome>>,
    stats: CacheStats,
}

/// 翻译缓存
pub struct TranslationCache {
    inner: Arc<Mutex<Inner>>,
}

impl TranslationCache {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: HashMap::new(),
                in_flight: HashMap::new(),
                stats: CacheStats::default(),
            })),
        }
    }

    /// 查询缓存
    pub fn get(&self, key: &CacheKey) -> Option<ResolutionResult> {
        let mut inner = self.inner.lock().unwrap();
        match inner.entries.get(key).cloned() {
            Some(result) => {
                inner.stats.hits += 1;
                Some(result)
            }
            None => {
                inner.stats.misses += 1;
                None
            }
        }
    }

    /// 写入缓存
    ///
    /// 幂等：同键已有成功条目时不被后来的不同结果覆盖。
    pub fn put(&self, key: CacheKey, result: ResolutionResult) {
        let mut inner = self.inner.lock().unwrap();
        if !inner.entries.contains_key(&key) {
            inner.entries.insert(key, result);
            inner.stats.insertions += 1;
        }
        inner.stats.entries = inner.entries.len();
    }

    /// 清空全部条目（仅在目标语言/偏好变化时使用）
    ///
    /// 在途登记不受影响：进行中的解析允许完成，其结果写入清空后
    /// 的缓存，服务后续请求。
    pub fn invalidate_all(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.entries.clear();
        inner.stats.entries = 0;
        tracing::debug!("翻译缓存已清空");
    }

    /// 缓存条目数
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 缓存是否包含指定键
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.inner.lock().unwrap().entries.contains_key(key)
    }

    /// 统计信息快照
    pub fn stats(&self) -> CacheStats {
        self.inner.lock().unwrap().stats.clone()
    }

    /// 参与一次同键解析
    ///
    /// 命中、登记、订阅三种路径在同一把锁下判定，保证不会出现
    /// 两个持有者或漏掉在途解析的竞态。
    pub fn join(&self, key: &CacheKey) -> Flight {
        let mut inner = self.inner.lock().unwrap();

        if let Some(result) = inner.entries.get(key).cloned() {
            inner.stats.hits += 1;
            return Flight::Cached(result);
        }
        inner.stats.misses += 1;

        if let Some(tx) = inner.in_flight.get(key).cloned() {
            inner.stats.flights_joined += 1;
            return Flight::Follower(tx.subscribe());
        }

        let (tx, _rx) = broadcast::channel(1);
        inner.in_flight.insert(key.clone(), tx.clone());
        Flight::Leader(FlightGuard {
            key: key.clone(),
            tx,
            inner: Arc::clone(&self.inner),
            published: false,
        })
    }

    /// 持有者发布解析结果
    ///
    /// 成功结果写入缓存（幂等），失败不写入；随后清除登记项并向
    /// 所有等待者广播同一结果。
    pub fn complete(&self, mut guard: FlightGuard, outcome: FlightOutcome) {
        guard.published = true;
        {
            let mut inner = self.inner.lock().unwrap();
            if let Ok(result) = &outcome {
                if !inner.entries.contains_key(&guard.key) {
                    inner.entries.insert(guard.key.clone(), result.clone());
                    inner.stats.insertions += 1;
                }
                inner.stats.entries = inner.entries.len();
            }
            inner.in_flight.remove(&guard.key);
        }
        // 没有等待者时发送会失败，属于正常情况
        let _ = guard.tx.send(outcome);
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(text: &str) -> CacheKey {
        CacheKey::new(text, "zh")
    }

    #[test]
    fn test_basic_get_put() {
        let cache = TranslationCache::new();
        assert_eq!(cache.get(&key("hello")), None);

        cache.put(key("hello"), ResolutionResult::plain("你好"));
        assert_eq!(
            cache.get(&key("hello")),
            Some(ResolutionResult::plain("你好"))
        );
        assert_eq!(cache.len(), 1);

        // 不同目标语言是不同的键
        assert_eq!(cache.get(&CacheKey::new("hello", "en")), None);
    }

    #[test]
    fn test_put_is_idempotent() {
        let cache = TranslationCache::new();
        cache.put(key("hello"), ResolutionResult::plain("你好"));
        cache.put(key("hello"), ResolutionResult::plain("您好"));
        // 先到的成功结果不被覆盖
        assert_eq!(
            cache.get(&key("hello")),
            Some(ResolutionResult::plain("你好"))
        );
    }

    #[test]
    fn test_invalidate_all() {
        let cache = TranslationCache::new();
        cache.put(key("a"), ResolutionResult::plain("甲"));
        cache.put(key("b"), ResolutionResult::plain("乙"));
        cache.invalidate_all();
        assert!(cache.is_empty());
        assert_eq!(cache.get(&key("a")), None);
    }

    #[test]
    fn test_join_roles() {
        let cache = TranslationCache::new();

        // 第一个调用者成为持有者
        let Flight::Leader(guard) = cache.join(&key("hello")) else {
            panic!("first join should be leader");
        };
        // 第二个调用者在途期间是跟随者
        assert!(matches!(cache.join(&key("hello")), Flight::Follower(_)));

        cache.complete(guard, Ok(ResolutionResult::plain("你好")));

        // 完成后登记清除，后续 join 直接命中缓存
        assert!(matches!(cache.join(&key("hello")), Flight::Cached(_)));
    }

    #[test]
    fn test_failed_flight_caches_nothing() {
        let cache = TranslationCache::new();
        let Flight::Leader(guard) = cache.join(&key("hello")) else {
            panic!("first join should be leader");
        };
        cache.complete(
            guard,
            Err(TranslateError::ResolutionFailure {
                unit: "hello".into(),
                rounds: 3,
            }),
        );

        assert!(!cache.contains(&key("hello")));
        // 失败不缓存，下一次调用重新成为持有者
        assert!(matches!(cache.join(&key("hello")), Flight::Leader(_)));
    }

    #[tokio::test]
    async fn test_dropped_leader_releases_registration() {
        let cache = TranslationCache::new();
        let Flight::Leader(guard) = cache.join(&key("hello")) else {
            panic!("first join should be leader");
        };
        let Flight::Follower(mut rx) = cache.join(&key("hello")) else {
            panic!("second join should be follower");
        };

        // 持有者未发布就被丢弃（上层取消了解析任务）
        drop(guard);

        // 等待者收到中断而不是永远挂起
        let outcome = rx.recv().await.expect("broadcast should deliver");
        assert!(matches!(outcome, Err(TranslateError::FlightAbandoned(_))));
        // 登记已清除，该键的下一次调用重新成为持有者
        assert!(matches!(cache.join(&key("hello")), Flight::Leader(_)));
        assert!(!cache.contains(&key("hello")));
    }

    #[tokio::test]
    async fn test_follower_receives_leader_outcome() {
        let cache = TranslationCache::new();
        let Flight::Leader(guard) = cache.join(&key("hello")) else {
            panic!("first join should be leader");
        };
        let Flight::Follower(mut rx) = cache.join(&key("hello")) else {
            panic!("second join should be follower");
        };

        cache.complete(guard, Ok(ResolutionResult::plain("你好")));
        let outcome = rx.recv().await.expect("broadcast should deliver");
        assert_eq!(outcome, Ok(ResolutionResult::plain("你好")));
    }
}
