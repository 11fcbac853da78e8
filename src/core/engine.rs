//! 解析引擎
//!
//! 把一个文本单元变成译文的端到端流程：缓存命中直接返回；否则按
//! 固定顺序轮询端点，最多三轮，首个成功立即缓存并返回。单个单元的
//! 端点尝试严格串行以尊重退避语义；不同单元之间可以并发。
//!
//! 词义优先策略：英文单元译向中文时先走结构化词典端点（释义 +
//! 音标），词典路径上的任何失败都落回通用翻译链，不会变成硬失败。
//!
//! 失败的解析不写缓存，后续调用从头重试。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rand::Rng;
use serde_json::Value;
use tokio::time::{sleep, Duration};

use crate::core::endpoint::{default_endpoints, dictionary_endpoint, Endpoint};
use crate::core::normalize::{normalize, ResolutionResult};
use crate::core::transport::Transport;
use crate::error::{TranslateError, TranslateResult};
use crate::pipeline::extractor::{TextUnit, UnitClass};
use crate::storage::cache::{CacheKey, Flight, TranslationCache};

/// 解析引擎配置
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// 外层重试轮数
    pub max_rounds: usize,
    /// 每次请求前随机延迟的下界（毫秒）
    pub pre_delay_min_ms: u64,
    /// 每次请求前随机延迟的上界（毫秒）
    pub pre_delay_max_ms: u64,
    /// 非终态失败后的固定等待（毫秒）
    pub failure_delay_ms: u64,
    /// 是否启用词义优先策略
    pub dictionary_first: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            pre_delay_min_ms: 100,
            pre_delay_max_ms: 300,
            failure_delay_ms: 1000,
            dictionary_first: true,
        }
    }
}

/// 引擎统计信息
#[derive(Debug, Default)]
pub struct EngineStats {
    /// 发出的端点尝试总数
    pub attempts: AtomicU64,
    /// 成功的解析次数（不含缓存命中）
    pub resolved: AtomicU64,
    /// 失败的端点尝试次数
    pub failed_attempts: AtomicU64,
    /// 全部轮次耗尽的解析次数
    pub exhausted: AtomicU64,
}

/// 统计信息快照
#[derive(Debug, Clone, Default)]
pub struct EngineStatsSnapshot {
    pub attempts: u64,
    pub resolved: u64,
    pub failed_attempts: u64,
    pub exhausted: u64,
}

impl EngineStats {
    fn snapshot(&self) -> EngineStatsSnapshot {
        EngineStatsSnapshot {
            attempts: self.attempts.load(Ordering::Relaxed),
            resolved: self.resolved.load(Ordering::Relaxed),
            failed_attempts: self.failed_attempts.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
        }
    }
}

/// 翻译解析引擎
pub struct ResolutionEngine {
    transport: Arc<dyn Transport>,
    endpoints: Vec<Endpoint>,
    dictionary: Endpoint,
    cache: Arc<TranslationCache>,
    config: EngineConfig,
    stats: EngineStats,
}

impl ResolutionEngine {
    /// 用默认端点列表和配置创建引擎
    pub fn new(transport: Arc<dyn Transport>, cache: Arc<TranslationCache>) -> Self {
        Self::with_parts(
            transport,
            cache,
            default_endpoints(),
            dictionary_endpoint(),
            EngineConfig::default(),
        )
    }

    /// 完整指定各部件创建引擎
    pub fn with_parts(
        transport: Arc<dyn Transport>,
        cache: Arc<TranslationCache>,
        endpoints: Vec<Endpoint>,
        dictionary: Endpoint,
        config: EngineConfig,
    ) -> Self {
        Self {
            transport,
            endpoints,
            dictionary,
            cache,
            config,
            stats: EngineStats::default(),
        }
    }

    pub fn cache(&self) -> &Arc<TranslationCache> {
        &self.cache
    }

    pub fn stats(&self) -> EngineStatsSnapshot {
        self.stats.snapshot()
    }

    /// 解析文本单元
    ///
    /// 同键并发调用只有第一个走网络，其余等待同一结果。
    pub async fn resolve(
        &self,
        unit: &TextUnit,
        target_lang: &str,
    ) -> TranslateResult<ResolutionResult> {
        let key = CacheKey::new(unit.text(), target_lang);

        match self.cache.join(&key) {
            Flight::Cached(result) => {
                tracing::debug!(unit = unit.text(), "缓存命中");
                Ok(result)
            }
            Flight::Follower(mut rx) => {
                tracing::debug!(unit = unit.text(), "加入在途解析");
                rx.recv().await.map_err(|_| {
                    TranslateError::FlightAbandoned(format!("单元 {:?} 的持有者未发布结果", unit.text()))
                })?
            }
            Flight::Leader(guard) => {
                let outcome = self.resolve_uncached(unit, target_lang).await;
                self.cache.complete(guard, outcome.clone());
                outcome
            }
        }
    }

    /// 不经缓存的实际解析流程
    async fn resolve_uncached(
        &self,
        unit: &TextUnit,
        target_lang: &str,
    ) -> TranslateResult<ResolutionResult> {
        // 词义优先：英文单元译向中文时先查词典，失败落回通用链
        if self.config.dictionary_first
            && unit.class() == UnitClass::English
            && target_lang.starts_with("zh")
        {
            match self.attempt(&self.dictionary, unit, target_lang).await {
                Ok(result) => {
                    self.stats.resolved.fetch_add(1, Ordering::Relaxed);
                    return Ok(result);
                }
                Err(e) => {
                    tracing::debug!(unit = unit.text(), error = %e, "词典路径失败，转入通用翻译");
                }
            }
        }

        let last_round = self.config.max_rounds;
        let last_index = self.endpoints.len().saturating_sub(1);

        for round in 1..=last_round {
            for (index, endpoint) in self.endpoints.iter().enumerate() {
                // 请求前的随机延迟，限制请求速率、降低被限流的风险
                self.jitter_delay().await;

                match self.attempt(endpoint, unit, target_lang).await {
                    Ok(result) => {
                        self.stats.resolved.fetch_add(1, Ordering::Relaxed);
                        return Ok(result);
                    }
                    Err(e) => {
                        self.stats.failed_attempts.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(
                            unit = unit.text(),
                            endpoint = endpoint.name,
                            round,
                            error = %e,
                            "端点尝试失败"
                        );

                        let terminal = round == last_round && index == last_index;
                        if !terminal {
                            sleep(Duration::from_millis(self.config.failure_delay_ms)).await;
                        }
                    }
                }
            }
        }

        self.stats.exhausted.fetch_add(1, Ordering::Relaxed);
        Err(TranslateError::ResolutionFailure {
            unit: unit.text().to_string(),
            rounds: last_round,
        })
    }

    /// 单次端点尝试：请求、状态判定、归一化
    async fn attempt(
        &self,
        endpoint: &Endpoint,
        unit: &TextUnit,
        target_lang: &str,
    ) -> TranslateResult<ResolutionResult> {
        self.stats.attempts.fetch_add(1, Ordering::Relaxed);

        let url = endpoint.build_url(unit.text(), target_lang);
        let response = self.transport.call(&url).await?;

        if !response.is_success() {
            return Err(TranslateError::TransportFailure(format!(
                "{} 返回状态 {}",
                endpoint.name, response.status
            )));
        }

        let payload = if endpoint.shape.expects_json() {
            serde_json::from_str::<Value>(&response.body).map_err(|e| {
                TranslateError::MalformedResponse(format!("{} 返回非法 JSON: {}", endpoint.name, e))
            })?
        } else {
            Value::String(response.body)
        };

        normalize(&payload, endpoint.shape)
    }

    async fn jitter_delay(&self) {
        let (min, max) = (self.config.pre_delay_min_ms, self.config.pre_delay_max_ms);
        if max == 0 {
            return;
        }
        let delay = rand::thread_rng().gen_range(min..=max.max(min));
        sleep(Duration::from_millis(delay)).await;
    }
}
