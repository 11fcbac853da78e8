//! 整页扫描编排器
//!
//! 按文档顺序枚举文档内符合条件的文本节点，逐节点提交解析引擎，
//! 并把译文以包裹元素形式注入原位置。并发按固定大小的批次约束：
//! 批次内全并发，批次间严格顺序，限定同时在途的解析数量。
//!
//! 每次扫描开始时读取一次偏好快照，单元的目标语言由其分类和
//! 方向开关共同决定；方向未启用的单元整体跳过。
//!
//! 扫描对单节点失败容忍：失败节点跳过，扫描继续。重复扫描幂等，
//! 因为排除谓词会拒绝先前产出的包裹内容。

use std::sync::Arc;

use futures::future::join_all;
use markup5ever_rcdom::Handle;

use crate::config::SettingsHandle;
use crate::core::engine::ResolutionEngine;
use crate::dom;
use crate::error::TranslateResult;
use crate::pipeline::extractor::{TextUnit, UnitExtractor};

/// 默认批次大小
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// 扫描配置
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// 批次大小（批内并发上限）
    pub batch_size: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// 单次扫描的统计信息
///
/// 作为扫描器实例状态携带，不放在模块级全局量里。
#[derive(Debug, Clone, Default)]
pub struct SweepStats {
    /// 枚举到的候选文本节点数
    pub nodes_seen: usize,
    /// 通过提取谓词、实际提交解析的节点数
    pub nodes_submitted: usize,
    /// 成功包裹译文的节点数
    pub nodes_wrapped: usize,
    /// 解析失败被跳过的节点数
    pub failures: usize,
}

/// 整页扫描编排器
pub struct PageSweeper {
    engine: Arc<ResolutionEngine>,
    extractor: UnitExtractor,
    settings: SettingsHandle,
    config: SweepConfig,
    last_stats: SweepStats,
}

impl PageSweeper {
    pub fn new(
        engine: Arc<ResolutionEngine>,
        settings: SettingsHandle,
        config: SweepConfig,
    ) -> Self {
        Self {
            engine,
            extractor: UnitExtractor::new(),
            settings,
            config,
            last_stats: SweepStats::default(),
        }
    }

    /// 最近一次扫描的统计信息
    pub fn last_stats(&self) -> &SweepStats {
        &self.last_stats
    }

    /// 扫描并翻译 `root` 下所有符合条件的文本节点
    ///
    /// 返回成功包裹译文的节点数。DOM 节点是 `Rc` 共享的，
    /// 本方法必须在拥有该 DOM 的执行上下文里驱动。
    pub async fn sweep(&mut self, root: &Handle) -> TranslateResult<usize> {
        let mut stats = SweepStats::default();

        let nodes = dom::collect_sweep_text_nodes(root);
        stats.nodes_seen = nodes.len();

        // 先提取，后解析：单元的方向开关在扫描开始的快照上判定
        let settings = self.settings.snapshot();
        let candidates: Vec<(Handle, TextUnit, &'static str)> = nodes
            .into_iter()
            .filter_map(|node| {
                let unit = self.extractor.extract_from_node(&node)?;
                let target = settings.target_for(unit.class())?;
                Some((node, unit, target))
            })
            .collect();
        stats.nodes_submitted = candidates.len();

        tracing::debug!(
            seen = stats.nodes_seen,
            submitted = stats.nodes_submitted,
            "开始整页扫描"
        );

        for batch in candidates.chunks(self.config.batch_size) {
            // 批内全并发；同文本的节点会在引擎侧合流到同一次解析
            let resolutions = join_all(batch.iter().map(|(_, unit, target)| {
                let engine = Arc::clone(&self.engine);
                async move { engine.resolve(unit, target).await }
            }))
            .await;

            for ((node, unit, _), outcome) in batch.iter().zip(resolutions) {
                match outcome {
                    Ok(result) => {
                        if dom::wrap_translation(node, &result) {
                            stats.nodes_wrapped += 1;
                        }
                    }
                    Err(e) => {
                        // 单节点失败不终止扫描
                        stats.failures += 1;
                        tracing::warn!(unit = unit.text(), error = %e, "节点解析失败，跳过");
                    }
                }
            }
        }

        tracing::info!(
            wrapped = stats.nodes_wrapped,
            failures = stats.failures,
            "整页扫描完成"
        );

        let wrapped = stats.nodes_wrapped;
        self.last_stats = stats;
        Ok(wrapped)
    }
}
