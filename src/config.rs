//! 配置与偏好快照
//!
//! 偏好（语言方向开关、工作模式）由外部协作方持有并持久化，核心
//! 只在解析决策时读取快照，通过变更通知流刷新，自身从不写回。
//!
//! 可调参数（轮数、延迟、批次大小）来自 TOML 配置文件，带完整的
//! 默认值，文件缺失时静默使用默认配置。

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::core::engine::EngineConfig;
use crate::error::TranslateResult;
use crate::pipeline::extractor::UnitClass;
use crate::pipeline::sweep::SweepConfig;

/// 工作模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// 划词悬停翻译
    Hover,
    /// 整页翻译
    Full,
}

/// 偏好快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// 英译中开关
    pub en2zh_enabled: bool,
    /// 中译英开关
    pub zh2en_enabled: bool,
    /// 当前模式
    pub mode: Mode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            en2zh_enabled: true,
            zh2en_enabled: true,
            mode: Mode::Hover,
        }
    }
}

impl Settings {
    /// 按单元分类决定目标语言
    ///
    /// 对应方向未启用或分类为其他时返回 `None`，该单元不解析。
    pub fn target_for(&self, class: UnitClass) -> Option<&'static str> {
        match class {
            UnitClass::English if self.en2zh_enabled => Some("zh"),
            UnitClass::Chinese if self.zh2en_enabled => Some("en"),
            _ => None,
        }
    }
}

/// 偏好快照句柄
///
/// 包装 watch 接收端：`snapshot` 取当前值，`changed` 等待下一次
/// 变更通知。
#[derive(Clone)]
pub struct SettingsHandle {
    rx: watch::Receiver<Settings>,
}

impl SettingsHandle {
    /// 当前偏好快照
    pub fn snapshot(&self) -> Settings {
        self.rx.borrow().clone()
    }

    /// 等待偏好变更
    ///
    /// 发送端关闭后返回 `false`，不再有变更。
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

/// 创建偏好通道
///
/// 发送端交给偏好协作方，接收端句柄交给核心。
pub fn settings_channel(initial: Settings) -> (watch::Sender<Settings>, SettingsHandle) {
    let (tx, rx) = watch::channel(initial);
    (tx, SettingsHandle { rx })
}

/// 核心可调参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// 扫描批次大小
    pub batch_size: usize,
    /// 端点重试轮数
    pub max_rounds: usize,
    /// 请求前随机延迟下界（毫秒）
    pub pre_delay_min_ms: u64,
    /// 请求前随机延迟上界（毫秒）
    pub pre_delay_max_ms: u64,
    /// 失败后固定等待（毫秒）
    pub failure_delay_ms: u64,
    /// 是否启用词义优先策略
    pub dictionary_first: bool,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            batch_size: crate::pipeline::sweep::DEFAULT_BATCH_SIZE,
            max_rounds: 3,
            pre_delay_min_ms: 100,
            pre_delay_max_ms: 300,
            failure_delay_ms: 1000,
            dictionary_first: true,
        }
    }
}

impl TranslatorConfig {
    /// 从 TOML 文本解析配置
    pub fn from_toml_str(content: &str) -> TranslateResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 从文件加载配置，文件不存在时返回默认配置
    pub fn load(path: impl AsRef<Path>) -> TranslateResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "配置文件不存在，使用默认配置");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// 派生引擎配置
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            max_rounds: self.max_rounds,
            pre_delay_min_ms: self.pre_delay_min_ms,
            pre_delay_max_ms: self.pre_delay_max_ms,
            failure_delay_ms: self.failure_delay_ms,
            dictionary_first: self.dictionary_first,
        }
    }

    /// 派生扫描配置
    pub fn sweep_config(&self) -> SweepConfig {
        SweepConfig {
            batch_size: self.batch_size,
        }
    }
}
