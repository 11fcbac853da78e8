//! 触发合并器
//!
//! 把高频指针移动流收敛为低频的「解析这个单元」请求：
//!
//! - 位移低于抖动阈值的移动整体忽略，不做重新提取；
//! - 达到阈值的移动重启防抖窗口，窗口到期时只有最后的位置被提取；
//! - 提取出的单元与上次已解析的相同时抑制为空操作；
//! - 指针离开宿主表面立即取消窗口并清空记忆，重入时强制重新提取。
//!
//! 窗口到期时读取偏好快照做解析决策：单元分类对应的语言方向未启用
//! 时不发起解析，按无内容处理。合并器只负责触发判定，不做解析本身：
//! 到期后发出 [`HoverEvent`]，由宿主转交解析引擎和展示层。

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Duration, Instant};

use crate::config::SettingsHandle;
use crate::pipeline::extractor::{HitTest, Point, TextUnit, UnitExtractor};

/// 抖动阈值（坐标单位）
pub const JITTER_THRESHOLD: f64 = 5.0;

/// 防抖窗口时长
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(100);

/// 指针输入事件
#[derive(Debug, Clone, Copy)]
pub enum PointerInput {
    /// 指针移动到新位置
    Moved(Point),
    /// 指针离开宿主表面（无相关目标）
    Left,
}

/// 合并器产出的悬停事件
#[derive(Debug, Clone, PartialEq)]
pub enum HoverEvent {
    /// 对该单元发起解析
    Resolve {
        unit: TextUnit,
        point: Point,
        target_lang: &'static str,
    },
    /// 当前位置没有可翻译内容，清除展示
    Clear,
}

/// 悬停触发合并器
pub struct HoverCoalescer {
    extractor: UnitExtractor,
    settings: SettingsHandle,
    threshold: f64,
    debounce: Duration,
    last_point: Option<Point>,
    last_unit: Option<TextUnit>,
}

impl HoverCoalescer {
    pub fn new(settings: SettingsHandle) -> Self {
        Self {
            extractor: UnitExtractor::new(),
            settings,
            threshold: JITTER_THRESHOLD,
            debounce: DEBOUNCE_WINDOW,
            last_point: None,
            last_unit: None,
        }
    }

    /// 覆盖阈值与窗口时长
    pub fn with_tuning(mut self, threshold: f64, debounce: Duration) -> Self {
        self.threshold = threshold;
        self.debounce = debounce;
        self
    }

    /// 消费指针输入流，直到输入端关闭
    ///
    /// 事件循环内提取与计时都在单任务里进行，窗口内后到的位置
    /// 直接覆盖先到的——被替代的位置永远不会被提取。
    pub async fn run(
        mut self,
        mut input: mpsc::Receiver<PointerInput>,
        hit_test: &dyn HitTest,
        output: mpsc::Sender<HoverEvent>,
    ) {
        // (到期时刻, 到期时要提取的位置)
        let mut pending: Option<(Instant, Point)> = None;

        loop {
            tokio::select! {
                biased;
                // 已到期的窗口先于新输入处理
                _ = async { sleep_until(pending.unwrap().0).await }, if pending.is_some() => {
                    let (_, point) = pending.take().unwrap();
                    if let Some(event) = self.window_elapsed(hit_test, point) {
                        if output.send(event).await.is_err() {
                            break;
                        }
                    }
                }
                event = input.recv() => {
                    match event {
                        Some(PointerInput::Moved(point)) => {
                            if self.is_jitter(&point) {
                                continue;
                            }
                            self.last_point = Some(point);
                            // 重启防抖窗口，只保留最新位置
                            pending = Some((Instant::now() + self.debounce, point));
                        }
                        Some(PointerInput::Left) => {
                            pending = None;
                            self.last_unit = None;
                            if output.send(HoverEvent::Clear).await.is_err() {
                                break;
                            }
                        }
                        None => {
                            // 输入流关闭不吞掉已武装的窗口：等它到期、发射，再退出
                            if let Some((deadline, point)) = pending.take() {
                                sleep_until(deadline).await;
                                if let Some(event) = self.window_elapsed(hit_test, point) {
                                    let _ = output.send(event).await;
                                }
                            }
                            break;
                        }
                    }
                }
            }
        }
    }

    /// 位移是否属于抖动
    ///
    /// 抖动移动不更新最后位置，缓慢的连续漂移累积到阈值后仍会触发。
    fn is_jitter(&self, point: &Point) -> bool {
        match &self.last_point {
            Some(last) => last.distance(point) < self.threshold,
            None => false,
        }
    }

    /// 防抖窗口到期：提取并判定是否需要解析
    fn window_elapsed(&mut self, hit_test: &dyn HitTest, point: Point) -> Option<HoverEvent> {
        let Some(unit) = self.extractor.extract_at_point(hit_test, point) else {
            self.last_unit = None;
            return Some(HoverEvent::Clear);
        };

        // 解析决策时刻读取偏好快照：方向未启用的单元按无内容处理
        let Some(target_lang) = self.settings.snapshot().target_for(unit.class()) else {
            self.last_unit = None;
            return Some(HoverEvent::Clear);
        };

        if self.last_unit.as_ref() == Some(&unit) {
            // 静止悬停在同一个词上，抑制重复解析
            return None;
        }
        self.last_unit = Some(unit.clone());
        Some(HoverEvent::Resolve {
            unit,
            point,
            target_lang,
        })
    }
}
