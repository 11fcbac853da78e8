//! 输入到触发的管线
//!
//! 文本单元提取、悬停触发合并与整页扫描编排。

pub mod coalescer;
pub mod extractor;
pub mod sweep;

pub use coalescer::{HoverCoalescer, HoverEvent, PointerInput};
pub use extractor::{HitTarget, HitTest, Point, TextUnit, UnitClass, UnitExtractor};
pub use sweep::{PageSweeper, SweepConfig, SweepStats};
