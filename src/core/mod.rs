//! 核心模块
//!
//! 时长/时间码计算与元数据聚合。解析入口为 [`parse`]。

pub mod metadata;
pub mod timecode;

// 重新导出公共接口
pub use metadata::{FileFacts, ParseWarning, WavMetadata, aggregate, parse, parse_with_facts};
pub use timecode::{DEFAULT_FPS, FrameRate, Timecode};
