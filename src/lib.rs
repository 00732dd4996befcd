//! wavmeta - WAV / BEXT 元数据提取工具
//!
//! 解析 RIFF/WAVE 容器中的 `fmt `、`data` 与 `bext`（EBU R68-2000）chunk，
//! 计算时长与非丢帧时间码，并把结果规范化为每文件一条 [`WavMetadata`] 记录。
//! 记录随后可导出为 ALE、简化 AAF-XML 或 JSON。
//!
//! ## 模块划分
//! - [`wav`]：chunk遍历与 `fmt `/`bext` 解码（只处理字节，不做I/O）
//! - [`core`]：时长/时间码计算与元数据聚合，唯一入口为 [`parse`]
//! - [`export`]：ALE 与 AAF-XML 序列化
//! - [`tools`]：命令行、目录扫描、批处理与输出写出
//!
//! ## 示例
//! ```no_run
//! use wavmeta::{FrameRate, parse};
//!
//! let bytes = std::fs::read("take.wav").unwrap();
//! let meta = parse(&bytes, "take.wav", bytes.len() as u64, None, FrameRate::default()).unwrap();
//! println!("{} {}", meta.file_name, meta.timecode);
//! ```

pub mod core;
pub mod error;
pub mod export;
pub mod tools;
pub mod wav;

// 重新导出核心类型
pub use crate::core::{FileFacts, FrameRate, ParseWarning, Timecode, WavMetadata, parse, parse_with_facts};
pub use error::{AppError, AppResult, ErrorCategory, FormatError, FormatResult};
pub use wav::{AudioFormat, BroadcastMetadata, Loudness};
