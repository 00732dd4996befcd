//! 下游交换格式导出
//!
//! 只读取 [`WavMetadata`](crate::core::WavMetadata)，不回写核心。

pub mod aaf_xml;
pub mod ale;

pub use aaf_xml::{OutputNames, to_aaf_xml, write_aaf_xml};
pub use ale::{to_ale, write_ale};
