//! WAV容器解析模块
//!
//! 只覆盖 `fmt `、`data`、`bext` 三种chunk；其余chunk由遍历器跳过。

pub mod bext;
pub mod chunk_reader;
pub mod format;

pub use bext::{BroadcastMetadata, Centi, Loudness, Umid};
pub use chunk_reader::{ChunkId, ChunkReader, RawChunk};
pub use format::{AudioFormat, ExtensibleFormat};
