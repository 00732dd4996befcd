//! RIFF chunk遍历器
//!
//! 在内存缓冲区上单次遍历 RIFF/WAVE 容器，惰性产出 [`RawChunk`]。
//! 不解析任何chunk内容，只负责边界：填充字节、截断和头部校验。

use crate::error::{FormatError, FormatResult};
use std::fmt;

/// RIFF 容器标识
pub const RIFF_MAGIC: &[u8; 4] = b"RIFF";

/// WAVE 表单类型
pub const WAVE_FORM: &[u8; 4] = b"WAVE";

/// RIFF头长度：`RIFF` + u32大小 + `WAVE`
pub const RIFF_HEADER_LEN: usize = 12;

/// chunk头长度：4字节ID + u32小端大小
pub const CHUNK_HEADER_LEN: usize = 8;

/// 4字节chunk标识
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkId(pub [u8; 4]);

impl ChunkId {
    pub const FMT: ChunkId = ChunkId(*b"fmt ");
    pub const DATA: ChunkId = ChunkId(*b"data");
    pub const BEXT: ChunkId = ChunkId(*b"bext");

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 非打印字节以转义形式显示，避免日志被控制字符污染
        for &b in &self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkId(\"{self}\")")
    }
}

/// 一个原始chunk（借用输入缓冲区）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawChunk<'a> {
    /// chunk标识
    pub id: ChunkId,

    /// 头部声明的大小（可能大于实际可用的负载）
    pub size: u32,

    /// chunk头在缓冲区中的偏移
    pub offset: usize,

    /// 实际可用的负载字节
    pub payload: &'a [u8],

    /// 声明大小为奇数，后面跟随一个填充字节
    pub padded: bool,

    /// 声明大小超出剩余数据，负载已被截断
    pub truncated: bool,
}

/// RIFF/WAVE chunk遍历器
///
/// 单次遍历、不可重启；需要重新解析时由调用方重新构造。
#[derive(Debug, Clone)]
pub struct ChunkReader<'a> {
    bytes: &'a [u8],
    cursor: usize,
    riff_size: u32,
    finished: bool,
}

impl<'a> ChunkReader<'a> {
    /// 校验 RIFF/WAVE 头并定位到第一个chunk
    ///
    /// # 错误
    ///
    /// * `FormatError::NotRiffWave` - 不足12字节，或标识不是 `RIFF`/`WAVE`
    pub fn new(bytes: &'a [u8]) -> FormatResult<Self> {
        if bytes.len() < RIFF_HEADER_LEN
            || &bytes[0..4] != RIFF_MAGIC
            || &bytes[8..12] != WAVE_FORM
        {
            return Err(FormatError::NotRiffWave);
        }

        let riff_size = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);

        Ok(Self {
            bytes,
            cursor: RIFF_HEADER_LEN,
            riff_size,
            finished: false,
        })
    }

    /// RIFF头中声明的大小（仅记录，不作为遍历边界）
    pub fn riff_size(&self) -> u32 {
        self.riff_size
    }
}

impl<'a> Iterator for ChunkReader<'a> {
    type Item = RawChunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let remaining = self.bytes.len() - self.cursor;
        if remaining < CHUNK_HEADER_LEN {
            if remaining > 0 {
                log::debug!(
                    "忽略末尾{remaining}字节不完整的chunk头 / ignoring {remaining} trailing bytes"
                );
            }
            self.finished = true;
            return None;
        }

        let offset = self.cursor;
        let header = &self.bytes[offset..offset + CHUNK_HEADER_LEN];
        let id = ChunkId([header[0], header[1], header[2], header[3]]);
        let size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

        let payload_start = offset + CHUNK_HEADER_LEN;
        let available = self.bytes.len() - payload_start;
        let declared = size as usize;
        let padded = size % 2 == 1;

        if declared > available {
            // 后续偏移不可信，截断后停止遍历
            log::debug!("chunk {id} 声明{declared}字节，仅剩{available}字节 / truncated chunk");
            self.finished = true;
            return Some(RawChunk {
                id,
                size,
                offset,
                payload: &self.bytes[payload_start..],
                padded,
                truncated: true,
            });
        }

        let payload_end = payload_start + declared;
        // 奇数大小后的填充字节可能恰好缺失于文件末尾，此时直接结束
        self.cursor = (payload_end + usize::from(padded)).min(self.bytes.len());

        Some(RawChunk {
            id,
            size,
            offset,
            payload: &self.bytes[payload_start..payload_end],
            padded,
            truncated: false,
        })
    }
}
