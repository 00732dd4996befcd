//! `fmt ` chunk解码
//!
//! 定义音频格式数据结构。解码是宽容的：任何格式标签都会被原样记录，
//! 时长计算只依赖字节布局（byte_rate / block_align），与样本编码无关。

use crate::error::{FormatError, FormatResult};
use serde::Serialize;

/// PCM格式的最小 `fmt ` 负载长度
pub const MIN_FMT_LEN: usize = 16;

/// WAVE_FORMAT_PCM
pub const WAVE_FORMAT_PCM: u16 = 0x0001;

/// WAVE_FORMAT_IEEE_FLOAT
pub const WAVE_FORMAT_IEEE_FLOAT: u16 = 0x0003;

/// WAVE_FORMAT_EXTENSIBLE
pub const WAVE_FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// 扩展格式块的最小长度（cbSize字段声明的长度）
const EXTENSIBLE_CB_SIZE: u16 = 22;

/// WAVE_FORMAT_EXTENSIBLE 的扩展字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExtensibleFormat {
    /// 有效位深（可能小于容器位深，例如24位装在32位容器中）
    pub valid_bits_per_sample: u16,

    /// 声道掩码（SPEAKER_* 位组合）
    pub channel_mask: u32,

    /// 子格式GUID的前两个字节，即实际的格式标签
    pub sub_format: u16,
}

/// 音频格式信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioFormat {
    /// 格式标签（1=PCM, 3=IEEE float, 0xFFFE=extensible, 其它原样保留）
    pub format_tag: u16,

    /// 声道数
    pub channels: u16,

    /// 采样率 (Hz)
    pub sample_rate: u32,

    /// 每秒字节数
    pub byte_rate: u32,

    /// 每帧字节数（所有声道）
    pub block_align: u16,

    /// 容器位深度
    pub bits_per_sample: u16,

    /// 扩展格式字段（仅 0xFFFE 且扩展块完整时存在）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensible: Option<ExtensibleFormat>,
}

impl AudioFormat {
    /// 从 `fmt ` 负载解码
    ///
    /// 负载大于16字节时，扩展字节被容忍；仅在 `WAVE_FORMAT_EXTENSIBLE`
    /// 且扩展块完整时才解读它们，其余情况直接忽略。
    ///
    /// # 错误
    ///
    /// * `FormatError::TruncatedFmtChunk` - 负载不足16字节
    pub fn decode(payload: &[u8]) -> FormatResult<Self> {
        if payload.len() < MIN_FMT_LEN {
            return Err(FormatError::TruncatedFmtChunk { len: payload.len() });
        }

        let format_tag = read_u16(payload, 0);
        let extensible = if format_tag == WAVE_FORMAT_EXTENSIBLE {
            decode_extensible(&payload[MIN_FMT_LEN..])
        } else {
            None
        };

        Ok(Self {
            format_tag,
            channels: read_u16(payload, 2),
            sample_rate: read_u32(payload, 4),
            byte_rate: read_u32(payload, 8),
            block_align: read_u16(payload, 12),
            bits_per_sample: read_u16(payload, 14),
            extensible,
        })
    }

    /// 检查 `byte_rate == sample_rate * block_align`
    pub fn is_consistent(&self) -> bool {
        u64::from(self.byte_rate) == u64::from(self.sample_rate) * u64::from(self.block_align)
    }

    /// 实际的格式标签（extensible时取子格式）
    pub fn effective_format_tag(&self) -> u16 {
        match self.extensible {
            Some(ext) => ext.sub_format,
            None => self.format_tag,
        }
    }

    /// 是否为线性PCM
    pub fn is_pcm(&self) -> bool {
        self.effective_format_tag() == WAVE_FORMAT_PCM
    }

    /// 格式标签的可读名称
    pub fn format_name(&self) -> &'static str {
        match self.effective_format_tag() {
            WAVE_FORMAT_PCM => "PCM",
            WAVE_FORMAT_IEEE_FLOAT => "IEEE Float",
            0x0006 => "A-law",
            0x0007 => "mu-law",
            _ => "Unknown",
        }
    }

    /// `data` 字节数对应的完整帧数（block_align为0时返回0）
    pub fn frames_in(&self, data_size: u64) -> u64 {
        if self.block_align == 0 {
            0
        } else {
            data_size / u64::from(self.block_align)
        }
    }
}

/// 解读 `cbSize` 之后的扩展块；不完整或cbSize不足时返回None
fn decode_extensible(ext: &[u8]) -> Option<ExtensibleFormat> {
    // cbSize(2) + valid_bits(2) + channel_mask(4) + GUID(16)
    if ext.len() < 2 + EXTENSIBLE_CB_SIZE as usize {
        return None;
    }
    if read_u16(ext, 0) < EXTENSIBLE_CB_SIZE {
        return None;
    }

    Some(ExtensibleFormat {
        valid_bits_per_sample: read_u16(ext, 2),
        channel_mask: read_u32(ext, 4),
        sub_format: read_u16(ext, 8),
    })
}

#[inline]
pub(crate) fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

#[inline]
pub(crate) fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}
