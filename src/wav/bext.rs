//! `bext` chunk解码（EBU R68-2000 / Tech 3285）
//!
//! 固定偏移布局：
//!
//! | 字段 | 偏移 | 长度 |
//! |---|---|---|
//! | Description | 0 | 256 |
//! | Originator | 256 | 32 |
//! | OriginatorReference | 288 | 32 |
//! | OriginationDate | 320 | 10 |
//! | OriginationTime | 330 | 8 |
//! | TimeReference | 338 | 8 (u64 LE) |
//! | Version | 346 | 2 (u16 LE) |
//! | UMID | 348 | 64 |
//! | Loudness × 5 | 412 | 2 × 5 (i16 LE, /100) |
//! | Reserved | 422 | 180 |
//! | CodingHistory | 602 | 剩余 |
//!
//! 只有UMID之前的348字节是必需的；UMID缺失部分按0补齐，响度块按槽位逐个容忍缺失。

use crate::error::{FormatError, FormatResult};
use crate::wav::format::read_u16;
use serde::{Serialize, Serializer};
use std::fmt;

/// 必需部分的长度（到UMID开始）
pub const BEXT_MANDATORY_LEN: usize = 348;

/// 响度块起始偏移
pub const LOUDNESS_OFFSET: usize = 412;

/// 响度块结束偏移（不含保留区）
pub const LOUDNESS_END: usize = 422;

/// Coding History 起始偏移
pub const CODING_HISTORY_OFFSET: usize = 602;

/// 无效字节的替换字符
const REPLACEMENT: char = '\u{FFFD}';

/// 固定宽度文本字段：(字段名, 偏移, 长度)
const DESCRIPTION: (&str, usize, usize) = ("description", 0, 256);
const ORIGINATOR: (&str, usize, usize) = ("originator", 256, 32);
const ORIGINATOR_REFERENCE: (&str, usize, usize) = ("originator_reference", 288, 32);
const ORIGINATION_DATE: (&str, usize, usize) = ("origination_date", 320, 10);
const ORIGINATION_TIME: (&str, usize, usize) = ("origination_time", 330, 8);

/// 百分之一精度的有符号定点数（响度字段的存储形式）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Centi(pub i16);

impl Centi {
    /// 浮点值（LUFS / LU / dBTP）
    pub fn value(&self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl fmt::Display for Centi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.value())
    }
}

impl Serialize for Centi {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.value())
    }
}

/// EBU响度扩展（BWF v2）
///
/// 每个字段只有在其2字节槽位完整存在时才为 `Some`。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Loudness {
    /// 综合响度 (LUFS)
    pub integrated: Option<Centi>,
    /// 响度范围 (LU)
    pub range: Option<Centi>,
    /// 最大真峰值 (dBTP)
    pub true_peak: Option<Centi>,
    /// 最大瞬时响度 (LUFS)
    pub max_momentary: Option<Centi>,
    /// 最大短期响度 (LUFS)
    pub max_short_term: Option<Centi>,
}

impl Loudness {
    /// 从bext负载解码响度块
    ///
    /// 负载到达412字节即视为存在响度块（可能是部分块），不足412字节时返回None。
    fn decode(payload: &[u8]) -> Option<Self> {
        if payload.len() < LOUDNESS_OFFSET {
            return None;
        }
        let slot = |index: usize| -> Option<Centi> {
            let at = LOUDNESS_OFFSET + index * 2;
            (payload.len() >= at + 2).then(|| Centi(read_u16(payload, at) as i16))
        };

        Some(Self {
            integrated: slot(0),
            range: slot(1),
            true_peak: slot(2),
            max_momentary: slot(3),
            max_short_term: slot(4),
        })
    }

    /// 是否所有字段都已填充
    pub fn is_complete(&self) -> bool {
        self.integrated.is_some()
            && self.range.is_some()
            && self.true_peak.is_some()
            && self.max_momentary.is_some()
            && self.max_short_term.is_some()
    }
}

/// SMPTE 330M UMID（64字节不透明标识）
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Umid(pub [u8; 64]);

impl Umid {
    /// 全零UMID视为未设置
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// 大写十六进制表示
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02X}")).collect()
    }
}

impl fmt::Debug for Umid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Umid({})", self.to_hex())
    }
}

impl Serialize for Umid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Broadcast-WAV 元数据记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BroadcastMetadata {
    /// 自由文本描述（≤256字节）
    pub description: String,

    /// 制作方/应用（≤32字节）
    pub originator: String,

    /// 制作方引用，通常为USID（≤32字节）
    pub originator_reference: String,

    /// 创建日期 `YYYY-MM-DD`
    pub origination_date: String,

    /// 创建时间 `HH:MM:SS`
    pub origination_time: String,

    /// 起始位置：自午夜起的样本数（不是秒）
    pub time_reference: u64,

    /// bext版本
    pub version: u16,

    /// UMID
    pub umid: Umid,

    /// 响度扩展（负载不足412字节时为None）
    pub loudness: Option<Loudness>,

    /// Coding History（负载不超过602字节时为空）
    pub coding_history: String,

    /// 含有非ASCII字节、经过替换解码的字段名
    pub lossy_fields: Vec<&'static str>,
}

impl BroadcastMetadata {
    /// 从 `bext` 负载解码
    ///
    /// # 错误
    ///
    /// * `FormatError::TruncatedBextChunk` - 负载不足348字节
    pub fn decode(payload: &[u8]) -> FormatResult<Self> {
        if payload.len() < BEXT_MANDATORY_LEN {
            return Err(FormatError::TruncatedBextChunk { len: payload.len() });
        }

        let mut lossy_fields = Vec::new();
        let mut text = |(name, offset, len): (&'static str, usize, usize)| {
            let field = decode_ascii_field(&payload[offset..offset + len]);
            if field.lossy {
                lossy_fields.push(name);
            }
            field.text
        };

        let description = text(DESCRIPTION);
        let originator = text(ORIGINATOR);
        let originator_reference = text(ORIGINATOR_REFERENCE);
        let origination_date = text(ORIGINATION_DATE);
        let origination_time = text(ORIGINATION_TIME);

        let mut time_reference = [0u8; 8];
        time_reference.copy_from_slice(&payload[338..346]);
        // UMID本身不在必需部分内，缺失的字节按0补齐
        let mut umid = [0u8; 64];
        let umid_bytes = &payload[BEXT_MANDATORY_LEN..payload.len().min(LOUDNESS_OFFSET)];
        umid[..umid_bytes.len()].copy_from_slice(umid_bytes);

        let coding_history = if payload.len() > CODING_HISTORY_OFFSET {
            let field = decode_coding_history(&payload[CODING_HISTORY_OFFSET..]);
            if field.lossy {
                lossy_fields.push("coding_history");
            }
            field.text
        } else {
            String::new()
        };

        Ok(Self {
            description,
            originator,
            originator_reference,
            origination_date,
            origination_time,
            time_reference: u64::from_le_bytes(time_reference),
            version: read_u16(payload, 346),
            umid: Umid(umid),
            loudness: Loudness::decode(payload),
            coding_history,
            lossy_fields,
        })
    }

    /// 是否有文本字段经过替换解码
    pub fn has_lossy_text(&self) -> bool {
        !self.lossy_fields.is_empty()
    }
}

/// 宽容解码结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    /// 是否有字节被替换
    pub lossy: bool,
}

/// 解码固定宽度ASCII字段
///
/// 截止到第一个NUL，非ASCII字节替换为U+FFFD，去掉末尾空格。
pub fn decode_ascii_field(bytes: &[u8]) -> DecodedText {
    let decoded = decode_lossy(bytes);
    DecodedText {
        text: decoded.text.trim_end_matches(' ').to_string(),
        lossy: decoded.lossy,
    }
}

/// Coding History：保留内部换行，去掉末尾空白
fn decode_coding_history(bytes: &[u8]) -> DecodedText {
    let decoded = decode_lossy(bytes);
    DecodedText {
        text: decoded
            .text
            .trim_end_matches([' ', '\r', '\n'])
            .to_string(),
        lossy: decoded.lossy,
    }
}

fn decode_lossy(bytes: &[u8]) -> DecodedText {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let mut lossy = false;
    let text = bytes[..end]
        .iter()
        .map(|&b| {
            if b.is_ascii() {
                b as char
            } else {
                lossy = true;
                REPLACEMENT
            }
        })
        .collect();
    DecodedText { text, lossy }
}
