//! 元数据聚合器
//!
//! 把一个文件的chunk序列与调用方提供的文件系统信息合成为唯一的 [`WavMetadata`]。
//!
//! 宽容策略：
//! - `fmt `/`data` 必需，缺失即失败
//! - 重复chunk以第一个为准，后续的记录为警告
//! - `bext` 解码失败不会使整个文件失败，只降级为 `bext = None` 并给出警告

use crate::core::timecode::{self, FrameRate, Timecode};
use crate::error::{ChunkKind, FormatError, FormatResult};
use crate::wav::{AudioFormat, BroadcastMetadata, ChunkId, ChunkReader, RawChunk};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;
use std::time::SystemTime;

/// 调用方提供的文件系统信息
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileFacts {
    /// 文件名（不含目录）
    pub file_name: String,

    /// 文件大小（字节）
    pub file_size: u64,

    /// 修改时间
    pub modified_time: Option<DateTime<Local>>,

    /// 创建时间（并非所有文件系统都提供）
    pub created_time: Option<DateTime<Local>>,
}

impl FileFacts {
    /// 仅含文件名和大小
    pub fn new(file_name: impl Into<String>, file_size: u64) -> Self {
        Self {
            file_name: file_name.into(),
            file_size,
            modified_time: None,
            created_time: None,
        }
    }

    /// 设置修改时间
    pub fn with_modified(mut self, modified: Option<SystemTime>) -> Self {
        self.modified_time = modified.map(DateTime::<Local>::from);
        self
    }

    /// 设置创建时间
    pub fn with_created(mut self, created: Option<SystemTime>) -> Self {
        self.created_time = created.map(DateTime::<Local>::from);
        self
    }
}

/// 非致命警告
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseWarning {
    /// 重复的chunk被忽略
    DuplicateChunk { id: String, offset: usize },

    /// bext解码失败，记录降级为无bext
    BextDegraded { reason: String },

    /// 文本字段含非ASCII字节，已替换
    NonAsciiText { field: &'static str },

    /// byte_rate 与 sample_rate * block_align 不一致
    InconsistentByteRate { byte_rate: u32, expected: u64 },

    /// chunk声明大小超出文件长度，只使用了实际存在的字节
    TruncatedChunk {
        id: String,
        declared: u32,
        available: usize,
    },
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseWarning::DuplicateChunk { id, offset } => {
                write!(f, "忽略重复的chunk '{id}'（偏移 {offset}） / duplicate chunk ignored")
            }
            ParseWarning::BextDegraded { reason } => {
                write!(f, "bext已忽略: {reason} / bext degraded")
            }
            ParseWarning::NonAsciiText { field } => {
                write!(f, "字段 {field} 含非ASCII字节，已替换 / non-ASCII text replaced")
            }
            ParseWarning::InconsistentByteRate {
                byte_rate,
                expected,
            } => write!(
                f,
                "byte_rate={byte_rate} 与 sample_rate*block_align={expected} 不一致 / inconsistent byte rate"
            ),
            ParseWarning::TruncatedChunk {
                id,
                declared,
                available,
            } => write!(
                f,
                "chunk '{id}' 声明{declared}字节，实际{available}字节 / truncated chunk"
            ),
        }
    }
}

/// 一个WAV文件的规范化元数据记录
///
/// 由聚合器一次性生成，之后只读；导出器都以 `&WavMetadata` 使用它。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WavMetadata {
    pub file_name: String,
    pub file_size: u64,
    pub modified_time: Option<DateTime<Local>>,
    pub created_time: Option<DateTime<Local>>,

    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,

    /// 完整的 `fmt ` 信息
    pub format: AudioFormat,

    /// `data` 负载字节数（截断时为实际存在的字节数）
    pub data_size: u64,

    /// 完整帧数（data_size / block_align）
    pub sample_frames: u64,

    pub duration_seconds: f64,
    pub frame_rate: FrameRate,

    /// 时长时间码
    pub timecode: Timecode,

    /// bext TimeReference 对应的起始时间码
    pub start_timecode: Option<Timecode>,

    /// 起始时间码 + 时长
    pub end_timecode: Option<Timecode>,

    pub bext: Option<BroadcastMetadata>,

    pub warnings: Vec<ParseWarning>,
}

impl WavMetadata {
    /// 文件名去掉扩展名
    pub fn file_stem(&self) -> &str {
        match self.file_name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.file_name,
        }
    }

    /// bext描述（无bext时为空串）
    pub fn description(&self) -> &str {
        self.bext.as_ref().map_or("", |b| b.description.as_str())
    }

    /// bext制作方（无bext时为空串）
    pub fn originator(&self) -> &str {
        self.bext.as_ref().map_or("", |b| b.originator.as_str())
    }
}

/// 聚合一个文件的chunk序列
///
/// # 错误
///
/// * `FormatError::MissingRequiredChunk` - 缺少 `fmt ` 或 `data`
/// * `FormatError::TruncatedFmtChunk` - 第一个 `fmt ` 负载不足16字节
/// * `FormatError::InvalidFormat` - byte_rate为0
pub fn aggregate<'a, I>(chunks: I, facts: FileFacts, frame_rate: FrameRate) -> FormatResult<WavMetadata>
where
    I: IntoIterator<Item = RawChunk<'a>>,
{
    let mut format: Option<AudioFormat> = None;
    let mut data_size: Option<u64> = None;
    let mut bext_seen = false;
    let mut bext: Option<BroadcastMetadata> = None;
    let mut warnings = Vec::new();

    for chunk in chunks {
        if chunk.truncated {
            warnings.push(ParseWarning::TruncatedChunk {
                id: chunk.id.to_string(),
                declared: chunk.size,
                available: chunk.payload.len(),
            });
        }

        let first = match chunk.id {
            ChunkId::FMT => {
                let first = format.is_none();
                if first {
                    format = Some(AudioFormat::decode(chunk.payload)?);
                }
                first
            }
            ChunkId::DATA => {
                let first = data_size.is_none();
                if first {
                    data_size = Some(chunk.payload.len() as u64);
                }
                first
            }
            ChunkId::BEXT => {
                let first = !bext_seen;
                if first {
                    bext_seen = true;
                    match BroadcastMetadata::decode(chunk.payload) {
                        Ok(decoded) => bext = Some(decoded),
                        Err(e) => warnings.push(ParseWarning::BextDegraded {
                            reason: e.to_string(),
                        }),
                    }
                }
                first
            }
            other => {
                log::debug!("跳过chunk '{other}'（{}字节） / skipping chunk", chunk.size);
                true
            }
        };

        if !first {
            warnings.push(ParseWarning::DuplicateChunk {
                id: chunk.id.to_string(),
                offset: chunk.offset,
            });
        }
    }

    let format = format.ok_or(FormatError::MissingRequiredChunk(ChunkKind::Format))?;
    let data_size = data_size.ok_or(FormatError::MissingRequiredChunk(ChunkKind::Data))?;

    if !format.is_consistent() {
        warnings.push(ParseWarning::InconsistentByteRate {
            byte_rate: format.byte_rate,
            expected: u64::from(format.sample_rate) * u64::from(format.block_align),
        });
    }

    let duration_seconds = timecode::duration_seconds(&format, data_size)?;
    let duration_tc = timecode::duration_timecode(&format, data_size, frame_rate)?;
    let sample_frames = format.frames_in(data_size);

    if let Some(b) = &bext {
        warnings.extend(
            b.lossy_fields
                .iter()
                .map(|&field| ParseWarning::NonAsciiText { field }),
        );
    }

    // 跨chunk依赖：TimeReference是样本数，需要fmt中的采样率
    let (start_timecode, end_timecode) = match &bext {
        Some(b) if format.sample_rate > 0 => {
            let start = Timecode::from_samples(b.time_reference, format.sample_rate, frame_rate)?;
            let end = Timecode::from_samples(
                b.time_reference.saturating_add(sample_frames),
                format.sample_rate,
                frame_rate,
            )?;
            (Some(start), Some(end))
        }
        _ => (None, None),
    };

    for warning in &warnings {
        log::warn!("{}: {warning}", facts.file_name);
    }

    Ok(WavMetadata {
        file_name: facts.file_name,
        file_size: facts.file_size,
        modified_time: facts.modified_time,
        created_time: facts.created_time,
        sample_rate: format.sample_rate,
        channels: format.channels,
        bits_per_sample: format.bits_per_sample,
        format,
        data_size,
        sample_frames,
        duration_seconds,
        frame_rate,
        timecode: duration_tc,
        start_timecode,
        end_timecode,
        bext,
        warnings,
    })
}

/// 解析一个完整WAV文件的字节内容
///
/// 唯一的解析入口：调用方负责读取文件并提供文件名、大小和修改时间。
pub fn parse(
    bytes: &[u8],
    file_name: &str,
    file_size: u64,
    modified_time: Option<SystemTime>,
    frame_rate: FrameRate,
) -> FormatResult<WavMetadata> {
    let facts = FileFacts::new(file_name, file_size).with_modified(modified_time);
    parse_with_facts(bytes, facts, frame_rate)
}

/// 与 [`parse`] 相同，但接受完整的 [`FileFacts`]
pub fn parse_with_facts(
    bytes: &[u8],
    facts: FileFacts,
    frame_rate: FrameRate,
) -> FormatResult<WavMetadata> {
    let reader = ChunkReader::new(bytes)?;
    aggregate(reader, facts, frame_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(id);
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(payload);
        if payload.len() % 2 == 1 {
            out.push(0);
        }
        out
    }

    fn fmt_payload(channels: u16, rate: u32, bits: u16) -> Vec<u8> {
        let block_align = channels * bits / 8;
        let mut p = Vec::new();
        p.extend_from_slice(&1u16.to_le_bytes());
        p.extend_from_slice(&channels.to_le_bytes());
        p.extend_from_slice(&rate.to_le_bytes());
        p.extend_from_slice(&(rate * u32::from(block_align)).to_le_bytes());
        p.extend_from_slice(&block_align.to_le_bytes());
        p.extend_from_slice(&bits.to_le_bytes());
        p
    }

    fn wav(chunks: &[Vec<u8>]) -> Vec<u8> {
        let body: Vec<u8> = chunks.concat();
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&((body.len() + 4) as u32).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(&body);
        out
    }

    fn parse_default(bytes: &[u8]) -> FormatResult<WavMetadata> {
        parse(bytes, "test.wav", bytes.len() as u64, None, FrameRate::default())
    }

    #[test]
    fn test_minimal_file() {
        let bytes = wav(&[
            chunk(b"fmt ", &fmt_payload(1, 44100, 16)),
            chunk(b"data", &[0u8; 88200]),
        ]);
        let meta = parse_default(&bytes).unwrap();
        assert_eq!(meta.file_name, "test.wav");
        assert_eq!(meta.sample_rate, 44100);
        assert_eq!(meta.channels, 1);
        assert_eq!(meta.duration_seconds, 1.0);
        assert_eq!(meta.sample_frames, 44100);
        assert_eq!(meta.timecode.to_string(), "00:00:01:00");
        assert!(meta.bext.is_none());
        assert!(meta.start_timecode.is_none());
        assert!(meta.warnings.is_empty());
    }

    #[test]
    fn test_missing_chunks() {
        let only_fmt = wav(&[chunk(b"fmt ", &fmt_payload(1, 44100, 16))]);
        assert_eq!(
            parse_default(&only_fmt).unwrap_err(),
            FormatError::MissingRequiredChunk(ChunkKind::Data)
        );

        let only_data = wav(&[chunk(b"data", &[0u8; 4])]);
        assert_eq!(
            parse_default(&only_data).unwrap_err(),
            FormatError::MissingRequiredChunk(ChunkKind::Format)
        );
    }

    #[test]
    fn test_data_before_fmt_is_accepted() {
        let bytes = wav(&[
            chunk(b"data", &[0u8; 192_000]),
            chunk(b"fmt ", &fmt_payload(2, 48000, 16)),
        ]);
        let meta = parse_default(&bytes).unwrap();
        assert_eq!(meta.duration_seconds, 1.0);
    }

    #[test]
    fn test_unknown_chunks_are_skipped() {
        let bytes = wav(&[
            chunk(b"JUNK", &[0u8; 27]),
            chunk(b"fmt ", &fmt_payload(2, 48000, 16)),
            chunk(b"LIST", b"INFOISFT\x05\x00\x00\x00Tool\x00\x00"),
            chunk(b"data", &[0u8; 400]),
        ]);
        let meta = parse_default(&bytes).unwrap();
        assert!(meta.warnings.is_empty());
        assert_eq!(meta.data_size, 400);
    }

    #[test]
    fn test_truncated_bext_degrades() {
        let bytes = wav(&[
            chunk(b"fmt ", &fmt_payload(2, 48000, 24)),
            chunk(b"bext", &[0u8; 100]),
            chunk(b"data", &[0u8; 600]),
        ]);
        let meta = parse_default(&bytes).unwrap();
        assert!(meta.bext.is_none());
        assert!(matches!(
            meta.warnings.as_slice(),
            [ParseWarning::BextDegraded { .. }]
        ));
    }

    #[test]
    fn test_start_and_end_timecode_from_time_reference() {
        let mut bext = vec![0u8; 602];
        // 10:00:00:00 @ 48kHz
        bext[338..346].copy_from_slice(&(48_000u64 * 36_000).to_le_bytes());
        let bytes = wav(&[
            chunk(b"fmt ", &fmt_payload(2, 48000, 16)),
            chunk(b"bext", &bext),
            chunk(b"data", &vec![0u8; 192_000 * 5]),
        ]);
        let meta = parse_default(&bytes).unwrap();
        assert_eq!(meta.start_timecode.unwrap().to_string(), "10:00:00:00");
        assert_eq!(meta.end_timecode.unwrap().to_string(), "10:00:05:00");
    }

    #[test]
    fn test_inconsistent_byte_rate_is_a_warning() {
        let mut fmt = fmt_payload(2, 48000, 16);
        fmt[8..12].copy_from_slice(&96_000u32.to_le_bytes());
        let bytes = wav(&[chunk(b"fmt ", &fmt), chunk(b"data", &[0u8; 96_000])]);
        let meta = parse_default(&bytes).unwrap();
        assert_eq!(meta.duration_seconds, 1.0, "时长按声明的byte_rate计算");
        assert_eq!(
            meta.warnings,
            vec![ParseWarning::InconsistentByteRate {
                byte_rate: 96_000,
                expected: 192_000
            }]
        );
    }

    #[test]
    fn test_zero_byte_rate_fails() {
        let mut fmt = fmt_payload(2, 48000, 16);
        fmt[8..12].copy_from_slice(&0u32.to_le_bytes());
        let bytes = wav(&[chunk(b"fmt ", &fmt), chunk(b"data", &[0u8; 8])]);
        assert!(matches!(
            parse_default(&bytes),
            Err(FormatError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_file_stem() {
        let bytes = wav(&[
            chunk(b"fmt ", &fmt_payload(1, 8000, 8)),
            chunk(b"data", &[0u8; 8]),
        ]);
        let meta = parse(&bytes, "DOOR_Slam.01.wav", 0, None, FrameRate::default()).unwrap();
        assert_eq!(meta.file_stem(), "DOOR_Slam.01");
        assert_eq!(meta.description(), "");
    }

    #[test]
    fn test_facts_are_merged() {
        let bytes = wav(&[
            chunk(b"fmt ", &fmt_payload(1, 8000, 8)),
            chunk(b"data", &[0u8; 8]),
        ]);
        let now = SystemTime::now();
        let meta = parse(&bytes, "a.wav", 1234, Some(now), FrameRate::default()).unwrap();
        assert_eq!(meta.file_size, 1234);
        assert_eq!(meta.modified_time, Some(DateTime::<Local>::from(now)));
        assert_eq!(meta.created_time, None);
    }
}
