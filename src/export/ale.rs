//! ALE（Avid Log Exchange）导出
//!
//! 文档由三段组成：`Heading`（制表符分隔的键值）、`Column`（列名）、`Data`（每文件一行）。
//! 所有值先去除控制字符，保证制表符和换行只作为分隔符出现。

use crate::core::{FrameRate, Timecode, WavMetadata};
use crate::error::{AppResult, output_error};
use crate::tools::ucs::UcsTable;
use std::path::Path;

/// 必须位于最前面的列（顺序固定）
pub const REQUIRED_COLUMNS: &[&str] = &["Name", "Tape", "Start", "End", "Tracks", "AudioFormat"];

/// 其余元数据列
const METADATA_COLUMNS: &[&str] = &[
    "Duration",
    "Duration (s)",
    "Filename",
    "Sample Rate",
    "Bit Depth",
    "Channels",
    "Number of Frames",
    "Description",
    "Originator",
    "Originator Reference",
    "Origination Date",
    "Origination Time",
    "UMID",
    "Loudness",
];

/// 仅在提供UCS分类表时出现的列
const UCS_COLUMNS: &[&str] = &["Category", "Subcategory"];

const VIDEO_FORMAT: &str = "1080";
const DEFAULT_AUDIO_FORMAT: &str = "48khz";

/// 去除控制字符（含制表符和换行）并修剪首尾空白
pub fn sanitize(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

/// 声道数对应的轨道描述：`A1`、`A1A2`、`A1-N`
pub fn tracks(channels: u16) -> String {
    match channels {
        0 => String::new(),
        1 => "A1".to_string(),
        2 => "A1A2".to_string(),
        n => format!("A1-{n}"),
    }
}

/// 采样率的Heading写法，例如 `48khz`、`44.1khz`
pub fn audio_format_label(sample_rate: u32) -> String {
    if sample_rate % 1000 == 0 {
        format!("{}khz", sample_rate / 1000)
    } else {
        format!("{}khz", f64::from(sample_rate) / 1000.0)
    }
}

/// 列名列表
pub fn columns(with_ucs: bool) -> Vec<&'static str> {
    let mut cols: Vec<&'static str> = REQUIRED_COLUMNS.to_vec();
    cols.extend_from_slice(METADATA_COLUMNS);
    if with_ucs {
        cols.extend_from_slice(UCS_COLUMNS);
    }
    cols
}

fn row(meta: &WavMetadata, ucs: Option<&UcsTable>) -> Vec<String> {
    let start = meta.start_timecode.unwrap_or(Timecode::ZERO);
    // 无bext时 End 即时长
    let end = meta.end_timecode.unwrap_or(meta.timecode);
    let bext = meta.bext.as_ref();
    let text = |field: Option<&str>| field.unwrap_or_default().to_string();

    let mut values = vec![
        meta.file_name.clone(),
        String::new(),
        start.to_string(),
        end.to_string(),
        tracks(meta.channels),
        "WAV".to_string(),
        meta.timecode.to_string(),
        format!("{:.3}", meta.duration_seconds),
        meta.file_name.clone(),
        meta.sample_rate.to_string(),
        meta.bits_per_sample.to_string(),
        meta.channels.to_string(),
        meta.sample_frames.to_string(),
        text(bext.map(|b| b.description.as_str())),
        text(bext.map(|b| b.originator.as_str())),
        text(bext.map(|b| b.originator_reference.as_str())),
        text(bext.map(|b| b.origination_date.as_str())),
        text(bext.map(|b| b.origination_time.as_str())),
        bext.filter(|b| !b.umid.is_zero())
            .map(|b| b.umid.to_hex())
            .unwrap_or_default(),
        bext.and_then(|b| b.loudness.as_ref())
            .and_then(|l| l.integrated)
            .map(|v| v.to_string())
            .unwrap_or_default(),
    ];

    if let Some(table) = ucs {
        let description = bext.map(|b| b.description.as_str()).unwrap_or_default();
        let hit = table
            .classify(&meta.file_name, description)
            .map(|result| result.primary.category);
        values.push(hit.map(|c| c.category.clone()).unwrap_or_default());
        values.push(hit.map(|c| c.subcategory.clone()).unwrap_or_default());
    }

    values.iter().map(|v| sanitize(v)).collect()
}

/// 生成ALE文档
///
/// `AUDIO_FORMAT` 取第一条记录的采样率，`FPS` 取第一条记录的帧率；
/// 没有记录时使用默认值，只输出Heading和Column。
pub fn to_ale(records: &[WavMetadata], ucs: Option<&UcsTable>) -> String {
    let first = records.first();
    let audio_format = first
        .map(|m| audio_format_label(m.sample_rate))
        .unwrap_or_else(|| DEFAULT_AUDIO_FORMAT.to_string());
    let fps = first.map(|m| m.frame_rate).unwrap_or_default();

    let mut out = String::new();
    write_heading(&mut out, &audio_format, fps);

    out.push_str("Column\n");
    out.push_str(&columns(ucs.is_some()).join("\t"));
    out.push_str("\n\n");

    out.push_str("Data\n");
    for meta in records {
        out.push_str(&row(meta, ucs).join("\t"));
        out.push('\n');
    }
    out
}

fn write_heading(out: &mut String, audio_format: &str, fps: FrameRate) {
    out.push_str("Heading\nFIELD_DELIM\tTABS\n");
    out.push_str(&format!("VIDEO_FORMAT\t{VIDEO_FORMAT}\n"));
    out.push_str(&format!("AUDIO_FORMAT\t{audio_format}\n"));
    out.push_str(&format!("FPS\t{fps}\n\n"));
}

/// 写出ALE文件
pub fn write_ale(path: &Path, records: &[WavMetadata], ucs: Option<&UcsTable>) -> AppResult<()> {
    std::fs::write(path, to_ale(records, ucs))
        .map_err(|e| output_error(&format!("写入ALE失败 {}", path.display()), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parse;

    fn wav(channels: u16, rate: u32, data_len: usize, bext: Option<Vec<u8>>) -> Vec<u8> {
        let block_align = channels * 2;
        let mut fmt = Vec::new();
        fmt.extend_from_slice(&1u16.to_le_bytes());
        fmt.extend_from_slice(&channels.to_le_bytes());
        fmt.extend_from_slice(&rate.to_le_bytes());
        fmt.extend_from_slice(&(rate * u32::from(block_align)).to_le_bytes());
        fmt.extend_from_slice(&block_align.to_le_bytes());
        fmt.extend_from_slice(&16u16.to_le_bytes());

        let mut body = Vec::new();
        let mut push = |id: &[u8; 4], payload: &[u8]| {
            body.extend_from_slice(id);
            body.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            body.extend_from_slice(payload);
            if payload.len() % 2 == 1 {
                body.push(0);
            }
        };
        push(b"fmt ", &fmt);
        if let Some(b) = &bext {
            push(b"bext", b);
        }
        push(b"data", &vec![0u8; data_len]);

        let mut out = b"RIFF".to_vec();
        out.extend_from_slice(&((body.len() + 4) as u32).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(&body);
        out
    }

    fn meta(name: &str, bytes: &[u8]) -> WavMetadata {
        parse(bytes, name, bytes.len() as u64, None, FrameRate::default()).unwrap()
    }

    #[test]
    fn test_sanitize_strips_control_characters() {
        assert_eq!(sanitize("a\tb\nc\r\u{7}d "), "abcd");
        assert_eq!(sanitize("  plain  "), "plain");
    }

    #[test]
    fn test_tracks() {
        assert_eq!(tracks(1), "A1");
        assert_eq!(tracks(2), "A1A2");
        assert_eq!(tracks(6), "A1-6");
    }

    #[test]
    fn test_audio_format_label() {
        assert_eq!(audio_format_label(48000), "48khz");
        assert_eq!(audio_format_label(44100), "44.1khz");
        assert_eq!(audio_format_label(96000), "96khz");
    }

    #[test]
    fn test_document_layout() {
        let record = meta("AIRBlow_Gust_01.wav", &wav(2, 48000, 192_000 * 2, None));
        let ale = to_ale(&[record], None);
        let lines: Vec<&str> = ale.lines().collect();

        assert_eq!(lines[0], "Heading");
        assert_eq!(lines[1], "FIELD_DELIM\tTABS");
        assert_eq!(lines[3], "AUDIO_FORMAT\t48khz");
        assert_eq!(lines[4], "FPS\t25");
        assert_eq!(lines[6], "Column");
        assert!(lines[7].starts_with("Name\tTape\tStart\tEnd\tTracks\tAudioFormat\t"));
        assert!(!lines[7].contains("Category"));
        assert_eq!(lines[9], "Data");

        let fields: Vec<&str> = lines[10].split('\t').collect();
        assert_eq!(fields.len(), columns(false).len());
        assert_eq!(fields[0], "AIRBlow_Gust_01.wav");
        assert_eq!(fields[2], "00:00:00:00");
        assert_eq!(fields[3], "00:00:02:00");
        assert_eq!(fields[4], "A1A2");

        let column = |name: &str| lines[7].split('\t').position(|c| c == name).unwrap();
        assert_eq!(fields[column("Channels")], "2");
        assert_eq!(fields[column("Duration (s)")], "2.000");
        assert_eq!(fields[column("Duration")], "00:00:02:00");
        assert_eq!(fields[column("Number of Frames")], "96000");
    }

    #[test]
    fn test_fractional_duration_column() {
        // 6声道 1.5秒
        let record = meta("x.wav", &wav(6, 48000, 48_000 * 12 + 24_000 * 12, None));
        let ale = to_ale(&[record], None);
        let lines: Vec<&str> = ale.lines().collect();
        let names: Vec<&str> = lines[7].split('\t').collect();
        let fields: Vec<&str> = lines[10].split('\t').collect();
        let at = |name: &str| fields[names.iter().position(|c| *c == name).unwrap()];
        assert_eq!(at("Channels"), "6");
        assert_eq!(at("Tracks"), "A1-6");
        assert_eq!(at("Duration (s)"), "1.500");
    }

    #[test]
    fn test_description_with_tabs_does_not_break_row() {
        let mut bext = vec![0u8; 602];
        bext[..8].copy_from_slice(b"a\tb\nc\rd ");
        let record = meta("x.wav", &wav(1, 48000, 96_000, Some(bext)));
        let ale = to_ale(&[record], None);
        let data_row = ale.lines().last().unwrap();
        let fields: Vec<&str> = data_row.split('\t').collect();
        assert_eq!(fields.len(), columns(false).len());
        assert_eq!(fields[13], "abcd");
    }

    #[test]
    fn test_ucs_columns() {
        let table = UcsTable::from_reader("CatID,Category,SubCategory\nAIRBlow,AIR,BLOW\n".as_bytes())
            .unwrap();
        let records = vec![
            meta("airblow_gust.wav", &wav(1, 44100, 88_200, None)),
            meta("unknown_x.wav", &wav(1, 44100, 88_200, None)),
        ];
        let ale = to_ale(&records, Some(&table));
        assert!(ale.contains("AUDIO_FORMAT\t44.1khz"));
        let rows: Vec<&str> = ale.lines().skip(10).collect();
        assert!(rows[0].ends_with("\tAIR\tBLOW"));
        assert!(rows[1].ends_with("\t\t"));
    }

    #[test]
    fn test_empty_records() {
        let ale = to_ale(&[], None);
        assert!(ale.contains("AUDIO_FORMAT\t48khz"));
        assert!(ale.ends_with("Data\n"));
    }
}
