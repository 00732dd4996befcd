//! 解析入口的行为测试
//!
//! 从完整文件字节出发，验证chunk遍历、格式/bext解码、时长与时间码、
//! 以及聚合阶段的宽容策略。


use wav_fixtures::{BextBuilder, WavBuilder, log, write_hound_wav};
use wavmeta::core::{DEFAULT_FPS, ParseWarning};
use wavmeta::error::ChunkKind;
use wavmeta::{FormatError, FrameRate, WavMetadata, parse};

fn parse_bytes(bytes: &[u8]) -> Result<WavMetadata, FormatError> {
    parse(bytes, "test.wav", bytes.len() as u64, None, FrameRate::default())
}

#[test]
fn test_minimal_wav_has_no_bext() {
    let bytes = WavBuilder::new().fmt(2, 48000, 16).data(4800).build();
    let meta = parse_bytes(&bytes).unwrap();

    assert!(meta.bext.is_none());
    assert!(meta.start_timecode.is_none());
    assert_eq!(meta.frame_rate.fps(), DEFAULT_FPS);
    assert_eq!(meta.data_size, 4800);
    assert_eq!(meta.sample_frames, 1200);
    assert!(meta.warnings.is_empty());
    log("最小WAV解析成功", "minimal WAV parsed");
}

#[test]
fn test_ten_seconds_at_25_fps() {
    let bytes = WavBuilder::new().fmt(2, 48000, 16).data(1_920_000).build();
    let meta = parse_bytes(&bytes).unwrap();

    assert_eq!(meta.duration_seconds, 10.0);
    assert_eq!(meta.timecode.to_string(), "00:00:10:00");
}

#[test]
fn test_exact_second_multiples() {
    for k in [1usize, 3, 61] {
        let bytes = WavBuilder::new().fmt(1, 8000, 16).data(16_000 * k).build();
        let meta = parse_bytes(&bytes).unwrap();
        assert_eq!(meta.duration_seconds, k as f64, "k={k}");
        assert_eq!(meta.timecode.frames, 0);
    }
}

#[test]
fn test_frame_rate_is_caller_supplied() {
    // 1.5秒
    let bytes = WavBuilder::new().fmt(1, 48000, 16).data(144_000).build();
    let at = |fps| {
        parse(&bytes, "x.wav", 0, None, FrameRate::new(fps).unwrap())
            .unwrap()
            .timecode
            .to_string()
    };
    assert_eq!(at(25), "00:00:01:12");
    assert_eq!(at(24), "00:00:01:12");
    assert_eq!(at(30), "00:00:01:15");
    assert_eq!(at(60), "00:00:01:30");
}

#[test]
fn test_bext_text_fields_round_trip() {
    let builder = BextBuilder::default();
    let bytes = WavBuilder::new()
        .fmt(2, 48000, 24)
        .bext(&builder.build())
        .data(288_000)
        .build();
    let meta = parse_bytes(&bytes).unwrap();
    let bext = meta.bext.expect("应解出bext");

    assert_eq!(bext.description, builder.description);
    assert_eq!(bext.originator, builder.originator);
    assert_eq!(bext.originator_reference, builder.originator_reference);
    assert_eq!(bext.origination_date, builder.origination_date);
    assert_eq!(bext.origination_time, builder.origination_time);
    assert_eq!(bext.version, 2);
    assert_eq!(bext.coding_history, "A=PCM,F=48000,W=24,M=stereo,T=original");
    assert!(bext.lossy_fields.is_empty());

    let loudness = bext.loudness.expect("应有响度信息");
    assert!(loudness.is_complete());
    assert_eq!(loudness.integrated.unwrap().value(), -23.0);
    assert_eq!(loudness.range.unwrap().value(), 4.5);
    assert_eq!(loudness.true_peak.unwrap().value(), -1.0);
}

#[test]
fn test_time_reference_gives_start_and_end() {
    let builder = BextBuilder {
        // 01:00:00:00 @ 48kHz
        time_reference: 48_000 * 3600,
        ..Default::default()
    };
    let bytes = WavBuilder::new()
        .fmt(2, 48000, 16)
        .bext(&builder.build())
        .data(192_000 * 2 + 96_000)
        .build();
    let meta = parse_bytes(&bytes).unwrap();

    assert_eq!(meta.start_timecode.unwrap().to_string(), "01:00:00:00");
    assert_eq!(meta.end_timecode.unwrap().to_string(), "01:00:02:12");
    assert_eq!(meta.timecode.to_string(), "00:00:02:12");
}

#[test]
fn test_duplicate_fmt_first_wins() {
    let single = WavBuilder::new().fmt(2, 48000, 16).data(192_000).build();
    let duplicated = WavBuilder::new()
        .fmt(2, 48000, 16)
        .fmt(1, 22050, 8)
        .data(192_000)
        .build();

    let a = parse_bytes(&single).unwrap();
    let b = parse_bytes(&duplicated).unwrap();

    assert_eq!(a.format, b.format);
    assert_eq!(a.duration_seconds, b.duration_seconds);
    assert_eq!(a.timecode, b.timecode);
    assert!(a.warnings.is_empty());
    assert!(matches!(
        b.warnings.as_slice(),
        [ParseWarning::DuplicateChunk { id, .. }] if id == "fmt "
    ));
}

#[test]
fn test_duplicate_data_and_bext_first_wins() {
    let first = BextBuilder::default();
    let second = BextBuilder {
        description: "second".to_string(),
        ..Default::default()
    };
    let bytes = WavBuilder::new()
        .fmt(1, 48000, 16)
        .bext(&first.build())
        .data(96_000)
        .bext(&second.build())
        .data(10)
        .build();
    let meta = parse_bytes(&bytes).unwrap();

    assert_eq!(meta.data_size, 96_000);
    assert_eq!(meta.bext.unwrap().description, first.description);
    assert_eq!(meta.warnings.len(), 2);
}

#[test]
fn test_missing_required_chunks() {
    let no_data = WavBuilder::new().fmt(2, 48000, 16).build();
    assert_eq!(
        parse_bytes(&no_data).unwrap_err(),
        FormatError::MissingRequiredChunk(ChunkKind::Data)
    );

    let no_fmt = WavBuilder::new().data(100).build();
    assert_eq!(
        parse_bytes(&no_fmt).unwrap_err(),
        FormatError::MissingRequiredChunk(ChunkKind::Format)
    );
}

#[test]
fn test_not_riff_wave() {
    assert_eq!(parse_bytes(b"").unwrap_err(), FormatError::NotRiffWave);
    assert_eq!(
        parse_bytes(b"RIFF\x04\x00\x00\x00AIFF").unwrap_err(),
        FormatError::NotRiffWave
    );
    assert_eq!(parse_bytes(b"ID3\x03garbage").unwrap_err(), FormatError::NotRiffWave);
}

#[test]
fn test_non_ascii_description_is_lossy_not_fatal() {
    let mut payload = BextBuilder::default().build();
    payload[..6].copy_from_slice(b"Caf\xc3\xa9 ");
    payload[6] = 0;
    let bytes = WavBuilder::new()
        .fmt(1, 48000, 16)
        .bext(&payload)
        .data(96_000)
        .build();
    let meta = parse_bytes(&bytes).unwrap();

    let bext = meta.bext.as_ref().unwrap();
    assert_eq!(bext.description, "Caf\u{FFFD}\u{FFFD}");
    assert!(meta
        .warnings
        .contains(&ParseWarning::NonAsciiText { field: "description" }));
}

#[test]
fn test_hound_written_file_parses() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_hound_wav(dir.path(), "tone.wav", 2, 44100, 44100);
    let bytes = std::fs::read(&path).unwrap();

    let meta = parse(&bytes, "tone.wav", bytes.len() as u64, None, FrameRate::default()).unwrap();
    assert_eq!(meta.sample_rate, 44100);
    assert_eq!(meta.channels, 2);
    assert_eq!(meta.bits_per_sample, 16);
    assert_eq!(meta.sample_frames, 44100);
    assert_eq!(meta.timecode.to_string(), "00:00:01:00");
    log("hound生成的文件解析正确", "hound fixture parsed");
}

#[test]
fn test_json_serialization_shape() {
    let bytes = WavBuilder::new()
        .fmt(2, 48000, 16)
        .bext(&BextBuilder::default().build())
        .data(192_000)
        .build();
    let meta = parse_bytes(&bytes).unwrap();
    let value = serde_json::to_value(&meta).unwrap();

    assert_eq!(value["file_name"], "test.wav");
    assert_eq!(value["timecode"], "00:00:01:00");
    assert_eq!(value["frame_rate"], 25);
    assert_eq!(value["bext"]["loudness"]["integrated"], -23.0);
    assert!(value["bext"]["umid"].as_str().unwrap().len() == 128);
    assert!(value["warnings"].as_array().unwrap().is_empty());
}
