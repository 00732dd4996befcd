//! 文件处理模块
//!
//! 负责读取文件、调用核心解析并收集文件系统信息，以及串行批处理。

use super::batch_state::{BatchOutcome, FailedFile, ProcessedFile, SerialBatchStats};
use super::cli::AppConfig;
use super::utils;
use crate::core::{FileFacts, FrameRate, WavMetadata, parse_with_facts};
use crate::error::{AppError, AppResult, ErrorCategory};
use std::path::{Path, PathBuf};

/// 读取并解析单个WAV文件
///
/// 文件被完整读入内存后交给核心解析；解析错误会附带文件路径。
pub fn extract_metadata(path: &Path, frame_rate: FrameRate) -> AppResult<WavMetadata> {
    let fs_meta = std::fs::metadata(path)?;
    if !fs_meta.is_file() {
        return Err(AppError::InvalidInput(format!(
            "不是普通文件: {}",
            path.display()
        )));
    }

    let bytes = std::fs::read(path)?;
    let facts = FileFacts::new(utils::extract_filename_lossy(path), fs_meta.len())
        .with_modified(fs_meta.modified().ok())
        .with_created(fs_meta.created().ok());

    parse_with_facts(&bytes, facts, frame_rate).map_err(|e| AppError::format(path, e))
}

/// 处理单个文件并在verbose模式下显示详细信息
pub fn process_single_file(path: &Path, config: &AppConfig) -> AppResult<WavMetadata> {
    if config.verbose {
        println!("读取文件 / Reading: {}", path.display());
    }

    let metadata = extract_metadata(path, config.frame_rate)?;

    if config.verbose {
        show_file_details(&metadata);
    }

    Ok(metadata)
}

/// 显示单个文件的解析结果
pub fn show_file_details(meta: &WavMetadata) {
    println!("   格式 / Format: {} ({})", meta.format.format_name(), meta.format.format_tag);
    println!("   采样率 / Sample rate: {} Hz", meta.sample_rate);
    println!("   声道数 / Channels: {}", meta.channels);
    println!("   位深度 / Bit depth: {} bits", meta.bits_per_sample);
    println!(
        "   时长 / Duration: {:.3} s ({} @ {} fps)",
        meta.duration_seconds, meta.timecode, meta.frame_rate
    );
    if let Some(bext) = &meta.bext {
        if !bext.description.is_empty() {
            println!("   描述 / Description: {}", bext.description);
        }
        if let Some(start) = meta.start_timecode {
            println!("   起始时间码 / Start TC: {start}");
        }
    }
    for warning in &meta.warnings {
        println!("   [WARNING] {warning}");
    }
}

/// 显示失败文件信息
pub fn report_failure(index: usize, total: usize, path: &Path, error: &AppError, verbose: bool) {
    let category = ErrorCategory::from_app_error(error);
    if verbose {
        println!("   [FAIL] 处理失败 / Processing failed");
        println!("      文件 / File: {}", path.display());
        println!("      类别 / Category: {}", category.display_name());
        println!("      错误 / Error: {error}");
        if let Some(source) = std::error::Error::source(error) {
            println!("      原因 / Cause: {source}");
        }
    } else {
        println!(
            "[FAIL] [{}/{}] {} - [{}] {error} / 处理失败",
            index + 1,
            total,
            utils::extract_filename_lossy(path),
            category.display_name()
        );
    }
}

/// 串行批量处理
pub fn process_batch_serial(files: &[PathBuf], config: &AppConfig) -> BatchOutcome {
    let mut stats = SerialBatchStats::new();
    let mut records = Vec::with_capacity(files.len());
    let mut failures = Vec::new();

    for (index, path) in files.iter().enumerate() {
        if config.verbose {
            println!(
                "[PROCESSING] [{}/{}] 处理 / Processing: {}",
                index + 1,
                files.len(),
                utils::extract_filename_lossy(path)
            );
        }

        match process_single_file(path, config) {
            Ok(metadata) => {
                stats.inc_processed();
                records.push(ProcessedFile {
                    path: path.clone(),
                    metadata,
                });
                if config.verbose {
                    println!("   [OK] 处理成功 / Processing succeeded");
                }
            }
            Err(e) => {
                report_failure(index, files.len(), path, &e, config.verbose);
                let failed = FailedFile::new(path.clone(), &e);
                stats.inc_failed(failed.category, utils::extract_filename_lossy(path));
                failures.push(failed);
            }
        }
    }

    BatchOutcome {
        records,
        failures,
        stats: stats.snapshot(),
    }
}
