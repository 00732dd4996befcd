//! 输出格式化模块
//!
//! 负责控制台汇总表、JSON报告、跳过日志，以及按配置写出全部输出文件。

use super::batch_state::{BatchOutcome, BatchStatsSnapshot, FailedFile};
use super::cli::AppConfig;
use super::scanner;
use super::ucs::UcsTable;
use crate::core::WavMetadata;
use crate::error::{AppResult, output_error};
use crate::export;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::UTF8_FULL};
use std::path::{Path, PathBuf};

/// 应用程序版本信息
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 本次运行生成的文件
#[derive(Debug, Clone, Default)]
pub struct OutputReport {
    pub ale: Option<PathBuf>,
    pub json: Option<PathBuf>,
    pub xml_dir: Option<PathBuf>,
    pub xml_files: usize,
    pub skip_log: Option<PathBuf>,
}

/// 控制台汇总表
pub fn create_summary_table(records: &[WavMetadata]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "File / 文件",
        "Rate / 采样率",
        "Ch / 声道",
        "Bits / 位深",
        "Duration / 时长",
        "Start TC / 起始",
        "Description / 描述",
        "Warnings / 警告",
    ]);

    for meta in records {
        table.add_row(vec![
            Cell::new(&meta.file_name),
            Cell::new(meta.sample_rate).set_alignment(CellAlignment::Right),
            Cell::new(meta.channels).set_alignment(CellAlignment::Right),
            Cell::new(meta.bits_per_sample).set_alignment(CellAlignment::Right),
            Cell::new(meta.timecode).set_alignment(CellAlignment::Right),
            Cell::new(
                meta.start_timecode
                    .map(|tc| tc.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(meta.description()),
            Cell::new(meta.warnings.len()).set_alignment(CellAlignment::Right),
        ]);
    }

    table
}

/// JSON报告（记录数组，按输入顺序）
pub fn to_json(records: &[WavMetadata]) -> AppResult<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// 跳过日志内容：每行 `路径<TAB>原因`
pub fn format_skip_log(failures: &[FailedFile]) -> String {
    let mut out = String::new();
    for failed in failures {
        out.push_str(&format!(
            "{}\t[{}] {}\n",
            failed.path.display(),
            failed.category.display_name(),
            failed.reason.replace(['\n', '\r', '\t'], " ")
        ));
    }
    out
}

fn write_file(path: &Path, contents: &str, what: &str) -> AppResult<()> {
    std::fs::write(path, contents)
        .map_err(|e| output_error(&format!("写入{what}失败 {}", path.display()), e))
}

/// 按配置写出全部输出文件
///
/// 有失败文件时额外写出跳过日志；没有成功记录时不生成ALE/JSON/XML。
pub fn write_outputs(
    config: &AppConfig,
    outcome: &BatchOutcome,
    ucs: Option<&UcsTable>,
) -> AppResult<OutputReport> {
    let mut report = OutputReport::default();
    let records = outcome.metadata();

    if !outcome.failures.is_empty() {
        let path = scanner::skip_log_path(config);
        write_file(&path, &format_skip_log(&outcome.failures), "跳过日志")?;
        report.skip_log = Some(path);
    }

    if records.is_empty() {
        return Ok(report);
    }

    if config.format.includes_ale() {
        let path = scanner::ale_output_path(config);
        export::write_ale(&path, &records, ucs)?;
        report.ale = Some(path);
    }

    if config.format.includes_json() {
        let path = scanner::json_output_path(config);
        write_file(&path, &to_json(&records)?, "JSON")?;
        report.json = Some(path);
    }

    if config.format.includes_xml() {
        let dir = scanner::xml_output_dir(config);
        std::fs::create_dir_all(&dir)
            .map_err(|e| output_error(&format!("无法创建目录 {}", dir.display()), e))?;
        let mut names = export::OutputNames::new();
        for record in &outcome.records {
            let file_name = names.claim(&record.metadata);
            export::write_aaf_xml(&dir, &file_name, &record.metadata, &record.path, ucs)?;
            report.xml_files += 1;
        }
        report.xml_dir = Some(dir);
    }

    Ok(report)
}

/// 显示批量处理完成信息
pub fn show_batch_completion_info(
    report: &OutputReport,
    stats: &BatchStatsSnapshot,
    config: &AppConfig,
) {
    println!();
    println!("[INFO] 批量处理完成 / Batch completed");
    println!(
        "   成功处理 / Processed: {} / {} 个文件",
        stats.processed,
        stats.total()
    );
    if stats.failed > 0 {
        println!("   失败文件 / Failed: {} 个", stats.failed);
        for (category, files) in stats.sorted_error_stats() {
            println!("      {}: {}", category.display_name(), files.len());
            if config.verbose {
                for file in files {
                    println!("         - {file}");
                }
            }
        }
    }

    println!();
    println!("[INFO] 生成的文件 / Generated files:");
    if let Some(path) = &report.ale {
        println!("   ALE: {}", path.display());
    }
    if let Some(path) = &report.json {
        println!("   JSON: {}", path.display());
    }
    if let Some(dir) = &report.xml_dir {
        println!("   AAF-XML: {} ({} 个文件)", dir.display(), report.xml_files);
    }
    if let Some(path) = &report.skip_log {
        println!("   跳过日志 / Skip log: {}", path.display());
    }
    if config.verbose {
        println!("   wavmeta v{VERSION}");
    }
}
