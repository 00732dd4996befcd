//! wavmeta - 主程序入口
//!
//! 纯流程控制器，负责协调各个工具模块完成元数据提取与导出。

use log::LevelFilter;
use std::io::Write;
use std::path::PathBuf;
use std::process;
use wavmeta::{
    error::{AppError, ErrorCategory},
    tools::{self, AppConfig, BatchOutcome, UcsTable, constants::defaults},
};

/// 错误退出码定义
mod exit_codes {
    /// 通用错误
    pub const GENERAL_ERROR: i32 = 1;
    /// 格式/输入错误
    pub const FORMAT_ERROR: i32 = 2;
    /// 输出写出失败
    pub const OUTPUT_ERROR: i32 = 3;
    /// 资源/并发错误
    pub const RESOURCE_ERROR: i32 = 5;
}

/// 获取错误建议文本
fn get_error_suggestion(error: &AppError) -> &'static str {
    match error {
        AppError::InvalidInput(_) => {
            "检查命令行参数是否正确，使用 --help 查看完整用法 / Check if command-line arguments are correct, use --help to see full usage"
        }
        AppError::ResourceError(_) => {
            "资源不可用，请检查系统资源或重试；若持续失败请使用 --serial / Resource unavailable, retry or use --serial"
        }
        _ => match ErrorCategory::from_app_error(error) {
            ErrorCategory::Io => {
                "检查文件路径是否正确，文件是否存在且可读 / Check if file path is correct, file exists and is readable"
            }
            ErrorCategory::Format => {
                "确保输入文件为有效的RIFF/WAVE文件（包含fmt和data chunk） / Ensure input is a valid RIFF/WAVE file with fmt and data chunks"
            }
            ErrorCategory::Output => {
                "检查输出目录是否存在且可写 / Check that the output location exists and is writable"
            }
            ErrorCategory::Other => {
                "请检查输入文件和参数设置 / Please check input file and parameter settings"
            }
        },
    }
}

/// 错误处理和建议
fn handle_error(error: AppError) -> ! {
    eprintln!("[ERROR] 错误 / Error: {error}");
    eprintln!("[INFO] 建议 / Suggestion: {}", get_error_suggestion(&error));

    let exit_code = match &error {
        AppError::InvalidInput(_) => exit_codes::FORMAT_ERROR,
        AppError::ResourceError(_) => exit_codes::RESOURCE_ERROR,
        _ => match ErrorCategory::from_app_error(&error) {
            ErrorCategory::Format => exit_codes::FORMAT_ERROR,
            ErrorCategory::Output => exit_codes::OUTPUT_ERROR,
            ErrorCategory::Io | ErrorCategory::Other => exit_codes::GENERAL_ERROR,
        },
    };

    process::exit(exit_code);
}

/// 初始化诊断日志（级别来自 WAVMETA_LOG，默认warn，verbose时为info）
fn init_logging(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    let level = std::env::var(defaults::LOG_ENV)
        .ok()
        .and_then(|v| v.parse::<LevelFilter>().ok())
        .unwrap_or(default_level);

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    builder.format(|buf, record| {
        writeln!(buf, "[{:<5}] {}", record.level(), record.args())
    });

    // 重复初始化只在测试中可能发生，忽略即可
    let _ = builder.try_init();
}

/// 批量处理目录中的WAV文件
fn process_batch_mode(config: &AppConfig) -> Result<BatchOutcome, AppError> {
    let wav_files = tools::scan_wav_files(&config.input_path, config.recursive)?;
    tools::show_scan_results(config, &wav_files);

    if wav_files.is_empty() {
        return Ok(BatchOutcome::default());
    }

    process_files(config, &wav_files)
}

/// 根据parallel_files配置选择处理模式
fn process_files(config: &AppConfig, wav_files: &[PathBuf]) -> Result<BatchOutcome, AppError> {
    match config.parallel_files {
        None => Ok(tools::process_batch_serial(wav_files, config)),
        Some(degree) => {
            let actual_degree =
                tools::utils::effective_parallel_degree(degree, Some(wav_files.len()));

            if actual_degree == 1 {
                if config.verbose {
                    println!("[INFO] 并发度为1，使用串行模式 / Parallelism=1, using serial mode");
                }
                Ok(tools::process_batch_serial(wav_files, config))
            } else {
                // 尝试并行处理，失败则降级串行
                tools::process_batch_parallel(wav_files, config, actual_degree).or_else(|e| {
                    eprintln!("[WARNING] 并行处理失败 / Parallel processing failed: {e}，回退到串行模式 / fallback to serial");
                    Ok(tools::process_batch_serial(wav_files, config))
                })
            }
        }
    }
}

/// 单文件处理模式：解析失败直接作为错误返回
fn process_single_mode(config: &AppConfig) -> Result<BatchOutcome, AppError> {
    let metadata = tools::process_single_file(&config.input_path, config)?;
    let mut stats = tools::SerialBatchStats::new();
    stats.inc_processed();

    Ok(BatchOutcome {
        records: vec![tools::ProcessedFile {
            path: config.input_path.clone(),
            metadata,
        }],
        failures: Vec::new(),
        stats: stats.snapshot(),
    })
}

/// 应用程序主逻辑（便于测试和复用）
fn run() -> Result<(), AppError> {
    // 1. 解析命令行参数
    let config = tools::parse_args();
    init_logging(config.verbose);

    // 2. 显示启动信息
    tools::show_startup_info(&config);

    // 3. 加载UCS分类表（可选）
    let ucs = config
        .ucs_path
        .as_deref()
        .map(UcsTable::load)
        .transpose()?;
    if let Some(table) = &ucs
        && config.verbose
    {
        println!("[INFO] UCS分类表 / UCS table: {} 条 / entries", table.len());
    }

    // 4. 根据模式选择处理方式
    let outcome = if config.is_batch_mode() {
        process_batch_mode(&config)?
    } else {
        process_single_mode(&config)?
    };

    if outcome.stats.total() == 0 {
        return Ok(());
    }

    if config.verbose && !outcome.records.is_empty() {
        println!("{}", tools::create_summary_table(&outcome.metadata()));
    }

    // 5. 写出结果
    let report = tools::write_outputs(&config, &outcome, ucs.as_ref())?;
    tools::show_batch_completion_info(&report, &outcome.stats, &config);
    tools::show_completion_info(&config);

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        handle_error(error);
    }
}
