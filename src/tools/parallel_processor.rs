//! 多文件并行处理模块
//!
//! 使用rayon实现文件级并行处理，保证输出顺序一致性

use super::batch_state::{BatchOutcome, FailedFile, ParallelBatchStats, ProcessedFile};
use super::cli::AppConfig;
use super::processor::extract_metadata;
use super::utils;
use crate::core::WavMetadata;
use crate::error::{AppError, AppResult};
use rayon::prelude::*;
use std::io::Write;
use std::path::PathBuf;

/// 有序结果容器（保证输出顺序）
struct OrderedResult {
    /// 原始文件索引（用于排序）
    index: usize,

    /// 文件路径
    file_path: PathBuf,

    /// 处理结果
    result: AppResult<WavMetadata>,
}

/// 多文件并行处理
///
/// - 使用rayon线程池精确控制并发度
/// - 线程安全的统计信息收集
/// - 索引排序保证输出顺序与串行一致
///
/// 只有线程池创建失败才返回错误，单个文件的失败记录在结果中。
pub fn process_batch_parallel(
    files: &[PathBuf],
    config: &AppConfig,
    parallel_degree: usize,
) -> AppResult<BatchOutcome> {
    println!("[INFO] 启用多文件并行处理：{parallel_degree} 并发度 / Parallel processing enabled");

    let stats = ParallelBatchStats::new();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(parallel_degree)
        .thread_name(|i| format!("wavmeta-worker-{i}"))
        .build()
        .map_err(|e| AppError::ResourceError(format!("线程池创建失败: {e}")))?;

    let results: Vec<OrderedResult> = pool.install(|| {
        files
            .par_iter()
            .enumerate()
            .map(|(index, file_path)| {
                // 简短进度提示（避免verbose混乱）
                if !config.verbose {
                    print!(".");
                    std::io::stdout().flush().ok();
                }

                let result = extract_metadata(file_path, config.frame_rate);

                match &result {
                    Ok(_) => {
                        let count = stats.inc_processed();
                        if config.verbose {
                            println!(
                                "[OK] [{}/{}] {}",
                                count,
                                files.len(),
                                utils::extract_filename_lossy(file_path)
                            );
                        }
                    }
                    Err(e) => {
                        let failed = FailedFile::new(file_path.clone(), e);
                        let filename = utils::extract_filename_lossy(file_path);
                        let count = stats.inc_failed(failed.category, filename.clone());
                        if config.verbose {
                            println!("[FAIL] [{}/{}] {} - {}", count, files.len(), filename, e);
                        }
                    }
                }

                OrderedResult {
                    index,
                    file_path: file_path.clone(),
                    result,
                }
            })
            .collect()
    });

    if !config.verbose {
        println!(); // 进度点换行
    }

    // 按原始顺序排序结果
    let mut sorted_results = results;
    sorted_results.sort_by_key(|r| r.index);

    let mut records = Vec::with_capacity(sorted_results.len());
    let mut failures = Vec::new();
    for ordered in sorted_results {
        match ordered.result {
            Ok(metadata) => records.push(ProcessedFile {
                path: ordered.file_path,
                metadata,
            }),
            Err(e) => failures.push(FailedFile::new(ordered.file_path, &e)),
        }
    }

    Ok(BatchOutcome {
        records,
        failures,
        stats: stats.snapshot(),
    })
}
