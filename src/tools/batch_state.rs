//! 批处理状态管理模块
//!
//! 提供统一的批处理统计管理，支持串行和并行两种模式，
//! 以及批处理结果（成功记录 + 失败清单）的容器。

use crate::core::WavMetadata;
use crate::error::{AppError, ErrorCategory};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// 批处理统计快照
///
/// 包含处理成功/失败计数和错误分类统计
#[derive(Debug, Clone, Default)]
pub struct BatchStatsSnapshot {
    /// 成功处理的文件数
    pub processed: usize,
    /// 失败的文件数
    pub failed: usize,
    /// 错误分类统计（错误类型 -> 失败文件列表）
    pub error_stats: HashMap<ErrorCategory, Vec<String>>,
}

impl BatchStatsSnapshot {
    /// 总文件数
    pub fn total(&self) -> usize {
        self.processed + self.failed
    }

    /// 按类别排序的错误统计（输出稳定）
    pub fn sorted_error_stats(&self) -> Vec<(ErrorCategory, &[String])> {
        let mut entries: Vec<_> = self
            .error_stats
            .iter()
            .map(|(category, files)| (*category, files.as_slice()))
            .collect();
        entries.sort_by_key(|(category, _)| *category);
        entries
    }
}

/// 串行批处理统计（单线程安全）
#[derive(Debug, Default)]
pub struct SerialBatchStats {
    processed: usize,
    failed: usize,
    error_stats: HashMap<ErrorCategory, Vec<String>>,
}

impl SerialBatchStats {
    /// 创建新的串行统计实例
    pub fn new() -> Self {
        Self::default()
    }

    /// 增加成功处理计数
    #[inline]
    pub fn inc_processed(&mut self) -> usize {
        self.processed += 1;
        self.processed
    }

    /// 增加失败计数并记录错误分类
    #[inline]
    pub fn inc_failed(&mut self, category: ErrorCategory, filename: String) -> usize {
        self.failed += 1;
        self.error_stats.entry(category).or_default().push(filename);
        self.failed
    }

    /// 获取统计快照
    pub fn snapshot(&self) -> BatchStatsSnapshot {
        BatchStatsSnapshot {
            processed: self.processed,
            failed: self.failed,
            error_stats: self.error_stats.clone(),
        }
    }
}

/// 并行批处理统计（多线程安全）
///
/// 使用原子类型和锁，适用于多线程并行处理场景
#[derive(Debug, Clone)]
pub struct ParallelBatchStats {
    processed: Arc<AtomicUsize>,
    failed: Arc<AtomicUsize>,
    error_stats: Arc<Mutex<HashMap<ErrorCategory, Vec<String>>>>,
}

impl ParallelBatchStats {
    /// 创建新的并行统计实例
    pub fn new() -> Self {
        Self {
            processed: Arc::new(AtomicUsize::new(0)),
            failed: Arc::new(AtomicUsize::new(0)),
            error_stats: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// 增加成功处理计数（线程安全）
    #[inline]
    pub fn inc_processed(&self) -> usize {
        self.processed.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// 增加失败计数并记录错误分类（线程安全）
    pub fn inc_failed(&self, category: ErrorCategory, filename: String) -> usize {
        let count = self.failed.fetch_add(1, Ordering::Relaxed) + 1;

        if let Ok(mut stats) = self.error_stats.lock() {
            stats.entry(category).or_default().push(filename);
        }

        count
    }

    /// 获取统计快照（线程安全）
    ///
    /// 并行完成顺序不确定，快照中的文件列表按名称排序。
    pub fn snapshot(&self) -> BatchStatsSnapshot {
        let mut error_stats = self
            .error_stats
            .lock()
            .map(|stats| stats.clone())
            .unwrap_or_default();
        for files in error_stats.values_mut() {
            files.sort();
        }

        BatchStatsSnapshot {
            processed: self.processed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            error_stats,
        }
    }
}

impl Default for ParallelBatchStats {
    fn default() -> Self {
        Self::new()
    }
}

/// 成功处理的文件
#[derive(Debug, Clone)]
pub struct ProcessedFile {
    pub path: PathBuf,
    pub metadata: WavMetadata,
}

/// 处理失败的文件（写入跳过日志）
#[derive(Debug, Clone)]
pub struct FailedFile {
    pub path: PathBuf,
    pub category: ErrorCategory,
    pub reason: String,
}

impl FailedFile {
    pub fn new(path: PathBuf, error: &AppError) -> Self {
        Self {
            path,
            category: ErrorCategory::from_app_error(error),
            reason: error.to_string(),
        }
    }
}

/// 一次批处理的完整结果（按输入顺序）
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub records: Vec<ProcessedFile>,
    pub failures: Vec<FailedFile>,
    pub stats: BatchStatsSnapshot,
}

impl BatchOutcome {
    /// 成功记录的元数据（按输入顺序）
    pub fn metadata(&self) -> Vec<WavMetadata> {
        self.records.iter().map(|r| r.metadata.clone()).collect()
    }
}
