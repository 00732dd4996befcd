//! 工具模块集合
//!
//! 包含CLI、文件扫描、批处理、UCS分类表和输出写出，支持main.rs的流程控制。

pub mod batch_state;
pub mod cli;
pub mod constants;
pub mod formatter;
pub mod parallel_processor;
pub mod processor;
pub mod scanner;
pub mod ucs;
pub mod utils;

// 重新导出主要的公共接口
pub use batch_state::{
    BatchOutcome, BatchStatsSnapshot, FailedFile, ParallelBatchStats, ProcessedFile,
    SerialBatchStats,
};
pub use cli::{AppConfig, OutputFormat, parse_args, show_completion_info, show_startup_info};
pub use formatter::{
    OutputReport, create_summary_table, show_batch_completion_info, to_json, write_outputs,
};
pub use parallel_processor::process_batch_parallel;
pub use processor::{extract_metadata, process_batch_serial, process_single_file};
pub use scanner::{scan_wav_files, show_scan_results};
pub use ucs::UcsTable;
