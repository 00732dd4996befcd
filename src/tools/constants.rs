//! 常量和默认配置集中管理
//!
//! 将所有重要常量集中定义，避免"默认值漂移"和重复定义

/// 默认配置值
pub mod defaults {
    /// 默认帧率
    ///
    /// 与核心的 `DEFAULT_FPS` 保持一致（25fps，PAL / EBU）
    pub const FRAME_RATE: u32 = crate::core::DEFAULT_FPS;

    /// 默认多文件并行并发度
    ///
    /// 解析是内存中的纯计算，瓶颈通常在读文件，
    /// 4并发度在多数场景下提供良好的性能/资源平衡
    pub const PARALLEL_FILES_DEGREE: usize = 4;

    /// 日志级别环境变量
    pub const LOG_ENV: &str = "WAVMETA_LOG";
}

/// 并发度限制常量
pub mod parallel_limits {
    /// 最小并发度
    pub const MIN_PARALLEL_DEGREE: usize = 1;

    /// 最大并发度
    ///
    /// 限制最大并发度为16，避免一次性读入过多文件导致内存占用过高
    pub const MAX_PARALLEL_DEGREE: usize = 16;
}

/// 扫描相关常量
pub mod scan {
    /// 支持的文件扩展名（小写比较）
    pub const SUPPORTED_EXTENSIONS: &[&str] = &["wav", "wave"];
}

/// 输出文件命名
pub mod output {
    /// ALE文件扩展名
    pub const ALE_EXTENSION: &str = "ale";

    /// JSON报告扩展名
    pub const JSON_EXTENSION: &str = "json";

    /// 跳过日志扩展名（追加在输出文件名之后）
    pub const SKIP_LOG_EXTENSION: &str = "skip.log";

    /// 默认的AAF-XML输出目录名
    pub const XML_DIR_NAME: &str = "aaf_output";
}
