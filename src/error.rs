//! 统一错误处理框架
//!
//! 两层错误类型：
//! - [`FormatError`]：二进制解析核心的错误（只描述原因，不含文件信息）
//! - [`AppError`]：工具层错误，负责把失败原因与具体文件关联起来，
//!   使批处理可以记录失败并继续处理下一个文件。

use serde::Serialize;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// 必需chunk的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChunkKind {
    /// `fmt ` chunk
    Format,
    /// `data` chunk
    Data,
}

impl ChunkKind {
    /// RIFF中的4字节标识
    pub fn fourcc(&self) -> &'static str {
        match self {
            ChunkKind::Format => "fmt ",
            ChunkKind::Data => "data",
        }
    }
}

impl fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.fourcc())
    }
}

/// 二进制解析错误（核心层）
///
/// 均为文件级致命错误，`TruncatedBextChunk` 除外：
/// 聚合器会把它降级为 [`ParseWarning::BextDegraded`](crate::core::ParseWarning::BextDegraded)。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// 缺少有效的 RIFF/WAVE 头
    NotRiffWave,

    /// `fmt ` 负载不足16字节
    TruncatedFmtChunk { len: usize },

    /// `bext` 负载不足348字节（UMID之前的必需部分）
    TruncatedBextChunk { len: usize },

    /// 缺少 `fmt ` 或 `data` chunk
    MissingRequiredChunk(ChunkKind),

    /// 格式字段自相矛盾，无法计算时长（例如 byte_rate 为0）
    InvalidFormat(String),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::NotRiffWave => write!(f, "不是有效的RIFF/WAVE文件 / not a RIFF/WAVE file"),
            FormatError::TruncatedFmtChunk { len } => write!(
                f,
                "fmt chunk被截断: {len}字节（至少16字节） / truncated fmt chunk: {len} bytes"
            ),
            FormatError::TruncatedBextChunk { len } => write!(
                f,
                "bext chunk被截断: {len}字节（至少348字节） / truncated bext chunk: {len} bytes"
            ),
            FormatError::MissingRequiredChunk(kind) => {
                write!(f, "缺少必需的chunk {kind} / missing required chunk {kind}")
            }
            FormatError::InvalidFormat(msg) => write!(f, "无效的音频格式: {msg}"),
        }
    }
}

impl std::error::Error for FormatError {}

/// 解析核心的标准Result类型
pub type FormatResult<T> = Result<T, FormatError>;

/// 工具层统一错误类型
#[derive(Debug)]
pub enum AppError {
    /// 输入验证错误（参数、路径类型等）
    InvalidInput(String),

    /// 文件I/O错误
    IoError(io::Error),

    /// 单个文件解析失败（带文件路径）
    Format { file: PathBuf, source: FormatError },

    /// 输出生成/写入错误（ALE、XML、JSON）
    OutputError(String),

    /// 资源访问错误（线程池等）
    ResourceError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidInput(msg) => write!(f, "输入验证失败: {msg}"),
            AppError::IoError(err) => write!(f, "文件I/O错误: {err}"),
            AppError::Format { file, source } => {
                write!(f, "{}: {source}", file.display())
            }
            AppError::OutputError(msg) => write!(f, "输出生成失败: {msg}"),
            AppError::ResourceError(msg) => write!(f, "资源访问错误: {msg}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::IoError(err) => Some(err),
            AppError::Format { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::IoError(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::OutputError(format!("JSON序列化失败: {err}"))
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::InvalidInput(format!("UCS分类表读取失败: {err}"))
    }
}

impl AppError {
    /// 将核心解析错误与文件路径关联
    pub fn format(file: impl Into<PathBuf>, source: FormatError) -> Self {
        AppError::Format {
            file: file.into(),
            source,
        }
    }
}

/// 工具层操作的标准Result类型
pub type AppResult<T> = Result<T, AppError>;

// ==================== 错误转换Helper函数 ====================

/// 创建输出错误的helper函数
#[inline]
pub fn output_error<E: fmt::Display>(context: &str, err: E) -> AppError {
    AppError::OutputError(format!("{context}: {err}"))
}

// ==================== 错误分类系统 ====================
// 用于批量处理中的错误统计和退出码选择

/// 错误类别枚举（用于批量处理统计）
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub enum ErrorCategory {
    /// 格式相关错误（非RIFF/WAVE、缺少chunk、格式损坏）
    Format,
    /// I/O相关错误（文件不存在、权限不足等）
    Io,
    /// 输出相关错误（写出ALE/XML/JSON失败）
    Output,
    /// 其他未分类错误
    Other,
}

impl ErrorCategory {
    /// 从AppError提取错误类别
    pub fn from_app_error(e: &AppError) -> Self {
        match e {
            AppError::Format { .. } => Self::Format,
            AppError::IoError(_) => Self::Io,
            AppError::OutputError(_) => Self::Output,
            AppError::InvalidInput(_) | AppError::ResourceError(_) => Self::Other,
        }
    }

    /// 获取错误类别的显示名称
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Format => "格式错误",
            Self::Io => "I/O错误",
            Self::Output => "输出错误",
            Self::Other => "其他错误",
        }
    }
}
