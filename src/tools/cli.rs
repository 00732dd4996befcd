//! 命令行接口模块
//!
//! 负责命令行参数解析、配置管理和程序信息展示。

use super::constants::{defaults, parallel_limits};
use crate::core::FrameRate;
use clap::{Arg, ArgMatches, Command};
use std::ffi::OsString;
use std::path::PathBuf;
use std::str::FromStr;

/// 应用程序版本信息
const VERSION: &str = env!("CARGO_PKG_VERSION");
const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// 输出格式选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// 单个ALE文件
    #[default]
    Ale,
    /// 每文件一个AAF-XML
    Xml,
    /// JSON数组报告
    Json,
    /// 全部三种
    All,
}

impl OutputFormat {
    pub fn includes_ale(self) -> bool {
        matches!(self, Self::Ale | Self::All)
    }

    pub fn includes_xml(self) -> bool {
        matches!(self, Self::Xml | Self::All)
    }

    pub fn includes_json(self) -> bool {
        matches!(self, Self::Json | Self::All)
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ale" => Ok(Self::Ale),
            "xml" | "aaf" => Ok(Self::Xml),
            "json" => Ok(Self::Json),
            "all" => Ok(Self::All),
            other => Err(format!(
                "不支持的输出格式 / unsupported format: {other}（ale, xml, json, all）"
            )),
        }
    }
}

/// 应用程序配置
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// 输入文件路径（单文件模式）或扫描目录（批量模式）
    pub input_path: PathBuf,

    /// 输出路径（可选，未指定时根据输入自动生成）
    pub output_path: Option<PathBuf>,

    /// 输出格式
    pub format: OutputFormat,

    /// 时间码帧率
    pub frame_rate: FrameRate,

    /// UCS分类表CSV（可选）
    pub ucs_path: Option<PathBuf>,

    /// 是否递归扫描子目录
    pub recursive: bool,

    /// 多文件并行度（None表示串行）
    pub parallel_files: Option<usize>,

    /// 是否显示详细信息
    pub verbose: bool,
}

impl AppConfig {
    /// 智能判断是否为批量模式（基于路径类型）
    #[inline]
    pub fn is_batch_mode(&self) -> bool {
        self.input_path.is_dir()
    }

    /// 以默认选项处理给定输入
    pub fn for_input(input_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: None,
            format: OutputFormat::default(),
            frame_rate: FrameRate::default(),
            ucs_path: None,
            recursive: true,
            parallel_files: Some(defaults::PARALLEL_FILES_DEGREE),
            verbose: false,
        }
    }
}

fn parse_parallel_degree(s: &str) -> Result<usize, String> {
    let degree: usize = s
        .parse()
        .map_err(|_| format!("无效的并发度 / invalid degree: {s}"))?;
    if !(parallel_limits::MIN_PARALLEL_DEGREE..=parallel_limits::MAX_PARALLEL_DEGREE)
        .contains(&degree)
    {
        return Err(format!(
            "并发度必须在 {}-{} 之间 / degree must be within {}-{}",
            parallel_limits::MIN_PARALLEL_DEGREE,
            parallel_limits::MAX_PARALLEL_DEGREE,
            parallel_limits::MIN_PARALLEL_DEGREE,
            parallel_limits::MAX_PARALLEL_DEGREE
        ));
    }
    Ok(degree)
}

/// 构建命令行定义
pub fn build_command() -> Command {
    Command::new("wavmeta")
        .version(VERSION)
        .about(DESCRIPTION)
        .arg(
            Arg::new("INPUT")
                .help("WAV文件或目录路径。如果不指定，将扫描可执行文件所在目录")
                .required(false)
                .index(1),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .help("输出路径（ALE/JSON文件，或仅导出XML时的目录）")
                .value_name("PATH"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .help("输出格式: ale, xml, json, all")
                .value_name("FORMAT")
                .default_value("ale")
                .value_parser(|s: &str| s.parse::<OutputFormat>()),
        )
        .arg(
            Arg::new("fps")
                .long("fps")
                .help("时间码帧率（整数，非丢帧）")
                .value_name("FPS")
                .default_value(defaults::FRAME_RATE.to_string())
                .value_parser(|s: &str| s.parse::<FrameRate>()),
        )
        .arg(
            Arg::new("ucs")
                .long("ucs")
                .help("UCS分类表CSV（CatID, Category, SubCategory）")
                .value_name("CSV"),
        )
        .arg(
            Arg::new("no-recursive")
                .long("no-recursive")
                .help("只扫描顶层目录")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("parallel-files")
                .long("parallel-files")
                .help("多文件并行度")
                .value_name("N")
                .default_value(defaults::PARALLEL_FILES_DEGREE.to_string())
                .value_parser(parse_parallel_degree),
        )
        .arg(
            Arg::new("serial")
                .long("serial")
                .help("禁用多文件并行，逐个处理")
                .action(clap::ArgAction::SetTrue)
                .conflicts_with("parallel-files"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("显示详细处理信息")
                .action(clap::ArgAction::SetTrue),
        )
}

fn config_from_matches(matches: &ArgMatches) -> AppConfig {
    // 确定输入路径（智能路径处理）
    let input_path = match matches.get_one::<String>("INPUT") {
        Some(input) => PathBuf::from(input),
        None => {
            // 双击启动模式：使用可执行文件所在目录
            let exe_path = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("."));
            super::utils::get_parent_dir(&exe_path).to_path_buf()
        }
    };

    let parallel_files = if matches.get_flag("serial") {
        None
    } else {
        matches.get_one::<usize>("parallel-files").copied()
    };

    AppConfig {
        input_path,
        output_path: matches.get_one::<String>("output").map(PathBuf::from),
        format: matches
            .get_one::<OutputFormat>("format")
            .copied()
            .unwrap_or_default(),
        frame_rate: matches
            .get_one::<FrameRate>("fps")
            .copied()
            .unwrap_or_default(),
        ucs_path: matches.get_one::<String>("ucs").map(PathBuf::from),
        recursive: !matches.get_flag("no-recursive"),
        parallel_files,
        verbose: matches.get_flag("verbose"),
    }
}

/// 解析命令行参数并创建配置
pub fn parse_args() -> AppConfig {
    config_from_matches(&build_command().get_matches())
}

/// 从给定参数解析（第一个参数为程序名）
pub fn parse_args_from<I, T>(args: I) -> Result<AppConfig, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = build_command().try_get_matches_from(args)?;
    Ok(config_from_matches(&matches))
}

/// 显示程序启动信息
pub fn show_startup_info(config: &AppConfig) {
    println!("wavmeta v{VERSION}");
    if config.verbose {
        println!("[INFO] {DESCRIPTION}");
        println!(
            "[INFO] 帧率 / Frame rate: {} fps, 格式 / Format: {:?}",
            config.frame_rate, config.format
        );
    }
    println!();
}

/// 显示程序完成信息
pub fn show_completion_info(config: &AppConfig) {
    if config.verbose {
        println!("[OK] 所有任务处理完成 / All tasks completed");
    }
}
