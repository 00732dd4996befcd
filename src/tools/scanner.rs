//! 文件扫描模块
//!
//! 负责扫描目录中的WAV文件，以及根据输入推导各输出文件的路径。

use super::cli::{AppConfig, OutputFormat};
use super::constants::{output, scan};
use super::utils;
use crate::error::{AppError, AppResult};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 扩展名是否为 `.wav` / `.wave`（不区分大小写）
pub fn is_wav_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            scan::SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
}

/// 扫描目录中的WAV文件（结果按路径排序）
pub fn scan_wav_files(dir_path: &Path, recursive: bool) -> AppResult<Vec<PathBuf>> {
    if !dir_path.exists() {
        return Err(AppError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("目录不存在: {}", dir_path.display()),
        )));
    }

    if !dir_path.is_dir() {
        return Err(AppError::InvalidInput(format!(
            "路径不是目录: {}",
            dir_path.display()
        )));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut wav_files = Vec::new();

    for entry in WalkDir::new(dir_path).max_depth(max_depth) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                // 单个子目录不可读不影响其余文件
                log::warn!("跳过不可访问的路径 / skipping unreadable entry: {e}");
                continue;
            }
        };

        if entry.file_type().is_file() && is_wav_path(entry.path()) {
            wav_files.push(entry.into_path());
        }
    }

    wav_files.sort();
    Ok(wav_files)
}

/// 显示文件扫描结果
pub fn show_scan_results(config: &AppConfig, wav_files: &[PathBuf]) {
    if wav_files.is_empty() {
        println!(
            "[WARNING] 在目录 {} 中没有找到WAV文件 / No WAV files found",
            config.input_path.display()
        );
        return;
    }

    println!("[INFO] 扫描目录 / Scanning: {}", config.input_path.display());
    println!("[INFO] 找到 {} 个WAV文件 / Found {} WAV files", wav_files.len(), wav_files.len());

    if config.verbose {
        for (i, file) in wav_files.iter().enumerate() {
            println!("   {}. {}", i + 1, utils::extract_filename_lossy(file));
        }
    }
    println!();
}

/// 输入所在目录（目录输入即自身，文件输入为其父目录）
pub fn input_dir(config: &AppConfig) -> PathBuf {
    if config.input_path.is_dir() {
        config.input_path.clone()
    } else {
        utils::get_parent_dir(&config.input_path).to_path_buf()
    }
}

/// 默认输出基名：目录名，或单文件的stem
fn default_base_name(config: &AppConfig) -> String {
    if config.input_path.is_dir() {
        let resolved = config
            .input_path
            .canonicalize()
            .unwrap_or_else(|_| config.input_path.clone());
        let name = utils::extract_filename_lossy(&resolved);
        if name.is_empty() {
            "wavmeta".to_string()
        } else {
            name
        }
    } else {
        utils::extract_file_stem_string(&config.input_path)
    }
}

fn default_output_file(config: &AppConfig, extension: &str) -> PathBuf {
    input_dir(config).join(format!("{}.{extension}", default_base_name(config)))
}

/// ALE输出路径
pub fn ale_output_path(config: &AppConfig) -> PathBuf {
    match &config.output_path {
        Some(path) if config.format == OutputFormat::Ale => path.clone(),
        Some(path) => path.with_extension(output::ALE_EXTENSION),
        None => default_output_file(config, output::ALE_EXTENSION),
    }
}

/// JSON报告输出路径
pub fn json_output_path(config: &AppConfig) -> PathBuf {
    match &config.output_path {
        Some(path) if config.format == OutputFormat::Json => path.clone(),
        Some(path) => path.with_extension(output::JSON_EXTENSION),
        None => default_output_file(config, output::JSON_EXTENSION),
    }
}

/// AAF-XML输出目录
pub fn xml_output_dir(config: &AppConfig) -> PathBuf {
    match &config.output_path {
        Some(path) if config.format == OutputFormat::Xml => path.clone(),
        Some(path) => utils::get_parent_dir(path).join(output::XML_DIR_NAME),
        None => input_dir(config).join(output::XML_DIR_NAME),
    }
}

/// 跳过日志路径：主输出文件名后追加 `.skip.log`
pub fn skip_log_path(config: &AppConfig) -> PathBuf {
    let primary = if config.format.includes_ale() {
        ale_output_path(config)
    } else if config.format.includes_json() {
        json_output_path(config)
    } else {
        xml_output_dir(config)
    };

    let mut name: OsString = primary.into_os_string();
    name.push(".");
    name.push(output::SKIP_LOG_EXTENSION);
    PathBuf::from(name)
}
