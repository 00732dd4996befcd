//! 时长与时间码计算
//!
//! 时长 = data字节数 / byte_rate。时间码为非丢帧 `HH:MM:SS:FF`，
//! 小时不回绕（表示经过时长而非时钟时间）。
//!
//! 整秒与帧号都用整数运算得到，帧号恒为向下取整，
//! 因此 `byte_rate * k` 字节恰好是 `k` 秒，且帧号不会进位到下一秒。

use crate::error::{FormatError, FormatResult};
use crate::wav::AudioFormat;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 默认帧率（25fps，PAL / EBU 约定）
pub const DEFAULT_FPS: u32 = 25;

/// 支持的最大帧率
///
/// 帧号固定两位，超过99fps时 `FF` 会变成三位，时间码字符串不再按字典序单调。
pub const MAX_FPS: u32 = 99;

/// 调用方指定的整数帧率（非丢帧）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FrameRate(u32);

impl FrameRate {
    /// 创建帧率，范围 1..=99
    pub fn new(fps: u32) -> FormatResult<Self> {
        if fps == 0 || fps > MAX_FPS {
            return Err(FormatError::InvalidFormat(format!(
                "帧率超出范围: {fps}（1-{MAX_FPS}）"
            )));
        }
        Ok(Self(fps))
    }

    /// 每秒帧数
    pub fn fps(&self) -> u32 {
        self.0
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self(DEFAULT_FPS)
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FrameRate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fps: u32 = s
            .trim()
            .parse()
            .map_err(|_| format!("无效的帧率: {s} / invalid frame rate"))?;
        FrameRate::new(fps).map_err(|e| e.to_string())
    }
}

/// 非丢帧时间码
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timecode {
    pub hours: u64,
    pub minutes: u8,
    pub seconds: u8,
    pub frames: u32,
}

impl Timecode {
    /// 零时间码 `00:00:00:00`
    pub const ZERO: Timecode = Timecode {
        hours: 0,
        minutes: 0,
        seconds: 0,
        frames: 0,
    };

    /// 由 `numerator / denominator` 秒构造（帧号向下取整）
    ///
    /// `denominator` 必须非0。
    fn from_ratio(numerator: u64, denominator: u64, rate: FrameRate) -> Self {
        let total_seconds = numerator / denominator;
        let remainder = u128::from(numerator % denominator);
        let frames = remainder * u128::from(rate.fps()) / u128::from(denominator);

        Self {
            hours: total_seconds / 3600,
            minutes: ((total_seconds / 60) % 60) as u8,
            seconds: (total_seconds % 60) as u8,
            frames: frames as u32,
        }
    }

    /// 由data字节数和每秒字节数计算
    ///
    /// # 错误
    ///
    /// * `FormatError::InvalidFormat` - byte_rate为0
    pub fn from_bytes(data_size: u64, byte_rate: u32, rate: FrameRate) -> FormatResult<Self> {
        if byte_rate == 0 {
            return Err(FormatError::InvalidFormat(
                "byte_rate为0，无法计算时长".to_string(),
            ));
        }
        Ok(Self::from_ratio(data_size, u64::from(byte_rate), rate))
    }

    /// 由样本位置和采样率计算（用于bext TimeReference）
    ///
    /// # 错误
    ///
    /// * `FormatError::InvalidFormat` - 采样率为0
    pub fn from_samples(samples: u64, sample_rate: u32, rate: FrameRate) -> FormatResult<Self> {
        if sample_rate == 0 {
            return Err(FormatError::InvalidFormat(
                "采样率为0，无法换算时间码".to_string(),
            ));
        }
        Ok(Self::from_ratio(samples, u64::from(sample_rate), rate))
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds, self.frames
        )
    }
}

impl Serialize for Timecode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// 计算时长（秒）
///
/// # 错误
///
/// * `FormatError::InvalidFormat` - byte_rate为0
pub fn duration_seconds(format: &AudioFormat, data_size: u64) -> FormatResult<f64> {
    if format.byte_rate == 0 {
        return Err(FormatError::InvalidFormat(
            "byte_rate为0，无法计算时长".to_string(),
        ));
    }
    Ok(data_size as f64 / f64::from(format.byte_rate))
}

/// 计算时长时间码
pub fn duration_timecode(
    format: &AudioFormat,
    data_size: u64,
    rate: FrameRate,
) -> FormatResult<Timecode> {
    Timecode::from_bytes(data_size, format.byte_rate, rate)
}
