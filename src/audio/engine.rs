//! 外部解码引擎接口
//!
//! 会话只通过 [`FrameDecoder`] 这一窄接口与解码引擎交互：
//! 打开（构造）、配置、初始化、逐帧解码、关闭（`Drop`）。
//!
//! # 输出有效期
//!
//! `decode_frame` 返回的 [`DecodedFrame`] 借用引擎内部的样本缓冲区，
//! 由于接口以 `&mut self` 调用，下一次 `decode_frame` 之前该结果必然已经失效，
//! 借用检查器保证调用方无法持有过期样本。

use crate::error::{self, AudioResult};

/// AAC 解码器要求的每声道最小输入字节数
pub const MIN_STREAM_SIZE: usize = 768;

/// 会话支持的最大声道数
pub const MAX_CHANNELS: usize = 6;

/// 输出样本格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub enum OutputFormat {
    /// 16位有符号整数（参考配置）
    #[default]
    Pcm16,
    /// 32位有符号整数
    Pcm32,
    /// 32位浮点
    Float32,
}

impl OutputFormat {
    /// 每个样本占用的字节数
    #[inline]
    pub fn bytes_per_sample(self) -> usize {
        match self {
            OutputFormat::Pcm16 => 2,
            OutputFormat::Pcm32 | OutputFormat::Float32 => 4,
        }
    }

    #[inline]
    pub fn bits_per_sample(self) -> u16 {
        (self.bytes_per_sample() * 8) as u16
    }

    pub fn is_float(self) -> bool {
        matches!(self, OutputFormat::Float32)
    }

    /// 解析命令行取值：`16`、`32`、`float`
    pub fn parse(value: &str) -> AudioResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "16" | "s16" | "pcm16" => Ok(OutputFormat::Pcm16),
            "32" | "s32" | "pcm32" => Ok(OutputFormat::Pcm32),
            "float" | "f32" => Ok(OutputFormat::Float32),
            other => Err(error::format_error(
                "不支持的输出格式 / unsupported output format",
                other,
            )),
        }
    }
}

/// AAC 对象类型提示
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ObjectType {
    Main,
    Lc,
    Ssr,
    Ltp,
}

impl ObjectType {
    /// MPEG-4 Audio Object Type 编号
    #[inline]
    pub fn audio_object_type(self) -> u8 {
        match self {
            ObjectType::Main => 1,
            ObjectType::Lc => 2,
            ObjectType::Ssr => 3,
            ObjectType::Ltp => 4,
        }
    }

    /// 由 ADTS profile 字段（0..=3）换算
    pub fn from_adts_profile(profile: u8) -> Self {
        match profile & 0x03 {
            0 => ObjectType::Main,
            1 => ObjectType::Lc,
            2 => ObjectType::Ssr,
            _ => ObjectType::Ltp,
        }
    }

    pub fn parse(value: &str) -> AudioResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "main" => Ok(ObjectType::Main),
            "lc" => Ok(ObjectType::Lc),
            "ssr" => Ok(ObjectType::Ssr),
            "ltp" => Ok(ObjectType::Ltp),
            other => Err(error::format_error(
                "未知的对象类型 / unknown object type",
                other,
            )),
        }
    }
}

/// 引擎配置
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct EngineConfig {
    /// 流头无法给出采样率时使用的默认采样率
    pub default_sample_rate: Option<u32>,
    pub output_format: OutputFormat,
    /// 覆盖流头中的对象类型
    pub object_type_hint: Option<ObjectType>,
    /// 多于2声道时下混为立体声
    pub downmix: bool,
    /// 旧式 ADTS 帧头（固定头含2位 emphasis）
    pub legacy_framing: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_sample_rate: None,
            output_format: OutputFormat::Pcm16,
            object_type_hint: None,
            downmix: false,
            legacy_framing: false,
        }
    }
}

/// 初始化探测得到的流信息
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct StreamInfo {
    pub sample_rate: u32,
    /// 输出声道数（已考虑下混）
    pub channels: u16,
}

/// 声道位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelPosition {
    Unknown,
    FrontCenter,
    FrontLeft,
    FrontRight,
    SideLeft,
    SideRight,
    BackLeft,
    BackRight,
    BackCenter,
    Lfe,
}

impl ChannelPosition {
    /// 由数值编码换算，无法识别的编码一律视为 `Unknown`
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => ChannelPosition::FrontCenter,
            2 => ChannelPosition::FrontLeft,
            3 => ChannelPosition::FrontRight,
            4 => ChannelPosition::SideLeft,
            5 => ChannelPosition::SideRight,
            6 => ChannelPosition::BackLeft,
            7 => ChannelPosition::BackRight,
            8 => ChannelPosition::BackCenter,
            9 => ChannelPosition::Lfe,
            _ => ChannelPosition::Unknown,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            ChannelPosition::Unknown => 0,
            ChannelPosition::FrontCenter => 1,
            ChannelPosition::FrontLeft => 2,
            ChannelPosition::FrontRight => 3,
            ChannelPosition::SideLeft => 4,
            ChannelPosition::SideRight => 5,
            ChannelPosition::BackLeft => 6,
            ChannelPosition::BackRight => 7,
            ChannelPosition::BackCenter => 8,
            ChannelPosition::Lfe => 9,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ChannelPosition::Unknown => "Unknown",
            ChannelPosition::FrontCenter => "Center front",
            ChannelPosition::FrontLeft => "Left front",
            ChannelPosition::FrontRight => "Right front",
            ChannelPosition::SideLeft => "Left side",
            ChannelPosition::SideRight => "Right side",
            ChannelPosition::BackLeft => "Left back",
            ChannelPosition::BackRight => "Right back",
            ChannelPosition::BackCenter => "Center back",
            ChannelPosition::Lfe => "LFE",
        }
    }
}

/// 每帧的声道信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelInfo {
    pub positions: Vec<ChannelPosition>,
    pub lfe_channels: usize,
}

impl ChannelInfo {
    pub fn new(positions: Vec<ChannelPosition>) -> Self {
        let lfe_channels = positions
            .iter()
            .filter(|p| **p == ChannelPosition::Lfe)
            .count();
        Self {
            positions,
            lfe_channels,
        }
    }

    #[inline]
    pub fn channel_count(&self) -> usize {
        self.positions.len()
    }
}

/// 帧级硬错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameError {
    pub message: String,
}

impl FrameError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// 一次 `decode_frame` 的结果
///
/// `pcm` 借用引擎内部缓冲区，只在下一次 `decode_frame` 调用之前有效。
#[derive(Debug)]
pub struct DecodedFrame<'a> {
    pub error: Option<FrameError>,
    /// 交错样本总数（所有声道合计）
    pub sample_count: usize,
    /// 本次从输入视图中消费的字节数
    pub bytes_consumed: usize,
    pub channels: ChannelInfo,
    pub pcm: &'a [u8],
}

impl<'a> DecodedFrame<'a> {
    /// 需要更多输入：未消费、无样本、无错误
    pub fn need_more_data() -> Self {
        Self::skipped(0)
    }

    /// 跳过若干字节（如重新同步时丢弃的垃圾数据），不产生样本
    pub fn skipped(bytes_consumed: usize) -> Self {
        Self {
            error: None,
            sample_count: 0,
            bytes_consumed,
            channels: ChannelInfo::default(),
            pcm: &[],
        }
    }

    /// 硬错误
    pub fn failed(bytes_consumed: usize, error: FrameError) -> Self {
        Self {
            error: Some(error),
            sample_count: 0,
            bytes_consumed,
            channels: ChannelInfo::default(),
            pcm: &[],
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// 外部解码引擎能力
pub trait FrameDecoder {
    /// 引擎名称（用于诊断）
    fn name(&self) -> &'static str;

    /// 应用配置；必须在 `initialize` 之前调用
    fn configure(&mut self, config: &EngineConfig) -> AudioResult<()>;

    /// 用探测字节初始化，返回流的采样率和输出声道数
    fn initialize(&mut self, probe: &[u8]) -> AudioResult<StreamInfo>;

    /// 解码输入视图开头的一帧
    fn decode_frame(&mut self, input: &[u8]) -> DecodedFrame<'_>;

    /// 当前输出样本格式
    fn output_format(&self) -> OutputFormat;

    /// 每声道最小输入字节数
    fn min_stream_size(&self) -> usize {
        MIN_STREAM_SIZE
    }
}
