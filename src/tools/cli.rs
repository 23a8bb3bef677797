//! 命令行接口模块
//!
//! 负责命令行参数解析、配置管理和程序信息展示。

use super::constants::{defaults, exit_codes, limits};
use super::utils;
use crate::audio::engine::{EngineConfig, ObjectType, OutputFormat};
use crate::error::{AudioError, AudioResult};
use clap::error::ErrorKind;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::ffi::OsString;
use std::path::PathBuf;

/// 应用程序版本信息
const VERSION: &str = env!("CARGO_PKG_VERSION");
const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// 应用程序配置
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// 压缩音频输入路径
    pub input_path: PathBuf,

    /// PCM/WAV 输出路径
    pub output_path: PathBuf,

    /// 静默模式：不输出任何诊断和进度信息
    pub quiet: bool,

    /// 是否显示详细信息
    pub verbose: bool,

    /// 输出无头的原始 PCM
    pub raw: bool,

    pub output_format: OutputFormat,

    /// 流头无法提供采样率时的默认值
    pub default_sample_rate: Option<u32>,

    pub object_type: Option<ObjectType>,

    /// 多声道下混为立体声
    pub downmix: bool,

    /// 旧式 ADTS 帧头
    pub legacy_framing: bool,

    /// 每次读取的输入字节数
    pub chunk_size: usize,

    /// 输出缓冲区容量（未指定时为 chunk_size × 10）
    pub output_capacity: Option<usize>,

    /// JSON 统计输出路径
    pub stats_path: Option<PathBuf>,

    /// 帧解码错误时仍以0退出
    pub exit_zero_on_decode_error: bool,
}

impl AppConfig {
    /// 以默认选项构造（测试与库调用使用）
    pub fn new(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            quiet: false,
            verbose: false,
            raw: false,
            output_format: OutputFormat::Pcm16,
            default_sample_rate: None,
            object_type: None,
            downmix: false,
            legacy_framing: false,
            chunk_size: defaults::INPUT_CHUNK_SIZE,
            output_capacity: None,
            stats_path: None,
            exit_zero_on_decode_error: false,
        }
    }

    /// 解码引擎配置
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            default_sample_rate: self.default_sample_rate,
            output_format: self.output_format,
            object_type_hint: self.object_type,
            downmix: self.downmix,
            legacy_framing: self.legacy_framing,
        }
    }

    /// 实际使用的输出缓冲区容量
    #[inline]
    pub fn effective_output_capacity(&self) -> usize {
        self.output_capacity
            .unwrap_or_else(|| self.chunk_size.saturating_mul(defaults::OUTPUT_CAPACITY_FACTOR))
    }

    /// 是否输出原始 PCM（显式开关或 .pcm/.raw 扩展名）
    #[inline]
    pub fn is_raw_output(&self) -> bool {
        self.raw || utils::has_raw_extension(&self.output_path)
    }
}

fn parse_size(value: &str) -> Result<usize, String> {
    let size: usize = value
        .trim()
        .parse()
        .map_err(|_| format!("不是有效的字节数 / not a byte count: {value}"))?;
    if !(limits::MIN_CHUNK_SIZE..=limits::MAX_CHUNK_SIZE).contains(&size) {
        return Err(format!(
            "取值范围 / valid range: {}..={}",
            limits::MIN_CHUNK_SIZE,
            limits::MAX_CHUNK_SIZE
        ));
    }
    Ok(size)
}

fn build_command() -> Command {
    Command::new("aac-stream-decoder")
        .version(VERSION)
        .about(DESCRIPTION)
        .arg(
            Arg::new("OUTPUT")
                .help("PCM/WAV 输出文件 / PCM or WAV output file")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("INPUT")
                .help("AAC (ADTS) 输入文件 / AAC (ADTS) input file")
                .required(true)
                .index(2),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .help("静默模式 / suppress all diagnostics")
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("显示详细处理信息 / verbose output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("raw")
                .long("raw")
                .help("输出无头 PCM / write headerless PCM instead of WAV")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .help("输出样本格式 / output sample format: 16, 32, float")
                .value_name("FORMAT")
                .default_value("16")
                .value_parser(|s: &str| OutputFormat::parse(s).map_err(|e| e.to_string())),
        )
        .arg(
            Arg::new("sample-rate")
                .long("sample-rate")
                .short('s')
                .help("默认采样率 / default sample rate when the header has none")
                .value_name("HZ")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new("object-type")
                .long("object-type")
                .help("对象类型提示 / object type hint: lc, main, ssr, ltp")
                .value_name("TYPE")
                .value_parser(|s: &str| ObjectType::parse(s).map_err(|e| e.to_string())),
        )
        .arg(
            Arg::new("downmix")
                .long("downmix")
                .short('d')
                .help("多声道下混为立体声 / downmix to stereo")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("old-format")
                .long("old-format")
                .help("旧式 ADTS 帧头 / legacy ADTS header with emphasis bits")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("chunk-size")
                .long("chunk-size")
                .help("输入块大小 / input chunk size in bytes")
                .value_name("BYTES")
                .value_parser(parse_size),
        )
        .arg(
            Arg::new("output-capacity")
                .long("output-capacity")
                .help("输出缓冲区容量 / output buffer capacity in bytes")
                .value_name("BYTES")
                .value_parser(parse_size),
        )
        .arg(
            Arg::new("stats")
                .long("stats")
                .help("写出 JSON 统计 / write JSON statistics")
                .value_name("FILE"),
        )
        .arg(
            Arg::new("exit-zero-on-decode-error")
                .long("exit-zero-on-decode-error")
                .help("帧解码错误时仍返回0 / exit 0 even after a decode error")
                .action(ArgAction::SetTrue),
        )
}

/// 从给定参数解析配置
pub fn parse_args_from<I, T>(args: I) -> AudioResult<AppConfig>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = build_command()
        .try_get_matches_from(args)
        .map_err(|e| AudioError::InvalidInput(e.to_string()))?;
    config_from_matches(&matches)
}

/// 解析命令行参数并创建配置
///
/// 参数错误时打印用法并以退出码1结束；`--help`/`--version` 正常退出。
pub fn parse_args() -> AppConfig {
    let matches = build_command().try_get_matches().unwrap_or_else(|e| {
        if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
            e.exit();
        }
        let _ = e.print();
        std::process::exit(exit_codes::GENERAL_ERROR);
    });

    config_from_matches(&matches).unwrap_or_else(|e| {
        eprintln!("[ERROR] {e}");
        std::process::exit(exit_codes::GENERAL_ERROR);
    })
}

fn config_from_matches(matches: &ArgMatches) -> AudioResult<AppConfig> {
    // required 参数由 clap 保证存在
    let path_arg = |name: &str| {
        matches
            .get_one::<String>(name)
            .map(PathBuf::from)
            .ok_or_else(|| AudioError::InvalidInput(format!("缺少参数 / missing {name}")))
    };

    let mut config = AppConfig::new(path_arg("INPUT")?, path_arg("OUTPUT")?);
    config.quiet = matches.get_flag("quiet");
    config.verbose = matches.get_flag("verbose");
    config.raw = matches.get_flag("raw");
    if let Some(format) = matches.get_one::<OutputFormat>("format") {
        config.output_format = *format;
    }
    config.default_sample_rate = matches.get_one::<u32>("sample-rate").copied();
    config.object_type = matches.get_one::<ObjectType>("object-type").copied();
    config.downmix = matches.get_flag("downmix");
    config.legacy_framing = matches.get_flag("old-format");
    if let Some(size) = matches.get_one::<usize>("chunk-size") {
        config.chunk_size = *size;
    }
    config.output_capacity = matches.get_one::<usize>("output-capacity").copied();
    config.stats_path = matches.get_one::<String>("stats").map(PathBuf::from);
    config.exit_zero_on_decode_error = matches.get_flag("exit-zero-on-decode-error");

    Ok(config)
}

/// 显示程序启动信息
pub fn show_startup_info(config: &AppConfig) {
    if config.quiet {
        return;
    }
    println!("🚀 AAC Stream Decoder v{VERSION}");
    if config.verbose {
        println!("📝 {DESCRIPTION}");
        println!(
            "   输入 / Input: {}  ->  输出 / Output: {} ({})",
            config.input_path.display(),
            config.output_path.display(),
            if config.is_raw_output() { "raw PCM" } else { "WAV" }
        );
        println!(
            "   块大小 / Chunk: {} B, 输出容量 / Output capacity: {} B",
            config.chunk_size,
            config.effective_output_capacity()
        );
    }
    println!();
}

/// 显示程序完成信息
pub fn show_completion_info(config: &AppConfig) {
    if config.verbose && !config.quiet {
        println!("✅ 解码完成 / Decoding finished");
    }
}
