//! 输出格式化模块
//!
//! 负责解码摘要的文本输出和 JSON 统计文件。

use super::cli::AppConfig;
use super::processor::DecodeSummary;
use super::utils;
use crate::audio::engine::{EngineConfig, OutputFormat, StreamInfo};
use crate::audio::stats::DecodeStats;
use crate::error::{AudioError, AudioResult};
use serde::Serialize;
use std::path::Path;

/// 应用程序版本信息
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// JSON 统计报告
#[derive(Debug, Serialize)]
pub struct StatsReport<'a> {
    pub version: &'static str,
    pub input: String,
    pub output: String,
    pub engine: &'static str,
    pub engine_config: EngineConfig,
    pub stream: StreamInfo,
    pub frames_written: u64,
    pub duration_seconds: f64,
    pub stats: &'a DecodeStats,
    pub decode_error: Option<String>,
}

impl<'a> StatsReport<'a> {
    pub fn new(config: &AppConfig, summary: &'a DecodeSummary) -> Self {
        Self {
            version: VERSION,
            input: config.input_path.display().to_string(),
            output: config.output_path.display().to_string(),
            engine: summary.engine,
            engine_config: config.engine_config(),
            stream: summary.stream,
            frames_written: summary.frames_written,
            duration_seconds: summary.duration_seconds(),
            stats: &summary.stats,
            decode_error: summary.decode_error.as_ref().map(|e| e.to_string()),
        }
    }
}

/// 生成人类可读的解码摘要
pub fn format_summary(config: &AppConfig, summary: &DecodeSummary) -> String {
    let stats = &summary.stats;
    let mut out = String::new();

    out.push_str(&format!(
        "📁 {} -> {}\n",
        utils::extract_filename_lossy(&config.input_path),
        config.output_path.display()
    ));
    out.push_str(&format!(
        "   流信息 / Stream: {} Hz, {} ch, {}\n",
        summary.stream.sample_rate,
        summary.stream.channels,
        match config.output_format {
            OutputFormat::Pcm16 => "16-bit",
            OutputFormat::Pcm32 => "32-bit",
            OutputFormat::Float32 => "float",
        }
    ));
    out.push_str(&format!(
        "   采样帧 / Sample frames: {} ({:.2} s)\n",
        summary.frames_written,
        summary.duration_seconds()
    ));

    if config.verbose {
        out.push_str(&format!(
            "   AAC帧 / AAC frames: {} (每帧样本 / samples per frame: min {}, max {}, mean {:.1})\n",
            stats.frames, stats.min_frame_samples, stats.max_frame_samples, stats.mean_frame_samples
        ));
        out.push_str(&format!(
            "   消费 / Consumed: {}, 写出 / Written: {}\n",
            utils::format_bytes(stats.bytes_consumed),
            utils::format_bytes(stats.bytes_written)
        ));
        out.push_str(&format!(
            "   尾部标签 / Trailing tags discarded: {}\n",
            stats.tags_discarded
        ));
    }

    if stats.bytes_dropped > 0 {
        out.push_str(&format!(
            "   [WARNING] 输出缓冲区不足丢弃 / Dropped for lack of output space: {}\n",
            utils::format_bytes(stats.bytes_dropped)
        ));
    }
    if let Some(error) = &summary.decode_error {
        out.push_str(&format!("   [FAIL] {error}\n"));
    }
    out
}

/// 打印解码摘要（静默模式不输出）
pub fn show_summary(config: &AppConfig, summary: &DecodeSummary) {
    if config.quiet {
        return;
    }
    print!("{}", format_summary(config, summary));
}

/// 写出 JSON 统计文件
pub fn write_stats_json(path: &Path, config: &AppConfig, summary: &DecodeSummary) -> AudioResult<()> {
    let report = StatsReport::new(config, summary);
    let json = serde_json::to_string_pretty(&report).map_err(|e| {
        AudioError::ResourceError(format!("统计序列化失败 / failed to serialize stats: {e}"))
    })?;
    std::fs::write(path, json).map_err(|e| {
        AudioError::ResourceError(format!(
            "无法写入统计文件 / cannot write {}: {e}",
            path.display()
        ))
    })?;
    Ok(())
}
