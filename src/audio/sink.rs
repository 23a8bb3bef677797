//! PCM 输出接收端
//!
//! 会话把解码样本写进调用方缓冲区；接收端再把这些字节落盘：
//! WAV 容器（hound，参数取自流信息）或无头的原始 PCM。

use super::engine::{OutputFormat, StreamInfo};
use crate::error::{AudioError, AudioResult};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

enum SinkTarget {
    Wav(WavWriter<BufWriter<File>>),
    Raw(BufWriter<File>),
}

/// 输出接收端
pub struct PcmSink {
    target: SinkTarget,
    format: OutputFormat,
    /// 上次写入遗留的不完整样本字节
    pending: Vec<u8>,
    samples_written: u64,
    channels: u16,
}

impl PcmSink {
    /// 创建 WAV 输出
    pub fn wav(path: &Path, info: StreamInfo, format: OutputFormat) -> AudioResult<Self> {
        if info.channels == 0 || info.sample_rate == 0 {
            return Err(AudioError::InvalidInput(format!(
                "无效的流参数 / invalid stream parameters: {} Hz, {} ch",
                info.sample_rate, info.channels
            )));
        }

        let spec = WavSpec {
            channels: info.channels,
            sample_rate: info.sample_rate,
            bits_per_sample: format.bits_per_sample(),
            sample_format: if format.is_float() {
                SampleFormat::Float
            } else {
                SampleFormat::Int
            },
        };
        let writer = WavWriter::create(path, spec).map_err(|e| {
            AudioError::ResourceError(format!(
                "无法创建输出文件 / cannot create output {}: {e}",
                path.display()
            ))
        })?;

        Ok(Self::from_target(SinkTarget::Wav(writer), format, info.channels))
    }

    /// 创建原始 PCM 输出（小端，交错）
    pub fn raw(path: &Path, info: StreamInfo, format: OutputFormat) -> AudioResult<Self> {
        let file = File::create(path).map_err(|e| {
            AudioError::ResourceError(format!(
                "无法创建输出文件 / cannot create output {}: {e}",
                path.display()
            ))
        })?;
        Ok(Self::from_target(
            SinkTarget::Raw(BufWriter::new(file)),
            format,
            info.channels,
        ))
    }

    fn from_target(target: SinkTarget, format: OutputFormat, channels: u16) -> Self {
        Self {
            target,
            format,
            pending: Vec::new(),
            samples_written: 0,
            channels,
        }
    }

    /// 已写入的样本数（所有声道合计）
    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    /// 已写入的采样帧数（每声道）
    pub fn frames_written(&self) -> u64 {
        self.samples_written / self.channels.max(1) as u64
    }

    /// 写入一段小端 PCM 字节
    pub fn write_pcm(&mut self, bytes: &[u8]) -> AudioResult<()> {
        let bps = self.format.bytes_per_sample();

        let mut data = bytes;
        let joined;
        if !self.pending.is_empty() {
            let mut merged = std::mem::take(&mut self.pending);
            merged.extend_from_slice(bytes);
            joined = merged;
            data = &joined;
        }

        let whole = data.len() - data.len() % bps;
        let (complete, tail) = data.split_at(whole);

        match &mut self.target {
            SinkTarget::Raw(writer) => writer.write_all(complete)?,
            SinkTarget::Wav(writer) => {
                for sample in complete.chunks_exact(bps) {
                    match self.format {
                        OutputFormat::Pcm16 => {
                            writer.write_sample(i16::from_le_bytes([sample[0], sample[1]]))?
                        }
                        OutputFormat::Pcm32 => writer.write_sample(i32::from_le_bytes([
                            sample[0], sample[1], sample[2], sample[3],
                        ]))?,
                        OutputFormat::Float32 => writer.write_sample(f32::from_le_bytes([
                            sample[0], sample[1], sample[2], sample[3],
                        ]))?,
                    }
                }
            }
        }

        self.samples_written += (whole / bps) as u64;
        self.pending = tail.to_vec();
        Ok(())
    }

    /// 刷新并写好 WAV 头；遗留的半个样本被丢弃
    pub fn finalize(self) -> AudioResult<u64> {
        let frames = self.frames_written();
        match self.target {
            SinkTarget::Wav(writer) => writer.finalize().map_err(|e| {
                AudioError::ResourceError(format!("WAV文件收尾失败 / failed to finalize WAV: {e}"))
            })?,
            SinkTarget::Raw(mut writer) => writer.flush()?,
        }
        Ok(frames)
    }
}
