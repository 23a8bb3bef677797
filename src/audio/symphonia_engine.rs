//! 基于 symphonia 的 ADTS/AAC 解码引擎
//!
//! 实现 [`FrameDecoder`]：在输入视图开头定位 ADTS 帧，构造 AudioSpecificConfig，
//! 把原始数据块交给 symphonia 的 AAC 解码器，再把输出编码为配置的样本格式。
//!
//! - 视图开头不是同步字：报告跳过的字节数，不产生样本
//! - 帧不完整：未消费、无样本（等待更多输入）
//! - symphonia 解码失败：帧级硬错误
//!
//! 引擎在 `Drop` 时关闭。

use super::adts::{self, AdtsHeader, HeaderScan};
use super::engine::{
    ChannelInfo, ChannelPosition, DecodedFrame, EngineConfig, FrameDecoder, FrameError,
    ObjectType, OutputFormat, StreamInfo,
};
use crate::error::{self, AudioError, AudioResult};
use symphonia::core::audio::{AudioBufferRef, Channels, SampleBuffer};
use symphonia::core::codecs::{CODEC_TYPE_AAC, CodecParameters, Decoder, DecoderOptions};
use symphonia::core::formats::Packet;

/// 下混系数（-3dB）
const DOWNMIX_GAIN: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// 当前解码器所对应的流参数；参数变化时重建解码器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StreamKey {
    object_type: ObjectType,
    sample_rate: u32,
    sample_rate_index: Option<u8>,
    channel_config: u8,
}

/// symphonia ADTS 解码引擎
pub struct SymphoniaAdtsEngine {
    config: EngineConfig,
    decoder: Option<(StreamKey, Box<dyn Decoder>)>,
    /// 最近一帧的输出样本（下一次 `decode_frame` 前有效）
    pcm: Vec<u8>,
    /// 交错转换缓冲区
    scratch: Vec<f32>,
    timestamp: u64,
}

impl Default for SymphoniaAdtsEngine {
    fn default() -> Self {
        Self::open()
    }
}

impl SymphoniaAdtsEngine {
    /// 打开引擎（使用默认配置）
    pub fn open() -> Self {
        Self {
            config: EngineConfig::default(),
            decoder: None,
            pcm: Vec::new(),
            scratch: Vec::new(),
            timestamp: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 由帧头推导解码器参数
    fn stream_key(&self, header: &AdtsHeader) -> AudioResult<StreamKey> {
        let (sample_rate, sample_rate_index) = match header.sample_rate() {
            Some(rate) => (rate, Some(header.sample_rate_index)),
            None => {
                let rate = self.config.default_sample_rate.ok_or_else(|| {
                    error::format_error(
                        "保留的采样率索引且未设置默认采样率 / reserved sample rate index",
                        header.sample_rate_index,
                    )
                })?;
                (rate, None)
            }
        };

        if header.channel_config == 0 {
            return Err(error::format_error(
                "不支持由PCE定义的声道配置 / PCE channel configuration unsupported",
                header.channel_config,
            ));
        }

        Ok(StreamKey {
            object_type: self
                .config
                .object_type_hint
                .unwrap_or_else(|| header.object_type()),
            sample_rate,
            sample_rate_index,
            channel_config: header.channel_config,
        })
    }

    /// 确保存在与当前帧头匹配的 symphonia 解码器
    fn ensure_decoder(&mut self, header: &AdtsHeader) -> AudioResult<()> {
        let key = self.stream_key(header)?;
        if matches!(&self.decoder, Some((current, _)) if *current == key) {
            return Ok(());
        }

        let asc = adts::audio_specific_config(
            key.object_type,
            key.sample_rate_index,
            key.sample_rate,
            key.channel_config,
        );
        let mut params = CodecParameters::new();
        params
            .for_codec(CODEC_TYPE_AAC)
            .with_sample_rate(key.sample_rate)
            .with_extra_data(asc.into_boxed_slice());

        let decoder = symphonia::default::get_codecs().make(&params, &DecoderOptions::default())?;

        self.decoder = Some((key, decoder));
        Ok(())
    }

    /// 声道配置对应的输出声道数（考虑下混）
    fn output_channels(&self, channel_config: u8) -> u16 {
        let channels = match channel_config {
            7 => 8,
            n => n as u16,
        };
        if self.config.downmix && channels > 2 {
            2
        } else {
            channels
        }
    }
}

impl FrameDecoder for SymphoniaAdtsEngine {
    fn name(&self) -> &'static str {
        "symphonia-aac"
    }

    fn configure(&mut self, config: &EngineConfig) -> AudioResult<()> {
        if config.default_sample_rate == Some(0) {
            return Err(AudioError::InvalidInput(
                "默认采样率不能为0 / default sample rate must be > 0".to_string(),
            ));
        }
        self.config = config.clone();
        // 配置变化后按新参数重建
        self.decoder = None;
        Ok(())
    }

    fn initialize(&mut self, probe: &[u8]) -> AudioResult<StreamInfo> {
        let mut pos = 0usize;
        loop {
            match adts::scan_header(&probe[pos..], self.config.legacy_framing) {
                HeaderScan::Frame(header) => {
                    self.ensure_decoder(&header)
                        .map_err(|e| error::init_error("初始化失败 / initialize failed", e))?;
                    let Some((key, _)) = &self.decoder else {
                        return Err(AudioError::InitError("解码器未创建".to_string()));
                    };
                    return Ok(StreamInfo {
                        sample_rate: key.sample_rate,
                        channels: self.output_channels(header.channel_config),
                    });
                }
                HeaderScan::Resync(skip) => pos += skip,
                HeaderScan::Incomplete => {
                    return Err(error::init_error(
                        "探测数据中没有ADTS帧头 / no ADTS header in probe",
                        format!("{} bytes", probe.len()),
                    ));
                }
            }
        }
    }

    fn decode_frame(&mut self, input: &[u8]) -> DecodedFrame<'_> {
        let header = match adts::scan_header(input, self.config.legacy_framing) {
            HeaderScan::Frame(header) => header,
            HeaderScan::Resync(skip) => return DecodedFrame::skipped(skip),
            HeaderScan::Incomplete => return DecodedFrame::need_more_data(),
        };
        if input.len() < header.frame_length {
            return DecodedFrame::need_more_data();
        }

        let consumed = header.frame_length;
        if let Err(e) = self.ensure_decoder(&header) {
            return DecodedFrame::failed(consumed, FrameError::new(e.to_string()));
        }

        let payload = match adts::frame_payload(&input[..consumed], &header) {
            Ok(payload) => payload,
            Err(e) => return DecodedFrame::failed(consumed, FrameError::new(format!("ADTS: {e}"))),
        };
        let packet = Packet::new_from_boxed_slice(0, self.timestamp, 0, payload.into_boxed_slice());

        let Some((_, decoder)) = self.decoder.as_mut() else {
            return DecodedFrame::failed(consumed, FrameError::new("解码器未创建"));
        };
        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(e) => {
                return DecodedFrame::failed(consumed, FrameError::new(format!("AAC: {e}")));
            }
        };

        let (frames, channels) = render_pcm(
            decoded,
            self.config.output_format,
            self.config.downmix,
            &mut self.scratch,
            &mut self.pcm,
        );
        self.timestamp += frames as u64;

        if frames == 0 {
            return DecodedFrame::skipped(consumed);
        }

        DecodedFrame {
            error: None,
            sample_count: frames * channels.channel_count(),
            bytes_consumed: consumed,
            channels,
            pcm: &self.pcm,
        }
    }

    fn output_format(&self) -> OutputFormat {
        self.config.output_format
    }
}

/// symphonia 声道位到位置编码
fn channel_position(channel: Channels) -> ChannelPosition {
    const TABLE: [(Channels, ChannelPosition); 9] = [
        (Channels::FRONT_LEFT, ChannelPosition::FrontLeft),
        (Channels::FRONT_RIGHT, ChannelPosition::FrontRight),
        (Channels::FRONT_CENTRE, ChannelPosition::FrontCenter),
        (Channels::LFE1, ChannelPosition::Lfe),
        (Channels::REAR_LEFT, ChannelPosition::BackLeft),
        (Channels::REAR_RIGHT, ChannelPosition::BackRight),
        (Channels::REAR_CENTRE, ChannelPosition::BackCenter),
        (Channels::SIDE_LEFT, ChannelPosition::SideLeft),
        (Channels::SIDE_RIGHT, ChannelPosition::SideRight),
    ];
    TABLE
        .iter()
        .find(|(flag, _)| *flag == channel)
        .map_or(ChannelPosition::Unknown, |(_, position)| *position)
}

/// 把解码结果交错、（可选）下混并编码为目标格式，返回（每声道帧数，声道信息）
fn render_pcm(
    decoded: AudioBufferRef<'_>,
    format: OutputFormat,
    downmix: bool,
    scratch: &mut Vec<f32>,
    pcm: &mut Vec<u8>,
) -> (usize, ChannelInfo) {
    let spec = *decoded.spec();
    let frames = decoded.frames();
    let positions: Vec<ChannelPosition> = spec.channels.iter().map(channel_position).collect();

    pcm.clear();
    if frames == 0 {
        return (0, ChannelInfo::new(positions));
    }

    let mut interleaved = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
    interleaved.copy_interleaved_ref(decoded);
    let samples = &interleaved.samples()[..frames * positions.len()];

    if downmix && positions.len() > 2 {
        downmix_to_stereo(samples, &positions, scratch);
        encode_samples(scratch, format, pcm);
        (
            frames,
            ChannelInfo::new(vec![ChannelPosition::FrontLeft, ChannelPosition::FrontRight]),
        )
    } else {
        encode_samples(samples, format, pcm);
        (frames, ChannelInfo::new(positions))
    }
}

/// 按位置下混为立体声
fn downmix_to_stereo(samples: &[f32], positions: &[ChannelPosition], out: &mut Vec<f32>) {
    let weights: Vec<(f32, f32)> = positions
        .iter()
        .map(|position| match position {
            ChannelPosition::FrontLeft => (1.0, 0.0),
            ChannelPosition::FrontRight => (0.0, 1.0),
            ChannelPosition::FrontCenter | ChannelPosition::BackCenter => {
                (DOWNMIX_GAIN, DOWNMIX_GAIN)
            }
            ChannelPosition::SideLeft | ChannelPosition::BackLeft => (DOWNMIX_GAIN, 0.0),
            ChannelPosition::SideRight | ChannelPosition::BackRight => (0.0, DOWNMIX_GAIN),
            ChannelPosition::Lfe | ChannelPosition::Unknown => (0.0, 0.0),
        })
        .collect();
    let norm = 1.0 / (1.0 + 2.0 * DOWNMIX_GAIN);

    out.clear();
    for frame in samples.chunks_exact(positions.len()) {
        let (mut left, mut right) = (0.0f32, 0.0f32);
        for (sample, (wl, wr)) in frame.iter().zip(&weights) {
            left += sample * wl;
            right += sample * wr;
        }
        out.push(left * norm);
        out.push(right * norm);
    }
}

/// 编码为小端字节
fn encode_samples(samples: &[f32], format: OutputFormat, pcm: &mut Vec<u8>) {
    pcm.reserve(samples.len() * format.bytes_per_sample());
    for &sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        match format {
            OutputFormat::Pcm16 => {
                let value = (clamped * i16::MAX as f32).round() as i16;
                pcm.extend_from_slice(&value.to_le_bytes());
            }
            OutputFormat::Pcm32 => {
                let value = (clamped as f64 * i32::MAX as f64).round() as i32;
                pcm.extend_from_slice(&value.to_le_bytes());
            }
            OutputFormat::Float32 => pcm.extend_from_slice(&sample.to_le_bytes()),
        }
    }
}
