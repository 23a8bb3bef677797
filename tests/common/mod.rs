//! 集成测试共享的脚本化解码引擎
//!
//! 迷你帧格式（便于手工构造输入）：
//! - `F n s0 s1 ...`：一帧，`n` 个16位样本，随后 `2n` 字节样本数据
//! - `E`：帧级硬错误
//! - 其他字节：垃圾数据，逐字节跳过

#![allow(dead_code)]

use aac_stream_decoder::audio::engine::{
    ChannelInfo, ChannelPosition, DecodedFrame, EngineConfig, FrameDecoder, FrameError,
    OutputFormat, StreamInfo,
};
use aac_stream_decoder::error::AudioResult;

pub fn log(msg_zh: impl AsRef<str>, msg_en: impl AsRef<str>) {
    println!("{} / {}", msg_zh.as_ref(), msg_en.as_ref());
}

/// 构造一帧：`F`、样本数、样本字节
pub fn frame(samples: &[i16]) -> Vec<u8> {
    let mut bytes = vec![b'F', samples.len() as u8];
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

pub fn stereo() -> ChannelInfo {
    ChannelInfo::new(vec![ChannelPosition::FrontLeft, ChannelPosition::FrontRight])
}

pub fn five_one() -> ChannelInfo {
    ChannelInfo::new(vec![
        ChannelPosition::FrontCenter,
        ChannelPosition::FrontLeft,
        ChannelPosition::FrontRight,
        ChannelPosition::BackLeft,
        ChannelPosition::BackRight,
        ChannelPosition::Lfe,
    ])
}

/// 脚本化解码引擎
pub struct ScriptedDecoder {
    pub channels: ChannelInfo,
    pub calls: usize,
    pcm: Vec<u8>,
}

impl ScriptedDecoder {
    pub fn new(channels: ChannelInfo) -> Self {
        Self {
            channels,
            calls: 0,
            pcm: Vec::new(),
        }
    }
}

impl FrameDecoder for ScriptedDecoder {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn configure(&mut self, _config: &EngineConfig) -> AudioResult<()> {
        Ok(())
    }

    fn initialize(&mut self, _probe: &[u8]) -> AudioResult<StreamInfo> {
        Ok(StreamInfo {
            sample_rate: 8000,
            channels: self.channels.channel_count() as u16,
        })
    }

    fn decode_frame(&mut self, input: &[u8]) -> DecodedFrame<'_> {
        self.calls += 1;
        match input.first() {
            None => DecodedFrame::need_more_data(),
            Some(b'E') => DecodedFrame::failed(1, FrameError::new("scripted error")),
            Some(b'F') => {
                let Some(&count) = input.get(1) else {
                    return DecodedFrame::need_more_data();
                };
                let length = 2 + count as usize * 2;
                if input.len() < length {
                    return DecodedFrame::need_more_data();
                }
                self.pcm.clear();
                self.pcm.extend_from_slice(&input[2..length]);
                DecodedFrame {
                    error: None,
                    sample_count: count as usize,
                    bytes_consumed: length,
                    channels: self.channels.clone(),
                    pcm: &self.pcm,
                }
            }
            Some(_) => DecodedFrame::skipped(1),
        }
    }

    fn output_format(&self) -> OutputFormat {
        OutputFormat::Pcm16
    }

    fn min_stream_size(&self) -> usize {
        1
    }
}
