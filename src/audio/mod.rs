//! 音频模块
//!
//! 解码引擎接口、ADTS 分帧、symphonia 具体引擎、声道布局报告、统计与输出接收端。

pub mod adts;
pub mod channel_layout;
pub mod engine;
pub mod sink;
pub mod stats;
pub mod symphonia_engine;

pub use channel_layout::{channel_mask, format_channel_report};
pub use engine::{
    ChannelInfo, ChannelPosition, DecodedFrame, EngineConfig, FrameDecoder, FrameError,
    MAX_CHANNELS, MIN_STREAM_SIZE, ObjectType, OutputFormat, StreamInfo,
};
pub use sink::PcmSink;
pub use stats::DecodeStats;
pub use symphonia_engine::SymphoniaAdtsEngine;
