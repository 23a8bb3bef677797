//! AAC Stream Decoder
//!
//! 分块 ADTS/AAC 流式解码驱动：把任意大小的压缩输入块折叠进固定容量的滑动窗口，
//! 逐帧交给外部解码引擎，并把解码样本写进调用方的输出缓冲区。
//!
//! ## 核心特性
//! - 固定容量滑动窗口（追加前压缩，按引擎自报消费量推进）
//! - 尾部元数据过滤（ID3v1 / APEv2 / Lyrics3）
//! - 输出容量截断与丢弃量报告
//! - 首帧声道布局报告（标准5.1提示 WAVE_FORMAT_EXTENSIBLE 掩码）
//! - 可注入的诊断输出（`tracing` / 静默 / 内存记录）

pub mod audio;
pub mod core;
pub mod error;
pub mod tools;
pub mod utils;

// 重新导出核心类型
pub use audio::{
    DecodeStats, EngineConfig, FrameDecoder, OutputFormat, PcmSink, StreamInfo,
    SymphoniaAdtsEngine,
};
pub use core::{DecodeSession, SessionConfig, StreamBuffer, TagFilter};
pub use error::{AudioError, AudioResult};
