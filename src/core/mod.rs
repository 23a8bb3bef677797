//! 核心模块
//!
//! 滑动窗口缓冲区、尾部元数据过滤、输出累加器，以及把它们串起来的解码会话。

pub mod output;
pub mod session;
pub mod stream_buffer;
pub mod tag_filter;

pub use output::{AcceptOutcome, OutputAccumulator};
pub use session::{ChunkOutcome, DecodeSession, SessionConfig};
pub use stream_buffer::StreamBuffer;
pub use tag_filter::{TagFilter, TagSignature, default_signatures};
