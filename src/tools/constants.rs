//! 常量和默认配置集中管理
//!
//! 将驱动层的默认值集中定义，避免在 CLI 与处理流程之间出现默认值漂移

/// 驱动层默认值
pub mod defaults {
    /// 每次从输入文件读取的字节数
    pub const INPUT_CHUNK_SIZE: usize = 1024;

    /// 输出缓冲区容量 = 输入块大小 × 该系数
    ///
    /// 一个 AAC 帧最多产出 1024 个采样帧，压缩比通常远大于10，
    /// 所以截断只会出现在块内包含多帧的情况
    pub const OUTPUT_CAPACITY_FACTOR: usize = 10;
}

/// 输入参数限制
pub mod limits {
    /// 最小输入块大小
    pub const MIN_CHUNK_SIZE: usize = 1;

    /// 最大输入块大小（16 MiB）
    pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;
}

/// 程序退出码
pub mod exit_codes {
    /// 会话级错误（打开文件、分配、初始化）
    pub const GENERAL_ERROR: i32 = 1;
    /// 帧解码错误
    pub const DECODING_ERROR: i32 = 3;
}

pub use crate::audio::engine::{MAX_CHANNELS, MIN_STREAM_SIZE};
