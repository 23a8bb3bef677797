//! 解码统计模块
//!
//! 按会话累计帧数、样本数、消费字节、截断丢弃量等信息

use serde::Serialize;

/// 会话级解码统计
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodeStats {
    /// 成功解出样本的帧数
    pub frames: usize,
    /// 交错样本总数
    pub samples: u64,
    pub min_frame_samples: usize,
    pub max_frame_samples: usize,
    pub mean_frame_samples: f64,
    /// 解码器上报的消费字节总数
    pub bytes_consumed: u64,
    /// 写入输出缓冲区的字节总数
    pub bytes_written: u64,
    /// 因输出容量不足被丢弃的字节总数
    pub bytes_dropped: u64,
    /// 触发尾部元数据过滤的次数
    pub tags_discarded: usize,
    pub decode_errors: usize,
}

impl Default for DecodeStats {
    fn default() -> Self {
        Self::new()
    }
}

impl DecodeStats {
    pub fn new() -> Self {
        Self {
            frames: 0,
            samples: 0,
            min_frame_samples: usize::MAX,
            max_frame_samples: 0,
            mean_frame_samples: 0.0,
            bytes_consumed: 0,
            bytes_written: 0,
            bytes_dropped: 0,
            tags_discarded: 0,
            decode_errors: 0,
        }
    }

    /// 记录一帧成功解码
    ///
    /// # 参数
    /// * `samples` - 本帧交错样本数（所有声道合计）
    pub fn add_frame(&mut self, samples: usize) {
        self.frames += 1;
        self.samples = self.samples.saturating_add(samples as u64);
        self.min_frame_samples = self.min_frame_samples.min(samples);
        self.max_frame_samples = self.max_frame_samples.max(samples);
    }

    pub fn add_consumed(&mut self, bytes: usize) {
        self.bytes_consumed = self.bytes_consumed.saturating_add(bytes as u64);
    }

    pub fn add_output(&mut self, written: usize, dropped: usize) {
        self.bytes_written = self.bytes_written.saturating_add(written as u64);
        self.bytes_dropped = self.bytes_dropped.saturating_add(dropped as u64);
    }

    pub fn add_tag(&mut self) {
        self.tags_discarded += 1;
    }

    pub fn add_error(&mut self) {
        self.decode_errors += 1;
    }

    /// 计算均值并修正空统计的边界值
    pub fn finalize(&mut self) {
        if self.frames > 0 {
            self.mean_frame_samples = self.samples as f64 / self.frames as f64;
        }
        if self.min_frame_samples == usize::MAX {
            self.min_frame_samples = 0;
        }
    }

    /// 已冻结的快照（不修改自身）
    pub fn snapshot(&self) -> Self {
        let mut copy = self.clone();
        copy.finalize();
        copy
    }
}
