//! 输出累加器
//!
//! 在一次 `decode_chunk` 调用内，把多帧解码结果依次拷贝进调用方提供的固定容量输出缓冲区。
//! 超出容量的部分被截断并记为丢弃量，不会溢出，也不会让整次解码失败。

/// 单次 `accept` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AcceptOutcome {
    /// 本次实际写入的字节数
    pub written: usize,
    /// 本次因容量不足被丢弃的字节数
    pub dropped: usize,
}

impl AcceptOutcome {
    /// 是否发生了截断
    #[inline]
    pub fn is_clamped(&self) -> bool {
        self.dropped > 0
    }
}

/// 输出累加状态，生命周期限定在一次 `decode_chunk` 内
#[derive(Debug)]
pub struct OutputAccumulator<'a> {
    output: &'a mut [u8],
    bytes_per_sample: usize,
    written: usize,
    dropped: usize,
}

impl<'a> OutputAccumulator<'a> {
    pub fn new(output: &'a mut [u8], bytes_per_sample: usize) -> Self {
        Self {
            output,
            bytes_per_sample,
            written: 0,
            dropped: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.output.len()
    }

    /// 目前已写入的字节数
    #[inline]
    pub fn written(&self) -> usize {
        self.written
    }

    /// 目前累计丢弃的字节数
    #[inline]
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity() - self.written
    }

    /// 接收一帧样本
    ///
    /// 请求字节数 = `sample_count * bytes_per_sample`，按剩余容量截断。
    pub fn accept(&mut self, pcm: &[u8], sample_count: usize) -> AcceptOutcome {
        let requested = sample_count.saturating_mul(self.bytes_per_sample);
        let take = requested.min(self.remaining()).min(pcm.len());

        if take > 0 {
            self.output[self.written..self.written + take].copy_from_slice(&pcm[..take]);
            self.written += take;
        }

        let outcome = AcceptOutcome {
            written: take,
            dropped: requested - take,
        };
        self.dropped += outcome.dropped;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_accept_is_clamped_to_capacity() {
        let mut out = [0u8; 10];
        let mut acc = OutputAccumulator::new(&mut out, 2);

        let first = acc.accept(&[1; 6], 3);
        assert_eq!(first, AcceptOutcome { written: 6, dropped: 0 });
        assert_eq!(acc.written(), 6);

        let second = acc.accept(&[2; 6], 3);
        assert_eq!(second.written, 4);
        assert!(second.is_clamped());
        assert_eq!(acc.written(), 10);

        assert_eq!(out, [1, 1, 1, 1, 1, 1, 2, 2, 2, 2]);
    }

    #[test]
    fn test_full_buffer_writes_nothing() {
        let mut out = [0u8; 4];
        let mut acc = OutputAccumulator::new(&mut out, 2);
        acc.accept(&[9; 4], 2);

        let outcome = acc.accept(&[7; 8], 4);
        assert_eq!(outcome, AcceptOutcome { written: 0, dropped: 8 });
        assert_eq!(acc.dropped(), 8);
        assert_eq!(out, [9; 4]);
    }

    #[test]
    fn test_zero_samples_is_noop() {
        let mut out = [0u8; 4];
        let mut acc = OutputAccumulator::new(&mut out, 2);
        let outcome = acc.accept(&[], 0);
        assert_eq!(outcome, AcceptOutcome::default());
        assert_eq!(acc.remaining(), 4);
    }

    #[test]
    fn test_wider_samples_use_bytes_per_sample() {
        let mut out = [0u8; 16];
        let mut acc = OutputAccumulator::new(&mut out, 4);
        let outcome = acc.accept(&[3; 12], 3);
        assert_eq!(outcome.written, 12);
        assert_eq!(acc.remaining(), 4);
    }
}
