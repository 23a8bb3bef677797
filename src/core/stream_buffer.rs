//! 流输入滑动窗口
//!
//! 固定容量的字节缓冲区，保存解码器尚未消费完的压缩数据。
//!
//! ## 不变量
//! - `held <= capacity`
//! - `read_pos + held <= capacity`
//! - 逻辑流偏移只增不减
//!
//! 追加新数据前必须先把未读尾部搬到缓冲区开头（容量固定，不会增长）。

use crate::error::{AudioError, AudioResult};

/// 解码器视角的未消费压缩输入
#[derive(Debug)]
pub struct StreamBuffer {
    storage: Box<[u8]>,
    /// 当前持有的未读字节数
    held: usize,
    /// 未读区起点（自上次压缩以来被解码器消费掉的字节数）
    read_pos: usize,
    /// 逻辑流偏移（累计上报的消费量）
    offset: u64,
    at_eof: bool,
}

impl StreamBuffer {
    /// 分配固定容量的缓冲区
    ///
    /// 容量为0或分配失败属于会话级致命错误。
    pub fn new(capacity: usize) -> AudioResult<Self> {
        if capacity == 0 {
            return Err(AudioError::InvalidInput(
                "流缓冲区容量必须大于0 / stream buffer capacity must be > 0".to_string(),
            ));
        }

        let mut storage = Vec::new();
        storage
            .try_reserve_exact(capacity)
            .map_err(|_| AudioError::OutOfMemory)?;
        storage.resize(capacity, 0u8);

        Ok(Self {
            storage: storage.into_boxed_slice(),
            held: 0,
            read_pos: 0,
            offset: 0,
            at_eof: false,
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// 当前持有的未读字节数
    #[inline]
    pub fn held(&self) -> usize {
        self.held
    }

    /// 自上次追加以来已被消费的字节数
    #[inline]
    pub fn consumed(&self) -> usize {
        self.read_pos
    }

    /// 逻辑流偏移
    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    #[inline]
    pub fn free_space(&self) -> usize {
        self.capacity() - self.held
    }

    #[inline]
    pub fn is_at_eof(&self) -> bool {
        self.at_eof
    }

    pub fn mark_eof(&mut self) {
        self.at_eof = true;
    }

    /// 未读字节视图（交给解码器的输入）
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.storage[self.read_pos..self.read_pos + self.held]
    }

    /// 追加新数据，返回实际接收的字节数
    ///
    /// 先把未读尾部搬到开头，再拷贝 `min(剩余空间, bytes.len())` 字节。
    /// 返回值可能小于请求长度，调用方需保留余下部分下一轮重试。
    pub fn append(&mut self, bytes: &[u8]) -> usize {
        let free = self.free_space();

        if self.held > 0 && self.read_pos > 0 {
            self.storage
                .copy_within(self.read_pos..self.read_pos + self.held, 0);
        }
        self.read_pos = 0;

        let accepted = free.min(bytes.len());
        self.storage[self.held..self.held + accepted].copy_from_slice(&bytes[..accepted]);
        self.held += accepted;

        accepted
    }

    /// 按解码器自报的消费量推进窗口
    ///
    /// 消费量超过持有量时截断为持有量，计数永不下溢；逻辑偏移按上报值累加。
    pub fn advance(&mut self, amount: usize) {
        let step = amount.min(self.held);
        self.offset = self.offset.saturating_add(amount as u64);
        self.read_pos += step;
        self.held -= step;
    }

    /// 丢弃全部持有数据
    pub fn invalidate(&mut self) {
        self.held = 0;
        self.read_pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            StreamBuffer::new(0),
            Err(AudioError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_held_tracks_appends_minus_advances() {
        let mut buf = StreamBuffer::new(32).unwrap();
        let mut expected = 0usize;

        for (len, consume) in [(5usize, 0usize), (7, 3), (4, 4), (10, 1)] {
            let accepted = buf.append(&vec![0xAB; len]);
            assert_eq!(accepted, len);
            expected += accepted;
            assert_eq!(buf.held(), expected);

            buf.advance(consume);
            expected -= consume;
            assert_eq!(buf.held(), expected);
        }
    }

    #[test]
    fn test_append_clamps_to_free_space() {
        let mut buf = StreamBuffer::new(8).unwrap();
        assert_eq!(buf.append(&[1, 2, 3, 4, 5]), 5);
        assert_eq!(buf.append(&[6, 7, 8, 9, 10]), 3);
        assert_eq!(buf.held(), 8);
        assert_eq!(buf.data(), &[1, 2, 3, 4, 5, 6, 7, 8]);
        // 满了之后什么都接收不了
        assert_eq!(buf.append(&[11]), 0);
        assert_eq!(buf.free_space(), 0);
    }

    #[test]
    fn test_advance_never_underflows() {
        let mut buf = StreamBuffer::new(16).unwrap();
        buf.append(&[0; 6]);
        buf.advance(10);
        assert_eq!(buf.held(), 0);
        assert_eq!(buf.offset(), 10);
        assert!(buf.data().is_empty());

        buf.advance(3);
        assert_eq!(buf.held(), 0);
        assert_eq!(buf.offset(), 13);
    }

    #[test]
    fn test_append_compacts_unread_tail_to_front() {
        let mut buf = StreamBuffer::new(10).unwrap();
        let first: Vec<u8> = (0..10).collect();
        assert_eq!(buf.append(&first), 10);

        // 消费到只剩k=3字节
        buf.advance(7);
        assert_eq!(buf.data(), &[7, 8, 9]);
        assert_eq!(buf.consumed(), 7);

        let accepted = buf.append(&[100, 101, 102, 103, 104, 105, 106, 107]);
        assert_eq!(accepted, 7);
        assert_eq!(buf.consumed(), 0);
        assert_eq!(&buf.data()[..3], &[7, 8, 9]);
        assert_eq!(&buf.data()[3..], &[100, 101, 102, 103, 104, 105, 106]);
    }

    #[test]
    fn test_offset_is_monotonic() {
        let mut buf = StreamBuffer::new(4).unwrap();
        let mut last = buf.offset();
        for consume in [0usize, 2, 9, 1, 0] {
            buf.append(&[1, 2, 3, 4]);
            buf.advance(consume);
            assert!(buf.offset() >= last);
            last = buf.offset();
        }
    }

    #[test]
    fn test_invalidate_and_eof_flag() {
        let mut buf = StreamBuffer::new(4).unwrap();
        buf.append(&[1, 2]);
        buf.invalidate();
        assert_eq!(buf.held(), 0);
        assert!(!buf.is_at_eof());
        buf.mark_eof();
        assert!(buf.is_at_eof());
    }
}
