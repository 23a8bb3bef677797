//! 解码会话与逐块解码循环
//!
//! 会话独占解码引擎和流缓冲区；每次 `decode_chunk` 把一个输入块折叠进滑动窗口，
//! 在每次追加后调用一次引擎解码，并把产出的样本写进调用方的输出缓冲区。
//!
//! ## 顺序约束
//! 1. 追加前先压缩（由 [`StreamBuffer::append`] 保证）
//! 2. 每次解码之后、按引擎自报的消费量推进窗口
//!
//! 帧解码硬错误立即终止当前块，已写入输出的部分不会回滚。

use super::output::{AcceptOutcome, OutputAccumulator};
use super::stream_buffer::StreamBuffer;
use super::tag_filter::{TagFilter, TagSignature};
use crate::audio::channel_layout::format_channel_report;
use crate::audio::engine::{FrameDecoder, MAX_CHANNELS};
use crate::audio::stats::DecodeStats;
use crate::error::{self, AudioError, AudioResult};
use crate::utils::diagnostics::{DiagnosticSink, TracingSink};
use tracing::Level;

/// 会话配置
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// 流缓冲区容量；`None` 时取 `min_stream_size * MAX_CHANNELS`
    pub buffer_capacity: Option<usize>,
    /// 尾部元数据签名（按顺序匹配）
    pub tag_signatures: Vec<TagSignature>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: None,
            tag_signatures: super::tag_filter::default_signatures(),
        }
    }
}

/// 一次 `decode_chunk` / `finish` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChunkOutcome {
    /// 写入输出缓冲区的字节数
    pub bytes_written: usize,
    /// 因输出容量不足被丢弃的字节数
    pub bytes_dropped: usize,
    /// 本次产出样本的帧数
    pub frames: usize,
}

impl ChunkOutcome {
    #[inline]
    pub fn has_loss(&self) -> bool {
        self.bytes_dropped > 0
    }
}

/// 解码会话：引擎 + 流缓冲区 + 首帧标志
pub struct DecodeSession<D: FrameDecoder> {
    decoder: D,
    buffer: StreamBuffer,
    tag_filter: TagFilter,
    first_frame: bool,
    bytes_per_sample: usize,
    diagnostics: Box<dyn DiagnosticSink>,
    stats: DecodeStats,
}

impl<D: FrameDecoder> DecodeSession<D> {
    /// 使用默认诊断输出（`tracing`）创建会话
    pub fn new(decoder: D, config: SessionConfig) -> AudioResult<Self> {
        Self::with_diagnostics(decoder, config, Box::new(TracingSink))
    }

    /// 创建会话并注入诊断接收端
    ///
    /// 引擎应已完成 `configure`；输出样本宽度在此时确定。
    pub fn with_diagnostics(
        decoder: D,
        config: SessionConfig,
        diagnostics: Box<dyn DiagnosticSink>,
    ) -> AudioResult<Self> {
        let minimum = decoder.min_stream_size().saturating_mul(MAX_CHANNELS);
        let capacity = config.buffer_capacity.unwrap_or(minimum);
        if capacity < minimum {
            return Err(AudioError::InvalidInput(format!(
                "流缓冲区容量过小 / stream buffer too small: {capacity} < {minimum}"
            )));
        }

        let buffer = StreamBuffer::new(capacity)?;
        let bytes_per_sample = decoder.output_format().bytes_per_sample();
        diagnostics.emit(
            Level::DEBUG,
            &format!(
                "session opened: engine={}, buffer={capacity} bytes, {bytes_per_sample} bytes/sample",
                decoder.name()
            ),
        );

        Ok(Self {
            decoder,
            buffer,
            tag_filter: TagFilter::new(config.tag_signatures),
            first_frame: true,
            bytes_per_sample,
            diagnostics,
            stats: DecodeStats::new(),
        })
    }

    pub fn buffer(&self) -> &StreamBuffer {
        &self.buffer
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    pub fn stats(&self) -> &DecodeStats {
        &self.stats
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.bytes_per_sample
    }

    /// 首帧尚未出现（声道布局报告尚未发出）
    pub fn awaiting_first_frame(&self) -> bool {
        self.first_frame
    }

    /// 结束会话，交回引擎（引擎在 `Drop` 时关闭）
    pub fn into_decoder(self) -> D {
        self.decoder
    }

    /// 解码一个输入块
    ///
    /// 循环直到输入块全部折叠进窗口：追加 → 标记过滤 → 解码一次 → 推进 → 拷贝样本。
    /// 返回本块写入的字节数和截断丢弃量；帧硬错误返回 `DecodingError`。
    pub fn decode_chunk(&mut self, input: &[u8], output: &mut [u8]) -> AudioResult<ChunkOutcome> {
        if input.is_empty() {
            return Err(AudioError::InvalidInput(
                "输入块为空 / empty input chunk".to_string(),
            ));
        }
        if output.is_empty() {
            return Err(AudioError::InvalidInput(
                "输出缓冲区容量为0 / zero-capacity output buffer".to_string(),
            ));
        }

        let mut accumulator = OutputAccumulator::new(output, self.bytes_per_sample);
        let mut frames = 0usize;
        let mut remaining = input;

        loop {
            let accepted = self.buffer.append(remaining);
            remaining = &remaining[accepted..];

            self.filter_tags();

            let step = self.decode_once(&mut accumulator)?;
            if step.produced_samples() {
                frames += 1;
            } else if accepted == 0 && step.consumed == 0 && !remaining.is_empty() {
                // 窗口已满且引擎无法前进，继续循环只会空转
                self.stats.add_error();
                return Err(error::decoding_error(
                    "解码停滞 / decoder stalled",
                    format!(
                        "{} bytes held, {} bytes pending",
                        self.buffer.held(),
                        remaining.len()
                    ),
                ));
            }

            if remaining.is_empty() {
                break;
            }
        }

        Ok(ChunkOutcome {
            bytes_written: accumulator.written(),
            bytes_dropped: accumulator.dropped(),
            frames,
        })
    }

    /// 流结束：标记 EOF 并解码窗口中剩余的完整帧
    ///
    /// 输出缓冲区放不下下一帧（按上一帧大小估计）时提前返回，调用方取走输出后再次调用；
    /// 返回 `frames == 0` 表示窗口已排空，或引擎不再前进（未消费且无样本）。
    pub fn finish(&mut self, output: &mut [u8]) -> AudioResult<ChunkOutcome> {
        if !self.buffer.is_at_eof() {
            self.buffer.mark_eof();
            self.diagnostics.emit(
                Level::DEBUG,
                &format!("end of stream: draining {} held bytes", self.buffer.held()),
            );
        }

        let mut accumulator = OutputAccumulator::new(output, self.bytes_per_sample);
        let mut frames = 0usize;
        let mut last_frame_bytes = 0usize;
        let mut stalled = false;

        loop {
            self.filter_tags();
            if self.buffer.held() == 0 {
                break;
            }
            if frames > 0 && accumulator.remaining() < last_frame_bytes {
                break;
            }

            let step = self.decode_once(&mut accumulator)?;
            if step.produced_samples() {
                frames += 1;
                last_frame_bytes = step.requested_bytes;
            } else if step.consumed == 0 {
                stalled = true;
                break;
            }
        }

        if stalled {
            self.diagnostics.emit(
                Level::DEBUG,
                &format!(
                    "end of stream: {} trailing bytes left undecoded",
                    self.buffer.held()
                ),
            );
        }

        Ok(ChunkOutcome {
            bytes_written: accumulator.written(),
            bytes_dropped: accumulator.dropped(),
            frames,
        })
    }

    /// 对窗口做一次解码：推进窗口，处理硬错误、首帧报告与样本拷贝
    fn decode_once(&mut self, accumulator: &mut OutputAccumulator<'_>) -> AudioResult<FrameStep> {
        let frame = self.decoder.decode_frame(self.buffer.data());
        self.buffer.advance(frame.bytes_consumed);
        self.stats.add_consumed(frame.bytes_consumed);

        if frame.is_error() {
            let message = frame
                .error
                .as_ref()
                .map(|err| err.message.clone())
                .unwrap_or_default();
            self.stats.add_error();
            self.diagnostics
                .emit(Level::ERROR, &format!("Error: {message}"));
            return Err(AudioError::DecodingError(message));
        }

        let mut step = FrameStep {
            consumed: frame.bytes_consumed,
            requested_bytes: 0,
        };
        if frame.sample_count > 0 {
            if self.first_frame {
                self.diagnostics
                    .emit(Level::INFO, &format_channel_report(&frame.channels));
                self.first_frame = false;
            }
            let outcome = accumulator.accept(frame.pcm, frame.sample_count);
            record_output(&mut self.stats, &*self.diagnostics, frame.sample_count, outcome);
            step.requested_bytes = outcome.written + outcome.dropped;
        }
        Ok(step)
    }

    fn filter_tags(&mut self) {
        if let Some(signature) = self.tag_filter.scan_and_invalidate(&mut self.buffer) {
            self.stats.add_tag();
            self.diagnostics.emit(
                Level::DEBUG,
                &format!(
                    "discarded window at trailing {} marker (stream offset {})",
                    signature.name,
                    self.buffer.offset()
                ),
            );
        }
    }
}

/// 单次解码的进度
#[derive(Debug, Clone, Copy)]
struct FrameStep {
    consumed: usize,
    /// 本帧请求写入的字节数（0 表示没有样本）
    requested_bytes: usize,
}

impl FrameStep {
    #[inline]
    fn produced_samples(&self) -> bool {
        self.requested_bytes > 0
    }
}

fn record_output(
    stats: &mut DecodeStats,
    diagnostics: &dyn DiagnosticSink,
    sample_count: usize,
    outcome: AcceptOutcome,
) {
    stats.add_frame(sample_count);
    stats.add_output(outcome.written, outcome.dropped);
    if outcome.is_clamped() {
        diagnostics.emit(
            Level::WARN,
            &format!("Warning: no buffer space, loss {} bytes", outcome.dropped),
        );
    }
}
