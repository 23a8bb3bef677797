//! 解码会话集成测试
//!
//! 使用脚本化解码引擎驱动 `DecodeSession`，验证滑动窗口、标签过滤、
//! 输出截断、首帧报告与错误终止的端到端行为。

mod common;

use aac_stream_decoder::audio::engine::ChannelInfo;
use aac_stream_decoder::core::tag_filter::TagSignature;
use aac_stream_decoder::core::{DecodeSession, SessionConfig};
use aac_stream_decoder::error::AudioError;
use aac_stream_decoder::utils::{MemorySink, QuietSink};
use common::{ScriptedDecoder, five_one, frame, log, stereo};
use tracing::Level;

fn session_with(
    capacity: usize,
    channels: ChannelInfo,
    sink: &MemorySink,
) -> DecodeSession<ScriptedDecoder> {
    let config = SessionConfig {
        buffer_capacity: Some(capacity),
        ..SessionConfig::default()
    };
    DecodeSession::with_diagnostics(ScriptedDecoder::new(channels), config, Box::new(sink.clone()))
        .unwrap()
}

fn le_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

// ============================================================================
// 端到端解码
// ============================================================================

/// 一个输入块跨两次追加产出3样本和4样本两帧
#[test]
fn test_two_frames_in_one_chunk() {
    let sink = MemorySink::new();
    let mut session = session_with(10, stereo(), &sink);

    let mut chunk = frame(&[1, 2, 3]);
    chunk.extend(frame(&[4, 5, 6, 7]));
    let mut output = [0u8; 20];

    let outcome = session.decode_chunk(&chunk, &mut output).unwrap();
    log(
        format!("写入 {} 字节", outcome.bytes_written),
        format!("wrote {} bytes", outcome.bytes_written),
    );

    assert_eq!(outcome.bytes_written, 14);
    assert_eq!(outcome.frames, 2);
    assert!(!outcome.has_loss());
    assert_eq!(&output[..14], le_bytes(&[1, 2, 3, 4, 5, 6, 7]).as_slice());
    assert_eq!(session.buffer().offset(), 18);
    assert_eq!(session.buffer().held(), 0);
    assert!(sink.messages_at(Level::WARN).is_empty());
}

/// 硬错误立即终止本块，之前写入的样本保留，之后没有任何写入
#[test]
fn test_hard_error_aborts_chunk() {
    let sink = MemorySink::new();
    let mut session = session_with(6, stereo(), &sink);

    let mut chunk = frame(&[9]);
    chunk.extend_from_slice(b"Ezzzz");
    let mut output = [0u8; 16];

    let result = session.decode_chunk(&chunk, &mut output);
    assert!(matches!(result, Err(AudioError::DecodingError(_))));
    assert_eq!(&output[..2], &[9, 0]);
    assert!(output[2..].iter().all(|&b| b == 0));

    let errors = sink.messages_at(Level::ERROR);
    assert_eq!(errors, vec!["Error: scripted error".to_string()]);
    assert_eq!(session.stats().decode_errors, 1);
    log("硬错误终止块", "hard error aborted the chunk");
}

/// 输出容量不足：截断并报告丢弃量，下一块重新计数
#[test]
fn test_output_clamp_reports_loss() {
    let sink = MemorySink::new();
    let mut session = session_with(16, stereo(), &sink);
    let mut output = [0u8; 4];

    let outcome = session
        .decode_chunk(&frame(&[1, 2, 3]), &mut output)
        .unwrap();
    assert_eq!(outcome.bytes_written, 4);
    assert_eq!(outcome.bytes_dropped, 2);
    assert!(outcome.has_loss());
    assert_eq!(output, [1, 0, 2, 0]);
    assert!(sink.contains("Warning: no buffer space, loss 2 bytes"));

    let outcome = session.decode_chunk(&frame(&[8]), &mut output).unwrap();
    assert_eq!(outcome.bytes_written, 2);
    assert!(!outcome.has_loss());
    assert_eq!(session.stats().bytes_dropped, 2);
}

/// 声道布局报告只在首帧发出一次
#[test]
fn test_channel_report_emitted_once() {
    let sink = MemorySink::new();
    let mut session = session_with(16, five_one(), &sink);
    let mut output = [0u8; 32];

    assert!(session.awaiting_first_frame());
    session.decode_chunk(&frame(&[1]), &mut output).unwrap();
    session.decode_chunk(&frame(&[2]), &mut output).unwrap();
    assert!(!session.awaiting_first_frame());

    let reports: Vec<String> = sink
        .messages_at(Level::INFO)
        .into_iter()
        .filter(|m| m.starts_with("Config:"))
        .collect();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].contains("Config: 5.1 Ch"));
    assert!(reports[0].contains("mask 0x3F"));
    assert!(reports[0].contains("LFE"));
}

/// 没有样本的块不会触发报告
#[test]
fn test_no_report_without_samples() {
    let sink = MemorySink::new();
    let mut session = session_with(16, stereo(), &sink);
    let mut output = [0u8; 8];

    session.decode_chunk(&[b'F', 3, 0], &mut output).unwrap();
    assert!(session.awaiting_first_frame());
    assert!(sink.messages_at(Level::INFO).is_empty());
}

// ============================================================================
// 窗口行为
// ============================================================================

/// 每次追加只解码一次：垃圾字节逐个跳过，剩余帧在流结束时排空
#[test]
fn test_single_decode_per_append_and_finish_drain() {
    let sink = MemorySink::new();
    let mut session = session_with(64, stereo(), &sink);
    let mut output = [0u8; 16];

    let mut chunk = vec![0x00, 0x01];
    chunk.extend(frame(&[7]));
    let outcome = session.decode_chunk(&chunk, &mut output).unwrap();
    assert_eq!(outcome.bytes_written, 0);
    assert_eq!(session.buffer().held(), 5);

    let outcome = session.finish(&mut output).unwrap();
    assert_eq!(outcome.bytes_written, 2);
    assert_eq!(outcome.frames, 1);
    assert_eq!(&output[..2], &[7, 0]);
    assert!(session.buffer().is_at_eof());
    assert_eq!(session.buffer().held(), 0);
}

/// 流结束排空按输出容量分轮进行，每轮只解码放得下的帧
#[test]
fn test_finish_drains_in_rounds() {
    let sink = MemorySink::new();
    let mut session = session_with(64, stereo(), &sink);
    let mut output = [0u8; 20];

    let mut chunk = Vec::new();
    for i in 0..5i16 {
        chunk.extend(frame(&[i, i, i, i]));
    }
    let outcome = session.decode_chunk(&chunk, &mut output).unwrap();
    assert_eq!(outcome.frames, 1);
    assert_eq!(session.buffer().held(), 40);

    let mut rounds = Vec::new();
    loop {
        let outcome = session.finish(&mut output).unwrap();
        if outcome.frames == 0 {
            break;
        }
        assert!(!outcome.has_loss());
        rounds.push((outcome.frames, outcome.bytes_written));
    }
    log(
        format!("排空轮次: {rounds:?}"),
        format!("drain rounds: {rounds:?}"),
    );

    assert_eq!(rounds, vec![(2, 16), (2, 16)]);
    assert_eq!(session.buffer().held(), 0);
    assert_eq!(session.stats().frames, 5);
    assert_eq!(session.stats().bytes_dropped, 0);
    assert!(sink.messages_at(Level::WARN).is_empty());
}

/// 流结束时的不完整帧保留在窗口中，不报错
#[test]
fn test_finish_stops_on_partial_frame() {
    let sink = MemorySink::new();
    let mut session = session_with(64, stereo(), &sink);
    let mut output = [0u8; 16];

    let mut chunk = frame(&[1]);
    chunk.extend_from_slice(&[b'F', 3, 0]);
    session.decode_chunk(&chunk, &mut output).unwrap();

    let outcome = session.finish(&mut output).unwrap();
    assert_eq!(outcome.bytes_written, 0);
    assert_eq!(session.buffer().held(), 3);
    assert!(sink.contains("3 trailing bytes"));
}

/// 窗口已满且引擎无法前进时报错，而不是空转
#[test]
fn test_stall_is_reported() {
    let sink = MemorySink::new();
    let mut session = session_with(6, stereo(), &sink);
    let mut output = [0u8; 32];

    let result = session.decode_chunk(&frame(&[1, 2, 3, 4, 5]), &mut output);
    assert!(matches!(result, Err(AudioError::DecodingError(_))));
    assert_eq!(session.buffer().held(), 6);
}

// ============================================================================
// 尾部元数据
// ============================================================================

/// ID3v1 标记清空整个窗口，不产生输出也不报错
#[test]
fn test_trailing_id3v1_discarded() {
    let sink = MemorySink::new();
    let mut session = session_with(256, stereo(), &sink);
    let mut output = [0u8; 16];

    session.decode_chunk(&frame(&[5]), &mut output).unwrap();

    let mut tag = b"TAG".to_vec();
    tag.extend_from_slice(&[0u8; 125]);
    let outcome = session.decode_chunk(&tag, &mut output).unwrap();
    assert_eq!(outcome.bytes_written, 0);
    assert_eq!(session.buffer().held(), 0);
    assert_eq!(session.stats().tags_discarded, 1);
    log("ID3v1 标签被丢弃", "ID3v1 tag discarded");
}

/// 与最后一帧同块到达的 APEv2 标签在流结束时被丢弃
#[test]
fn test_trailing_ape_tag_dropped_at_finish() {
    let sink = MemorySink::new();
    let mut session = session_with(256, stereo(), &sink);
    let mut output = [0u8; 16];

    let mut chunk = frame(&[5]);
    chunk.extend_from_slice(b"APETAGEX");
    chunk.extend_from_slice(&[0u8; 24]);
    let outcome = session.decode_chunk(&chunk, &mut output).unwrap();
    assert_eq!(outcome.bytes_written, 2);
    assert_eq!(session.buffer().held(), 32);

    let outcome = session.finish(&mut output).unwrap();
    assert_eq!(outcome.bytes_written, 0);
    assert_eq!(session.buffer().held(), 0);
    assert_eq!(session.stats().tags_discarded, 1);
}

/// 自定义签名列表
#[test]
fn test_custom_signature() {
    let config = SessionConfig {
        buffer_capacity: Some(16),
        tag_signatures: vec![TagSignature::new("custom", b"XX".to_vec())],
    };
    let mut session =
        DecodeSession::with_diagnostics(ScriptedDecoder::new(stereo()), config, Box::new(QuietSink))
            .unwrap();
    let mut output = [0u8; 8];

    // 默认签名已被替换，TAG 不再被识别
    let outcome = session.decode_chunk(b"XXzz", &mut output).unwrap();
    assert_eq!(outcome.bytes_written, 0);
    assert_eq!(session.buffer().held(), 0);
    assert_eq!(session.stats().tags_discarded, 1);
}

// ============================================================================
// 前置条件
// ============================================================================

#[test]
fn test_preconditions() {
    let sink = MemorySink::new();
    let mut session = session_with(16, stereo(), &sink);

    let mut output = [0u8; 8];
    assert!(matches!(
        session.decode_chunk(&[], &mut output),
        Err(AudioError::InvalidInput(_))
    ));
    assert!(matches!(
        session.decode_chunk(&frame(&[1]), &mut []),
        Err(AudioError::InvalidInput(_))
    ));
}

#[test]
fn test_buffer_capacity_must_cover_minimum() {
    let config = SessionConfig {
        buffer_capacity: Some(5),
        ..SessionConfig::default()
    };
    let result =
        DecodeSession::with_diagnostics(ScriptedDecoder::new(stereo()), config, Box::new(QuietSink));
    assert!(matches!(result, Err(AudioError::InvalidInput(_))));

    // 默认容量 = min_stream_size(1) × 6
    let session = DecodeSession::new(ScriptedDecoder::new(stereo()), SessionConfig::default()).unwrap();
    assert_eq!(session.buffer().capacity(), 6);
    assert_eq!(session.bytes_per_sample(), 2);
}
