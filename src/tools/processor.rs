//! 解码处理模块
//!
//! 负责把输入文件按块送进解码会话，并把会话产出的 PCM 交给输出接收端。

use super::cli::AppConfig;
use crate::audio::engine::{FrameDecoder, MAX_CHANNELS, StreamInfo};
use crate::audio::sink::PcmSink;
use crate::audio::stats::DecodeStats;
use crate::audio::symphonia_engine::SymphoniaAdtsEngine;
use crate::core::session::{DecodeSession, SessionConfig};
use crate::error::{AudioError, AudioResult};
use crate::utils::diagnostics::sink_for;
use std::fs::File;
use std::io::{self, BufReader, Read};

/// 单个文件的解码结果
#[derive(Debug)]
pub struct DecodeSummary {
    pub stream: StreamInfo,
    pub engine: &'static str,
    /// 写入输出文件的采样帧数（每声道）
    pub frames_written: u64,
    pub stats: DecodeStats,
    /// 帧解码硬错误（输出已收尾，仍可使用）
    pub decode_error: Option<AudioError>,
}

impl DecodeSummary {
    /// 时长（秒）
    pub fn duration_seconds(&self) -> f64 {
        if self.stream.sample_rate == 0 {
            0.0
        } else {
            self.frames_written as f64 / self.stream.sample_rate as f64
        }
    }
}

/// 读满缓冲区或直到 EOF，返回读到的字节数
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// 把整个输入流按块送入会话
///
/// 每块解码后把写入输出缓冲区的字节交给接收端；输入结束后分轮排空窗口中剩余的完整帧。
/// 帧解码错误立即返回，之前写入接收端的数据保持不变。
pub fn decode_stream<R: Read, D: FrameDecoder>(
    reader: &mut R,
    session: &mut DecodeSession<D>,
    sink: &mut PcmSink,
    chunk_size: usize,
    output_capacity: usize,
) -> AudioResult<()> {
    if chunk_size == 0 || output_capacity == 0 {
        return Err(AudioError::InvalidInput(format!(
            "块大小与输出容量必须大于0 / chunk={chunk_size}, output={output_capacity}"
        )));
    }

    let mut chunk = vec![0u8; chunk_size];
    let mut output = vec![0u8; output_capacity];

    loop {
        let read = read_full(reader, &mut chunk)?;
        if read == 0 {
            break;
        }

        let outcome = session.decode_chunk(&chunk[..read], &mut output)?;
        sink.write_pcm(&output[..outcome.bytes_written])?;

        if read < chunk_size {
            break;
        }
    }

    // 每轮只排空输出缓冲区放得下的帧
    loop {
        let outcome = session.finish(&mut output)?;
        sink.write_pcm(&output[..outcome.bytes_written])?;
        if outcome.frames == 0 {
            break;
        }
    }
    Ok(())
}

/// 解码单个文件：打开 → 探测初始化 → 分块解码 → 输出收尾
///
/// 会话级错误（打开、分配、初始化）直接返回；帧解码错误记录在摘要中，
/// 输出文件依然被正确收尾。
pub fn process_file(config: &AppConfig) -> AudioResult<DecodeSummary> {
    let file = File::open(&config.input_path).map_err(|e| {
        AudioError::IoError(io::Error::new(
            e.kind(),
            format!("无法打开输入 / cannot open {}: {e}", config.input_path.display()),
        ))
    })?;
    let mut reader = BufReader::new(file);

    let mut engine = SymphoniaAdtsEngine::open();
    engine.configure(&config.engine_config())?;

    let mut probe = vec![0u8; engine.min_stream_size() * MAX_CHANNELS];
    let probed = read_full(&mut reader, &mut probe)?;
    if probed == 0 {
        return Err(AudioError::InvalidInput(format!(
            "输入文件为空 / empty input: {}",
            config.input_path.display()
        )));
    }
    probe.truncate(probed);

    let stream = engine.initialize(&probe)?;
    tracing::debug!(
        sample_rate = stream.sample_rate,
        channels = stream.channels,
        "stream initialized"
    );

    let format = engine.output_format();
    let mut sink = if config.is_raw_output() {
        PcmSink::raw(&config.output_path, stream, format)?
    } else {
        PcmSink::wav(&config.output_path, stream, format)?
    };

    let engine_name = engine.name();
    let mut session =
        DecodeSession::with_diagnostics(engine, SessionConfig::default(), sink_for(config.quiet))?;

    // 探测字节也是流的一部分，重新拼回输入前端
    let mut input = probe.as_slice().chain(reader);
    let decode_error = match decode_stream(
        &mut input,
        &mut session,
        &mut sink,
        config.chunk_size,
        config.effective_output_capacity(),
    ) {
        Ok(()) => None,
        Err(e @ AudioError::DecodingError(_)) => Some(e),
        Err(e) => return Err(e),
    };

    let frames_written = sink.finalize()?;

    Ok(DecodeSummary {
        stream,
        engine: engine_name,
        frames_written,
        stats: session.stats().snapshot(),
        decode_error,
    })
}
