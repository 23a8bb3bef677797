//! ADTS 帧头读取
//!
//! 只负责分帧：定位同步字、读取固定头/可变头字段、取出原始数据块。
//! 比特流本身交给 symphonia 的 AAC 解码器。
//!
//! 旧式帧头在固定头末尾多出2位 emphasis，导致原始数据块不再按字节对齐，
//! 取数据时经 symphonia 的位读取器重新对齐。

use super::engine::ObjectType;
use std::io;
use symphonia::core::io::{BitReaderLtr, ReadBitsLtr};

/// ADTS 采样率索引表
pub const SAMPLE_RATES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

/// 解析出的帧头
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdtsHeader {
    /// 0 = MPEG-4, 1 = MPEG-2
    pub mpeg_version: u8,
    pub protection_absent: bool,
    /// profile 字段（对象类型 - 1）
    pub profile: u8,
    pub sample_rate_index: u8,
    pub channel_config: u8,
    /// 整帧长度（含帧头）
    pub frame_length: usize,
    pub raw_data_blocks: u8,
    /// 帧头总比特数（含CRC）
    pub header_bits: usize,
}

impl AdtsHeader {
    /// 采样率；保留索引返回 `None`
    pub fn sample_rate(&self) -> Option<u32> {
        SAMPLE_RATES.get(self.sample_rate_index as usize).copied()
    }

    pub fn object_type(&self) -> ObjectType {
        ObjectType::from_adts_profile(self.profile)
    }
}

/// 帧头读取结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderScan {
    /// 视图开头就是合法帧头
    Frame(AdtsHeader),
    /// 开头不是同步字；给出下一个候选同步字的位置（没有则为视图长度减一）
    Resync(usize),
    /// 数据不足以判断
    Incomplete,
}

/// 每声道每个原始数据块的最大字节数（6144 位）
pub const MAX_BLOCK_BYTES_PER_CHANNEL: usize = 768;

#[inline]
fn is_sync(data: &[u8], at: usize) -> bool {
    at + 1 < data.len() && data[at] == 0xFF && (data[at + 1] & 0xF6) == 0xF0
}

/// 从 `from` 开始查找下一个候选同步字；找不到时保留最后一个字节
fn next_sync(data: &[u8], from: usize) -> usize {
    (from..data.len())
        .find(|&at| is_sync(data, at))
        .unwrap_or(data.len() - 1)
        .max(1)
}

/// 读取固定头与可变头（不含CRC）
fn read_header<B: ReadBitsLtr>(bs: &mut B, legacy: bool) -> io::Result<AdtsHeader> {
    bs.ignore_bits(12)?;
    let mpeg_version = bs.read_bit()? as u8;
    // layer
    bs.ignore_bits(2)?;
    let protection_absent = bs.read_bool()?;
    let profile = bs.read_bits_leq32(2)? as u8;
    let sample_rate_index = bs.read_bits_leq32(4)? as u8;
    // private_bit
    bs.ignore_bits(1)?;
    let channel_config = bs.read_bits_leq32(3)? as u8;
    // original_copy, home，旧式帧头另有2位 emphasis
    bs.ignore_bits(if legacy { 4 } else { 2 })?;
    // copyright_identification_bit/start
    bs.ignore_bits(2)?;
    let frame_length = bs.read_bits_leq32(13)? as usize;
    // adts_buffer_fullness
    bs.ignore_bits(11)?;
    let raw_data_blocks = bs.read_bits_leq32(2)? as u8;

    let fixed_bits: usize = if legacy { 58 } else { 56 };
    Ok(AdtsHeader {
        mpeg_version,
        protection_absent,
        profile,
        sample_rate_index,
        channel_config,
        frame_length,
        raw_data_blocks,
        header_bits: fixed_bits + if protection_absent { 0 } else { 16 },
    })
}

/// 帧头声明的声道与数据块数所允许的最大帧长
fn max_frame_length(header: &AdtsHeader) -> usize {
    // PCE 声道配置按最多8声道计
    let channels = match header.channel_config {
        0 | 7 => 8,
        n => n as usize,
    };
    header.header_bits.div_ceil(8)
        + MAX_BLOCK_BYTES_PER_CHANNEL * channels * (header.raw_data_blocks as usize + 1)
}

/// 在视图开头读取帧头
///
/// 帧长放不下帧头，或超过声道数允许的上限时，视为伪同步字并重新同步。
pub fn scan_header(data: &[u8], legacy: bool) -> HeaderScan {
    if data.len() < 2 {
        return HeaderScan::Incomplete;
    }
    if !is_sync(data, 0) {
        return HeaderScan::Resync(next_sync(data, 1));
    }

    let fixed_bits: usize = if legacy { 58 } else { 56 };
    let needed = fixed_bits.div_ceil(8);
    if data.len() < needed {
        return HeaderScan::Incomplete;
    }

    let mut bs = BitReaderLtr::new(&data[..needed]);
    let Ok(header) = read_header(&mut bs, legacy) else {
        return HeaderScan::Incomplete;
    };

    if header.frame_length * 8 <= header.header_bits
        || header.frame_length > max_frame_length(&header)
    {
        return HeaderScan::Resync(next_sync(data, 1));
    }

    HeaderScan::Frame(header)
}

/// 取出帧的原始数据块（去掉帧头与CRC），必要时重新按字节对齐
///
/// 非对齐时末尾不足8位的余位被丢弃。
pub fn frame_payload(frame: &[u8], header: &AdtsHeader) -> io::Result<Vec<u8>> {
    let start_bit = header.header_bits;
    if start_bit % 8 == 0 {
        return frame.get(start_bit / 8..).map(<[u8]>::to_vec).ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "frame shorter than its header")
        });
    }

    let whole_bytes = (frame.len() * 8).saturating_sub(start_bit) / 8;
    let mut bs = BitReaderLtr::new(frame);
    bs.ignore_bits(start_bit as u32)?;
    (0..whole_bytes)
        .map(|_| bs.read_bits_leq32(8).map(|byte| byte as u8))
        .collect()
}

/// 由帧头（或对象类型提示）构造 AudioSpecificConfig
///
/// 采样率索引无效时写入显式24位采样率。
pub fn audio_specific_config(
    object_type: ObjectType,
    sample_rate_index: Option<u8>,
    sample_rate: u32,
    channel_config: u8,
) -> Vec<u8> {
    let aot = object_type.audio_object_type() as u64;
    let mut bits: u64 = aot;
    let mut len: usize = 5;

    match sample_rate_index {
        Some(index) => {
            bits = (bits << 4) | index as u64;
            len += 4;
        }
        None => {
            bits = (bits << 4) | 0x0F;
            bits = (bits << 24) | (sample_rate as u64 & 0x00FF_FFFF);
            len += 28;
        }
    }

    // channelConfiguration + GASpecificConfig(frameLengthFlag, dependsOnCoreCoder, extensionFlag)
    bits = (bits << 4) | (channel_config as u64 & 0x0F);
    bits <<= 3;
    len += 7;

    let total_bytes = len.div_ceil(8);
    bits <<= total_bytes * 8 - len;
    (0..total_bytes)
        .rev()
        .map(|i| ((bits >> (i * 8)) & 0xFF) as u8)
        .collect()
}
