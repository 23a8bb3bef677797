//! 尾部元数据标记过滤
//!
//! 检查窗口开头是否为已知的尾部元数据签名（ID3v1、APEv2、Lyrics3），
//! 命中即丢弃整个窗口。这些标记只会出现在流的真实结尾，因此不尝试跳过，
//! 而是直接清空。这是启发式检查，不是解析器。

use super::stream_buffer::StreamBuffer;
use std::borrow::Cow;

/// 一条尾部元数据签名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSignature {
    pub name: Cow<'static, str>,
    pub bytes: Cow<'static, [u8]>,
}

impl TagSignature {
    pub const fn from_static(name: &'static str, bytes: &'static [u8]) -> Self {
        Self {
            name: Cow::Borrowed(name),
            bytes: Cow::Borrowed(bytes),
        }
    }

    /// 自定义签名
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            bytes: Cow::Owned(bytes.into()),
        }
    }

    /// 窗口持有量必须严格大于签名长度才参与比较
    #[inline]
    pub fn matches(&self, window: &[u8]) -> bool {
        !self.bytes.is_empty() && window.len() > self.bytes.len() && window.starts_with(&self.bytes)
    }
}

/// ID3v1 标签
pub const ID3V1: TagSignature = TagSignature::from_static("ID3v1", b"TAG");
/// APEv2 标签
pub const APEV2: TagSignature = TagSignature::from_static("APEv2", b"APETAGEX");
/// Lyrics3 块
pub const LYRICS3: TagSignature = TagSignature::from_static("Lyrics3", b"LYRICSBEGIN");

/// 按顺序匹配的签名列表，首个命中者生效
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFilter {
    signatures: Vec<TagSignature>,
}

impl Default for TagFilter {
    fn default() -> Self {
        Self::new(default_signatures())
    }
}

/// 默认签名顺序：3字节、8字节、11字节
pub fn default_signatures() -> Vec<TagSignature> {
    vec![ID3V1, APEV2, LYRICS3]
}

impl TagFilter {
    pub fn new(signatures: Vec<TagSignature>) -> Self {
        Self { signatures }
    }

    /// 追加一条签名（排在已有签名之后）
    pub fn with_signature(mut self, signature: TagSignature) -> Self {
        self.signatures.push(signature);
        self
    }

    pub fn signatures(&self) -> &[TagSignature] {
        &self.signatures
    }

    /// 只检查，不修改窗口
    pub fn detect(&self, window: &[u8]) -> Option<&TagSignature> {
        self.signatures.iter().find(|sig| sig.matches(window))
    }

    /// 检查窗口开头，命中则清空整个窗口并返回命中的签名
    pub fn scan_and_invalidate(&self, buffer: &mut StreamBuffer) -> Option<&TagSignature> {
        let hit = self.detect(buffer.data())?;
        buffer.invalidate();
        Some(hit)
    }
}
