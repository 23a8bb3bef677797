//! 统一错误处理框架
//!
//! 会话级致命错误、块级致命错误的统一类型定义。
//! 缓冲区层面的可恢复情况（未接收字节、输出截断）不走错误通道，而是以返回值和诊断日志体现。

use std::fmt;
use std::io;

/// 解码驱动相关的统一错误类型
#[derive(Debug)]
pub enum AudioError {
    /// 参数或前置条件不满足
    InvalidInput(String),

    /// 文件I/O错误
    IoError(io::Error),

    /// 格式/配置错误（不支持的输出格式、无法识别的流头等）
    FormatError(String),

    /// 帧解码硬错误 - 终止当前输入块
    DecodingError(String),

    /// 解码引擎打开/初始化失败 - 终止整个会话
    InitError(String),

    /// 流缓冲区分配失败 - 终止整个会话
    OutOfMemory,

    /// 输出端资源错误（WAV写入器打开/收尾失败等）
    ResourceError(String),
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioError::InvalidInput(msg) => write!(f, "输入验证失败 / invalid input: {msg}"),
            AudioError::IoError(err) => write!(f, "文件I/O错误 / I/O error: {err}"),
            AudioError::FormatError(msg) => write!(f, "格式错误 / format error: {msg}"),
            AudioError::DecodingError(msg) => write!(f, "帧解码失败 / decode error: {msg}"),
            AudioError::InitError(msg) => {
                write!(f, "解码器初始化失败 / decoder init error: {msg}")
            }
            AudioError::OutOfMemory => write!(f, "内存不足 / out of memory"),
            AudioError::ResourceError(msg) => write!(f, "资源访问错误 / resource error: {msg}"),
        }
    }
}

impl std::error::Error for AudioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AudioError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for AudioError {
    fn from(err: io::Error) -> Self {
        AudioError::IoError(err)
    }
}

impl From<hound::Error> for AudioError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) => AudioError::IoError(e),
            other => AudioError::ResourceError(format!("WAV写入错误: {other}")),
        }
    }
}

impl From<symphonia::core::errors::Error> for AudioError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        use symphonia::core::errors::Error as SymphError;
        match err {
            SymphError::IoError(e) => AudioError::IoError(e),
            SymphError::Unsupported(msg) => AudioError::FormatError(format!("symphonia: {msg}")),
            other => AudioError::DecodingError(format!("symphonia: {other}")),
        }
    }
}

/// 解码驱动操作的标准Result类型
pub type AudioResult<T> = Result<T, AudioError>;

// ==================== 错误转换Helper函数 ====================

/// 创建格式错误的helper函数
#[inline]
pub fn format_error<E: fmt::Display>(context: &str, err: E) -> AudioError {
    AudioError::FormatError(format!("{context}: {err}"))
}

/// 创建解码错误的helper函数
#[inline]
pub fn decoding_error<E: fmt::Display>(context: &str, err: E) -> AudioError {
    AudioError::DecodingError(format!("{context}: {err}"))
}

/// 创建初始化错误的helper函数
#[inline]
pub fn init_error<E: fmt::Display>(context: &str, err: E) -> AudioError {
    AudioError::InitError(format!("{context}: {err}"))
}

// ==================== 错误分类系统 ====================

/// 错误类别枚举（用于退出码映射和显示）
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum ErrorCategory {
    /// 会话级致命错误（打开/分配/初始化失败）
    Session,
    /// 块级致命错误（帧解码硬错误）
    Decoding,
    /// 参数或格式错误
    Usage,
}

impl ErrorCategory {
    /// 从AudioError提取错误类别
    pub fn from_audio_error(e: &AudioError) -> Self {
        match e {
            AudioError::DecodingError(_) => Self::Decoding,
            AudioError::InvalidInput(_) | AudioError::FormatError(_) => Self::Usage,
            AudioError::IoError(_)
            | AudioError::InitError(_)
            | AudioError::OutOfMemory
            | AudioError::ResourceError(_) => Self::Session,
        }
    }

    /// 获取错误类别的显示名称
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Session => "会话错误 / session error",
            Self::Decoding => "解码错误 / decode error",
            Self::Usage => "参数错误 / usage error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_mapping() {
        assert_eq!(
            ErrorCategory::from_audio_error(&AudioError::DecodingError("x".into())),
            ErrorCategory::Decoding
        );
        assert_eq!(
            ErrorCategory::from_audio_error(&AudioError::OutOfMemory),
            ErrorCategory::Session
        );
        assert_eq!(
            ErrorCategory::from_audio_error(&init_error("open", "boom")),
            ErrorCategory::Session
        );
        assert_eq!(
            ErrorCategory::from_audio_error(&format_error("fmt", 24)),
            ErrorCategory::Usage
        );
    }

    #[test]
    fn test_symphonia_error_mapping() {
        use symphonia::core::errors::Error as SymphError;
        let err: AudioError = SymphError::Unsupported("aac: main profile").into();
        assert!(matches!(err, AudioError::FormatError(ref msg) if msg.contains("main profile")));
        let err: AudioError = SymphError::DecodeError("bad huffman").into();
        assert!(matches!(err, AudioError::DecodingError(_)));
    }

    #[test]
    fn test_io_error_keeps_source() {
        let err: AudioError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("missing"));
    }
}
