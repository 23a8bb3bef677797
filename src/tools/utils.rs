//! 工具函数模块
//!
//! 文件路径处理等通用工具函数。

/// 文件路径处理工具函数
pub mod path {
    use std::path::Path;

    /// 提取文件名（返回String，用于日志显示）
    #[inline]
    pub fn extract_filename_lossy(path: &Path) -> String {
        path.file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }

    /// 输出路径是否要求原始 PCM（扩展名 .pcm / .raw）
    #[inline]
    pub fn has_raw_extension(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pcm") || ext.eq_ignore_ascii_case("raw"))
    }
}

/// 以字节为单位的人类可读大小
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.2} {}", UNITS[unit])
    }
}

pub use path::{extract_filename_lossy, has_raw_extension};

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_raw_extension() {
        assert!(has_raw_extension(Path::new("out.PCM")));
        assert!(has_raw_extension(Path::new("/tmp/x.raw")));
        assert!(!has_raw_extension(Path::new("out.wav")));
        assert!(!has_raw_extension(Path::new("out")));
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.00 KiB");
        assert_eq!(extract_filename_lossy(Path::new("/a/b/c.aac")), "c.aac");
    }
}
