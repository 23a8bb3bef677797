//! 诊断输出能力
//!
//! 会话在构造时注入一个 [`DiagnosticSink`]，所有诊断信息（截断警告、帧错误、声道布局报告）
//! 都经由它发出。静默模式即注入 [`QuietSink`]，不存在进程级的全局开关。

use std::sync::{Arc, Mutex};
use tracing::Level;

/// 诊断信息接收端
pub trait DiagnosticSink {
    /// 发出一条诊断信息
    fn emit(&self, level: Level, message: &str);
}

/// 转发到 `tracing` 的默认接收端
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, level: Level, message: &str) {
        if level == Level::ERROR {
            tracing::error!("{message}");
        } else if level == Level::WARN {
            tracing::warn!("{message}");
        } else if level == Level::INFO {
            tracing::info!("{message}");
        } else if level == Level::DEBUG {
            tracing::debug!("{message}");
        } else {
            tracing::trace!("{message}");
        }
    }
}

/// 静默接收端：丢弃所有诊断信息
#[derive(Debug, Default, Clone, Copy)]
pub struct QuietSink;

impl DiagnosticSink for QuietSink {
    fn emit(&self, _level: Level, _message: &str) {}
}

/// 记录型接收端：把诊断信息保存在内存里，便于调用方事后检查
///
/// 克隆体共享同一份记录。
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<(Level, String)>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已记录的全部诊断信息（按发出顺序）
    pub fn records(&self) -> Vec<(Level, String)> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// 指定级别的诊断信息
    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, msg)| msg)
            .collect()
    }

    /// 是否有任意一条信息包含给定片段
    pub fn contains(&self, needle: &str) -> bool {
        self.records().iter().any(|(_, msg)| msg.contains(needle))
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, level: Level, message: &str) {
        if let Ok(mut records) = self.records.lock() {
            records.push((level, message.to_string()));
        }
    }
}

/// 按静默开关选择接收端
pub fn sink_for(quiet: bool) -> Box<dyn DiagnosticSink> {
    if quiet {
        Box::new(QuietSink)
    } else {
        Box::new(TracingSink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_shares_records_between_clones() {
        let sink = MemorySink::new();
        let clone = sink.clone();
        clone.emit(Level::WARN, "loss 12 bytes");
        sink.emit(Level::INFO, "hello");

        assert_eq!(sink.records().len(), 2);
        assert_eq!(sink.messages_at(Level::WARN), vec!["loss 12 bytes".to_string()]);
        assert!(clone.contains("hello"));
    }

    #[test]
    fn test_quiet_sink_drops_everything() {
        let sink = sink_for(true);
        // 只要不panic即可
        sink.emit(Level::ERROR, "ignored");
    }
}
