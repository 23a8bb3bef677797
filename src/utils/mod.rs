//! 通用工具模块

pub mod diagnostics;

pub use diagnostics::{DiagnosticSink, MemorySink, QuietSink, TracingSink, sink_for};
