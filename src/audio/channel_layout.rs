//! 声道布局报告
//!
//! 首帧解码成功后生成一次声道布局报告。只有标准5.1布局（5个全频声道 + 1个LFE）
//! 会关联 WAVE_FORMAT_EXTENSIBLE 声道掩码，用于提示下游按位置顺序消费时可能需要重排。

use super::engine::ChannelInfo;
use comfy_table::{Cell, CellAlignment, Table, presets::ASCII_FULL};

/// WAVE_FORMAT_EXTENSIBLE 扬声器位
pub mod speaker {
    pub const FRONT_LEFT: u32 = 0x1;
    pub const FRONT_RIGHT: u32 = 0x2;
    pub const FRONT_CENTER: u32 = 0x4;
    pub const LOW_FREQUENCY: u32 = 0x8;
    pub const BACK_LEFT: u32 = 0x10;
    pub const BACK_RIGHT: u32 = 0x20;
    pub const FRONT_LEFT_OF_CENTER: u32 = 0x40;
    pub const FRONT_RIGHT_OF_CENTER: u32 = 0x80;
    pub const BACK_CENTER: u32 = 0x100;
    pub const SIDE_LEFT: u32 = 0x200;
    pub const SIDE_RIGHT: u32 = 0x400;
}

/// 标准5.1掩码：FL FR FC LFE BL BR
pub const MASK_5_1: u32 = speaker::FRONT_LEFT
    | speaker::FRONT_RIGHT
    | speaker::FRONT_CENTER
    | speaker::LOW_FREQUENCY
    | speaker::BACK_LEFT
    | speaker::BACK_RIGHT;

/// 与声道布局关联的掩码；非标准5.1布局返回 `None`
pub fn channel_mask(info: &ChannelInfo) -> Option<u32> {
    if info.channel_count() == 6 && info.lfe_channels == 1 {
        Some(MASK_5_1)
    } else {
        None
    }
}

/// 布局配置描述，如 "5.1" 或 "2"
pub fn config_label(info: &ChannelInfo) -> String {
    if info.lfe_channels > 0 {
        format!(
            "{}.{}",
            info.channel_count().saturating_sub(info.lfe_channels),
            info.lfe_channels
        )
    } else {
        format!("{}", info.channel_count())
    }
}

/// 生成多行声道布局报告
pub fn format_channel_report(info: &ChannelInfo) -> String {
    let mut report = format!("Config: {} Ch", config_label(info));

    if let Some(mask) = channel_mask(info) {
        report.push_str(&format!(
            "\nWARNING: channels are reordered according to MS defaults defined in WAVE_FORMAT_EXTENSIBLE (mask 0x{mask:X})"
        ));
    }

    let mut table = Table::new();
    table.load_preset(ASCII_FULL);
    table.set_header(vec!["Ch", "Position"]);
    for (index, position) in info.positions.iter().enumerate() {
        table.add_row(vec![
            Cell::new(format!("{index:02}")).set_alignment(CellAlignment::Right),
            Cell::new(position.label()),
        ]);
    }

    report.push('\n');
    report.push_str(&table.to_string());
    report
}
