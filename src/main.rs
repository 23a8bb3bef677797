//! AAC Stream Decoder - 主程序入口
//!
//! 纯流程控制器：解析参数、安装日志、调用处理流程并映射退出码。

use aac_stream_decoder::{
    error::{AudioError, ErrorCategory},
    tools::{self, AppConfig, DecodeSummary, constants::exit_codes},
};
use std::process;
use tracing_subscriber::EnvFilter;

/// 获取错误建议文本
fn get_error_suggestion(error: &AudioError) -> &'static str {
    match ErrorCategory::from_audio_error(error) {
        ErrorCategory::Usage => {
            "检查命令行参数是否正确，使用 --help 查看完整用法 / Check command-line arguments, use --help for usage"
        }
        ErrorCategory::Decoding => {
            "文件可能损坏或不是 ADTS 封装的 AAC / File may be corrupted or not ADTS-framed AAC"
        }
        ErrorCategory::Session => {
            "检查文件路径是否正确，输入可读且输出可写 / Check that the input is readable and the output writable"
        }
    }
}

/// 错误处理和建议
fn handle_error(error: AudioError) -> ! {
    let category = ErrorCategory::from_audio_error(&error);
    eprintln!("[ERROR] 错误 / Error: {error}");
    eprintln!("[INFO] 类别 / Category: {}", category.display_name());
    eprintln!("[INFO] 建议 / Suggestion: {}", get_error_suggestion(&error));

    let exit_code = match category {
        ErrorCategory::Decoding => exit_codes::DECODING_ERROR,
        ErrorCategory::Session | ErrorCategory::Usage => exit_codes::GENERAL_ERROR,
    };
    process::exit(exit_code);
}

/// 安装 tracing 订阅者：输出到 stderr，`RUST_LOG` 优先
fn init_logging(config: &AppConfig) {
    let default_level = if config.quiet {
        "off"
    } else if config.verbose {
        "debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// 处理摘要：打印、写统计，帧解码错误按退出策略返回
fn report(config: &AppConfig, summary: DecodeSummary) -> Result<(), AudioError> {
    tools::show_summary(config, &summary);

    if let Some(path) = &config.stats_path {
        tools::write_stats_json(path, config, &summary)?;
    }

    match summary.decode_error {
        Some(error) if !config.exit_zero_on_decode_error => Err(error),
        _ => Ok(()),
    }
}

/// 应用程序主逻辑
fn run(config: &AppConfig) -> Result<(), AudioError> {
    tools::show_startup_info(config);

    let summary = tools::process_file(config)?;
    report(config, summary)?;

    tools::show_completion_info(config);
    Ok(())
}

fn main() {
    let config = tools::parse_args();
    init_logging(&config);

    if let Err(error) = run(&config) {
        handle_error(error);
    }
}
