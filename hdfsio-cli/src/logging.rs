//! CLI 日志系统初始化
//!
//! 基于 `tracing-subscriber` 实现分组件日志控制。
//! 日志写到 stderr，stdout 只留给命令输出（例如 `cat`）。

use crate::config::LogConfig;
use hdfsio_config::LogTarget;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::{
    filter::Targets,
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    Layer, Registry,
};

/// 日志输出格式
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// 彩色格式化（开发使用）
    Pretty,
    /// 紧凑格式
    Compact,
    /// JSON 格式（工具集成）
    Json,
}

/// Build the per-component filter
pub fn targets(log_config: &LogConfig) -> Targets {
    LogTarget::ALL
        .into_iter()
        .fold(Targets::new().with_default(log_config.global), |targets, t| {
            targets.with_target(t.target(), log_config.level_for(t))
        })
        .with_target("hdfsio::cli", log_config.global)
}

/// 使用指定格式和日志配置初始化日志系统
///
/// With a file, events go to both stderr and the file (appended).
pub fn init_with_file(
    log_config: &LogConfig,
    format: LogFormat,
    file: Option<&Path>,
) -> io::Result<()> {
    let targets = targets(log_config);

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = vec![
        create_format_layer::<Registry, _>(format, io::stderr)
            .with_filter(targets.clone())
            .boxed(),
    ];
    if let Some(path) = file {
        let handle = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        layers.push(
            create_format_layer::<Registry, _>(format, Mutex::new(handle))
                .with_filter(targets)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(io::Error::other)
}

/// Create formatter layer based on format
fn create_format_layer<S, W>(format: LogFormat, make_writer: W) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .without_time()
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_writer(make_writer)
            .boxed(),
    }
}
