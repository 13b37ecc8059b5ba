//! CLI 配置
//!
//! 包含 CLI 特有的配置：分组件日志级别，以及 `--config` 指定的库配置文件

use hdfsio_config::{LibraryConfig, LogTarget};
use std::path::Path;
use tracing::Level;

/// CLI 日志配置
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub global: Level,
    pub loader: Option<Level>,
    pub router: Option<Level>,
    pub file: Option<Level>,
    pub fs: Option<Level>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new(Level::WARN)
    }
}

impl LogConfig {
    pub fn new(global: Level) -> Self {
        Self {
            global,
            loader: None,
            router: None,
            file: None,
            fs: None,
        }
    }

    /// Override the level of one component
    pub fn set(&mut self, target: LogTarget, level: Level) {
        let slot = match target {
            LogTarget::Loader => &mut self.loader,
            LogTarget::Router => &mut self.router,
            LogTarget::File => &mut self.file,
            LogTarget::Fs => &mut self.fs,
        };
        *slot = Some(level);
    }

    /// Get log level for a specific component
    pub fn level_for(&self, target: LogTarget) -> Level {
        let level = match target {
            LogTarget::Loader => self.loader,
            LogTarget::Router => self.router,
            LogTarget::File => self.file,
            LogTarget::Fs => self.fs,
        };
        level.unwrap_or(self.global)
    }
}

/// Parse a `component=level` override, e.g. `fs=debug`
pub fn parse_target_level(s: &str) -> Result<(LogTarget, Level), String> {
    let (name, level) = s
        .split_once('=')
        .ok_or_else(|| format!("expected COMPONENT=LEVEL, got '{}'", s))?;
    let target = LogTarget::ALL
        .into_iter()
        .find(|t| t.as_str() == name)
        .ok_or_else(|| format!("unknown log component '{}'", name))?;
    let level = level
        .parse::<Level>()
        .map_err(|e| format!("invalid level '{}': {}", level, e))?;
    Ok((target, level))
}

/// Read a `LibraryConfig` JSON file; missing fields fall back to the environment
pub fn read_library_config(path: &Path) -> Result<LibraryConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
    let file: LibraryConfig = serde_json::from_str(&content)
        .map_err(|e| format!("cannot parse '{}': {}", path.display(), e))?;
    let env = LibraryConfig::from_env();
    Ok(LibraryConfig {
        hdfs_home: file.hdfs_home.or(env.hdfs_home),
        ticket_cache_path: file.ticket_cache_path.or(env.ticket_cache_path),
    })
}
