//! hdfsio CLI - Command line interface
//!
//! Runs one filesystem command against a `file://` or `hdfs://` path.

use clap::Parser;
use hdfsio_api::{loader, HadoopFileSystem, Loader};
use hdfsio_config::LogTarget;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use tracing::{warn, Level};

mod commands;
mod config;
mod logging;
mod platform;

use crate::commands::{execute, Command};
use crate::config::{parse_target_level, read_library_config, LogConfig};
use crate::logging::LogFormat;
use crate::platform::print_status;

#[derive(Debug, Parser)]
#[command(
    name = "hdfsio",
    about = "Access file:// and hdfs:// paths through libhdfs",
    version
)]
struct Cli {
    /// Library configuration (JSON); unset fields fall back to the environment
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Default log level
    #[arg(long, global = true, default_value = "warn")]
    log_level: Level,

    /// Per-component level, e.g. `fs=debug` (loader, router, file, fs)
    #[arg(long, global = true, value_name = "COMPONENT=LEVEL", value_parser = parse_target_level)]
    log_target: Vec<(LogTarget, Level)>,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,

    /// Also append logs to this file
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// JSON output for `ls`, `stat` and errors
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn log_config(&self) -> LogConfig {
        let mut log_config = LogConfig::new(self.log_level);
        for (target, level) in &self.log_target {
            log_config.set(*target, *level);
        }
        log_config
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init_with_file(&cli.log_config(), cli.log_format, cli.log_file.as_deref())
    {
        eprintln!("Error: cannot initialise logging: {}", e);
        process::exit(1);
    }

    // The loader must be installed before the first filesystem call
    if let Some(path) = &cli.config {
        let library = match read_library_config(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        };
        if loader::install(Loader::from_config(&library)).is_err() {
            warn!(target: "hdfsio::cli", "loader already initialised, ignoring --config");
        }
    }

    let fs = HadoopFileSystem::new();
    let mut stdout = io::stdout().lock();
    let code = match execute(&cli.command, &fs, cli.json, &mut stdout) {
        Ok(code) => code,
        Err(status) => {
            print_status(&status, cli.json);
            1
        }
    };
    if let Err(e) = stdout.flush() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
    process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::try_parse_from([
            "hdfsio",
            "ls",
            "hdfs://nn/data",
            "-l",
            "--json",
            "--log-level",
            "info",
            "--log-target",
            "fs=trace",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(
            cli.command,
            Command::Ls {
                path: "hdfs://nn/data".into(),
                long: true
            }
        );
        let log_config = cli.log_config();
        assert_eq!(log_config.level_for(LogTarget::Fs), Level::TRACE);
        assert_eq!(log_config.level_for(LogTarget::Router), Level::INFO);
    }

    #[test]
    fn test_parse_put() {
        let cli = Cli::try_parse_from(["hdfsio", "put", "a", "b", "hdfs://nn/out", "--append"])
            .unwrap();
        assert_eq!(
            cli.command,
            Command::Put {
                paths: vec!["a".into(), "b".into(), "hdfs://nn/out".into()],
                append: true
            }
        );
        assert!(Cli::try_parse_from(["hdfsio", "put", "only-one"]).is_err());
    }

    #[test]
    fn test_parse_cat_range() {
        let cli = Cli::try_parse_from([
            "hdfsio", "cat", "file:///tmp/x", "--offset", "4", "--length", "8",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Command::Cat {
                path: "file:///tmp/x".into(),
                offset: 4,
                length: Some(8)
            }
        );
    }

    #[test]
    fn test_parse_rejects_bad_log_target() {
        assert!(Cli::try_parse_from(["hdfsio", "--log-target", "vm=info", "size", "x"]).is_err());
    }
}
