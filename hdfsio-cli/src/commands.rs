//! Subcommands
//!
//! Every command runs against a `HadoopFileSystem` and writes its output to
//! the given writer; the returned value is the process exit code.

use clap::Subcommand;
use hdfsio_api::{Code, FileInfo, HadoopFileSystem, Result, Status};
use hdfsio_core::{basename, io_error, parse_uri};
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use tracing::info;

/// Largest single read issued by `cat`
const CAT_CHUNK: usize = 1 << 20;

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// List a directory
    Ls {
        path: String,
        /// Show kind, permissions, owner, size and mtime
        #[arg(short = 'l', long)]
        long: bool,
    },
    /// Show length, mtime and kind of a path
    Stat { path: String },
    /// Exit with 0 when the path exists, 1 otherwise
    Test { path: String },
    /// Print the length of a file in bytes
    Size { path: String },
    /// Write a file (or a byte range of it) to stdout
    Cat {
        path: String,
        #[arg(long, default_value_t = 0)]
        offset: u64,
        /// Bytes to read; defaults to the rest of the file
        #[arg(long)]
        length: Option<u64>,
    },
    /// Append local files as records to a remote file
    Put {
        /// Local files followed by the destination
        #[arg(required = true, num_args = 2.., value_name = "PATH")]
        paths: Vec<String>,
        /// Append to an existing file instead of truncating it
        #[arg(long)]
        append: bool,
    },
    /// Create a directory and its missing parents
    Mkdir { path: String },
    /// Delete an empty directory
    Rmdir { path: String },
    /// Delete a file
    Rm { path: String },
    /// Rename, replacing an existing target
    Mv { src: String, dst: String },
    /// Copy a remote path to the local filesystem
    Get { src: String, dst: String },
    /// Copy a local path to the remote filesystem
    CopyFromLocal { src: String, dst: String },
    /// Move a remote path to the local filesystem
    MoveToLocal { src: String, dst: String },
    /// Move a local path to the remote filesystem
    MoveFromLocal { src: String, dst: String },
}

/// `ls --json` row
#[derive(Debug, Serialize)]
struct Entry<'a> {
    name: &'a str,
    kind: &'static str,
    size: i64,
    modified: i64,
    accessed: i64,
    replication: i16,
    block_size: i64,
    owner: &'a str,
    group: &'a str,
    permissions: String,
}

impl<'a> From<&'a FileInfo> for Entry<'a> {
    fn from(info: &'a FileInfo) -> Self {
        Entry {
            name: &info.name,
            kind: if info.is_directory() { "directory" } else { "file" },
            size: info.size,
            modified: info.last_mod,
            accessed: info.last_access,
            replication: info.replication,
            block_size: info.block_size,
            owner: &info.owner,
            group: &info.group,
            permissions: format!("{:o}", info.permissions),
        }
    }
}

fn output_error(e: io::Error) -> Status {
    io_error("stdout", e.raw_os_error().unwrap_or(0))
}

fn json_error(e: serde_json::Error) -> Status {
    Status::internal(format!("cannot encode JSON: {}", e))
}

/// `rwxr-xr-x` for the low nine permission bits
fn mode_string(permissions: i16) -> String {
    let bits = permissions as u16;
    (0..9)
        .map(|i| {
            let set = bits & (0o400 >> i) != 0;
            match (set, i % 3) {
                (false, _) => '-',
                (true, 0) => 'r',
                (true, 1) => 'w',
                (true, _) => 'x',
            }
        })
        .collect()
}

fn long_line(info: &FileInfo) -> String {
    format!(
        "{}{} {:>3} {:<10} {:<10} {:>12} {:>10} {}",
        if info.is_directory() { 'd' } else { '-' },
        mode_string(info.permissions),
        info.replication,
        info.owner,
        info.group,
        info.size,
        info.last_mod,
        basename(&info.name),
    )
}

/// Turn a plain local path into a `file://` URI; URIs pass through
pub fn local_uri(arg: &str) -> String {
    if !parse_uri(arg).scheme.is_empty() {
        return arg.to_string();
    }
    let path = Path::new(arg);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    format!("file://{}", absolute.display())
}

/// Run one command
pub fn execute(
    command: &Command,
    fs: &HadoopFileSystem,
    json: bool,
    out: &mut dyn Write,
) -> Result<i32> {
    match command {
        Command::Ls { path, long } => {
            if json {
                let entries = fs.list_status(path)?;
                let rows: Vec<Entry<'_>> = entries.iter().map(Entry::from).collect();
                serde_json::to_writer_pretty(&mut *out, &rows).map_err(json_error)?;
                writeln!(out).map_err(output_error)?;
            } else if *long {
                for info in fs.list_status(path)? {
                    writeln!(out, "{}", long_line(&info)).map_err(output_error)?;
                }
            } else {
                for name in fs.get_children(path)? {
                    writeln!(out, "{}", name).map_err(output_error)?;
                }
            }
        }
        Command::Stat { path } => {
            let stats = fs.stat(path)?;
            if json {
                serde_json::to_writer_pretty(&mut *out, &stats).map_err(json_error)?;
                writeln!(out).map_err(output_error)?;
            } else {
                writeln!(
                    out,
                    "length: {}\nmtime_nanos: {}\nis_directory: {}",
                    stats.length, stats.mtime_nanos, stats.is_directory
                )
                .map_err(output_error)?;
            }
        }
        Command::Test { path } => {
            return match fs.file_exists(path) {
                Ok(()) => Ok(0),
                Err(status) if status.code() == Code::NotFound => Ok(1),
                Err(status) => Err(status),
            };
        }
        Command::Size { path } => {
            writeln!(out, "{}", fs.get_file_size(path)?).map_err(output_error)?;
        }
        Command::Cat {
            path,
            offset,
            length,
        } => cat(fs, path, *offset, *length, out)?,
        Command::Put { paths, append } => put(fs, paths, *append, out)?,
        Command::Mkdir { path } => fs.create_dir(path)?,
        Command::Rmdir { path } => fs.delete_dir(path)?,
        Command::Rm { path } => fs.delete_file(path)?,
        Command::Mv { src, dst } => fs.rename_file(src, dst)?,
        Command::Get { src, dst } => fs.copy_to_local(src, &local_uri(dst))?,
        Command::CopyFromLocal { src, dst } => fs.copy_to_remote(&local_uri(src), dst)?,
        Command::MoveToLocal { src, dst } => fs.move_to_local(src, &local_uri(dst))?,
        Command::MoveFromLocal { src, dst } => fs.move_to_remote(&local_uri(src), dst)?,
    }
    Ok(0)
}

fn cat(
    fs: &HadoopFileSystem,
    path: &str,
    offset: u64,
    length: Option<u64>,
    out: &mut dyn Write,
) -> Result<()> {
    let file = fs.new_random_access_file(path)?;
    let length = match length {
        Some(n) => n,
        None => fs.get_file_size(path)?.saturating_sub(offset),
    };
    let mut scratch = vec![0u8; usize::try_from(length).unwrap_or(usize::MAX).min(CAT_CHUNK)];
    let mut done = 0u64;
    while done < length {
        let n = (length - done).min(scratch.len() as u64) as usize;
        let data = file.read(offset + done, n, &mut scratch)?;
        out.write_all(data).map_err(output_error)?;
        done += n as u64;
    }
    Ok(())
}

fn put(fs: &HadoopFileSystem, paths: &[String], append: bool, out: &mut dyn Write) -> Result<()> {
    let (dest, sources) = match paths.split_last() {
        Some((dest, sources)) if !sources.is_empty() => (dest, sources),
        _ => {
            return Err(Status::invalid_argument(
                "put needs at least one local file and a destination",
            ))
        }
    };

    let mut file = if append {
        fs.new_appendable_file(dest)?
    } else {
        fs.new_writable_file(dest)?
    };
    let mut lengths = Vec::with_capacity(sources.len());
    for source in sources {
        let data = std::fs::read(source)
            .map_err(|e| io_error(source, e.raw_os_error().unwrap_or(0)))?;
        file.append(&data)?;
        lengths.push(data.len());
    }
    file.close()?;

    info!(target: "hdfsio::cli", records = lengths.len(), dest = %dest, "put complete");
    writeln!(out, "Wrote {} records to {}", lengths.len(), dest).map_err(output_error)?;
    if let Some(first) = lengths.first() {
        if lengths.iter().all(|len| len == first) {
            writeln!(out, "Record length: {} bytes", first).map_err(output_error)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hdfsio_api::{Loader, MemoryClient};
    use std::sync::Arc;

    fn setup() -> (MemoryClient, HadoopFileSystem) {
        let client = MemoryClient::new();
        let loader = Loader::with_client(Arc::new(client.clone()));
        (client, HadoopFileSystem::with_loader(Arc::new(loader)))
    }

    fn run(fs: &HadoopFileSystem, command: Command, json: bool) -> (Result<i32>, String) {
        let mut out = Vec::new();
        let result = execute(&command, fs, json, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_mode_string() {
        assert_eq!(mode_string(0o755), "rwxr-xr-x");
        assert_eq!(mode_string(0o640), "rw-r-----");
        assert_eq!(mode_string(0), "---------");
    }

    #[test]
    fn test_local_uri() {
        assert_eq!(local_uri("file:///tmp/x"), "file:///tmp/x");
        assert_eq!(local_uri("hdfs://nn/x"), "hdfs://nn/x");
        assert_eq!(local_uri("/tmp/x"), "file:///tmp/x");
        let relative = local_uri("data/x");
        assert!(relative.starts_with("file:///"));
        assert!(relative.ends_with("/data/x"));
    }

    #[test]
    fn test_ls_names_and_json() {
        let (client, fs) = setup();
        client.put_file(Some("nn"), "/d/a", b"1");
        client.put_dir(Some("nn"), "/d/sub");

        let (result, out) = run(&fs, Command::Ls { path: "hdfs://nn/d".into(), long: false }, false);
        assert_eq!(result.unwrap(), 0);
        assert_eq!(out, "a\nsub\n");

        let (_, out) = run(&fs, Command::Ls { path: "hdfs://nn/d".into(), long: true }, false);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('-') && lines[0].ends_with(" a"));
        assert!(lines[1].starts_with('d') && lines[1].ends_with(" sub"));

        let (_, out) = run(&fs, Command::Ls { path: "hdfs://nn/d".into(), long: false }, true);
        let rows: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(rows[0]["kind"], "file");
        assert_eq!(rows[0]["size"], 1);
        assert_eq!(rows[1]["kind"], "directory");
    }

    #[test]
    fn test_ls_empty_directory() {
        let (client, fs) = setup();
        client.put_dir(Some("nn"), "/empty");
        let (result, out) = run(&fs, Command::Ls { path: "hdfs://nn/empty".into(), long: false }, false);
        assert_eq!(result.unwrap(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_stat_and_size() {
        let (client, fs) = setup();
        client.set_clock(7);
        client.put_file(Some("nn"), "/f", b"hello");

        let (_, out) = run(&fs, Command::Size { path: "hdfs://nn/f".into() }, false);
        assert_eq!(out, "5\n");

        let (_, out) = run(&fs, Command::Stat { path: "hdfs://nn/f".into() }, false);
        assert_eq!(out, "length: 5\nmtime_nanos: 7000000000\nis_directory: false\n");

        let (_, out) = run(&fs, Command::Stat { path: "hdfs://nn/f".into() }, true);
        let stats: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(stats["length"], 5);
        assert_eq!(stats["is_directory"], false);
    }

    #[test]
    fn test_test_exit_codes() {
        let (client, fs) = setup();
        client.put_file(Some("nn"), "/f", b"");
        let (result, _) = run(&fs, Command::Test { path: "hdfs://nn/f".into() }, false);
        assert_eq!(result.unwrap(), 0);
        let (result, _) = run(&fs, Command::Test { path: "hdfs://nn/g".into() }, false);
        assert_eq!(result.unwrap(), 1);
        let (result, _) = run(&fs, Command::Test { path: "s3://b/g".into() }, false);
        assert_eq!(result.unwrap_err().code(), Code::InvalidArgument);
    }

    #[test]
    fn test_cat_whole_file_and_range() {
        let (client, fs) = setup();
        client.put_file(Some("nn"), "/f", b"0123456789");

        let cat = |offset, length| Command::Cat { path: "hdfs://nn/f".into(), offset, length };
        assert_eq!(run(&fs, cat(0, None), false).1, "0123456789");
        assert_eq!(run(&fs, cat(4, None), false).1, "456789");
        assert_eq!(run(&fs, cat(2, Some(3)), false).1, "234");

        let (result, _) = run(&fs, cat(8, Some(5)), false);
        assert_eq!(result.unwrap_err().code(), Code::OutOfRange);
    }

    #[test]
    fn test_put_records() {
        let (client, fs) = setup();
        let dir = tempfile::tempdir().unwrap();
        let mut paths = Vec::new();
        for i in 0..3 {
            let path = dir.path().join(format!("rec{}", i));
            std::fs::write(&path, format!("record-{}", i)).unwrap();
            paths.push(path.display().to_string());
        }
        paths.push("hdfs://nn/out/data".into());

        let (result, out) = run(&fs, Command::Put { paths: paths.clone(), append: false }, false);
        assert_eq!(result.unwrap(), 0);
        assert_eq!(out, "Wrote 3 records to hdfs://nn/out/data\nRecord length: 8 bytes\n");
        assert_eq!(
            client.read_file(Some("nn"), "/out/data").unwrap(),
            b"record-0record-1record-2"
        );

        let (result, _) = run(&fs, Command::Put { paths, append: true }, false);
        assert_eq!(result.unwrap(), 0);
        assert_eq!(client.read_file(Some("nn"), "/out/data").unwrap().len(), 48);
        assert_eq!(client.open_files(), 0);
    }

    #[test]
    fn test_put_mixed_lengths_and_missing_source() {
        let (client, fs) = setup();
        let dir = tempfile::tempdir().unwrap();
        let short = dir.path().join("short");
        let long = dir.path().join("long");
        std::fs::write(&short, b"ab").unwrap();
        std::fs::write(&long, b"abcdef").unwrap();

        let paths = vec![
            short.display().to_string(),
            long.display().to_string(),
            "hdfs://nn/mixed".to_string(),
        ];
        let (_, out) = run(&fs, Command::Put { paths, append: false }, false);
        assert_eq!(out, "Wrote 2 records to hdfs://nn/mixed\n");

        let missing = dir.path().join("missing").display().to_string();
        let paths = vec![missing, "hdfs://nn/x".to_string()];
        let (result, _) = run(&fs, Command::Put { paths, append: false }, false);
        assert_eq!(result.unwrap_err().code(), Code::NotFound);
        assert_eq!(client.open_files(), 0);
    }

    #[test]
    fn test_namespace_commands() {
        let (client, fs) = setup();
        let ok = |command| run(&fs, command, false).0.unwrap();

        ok(Command::Mkdir { path: "hdfs://nn/a/b".into() });
        assert!(client.is_dir(Some("nn"), "/a/b"));

        client.put_file(Some("nn"), "/a/f", b"data");
        ok(Command::Mv { src: "hdfs://nn/a/f".into(), dst: "hdfs://nn/a/g".into() });
        assert_eq!(client.read_file(Some("nn"), "/a/g").unwrap(), b"data");

        ok(Command::Get { src: "hdfs://nn/a/g".into(), dst: "/local/g".into() });
        assert_eq!(client.read_file(None, "/local/g").unwrap(), b"data");

        ok(Command::CopyFromLocal { src: "/local/g".into(), dst: "hdfs://nn/a/h".into() });
        assert_eq!(client.read_file(Some("nn"), "/a/h").unwrap(), b"data");

        ok(Command::MoveToLocal { src: "hdfs://nn/a/h".into(), dst: "/local/h".into() });
        assert!(client.read_file(Some("nn"), "/a/h").is_none());
        assert_eq!(client.read_file(None, "/local/h").unwrap(), b"data");

        ok(Command::MoveFromLocal { src: "/local/h".into(), dst: "hdfs://nn/a/i".into() });
        assert!(client.read_file(None, "/local/h").is_none());

        ok(Command::Rm { path: "hdfs://nn/a/i".into() });
        ok(Command::Rmdir { path: "hdfs://nn/a/b".into() });
        assert!(!client.is_dir(Some("nn"), "/a/b"));

        let (result, _) = run(&fs, Command::Rmdir { path: "hdfs://nn/a".into() }, false);
        assert_eq!(result.unwrap_err().code(), Code::FailedPrecondition);
    }
}
