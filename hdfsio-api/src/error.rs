//! 结构化状态报告
//!
//! `Status` 的可序列化形式，供需要 JSON 输出的工具使用。

use hdfsio_core::Status;
use serde::Serialize;

/// 结构化状态报告
///
/// 上层应用（CLI、服务）可以直接打印，也可以序列化为 JSON。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    /// 数值错误码（OK = 0）
    pub code: i32,
    /// 人类可读的错误类型，如 "Not found"
    pub code_name: String,
    /// 错误消息（OK 时为空）
    pub message: String,
}

impl StatusReport {
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

impl From<&Status> for StatusReport {
    fn from(status: &Status) -> Self {
        Self {
            code: status.code().as_i32(),
            code_name: status.code().to_string(),
            message: status.message().to_string(),
        }
    }
}

/// 转换为结构化报告
///
/// # Example
/// ```ignore
/// if let Err(status) = fs.delete_dir("hdfs://nn/data") {
///     let report = to_report(&status);
///     println!("{}", serde_json::to_string(&report)?);
/// }
/// ```
pub fn to_report(status: &Status) -> StatusReport {
    StatusReport::from(status)
}

impl std::fmt::Display for StatusReport {
    /// 与 `Status` 相同的文本格式
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_ok() {
            f.write_str("OK")
        } else {
            write!(f, "{}: {}", self.code_name, self.message)
        }
    }
}
