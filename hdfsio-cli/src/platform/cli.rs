//! CLI 错误输出

use hdfsio_api::{to_report, Status};

/// Render a failed status for stderr, as text or as a JSON report
pub fn format_status(status: &Status, json: bool) -> String {
    if json {
        if let Ok(line) = serde_json::to_string(&to_report(status)) {
            return line;
        }
    }
    format!("❌ {}", status)
}

/// 打印错误
pub fn print_status(status: &Status, json: bool) {
    eprintln!("{}", format_status(status, json));
}
