//! 平台相关输出

pub mod cli;

pub use cli::{format_status, print_status};
