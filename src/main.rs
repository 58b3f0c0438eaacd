//! # qmgate - QM/MM 外部量子化学计算网关
//!
//! 把分子动力学驱动侧的几何（原子 + 外部点电荷）适配到可互换的
//! 外部电子结构程序：生成后端输入文件、调用外部程序、把半结构化
//! 的文本输出解析为归一化的 (能量, 原子力, 点电荷场力) 三元组。
//!
//! ## 子命令
//! - `run`     - 完整计算管线
//! - `prepare` - 只生成后端输入文档
//! - `parse`   - 只解析已有输出产物
//! - `batch`   - 批量评估几何帧目录
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/          (命令行参数定义)
//!   ├── commands/     (命令执行逻辑)
//!   │     ├── calculators/ (后端适配器与计算契约)
//!   │     ├── parsers/     (几何解析与标记定位原语)
//!   │     ├── models/      (数据模型)
//!   │     └── batch/       (批量执行)
//!   ├── utils/        (工具函数)
//!   └── error.rs      (错误处理)
//! ```

mod batch;
mod calculators;
mod cli;
mod commands;
mod error;
mod models;
mod parsers;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
