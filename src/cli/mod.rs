//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `run`: 完整计算（序列化输入 -> 调用后端 -> 解析结果）
//! - `prepare`: 只生成后端输入文档
//! - `parse`: 只解析工作目录中已有的输出产物
//! - `batch`: 批量评估几何帧目录，每帧独立工作目录
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: calc, batch

pub mod batch;
pub mod calc;

use clap::{Parser, Subcommand};

/// qmgate - QM/MM 外部量子化学计算网关
#[derive(Parser)]
#[command(name = "qmgate")]
#[command(version)]
#[command(about = "A QM/MM external quantum chemistry calculator gateway", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Run a full calculation: serialize input, invoke the backend, parse results
    Run(calc::RunArgs),

    /// Write the backend input document without invoking anything
    Prepare(calc::PrepareArgs),

    /// Parse output artifacts already present in a working directory
    Parse(calc::ParseArgs),

    /// Evaluate a directory of geometry frames, one working directory per frame
    Batch(batch::BatchArgs),
}
