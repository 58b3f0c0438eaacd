//! # 批量处理模块
//!
//! 提供几何帧的批量评估能力。
//!
//! ## 功能
//! - 收集匹配的帧文件列表
//! - 每帧独立工作目录并行计算
//! - 进度反馈与统计
//!
//! ## 依赖关系
//! - 被 `commands/batch.rs` 使用
//! - 使用 `rayon` 进行并行处理
//! - 使用 `indicatif` 显示进度

pub mod collector;
pub mod runner;

pub use collector::{frame_name, FrameCollector};
pub use runner::{BatchResult, BatchRunner, FrameEnergy, ProcessResult};
