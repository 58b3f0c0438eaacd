//! # 批量执行器
//!
//! 并行评估几何帧。每帧在独立工作目录内完成完整计算管线，
//! 帧之间互不共享文件，单帧内部仍是严格阻塞顺序执行。
//!
//! ## 功能
//! - 基于 rayon 的并行迭代
//! - 进度条显示
//! - 能量收集与失败汇总
//!
//! ## 依赖关系
//! - 被 `commands/batch.rs` 调用
//! - 使用 `utils/progress.rs` 创建进度条
//! - 使用 `rayon` 进行并行计算

use crate::utils::progress;

use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// 单帧评估成功的摘要
#[derive(Debug, Clone)]
pub struct FrameEnergy {
    /// 帧名（文件名主干）
    pub frame: String,
    /// 总能量 (Hartree)
    pub energy: f64,
    /// 原子数
    pub num_atoms: usize,
    /// 点电荷数
    pub num_charges: usize,
}

/// 单帧处理结果
#[derive(Debug, Clone)]
pub enum ProcessResult {
    /// 计算成功
    Success(FrameEnergy),
    /// 跳过（驱动结果文件已存在）
    Skipped(String),
    /// 计算失败
    Failed(String, String), // (帧名, 错误信息)
}

/// 批量处理结果统计
#[derive(Debug, Default)]
pub struct BatchResult {
    /// 成功帧的能量摘要
    pub completed: Vec<FrameEnergy>,
    /// 跳过数量
    pub skipped: usize,
    /// 失败数量
    pub failed: usize,
    /// 失败详情
    pub failures: Vec<(String, String)>,
}

impl BatchResult {
    /// 合并处理结果
    pub fn merge(&mut self, result: ProcessResult) {
        match result {
            ProcessResult::Success(frame) => self.completed.push(frame),
            ProcessResult::Skipped(_) => self.skipped += 1,
            ProcessResult::Failed(frame, err) => {
                self.failed += 1;
                self.failures.push((frame, err));
            }
        }
    }

    /// 总处理数量
    pub fn total(&self) -> usize {
        self.completed.len() + self.skipped + self.failed
    }
}

/// 批量执行器
pub struct BatchRunner {
    /// 并行作业数
    jobs: usize,
}

impl BatchRunner {
    /// 创建新的批量执行器
    pub fn new(jobs: usize) -> Self {
        let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
        Self { jobs }
    }

    /// 并行处理帧列表
    pub fn run<F>(&self, frames: Vec<PathBuf>, processor: F) -> BatchResult
    where
        F: Fn(&Path) -> ProcessResult + Sync + Send,
    {
        let total = frames.len();
        let pb = progress::create_progress_bar(total as u64, "Evaluating frames");

        let success_count = AtomicUsize::new(0);
        let skipped_count = AtomicUsize::new(0);
        let failed_count = AtomicUsize::new(0);

        // 配置 rayon 线程池
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .unwrap();

        let results: Vec<ProcessResult> = pool.install(|| {
            frames
                .par_iter()
                .map(|frame| {
                    let result = processor(frame);

                    match &result {
                        ProcessResult::Success(_) => {
                            success_count.fetch_add(1, Ordering::Relaxed);
                        }
                        ProcessResult::Skipped(_) => {
                            skipped_count.fetch_add(1, Ordering::Relaxed);
                        }
                        ProcessResult::Failed(_, _) => {
                            failed_count.fetch_add(1, Ordering::Relaxed);
                        }
                    }

                    pb.inc(1);
                    result
                })
                .collect()
        });

        pb.finish_and_clear();

        // 汇总结果，按帧名稳定排序
        let mut batch_result = BatchResult::default();
        for result in results {
            batch_result.merge(result);
        }
        batch_result
            .completed
            .sort_by(|a, b| a.frame.cmp(&b.frame));

        batch_result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_and_total() {
        let mut result = BatchResult::default();
        result.merge(ProcessResult::Success(FrameEnergy {
            frame: "frame_001".to_string(),
            energy: -1.0,
            num_atoms: 3,
            num_charges: 0,
        }));
        result.merge(ProcessResult::Skipped("frame_002".to_string()));
        result.merge(ProcessResult::Failed(
            "frame_003".to_string(),
            "SCC failure".to_string(),
        ));

        assert_eq!(result.completed.len(), 1);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.failed, 1);
        assert_eq!(result.total(), 3);
        assert_eq!(result.failures[0].0, "frame_003");
    }

    #[test]
    fn test_runner_collects_sorted_energies() {
        let frames: Vec<PathBuf> = ["b_frame", "a_frame", "c_frame"]
            .iter()
            .map(PathBuf::from)
            .collect();

        let runner = BatchRunner::new(2);
        let result = runner.run(frames, |frame| {
            let name = frame.to_string_lossy().to_string();
            ProcessResult::Success(FrameEnergy {
                frame: name,
                energy: -1.0,
                num_atoms: 1,
                num_charges: 0,
            })
        });

        let names: Vec<&str> = result.completed.iter().map(|f| f.frame.as_str()).collect();
        assert_eq!(names, vec!["a_frame", "b_frame", "c_frame"]);
    }
}
