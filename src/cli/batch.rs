//! # batch 子命令 CLI 定义
//!
//! 批量评估几何帧目录，每帧独立工作目录并行计算。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/batch.rs`

use super::calc::BackendOpts;
use clap::Args;
use std::path::PathBuf;

/// batch 子命令参数
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Directory containing geometry frame files
    pub frames_dir: PathBuf,

    /// Filename pattern for frame files (glob)
    #[arg(long, default_value = "*.inp")]
    pub pattern: String,

    /// Recurse into subdirectories when collecting frames
    #[arg(long, default_value_t = false)]
    pub recursive: bool,

    /// Root directory for per-frame working directories
    #[arg(long, default_value = "calc_jobs")]
    pub jobs_root: PathBuf,

    /// Number of parallel frames (0 = all cores)
    #[arg(long, default_value_t = 0)]
    pub jobs: usize,

    /// Re-run frames whose working directory already has a driver file
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,

    #[command(flatten)]
    pub backend: BackendOpts,

    /// Driver-side result file name written per frame
    #[arg(long, default_value = crate::models::DRIVER_FILE)]
    pub driver_file: String,

    /// Filename for the CSV energy summary
    #[arg(long, default_value = "batch_energies.csv")]
    pub output_csv: PathBuf,

    /// Filename for the energy profile plot (PNG); no plot unless given
    #[arg(long)]
    pub plot: Option<PathBuf>,
}
