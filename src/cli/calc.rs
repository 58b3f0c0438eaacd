//! # 单次计算子命令 CLI 定义
//!
//! `run` / `prepare` / `parse` 三个子命令共享同一组后端选项，
//! 通过 `#[command(flatten)]` 嵌入。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/{run,prepare,parse}.rs`

use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 量子后端选择
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum Backend {
    /// Gaussian (g09/g16)
    Gaussian,
    /// DFTB+
    Dftb,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Gaussian => write!(f, "gaussian"),
            Backend::Dftb => write!(f, "dftb"),
        }
    }
}

/// 后端选项（各子命令共享）
#[derive(Args, Debug, Clone)]
pub struct BackendOpts {
    /// Quantum backend
    #[arg(long, value_enum, default_value = "gaussian")]
    pub backend: Backend,

    /// Total system charge
    #[arg(long, default_value_t = 0)]
    pub charge: i32,

    /// Spin multiplicity
    #[arg(long, default_value_t = 1)]
    pub multiplicity: u32,

    /// Override the backend input file name
    #[arg(long)]
    pub input_file: Option<String>,

    /// Override the backend output file name
    #[arg(long)]
    pub output_file: Option<String>,

    // ─────────────────────────────────────────────────────────────
    // Gaussian options
    // ─────────────────────────────────────────────────────────────
    /// Gaussian executable name
    #[arg(long, default_value = "g09")]
    pub gaussian_exe: String,

    /// Calculation method
    #[arg(long, default_value = "HF")]
    pub method: String,

    /// Basis set
    #[arg(long, default_value = "6-31G")]
    pub basis: String,

    /// Number of processors
    #[arg(long, default_value_t = 1)]
    pub nproc: u32,

    /// Memory, Gaussian notation (e.g. '200MW', '2GB')
    #[arg(long, default_value = "200MW")]
    pub mem: String,

    /// SCF cycle cap
    #[arg(long, default_value_t = 128)]
    pub scf_cycles: u32,

    // ─────────────────────────────────────────────────────────────
    // DFTB+ options
    // ─────────────────────────────────────────────────────────────
    /// DFTB+ executable name
    #[arg(long, default_value = "dftb+")]
    pub dftb_exe: String,

    /// Slater-Koster file prefix (required for the dftb backend)
    #[arg(long)]
    pub skf_prefix: Option<String>,

    /// Maximum SCC iterations
    #[arg(long, default_value_t = 128)]
    pub max_scc_iterations: u32,
}

/// run 子命令参数
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the geometry file (coordinate block + point charge block, Bohr)
    pub geometry: PathBuf,

    /// Working directory for backend input/output artifacts
    #[arg(long, default_value = ".")]
    pub workdir: PathBuf,

    #[command(flatten)]
    pub backend: BackendOpts,

    /// Driver-side result file written into the working directory
    #[arg(long, default_value = crate::models::DRIVER_FILE)]
    pub driver_file: String,

    /// Skip writing the driver-side result file
    #[arg(long, default_value_t = false)]
    pub no_driver_file: bool,
}

/// prepare 子命令参数
#[derive(Args, Debug)]
pub struct PrepareArgs {
    /// Path to the geometry file (coordinate block + point charge block, Bohr)
    pub geometry: PathBuf,

    /// Working directory the input document is written into
    #[arg(long, default_value = ".")]
    pub workdir: PathBuf,

    #[command(flatten)]
    pub backend: BackendOpts,
}

/// parse 子命令参数
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Path to the geometry file the outputs were produced for
    pub geometry: PathBuf,

    /// Working directory containing the output artifacts
    #[arg(long, default_value = ".")]
    pub workdir: PathBuf,

    #[command(flatten)]
    pub backend: BackendOpts,

    /// Also write the driver-side result file
    #[arg(long, default_value_t = false)]
    pub write_driver_file: bool,

    /// Driver-side result file name
    #[arg(long, default_value = crate::models::DRIVER_FILE)]
    pub driver_file: String,
}
