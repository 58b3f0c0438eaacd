//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `parsers/`, `calculators/`, `models/`, `utils/`
//! - 子模块: run, prepare, parse, batch

pub mod batch;
pub mod parse;
pub mod prepare;
pub mod run;

use crate::calculators::{
    Calculator, DftbCalculator, DftbConfig, GaussianCalculator, GaussianConfig,
};
use crate::cli::calc::{Backend, BackendOpts};
use crate::cli::Commands;
use crate::error::Result;
use crate::models::{CalcResult, Geometry};
use crate::utils::output;
use tabled::{Table, Tabled};

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Run(args) => run::execute(args),
        Commands::Prepare(args) => prepare::execute(args),
        Commands::Parse(args) => parse::execute(args),
        Commands::Batch(args) => batch::execute(args),
    }
}

/// 按 CLI 选项构造后端适配器
///
/// DFTB 后端缺少 Slater-Koster 前缀在这里即失败，不进入任何文件操作。
pub(crate) fn build_calculator(opts: &BackendOpts) -> Result<Box<dyn Calculator>> {
    match opts.backend {
        Backend::Gaussian => {
            let mut config = GaussianConfig::default();
            config.charge = opts.charge;
            config.multiplicity = opts.multiplicity;
            config.exe = opts.gaussian_exe.clone();
            config.method = opts.method.clone();
            config.basis = opts.basis.clone();
            config.nproc = opts.nproc;
            config.mem = opts.mem.clone();
            config.scf_cycles = opts.scf_cycles;
            if let Some(ref name) = opts.input_file {
                config.input_file = name.clone();
            }
            if let Some(ref name) = opts.output_file {
                config.output_file = name.clone();
            }
            Ok(Box::new(GaussianCalculator::new(config)))
        }
        Backend::Dftb => {
            let mut config = DftbConfig::new(opts.skf_prefix.clone().unwrap_or_default())?;
            config.charge = opts.charge;
            config.multiplicity = opts.multiplicity;
            config.exe = opts.dftb_exe.clone();
            config.max_scc_iterations = opts.max_scc_iterations;
            if let Some(ref name) = opts.input_file {
                config.input_file = name.clone();
            }
            if let Some(ref name) = opts.output_file {
                config.output_file = name.clone();
            }
            Ok(Box::new(DftbCalculator::new(config)))
        }
    }
}

/// 力表格行
#[derive(Debug, Clone, Tabled)]
struct ForceRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Z")]
    atomic_number: String,
    #[tabled(rename = "Fx (au)")]
    fx: String,
    #[tabled(rename = "Fy (au)")]
    fy: String,
    #[tabled(rename = "Fz (au)")]
    fz: String,
}

/// 场力表格行
#[derive(Debug, Clone, Tabled)]
struct FieldRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "q (e)")]
    charge: String,
    #[tabled(rename = "Fx (au)")]
    fx: String,
    #[tabled(rename = "Fy (au)")]
    fy: String,
    #[tabled(rename = "Fz (au)")]
    fz: String,
}

/// 打印归一化结果摘要
pub(crate) fn print_result_summary(geometry: &Geometry, result: &CalcResult) {
    output::print_success(&format!("Energy: {:.10} Hartree", result.energy));

    let force_rows: Vec<ForceRow> = result
        .forces
        .iter()
        .enumerate()
        .map(|(i, f)| ForceRow {
            index: i + 1,
            // Gaussian punch 可能带尾随行，超出原子序列的行不标 Z
            atomic_number: geometry
                .atoms
                .get(i)
                .map(|a| a.atomic_number.to_string())
                .unwrap_or_else(|| "-".to_string()),
            fx: format!("{:.6}", f[0]),
            fy: format!("{:.6}", f[1]),
            fz: format!("{:.6}", f[2]),
        })
        .collect();
    println!("{}", Table::new(&force_rows));

    if !result.field_forces.is_empty() {
        output::print_info("Forces on external point charges:");
        let field_rows: Vec<FieldRow> = result
            .field_forces
            .iter()
            .enumerate()
            .map(|(i, f)| FieldRow {
                index: i + 1,
                charge: geometry
                    .point_charges
                    .get(i)
                    .map(|pc| format!("{:.4}", pc.charge))
                    .unwrap_or_else(|| "-".to_string()),
                fx: format!("{:.6}", f[0]),
                fy: format!("{:.6}", f[1]),
                fz: format!("{:.6}", f[2]),
            })
            .collect();
        println!("{}", Table::new(&field_rows));
    }
}
