//! # run 命令实现
//!
//! 完整计算管线：读几何 -> 构造后端 -> calculate -> 写驱动结果文件。
//!
//! ## 依赖关系
//! - 使用 `cli/calc.rs` 定义的参数
//! - 使用 `calculators/`, `parsers/gmx_input.rs`
//! - 使用 `utils/output.rs`, `utils/progress.rs`

use crate::calculators::{self, Calculator};
use crate::cli::calc::RunArgs;
use crate::commands::{build_calculator, print_result_summary};
use crate::error::{QmGateError, Result};
use crate::parsers::gmx_input;
use crate::utils::{output, progress};

use std::fs;

/// 执行 run 命令
pub fn execute(args: RunArgs) -> Result<()> {
    output::print_header("QM Calculation");

    if !args.geometry.exists() {
        return Err(QmGateError::FileNotFound {
            path: args.geometry.display().to_string(),
        });
    }
    fs::create_dir_all(&args.workdir).map_err(|e| QmGateError::FileWriteError {
        path: args.workdir.display().to_string(),
        source: e,
    })?;

    let geometry = gmx_input::parse_geometry_file(&args.geometry)?;
    output::print_info(&format!(
        "Loaded {} atoms and {} point charges from '{}'",
        geometry.num_atoms(),
        geometry.num_charges(),
        args.geometry.display()
    ));

    let calc = build_calculator(&args.backend)?;
    output::print_info(&format!(
        "Backend {}: {}",
        args.backend.backend,
        calc.build_invocation()
    ));

    // 外部程序阻塞运行，spinner 只是给终端一个活着的信号
    let spinner = progress::create_spinner("Waiting for the external backend...");
    let result = calculators::calculate(calc.as_ref(), &geometry, &args.workdir);
    spinner.finish_and_clear();
    let result = result?;

    if !args.no_driver_file {
        let driver_path = args.workdir.join(&args.driver_file);
        result.write_driver_file(&driver_path)?;
        output::print_success(&format!(
            "Driver result written to '{}'",
            driver_path.display()
        ));
    }

    print_result_summary(&geometry, &result);
    Ok(())
}
