//! # parse 命令实现
//!
//! 解析工作目录中已有的输出产物，不触发任何外部调用。用于
//! 事后分析一次已完成（或失败）的外部运行。
//!
//! ## 依赖关系
//! - 使用 `cli/calc.rs` 定义的参数
//! - 使用 `calculators/`, `parsers/gmx_input.rs`
//! - 使用 `utils/output.rs`

use crate::calculators::{CalcContext, Calculator};
use crate::cli::calc::ParseArgs;
use crate::commands::{build_calculator, print_result_summary};
use crate::error::{QmGateError, Result};
use crate::parsers::gmx_input;
use crate::utils::output;

/// 执行 parse 命令
pub fn execute(args: ParseArgs) -> Result<()> {
    output::print_header("Parsing Backend Output");

    if !args.geometry.exists() {
        return Err(QmGateError::FileNotFound {
            path: args.geometry.display().to_string(),
        });
    }
    if !args.workdir.exists() {
        return Err(QmGateError::DirectoryNotFound {
            path: args.workdir.display().to_string(),
        });
    }

    let geometry = gmx_input::parse_geometry_file(&args.geometry)?;
    let calc = build_calculator(&args.backend)?;

    let ctx = CalcContext {
        geometry: &geometry,
        workdir: &args.workdir,
    };
    let result = calc.parse_output(&ctx)?;

    if args.write_driver_file {
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
