//! # prepare 命令实现
//!
//! 只生成并写出后端输入文档，不调用外部程序。用于检查模板
//! 内容或手工提交。
//!
//! ## 依赖关系
//! - 使用 `cli/calc.rs` 定义的参数
//! - 使用 `calculators/`, `parsers/gmx_input.rs`
//! - 使用 `utils/output.rs`

use crate::calculators::{CalcContext, Calculator};
use crate::cli::calc::PrepareArgs;
use crate::commands::build_calculator;
use crate::error::{QmGateError, Result};
use crate::parsers::gmx_input;
use crate::utils::output;

use std::fs;

/// 执行 prepare 命令
pub fn execute(args: PrepareArgs) -> Result<()> {
    output::print_header("Preparing Backend Input");

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
    let calc = build_calculator(&args.backend)?;

    let ctx = CalcContext {
        geometry: &geometry,
        workdir: &args.workdir,
    };
    let text = calc.serialize_input(&ctx)?;
    let input_path = ctx.path(calc.input_file());
    fs::write(&input_path, text).map_err(|e| QmGateError::FileWriteError {
        path: input_path.display().to_string(),
        source: e,
    })?;

    output::print_success(&format!(
        "Input document written to '{}'",
        input_path.display()
    ));
    output::print_info(&format!("Invocation would be: {}", calc.build_invocation()));
    Ok(())
}
