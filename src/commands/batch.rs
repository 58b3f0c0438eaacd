//! # batch 命令实现
//!
//! 批量评估几何帧目录。共享资源是工作目录的文件集合，
//! 因此每帧派生 `<jobs-root>/<帧名>/` 独立工作目录后才进线程池；
//! 单帧内部仍是阻塞顺序管线。
//!
//! ## 功能
//! - 收集匹配的帧文件
//! - 并行逐帧计算并写驱动结果文件
//! - 能量汇总表格 + CSV，可选能量曲线 PNG
//!
//! ## 依赖关系
//! - 使用 `cli/batch.rs` 定义的参数
//! - 使用 `batch/`, `calculators/`, `parsers/gmx_input.rs`
//! - 使用 `utils/output.rs`

use crate::batch::{frame_name, BatchRunner, FrameCollector, FrameEnergy, ProcessResult};
use crate::calculators;
use crate::cli::batch::BatchArgs;
use crate::cli::calc::BackendOpts;
use crate::commands::build_calculator;
use crate::error::{QmGateError, Result};
use crate::parsers::gmx_input;
use crate::utils::output;

use std::fs;
use std::path::Path;
use tabled::{Table, Tabled};

/// 能量汇总表格行
#[derive(Debug, Clone, Tabled)]
struct EnergyRow {
    #[tabled(rename = "Frame")]
    frame: String,
    #[tabled(rename = "Energy (Hartree)")]
    energy: String,
    #[tabled(rename = "Atoms")]
    atoms: usize,
    #[tabled(rename = "Charges")]
    charges: usize,
}

/// 执行 batch 命令
pub fn execute(args: BatchArgs) -> Result<()> {
    output::print_header("Batch Frame Evaluation");

    let frames = FrameCollector::new(&args.frames_dir)
        .with_pattern(&args.pattern)
        .recursive(args.recursive)
        .collect()?;

    if frames.is_empty() {
        output::print_warning(&format!(
            "No frames matched '{}' under {}",
            args.pattern,
            args.frames_dir.display()
        ));
        return Ok(());
    }
    output::print_info(&format!("Found {} frames to evaluate", frames.len()));

    fs::create_dir_all(&args.jobs_root).map_err(|e| QmGateError::FileWriteError {
        path: args.jobs_root.display().to_string(),
        source: e,
    })?;

    // 先校验后端配置，帧循环里的失败只会是计算本身
    build_calculator(&args.backend)?;

    let runner = BatchRunner::new(args.jobs);
    let result = runner.run(frames, |frame| {
        process_frame(
            frame,
            &args.backend,
            &args.jobs_root,
            args.overwrite,
            &args.driver_file,
        )
    });

    output::print_info(&format!(
        "{} completed, {} skipped, {} failed (of {})",
        result.completed.len(),
        result.skipped,
        result.failed,
        result.total()
    ));
    if result.skipped > 0 {
        output::print_skip(&format!(
            "{} frames already had a driver file (use --overwrite to re-run)",
            result.skipped
        ));
    }

    if !result.failures.is_empty() {
        output::print_separator();
        for (frame, err) in &result.failures {
            output::print_warning(&format!("{}: {}", frame, err));
        }
        output::print_separator();
    }

    if result.completed.is_empty() {
        output::print_warning("No frames completed successfully.");
        return Ok(());
    }

    let rows: Vec<EnergyRow> = result
        .completed
        .iter()
        .map(|f| EnergyRow {
            frame: f.frame.clone(),
            energy: format!("{:.10}", f.energy),
            atoms: f.num_atoms,
            charges: f.num_charges,
        })
        .collect();
    println!("{}", Table::new(&rows));

    save_energies_csv(&result.completed, &args.output_csv)?;
    output::print_success(&format!(
        "Energy summary saved to '{}'",
        args.output_csv.display()
    ));

    if let Some(ref plot_path) = args.plot {
        generate_energy_plot(&result.completed, plot_path)?;
        output::print_success(&format!(
            "Energy profile plot saved to '{}'",
            plot_path.display()
        ));
    }

    Ok(())
}

/// 处理单帧：派生独立工作目录，跑完整管线
fn process_frame(
    frame: &Path,
    opts: &BackendOpts,
    jobs_root: &Path,
    overwrite: bool,
    driver_file: &str,
) -> ProcessResult {
    let name = frame_name(frame);
    let workdir = jobs_root.join(&name);

    if !overwrite && workdir.join(driver_file).exists() {
        return ProcessResult::Skipped(name);
    }

    match evaluate_frame(frame, opts, &workdir, driver_file) {
        Ok(energy) => ProcessResult::Success(energy),
        Err(e) => ProcessResult::Failed(name, e.to_string()),
    }
}

fn evaluate_frame(
    frame: &Path,
    opts: &BackendOpts,
    workdir: &Path,
    driver_file: &str,
) -> Result<FrameEnergy> {
    fs::create_dir_all(workdir).map_err(|e| QmGateError::FileWriteError {
        path: workdir.display().to_string(),
        source: e,
    })?;

    let geometry = gmx_input::parse_geometry_file(frame)?;
    let calc = build_calculator(opts)?;
    let result = calculators::calculate(calc.as_ref(), &geometry, workdir)?;
    result.write_driver_file(&workdir.join(driver_file))?;

    Ok(FrameEnergy {
        frame: frame_name(frame),
        energy: result.energy,
        num_atoms: geometry.num_atoms(),
        num_charges: geometry.num_charges(),
    })
}

/// 保存能量汇总到 CSV
fn save_energies_csv(completed: &[FrameEnergy], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path).map_err(|e| QmGateError::CsvError(e))?;

    wtr.write_record(&["frame", "energy_hartree", "n_atoms", "n_charges"])
        .map_err(|e| QmGateError::CsvError(e))?;

    for f in completed {
        wtr.write_record(&[
            f.frame.clone(),
            format!("{:.10}", f.energy),
            f.num_atoms.to_string(),
            f.num_charges.to_string(),
        ])
        .map_err(|e| QmGateError::CsvError(e))?;
    }

    wtr.flush().map_err(|e| QmGateError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// 生成能量曲线图
fn generate_energy_plot(completed: &[FrameEnergy], output_path: &Path) -> Result<()> {
    use plotters::prelude::*;

    let plot_data: Vec<(f64, f64)> = completed
        .iter()
        .enumerate()
        .map(|(i, f)| ((i + 1) as f64, f.energy))
        .collect();

    let y_min = plot_data
        .iter()
        .map(|(_, y)| *y)
        .fold(f64::INFINITY, f64::min);
    let y_max = plot_data
        .iter()
        .map(|(_, y)| *y)
        .fold(f64::NEG_INFINITY, f64::max);
    let y_margin = ((y_max - y_min).abs() * 0.1).max(1e-6);

    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| QmGateError::Other(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Frame Energy Profile", ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(
            0.5..(plot_data.len() as f64 + 0.5),
            (y_min - y_margin)..(y_max + y_margin),
        )
        .map_err(|e| QmGateError::Other(e.to_string()))?;

    chart
        .configure_mesh()
        .x_desc("Frame")
        .y_desc("Energy (Hartree)")
        .draw()
        .map_err(|e| QmGateError::Other(e.to_string()))?;

    chart
        .draw_series(LineSeries::new(plot_data.iter().copied(), &BLUE))
        .map_err(|e| QmGateError::Other(e.to_string()))?;

    chart
        .draw_series(
            plot_data
                .iter()
                .map(|(x, y)| Circle::new((*x, *y), 4, RED.filled())),
        )
        .map_err(|e| QmGateError::Other(e.to_string()))?;

    root.present()
        .map_err(|e| QmGateError::Other(e.to_string()))?;

    Ok(())
}
