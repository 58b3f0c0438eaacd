//! # Gaussian 后端适配器
//!
//! 以 Gaussian 系程序（g09/g16）为外部后端实现计算契约：
//! gjf 输入模板、检查点感知的路由行、日志 + punch 双产物解析，
//! 以及输出缺失时的有界整管线重试。
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `calculators/mod.rs` 契约与 `parsers/markers.rs`

use crate::calculators::{
    malformed, read_artifact_lines, remove_matching_files, CalcContext, Calculator, CleanupDepth,
};
use crate::error::Result;
use crate::models::CalcResult;
use regex::Regex;
use std::path::Path;

/// 检查点文件固定名（路由行 `%CHK=` 与 `GUESS=READ` 探测共用）
const CHECKPOINT_FILE: &str = "inp.chk";

/// Punch=Derivatives 写出的导数文件固定名
const PUNCH_FILE: &str = "fort.7";

/// 能量行标记
const ENERGY_MARKER: &str = "SCF Done";

/// 电场区段标记
const FIELD_MARKER: &str = "-------- Electric Field --------";

/// 总尝试次数上限：首次调用 + 3 次重试
const MAX_ATTEMPTS: usize = 4;

/// 外部程序调用形态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationStyle {
    /// `exe < input > output`
    Redirect,
    /// `exe input`
    Direct,
}

impl Default for InvocationStyle {
    fn default() -> Self {
        if cfg!(unix) {
            InvocationStyle::Redirect
        } else {
            InvocationStyle::Direct
        }
    }
}

/// Gaussian 后端配置，构造后不可变
#[derive(Debug, Clone)]
pub struct GaussianConfig {
    /// 体系总电荷
    pub charge: i32,

    /// 自旋多重度 (>= 1)
    pub multiplicity: u32,

    /// 输入文件名
    pub input_file: String,

    /// 日志输出文件名
    pub output_file: String,

    /// 可执行程序名
    pub exe: String,

    /// 计算方法
    pub method: String,

    /// 基组
    pub basis: String,

    /// 并行进程数
    pub nproc: u32,

    /// 内存字符串（Gaussian 记法，如 "200MW"）
    pub mem: String,

    /// SCF 循环上限
    pub scf_cycles: u32,

    /// 调用形态
    pub invocation: InvocationStyle,
}

impl Default for GaussianConfig {
    fn default() -> Self {
        GaussianConfig {
            charge: 0,
            multiplicity: 1,
            input_file: "inp.gjf".to_string(),
            output_file: "inp.out".to_string(),
            exe: "g09".to_string(),
            method: "HF".to_string(),
            basis: "6-31G".to_string(),
            nproc: 1,
            mem: "200MW".to_string(),
            scf_cycles: 128,
            invocation: InvocationStyle::default(),
        }
    }
}

/// Gaussian 后端适配器
pub struct GaussianCalculator {
    config: GaussianConfig,
}

impl GaussianCalculator {
    pub fn new(config: GaussianConfig) -> Self {
        GaussianCalculator { config }
    }
}

impl Calculator for GaussianCalculator {
    /// 清理上一轮的 punch 文件与 Gaussian 临时文件；
    /// 深度清理连检查点一起删除（仅重试路径走到这里，
    /// 成功运行后检查点保留以支持 `GUESS=READ` 续算）
    fn preprocess(&self, ctx: &CalcContext, depth: CleanupDepth) -> Result<()> {
        remove_matching_files(ctx.workdir, &[PUNCH_FILE, "gxx.", "Gau"]);
        if depth == CleanupDepth::Deep {
            remove_matching_files(ctx.workdir, &[".chk"]);
        }
        Ok(())
    }

    fn serialize_input(&self, ctx: &CalcContext) -> Result<String> {
        let cfg = &self.config;

        let mut route = format!(
            "# {}/{} FORCE Nosymm SCF=(MaxCyc={}) Punch=Derivatives",
            cfg.method, cfg.basis, cfg.scf_cycles
        );
        if !ctx.geometry.point_charges.is_empty() {
            route.push_str(" CHARGE Prop=(Field, Read)");
        }
        if ctx.path(CHECKPOINT_FILE).exists() {
            route.push_str(" GUESS=READ");
        }

        let mut text = String::new();
        text.push_str(&format!(
            "%MEM={}\n%CHK={}\n%NPROC={}\n",
            cfg.mem, CHECKPOINT_FILE, cfg.nproc
        ));
        text.push_str(&route);
        text.push_str("\n\n");
        text.push_str(&format!(
            "GMX_INP\n\n{} {}\n",
            cfg.charge, cfg.multiplicity
        ));

        for atom in &ctx.geometry.atoms {
            let [x, y, z] = atom.position;
            text.push_str(&format!(
                "{} {:16.10} {:16.10} {:16.10} \n",
                atom.atomic_number, x, y, z
            ));
        }
        text.push('\n');

        // 点电荷两遍：带电荷量的微扰块，以及同一组位置的
        // 无电荷场探针块（该后端的场输出约定）
        for pc in &ctx.geometry.point_charges {
            let [x, y, z] = pc.position;
            text.push_str(&format!(
                "{:16.10} {:16.10} {:16.10} {:16.10} \n",
                x, y, z, pc.charge
            ));
        }
        text.push('\n');
        for pc in &ctx.geometry.point_charges {
            let [x, y, z] = pc.position;
            text.push_str(&format!("{:16.10} {:16.10} {:16.10} \n", x, y, z));
        }
        text.push_str("\n\n");

        Ok(text)
    }

    fn build_invocation(&self) -> String {
        let cfg = &self.config;
        match cfg.invocation {
            InvocationStyle::Redirect => {
                format!("{} < {} > {}", cfg.exe, cfg.input_file, cfg.output_file)
            }
            InvocationStyle::Direct => format!("{} {}", cfg.exe, cfg.input_file),
        }
    }

    fn parse_output(&self, ctx: &CalcContext) -> Result<CalcResult> {
        let log_path = ctx.path(&self.config.output_file);
        let log_lines = read_artifact_lines(&log_path)?;

        let punch_path = ctx.path(PUNCH_FILE);
        let punch_lines = read_artifact_lines(&punch_path)?;

        let energy = extract_energy(&log_lines, &log_path)?;
        let forces = parse_punch_forces(&punch_lines, &punch_path)?;

        let num_charges = ctx.geometry.num_charges();
        let field_forces = if num_charges == 0 {
            Vec::new()
        } else {
            parse_field_rows(&log_lines, ctx.geometry.num_atoms(), num_charges, &log_path)?
        };

        Ok(CalcResult::new(energy, forces, field_forces))
    }

    fn input_file(&self) -> &str {
        &self.config.input_file
    }

    fn max_attempts(&self) -> usize {
        MAX_ATTEMPTS
    }
}

/// 取最后一个 `SCF Done` 行中的能量
///
/// 示例: ` SCF Done:  E(RHF) =  -39.9768775602     A.U. after   11 cycles`
fn extract_energy(lines: &[String], path: &Path) -> Result<f64> {
    let idx = crate::parsers::markers::find_last_marker(lines, ENERGY_MARKER)
        .ok_or_else(|| malformed(path, "no 'SCF Done' line found"))?;

    let pattern = Regex::new(r"[-0-9.]{9,}").unwrap();
    let matched = pattern
        .find(&lines[idx])
        .ok_or_else(|| malformed(path, "no energy value on 'SCF Done' line"))?;

    matched
        .as_str()
        .parse()
        .map_err(|_| malformed(path, format!("unparseable energy '{}'", matched.as_str())))
}

/// 解析 punch 文件的力块
///
/// 首行为标题跳过；随后每行 3 个 Fortran `D` 指数数，
/// 字段不足 3 个即视为力块结束。punch 存的是梯度，取负得力。
fn parse_punch_forces(lines: &[String], path: &Path) -> Result<Vec<[f64; 3]>> {
    let mut forces = Vec::new();

    for line in lines.iter().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 {
            break;
        }

        let mut gradient = [0.0f64; 3];
        for (i, token) in fields[..3].iter().enumerate() {
            gradient[i] = crate::parsers::markers::parse_fortran_float(token)
                .ok_or_else(|| malformed(path, format!("invalid derivative row '{}'", line)))?;
        }
        forces.push(gradient.map(|g| -g));
    }

    if forces.is_empty() {
        return Err(malformed(path, "no derivative rows found"));
    }
    Ok(forces)
}

/// 读取电场区段内点电荷处的场力行
///
/// 标记行之后是 2 行表头加 `num_atoms` 行几何回显，随后才是
/// 点电荷行；每行取末尾 3 个数值字段。行数或字段不足一律按
/// 结构不一致报错，不做静默截断。
fn parse_field_rows(
    lines: &[String],
    num_atoms: usize,
    num_charges: usize,
    path: &Path,
) -> Result<Vec<[f64; 3]>> {
    let rows = crate::parsers::markers::rows_after_marker(
        lines,
        FIELD_MARKER,
        2 + num_atoms,
        num_charges,
    )
    .ok_or_else(|| {
        malformed(
            path,
            format!(
                "electric field section missing or shorter than {} charge rows",
                num_charges
            ),
        )
    })?;

    let mut field_forces = Vec::with_capacity(num_charges);
    for line in rows {
        let triple = crate::parsers::markers::last_three_numbers(line)
            .ok_or_else(|| malformed(path, format!("invalid field row '{}'", line)))?;
        field_forces.push(triple);
    }
    Ok(field_forces)
}
