//! # DFTB+ 后端适配器
//!
//! 以 DFTB+ 为外部后端实现计算契约：HSD 输入模板（去重类型表、
//! SCC 块、色散与三阶修正、可选点电荷块）、固定调用命令与
//! detailed.out 单产物解析。该后端的失败视为确定性的自洽收敛
//! 错误，不做自动重试。
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `calculators/mod.rs` 契约与 `parsers/markers.rs`

use crate::calculators::{
    malformed, read_artifact_lines, remove_matching_files, CalcContext, Calculator, CleanupDepth,
};
use crate::error::{QmGateError, Result};
use crate::models::{CalcResult, Geometry};
use std::path::Path;

/// 标准输出重定向的日志文件固定名
const LOG_FILE: &str = "output.log";

/// 能量行标记
const ENERGY_MARKER: &str = "Total energy";

/// 原子力块标记
const FORCES_MARKER: &str = "Total Forces";

/// 外部点电荷力块标记
const FIELD_MARKER: &str = "Forces on external charges";

/// 支持元素的参数：符号、最高角动量壳层、Hubbard 导数
///
/// Hubbard 导数保留字面量形式，序列化时原样写出。
const ELEMENT_TABLE: &[(u32, &str, &str, &str)] = &[
    (1, "H", "s", "-0.1857"),
    (6, "C", "p", "-0.1492"),
    (7, "N", "p", "-0.1535"),
    (8, "O", "p", "-0.1575"),
    (9, "F", "p", "-0.1623"),
    (15, "P", "p", "-0.1400"),
    (16, "S", "d", "-0.1100"),
    (17, "Cl", "d", "-0.0697"),
];

fn element_entry(atomic_number: u32) -> Option<(&'static str, &'static str, &'static str)> {
    ELEMENT_TABLE
        .iter()
        .find(|(z, _, _, _)| *z == atomic_number)
        .map(|(_, symbol, momentum, hubbard)| (*symbol, *momentum, *hubbard))
}

/// DFTB+ 后端配置，构造后不可变
///
/// Slater-Koster 参数前缀是硬性要求，构造时缺失立即失败，
/// 不允许带病进入计算。
#[derive(Debug, Clone)]
pub struct DftbConfig {
    /// 体系总电荷
    pub charge: i32,

    /// 自旋多重度 (>= 1)
    pub multiplicity: u32,

    /// 输入文件名
    pub input_file: String,

    /// 输出文件名
    pub output_file: String,

    /// 可执行程序名
    pub exe: String,

    /// Slater-Koster 参数文件前缀
    pub skf_prefix: String,

    /// SCC 迭代上限
    pub max_scc_iterations: u32,
}

impl DftbConfig {
    pub fn new(skf_prefix: impl Into<String>) -> Result<Self> {
        let skf_prefix = skf_prefix.into();
        if skf_prefix.trim().is_empty() {
            return Err(QmGateError::Configuration {
                reason: "Slater-Koster file prefix must be set".to_string(),
            });
        }

        Ok(DftbConfig {
            charge: 0,
            multiplicity: 1,
            input_file: "dftb_in.hsd".to_string(),
            output_file: "detailed.out".to_string(),
            exe: "dftb+".to_string(),
            skf_prefix,
            max_scc_iterations: 128,
        })
    }
}

/// DFTB+ 后端适配器
pub struct DftbCalculator {
    config: DftbConfig,
}

impl DftbCalculator {
    pub fn new(config: DftbConfig) -> Self {
        DftbCalculator { config }
    }
}

impl Calculator for DftbCalculator {
    /// 清理上一轮的输出、二进制缓存、旧输入与临时文件
    fn preprocess(&self, ctx: &CalcContext, _depth: CleanupDepth) -> Result<()> {
        remove_matching_files(ctx.workdir, &[".out", ".bin", ".hsd", "tmp", "fort.7"]);
        Ok(())
    }

    fn serialize_input(&self, ctx: &CalcContext) -> Result<String> {
        let cfg = &self.config;
        let geometry = ctx.geometry;

        // 稳定类型编号：不同原子序数升序，序号从 1 起
        let distinct = geometry.distinct_atomic_numbers();
        let mut entries = Vec::with_capacity(distinct.len());
        for z in &distinct {
            let entry = element_entry(*z).ok_or_else(|| QmGateError::Configuration {
                reason: format!(
                    "Unsupported element Z={} (supported: H C N O F P S Cl)",
                    z
                ),
            })?;
            entries.push(entry);
        }
        let type_index = |z: u32| distinct.iter().position(|&d| d == z).unwrap() + 1;

        let mut text = String::new();

        text.push_str("Geometry = {\n");
        text.push_str("TypeNames = {");
        for (symbol, _, _) in &entries {
            text.push_str(&format!(" \"{}\"", symbol));
        }
        text.push_str("}\n");
        text.push_str("TypesAndCoordinates[Angstrom] = {\n");
        for atom in &geometry.atoms {
            let [x, y, z] = atom.position;
            text.push_str(&format!(
                "{} {:16.8} {:16.8} {:16.8}\n",
                type_index(atom.atomic_number),
                x,
                y,
                z
            ));
        }
        text.push_str("}\n}\n");

        text.push_str("Hamiltonian = DFTB{\n");
        text.push_str(&format!(
            "SCC = Yes\nMaxSCCIterations = {}\nSCCTolerance = 1e-6\n",
            cfg.max_scc_iterations
        ));
        text.push_str("Filling = Fermi {\nTemperature [K] = 300\n}\n");
        text.push_str("MaxAngularMomentum = {\n");
        for (symbol, momentum, _) in &entries {
            text.push_str(&format!("{} = \"{}\"\n", symbol, momentum));
        }
        text.push_str("}\n");
        text.push_str(&format!("Charge = {}\n", cfg.charge));
        text.push_str(&format!(
            "SlaterKosterFiles = Type2FileNames {{\nPrefix = '{}'\nSeparator = '-'\nSuffix = '.skf'\n}}\n",
            cfg.skf_prefix
        ));
        text.push_str(
            "Dispersion = DftD3{\nDamping = BeckeJohnson{\na1 = 0.746\na2 = 4.191\n}\ns8 = 3.209\n}\n",
        );
        text.push_str("ThirdOrderFull = Yes\nDampXH = Yes\nDampXHExponent = 4.00\nHubbardDerivs {\n");
        for (symbol, _, hubbard) in &entries {
            text.push_str(&format!("{} = {}\n", symbol, hubbard));
        }
        text.push_str("}\n");

        if !geometry.point_charges.is_empty() {
            text.push_str("ElectricField = {\nPointCharges = {\nCoordsAndCharges [Angstrom] = {\n");
            for pc in &geometry.point_charges {
                let [x, y, z] = pc.position;
                text.push_str(&format!(
                    "{:16.8} {:16.8} {:16.8} {:.6}\n",
                    x, y, z, pc.charge
                ));
            }
            text.push_str("}\n}\n}\n");
        }

        text.push_str("ForceEvaluation = \"dynamics\"\n}\nAnalysis = {\nCalculateForces = Yes\n}\n");

        Ok(text)
    }

    fn build_invocation(&self) -> String {
        format!("{} > {}", self.config.exe, LOG_FILE)
    }

    fn parse_output(&self, ctx: &CalcContext) -> Result<CalcResult> {
        let out_path = ctx.path(&self.config.output_file);
        let lines = read_artifact_lines(&out_path)?;

        let energy = extract_energy(&lines, &out_path)?;
        let forces = parse_force_block(&lines, ctx.geometry, &out_path)?;

        let num_charges = ctx.geometry.num_charges();
        let field_forces = if num_charges == 0 {
            Vec::new()
        } else {
            parse_field_block(&lines, num_charges, &out_path)?
        };

        Ok(CalcResult::new(energy, forces, field_forces))
    }

    fn input_file(&self) -> &str {
        &self.config.input_file
    }
}

/// 取最后一个 `Total energy` 行的第 3 个字段
///
/// 示例: `Total energy:                      -4.0779379326 H`
fn extract_energy(lines: &[String], path: &Path) -> Result<f64> {
    let idx = crate::parsers::markers::find_last_marker(lines, ENERGY_MARKER)
        .ok_or_else(|| malformed(path, "no 'Total energy' line found"))?;

    let tokens: Vec<&str> = lines[idx].split_whitespace().collect();
    if tokens.len() < 3 {
        return Err(malformed(
            path,
            format!("truncated 'Total energy' line '{}'", lines[idx]),
        ));
    }

    tokens[2]
        .parse()
        .map_err(|_| malformed(path, format!("unparseable energy '{}'", tokens[2])))
}

/// 读取 `Total Forces` 标记后紧随的 `num_atoms` 行
fn parse_force_block(lines: &[String], geometry: &Geometry, path: &Path) -> Result<Vec<[f64; 3]>> {
    let num_atoms = geometry.num_atoms();
    let rows = crate::parsers::markers::rows_after_marker(lines, FORCES_MARKER, 0, num_atoms)
        .ok_or_else(|| {
            malformed(
                path,
                format!(
                    "force block missing or shorter than {} rows (SCC failure?)",
                    num_atoms
                ),
            )
        })?;

    let mut forces = Vec::with_capacity(num_atoms);
    for line in rows {
        let triple = crate::parsers::markers::last_three_numbers(line)
            .ok_or_else(|| malformed(path, format!("invalid force row '{}'", line)))?;
        forces.push(triple);
    }
    Ok(forces)
}

/// 读取 `Forces on external charges` 标记后紧随的 `num_charges` 行
///
/// 标记缺失或行数不足一律报结构错误，不得静默返回空表。
fn parse_field_block(
    lines: &[String],
    num_charges: usize,
    path: &Path,
) -> Result<Vec<[f64; 3]>> {
    let rows = crate::parsers::markers::rows_after_marker(lines, FIELD_MARKER, 0, num_charges)
        .ok_or_else(|| {
            malformed(
                path,
                format!(
                    "external charge force block missing or shorter than {} rows",
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
