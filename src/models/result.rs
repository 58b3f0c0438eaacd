//! # 计算结果数据模型
//!
//! 归一化的后端计算结果：能量、原子受力、点电荷场力，
//! 以及供 MD 驱动程序消费的固定格式结果文件写出。
//!
//! ## 依赖关系
//! - 被 `calculators/` 各后端填充
//! - 被 `commands/` 使用

use crate::error::{QmGateError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 驱动侧结果文件默认名（MD 驱动按固定名读取）
pub const DRIVER_FILE: &str = "fort.7";

/// 一次后端计算的归一化结果
///
/// `forces` 与几何的原子序列一一对应，`field_forces` 与点电荷序列
/// 一一对应。每次 `calculate` 产生全新实例，返回后不再修改；
/// 重试产生的部分状态一律丢弃。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalcResult {
    /// 总能量 (Hartree)
    pub energy: f64,

    /// 每原子受力 (Hartree/Bohr，后端原始单位)
    pub forces: Vec<[f64; 3]>,

    /// 每点电荷场力，点电荷为空时为空
    pub field_forces: Vec<[f64; 3]>,
}

impl CalcResult {
    pub fn new(energy: f64, forces: Vec<[f64; 3]>, field_forces: Vec<[f64; 3]>) -> Self {
        CalcResult {
            energy,
            forces,
            field_forces,
        }
    }

    /// 写出驱动侧结果文件
    ///
    /// 格式：首行能量（十进制小数）；随后每原子一行、每点电荷一行
    /// 取负的力分量，`%20.10E` 风格科学计数；末尾一个空行。
    pub fn write_driver_file(&self, path: &Path) -> Result<()> {
        let mut text = String::new();
        text.push_str(&format!("{:.6}\n", self.energy));

        for [x, y, z] in self.forces.iter().chain(self.field_forces.iter()) {
            text.push_str(&format!(
                "{} {} {}\n",
                fmt_sci(-x),
                fmt_sci(-y),
                fmt_sci(-z)
            ));
        }
        text.push('\n');

        fs::write(path, text).map_err(|e| QmGateError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        })
    }
}

/// `%20.10E` 风格科学计数：大写 E，指数恒带符号且至少两位，右对齐宽 20
fn fmt_sci(value: f64) -> String {
    let raw = format!("{:.10E}", value);
    let (mantissa, exponent) = raw.split_once('E').unwrap_or((raw.as_str(), "0"));
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(d) => ('-', d),
        None => ('+', exponent),
    };
    format!("{:>20}", format!("{}E{}{:0>2}", mantissa, sign, digits))
}
