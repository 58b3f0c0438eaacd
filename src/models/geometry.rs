//! # 分子几何数据模型
//!
//! 定义 QM 区原子与 MM 区外部点电荷的统一表示，并负责单位换算。
//! 所有坐标在载入时一次性由 Bohr 换算为 Angstrom，下游不再换算。
//!
//! ## 依赖关系
//! - 被 `parsers/gmx_input.rs` 和 `calculators/` 使用
//! - 无外部模块依赖

use serde::{Deserialize, Serialize};

/// Bohr -> Angstrom 换算因子 (CODATA 2010)
pub const BOHR_TO_ANGSTROM: f64 = 0.52917721092;

/// QM 区原子
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Atom {
    /// 原子序数 (> 0)
    pub atomic_number: u32,

    /// 笛卡尔坐标 [x, y, z] (Angstrom)
    pub position: [f64; 3],
}

impl Atom {
    pub fn new(atomic_number: u32, position: [f64; 3]) -> Self {
        Atom {
            atomic_number,
            position,
        }
    }

    /// 从 Bohr 坐标构造，换算只发生在这里
    pub fn from_bohr(atomic_number: u32, position: [f64; 3]) -> Self {
        Atom {
            atomic_number,
            position: position.map(|x| x * BOHR_TO_ANGSTROM),
        }
    }
}

/// MM 区外部点电荷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointCharge {
    /// 笛卡尔坐标 [x, y, z] (Angstrom)
    pub position: [f64; 3],

    /// 电荷量 (e)
    pub charge: f64,
}

impl PointCharge {
    pub fn new(position: [f64; 3], charge: f64) -> Self {
        PointCharge { position, charge }
    }

    /// 从 Bohr 坐标构造
    pub fn from_bohr(position: [f64; 3], charge: f64) -> Self {
        PointCharge {
            position: position.map(|x| x * BOHR_TO_ANGSTROM),
            charge,
        }
    }
}

/// 一次计算的完整几何：原子序列 + 点电荷序列
///
/// 两个序列的顺序均有意义：输出解析按它们的长度计算行偏移。
/// 构造后在整个计算生命周期内不可变。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geometry {
    /// QM 区原子（有序）
    pub atoms: Vec<Atom>,

    /// MM 区点电荷（有序，可为空）
    pub point_charges: Vec<PointCharge>,
}

impl Geometry {
    pub fn new(atoms: Vec<Atom>, point_charges: Vec<PointCharge>) -> Self {
        Geometry {
            atoms,
            point_charges,
        }
    }

    /// 原子数
    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }

    /// 点电荷数
    pub fn num_charges(&self) -> usize {
        self.point_charges.len()
    }

    /// 出现过的不同原子序数，升序（DFTB 类型表的稳定编号依据）
    pub fn distinct_atomic_numbers(&self) -> Vec<u32> {
        let mut numbers: Vec<u32> = self.atoms.iter().map(|a| a.atomic_number).collect();
        numbers.sort_unstable();
        numbers.dedup();
        numbers
    }
}
