//! # MD 驱动几何文件解析器
//!
//! 解析 MD 驱动侧写出的几何文本：坐标块在前（原子序数 + Bohr 坐标），
//! 空行分隔后为点电荷块（Bohr 坐标 + 电荷量）。所有坐标在此处
//! 一次性换算为 Angstrom。
//!
//! ## 文件格式说明
//! ```text
//! 6  0.000000  0.000000  0.000000
//! 1  2.059801  0.000000  0.000000
//!
//! 5.669178  0.000000  0.000000  -0.834000
//! ```
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `models/geometry.rs`

use crate::error::{QmGateError, Result};
use crate::models::{Atom, Geometry, PointCharge};
use std::fs;
use std::path::Path;

/// 解析几何文件
pub fn parse_geometry_file(path: &Path) -> Result<Geometry> {
    let content = fs::read_to_string(path).map_err(|e| QmGateError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_geometry_content(&content, &path.display().to_string())
}

/// 从字符串内容解析几何
pub fn parse_geometry_content(content: &str, path_label: &str) -> Result<Geometry> {
    let mut atoms: Vec<Atom> = Vec::new();
    let mut point_charges: Vec<PointCharge> = Vec::new();
    let mut in_coord_block = true;

    for line in content.lines() {
        let trimmed = line.trim();

        // 第一个空行结束坐标块（坐标块非空时）
        if trimmed.is_empty() {
            if in_coord_block && !atoms.is_empty() {
                in_coord_block = false;
            }
            continue;
        }

        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() != 4 {
            continue;
        }

        if in_coord_block {
            // 原子行: z x y z (Bohr)
            let atomic_number = match fields[0].parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => continue,
            };
            let position = parse_vec3(&fields[1..4]).ok_or_else(|| QmGateError::ParseError {
                format: "geometry".to_string(),
                path: path_label.to_string(),
                reason: format!("Invalid coordinate row: '{}'", trimmed),
            })?;
            atoms.push(Atom::from_bohr(atomic_number, position));
        } else {
            // 点电荷行: x y z q (Bohr)
            let position = match parse_vec3(&fields[0..3]) {
                Some(p) => p,
                None => continue,
            };
            let charge = match fields[3].parse::<f64>() {
                Ok(q) => q,
                Err(_) => continue,
            };
            point_charges.push(PointCharge::from_bohr(position, charge));
        }
    }

    if atoms.is_empty() {
        return Err(QmGateError::ParseError {
            format: "geometry".to_string(),
            path: path_label.to_string(),
            reason: "No coordinate rows found".to_string(),
        });
    }

    Ok(Geometry::new(atoms, point_charges))
}

fn parse_vec3(fields: &[&str]) -> Option<[f64; 3]> {
    Some([
        fields[0].parse().ok()?,
        fields[1].parse().ok()?,
        fields[2].parse().ok()?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BOHR_TO_ANGSTROM;

    #[test]
    fn test_parse_coord_and_charge_blocks() {
        let content = "\
6  0.0  0.0  0.0
1  2.0  0.0  0.0

5.0  0.0  0.0  -0.834
-5.0  0.0  0.0  0.417
";
        let geometry = parse_geometry_content(content, "test").unwrap();
        assert_eq!(geometry.num_atoms(), 2);
        assert_eq!(geometry.num_charges(), 2);

        assert_eq!(geometry.atoms[0].atomic_number, 6);
        assert!((geometry.atoms[1].position[0] - 2.0 * BOHR_TO_ANGSTROM).abs() < 1e-12);
        assert!((geometry.point_charges[0].charge - (-0.834)).abs() < 1e-12);
        assert!((geometry.point_charges[1].position[0] + 5.0 * BOHR_TO_ANGSTROM).abs() < 1e-12);
    }

    #[test]
    fn test_parse_no_charge_block() {
        let content = "6  0.0  0.0  0.0\n";
        let geometry = parse_geometry_content(content, "test").unwrap();
        assert_eq!(geometry.num_atoms(), 1);
        assert_eq!(geometry.num_charges(), 0);
    }

    #[test]
    fn test_parse_empty_is_error() {
        assert!(parse_geometry_content("", "test").is_err());
        assert!(parse_geometry_content("# nothing here\n", "test").is_err());
    }

    #[test]
    fn test_non_row_lines_skipped() {
        let content = "\
generated by driver
6  0.0  0.0  0.0

1.0  1.0  1.0  0.1
";
        let geometry = parse_geometry_content(content, "test").unwrap();
        assert_eq!(geometry.num_atoms(), 1);
        assert_eq!(geometry.num_charges(), 1);
    }
}
