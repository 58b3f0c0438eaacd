//! # 标记行定位与行偏移读取原语
//!
//! 两个后端的输出都是半结构化文本：用固定字面量标记行定位区段，
//! 再按行偏移读取定长数值块。偏移算术集中写在这里，各后端复用。
//!
//! ## 依赖关系
//! - 被 `calculators/gaussian.rs`, `calculators/dftb.rs` 使用
//! - 无外部模块依赖

/// 定位首个包含标记的行，返回行号
pub fn find_marker(lines: &[String], marker: &str) -> Option<usize> {
    lines.iter().position(|line| line.contains(marker))
}

/// 定位最后一个包含标记的行，返回行号
pub fn find_last_marker(lines: &[String], marker: &str) -> Option<usize> {
    lines.iter().rposition(|line| line.contains(marker))
}

/// 标记行之后跳过 `skip` 行，读取紧随的 `count` 行
///
/// 标记不存在或剩余行数不足 `count` 时返回 `None`，由调用方决定
/// 报哪种错误。
pub fn rows_after_marker<'a>(
    lines: &'a [String],
    marker: &str,
    skip: usize,
    count: usize,
) -> Option<&'a [String]> {
    let idx = find_marker(lines, marker)?;
    let start = idx + 1 + skip;
    let end = start + count;
    if end > lines.len() {
        return None;
    }
    Some(&lines[start..end])
}

/// 取一行中最后 3 个可解析为数值的空白分隔字段
///
/// 容忍前导描述性列（原子编号、元素符号等）；数值字段不足 3 个
/// 时返回 `None`。
pub fn last_three_numbers(line: &str) -> Option<[f64; 3]> {
    let numbers: Vec<f64> = line
        .split_whitespace()
        .filter_map(|tok| tok.parse::<f64>().ok())
        .collect();
    if numbers.len() < 3 {
        return None;
    }
    let n = numbers.len();
    Some([numbers[n - 3], numbers[n - 2], numbers[n - 1]])
}

/// 解析 Fortran 风格浮点数（`D` 指数记号，如 `0.1234D+01`）
pub fn parse_fortran_float(token: &str) -> Option<f64> {
    token.replace(['D', 'd'], "E").parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_find_marker() {
        let text = lines(&["header", "Total Forces", "0.1 0.2 0.3"]);
        assert_eq!(find_marker(&text, "Total Forces"), Some(1));
        assert_eq!(find_marker(&text, "absent"), None);
    }

    #[test]
    fn test_find_last_marker() {
        let text = lines(&["SCF Done: E = -1.0", "...", "SCF Done: E = -2.0"]);
        assert_eq!(find_last_marker(&text, "SCF Done"), Some(2));
    }

    #[test]
    fn test_rows_after_marker() {
        let text = lines(&["x", "MARK", "banner", "row1", "row2"]);
        let rows = rows_after_marker(&text, "MARK", 1, 2).unwrap();
        assert_eq!(rows, &["row1".to_string(), "row2".to_string()]);
    }

    #[test]
    fn test_rows_after_marker_short_block() {
        let text = lines(&["MARK", "row1"]);
        assert!(rows_after_marker(&text, "MARK", 0, 2).is_none());
        assert!(rows_after_marker(&text, "GONE", 0, 1).is_none());
    }

    #[test]
    fn test_last_three_numbers() {
        assert_eq!(
            last_three_numbers("    1   51  0.5 -0.25 1e-3"),
            Some([0.5, -0.25, 1e-3])
        );
        assert_eq!(last_three_numbers("0.1 0.2 0.3"), Some([0.1, 0.2, 0.3]));
        assert_eq!(last_three_numbers("atom C 0.1 0.2"), None);
    }

    #[test]
    fn test_parse_fortran_float() {
        assert_eq!(parse_fortran_float("0.5D+01"), Some(5.0));
        assert_eq!(parse_fortran_float("-1.25d-02"), Some(-0.0125));
        assert_eq!(parse_fortran_float("1.5E-1"), Some(0.15));
        assert_eq!(parse_fortran_float("abc"), None);
    }
}
