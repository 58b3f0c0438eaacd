//! # 帧文件收集器
//!
//! 根据输入目录和 glob 模式收集待评估的几何帧文件列表。
//!
//! ## 功能
//! - glob 模式匹配文件名
//! - 可选递归目录搜索
//! - 结果按路径排序，保证帧顺序稳定
//!
//! ## 依赖关系
//! - 被 `commands/batch.rs` 调用
//! - 使用 `walkdir` 遍历目录，`glob` 匹配文件名

use crate::error::{QmGateError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 帧文件收集器
pub struct FrameCollector {
    /// 输入目录
    input: PathBuf,
    /// 文件名匹配模式
    pattern: String,
    /// 是否递归
    recursive: bool,
}

impl FrameCollector {
    /// 创建新的帧收集器
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            pattern: "*".to_string(),
            recursive: false,
        }
    }

    /// 设置文件名匹配模式
    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.pattern = pattern.to_string();
        self
    }

    /// 设置是否递归搜索
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// 收集所有匹配的帧文件
    pub fn collect(&self) -> Result<Vec<PathBuf>> {
        if !self.input.is_dir() {
            return Err(QmGateError::DirectoryNotFound {
                path: self.input.display().to_string(),
            });
        }

        let glob_pattern = glob::Pattern::new(&self.pattern).map_err(|e| {
            QmGateError::InvalidArgument(format!("Invalid pattern '{}': {}", self.pattern, e))
        })?;

        let walker = if self.recursive {
            WalkDir::new(&self.input)
        } else {
            WalkDir::new(&self.input).max_depth(1)
        };

        let mut frames = Vec::new();
        for entry in walker.into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if glob_pattern.matches(name) {
                    frames.push(entry.path().to_path_buf());
                }
            }
        }

        frames.sort();
        Ok(frames)
    }
}

/// 帧名：文件名主干
pub fn frame_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("frame")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_collect_matches_pattern_sorted() {
        let dir = std::env::temp_dir().join("qmgate_test_collector");
        fs::remove_dir_all(&dir).ok();
        fs::create_dir_all(dir.join("sub")).unwrap();
        fs::write(dir.join("frame_2.inp"), "x").unwrap();
        fs::write(dir.join("frame_1.inp"), "x").unwrap();
        fs::write(dir.join("notes.txt"), "x").unwrap();
        fs::write(dir.join("sub").join("frame_3.inp"), "x").unwrap();

        let frames = FrameCollector::new(&dir)
            .with_pattern("*.inp")
            .collect()
            .unwrap();
        let names: Vec<String> = frames.iter().map(|p| frame_name(p)).collect();
        assert_eq!(names, vec!["frame_1", "frame_2"]);

        let frames = FrameCollector::new(&dir)
            .with_pattern("*.inp")
            .recursive(true)
            .collect()
            .unwrap();
        assert_eq!(frames.len(), 3);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_collect_missing_dir_is_error() {
        let missing = std::env::temp_dir().join("qmgate_test_collector_missing");
        let err = FrameCollector::new(&missing).collect().unwrap_err();
        assert!(matches!(err, QmGateError::DirectoryNotFound { .. }));
    }

    #[test]
    fn test_invalid_pattern_is_error() {
        let dir = std::env::temp_dir().join("qmgate_test_collector_badpat");
        fs::create_dir_all(&dir).unwrap();
        let err = FrameCollector::new(&dir)
            .with_pattern("[")
            .collect()
            .unwrap_err();
        assert!(matches!(err, QmGateError::InvalidArgument(_)));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_frame_name() {
        assert_eq!(frame_name(Path::new("/a/b/frame_007.inp")), "frame_007");
    }
}
