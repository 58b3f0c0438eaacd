//! # 统一错误处理模块
//!
//! 定义 qmgate 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// qmgate 统一错误类型
#[derive(Error, Debug)]
pub enum QmGateError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 计算错误
    // ─────────────────────────────────────────────────────────────
    /// 后端必需参数缺失或非法，构造/写输入阶段抛出，不可重试
    #[error("Invalid calculator configuration: {reason}")]
    Configuration { reason: String },

    /// 外部程序预期的输出文件不存在（Gaussian 路径可重试）
    #[error("Expected output artifact does not exist: {path}")]
    MissingOutput { path: String },

    /// 输出文件存在但缺少预期标记或行数不一致，永不重试
    #[error("Malformed output in {path}: {reason}")]
    MalformedOutput { path: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    // ─────────────────────────────────────────────────────────────
    // 外部命令错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to spawn shell for command: {command}")]
    CommandSpawnError {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // CSV 错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

impl QmGateError {
    /// 判断是否为可重试错误（仅输出文件缺失属于外部进程竞态）
    pub fn is_retryable(&self) -> bool {
        matches!(self, QmGateError::MissingOutput { .. })
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, QmGateError>;
