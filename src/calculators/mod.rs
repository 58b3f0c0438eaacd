//! # 计算契约模块
//!
//! 定义后端无关的计算生命周期契约与编排逻辑。每个后端实现同一套
//! 四步协议：清理陈旧产物 -> 序列化输入文档 -> 调用外部程序 ->
//! 解析输出产物。几何与配置显式传递，序列化与解析之间不共享
//! 隐藏的可变状态。
//!
//! ## 重试模型
//! 重试是编排层的显式有界循环：可重试错误（输出文件缺失）在
//! 尝试次数未达上限时触发深度清理并重新走完整管线；其余错误
//! 立即向调用方传播。
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `models/`, `error.rs`
//! - 子模块: gaussian, dftb

pub mod dftb;
pub mod gaussian;

pub use dftb::{DftbCalculator, DftbConfig};
pub use gaussian::{GaussianCalculator, GaussianConfig, InvocationStyle};

use crate::error::{QmGateError, Result};
use crate::models::{CalcResult, Geometry};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// 清理深度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupDepth {
    /// 每次尝试前的常规清理
    Standard,
    /// 失败重试前的深度清理（Gaussian 在此档才删除检查点）
    Deep,
}

/// 一次计算的不可变上下文
///
/// 构建输入所用的几何原样贯穿序列化、解析与重试三个阶段，
/// 输出解析的行偏移由它的序列长度决定。
pub struct CalcContext<'a> {
    /// 本次计算的几何
    pub geometry: &'a Geometry,

    /// 工作目录（固定文件名都相对它解析）
    pub workdir: &'a Path,
}

impl CalcContext<'_> {
    /// 工作目录内文件的完整路径
    pub fn path(&self, name: &str) -> PathBuf {
        self.workdir.join(name)
    }
}

/// 后端计算契约
///
/// 实现方要求：
/// 1. `preprocess` 只做副作用，无可清理对象时不得报错
/// 2. `serialize_input` 对相同输入确定（检查点等工作目录状态除外）
/// 3. `parse_output` 区分 `MissingOutput`（文件不存在）与
///    `MalformedOutput`（文件存在但缺标记/行数不符）
pub trait Calculator {
    /// 清理上一轮计算留下的陈旧产物
    fn preprocess(&self, ctx: &CalcContext, depth: CleanupDepth) -> Result<()>;

    /// 生成后端输入文档文本
    fn serialize_input(&self, ctx: &CalcContext) -> Result<String>;

    /// 构造外部程序的 shell 调用命令
    fn build_invocation(&self) -> String;

    /// 解析输出产物为归一化结果
    fn parse_output(&self, ctx: &CalcContext) -> Result<CalcResult>;

    /// 输入文档文件名
    fn input_file(&self) -> &str;

    /// 总尝试次数上限（含首次调用）
    fn max_attempts(&self) -> usize {
        1
    }

    /// 在工作目录中执行外部程序，阻塞到其退出
    fn invoke(&self, ctx: &CalcContext) -> Result<()> {
        run_shell(&self.build_invocation(), ctx.workdir)
    }
}

/// 执行完整计算管线
///
/// 每轮：常规清理 -> 写输入文件 -> 调用外部程序 -> 解析输出。
/// 可重试错误且未达 `max_attempts` 时先做深度清理再进入下一轮；
/// 每轮产生全新的 `CalcResult`，失败轮次的部分状态不保留。
pub fn calculate(
    calc: &dyn Calculator,
    geometry: &Geometry,
    workdir: &Path,
) -> Result<CalcResult> {
    let ctx = CalcContext { geometry, workdir };
    let max_attempts = calc.max_attempts().max(1);
    let mut attempt = 1;

    loop {
        calc.preprocess(&ctx, CleanupDepth::Standard)?;

        let input = calc.serialize_input(&ctx)?;
        let input_path = ctx.path(calc.input_file());
        fs::write(&input_path, input).map_err(|e| QmGateError::FileWriteError {
            path: input_path.display().to_string(),
            source: e,
        })?;

        calc.invoke(&ctx)?;

        match calc.parse_output(&ctx) {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                attempt += 1;
                calc.preprocess(&ctx, CleanupDepth::Deep)?;
            }
            Err(e) => return Err(e),
        }
    }
}

/// 通过 shell 执行一条后端命令
///
/// 退出码不做解释：计算成败只由输出产物的存在与结构判定。
fn run_shell(command: &str, workdir: &Path) -> Result<()> {
    #[cfg(unix)]
    let mut cmd = {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command);
        c
    };
    #[cfg(not(unix))]
    let mut cmd = {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command);
        c
    };

    cmd.current_dir(workdir)
        .status()
        .map_err(|e| QmGateError::CommandSpawnError {
            command: command.to_string(),
            source: e,
        })?;

    Ok(())
}

/// 读取输出产物的全部行
///
/// 文件不存在映射为 `MissingOutput`（Gaussian 路径据此重试），
/// 其余 I/O 失败按普通读错误传播。
pub(crate) fn read_artifact_lines(path: &Path) -> Result<Vec<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text.lines().map(|l| l.to_string()).collect()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(QmGateError::MissingOutput {
            path: path.display().to_string(),
        }),
        Err(e) => Err(QmGateError::FileReadError {
            path: path.display().to_string(),
            source: e,
        }),
    }
}

/// 构造 `MalformedOutput` 错误
pub(crate) fn malformed(path: &Path, reason: impl Into<String>) -> QmGateError {
    QmGateError::MalformedOutput {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

/// 删除工作目录下文件名含任一子串的文件
///
/// 目录不可读或单个文件删除失败都按"无可清理"处理。
pub(crate) fn remove_matching_files(workdir: &Path, needles: &[&str]) {
    let entries = match fs::read_dir(workdir) {
        Ok(entries) => entries,
        Err(_) => return,
    };

    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if needles.iter().any(|needle| name.contains(needle)) {
                fs::remove_file(&path).ok();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Atom;
    use std::cell::Cell;

    fn test_geometry() -> Geometry {
        Geometry::new(vec![Atom::new(6, [0.0, 0.0, 0.0])], vec![])
    }

    fn test_workdir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("qmgate_test_{}", name));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// 输出永远缺失的模拟后端
    struct AlwaysMissing {
        attempts: usize,
        parse_calls: Cell<usize>,
        deep_cleanups: Cell<usize>,
    }

    impl Calculator for AlwaysMissing {
        fn preprocess(&self, _ctx: &CalcContext, depth: CleanupDepth) -> Result<()> {
            if depth == CleanupDepth::Deep {
                self.deep_cleanups.set(self.deep_cleanups.get() + 1);
            }
            Ok(())
        }

        fn serialize_input(&self, _ctx: &CalcContext) -> Result<String> {
            Ok("mock input\n".to_string())
        }

        fn build_invocation(&self) -> String {
            ":".to_string()
        }

        fn invoke(&self, _ctx: &CalcContext) -> Result<()> {
            Ok(())
        }

        fn parse_output(&self, _ctx: &CalcContext) -> Result<CalcResult> {
            self.parse_calls.set(self.parse_calls.get() + 1);
            Err(QmGateError::MissingOutput {
                path: "mock.out".to_string(),
            })
        }

        fn input_file(&self) -> &str {
            "mock.in"
        }

        fn max_attempts(&self) -> usize {
            self.attempts
        }
    }

    #[test]
    fn test_retry_bound_four_total_attempts() {
        let calc = AlwaysMissing {
            attempts: 4,
            parse_calls: Cell::new(0),
            deep_cleanups: Cell::new(0),
        };
        let geometry = test_geometry();
        let dir = test_workdir("retry_bound");

        let err = calculate(&calc, &geometry, &dir).unwrap_err();
        assert!(matches!(err, QmGateError::MissingOutput { .. }));
        // 首次调用 + 3 次重试，第 4 次失败后升级为致命错误
        assert_eq!(calc.parse_calls.get(), 4);
        assert_eq!(calc.deep_cleanups.get(), 3);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_no_retry_when_single_attempt() {
        let calc = AlwaysMissing {
            attempts: 1,
            parse_calls: Cell::new(0),
            deep_cleanups: Cell::new(0),
        };
        let geometry = test_geometry();
        let dir = test_workdir("no_retry");

        let err = calculate(&calc, &geometry, &dir).unwrap_err();
        assert!(matches!(err, QmGateError::MissingOutput { .. }));
        assert_eq!(calc.parse_calls.get(), 1);
        assert_eq!(calc.deep_cleanups.get(), 0);

        fs::remove_dir_all(&dir).ok();
    }

    /// 先失败 N 次、之后成功的模拟后端
    struct FlakyBackend {
        failures: usize,
        parse_calls: Cell<usize>,
    }

    impl Calculator for FlakyBackend {
        fn preprocess(&self, _ctx: &CalcContext, _depth: CleanupDepth) -> Result<()> {
            Ok(())
        }

        fn serialize_input(&self, _ctx: &CalcContext) -> Result<String> {
            Ok(String::new())
        }

        fn build_invocation(&self) -> String {
            ":".to_string()
        }

        fn invoke(&self, _ctx: &CalcContext) -> Result<()> {
            Ok(())
        }

        fn parse_output(&self, _ctx: &CalcContext) -> Result<CalcResult> {
            let call = self.parse_calls.get() + 1;
            self.parse_calls.set(call);
            if call <= self.failures {
                Err(QmGateError::MissingOutput {
                    path: "mock.out".to_string(),
                })
            } else {
                Ok(CalcResult::new(-1.0, vec![[0.0, 0.0, 0.0]], vec![]))
            }
        }

        fn input_file(&self) -> &str {
            "mock.in"
        }

        fn max_attempts(&self) -> usize {
            4
        }
    }

    #[test]
    fn test_recovers_within_retry_limit() {
        let calc = FlakyBackend {
            failures: 2,
            parse_calls: Cell::new(0),
        };
        let geometry = test_geometry();
        let dir = test_workdir("flaky_recover");

        let result = calculate(&calc, &geometry, &dir).unwrap();
        assert!((result.energy - (-1.0)).abs() < 1e-12);
        assert_eq!(calc.parse_calls.get(), 3);

        fs::remove_dir_all(&dir).ok();
    }

    /// 输出格式损坏的模拟后端：永不重试
    struct MalformedBackend {
        parse_calls: Cell<usize>,
    }

    impl Calculator for MalformedBackend {
        fn preprocess(&self, _ctx: &CalcContext, _depth: CleanupDepth) -> Result<()> {
            Ok(())
        }

        fn serialize_input(&self, _ctx: &CalcContext) -> Result<String> {
            Ok(String::new())
        }

        fn build_invocation(&self) -> String {
            ":".to_string()
        }

        fn invoke(&self, _ctx: &CalcContext) -> Result<()> {
            Ok(())
        }

        fn parse_output(&self, _ctx: &CalcContext) -> Result<CalcResult> {
            self.parse_calls.set(self.parse_calls.get() + 1);
            Err(QmGateError::MalformedOutput {
                path: "mock.out".to_string(),
                reason: "missing marker".to_string(),
            })
        }

        fn input_file(&self) -> &str {
            "mock.in"
        }

        fn max_attempts(&self) -> usize {
            4
        }
    }

    #[test]
    fn test_malformed_output_never_retried() {
        let calc = MalformedBackend {
            parse_calls: Cell::new(0),
        };
        let geometry = test_geometry();
        let dir = test_workdir("malformed_fatal");

        let err = calculate(&calc, &geometry, &dir).unwrap_err();
        assert!(matches!(err, QmGateError::MalformedOutput { .. }));
        assert_eq!(calc.parse_calls.get(), 1);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_input_file_written_each_attempt() {
        let calc = FlakyBackend {
            failures: 1,
            parse_calls: Cell::new(0),
        };
        let geometry = test_geometry();
        let dir = test_workdir("input_written");

        calculate(&calc, &geometry, &dir).unwrap();
        assert!(dir.join("mock.in").exists());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_remove_matching_files() {
        let dir = test_workdir("remove_matching");
        fs::write(dir.join("fort.7"), "x").unwrap();
        fs::write(dir.join("Gau-123.tmp"), "x").unwrap();
        fs::write(dir.join("keep.gjf"), "x").unwrap();

        remove_matching_files(&dir, &["fort.7", "Gau"]);
        assert!(!dir.join("fort.7").exists());
        assert!(!dir.join("Gau-123.tmp").exists());
        assert!(dir.join("keep.gjf").exists());

        // 目录为空或不存在时不得报错
        remove_matching_files(&dir.join("no_such_dir"), &["x"]);

        fs::remove_dir_all(&dir).ok();
    }
}
