//! # 解析器模块
//!
//! 提供几何文件解析与后端输出通用的标记定位原语。
//! 各后端专有的输出解析写在 `calculators/` 对应适配器内。
//!
//! ## 依赖关系
//! - 被 `commands/`, `calculators/` 使用
//! - 使用 `models/` 数据模型
//! - 子模块: gmx_input, markers

pub mod gmx_input;
pub mod markers;
