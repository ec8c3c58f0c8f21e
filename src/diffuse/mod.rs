//! # 漫散射计算模块
//!
//! 布拉格反射附近的对称平均漫散射强度及其解析梯度。
//!
//! ## 子模块
//! - `laue`: Laue 群对称矩阵生成
//! - `evaluator`: 单个采样点的强度/梯度计算
//! - `scan`: 倒易空间直线扫描（并行）
//! - `export`: 扫描结果导出
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `models/` 数据模型
//! - 使用 `batch/` 并行执行

pub mod evaluator;
pub mod export;
pub mod laue;
pub mod scan;

pub use evaluator::{DiffuseContribution, DiffuseEvaluator, Stencil};
pub use laue::{gen_laue_mats, LaueGroup, PrincipalAxes, SymmetryMatrixSet};
pub use scan::{run_scan, ScanLine, ScanPoint};
