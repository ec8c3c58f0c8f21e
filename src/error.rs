//! # 统一错误处理模块
//!
//! 定义 qdiffuse 的所有错误类型，使用 `thiserror` 派生。
//!
//! 逐点计算（`diffuse/evaluator.rs`）本身不会失败；所有校验都在构造
//! 网格、模型和对称矩阵集时完成。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// qdiffuse 统一错误类型
#[derive(Error, Debug)]
pub enum DiffuseError {
    // ─────────────────────────────────────────────────────────────
    // 输入数据错误
    // ─────────────────────────────────────────────────────────────
    #[error("Laue group number {0} not in range 1-14")]
    InvalidLaueGroup(i32),

    #[error("Structure factor grid has {actual} values, bounds require {expected}")]
    GridSizeMismatch { expected: usize, actual: usize },

    #[error("Invalid hkl bounds: {0}")]
    InvalidBounds(String),

    #[error("Singular matrix: {0}")]
    SingularMatrix(String),

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid range format: {0}")]
    InvalidRange(String),

    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to build thread pool: {0}")]
    ThreadPool(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, DiffuseError>;
