//! # 并行批处理模块
//!
//! 提供对独立任务的统一并行执行能力。
//!
//! ## 功能
//! - 并行处理（rayon 线程池）
//! - 进度反馈
//!
//! ## 依赖关系
//! - 被 `diffuse/scan.rs` 使用
//! - 使用 `rayon` 进行并行处理
//! - 使用 `indicatif` 显示进度

pub mod runner;

pub use runner::BatchRunner;
